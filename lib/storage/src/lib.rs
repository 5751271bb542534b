pub mod cache;

pub use cache::{
    CacheHeader, CachedRow, EmbeddingCache, LoadedCache, SkippedRow, CACHE_FORMAT_VERSION,
};
