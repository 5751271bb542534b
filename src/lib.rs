//! # venturematch
//!
//! Semantic matching of job postings against a venture portfolio.
//!
//! Raw scraped records are normalized into composite text, embedded once,
//! cached on disk, and then compared pairwise by cosine similarity. Two
//! rankings are available: best single match, and aggregate similarity
//! against the whole portfolio.
//!
//! ## Quick Start
//!
//! ### As a CLI
//!
//! ```bash
//! venturematch embed --kind jobs --input data/hn-dump.json --output data/jobs.cache
//! venturematch embed --kind portfolio --input data/portfolio-dump.json --output data/portfolio.cache
//! venturematch match --jobs data/jobs.cache --portfolio data/portfolio.cache --strategy both
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use venturematch::prelude::*;
//! use serde_json::json;
//!
//! let normalizer = Normalizer::new(EmbeddingConfig::default(), WhitespaceTokenizer).unwrap();
//! let raw = vec![json!({"header": "Acme | Rust", "description": "Payments infrastructure"})];
//! let jobs = normalizer.normalize(CollectionKind::Jobs, &raw);
//!
//! let embedder = HashEmbedder::new(64);
//! let (jobs, _) = populate(jobs, &embedder, FailurePolicy::Abort).unwrap();
//! let matrix = similarity_matrix(&jobs, &jobs).unwrap();
//! assert!((matrix.get(0, 0).unwrap() - 1.0).abs() < 1e-5);
//! ```
//!
//! ## Crate Structure
//!
//! - `venturematch-core` - Records, collections, schemas, embeddings, errors
//! - `venturematch-embed` - Normalizer, tokenizers, embedding providers
//! - `venturematch-storage` - Durable embedding cache
//! - `venturematch-similarity` - Similarity matrix, rankings, reports

pub use venturematch_core::{
    ensure_compatible, CollectionKind, Embedding, EmbeddingConfig, EntityCollection,
    EntityRecord, Error, RecordSchema, Result, DEFAULT_ENCODING, DEFAULT_MAX_TOKENS,
    DEFAULT_MODEL,
};

pub use venturematch_embed::{
    populate, read_raw_records, BpeTokenizer, Embedder, FailurePolicy, HashEmbedder,
    NormalizeReport, Normalizer, OpenAiEmbedder, OpenAiSettings, PopulateReport, ProviderError,
    Tokenizer, WhitespaceTokenizer, DEFAULT_BASE_URL, DEFAULT_HASH_DIM,
};

pub use venturematch_storage::{CacheHeader, EmbeddingCache, LoadedCache, SkippedRow};

pub use venturematch_similarity::{
    format_report, most_similar, similarity_matrix, top_aggregate_matches, top_best_matches,
    RankedEntry, RankedMatch, RankingResult, SimilarityMatrix, Strategy,
    DEFAULT_TOP_CONTRIBUTORS,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        format_report, most_similar, populate, similarity_matrix, top_aggregate_matches,
        top_best_matches, CollectionKind, Embedder, Embedding, EmbeddingCache, EmbeddingConfig,
        EntityCollection, EntityRecord, Error, FailurePolicy, HashEmbedder, Normalizer, Result,
        Strategy, Tokenizer, WhitespaceTokenizer,
    };
}
