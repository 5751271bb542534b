//! # venturematch Embed
//!
//! From raw scraped records to embedded collections:
//!
//! ```text
//! raw JSON ──> Normalizer ──> EntityCollection ──> populate(Embedder) ──> embedded collection
//!                  │
//!              Tokenizer (token budget)
//! ```
//!
//! The embedding provider sits behind the [`Embedder`] trait so that the
//! rest of the pipeline can run against [`HashEmbedder`] or a test stub.

pub mod embedder;
pub mod normalizer;
pub mod populate;
pub mod tokenizer;

pub use embedder::{
    Embedder, HashEmbedder, OpenAiEmbedder, OpenAiSettings, ProviderError, DEFAULT_BASE_URL,
    DEFAULT_HASH_DIM, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT,
};
pub use normalizer::{read_raw_records, NormalizeReport, Normalizer};
pub use populate::{populate, FailedRecord, FailurePolicy, PopulateReport};
pub use tokenizer::{BpeTokenizer, Tokenizer, WhitespaceTokenizer};
