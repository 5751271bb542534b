//! # venturematch Core
//!
//! Core types for the venturematch matcher.
//!
//! - [`EntityRecord`] - A normalized record with composite text and embedding
//! - [`EntityCollection`] - Ordered records of one [`CollectionKind`]
//! - [`Embedding`] - Fixed-length embedding vector
//! - [`RecordSchema`] - How raw fields become composite text
//! - [`EmbeddingConfig`] - Model name, token budget and tokenizer encoding
//!
//! ## Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use venturematch_core::{CollectionKind, Embedding, EntityCollection, EntityRecord};
//!
//! let mut fields = BTreeMap::new();
//! fields.insert("header".to_string(), "Acme | Engineer".to_string());
//! fields.insert("description".to_string(), "Build things".to_string());
//! let text = CollectionKind::Jobs.schema().compose(&fields).unwrap();
//!
//! let record = EntityRecord::new(0, fields, text, 6)
//!     .with_embedding(Embedding::new(vec![1.0, 0.0, 0.0]))
//!     .unwrap();
//! let collection = EntityCollection::from_records(CollectionKind::Jobs, vec![record]);
//! assert_eq!(collection.dimension().unwrap(), Some(3));
//! ```

pub mod collection;
pub mod config;
pub mod error;
pub mod record;
pub mod schema;
pub mod vector;

pub use collection::{ensure_compatible, EntityCollection};
pub use config::{EmbeddingConfig, DEFAULT_ENCODING, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
pub use error::{Error, Result};
pub use record::EntityRecord;
pub use schema::{CollectionKind, RecordSchema, Segment, JOB_SCHEMA, PORTFOLIO_SCHEMA};
pub use vector::Embedding;
