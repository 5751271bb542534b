//! # venturematch Similarity
//!
//! Matching and ranking over two embedded collections.
//!
//! ## Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use venturematch_core::{CollectionKind, Embedding, EntityCollection, EntityRecord};
//! use venturematch_similarity::{similarity_matrix, top_best_matches, format_report};
//!
//! let make = |kind, rows: &[[f32; 2]]| {
//!     let records = rows
//!         .iter()
//!         .enumerate()
//!         .map(|(i, v)| {
//!             EntityRecord::new(i, BTreeMap::new(), format!("r{i}"), 1)
//!                 .with_embedding(Embedding::new(v.to_vec()))
//!                 .unwrap()
//!         })
//!         .collect();
//!     EntityCollection::from_records(kind, records)
//! };
//! let jobs = make(CollectionKind::Jobs, &[[1.0, 0.0], [0.6, 0.8]]);
//! let portfolio = make(CollectionKind::Portfolio, &[[0.0, 1.0], [1.0, 0.0]]);
//!
//! let matrix = similarity_matrix(&jobs, &portfolio).unwrap();
//! let ranking = top_best_matches(&jobs, &portfolio, &matrix, 10).unwrap();
//! assert_eq!(ranking.entries[0].matches[0].index, 1);
//! println!("{}", format_report(&ranking));
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ collections │────>│   matrix    │────>│    rank     │
//! │  (A, B)     │     │ (A · Bᵀ)    │     │ best / agg  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                                                │
//!                                         ┌─────────────┐
//!                                         │   report    │
//!                                         └─────────────┘
//! ```

pub mod matrix;
pub mod rank;
pub mod report;

pub use matrix::{cosine_similarity_matrix, similarity_matrix, SimilarityMatrix};
pub use rank::{
    most_similar, top_aggregate_matches, top_best_matches, RankedEntry, RankedMatch,
    RankingResult, Strategy, DEFAULT_TOP_CONTRIBUTORS,
};
pub use report::format_report;
