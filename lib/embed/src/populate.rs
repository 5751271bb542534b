use tracing::{debug, info, instrument, warn};
use venturematch_core::{EntityCollection, Error, Result};

use crate::embedder::Embedder;

/// What to do when the provider fails for a single record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Abort the whole run on the first failure
    #[default]
    Abort,
    /// Drop the failing record, keep going, and report it
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRecord {
    pub position: usize,
    pub label: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulateReport {
    pub embedded: usize,
    /// Records that already carried an embedding
    pub reused: usize,
    pub failed: Vec<FailedRecord>,
}

/// Attach an embedding to every record, one provider call per record.
///
/// All embeddings of a run must share the dimension of the first one
/// returned; a record whose vector disagrees counts as a provider failure.
#[instrument(skip_all, fields(kind = %collection.kind(), records = collection.len()))]
pub fn populate<E: Embedder + ?Sized>(
    collection: EntityCollection,
    embedder: &E,
    policy: FailurePolicy,
) -> Result<(EntityCollection, PopulateReport)> {
    let kind = collection.kind();
    let schema = kind.schema();
    let total = collection.len();
    let mut report = PopulateReport::default();
    let mut expected_dim = collection
        .iter()
        .find_map(|r| r.embedding().map(|e| e.dim()));
    let mut out = EntityCollection::new(kind);

    info!("Embedding {} {} records with {}", total, kind, embedder.model());

    for (i, mut record) in collection.into_records().into_iter().enumerate() {
        if record.embedding().is_some() {
            report.reused += 1;
            out.push(record);
            continue;
        }

        let outcome = embedder
            .embed(&record.combined_text)
            .map_err(|e| e.to_string())
            .and_then(|embedding| {
                if embedding.is_empty() {
                    return Err("provider returned an empty vector".to_string());
                }
                if !embedding.is_finite() {
                    return Err("provider returned non-finite values".to_string());
                }
                match expected_dim {
                    Some(dim) if dim != embedding.dim() => Err(format!(
                        "dimension {} differs from {} returned earlier in this run",
                        embedding.dim(),
                        dim
                    )),
                    _ => Ok(embedding),
                }
            });

        match outcome {
            Ok(embedding) => {
                expected_dim.get_or_insert(embedding.dim());
                record.attach_embedding(embedding)?;
                report.embedded += 1;
                debug!("Embedded {}/{}: {}", i + 1, total, record.identifier(schema));
                out.push(record);
            }
            Err(reason) => {
                let identifier = record.identifier(schema);
                match policy {
                    FailurePolicy::Abort => {
                        return Err(Error::EmbeddingProvider {
                            record: identifier,
                            message: reason,
                        });
                    }
                    FailurePolicy::Skip => {
                        warn!("Skipping {} record {}: {}", kind, identifier, reason);
                        report.failed.push(FailedRecord {
                            position: record.position,
                            label: record.label(schema),
                            reason,
                        });
                    }
                }
            }
        }
    }

    info!(
        "Embedded {} {} records ({} reused, {} failed)",
        report.embedded,
        kind,
        report.reused,
        report.failed.len()
    );
    Ok((out, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::{HashEmbedder, ProviderError};
    use std::cell::Cell;
    use std::collections::BTreeMap;
    use venturematch_core::{CollectionKind, Embedding, EntityRecord};

    /// Fails on every text containing "boom", returns NaN for "nan"
    struct FlakyEmbedder {
        calls: Cell<usize>,
    }

    impl Embedder for FlakyEmbedder {
        fn embed(&self, text: &str) -> std::result::Result<Embedding, ProviderError> {
            self.calls.set(self.calls.get() + 1);
            if text.contains("boom") {
                return Err(ProviderError::Response("quota exceeded".to_string()));
            }
            if text.contains("nan") {
                return Ok(Embedding::new(vec![f32::NAN, 1.0]));
            }
            Ok(Embedding::new(vec![text.len() as f32, 1.0]))
        }

        fn model(&self) -> &str {
            "flaky"
        }
    }

    fn jobs(texts: &[&str]) -> EntityCollection {
        let records = texts
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let mut fields = BTreeMap::new();
                fields.insert("header".to_string(), format!("Co{i} | Role"));
                EntityRecord::new(i, fields, format!("Title: Co{i}; Content: {t}"), 4)
            })
            .collect();
        EntityCollection::from_records(CollectionKind::Jobs, records)
    }

    #[test]
    fn test_populate_embeds_every_record() {
        let embedder = HashEmbedder::new(16);
        let (collection, report) =
            populate(jobs(&["rust", "go", "python"]), &embedder, FailurePolicy::Abort).unwrap();
        assert_eq!(report.embedded, 3);
        assert!(report.failed.is_empty());
        assert_eq!(collection.dimension().unwrap(), Some(16));
    }

    #[test]
    fn test_abort_identifies_failing_record() {
        let embedder = FlakyEmbedder { calls: Cell::new(0) };
        let err = populate(jobs(&["ok", "boom", "ok"]), &embedder, FailurePolicy::Abort).unwrap_err();
        match err {
            Error::EmbeddingProvider { record, message } => {
                assert_eq!(record, "#1 (Co1)");
                assert!(message.contains("quota"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(embedder.calls.get(), 2);
    }

    #[test]
    fn test_skip_keeps_partial_results() {
        let embedder = FlakyEmbedder { calls: Cell::new(0) };
        let (collection, report) =
            populate(jobs(&["ok", "boom", "fine"]), &embedder, FailurePolicy::Skip).unwrap();
        assert_eq!(collection.len(), 2);
        assert_eq!(report.embedded, 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].position, 1);
        assert_eq!(report.failed[0].label, "Co1");
        let positions: Vec<usize> = collection.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![0, 2]);
    }

    #[test]
    fn test_existing_embeddings_reused() {
        let mut c = jobs(&["a", "b"]).into_records();
        c[0].attach_embedding(Embedding::new(vec![0.5, 0.5])).unwrap();
        let collection = EntityCollection::from_records(CollectionKind::Jobs, c);
        let embedder = FlakyEmbedder { calls: Cell::new(0) };
        let (out, report) = populate(collection, &embedder, FailurePolicy::Abort).unwrap();
        assert_eq!(report.reused, 1);
        assert_eq!(report.embedded, 1);
        assert_eq!(embedder.calls.get(), 1);
        assert_eq!(out.get(0).unwrap().embedding().unwrap().as_slice(), &[0.5, 0.5]);
    }

    #[test]
    fn test_non_finite_vector_is_a_failure() {
        let embedder = FlakyEmbedder { calls: Cell::new(0) };
        let err = populate(jobs(&["ok", "nan"]), &embedder, FailurePolicy::Abort).unwrap_err();
        match err {
            Error::EmbeddingProvider { record, message } => {
                assert_eq!(record, "#1 (Co1)");
                assert!(message.contains("non-finite"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let (collection, report) =
            populate(jobs(&["ok", "nan"]), &embedder, FailurePolicy::Skip).unwrap();
        assert_eq!(collection.len(), 1);
        assert_eq!(report.failed[0].position, 1);
        assert!(collection.embeddings().unwrap().iter().all(|e| e.is_finite()));
    }
}
