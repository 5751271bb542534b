//! Record Normalizer
//!
//! Turns raw scraped JSON records into an [`EntityCollection`]: records
//! missing a required field are excluded, survivors get their composite
//! text and token count, and records over the token budget are excluded.
//! Both exclusions are silent at the API level; counts are logged.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info};
use venturematch_core::{
    CollectionKind, EmbeddingConfig, EntityCollection, EntityRecord, Error, Result,
};

use crate::tokenizer::Tokenizer;

/// Outcome counts of a normalization run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub input: usize,
    pub kept: usize,
    pub dropped_malformed: usize,
    pub dropped_oversized: usize,
}

pub struct Normalizer<T> {
    config: EmbeddingConfig,
    tokenizer: T,
}

impl<T: Tokenizer> Normalizer<T> {
    pub fn new(config: EmbeddingConfig, tokenizer: T) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, tokenizer })
    }

    /// Normalize raw records into a collection of the given kind
    pub fn normalize(&self, kind: CollectionKind, raw: &[Value]) -> EntityCollection {
        self.normalize_with_report(kind, raw).0
    }

    pub fn normalize_with_report(
        &self,
        kind: CollectionKind,
        raw: &[Value],
    ) -> (EntityCollection, NormalizeReport) {
        let schema = kind.schema();
        let mut collection = EntityCollection::new(kind);
        let mut report = NormalizeReport {
            input: raw.len(),
            ..Default::default()
        };

        for (position, value) in raw.iter().enumerate() {
            let fields = match value {
                Value::Object(map) => flatten_fields(map),
                _ => {
                    debug!("Dropping {} record {}: not an object", kind, position);
                    report.dropped_malformed += 1;
                    continue;
                }
            };

            let combined_text = match schema.compose(&fields) {
                Ok(text) => text,
                Err(field) => {
                    let reason = Error::MalformedRecord {
                        position,
                        field: field.to_string(),
                    };
                    debug!("Dropping {} record: {}", kind, reason);
                    report.dropped_malformed += 1;
                    continue;
                }
            };

            let token_count = self.tokenizer.count(&combined_text);
            if token_count > self.config.max_tokens {
                let reason = Error::OversizedText {
                    position,
                    tokens: token_count,
                    max_tokens: self.config.max_tokens,
                };
                debug!("Dropping {} record: {}", kind, reason);
                report.dropped_oversized += 1;
                continue;
            }

            collection.push(EntityRecord::new(position, fields, combined_text, token_count));
        }

        report.kept = collection.len();
        info!(
            "Normalized {} {} records: kept {}, dropped {} malformed, {} oversized",
            report.input, kind, report.kept, report.dropped_malformed, report.dropped_oversized
        );
        (collection, report)
    }
}

/// Keep every non-null field as text. Nested values are kept as JSON.
fn flatten_fields(map: &serde_json::Map<String, Value>) -> BTreeMap<String, String> {
    map.iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                Value::Bool(_) | Value::Number(_) => value.to_string(),
                Value::Array(_) | Value::Object(_) => value.to_string(),
            };
            Some((key.clone(), text))
        })
        .collect()
}

/// Read a raw JSON dump; the top level must be an array of records
pub fn read_raw_records<P: AsRef<Path>>(path: P) -> Result<Vec<Value>> {
    let data = std::fs::read(path.as_ref())?;
    match serde_json::from_slice::<Value>(&data)? {
        Value::Array(records) => Ok(records),
        other => Err(Error::InvalidInput(format!(
            "expected a JSON array of records in {:?}, found {}",
            path.as_ref(),
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
