use crate::{Embedding, Error, RecordSchema, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A normalized entity: its source fields, composite text, and (once
/// populated) its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Position of the record in the raw input
    pub position: usize,
    pub fields: BTreeMap<String, String>,
    pub combined_text: String,
    pub token_count: usize,
    embedding: Option<Embedding>,
}

impl EntityRecord {
    pub fn new(
        position: usize,
        fields: BTreeMap<String, String>,
        combined_text: String,
        token_count: usize,
    ) -> Self {
        Self {
            position,
            fields,
            combined_text,
            token_count,
            embedding: None,
        }
    }

    /// Builder-style variant of [`EntityRecord::attach_embedding`] for
    /// records that are known not to carry one yet.
    pub fn with_embedding(mut self, embedding: Embedding) -> Result<Self> {
        self.attach_embedding(embedding)?;
        Ok(self)
    }

    /// Assign the embedding. Fails if one is already present.
    pub fn attach_embedding(&mut self, embedding: Embedding) -> Result<()> {
        if self.embedding.is_some() {
            return Err(Error::InvalidInput(format!(
                "record {} already has an embedding",
                self.position
            )));
        }
        self.embedding = Some(embedding);
        Ok(())
    }

    #[inline]
    pub fn embedding(&self) -> Option<&Embedding> {
        self.embedding.as_ref()
    }

    #[inline]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Short identifying label: the leading `|`-delimited part of the
    /// schema's label field, falling back to the first composite segment.
    pub fn label(&self, schema: &RecordSchema) -> String {
        let source = self
            .field(schema.label_field)
            .unwrap_or_else(|| self.combined_text.split("; ").next().unwrap_or_default());
        source.split('|').next().unwrap_or_default().trim().to_string()
    }

    /// Identifier used in diagnostics
    pub fn identifier(&self, schema: &RecordSchema) -> String {
        format!("#{} ({})", self.position, self.label(schema))
    }
}
