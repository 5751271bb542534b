use crate::{CollectionKind, Embedding, EntityRecord, Error, RecordSchema, Result};

/// An ordered collection of records sharing a schema and embedding dimension.
///
/// Order is the insertion order of the source and is only used for stable
/// display and tie-breaking.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityCollection {
    kind: CollectionKind,
    records: Vec<EntityRecord>,
}

impl EntityCollection {
    pub fn new(kind: CollectionKind) -> Self {
        Self {
            kind,
            records: Vec::new(),
        }
    }

    pub fn from_records(kind: CollectionKind, records: Vec<EntityRecord>) -> Self {
        Self { kind, records }
    }

    #[inline]
    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    #[inline]
    pub fn schema(&self) -> &'static RecordSchema {
        self.kind.schema()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&EntityRecord> {
        self.records.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[EntityRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<EntityRecord> {
        self.records
    }

    pub fn push(&mut self, record: EntityRecord) {
        self.records.push(record);
    }

    /// Embeddings of every record, in order.
    ///
    /// Fails if any record has not been embedded or if dimensions disagree
    /// within the collection.
    pub fn embeddings(&self) -> Result<Vec<&Embedding>> {
        let mut out = Vec::with_capacity(self.records.len());
        let mut expected = None;
        for record in &self.records {
            let embedding = record.embedding().ok_or_else(|| {
                Error::InvalidInput(format!(
                    "{} record {} has no embedding",
                    self.kind,
                    record.identifier(self.schema())
                ))
            })?;
            match expected {
                None => expected = Some(embedding.dim()),
                Some(dim) if dim != embedding.dim() => {
                    return Err(Error::DimensionMismatch {
                        expected: dim,
                        actual: embedding.dim(),
                        context: format!("{} record {}", self.kind, record.identifier(self.schema())),
                    });
                }
                Some(_) => {}
            }
            out.push(embedding);
        }
        Ok(out)
    }

    /// Shared embedding dimension, or `None` for an empty collection
    pub fn dimension(&self) -> Result<Option<usize>> {
        Ok(self.embeddings()?.first().map(|e| e.dim()))
    }
}

/// Check up front that two collections can be compared.
///
/// An empty side imposes no constraint.
pub fn ensure_compatible(a: &EntityCollection, b: &EntityCollection) -> Result<Option<usize>> {
    match (a.dimension()?, b.dimension()?) {
        (Some(da), Some(db)) if da != db => Err(Error::DimensionMismatch {
            expected: da,
            actual: db,
            context: format!("{} vs {} collections", a.kind(), b.kind()),
        }),
        (Some(d), _) | (None, Some(d)) => Ok(Some(d)),
        (None, None) => Ok(None),
    }
}
