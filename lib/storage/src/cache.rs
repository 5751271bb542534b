// Durable embedding cache: one gzip-compressed, checksummed bincode file per collection
use atomicwrites::{AtomicFile, OverwriteBehavior};
use chrono::Utc;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;
use tracing::{info, instrument, warn};
use venturematch_core::{
    CollectionKind, Embedding, EmbeddingConfig, EntityCollection, EntityRecord, Error, Result,
};
use venturematch_embed::{populate, Embedder, FailurePolicy, PopulateReport};

/// Bumped whenever [`CachedRow`] or [`CacheHeader`] change shape
pub const CACHE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheHeader {
    pub version: u32,
    pub kind: CollectionKind,
    pub model_name: String,
    pub encoding_id: String,
    pub dimension: usize,
    pub row_count: usize,
    pub created_at: String,
    /// Hex SHA-256 of the encoded rows
    pub checksum: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedRow {
    pub position: u64,
    pub fields: BTreeMap<String, String>,
    pub combined_text: String,
    pub token_count: u64,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    header: CacheHeader,
    rows: Vec<u8>,
}

/// A row that was present in the file but could not be restored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub row: usize,
    pub position: usize,
    pub reason: String,
}

#[derive(Debug)]
pub struct LoadedCache {
    pub header: CacheHeader,
    pub collection: EntityCollection,
    pub skipped: Vec<SkippedRow>,
}

/// Embedding cache bound to one model configuration
#[derive(Debug, Clone)]
pub struct EmbeddingCache {
    config: EmbeddingConfig,
}

impl EmbeddingCache {
    pub fn new(config: EmbeddingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Embed every record of a normalized collection
    pub fn populate<E: Embedder + ?Sized>(
        &self,
        collection: EntityCollection,
        embedder: &E,
        policy: FailurePolicy,
    ) -> Result<(EntityCollection, PopulateReport)> {
        if embedder.model() != self.config.model_name {
            warn!(
                "Embedder model {} differs from configured model {}",
                embedder.model(),
                self.config.model_name
            );
        }
        populate(collection, embedder, policy)
    }

    /// Write the full collection, replacing any previous file atomically.
    #[instrument(skip(self, collection, path), fields(kind = %collection.kind(), rows = collection.len()))]
    pub fn persist<P: AsRef<Path>>(&self, collection: &EntityCollection, path: P) -> Result<CacheHeader> {
        let path = path.as_ref();
        let embeddings = collection.embeddings()?;
        let dimension = embeddings.first().map(|e| e.dim()).unwrap_or(0);

        let rows: Vec<CachedRow> = collection
            .iter()
            .zip(embeddings)
            .map(|(record, embedding)| CachedRow {
                position: record.position as u64,
                fields: record.fields.clone(),
                combined_text: record.combined_text.clone(),
                token_count: record.token_count as u64,
                embedding: embedding.as_slice().to_vec(),
            })
            .collect();

        let row_bytes = bincode::serialize(&rows).map_err(|e| Error::Serialization(e.to_string()))?;
        let header = CacheHeader {
            version: CACHE_FORMAT_VERSION,
            kind: collection.kind(),
            model_name: self.config.model_name.clone(),
            encoding_id: self.config.encoding_id.clone(),
            dimension,
            row_count: rows.len(),
            created_at: Utc::now().to_rfc3339(),
            checksum: checksum(&row_bytes),
        };
        let file = CacheFile {
            header: header.clone(),
            rows: row_bytes,
        };
        let data = bincode::serialize(&file).map_err(|e| Error::Serialization(e.to_string()))?;

        AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
            .write(|f| {
                let mut encoder = GzEncoder::new(f, Compression::default());
                encoder.write_all(&data)?;
                encoder.finish()?;
                Ok::<(), std::io::Error>(())
            })
            .map_err(|e| match e {
                atomicwrites::Error::Internal(io) | atomicwrites::Error::User(io) => Error::Io(io),
            })?;

        info!("Persisted {} {} rows (dim {}) to {:?}", header.row_count, header.kind, dimension, path);
        Ok(header)
    }

    /// Read a cache file back into a collection.
    ///
    /// Version and checksum problems fail the whole load. Rows whose vector
    /// does not match the header dimension or is not finite are skipped
    /// and reported.
    #[instrument(skip(self))]
    pub fn load<P: AsRef<Path> + std::fmt::Debug>(&self, path: P) -> Result<LoadedCache> {
        let path = path.as_ref();
        let mut data = Vec::new();
        GzDecoder::new(BufReader::new(File::open(path)?))
            .read_to_end(&mut data)
            .map_err(|e| Error::CacheFormat {
                row: 0,
                message: format!("failed to decompress {:?}: {}", path, e),
            })?;

        let file: CacheFile = bincode::deserialize(&data).map_err(|e| Error::CacheFormat {
            row: 0,
            message: format!("unreadable cache file {:?}: {}", path, e),
        })?;
        let header = file.header;

        if header.version != CACHE_FORMAT_VERSION {
            return Err(Error::CacheFormat {
                row: 0,
                message: format!(
                    "unsupported cache version {} (expected {})",
                    header.version, CACHE_FORMAT_VERSION
                ),
            });
        }
        if checksum(&file.rows) != header.checksum {
            return Err(Error::CacheFormat {
                row: 0,
                message: format!("checksum mismatch in {:?}", path),
            });
        }
        if header.model_name != self.config.model_name {
            warn!(
                "Cache {:?} was built with model {}, configured model is {}",
                path, header.model_name, self.config.model_name
            );
        }

        let rows: Vec<CachedRow> = bincode::deserialize(&file.rows).map_err(|e| Error::CacheFormat {
            row: 0,
            message: format!("unreadable rows: {}", e),
        })?;
        if rows.len() != header.row_count {
            warn!("Cache header lists {} rows, found {}", header.row_count, rows.len());
        }

        let mut collection = EntityCollection::new(header.kind);
        let mut skipped = Vec::new();
        for (row, cached) in rows.into_iter().enumerate() {
            let position = cached.position as usize;
            match restore_row(cached, header.dimension) {
                Ok(record) => collection.push(record),
                Err(reason) => {
                    let err = Error::CacheFormat {
                        row,
                        message: reason.clone(),
                    };
                    warn!("Skipping cached {} record {}: {}", header.kind, position, err);
                    skipped.push(SkippedRow { row, position, reason });
                }
            }
        }

        info!(
            "Loaded {} {} rows (dim {}) from {:?}, skipped {}",
            collection.len(),
            header.kind,
            header.dimension,
            path,
            skipped.len()
        );
        Ok(LoadedCache {
            header,
            collection,
            skipped,
        })
    }
}

fn restore_row(cached: CachedRow, dimension: usize) -> std::result::Result<EntityRecord, String> {
    if cached.embedding.len() != dimension {
        return Err(format!(
            "embedding has {} components, header declares {}",
            cached.embedding.len(),
            dimension
        ));
    }
    let embedding = Embedding::new(cached.embedding);
    if !embedding.is_finite() {
        return Err("embedding contains non-finite components".to_string());
    }
    EntityRecord::new(
        cached.position as usize,
        cached.fields,
        cached.combined_text,
        cached.token_count as usize,
    )
    .with_embedding(embedding)
    .map_err(|e| e.to_string())
}

fn checksum(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
