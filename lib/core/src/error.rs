use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed record at position {position}: missing field `{field}`")]
    MalformedRecord { position: usize, field: String },

    #[error("Oversized text at position {position}: {tokens} tokens exceeds limit of {max_tokens}")]
    OversizedText {
        position: usize,
        tokens: usize,
        max_tokens: usize,
    },

    #[error("Embedding provider failed for record {record}: {message}")]
    EmbeddingProvider { record: String, message: String },

    #[error("Dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        expected: usize,
        actual: usize,
        context: String,
    },

    #[error("Cache format error at row {row}: {message}")]
    CacheFormat { row: usize, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
