use crate::{Error, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "text-embedding-ada-002";
/// The model accepts 8191 tokens; keep some headroom.
pub const DEFAULT_MAX_TOKENS: usize = 8000;
pub const DEFAULT_ENCODING: &str = "cl100k_base";

/// Embedding model parameters shared by the normalizer and the cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub model_name: String,
    pub max_tokens: usize,
    pub encoding_id: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            encoding_id: DEFAULT_ENCODING.to_string(),
        }
    }
}

impl EmbeddingConfig {
    pub fn new(model_name: impl Into<String>, max_tokens: usize, encoding_id: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            max_tokens,
            encoding_id: encoding_id.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.model_name.trim().is_empty() {
            return Err(Error::InvalidConfig("model name is empty".to_string()));
        }
        if self.encoding_id.trim().is_empty() {
            return Err(Error::InvalidConfig("encoding id is empty".to_string()));
        }
        if self.max_tokens == 0 {
            return Err(Error::InvalidConfig("max_tokens must be positive".to_string()));
        }
        Ok(())
    }
}
