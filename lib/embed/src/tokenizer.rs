//! Token counting against the embedding provider's encoding

use tiktoken_rs::CoreBPE;
use venturematch_core::{Error, Result};

/// Counts tokens the way the embedding provider will
pub trait Tokenizer {
    fn count(&self, text: &str) -> usize;

    fn encoding_id(&self) -> &str;
}

impl<T: Tokenizer + ?Sized> Tokenizer for &T {
    fn count(&self, text: &str) -> usize {
        (**self).count(text)
    }

    fn encoding_id(&self) -> &str {
        (**self).encoding_id()
    }
}

/// Byte-pair-encoding tokenizer for the OpenAI encodings
pub struct BpeTokenizer {
    bpe: CoreBPE,
    encoding_id: String,
}

impl BpeTokenizer {
    /// Load the ranks for a named encoding (`cl100k_base`, `o200k_base`,
    /// `p50k_base` or `r50k_base`).
    pub fn for_encoding(encoding_id: &str) -> Result<Self> {
        let bpe = match encoding_id {
            "cl100k_base" => tiktoken_rs::cl100k_base(),
            "o200k_base" => tiktoken_rs::o200k_base(),
            "p50k_base" => tiktoken_rs::p50k_base(),
            "r50k_base" => tiktoken_rs::r50k_base(),
            other => {
                return Err(Error::InvalidConfig(format!("unsupported encoding: {other}")));
            }
        }
        .map_err(|e| Error::InvalidConfig(format!("failed to load encoding {encoding_id}: {e}")))?;

        Ok(Self {
            bpe,
            encoding_id: encoding_id.to_string(),
        })
    }
}

impl Tokenizer for BpeTokenizer {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }

    fn encoding_id(&self) -> &str {
        &self.encoding_id
    }
}

impl std::fmt::Debug for BpeTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BpeTokenizer")
            .field("encoding_id", &self.encoding_id)
            .finish()
    }
}

/// Rough word-count tokenizer for offline runs and tests
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }

    fn encoding_id(&self) -> &str {
        "whitespace"
    }
}
