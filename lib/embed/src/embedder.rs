//! Embedding providers
//!
//! The matcher only needs `embed(text) -> vector`; everything behind that
//! call lives here. [`OpenAiEmbedder`] talks to an OpenAI-compatible HTTP
//! endpoint, [`HashEmbedder`] is a deterministic offline stand-in.

use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, warn};
use venturematch_core::Embedding;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_RETRIES: usize = 5;

/// Default dimension for hash embeddings
pub const DEFAULT_HASH_DIM: usize = 256;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request failed ({status}): {body}")]
    Status { status: StatusCode, body: String },

    #[error("invalid response: {0}")]
    Response(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Capability to turn text into an embedding
pub trait Embedder {
    fn embed(&self, text: &str) -> Result<Embedding, ProviderError>;

    /// Model identifier recorded alongside cached embeddings
    fn model(&self) -> &str;
}

impl<E: Embedder + ?Sized> Embedder for &E {
    fn embed(&self, text: &str) -> Result<Embedding, ProviderError> {
        (**self).embed(text)
    }

    fn model(&self) -> &str {
        (**self).model()
    }
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn embed(&self, text: &str) -> Result<Embedding, ProviderError> {
        (**self).embed(text)
    }

    fn model(&self) -> &str {
        (**self).model()
    }
}

/// Connection settings for [`OpenAiEmbedder`]
#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
    /// Retries after the first attempt
    pub max_retries: usize,
}

impl OpenAiSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// Blocking embeddings client for OpenAI-compatible endpoints.
///
/// One text per request. Rate limits, server errors and transient
/// transport errors are retried with exponential backoff.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    max_retries: usize,
}

impl OpenAiEmbedder {
    pub fn new(settings: OpenAiSettings, model: impl Into<String>) -> Result<Self, ProviderError> {
        let model = model.into();
        if settings.api_key.trim().is_empty() {
            return Err(ProviderError::Config("missing OpenAI API key".to_string()));
        }
        if model.trim().is_empty() {
            return Err(ProviderError::Config("missing embedding model name".to_string()));
        }

        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", settings.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|_| ProviderError::Config("invalid OpenAI API key".to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(settings.timeout)
            .default_headers(headers)
            .build()?;
        let endpoint = format!("{}/embeddings", settings.base_url.trim_end_matches('/'));

        Ok(Self {
            client,
            endpoint,
            model,
            max_retries: settings.max_retries,
        })
    }

    fn should_retry(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }

    fn is_retryable_error(err: &reqwest::Error) -> bool {
        err.is_timeout() || err.is_connect() || err.is_body() || err.is_request()
    }

    fn retry_backoff(attempt: usize) -> Duration {
        let capped = attempt.min(5) as u32;
        Duration::from_millis(500 * (1 << capped))
    }
}

impl Embedder for OpenAiEmbedder {
    fn embed(&self, text: &str) -> Result<Embedding, ProviderError> {
        let mut attempt = 0usize;
        loop {
            let request = EmbeddingRequest {
                model: &self.model,
                input: text,
            };
            match self.client.post(&self.endpoint).json(&request).send() {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let parsed: EmbeddingResponse = resp.json()?;
                        let data = parsed.data.into_iter().min_by_key(|d| d.index).ok_or_else(|| {
                            ProviderError::Response("no embeddings returned".to_string())
                        })?;
                        debug!("Embedded {} chars -> {} dims", text.len(), data.embedding.len());
                        return Ok(Embedding::new(data.embedding));
                    }

                    let body = resp
                        .text()
                        .unwrap_or_else(|_| "<body unavailable>".to_string());
                    if Self::should_retry(status) && attempt < self.max_retries {
                        attempt += 1;
                        warn!("Embedding request returned {}, retry {}", status, attempt);
                        thread::sleep(Self::retry_backoff(attempt));
                        continue;
                    }
                    return Err(ProviderError::Status { status, body });
                }
                Err(err) => {
                    if Self::is_retryable_error(&err) && attempt < self.max_retries {
                        attempt += 1;
                        warn!("Embedding request failed ({}), retry {}", err, attempt);
                        thread::sleep(Self::retry_backoff(attempt));
                        continue;
                    }
                    return Err(err.into());
                }
            }
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

/// Deterministic feature-hashing embedder.
///
/// Lowercased words and character trigrams are hashed into `dim` buckets
/// and the result is L2-normalized. Texts sharing vocabulary land close
/// together, which is enough for offline runs and tests.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
    model: String,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self {
            dim: dim.max(1),
            model: format!("feature-hash-{}", dim.max(1)),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    fn bucket(&self, token: &str) -> (usize, f32) {
        let digest = Sha256::digest(token.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        let hash = u64::from_le_bytes(bytes);
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        ((hash % self.dim as u64) as usize, sign)
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_DIM)
    }
}

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> Result<Embedding, ProviderError> {
        let mut vector = vec![0.0f32; self.dim];
        let normalized = text.to_lowercase();

        for word in normalized.split_whitespace() {
            let (pos, sign) = self.bucket(word);
            vector[pos] += 2.0 * sign;

            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                let (pos, sign) = self.bucket(&trigram);
                vector[pos] += sign;
            }
        }

        Ok(Embedding::new(vector).normalized())
    }

    fn model(&self) -> &str {
        &self.model
    }
}
