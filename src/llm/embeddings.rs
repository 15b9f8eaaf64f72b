//! Embedding client implementations.
//!
//! Converts document and query text into vectors for similarity search.
//! The OpenAI implementation calls the embeddings API; the mock produces
//! deterministic pseudo-embeddings for tests.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, SageError};

/// OpenAI embeddings API URL.
const OPENAI_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";

/// Request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Trait for clients that embed text into vectors.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Embeds a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embeds a batch of texts, preserving order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// OpenAI embeddings client.
#[derive(Debug, Clone)]
pub struct OpenAiEmbeddingClient {
    api_key: String,
    model: String,
    client: Client,
}

impl OpenAiEmbeddingClient {
    /// Creates a new embeddings client.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| SageError::llm(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key: api_key.into(),
            model: model.into(),
            client,
        })
    }

    async fn request(&self, input: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: self.model.clone(),
            input,
        };

        let response = self
            .client
            .post(OPENAI_EMBEDDINGS_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SageError::llm("Embedding request timed out. Try again.")
                } else {
                    SageError::llm(format!("Embedding request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SageError::llm(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(SageError::llm(format!(
                "Embeddings API error ({}): {}",
                status, body
            )));
        }

        let response: EmbeddingResponse = serde_json::from_str(&body)
            .map_err(|e| SageError::llm(format!("Failed to parse response: {}", e)))?;

        let mut data = response.data;
        // The API may return entries out of order; index restores input order.
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingClient for OpenAiEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut embeddings = self.request(vec![text.to_string()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| SageError::llm("No embedding returned"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts.to_vec()).await
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

/// Mock embedding client producing deterministic pseudo-embeddings.
///
/// Texts sharing words produce nearby vectors, so similarity ranking in
/// tests behaves plausibly without any network access.
#[derive(Debug, Clone, Default)]
pub struct MockEmbeddingClient {
    dimension: usize,
}

impl MockEmbeddingClient {
    /// Embedding dimension used by the mock.
    pub const DIMENSION: usize = 64;

    /// Creates a new mock embedding client.
    pub fn new() -> Self {
        Self {
            dimension: Self::DIMENSION,
        }
    }

    fn pseudo_embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for word in text.to_lowercase().split_whitespace() {
            let mut hash: u64 = 5381;
            for byte in word.bytes() {
                hash = hash.wrapping_mul(33).wrapping_add(byte as u64);
            }
            let bucket = (hash as usize) % self.dimension;
            vector[bucket] += 1.0;
        }

        // Normalize so cosine similarity behaves.
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingClient for MockEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.pseudo_embed(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.pseudo_embed(t)).collect())
    }
}
