//! LLM integration for Sage.
//!
//! Provides traits and implementations for communicating with text-generation
//! and embedding providers.

pub mod embeddings;
pub mod mock;
pub mod openai;
pub mod parser;
pub mod prompt;
pub mod types;

pub use embeddings::{EmbeddingClient, MockEmbeddingClient, OpenAiEmbeddingClient};
pub use mock::MockLlmClient;
pub use openai::{OpenAiClient, OpenAiConfig};
pub use parser::{parse_generation_response, strip_code_fences, GeneratedSql};
pub use types::{Conversation, Message, Role};

use async_trait::async_trait;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::LlmConfig;
use crate::error::{Result, SageError};

/// Trait for LLM clients that can generate completions.
///
/// Implementations must be thread-safe (Send + Sync); one client is shared
/// across requests.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generates a completion for the given messages.
    ///
    /// Returns the complete response as a single string.
    async fn complete(&self, messages: &[Message]) -> Result<String>;
}

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    /// OpenAI chat completions.
    #[default]
    OpenAi,
    /// Mock client for testing (no API key required).
    Mock,
}

impl LlmProvider {
    /// Returns the provider as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Mock => "mock",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "mock" => Ok(Self::Mock),
            _ => Err(format!("Unknown LLM provider: {}", s)),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Creates a completion client for the configured provider.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    let provider: LlmProvider = config
        .provider
        .parse()
        .map_err(SageError::config)?;

    match provider {
        LlmProvider::OpenAi => {
            let client = OpenAiClient::new(OpenAiConfig::from_llm_config(config)?)?;
            Ok(Arc::new(client))
        }
        LlmProvider::Mock => Ok(Arc::new(MockLlmClient::new())),
    }
}

/// Creates an embedding client for the configured provider.
pub fn create_embedding_client(config: &LlmConfig) -> Result<Arc<dyn EmbeddingClient>> {
    let provider: LlmProvider = config
        .provider
        .parse()
        .map_err(SageError::config)?;

    match provider {
        LlmProvider::OpenAi => {
            let client = OpenAiEmbeddingClient::new(
                config.resolve_api_key()?,
                config.embedding_model.clone(),
            )?;
            Ok(Arc::new(client))
        }
        LlmProvider::Mock => Ok(Arc::new(MockEmbeddingClient::new())),
    }
}
