//! Error types for Sage.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for Sage operations.
#[derive(Error, Debug)]
pub enum SageError {
    /// Database connection errors (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution errors (syntax errors, missing relations, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// A generated statement was rejected by the safety gate.
    #[error("Unsafe query rejected: {0}")]
    UnsafeQuery(String),

    /// SQL generation errors (model returned no usable statement).
    #[error("Generation error: {0}")]
    Generation(String),

    /// LLM API errors (rate limits, auth, timeouts, etc.)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Vector retrieval errors (index missing, embedding failed, etc.)
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Authentication errors (bad credentials, invalid token).
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Configuration errors (invalid config file, missing required fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// State persistence errors (history database).
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SageError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates an unsafe-query error with the given message.
    pub fn unsafe_query(msg: impl Into<String>) -> Self {
        Self::UnsafeQuery(msg.into())
    }

    /// Creates a generation error with the given message.
    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    /// Creates an LLM error with the given message.
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    /// Creates a retrieval error with the given message.
    pub fn retrieval(msg: impl Into<String>) -> Self {
        Self::Retrieval(msg.into())
    }

    /// Creates an authentication error with the given message.
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a persistence error with the given message.
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::UnsafeQuery(_) => "Unsafe Query",
            Self::Generation(_) => "Generation Error",
            Self::Llm(_) => "LLM Error",
            Self::Retrieval(_) => "Retrieval Error",
            Self::Auth(_) => "Authentication Error",
            Self::Config(_) => "Configuration Error",
            Self::Persistence(_) => "Persistence Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns true if this error is a safety-gate rejection rather than an
    /// execution or infrastructure failure.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::UnsafeQuery(_))
    }
}

/// Result type alias using SageError.
pub type Result<T> = std::result::Result<T, SageError>;
