//! Request and response models for the HTTP API.

use serde::{Deserialize, Serialize};

use crate::history::HistoryEntry;
use crate::retrieval::PartitionStats;

/// Login request body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response body.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
}

impl LoginResponse {
    /// Wraps a token as a bearer credential.
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

/// Question request body.
#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    /// The natural-language question.
    pub question: String,

    /// Optional extra context folded into generation.
    #[serde(default)]
    pub context: Option<String>,

    /// Engine to use; defaults to the configured engine. Accepts
    /// `pipeline`, `graph`, `chain`, and their legacy aliases.
    #[serde(default)]
    pub method: Option<String>,
}

/// Uniform error body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    /// Creates an error body with a short code and human-readable message.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

/// Knowledge-base statistics response.
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub stats: Vec<PartitionStats>,
}

/// Knowledge-base initialization response.
#[derive(Debug, Clone, Serialize)]
pub struct InitializeResponse {
    pub message: String,
    pub documents_indexed: usize,
}

/// Query-history response.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub history: Vec<HistoryEntry>,
}

/// Service info for the root endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    pub message: String,
    pub version: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ask_request_deserializes_with_defaults() {
        let request: AskRequest =
            serde_json::from_str(r#"{"question": "how many orders?"}"#).unwrap();
        assert_eq!(request.question, "how many orders?");
        assert!(request.context.is_none());
        assert!(request.method.is_none());
    }

    #[test]
    fn test_ask_request_with_method() {
        let request: AskRequest = serde_json::from_str(
            r#"{"question": "q", "context": "c", "method": "langgraph"}"#,
        )
        .unwrap();
        assert_eq!(request.method.as_deref(), Some("langgraph"));
        assert_eq!(request.context.as_deref(), Some("c"));
    }

    #[test]
    fn test_login_response_bearer() {
        let response = LoginResponse::bearer("abc".to_string());
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"token_type\":\"bearer\""));
        assert!(json.contains("\"access_token\":\"abc\""));
    }

    #[test]
    fn test_error_response_shape() {
        let json =
            serde_json::to_string(&ErrorResponse::new("unauthorized", "Invalid token")).unwrap();
        assert!(json.contains("\"error\":\"unauthorized\""));
        assert!(json.contains("\"message\":\"Invalid token\""));
    }
}
