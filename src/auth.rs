//! JWT authentication.
//!
//! Issues and validates HS256 bearer tokens for the HTTP API. Credentials
//! are held in configuration (single-user deployment); the claims carry only
//! the subject and the usual timestamps.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::{Result, SageError};

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (username).
    pub sub: String,

    /// Issued at (Unix timestamp).
    pub iat: u64,

    /// Expiration time (Unix timestamp).
    pub exp: u64,
}

/// JWT authentication service.
pub struct AuthService {
    username: String,
    password: String,
    secret: String,
    expiry_minutes: i64,
    validation: Validation,
}

impl AuthService {
    /// Creates the service from configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 60; // 60 seconds leeway for clock skew

        Self {
            username: config.username.clone(),
            password: config.password.clone(),
            secret: config.jwt_secret.clone(),
            expiry_minutes: config.token_expiry_minutes,
            validation,
        }
    }

    /// Checks credentials and issues a token.
    pub fn login(&self, username: &str, password: &str) -> Result<String> {
        if username != self.username || password != self.password {
            return Err(SageError::auth("Invalid username or password"));
        }

        self.issue_token(username)
    }

    /// Issues a token for the subject.
    pub fn issue_token(&self, subject: &str) -> Result<String> {
        let now = chrono::Utc::now();
        let expires = now + chrono::Duration::minutes(self.expiry_minutes);

        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp() as u64,
            exp: expires.timestamp() as u64,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| SageError::auth(format!("Failed to sign token: {e}")))
    }

    /// Validates a token and extracts its claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &self.validation,
        )
        .map_err(|e| {
            if e.to_string().contains("ExpiredSignature") {
                SageError::auth("Token has expired")
            } else {
                SageError::auth(format!("Invalid token: {e}"))
            }
        })?;

        let claims = token_data.claims;
        if claims.sub.is_empty() {
            return Err(SageError::auth("Missing required claim: sub"));
        }

        Ok(claims)
    }

    /// Extracts the raw token from an Authorization header value.
    pub fn extract_token(auth_header: &str) -> Result<&str> {
        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| SageError::auth("Invalid token format (expected 'Bearer <token>')"))?;

        if token.is_empty() {
            return Err(SageError::auth("Missing JWT token"));
        }

        Ok(token)
    }
}
