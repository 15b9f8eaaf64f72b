//! Authentication handlers and the bearer-token extractor.

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest, HttpResponse};
use std::future::{ready, Ready};

use crate::auth::Claims;
use crate::http::models::{ErrorResponse, LoginRequest, LoginResponse};
use crate::http::AppState;

/// POST /api/v1/auth/login
///
/// Checks credentials and returns a bearer token.
pub async fn login_handler(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> HttpResponse {
    match state.auth.login(&body.username, &body.password) {
        Ok(token) => HttpResponse::Ok().json(LoginResponse::bearer(token)),
        Err(e) => HttpResponse::Unauthorized()
            .insert_header(("WWW-Authenticate", "Bearer"))
            .json(ErrorResponse::new("unauthorized", e.to_string())),
    }
}

/// The authenticated caller, extracted from the Authorization header.
///
/// Handlers take this as a parameter to require a valid bearer token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub claims: Claims,
}

impl AuthenticatedUser {
    /// The caller's username.
    pub fn username(&self) -> &str {
        &self.claims.sub
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

/// Validates the bearer token on a request.
fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, actix_web::Error> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("missing application state"))?;

    let header = req
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| unauthorized("Missing Authorization header"))?;

    let token = crate::auth::AuthService::extract_token(header)
        .map_err(|e| unauthorized(e.to_string()))?;

    let claims = state
        .auth
        .validate_token(token)
        .map_err(|e| unauthorized(e.to_string()))?;

    Ok(AuthenticatedUser { claims })
}

/// Builds a 401 with the uniform error body.
fn unauthorized(message: impl Into<String>) -> actix_web::Error {
    let response = HttpResponse::Unauthorized()
        .insert_header(("WWW-Authenticate", "Bearer"))
        .json(ErrorResponse::new("unauthorized", message.into()));
    actix_web::error::InternalError::from_response("unauthorized", response).into()
}
