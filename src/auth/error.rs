//! Authentication Errors
//! Mission: One typed failure per auth outcome, with stable client-facing messages

use crate::extract::json_rejection_message;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("identity already exists")]
    DuplicateIdentity,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("token signature or structure invalid")]
    TokenInvalid,
    #[error("token expired")]
    TokenExpired,
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("token signing misconfigured: {0}")]
    Signing(String),
    #[error("internal failure: {0}")]
    Internal(#[source] anyhow::Error),
}

impl AuthError {
    /// Stable error kind sent to clients
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::InvalidInput(_) => "invalid_input",
            AuthError::DuplicateIdentity => "duplicate_identity",
            AuthError::InvalidCredentials => "invalid_credentials",
            // Expired and forged tokens look the same from outside
            AuthError::TokenInvalid | AuthError::TokenExpired | AuthError::Unauthorized => {
                "unauthorized"
            }
            AuthError::Forbidden => "forbidden",
            AuthError::Signing(_) | AuthError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AuthError::DuplicateIdentity => StatusCode::CONFLICT,
            AuthError::InvalidCredentials
            | AuthError::TokenInvalid
            | AuthError::TokenExpired
            | AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::Signing(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn public_message(&self) -> String {
        match self {
            AuthError::InvalidInput(reason) => reason.clone(),
            AuthError::DuplicateIdentity => "User already exists".to_string(),
            AuthError::InvalidCredentials => "Invalid email or password".to_string(),
            AuthError::TokenInvalid | AuthError::TokenExpired | AuthError::Unauthorized => {
                "Authentication required".to_string()
            }
            AuthError::Forbidden => "Insufficient permissions".to_string(),
            AuthError::Signing(_) | AuthError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl From<JsonRejection> for AuthError {
    fn from(rejection: JsonRejection) -> Self {
        AuthError::InvalidInput(json_rejection_message(&rejection).to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match &self {
            AuthError::Internal(source) => error!("Auth internal failure: {:#}", source),
            AuthError::Signing(reason) => error!("Token signing failure: {}", reason),
            _ => {}
        }

        let body = json!({
            "error": self.kind(),
            "message": self.public_message(),
        });

        (self.status(), Json(body)).into_response()
    }
}
