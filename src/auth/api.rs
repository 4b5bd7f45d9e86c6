//! Authentication API Endpoints
//! Mission: Provide register, login and current-user endpoints

use crate::auth::{
    error::AuthError,
    models::{
        Identity, LoginRequest, LoginResponse, MeResponse, RegisterRequest, RegisterResponse,
        UserResponse,
    },
    service::AuthService,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use tracing::info;

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub service: Arc<AuthService>,
}

impl AuthState {
    pub fn new(service: Arc<AuthService>) -> Self {
        Self { service }
    }
}

/// bcrypt and SQLite both block; keep them off the async workers
async fn run_blocking<T, F>(f: F) -> Result<T, AuthError>
where
    F: FnOnce() -> Result<T, AuthError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AuthError::Internal(anyhow::anyhow!("auth task panicked: {}", e)))?
}

/// Register endpoint - POST /api/auth/register
pub async fn register(
    State(state): State<AuthState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), AuthError> {
    let Json(payload) = payload?;
    info!("📝 Registration attempt: {}", payload.email.trim());

    let service = state.service.clone();
    let user = run_blocking(move || {
        service.register(&payload.email, &payload.password, payload.profile)
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered",
            user: UserResponse::from_user(&user),
        }),
    ))
}

/// Login endpoint - POST /api/auth/login
pub async fn login(
    State(state): State<AuthState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AuthError> {
    let Json(payload) = payload?;
    info!("🔐 Login attempt: {}", payload.email.trim());

    let service = state.service.clone();
    let outcome = run_blocking(move || service.login(&payload.email, &payload.password)).await?;

    Ok(Json(LoginResponse {
        token: outcome.token.token,
        expires_in: outcome.token.expires_in,
        role: outcome.user.role,
        user: UserResponse::from_user(&outcome.user),
    }))
}

/// Get current user info - GET /api/auth/me
pub async fn me(
    State(state): State<AuthState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<MeResponse>, AuthError> {
    let service = state.service.clone();
    let user = run_blocking(move || service.current_user(&identity.id)).await?;

    Ok(Json(MeResponse {
        user: UserResponse::from_user(&user),
    }))
}
