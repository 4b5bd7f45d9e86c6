//! HTTP routing
//! Mission: Assemble public, authenticated and role-gated routers into one app

use crate::{
    auth::{api as auth_api, auth_middleware, role_guard, AuthState, JwtHandler, EVENT_MANAGERS},
    events::{api as events_api, EventState},
    middleware::{rate_limit_middleware, request_logging, RateLimiter},
};
use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
    pub events: EventState,
    pub jwt: Arc<JwtHandler>,
    pub limiter: RateLimiter,
}

pub fn build_router(state: AppState) -> Router {
    // Credential endpoints (throttled, no token required)
    let auth_router = Router::new()
        .route("/api/auth/register", post(auth_api::register))
        .route("/api/auth/login", post(auth_api::login))
        .route_layer(middleware::from_fn_with_state(
            state.limiter.clone(),
            rate_limit_middleware,
        ))
        .with_state(state.auth.clone());

    let me_router = Router::new()
        .route("/api/auth/me", get(auth_api::me))
        .route_layer(middleware::from_fn_with_state(
            state.jwt.clone(),
            auth_middleware,
        ))
        .with_state(state.auth.clone());

    // Any authenticated role
    let event_routes = Router::new()
        .route("/api/events", get(events_api::list_events))
        .route("/api/events/:id", get(events_api::get_event))
        .route(
            "/api/events/:id/register",
            post(events_api::register_attendance),
        )
        .route(
            "/api/events/:id/unregister",
            post(events_api::unregister_attendance),
        )
        .route("/api/events/:id/stats", get(events_api::event_stats))
        .route_layer(middleware::from_fn_with_state(
            state.jwt.clone(),
            auth_middleware,
        ))
        .with_state(state.events.clone());

    // Role guard runs after auth_middleware has attached the identity
    let manage_routes = Router::new()
        .route("/api/events", post(events_api::create_event))
        .route(
            "/api/events/:id",
            axum::routing::put(events_api::update_event).delete(events_api::delete_event),
        )
        .route_layer(middleware::from_fn_with_state(EVENT_MANAGERS, role_guard))
        .route_layer(middleware::from_fn_with_state(
            state.jwt.clone(),
            auth_middleware,
        ))
        .with_state(state.events.clone());

    let public_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .merge(public_routes)
        .merge(auth_router)
        .merge(me_router)
        .merge(event_routes)
        .merge(manage_routes)
        .layer(middleware::from_fn(request_logging))
        .layer(CorsLayer::permissive())
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
