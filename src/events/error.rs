//! Event API Errors

use crate::extract::{json_rejection_message, query_rejection_message};
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("{0}")]
    Validation(String),
    #[error("invalid event id")]
    InvalidId,
    #[error("event not found")]
    NotFound,
    #[error("event is fully booked")]
    EventFull,
    #[error("event is not accepting registrations")]
    EventClosed,
    #[error("no registrations to cancel")]
    NoRegistrations,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl From<JsonRejection> for EventError {
    fn from(rejection: JsonRejection) -> Self {
        EventError::Validation(json_rejection_message(&rejection).to_string())
    }
}

impl From<QueryRejection> for EventError {
    fn from(rejection: QueryRejection) -> Self {
        EventError::Validation(query_rejection_message(&rejection).to_string())
    }
}

impl IntoResponse for EventError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match &self {
            EventError::Validation(reason) => {
                (StatusCode::BAD_REQUEST, "invalid_input", reason.clone())
            }
            EventError::InvalidId => (
                StatusCode::BAD_REQUEST,
                "invalid_id",
                "Invalid event ID format".to_string(),
            ),
            EventError::NotFound => (
                StatusCode::NOT_FOUND,
                "not_found",
                "Event not found".to_string(),
            ),
            EventError::EventFull => (
                StatusCode::CONFLICT,
                "event_full",
                "Event is fully booked".to_string(),
            ),
            EventError::EventClosed => (
                StatusCode::CONFLICT,
                "event_closed",
                "Event is not accepting registrations".to_string(),
            ),
            EventError::NoRegistrations => (
                StatusCode::CONFLICT,
                "no_registrations",
                "Event has no registrations to cancel".to_string(),
            ),
            EventError::Storage(e) => {
                error!("Event storage failure: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": kind, "message": message }))).into_response()
    }
}
