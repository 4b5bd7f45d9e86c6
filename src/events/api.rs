//! Event API Endpoints
//! Mission: Event CRUD, attendance and stats behind the auth gate

use crate::auth::models::Identity;
use crate::events::{
    error::EventError,
    models::{
        CreateEventRequest, EventEnvelope, EventPage, EventQuery, EventStats, UpdateEventRequest,
    },
    store::EventStore,
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Clone)]
pub struct EventState {
    pub store: Arc<EventStore>,
}

impl EventState {
    pub fn new(store: Arc<EventStore>) -> Self {
        Self { store }
    }
}

#[derive(Debug, Serialize)]
pub struct StatsEnvelope {
    pub success: bool,
    pub data: EventStats,
}

#[derive(Debug, Serialize)]
pub struct MessageEnvelope {
    pub success: bool,
    pub message: &'static str,
}

fn parse_id(raw: &str) -> Result<Uuid, EventError> {
    Uuid::parse_str(raw).map_err(|_| EventError::InvalidId)
}

/// List and search events - GET /api/events
pub async fn list_events(
    State(state): State<EventState>,
    query: Result<Query<EventQuery>, QueryRejection>,
) -> Result<Json<EventPage>, EventError> {
    let Query(query) = query?;
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let (events, total) = state.store.list(&query.filter(), page, limit)?;

    Ok(Json(EventPage {
        success: true,
        count: events.len(),
        total,
        page,
        pages: total.div_ceil(u64::from(limit)),
        data: events,
    }))
}

/// Get one event - GET /api/events/:id
pub async fn get_event(
    State(state): State<EventState>,
    Path(id): Path<String>,
) -> Result<Json<EventEnvelope>, EventError> {
    let id = parse_id(&id)?;
    let event = state.store.get(&id)?.ok_or(EventError::NotFound)?;

    Ok(Json(EventEnvelope {
        success: true,
        data: event,
        message: None,
    }))
}

/// Create event - POST /api/events (ClubAdmin, SuperAdmin)
pub async fn create_event(
    State(state): State<EventState>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<EventEnvelope>), EventError> {
    let Json(payload) = payload?;
    let event = payload.into_event(identity.id, Utc::now())?;
    state.store.create(&event)?;

    Ok((
        StatusCode::CREATED,
        Json(EventEnvelope {
            success: true,
            data: event,
            message: Some("Event created successfully"),
        }),
    ))
}

/// Update event - PUT /api/events/:id (ClubAdmin, SuperAdmin)
pub async fn update_event(
    State(state): State<EventState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateEventRequest>, JsonRejection>,
) -> Result<Json<EventEnvelope>, EventError> {
    let id = parse_id(&id)?;
    let Json(payload) = payload?;
    let existing = state.store.get(&id)?.ok_or(EventError::NotFound)?;
    let event = payload.apply(existing, Utc::now())?;
    let event = state.store.update(&event)?;

    info!("✏️  Updated event: {} ({})", event.title, event.id);

    Ok(Json(EventEnvelope {
        success: true,
        data: event,
        message: Some("Event updated successfully"),
    }))
}

/// Delete event - DELETE /api/events/:id (ClubAdmin, SuperAdmin)
pub async fn delete_event(
    State(state): State<EventState>,
    Path(id): Path<String>,
) -> Result<Json<MessageEnvelope>, EventError> {
    let id = parse_id(&id)?;
    state.store.delete(&id)?;

    Ok(Json(MessageEnvelope {
        success: true,
        message: "Event deleted successfully",
    }))
}

/// Take a seat - POST /api/events/:id/register
pub async fn register_attendance(
    State(state): State<EventState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<EventEnvelope>, EventError> {
    let id = parse_id(&id)?;
    let event = state.store.register_attendee(&id, Utc::now())?;

    info!(
        "🎟️  {} registered for {} ({}/{})",
        identity.id,
        event.id,
        event.current_attendees,
        event
            .max_attendees
            .map_or_else(|| "∞".to_string(), |m| m.to_string())
    );

    Ok(Json(EventEnvelope {
        success: true,
        data: event,
        message: Some("Registered for event"),
    }))
}

/// Give up a seat - POST /api/events/:id/unregister
pub async fn unregister_attendance(
    State(state): State<EventState>,
    Path(id): Path<String>,
) -> Result<Json<EventEnvelope>, EventError> {
    let id = parse_id(&id)?;
    let event = state.store.unregister_attendee(&id, Utc::now())?;

    Ok(Json(EventEnvelope {
        success: true,
        data: event,
        message: Some("Registration cancelled"),
    }))
}

/// Event stats - GET /api/events/:id/stats
pub async fn event_stats(
    State(state): State<EventState>,
    Path(id): Path<String>,
) -> Result<Json<StatsEnvelope>, EventError> {
    let id = parse_id(&id)?;
    let event = state.store.get(&id)?.ok_or(EventError::NotFound)?;

    Ok(Json(StatsEnvelope {
        success: true,
        data: event.stats(Utc::now()),
    }))
}
