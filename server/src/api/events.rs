//! Event management API endpoints.
//!
//! - POST /api/events - Publish a new event
//! - GET /api/events - List upcoming published events
//! - GET /api/events/:id - Get event details
//! - GET /api/events/:id/availability - Seat availability

use crate::error::AppError;
use crate::server::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use meetlocal_core::types::{Event, EventId, VenueAllocation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Seat allocation at one venue
#[derive(Debug, Deserialize, Serialize)]
pub struct VenuePayload {
    /// Venue name
    pub venue: String,
    /// Seats available at this venue
    pub seats: u32,
}

/// Request to publish a new event
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    /// Short marketing tagline
    pub tagline: String,
    /// City the event takes place in
    pub city: String,
    /// Calendar date in the venue time zone (`YYYY-MM-DD`)
    pub date: NaiveDate,
    /// Local start time, `"HH:MM"`
    pub start_time: String,
    /// Local end time, `"HH:MM"`
    pub end_time: String,
    /// Per-venue seat allocations; capacity is their sum
    pub venues: Vec<VenuePayload>,
    /// Create as an unpublished draft
    #[serde(default)]
    pub is_draft: bool,
}

/// Response after creating an event
#[derive(Debug, Serialize)]
pub struct CreateEventResponse {
    /// Created event ID
    pub event_id: Uuid,
}

/// Event details
#[derive(Debug, Serialize)]
pub struct EventResponse {
    /// Event ID
    pub id: Uuid,
    /// Tagline
    pub tagline: String,
    /// City
    pub city: String,
    /// Date
    pub date: NaiveDate,
    /// Local start time
    pub start_time: String,
    /// Local end time
    pub end_time: String,
    /// Total seat capacity
    pub capacity: u32,
    /// Per-venue allocations
    pub venues: Vec<VenuePayload>,
}

impl EventResponse {
    fn from_event(event: Event) -> Self {
        Self {
            id: *event.id.as_uuid(),
            capacity: event.capacity(),
            tagline: event.tagline,
            city: event.city,
            date: event.date,
            start_time: event.start_time,
            end_time: event.end_time,
            venues: event
                .venues
                .into_iter()
                .map(|v| VenuePayload { venue: v.venue, seats: v.seats })
                .collect(),
        }
    }
}

/// Event list response
#[derive(Debug, Serialize)]
pub struct ListEventsResponse {
    /// Upcoming published events
    pub events: Vec<EventResponse>,
    /// Total count
    pub total: usize,
}

/// Seat availability response
#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    /// Registered participants
    pub current: u32,
    /// Total seat capacity
    pub total: u32,
    /// Remaining seats
    pub available: u32,
}

/// Publish a new event.
pub async fn create_event(
    State(state): State<AppState>,
    Json(payload): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<CreateEventResponse>), AppError> {
    if payload.venues.is_empty() {
        return Err(AppError::bad_request("An event needs at least one venue allocation"));
    }
    if payload.venues.iter().all(|v| v.seats == 0) {
        return Err(AppError::bad_request("An event needs at least one seat"));
    }

    let event = Event {
        id: EventId::new(),
        tagline: payload.tagline,
        city: payload.city,
        date: payload.date,
        start_time: payload.start_time,
        end_time: payload.end_time,
        venues: payload
            .venues
            .into_iter()
            .map(|v| VenueAllocation { venue: v.venue, seats: v.seats })
            .collect(),
        is_draft: payload.is_draft,
        is_canceled: false,
        capacity_warning_sent: false,
        created_at: Utc::now(),
    };
    state.store.insert_event(&event).await?;

    tracing::info!(event_id = %event.id, capacity = event.capacity(), "event published");
    Ok((StatusCode::CREATED, Json(CreateEventResponse { event_id: *event.id.as_uuid() })))
}

/// List upcoming published events.
pub async fn list_events(
    State(state): State<AppState>,
) -> Result<Json<ListEventsResponse>, AppError> {
    let today = state.clock.now().with_timezone(&state.time_zone).date_naive();
    let events = state.store.list_open_events(today).await?;
    let events: Vec<EventResponse> = events.into_iter().map(EventResponse::from_event).collect();
    let total = events.len();
    Ok(Json(ListEventsResponse { events, total }))
}

/// Get event details by ID.
pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<EventResponse>, AppError> {
    let event = state
        .store
        .event(EventId::from_uuid(event_id))
        .await?
        .ok_or_else(|| AppError::not_found("Event", event_id))?;
    Ok(Json(EventResponse::from_event(event)))
}

/// Get seat availability for an event.
pub async fn get_availability(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let event_id = EventId::from_uuid(event_id);
    let event = state
        .store
        .event(event_id)
        .await?
        .ok_or_else(|| AppError::not_found("Event", event_id))?;
    let current = state.store.registered_count(event_id).await?;
    let total = event.capacity();
    Ok(Json(AvailabilityResponse { current, total, available: total.saturating_sub(current) }))
}
