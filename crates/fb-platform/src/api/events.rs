//! Events API
//!
//! REST endpoints for listing, reading, creating and deleting events.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use fb_common::ActionResponse;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::api::common::{json_body, EventResponse};
use crate::api::middleware::OptionalAuth;
use crate::domain::{EventFilter, NewVenue, PosterInput, PosterPolicy, PosterUpload, SportType, StoredPosterRef};
use crate::error::{PlatformError, Result};
use crate::operations::{CreateEventCommand, CreateEventUseCase, CreatedEvent, DeleteEventUseCase};
use crate::repository::EventRepository;

/// Room for the non-poster JSON fields of a create request
const REQUEST_FIELDS_ALLOWANCE: usize = 64 * 1024;

/// Largest create request body: a maximum-size poster as base64 plus fields.
pub fn request_body_limit(policy: &PosterPolicy) -> usize {
    policy.max_bytes.div_ceil(3) * 4 + REQUEST_FIELDS_ALLOWANCE
}

/// Query parameters for the events list
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventsQuery {
    /// Case-insensitive substring of the event name
    pub search: Option<String>,
    /// Sport name, or `all`
    pub sport: Option<String>,
}

/// Venue as submitted with a new event
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VenueRequest {
    pub name: String,
    pub address: Option<String>,
    pub capacity: Option<i32>,
}

impl From<VenueRequest> for NewVenue {
    fn from(v: VenueRequest) -> Self {
        NewVenue {
            name: v.name.trim().to_string(),
            address: v.address,
            capacity: v.capacity,
        }
    }
}

/// Poster attached to a new event
#[derive(Debug, Deserialize, ToSchema)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum PosterRequest {
    /// Image bytes sent inline
    Upload {
        #[serde(rename = "fileName")]
        file_name: String,
        #[serde(rename = "contentType")]
        content_type: String,
        /// Base64 image data, optionally as a `data:` URL
        data: String,
    },
    /// Image the client already put into the poster bucket
    Storage {
        /// Object key, `{userId}/{file}`
        key: String,
        #[serde(rename = "contentType")]
        content_type: String,
        /// Object size in bytes
        size: usize,
    },
}

impl PosterRequest {
    fn into_input(self) -> Result<PosterInput> {
        match self {
            PosterRequest::Upload {
                file_name,
                content_type,
                data,
            } => {
                let encoded = match data.split_once(";base64,") {
                    Some((prefix, rest)) if prefix.starts_with("data:") => rest,
                    _ => data.as_str(),
                };
                let bytes = STANDARD
                    .decode(encoded.trim())
                    .map_err(|_| PlatformError::validation("Poster data is not valid base64"))?;
                Ok(PosterInput::Upload(PosterUpload {
                    file_name,
                    content_type,
                    bytes: Bytes::from(bytes),
                }))
            }
            PosterRequest::Storage {
                key,
                content_type,
                size,
            } => Ok(PosterInput::Stored(StoredPosterRef {
                key,
                content_type,
                size,
            })),
        }
    }
}

/// Create event request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    /// 1 to 100 characters
    pub name: String,

    /// One of the supported sport names
    pub sport_type: String,

    pub date_time: DateTime<Utc>,

    /// Up to 500 characters
    pub description: Option<String>,

    pub poster: Option<PosterRequest>,

    /// At least one venue
    #[serde(default)]
    pub venues: Vec<VenueRequest>,
}

impl CreateEventRequest {
    fn into_command(self) -> Result<CreateEventCommand> {
        if self.sport_type.trim().is_empty() {
            return Err(PlatformError::validation("Sport type is required"));
        }
        let sport_type: SportType = self.sport_type.parse().map_err(PlatformError::validation)?;

        Ok(CreateEventCommand {
            name: self.name,
            sport_type,
            date_time: self.date_time,
            description: self.description,
            poster: self.poster.map(PosterRequest::into_input).transpose()?,
            venues: self.venues.into_iter().map(NewVenue::from).collect(),
        })
    }
}

/// Events service state
#[derive(Clone)]
pub struct EventsState {
    pub event_repo: Arc<dyn EventRepository>,
    pub create_use_case: Arc<CreateEventUseCase>,
    pub delete_use_case: Arc<DeleteEventUseCase>,
}

/// List events, soonest first
#[utoipa::path(
    get,
    path = "/api/events",
    tag = "events",
    params(EventsQuery),
    responses(
        (status = 200, description = "Matching events", body = Vec<EventResponse>),
        (status = 400, description = "Unknown sport type")
    )
)]
pub async fn list_events(
    State(state): State<EventsState>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<ActionResponse<Vec<EventResponse>>>> {
    let filter = EventFilter::from_query(query.search.as_deref(), query.sport.as_deref())
        .map_err(PlatformError::validation)?;

    let events = state.event_repo.list(&filter).await?;
    Ok(Json(ActionResponse::success(
        events.into_iter().map(EventResponse::from).collect(),
    )))
}

/// Get an event with its venues
#[utoipa::path(
    get,
    path = "/api/events/{id}",
    tag = "events",
    params(("id" = String, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event found", body = EventResponse),
        (status = 404, description = "Event not found")
    )
)]
pub async fn get_event(
    State(state): State<EventsState>,
    Path(id): Path<String>,
) -> Result<Json<ActionResponse<EventResponse>>> {
    let id = Uuid::parse_str(&id).map_err(|_| PlatformError::not_found("Event", &id))?;
    let event = state
        .event_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| PlatformError::not_found("Event", id.to_string()))?;

    Ok(Json(ActionResponse::success(event.into())))
}

/// Create an event with venues and an optional poster
#[utoipa::path(
    post,
    path = "/api/events",
    tag = "events",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = CreatedEvent),
        (status = 400, description = "Validation error or rejected poster"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Event or venues could not be stored")
    )
)]
pub async fn create_event(
    State(state): State<EventsState>,
    auth: OptionalAuth,
    payload: std::result::Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ActionResponse<CreatedEvent>>)> {
    let ctx = auth.execution_context();
    // Anonymous callers are rejected before the body is looked at
    ctx.require_user("You must be logged in to create events")?;

    let payload = match payload {
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return Err(state.create_use_case.config().poster_policy.too_large());
        }
        other => other,
    };
    let command = json_body(payload)?.into_command()?;
    let created = state.create_use_case.execute(command, &ctx).await?;

    Ok((StatusCode::CREATED, Json(ActionResponse::success(created))))
}

/// Delete an owned event, its venues and its poster
#[utoipa::path(
    delete,
    path = "/api/events/{id}",
    tag = "events",
    params(("id" = String, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Event not found or not owned by the caller")
    )
)]
pub async fn delete_event(
    State(state): State<EventsState>,
    auth: OptionalAuth,
    Path(id): Path<String>,
) -> Result<Json<ActionResponse<()>>> {
    let ctx = auth.execution_context();
    ctx.require_user("You must be logged in to delete events")?;

    let id = Uuid::parse_str(&id).map_err(|_| PlatformError::delete_failed("Event not found"))?;
    state.delete_use_case.execute(id, &ctx).await?;

    Ok(Json(ActionResponse::success(())))
}

pub fn events_router(state: EventsState) -> Router {
    let body_limit = request_body_limit(&state.create_use_case.config().poster_policy);
    Router::new()
        .route("/", get(list_events).post(create_event))
        .route("/:id", get(get_event).delete(delete_event))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
