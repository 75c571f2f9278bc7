//! Common API types and utilities

use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{AuthSession, AuthUser, EventWithVenues, Venue};
use crate::error::{PlatformError, Result};

/// Unwrap a JSON body, turning malformed input into a validation failure so
/// it is reported in the same envelope as every other error.
pub fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| PlatformError::validation(rejection.body_text()))
}

/// Venue response DTO
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VenueResponse {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub capacity: Option<i32>,
    pub created_at: String,
}

impl From<Venue> for VenueResponse {
    fn from(v: Venue) -> Self {
        Self {
            id: v.id,
            event_id: v.event_id,
            name: v.name,
            address: v.address,
            capacity: v.capacity,
            created_at: v.created_at.to_rfc3339(),
        }
    }
}

/// Event response DTO, including venues
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    /// One of the supported sport names, e.g. "Track & Field"
    pub sport_type: String,
    pub date_time: String,
    pub description: Option<String>,
    pub poster_url: Option<String>,
    pub venues: Vec<VenueResponse>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<EventWithVenues> for EventResponse {
    fn from(e: EventWithVenues) -> Self {
        let EventWithVenues { event, venues } = e;
        Self {
            id: event.id,
            user_id: event.user_id,
            name: event.name,
            sport_type: event.sport_type.to_string(),
            date_time: event.date_time.to_rfc3339(),
            description: event.description,
            poster_url: event.poster_url,
            venues: venues.into_iter().map(VenueResponse::from).collect(),
            created_at: event.created_at.to_rfc3339(),
            updated_at: event.updated_at.to_rfc3339(),
        }
    }
}

/// User response DTO
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl From<AuthUser> for UserResponse {
    fn from(u: AuthUser) -> Self {
        Self { id: u.id, email: u.email }
    }
}

/// Session response DTO
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub access_token: String,
    /// Always "bearer"
    pub token_type: String,
    /// Seconds until the access token expires
    pub expires_in: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub user: UserResponse,
}

impl From<AuthSession> for SessionResponse {
    fn from(s: AuthSession) -> Self {
        Self {
            access_token: s.access_token,
            token_type: "bearer".to_string(),
            expires_in: s.expires_in,
            refresh_token: s.refresh_token,
            user: s.user.into(),
        }
    }
}
