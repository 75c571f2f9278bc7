//! Platform Error Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fb_common::ActionResponse;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("{entity_type} not found")]
    NotFound { entity_type: String, id: String },

    #[error("Duplicate entity: {entity_type} with {field}={value}")]
    Duplicate { entity_type: String, field: String, value: String },

    #[error("{message}")]
    Validation { message: String },

    #[error("{message}")]
    Unauthorized { message: String },

    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("Failed to create event: {message}")]
    CreateFailed { message: String },

    #[error("{message}")]
    InvalidPoster { message: String },

    #[error("Failed to upload poster: {message}")]
    UploadFailed { message: String },

    #[error("Failed to create event venues: {message}")]
    VenuesFailed { message: String },

    #[error("Failed to delete event: {message}")]
    DeleteFailed { message: String },

    #[error("{message}")]
    AuthProvider { status: u16, message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PlatformError {
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(entity_type: impl Into<String>, field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Duplicate {
            entity_type: entity_type.into(),
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized { message: message.into() }
    }

    pub fn create_failed(message: impl Into<String>) -> Self {
        Self::CreateFailed { message: message.into() }
    }

    pub fn invalid_poster(message: impl Into<String>) -> Self {
        Self::InvalidPoster { message: message.into() }
    }

    pub fn upload_failed(message: impl Into<String>) -> Self {
        Self::UploadFailed { message: message.into() }
    }

    pub fn venues_failed(message: impl Into<String>) -> Self {
        Self::VenuesFailed { message: message.into() }
    }

    pub fn delete_failed(message: impl Into<String>) -> Self {
        Self::DeleteFailed { message: message.into() }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage { message: message.into() }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } | Self::DeleteFailed { .. } => StatusCode::NOT_FOUND,
            Self::Duplicate { .. } => StatusCode::CONFLICT,
            Self::Validation { .. } | Self::InvalidPoster { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::UploadFailed { .. } | Self::Storage { .. } => StatusCode::BAD_GATEWAY,
            Self::AuthProvider { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            Self::CreateFailed { .. }
            | Self::VenuesFailed { .. }
            | Self::Database(_)
            | Self::Http(_)
            | Self::Json(_)
            | Self::Configuration { .. }
            | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to callers. Infrastructure failures are not echoed back.
    pub fn public_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Http(_) | Self::Json(_) | Self::Configuration { .. } | Self::Internal { .. } => {
                "An unexpected error occurred".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for PlatformError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, status = status.as_u16(), "Request failed");
        }
        let body: ActionResponse<()> = ActionResponse::failure(self.public_message());
        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, PlatformError>;
