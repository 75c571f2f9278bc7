//! Health endpoints

use axum::{routing::get, Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    tag = "monitoring",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "UP".to_string(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    })
}

/// Readiness probe
#[utoipa::path(
    get,
    path = "/ready",
    tag = "monitoring",
    responses((status = 200, description = "Service is ready", body = HealthResponse))
)]
pub async fn ready() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "READY".to_string(),
        version: None,
    })
}

pub fn health_router() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
}
