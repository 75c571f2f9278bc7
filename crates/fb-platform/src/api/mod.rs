//! API Layer
//!
//! REST endpoints for the platform. Every endpoint answers with the
//! `ActionResponse` envelope.

pub mod auth;
pub mod common;
pub mod events;
pub mod health;
pub mod middleware;
pub mod openapi;

use std::sync::Arc;

use axum::{Extension, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::operations::{CreateEventConfig, CreateEventUseCase, DeleteEventUseCase};
use crate::repository::EventRepository;
use crate::service::AuthGateway;
use crate::storage::PosterStorage;

pub use auth::{auth_router, AuthApiState};
pub use common::*;
pub use events::{events_router, EventsState};
pub use health::health_router;
pub use middleware::{AppState, AuthContext, Authenticated, OptionalAuth};
pub use openapi::PlatformApiDoc;

/// Adapters the HTTP surface is built on
#[derive(Clone)]
pub struct PlatformServices {
    pub event_repo: Arc<dyn EventRepository>,
    pub poster_storage: Arc<dyn PosterStorage>,
    pub auth_gateway: Arc<dyn AuthGateway>,
    pub create_config: CreateEventConfig,
}

/// Build the full platform router: auth, events, health and API docs.
pub fn create_router(services: PlatformServices) -> Router {
    let PlatformServices {
        event_repo,
        poster_storage,
        auth_gateway,
        create_config,
    } = services;

    let events_state = EventsState {
        event_repo: event_repo.clone(),
        create_use_case: Arc::new(CreateEventUseCase::new(
            event_repo.clone(),
            poster_storage.clone(),
            create_config,
        )),
        delete_use_case: Arc::new(DeleteEventUseCase::new(event_repo, poster_storage)),
    };
    let auth_state = AuthApiState {
        auth_gateway: auth_gateway.clone(),
    };
    let app_state = AppState { auth_gateway };

    Router::new()
        .nest("/api/events", events_router(events_state))
        .nest("/auth", auth_router(auth_state))
        .merge(health_router())
        .merge(SwaggerUi::new("/swagger-ui").url("/q/openapi", PlatformApiDoc::openapi()))
        .layer(Extension(app_state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
}
