//! OpenAPI Documentation

use utoipa::OpenApi;

/// Platform API OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Fastbreak Platform API",
        version = "1.0.0",
        description = "REST APIs for sports events, venues and authentication. \
            Every response body is an envelope: {\"success\": true, \"data\": ...} \
            or {\"success\": false, \"error\": \"...\"}."
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "events", description = "Event management"),
        (name = "auth", description = "Authentication"),
        (name = "monitoring", description = "Health checks")
    ),
    paths(
        super::events::list_events,
        super::events::get_event,
        super::events::create_event,
        super::events::delete_event,
        super::auth::sign_up,
        super::auth::sign_in,
        super::auth::sign_out,
        super::auth::current_user,
        super::health::health,
        super::health::ready,
    ),
    components(
        schemas(
            super::events::CreateEventRequest,
            super::events::VenueRequest,
            super::events::PosterRequest,
            super::common::EventResponse,
            super::common::VenueResponse,
            super::common::SessionResponse,
            super::common::UserResponse,
            super::auth::SignUpRequest,
            super::auth::SignInRequest,
            super::auth::SignUpResponse,
            super::health::HealthResponse,
            crate::operations::CreatedEvent,
        )
    )
)]
pub struct PlatformApiDoc;
