//! API Middleware
//!
//! Bearer-token extractors for Axum. The shared [`AppState`] travels as a
//! request extension so extractors work under any router state.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::domain::AuthUser;
use crate::error::PlatformError;
use crate::operations::ExecutionContext;
use crate::service::{extract_bearer_token, AuthGateway};

/// Application state shared with the extractors
#[derive(Clone)]
pub struct AppState {
    pub auth_gateway: Arc<dyn AuthGateway>,
}

/// Caller resolved from a bearer token
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: AuthUser,
    pub access_token: String,
}

/// Extractor for authenticated requests. Rejects with 401.
pub struct Authenticated(pub AuthContext);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| PlatformError::unauthorized("Missing Authorization header").into_response())?;

        let token = extract_bearer_token(header)
            .ok_or_else(|| PlatformError::unauthorized("Invalid Authorization header format").into_response())?
            .to_string();

        let app_state = parts
            .extensions
            .get::<AppState>()
            .ok_or_else(|| PlatformError::internal("AppState not found").into_response())?;

        let user = app_state
            .auth_gateway
            .current_user(&token)
            .await
            .map_err(|e| e.into_response())?
            .ok_or_else(|| PlatformError::unauthorized("Invalid or expired session").into_response())?;

        Ok(Authenticated(AuthContext {
            user,
            access_token: token,
        }))
    }
}

/// Extractor for optionally authenticated requests. Never rejects; any
/// failure to resolve the token yields an anonymous caller.
pub struct OptionalAuth(pub Option<AuthContext>);

impl OptionalAuth {
    pub fn execution_context(&self) -> ExecutionContext {
        ExecutionContext::new(self.0.as_ref().map(|ctx| ctx.user.clone()))
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = match parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(extract_bearer_token)
        {
            Some(t) => t.to_string(),
            None => return Ok(OptionalAuth(None)),
        };

        let app_state = match parts.extensions.get::<AppState>() {
            Some(s) => s,
            None => return Ok(OptionalAuth(None)),
        };

        match app_state.auth_gateway.current_user(&token).await {
            Ok(Some(user)) => Ok(OptionalAuth(Some(AuthContext {
                user,
                access_token: token,
            }))),
            Ok(None) => Ok(OptionalAuth(None)),
            Err(e) => {
                warn!(error = %e, "Could not resolve session; treating caller as anonymous");
                Ok(OptionalAuth(None))
            }
        }
    }
}
