//! Auth API Endpoints
//!
//! - POST /auth/signup - Register with e-mail and password
//! - POST /auth/login - Password sign-in
//! - POST /auth/logout - Revoke the current session
//! - GET /auth/me - Current user, or null when anonymous

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use fb_common::ActionResponse;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::common::{json_body, SessionResponse, UserResponse};
use crate::api::middleware::{Authenticated, OptionalAuth};
use crate::error::{PlatformError, Result};
use crate::service::AuthGateway;

const PASSWORD_MIN_CHARS: usize = 8;
const PASSWORD_MAX_CHARS: usize = 100;

/// Sign-up request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub email: String,
    /// 8 to 100 characters
    pub password: String,
    /// Must equal `password`
    pub confirm_password: String,
}

impl SignUpRequest {
    fn validate(&self) -> Result<()> {
        validate_email(&self.email)?;
        let len = self.password.chars().count();
        if len < PASSWORD_MIN_CHARS {
            return Err(PlatformError::validation("Password must be at least 8 characters"));
        }
        if len > PASSWORD_MAX_CHARS {
            return Err(PlatformError::validation("Password must be less than 100 characters"));
        }
        if self.password != self.confirm_password {
            return Err(PlatformError::validation("Passwords don't match"));
        }
        Ok(())
    }
}

/// Sign-in request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

impl SignInRequest {
    fn validate(&self) -> Result<()> {
        validate_email(&self.email)?;
        if self.password.is_empty() {
            return Err(PlatformError::validation("Password is required"));
        }
        Ok(())
    }
}

/// Sign-up response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignUpResponse {
    pub user_id: Uuid,
    /// Absent when the provider requires e-mail confirmation first
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionResponse>,
}

/// Auth service state
#[derive(Clone)]
pub struct AuthApiState {
    pub auth_gateway: Arc<dyn AuthGateway>,
}

/// Loose address check: one `@`, a local part, and a dotted domain.
fn validate_email(email: &str) -> Result<()> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.split('.').count() >= 2
                && domain.split('.').all(|part| !part.is_empty())
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(PlatformError::validation("Invalid email address"))
    }
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/auth/signup",
    tag = "auth",
    request_body = SignUpRequest,
    responses(
        (status = 200, description = "User registered", body = SignUpResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "E-mail already registered")
    )
)]
pub async fn sign_up(
    State(state): State<AuthApiState>,
    payload: std::result::Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<Json<ActionResponse<SignUpResponse>>> {
    let req = json_body(payload)?;
    req.validate()?;

    let outcome = state.auth_gateway.sign_up(req.email.trim(), &req.password).await?;
    info!(user_id = %outcome.user.id, "User signed up");

    Ok(Json(ActionResponse::success(SignUpResponse {
        user_id: outcome.user.id,
        session: outcome.session.map(SessionResponse::from),
    })))
}

/// Sign in with e-mail and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Login successful", body = SessionResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn sign_in(
    State(state): State<AuthApiState>,
    payload: std::result::Result<Json<SignInRequest>, JsonRejection>,
) -> Result<Json<ActionResponse<SessionResponse>>> {
    let req = json_body(payload)?;
    req.validate()?;

    let session = state.auth_gateway.sign_in(req.email.trim(), &req.password).await?;
    info!(user_id = %session.user.id, "User signed in");

    Ok(Json(ActionResponse::success(session.into())))
}

/// Revoke the caller's session
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Logged out"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn sign_out(
    State(state): State<AuthApiState>,
    auth: Authenticated,
) -> Result<Json<ActionResponse<()>>> {
    state.auth_gateway.sign_out(&auth.0.access_token).await?;
    info!(user_id = %auth.0.user.id, "User signed out");
    Ok(Json(ActionResponse::success(())))
}

/// Current user, or null for anonymous callers
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user info", body = UserResponse)
    )
)]
pub async fn current_user(auth: OptionalAuth) -> Json<ActionResponse<Option<UserResponse>>> {
    Json(ActionResponse::success(auth.0.map(|ctx| ctx.user.into())))
}

pub fn auth_router(state: AuthApiState) -> Router {
    Router::new()
        .route("/signup", post(sign_up))
        .route("/login", post(sign_in))
        .route("/logout", post(sign_out))
        .route("/me", get(current_user))
        .with_state(state)
}
