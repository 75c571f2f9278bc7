//! Identity types reported by the auth gateway

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authenticated user as known to the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

impl AuthUser {
    pub fn new(id: Uuid, email: impl Into<String>) -> Self {
        Self {
            id,
            email: Some(email.into()),
        }
    }
}

/// Session issued on sign-in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Seconds until the access token expires
    pub expires_in: i64,
    pub user: AuthUser,
}

/// Result of a sign-up. Providers requiring e-mail confirmation return no session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthOutcome {
    pub user: AuthUser,
    pub session: Option<AuthSession>,
}
