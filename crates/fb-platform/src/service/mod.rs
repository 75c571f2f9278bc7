//! Service Layer
//!
//! Gateways to the external identity provider.

pub mod http_auth;
pub mod memory_auth;

use async_trait::async_trait;

use crate::domain::{AuthOutcome, AuthSession, AuthUser};
use crate::error::Result;

pub use http_auth::{HttpAuthConfig, HttpAuthGateway};
pub use memory_auth::InMemoryAuthGateway;

/// Sign-up, sign-in and session lookup against an identity provider.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthOutcome>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession>;

    /// Revoke the session behind `access_token`.
    async fn sign_out(&self, access_token: &str) -> Result<()>;

    /// Resolve a token to its user. `None` for unknown or expired tokens.
    async fn current_user(&self, access_token: &str) -> Result<Option<AuthUser>>;
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn extract_bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}
