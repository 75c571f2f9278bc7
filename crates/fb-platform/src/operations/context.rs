//! Execution Context

use uuid::Uuid;

use crate::domain::AuthUser;
use crate::error::{PlatformError, Result};

/// Per-request context passed into every use case.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Correlates all log lines of one use case execution
    pub execution_id: String,
    /// Resolved caller, if the request was authenticated
    pub principal: Option<AuthUser>,
}

impl ExecutionContext {
    pub fn new(principal: Option<AuthUser>) -> Self {
        Self {
            execution_id: Uuid::new_v4().to_string(),
            principal,
        }
    }

    pub fn anonymous() -> Self {
        Self::new(None)
    }

    pub fn authenticated(user: AuthUser) -> Self {
        Self::new(Some(user))
    }

    /// The caller, or `Unauthorized` with `message`.
    pub fn require_user(&self, message: &str) -> Result<&AuthUser> {
        self.principal
            .as_ref()
            .ok_or_else(|| PlatformError::unauthorized(message))
    }
}
