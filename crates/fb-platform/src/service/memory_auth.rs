//! In-memory Auth Gateway
//!
//! Local identity provider for development mode and tests. Passwords are
//! stored as Argon2id hashes; sessions are opaque random tokens.

use std::collections::HashMap;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use rand::RngCore;
use tracing::debug;
use uuid::Uuid;

use crate::domain::{AuthOutcome, AuthSession, AuthUser};
use crate::error::{PlatformError, Result};
use crate::service::AuthGateway;

/// Lifetime of an access token
const SESSION_TTL_SECS: i64 = 3600;

struct StoredUser {
    id: Uuid,
    email: String,
    password_hash: String,
}

struct StoredSession {
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct InMemoryAuthGateway {
    /// Keyed by lowercased e-mail
    users: RwLock<HashMap<String, StoredUser>>,
    sessions: RwLock<HashMap<String, StoredSession>>,
}

impl InMemoryAuthGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn hash_password(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PlatformError::internal(format!("password hashing failed: {}", e)))
    }

    fn verify_password(password: &str, hash: &str) -> bool {
        PasswordHash::new(hash)
            .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
            .unwrap_or(false)
    }

    fn generate_token() -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Issue a token. Expired sessions are dropped here so tokens that are
    /// never presented again do not accumulate.
    fn open_session(&self, user: AuthUser) -> AuthSession {
        let access_token = Self::generate_token();
        let now = Utc::now();
        {
            let mut sessions = self.sessions.write();
            sessions.retain(|_, session| session.expires_at > now);
            sessions.insert(
                access_token.clone(),
                StoredSession {
                    user_id: user.id,
                    expires_at: now + Duration::seconds(SESSION_TTL_SECS),
                },
            );
        }
        AuthSession {
            access_token,
            refresh_token: Some(Self::generate_token()),
            expires_in: SESSION_TTL_SECS,
            user,
        }
    }
}

#[async_trait]
impl AuthGateway for InMemoryAuthGateway {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthOutcome> {
        let email = email.trim().to_lowercase();
        if self.users.read().contains_key(&email) {
            return Err(PlatformError::duplicate("User", "email", email));
        }

        let password_hash = Self::hash_password(password)?;
        let user = AuthUser::new(Uuid::new_v4(), email.clone());
        {
            let mut users = self.users.write();
            if users.contains_key(&email) {
                return Err(PlatformError::duplicate("User", "email", email));
            }
            users.insert(
                email.clone(),
                StoredUser {
                    id: user.id,
                    email,
                    password_hash,
                },
            );
        }

        debug!(user_id = %user.id, "Registered local user");
        let session = self.open_session(user.clone());
        Ok(AuthOutcome {
            user,
            session: Some(session),
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        let email = email.trim().to_lowercase();
        let user = {
            let users = self.users.read();
            let stored = users.get(&email).ok_or(PlatformError::InvalidCredentials)?;
            if !Self::verify_password(password, &stored.password_hash) {
                return Err(PlatformError::InvalidCredentials);
            }
            AuthUser::new(stored.id, stored.email.clone())
        };
        Ok(self.open_session(user))
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        self.sessions.write().remove(access_token);
        Ok(())
    }

    async fn current_user(&self, access_token: &str) -> Result<Option<AuthUser>> {
        let user_id = {
            let mut sessions = self.sessions.write();
            match sessions.get(access_token) {
                Some(session) if session.expires_at > Utc::now() => session.user_id,
                Some(_) => {
                    sessions.remove(access_token);
                    return Ok(None);
                }
                None => return Ok(None),
            }
        };

        let users = self.users.read();
        Ok(users
            .values()
            .find(|u| u.id == user_id)
            .map(|u| AuthUser::new(u.id, u.email.clone())))
    }
}
