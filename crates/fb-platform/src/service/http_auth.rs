//! HTTP Auth Gateway
//!
//! Client for the hosted identity provider's REST API. Requests carry the
//! project's public `apikey`; user-scoped calls add the caller's bearer token.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::domain::{AuthOutcome, AuthSession, AuthUser};
use crate::error::{PlatformError, Result};
use crate::service::AuthGateway;

#[derive(Debug, Clone)]
pub struct HttpAuthConfig {
    pub base_url: String,
    pub anon_key: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: i64,
    user: AuthUser,
}

impl From<TokenResponse> for AuthSession {
    fn from(token: TokenResponse) -> Self {
        AuthSession {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_in: token.expires_in,
            user: token.user,
        }
    }
}

/// Error body. Different endpoints use different field names.
#[derive(Debug, Default, Deserialize)]
struct ProviderError {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ProviderError {
    fn into_message(self) -> Option<String> {
        self.msg.or(self.error_description).or(self.message).or(self.error)
    }
}

pub struct HttpAuthGateway {
    config: HttpAuthConfig,
    client: reqwest::Client,
}

impl HttpAuthGateway {
    pub fn new(config: HttpAuthConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    pub fn with_client(config: HttpAuthConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.url(path))
            .header("apikey", &self.config.anon_key)
    }

    async fn provider_error(response: reqwest::Response) -> PlatformError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ProviderError>(&text)
            .ok()
            .and_then(ProviderError::into_message)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Authentication failed").to_string());

        warn!(status = status.as_u16(), message = %message, "Identity provider rejected request");
        PlatformError::AuthProvider {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl AuthGateway for HttpAuthGateway {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthOutcome> {
        let response = self
            .request(reqwest::Method::POST, "/signup")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::provider_error(response).await);
        }

        // Auto-confirmed projects answer with a session, others with the bare user
        let body: Value = response.json().await?;
        if body.get("access_token").is_some() {
            let session: AuthSession = serde_json::from_value::<TokenResponse>(body)?.into();
            debug!(user_id = %session.user.id, "Signed up with session");
            return Ok(AuthOutcome {
                user: session.user.clone(),
                session: Some(session),
            });
        }

        let user_value = body.get("user").cloned().unwrap_or(body);
        let user: AuthUser = serde_json::from_value(user_value)?;
        debug!(user_id = %user.id, "Signed up pending confirmation");
        Ok(AuthOutcome { user, session: None })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        let response = self
            .request(reqwest::Method::POST, "/token?grant_type=password")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => {
                let token: TokenResponse = response.json().await?;
                Ok(token.into())
            }
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                match Self::provider_error(response).await {
                    PlatformError::AuthProvider { message, .. }
                        if message.eq_ignore_ascii_case("invalid login credentials")
                            || message == "invalid_grant" =>
                    {
                        Err(PlatformError::InvalidCredentials)
                    }
                    other => Err(other),
                }
            }
            _ => Err(Self::provider_error(response).await),
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        let response = self
            .request(reqwest::Method::POST, "/logout")
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => Ok(()),
            // Already gone
            StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND => Ok(()),
            _ => Err(Self::provider_error(response).await),
        }
    }

    async fn current_user(&self, access_token: &str) -> Result<Option<AuthUser>> {
        let response = self
            .request(reqwest::Method::GET, "/user")
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => Ok(Some(response.json().await?)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            _ => Err(Self::provider_error(response).await),
        }
    }
}
