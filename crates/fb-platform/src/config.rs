//! Platform Configuration
//!
//! Loaded from `FB_*` environment variables. See the server binary for the
//! full table of variables and defaults.

use std::str::FromStr;

use fb_common::LogFormat;

use crate::domain::{PosterPolicy, PosterUploadMode, DEFAULT_MAX_POSTER_BYTES};
use crate::error::{PlatformError, Result};
use crate::operations::CreateEventConfig;

pub const DEFAULT_API_PORT: u16 = 8080;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_POSTER_BUCKET: &str = "event-posters";

/// Connection details for the hosted backend (identity provider and object storage)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedBackendConfig {
    pub url: String,
    /// Public key sent to the identity provider
    pub anon_key: String,
    /// Key with write access to the poster bucket
    pub service_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    pub api_port: u16,
    /// Run on in-memory adapters; no database or hosted backend needed
    pub dev_mode: bool,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub backend: Option<HostedBackendConfig>,
    pub poster_bucket: String,
    pub poster_upload_mode: PosterUploadMode,
    pub poster_max_bytes: usize,
    /// Base of poster URLs served in dev mode
    pub public_base_url: String,
    pub log_format: LogFormat,
}

impl PlatformConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_port: u16 = parse_or(&get, "FB_API_PORT", DEFAULT_API_PORT)?;
        let dev_mode = match get("FB_DEV_MODE") {
            Some(v) => parse_bool("FB_DEV_MODE", &v)?,
            None => false,
        };

        let database_url = get("FB_DATABASE_URL");
        let database_max_connections = parse_or(&get, "FB_DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        if database_max_connections == 0 {
            return Err(PlatformError::configuration("FB_DATABASE_MAX_CONNECTIONS must be at least 1"));
        }

        let backend = match (
            get("FB_PLATFORM_URL"),
            get("FB_PLATFORM_ANON_KEY"),
            get("FB_PLATFORM_SERVICE_KEY"),
        ) {
            (Some(url), Some(anon_key), Some(service_key)) => Some(HostedBackendConfig {
                url: url.trim_end_matches('/').to_string(),
                anon_key,
                service_key,
            }),
            (None, None, None) => None,
            _ => {
                return Err(PlatformError::configuration(
                    "FB_PLATFORM_URL, FB_PLATFORM_ANON_KEY and FB_PLATFORM_SERVICE_KEY must be set together",
                ))
            }
        };

        if !dev_mode {
            if database_url.is_none() {
                return Err(PlatformError::configuration("FB_DATABASE_URL is required unless FB_DEV_MODE is set"));
            }
            if backend.is_none() {
                return Err(PlatformError::configuration("FB_PLATFORM_URL is required unless FB_DEV_MODE is set"));
            }
        }

        let poster_max_bytes = parse_or(&get, "FB_POSTER_MAX_BYTES", DEFAULT_MAX_POSTER_BYTES)?;
        if poster_max_bytes == 0 {
            return Err(PlatformError::configuration("FB_POSTER_MAX_BYTES must be positive"));
        }

        Ok(Self {
            api_port,
            dev_mode,
            database_url,
            database_max_connections,
            backend,
            poster_bucket: get("FB_POSTER_BUCKET").unwrap_or_else(|| DEFAULT_POSTER_BUCKET.to_string()),
            poster_upload_mode: parse_or(&get, "FB_POSTER_UPLOAD", PosterUploadMode::Server)?,
            poster_max_bytes,
            public_base_url: get("FB_PUBLIC_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| format!("http://localhost:{}", api_port)),
            log_format: parse_or(&get, "FB_LOG_FORMAT", LogFormat::Text)?,
        })
    }

    pub fn create_event_config(&self) -> CreateEventConfig {
        CreateEventConfig {
            upload_mode: self.poster_upload_mode,
            poster_policy: PosterPolicy::default().with_max_bytes(self.poster_max_bytes),
        }
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| PlatformError::configuration(format!("invalid {} '{}': {}", key, raw, e))),
        None => Ok(default),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(PlatformError::configuration(format!("invalid {} '{}': expected true or false", key, raw))),
    }
}
