//! Poster images
//!
//! Posters either arrive with the create request (server upload) or are put
//! into the bucket by the client beforehand and referenced by key (client
//! upload). Which shape is accepted is a deployment setting.

use std::str::FromStr;

use bytes::Bytes;
use uuid::Uuid;

use crate::error::{PlatformError, Result};

pub const DEFAULT_MAX_POSTER_BYTES: usize = 5 * 1024 * 1024;

pub const ALLOWED_POSTER_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// Where poster bytes are sent to object storage from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PosterUploadMode {
    /// The workflow uploads the bytes it received
    #[default]
    Server,
    /// The client uploaded the object already; the workflow only attaches it
    Client,
}

impl FromStr for PosterUploadMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "server" => Ok(Self::Server),
            "client" => Ok(Self::Client),
            other => Err(format!("unknown poster upload mode '{}'", other)),
        }
    }
}

/// Poster bytes received by the server
#[derive(Debug, Clone)]
pub struct PosterUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Poster object the client already placed in the bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPosterRef {
    pub key: String,
    pub content_type: String,
    pub size: usize,
}

#[derive(Debug, Clone)]
pub enum PosterInput {
    Upload(PosterUpload),
    Stored(StoredPosterRef),
}

impl PosterInput {
    pub fn content_type(&self) -> &str {
        match self {
            PosterInput::Upload(p) => &p.content_type,
            PosterInput::Stored(p) => &p.content_type,
        }
    }

    pub fn size(&self) -> usize {
        match self {
            PosterInput::Upload(p) => p.bytes.len(),
            PosterInput::Stored(p) => p.size,
        }
    }
}

/// Size and type limits for poster images
#[derive(Debug, Clone)]
pub struct PosterPolicy {
    pub max_bytes: usize,
    pub allowed_types: Vec<String>,
}

impl Default for PosterPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_POSTER_BYTES,
            allowed_types: ALLOWED_POSTER_TYPES.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl PosterPolicy {
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn too_large(&self) -> PlatformError {
        PlatformError::invalid_poster(format!("Image must be less than {}", human_size(self.max_bytes)))
    }

    /// Check a poster before anything is sent to storage.
    pub fn validate(&self, poster: &PosterInput, mode: PosterUploadMode, owner: Uuid) -> Result<()> {
        match (mode, poster) {
            (PosterUploadMode::Server, PosterInput::Stored(_)) => {
                return Err(PlatformError::invalid_poster("Poster image must be sent with the event"));
            }
            (PosterUploadMode::Client, PosterInput::Upload(_)) => {
                return Err(PlatformError::invalid_poster(
                    "Poster image must be uploaded to storage before creating the event",
                ));
            }
            (PosterUploadMode::Client, PosterInput::Stored(stored)) => {
                let prefix = format!("{}/", owner);
                let file = stored.key.strip_prefix(&prefix).unwrap_or_default();
                if file.is_empty() || file.contains('/') || file.contains("..") {
                    return Err(PlatformError::invalid_poster(
                        "Poster image must be stored in the owner's folder",
                    ));
                }
            }
            (PosterUploadMode::Server, PosterInput::Upload(_)) => {}
        }

        let size = poster.size();
        if size == 0 {
            return Err(PlatformError::invalid_poster("Poster image is empty"));
        }
        if size > self.max_bytes {
            return Err(self.too_large());
        }

        let content_type = normalize_content_type(poster.content_type());
        if !self.allowed_types.iter().any(|t| t == &content_type) {
            return Err(PlatformError::invalid_poster(
                "Only JPG, PNG and WEBP images are supported",
            ));
        }

        Ok(())
    }
}

/// Lowercased MIME type without parameters (`image/png; q=1` -> `image/png`).
pub fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// File extension for a poster, preferring the uploaded file name.
pub fn poster_extension(file_name: &str, content_type: &str) -> String {
    let from_name = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.trim().to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    from_name.unwrap_or_else(|| {
        match normalize_content_type(content_type).as_str() {
            "image/png" => "png",
            "image/webp" => "webp",
            _ => "jpg",
        }
        .to_string()
    })
}

/// Object key `{userId}/{eventId}-{timestamp}.{ext}`
pub fn poster_key(owner: Uuid, event_id: Uuid, extension: &str, timestamp_millis: i64) -> String {
    format!("{}/{}-{}.{}", owner, event_id, timestamp_millis, extension)
}

fn human_size(bytes: usize) -> String {
    const MIB: usize = 1024 * 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{} bytes", bytes)
    }
}
