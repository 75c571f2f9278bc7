//! Poster Storage
//!
//! Object storage for event poster images. Objects are addressed by key
//! (`{userId}/{file}`) inside a single bucket and served from a public URL.

pub mod http;
pub mod memory;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

pub use http::{HttpPosterStorage, HttpStorageConfig};
pub use memory::InMemoryPosterStorage;

/// Metadata of an object as reported by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub size: usize,
    pub content_type: String,
}

#[async_trait]
pub trait PosterStorage: Send + Sync {
    /// Store a new object and return its public URL. Existing keys are never
    /// overwritten.
    async fn upload(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<String>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Size and content type of a stored object, or `None` if it does not exist.
    async fn object_info(&self, key: &str) -> Result<Option<ObjectInfo>>;

    /// Public URL of `key`. Pure; does not check that the object exists.
    fn public_url(&self, key: &str) -> String;
}

/// `{base}/storage/v1/object/public/{bucket}/{key}` with each key segment
/// percent-encoded.
pub fn public_object_url(base_url: &str, bucket: &str, key: &str) -> String {
    format!(
        "{}/storage/v1/object/public/{}/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(bucket),
        encode_key(key)
    )
}

pub(crate) fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Recover the object key from a public poster URL.
///
/// Keys are `{userId}/{file}`, so the key is the last two path segments.
/// Returns `None` when the URL has fewer than two non-empty segments.
pub fn poster_key_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let mut segments = path.rsplit('/');
    let file = segments.next().filter(|s| !s.is_empty())?;
    let folder = segments.next().filter(|s| !s.is_empty() && !s.ends_with(':'))?;

    let file = urlencoding::decode(file).ok()?;
    let folder = urlencoding::decode(folder).ok()?;
    Some(format!("{}/{}", folder, file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_url_shape() {
        assert_eq!(
            public_object_url("https://abc.example.co/", "event-posters", "u1/e1-17.png"),
            "https://abc.example.co/storage/v1/object/public/event-posters/u1/e1-17.png"
        );
    }

    #[test]
    fn test_key_round_trips_through_url() {
        let key = "5f1c/Team Photo.png";
        let url = public_object_url("http://localhost:8080", "event-posters", key);
        assert_eq!(poster_key_from_url(&url).as_deref(), Some(key));
    }

    #[test]
    fn test_key_from_url_ignores_query() {
        assert_eq!(
            poster_key_from_url("https://x/storage/v1/object/public/b/u1/p.webp?t=1").as_deref(),
            Some("u1/p.webp")
        );
    }

    #[test]
    fn test_key_from_short_url() {
        assert_eq!(poster_key_from_url("poster.png"), None);
        assert_eq!(poster_key_from_url("https://x/"), None);
    }
}
