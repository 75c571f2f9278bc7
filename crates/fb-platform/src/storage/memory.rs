//! In-memory Poster Storage

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use crate::error::{PlatformError, Result};
use crate::storage::{public_object_url, ObjectInfo, PosterStorage};

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub content_type: String,
}

pub struct InMemoryPosterStorage {
    base_url: String,
    bucket: String,
    objects: RwLock<HashMap<String, StoredObject>>,
    fail_uploads: AtomicBool,
    fail_deletes: AtomicBool,
}

impl InMemoryPosterStorage {
    pub fn new(base_url: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            bucket: bucket.into(),
            objects: RwLock::new(HashMap::new()),
            fail_uploads: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
        }
    }

    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.read().contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

#[async_trait]
impl PosterStorage for InMemoryPosterStorage {
    async fn upload(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<String> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(PlatformError::storage("upload rejected"));
        }

        let mut objects = self.objects.write();
        if objects.contains_key(key) {
            return Err(PlatformError::storage("The resource already exists"));
        }
        objects.insert(
            key.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(self.public_url(key))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(PlatformError::storage("delete rejected"));
        }
        self.objects.write().remove(key);
        Ok(())
    }

    async fn object_info(&self, key: &str) -> Result<Option<ObjectInfo>> {
        Ok(self.objects.read().get(key).map(|object| ObjectInfo {
            size: object.bytes.len(),
            content_type: object.content_type.clone(),
        }))
    }

    fn public_url(&self, key: &str) -> String {
        public_object_url(&self.base_url, &self.bucket, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_never_overwrites() {
        let storage = InMemoryPosterStorage::new("http://localhost:8080", "event-posters");
        let url = storage
            .upload("u1/p.png", Bytes::from_static(b"one"), "image/png")
            .await
            .unwrap();
        assert_eq!(url, "http://localhost:8080/storage/v1/object/public/event-posters/u1/p.png");

        assert!(storage
            .upload("u1/p.png", Bytes::from_static(b"two"), "image/png")
            .await
            .is_err());
        assert_eq!(storage.get("u1/p.png").unwrap().bytes, Bytes::from_static(b"one"));
    }

    #[tokio::test]
    async fn test_delete_and_failure_toggle() {
        let storage = InMemoryPosterStorage::new("http://localhost:8080", "event-posters");
        storage.upload("u1/p.png", Bytes::from_static(b"x"), "image/png").await.unwrap();

        storage.set_fail_deletes(true);
        assert!(storage.delete("u1/p.png").await.is_err());
        assert!(storage.contains("u1/p.png"));

        storage.set_fail_deletes(false);
        storage.delete("u1/p.png").await.unwrap();
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_object_info_reports_stored_metadata() {
        let storage = InMemoryPosterStorage::new("http://localhost:8080", "event-posters");
        storage.upload("u1/p.webp", Bytes::from_static(b"webp!"), "image/webp").await.unwrap();

        let info = storage.object_info("u1/p.webp").await.unwrap().unwrap();
        assert_eq!(info.size, 5);
        assert_eq!(info.content_type, "image/webp");
        assert!(storage.object_info("u1/missing.png").await.unwrap().is_none());
    }
}
