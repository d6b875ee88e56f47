use std::sync::Arc;

use async_trait::async_trait;
use models::ObjectType;
use tracing::{debug, warn};

use super::backend::{BackendError, BlobMeta, ObjectStoreBackend};
use super::freshness::MarkerRefresher;
use super::paths::ObjectPaths;
use crate::observability::{MARKER_REFRESH_DURATION, MARKER_REFRESH_ERRORS_TOTAL, MARKER_REFRESH_TOTAL};

const MARKER_CONTENT_TYPE: &str = "application/octet-stream";

/// Reads and bumps the zero-byte `last-modified` marker of each type.
pub struct MarkerWriter {
    backend: Arc<dyn ObjectStoreBackend>,
    paths: ObjectPaths,
}

impl MarkerWriter {
    pub fn new(backend: Arc<dyn ObjectStoreBackend>, paths: ObjectPaths) -> Self {
        Self { backend, paths }
    }

    /// Backend modification time of the marker, `None` while it does not exist.
    pub async fn read(&self, object_type: ObjectType) -> Result<Option<i64>, BackendError> {
        let marker = self.backend.get(&self.paths.marker_path(object_type)).await?;
        Ok(marker.map(|blob| blob.updated))
    }

    /// Touch the marker, creating it when the backend reports it missing.
    pub async fn touch(&self, object_type: ObjectType) -> Result<BlobMeta, BackendError> {
        let path = self.paths.marker_path(object_type);
        // A metadata-only update is enough to move the modification time.
        match self.backend.update(&path).await {
            Err(error) if error.is_not_found() => {
                debug!(%object_type, "creating last-modified marker");
                self.backend.put(&path, Vec::new(), MARKER_CONTENT_TYPE).await
            }
            result => result,
        }
    }
}

#[async_trait]
impl MarkerRefresher for MarkerWriter {
    async fn refresh(&self, object_type: ObjectType) {
        MARKER_REFRESH_TOTAL.inc();
        let timer = MARKER_REFRESH_DURATION.start_timer();
        match self.touch(object_type).await {
            Ok(blob) => debug!(%object_type, updated = blob.updated, "last-modified marker refreshed"),
            Err(error) => {
                MARKER_REFRESH_ERRORS_TOTAL.inc();
                warn!(%object_type, %error, "error updating last modified time");
            }
        }
        timer.observe_duration();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::backend::BucketSpec;
    use crate::storage::memory::{BackendOp, InMemoryObjectStore};

    async fn writer() -> Result<(Arc<InMemoryObjectStore>, MarkerWriter), BackendError> {
        let backend = Arc::new(InMemoryObjectStore::new("markers"));
        backend.create_bucket(&BucketSpec { versioning: true, location: None }).await?;
        let paths = ObjectPaths::new("store", "specification.json").expect("valid paths");
        Ok((backend.clone(), MarkerWriter::new(backend, paths)))
    }

    #[tokio::test]
    async fn touch_creates_then_updates() -> Result<(), BackendError> {
        let (backend, writer) = writer().await?;
        assert_eq!(writer.read(ObjectType::Pipeline).await?, None);

        let created = writer.touch(ObjectType::Pipeline).await?;
        let touched = writer.touch(ObjectType::Pipeline).await?;
        assert!(touched.updated > created.updated);
        assert_eq!(writer.read(ObjectType::Pipeline).await?, Some(touched.updated));

        let path = "store/pipelines/last-modified";
        assert_eq!(backend.calls(BackendOp::Update, path), 2);
        assert_eq!(backend.calls(BackendOp::Put, path), 1);
        Ok(())
    }

    #[tokio::test]
    async fn refresh_swallows_backend_errors() -> Result<(), BackendError> {
        let (backend, writer) = writer().await?;
        backend.inject_failure(BackendOp::Update, BackendError::PermissionDenied("marker".into()));

        writer.refresh(ObjectType::Project).await;
        // no create attempt for errors other than not-found
        assert_eq!(backend.calls(BackendOp::Put, "store/projects/last-modified"), 0);
        assert_eq!(writer.read(ObjectType::Project).await?, None);

        writer.refresh(ObjectType::Project).await;
        assert!(writer.read(ObjectType::Project).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn failed_create_is_swallowed() -> Result<(), BackendError> {
        let (backend, writer) = writer().await?;
        backend.inject_failure(BackendOp::Put, BackendError::Unavailable("503".into()));

        writer.refresh(ObjectType::Notification).await;
        assert_eq!(writer.read(ObjectType::Notification).await?, None);
        Ok(())
    }
}
