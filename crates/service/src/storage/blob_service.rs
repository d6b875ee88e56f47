use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use configs::AppConfig;
use models::{Document, ObjectType, Timestamped};
use tracing::{debug, info};

use super::backend::{BackendError, BlobMeta, BucketSpec, ObjectStoreBackend, JSON_CONTENT_TYPE};
use super::freshness::{MarkerRefresher, RefreshCoordinator};
use super::marker::MarkerWriter;
use super::paths::ObjectPaths;
use super::service::StorageService;
use crate::errors::{Operation, StorageError};
use crate::observability::record_operation;

/// [`StorageService`] over a versioned blob store.
///
/// Writes and deletes signal the [`RefreshCoordinator`], which bumps the
/// type's `last-modified` marker in the background.
pub struct BlobStorageService {
    backend: Arc<dyn ObjectStoreBackend>,
    paths: ObjectPaths,
    markers: Arc<MarkerWriter>,
    coordinator: RefreshCoordinator,
    location: Option<String>,
    health_interval: Duration,
}

impl BlobStorageService {
    /// Build the service and start its refresh workers.
    ///
    /// # Panics
    /// When called outside a tokio runtime.
    pub fn new(backend: Arc<dyn ObjectStoreBackend>, config: &AppConfig) -> Result<Self, StorageError> {
        let paths = ObjectPaths::new(&config.storage.root_folder, &config.storage.data_filename)?;
        let markers = Arc::new(MarkerWriter::new(Arc::clone(&backend), paths.clone()));
        let refresher: Arc<dyn MarkerRefresher> = markers.clone();
        Ok(Self::assemble(backend, config, paths, markers, refresher))
    }

    /// Like [`BlobStorageService::new`] but refreshes through `refresher`
    /// instead of touching the markers directly.
    pub fn with_refresher(
        backend: Arc<dyn ObjectStoreBackend>,
        config: &AppConfig,
        refresher: Arc<dyn MarkerRefresher>,
    ) -> Result<Self, StorageError> {
        let paths = ObjectPaths::new(&config.storage.root_folder, &config.storage.data_filename)?;
        let markers = Arc::new(MarkerWriter::new(Arc::clone(&backend), paths.clone()));
        Ok(Self::assemble(backend, config, paths, markers, refresher))
    }

    fn assemble(
        backend: Arc<dyn ObjectStoreBackend>,
        config: &AppConfig,
        paths: ObjectPaths,
        markers: Arc<MarkerWriter>,
        refresher: Arc<dyn MarkerRefresher>,
    ) -> Self {
        Self {
            backend,
            paths,
            markers,
            coordinator: RefreshCoordinator::start(refresher, config.refresh.workers),
            location: config.storage.location().map(str::to_string),
            health_interval: config.health_interval(),
        }
    }

    pub fn paths(&self) -> &ObjectPaths {
        &self.paths
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    /// Stop the refresh workers after draining queued refreshes.
    pub async fn shutdown(self) {
        self.coordinator.shutdown().await;
    }

    fn bucket_error(&self, source: BackendError) -> StorageError {
        StorageError::Bucket { bucket: self.backend.bucket().to_string(), source }
    }

    async fn read_document(
        &self,
        operation: Operation,
        object_type: ObjectType,
        key: &str,
        blob: &BlobMeta,
    ) -> Result<Document, StorageError> {
        let bytes = self.backend.get_bytes(blob).await.map_err(|e| {
            if e.is_not_found() {
                // removed between metadata lookup and read
                StorageError::not_found(object_type, key)
            } else {
                StorageError::store(operation, object_type, Some(key), e)
            }
        })?;
        let mut document = Document::from_slice(object_type, &bytes)
            .map_err(|e| StorageError::store(operation, object_type, Some(key), e))?;
        document.set_last_modified(blob.updated);
        Ok(document)
    }

    async fn load_document(&self, object_type: ObjectType, key: &str) -> Result<Document, StorageError> {
        validate_key(key)?;
        let path = self.paths.data_path(object_type, key);
        let blob = self
            .backend
            .get(&path)
            .await
            .map_err(|e| StorageError::store(Operation::Load, object_type, Some(key), e))?
            .ok_or_else(|| StorageError::not_found(object_type, key))?;
        self.read_document(Operation::Load, object_type, key, &blob).await
    }

    async fn store_document(
        &self,
        object_type: ObjectType,
        key: &str,
        document: &Document,
    ) -> Result<(), StorageError> {
        validate_key(key)?;
        if document.object_type() != object_type {
            return Err(StorageError::Validation(format!(
                "{} document cannot be stored as {object_type}",
                document.object_type()
            )));
        }
        let bytes = document
            .to_vec()
            .map_err(|e| StorageError::store(Operation::Store, object_type, Some(key), e))?;
        let path = self.paths.data_path(object_type, key);
        let blob = self
            .backend
            .put(&path, bytes, JSON_CONTENT_TYPE)
            .await
            .map_err(|e| StorageError::store(Operation::Store, object_type, Some(key), e))?;
        debug!(%object_type, %key, updated = blob.updated, "stored document");
        self.coordinator.signal(object_type);
        Ok(())
    }

    async fn delete_document(&self, object_type: ObjectType, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        let path = self.paths.data_path(object_type, key);
        let deleted = self
            .backend
            .delete(&path)
            .await
            .map_err(|e| StorageError::store(Operation::Delete, object_type, Some(key), e))?;
        if deleted {
            debug!(%object_type, %key, "deleted document");
            self.coordinator.signal(object_type);
        }
        Ok(())
    }

    async fn list_document_keys(&self, object_type: ObjectType) -> Result<HashMap<String, i64>, StorageError> {
        let blobs = self
            .backend
            .list(&self.paths.prefix(object_type), false)
            .await
            .map_err(|e| StorageError::store(Operation::ListKeys, object_type, None, e))?;
        Ok(blobs
            .iter()
            .filter_map(|blob| {
                self.paths
                    .key_from_name(object_type, &blob.name)
                    .map(|key| (key.to_string(), blob.updated))
            })
            .collect())
    }

    async fn list_document_versions(
        &self,
        object_type: ObjectType,
        key: &str,
        max_results: usize,
    ) -> Result<Vec<Document>, StorageError> {
        validate_key(key)?;
        let path = self.paths.data_path(object_type, key);
        let mut blobs: Vec<BlobMeta> = self
            .backend
            .list(&path, true)
            .await
            .map_err(|e| StorageError::store(Operation::ListVersions, object_type, Some(key), e))?
            .into_iter()
            // the listing is by prefix and may include neighbouring names
            .filter(|blob| blob.name == path)
            .collect();
        blobs.sort_by_key(|blob| Reverse((blob.updated, blob.generation)));
        blobs.truncate(max_results);

        let mut documents = Vec::with_capacity(blobs.len());
        for blob in &blobs {
            documents.push(self.read_document(Operation::ListVersions, object_type, key, blob).await?);
        }
        Ok(documents)
    }

    async fn read_last_modified(&self, object_type: ObjectType) -> Result<i64, StorageError> {
        let marker = self
            .markers
            .read(object_type)
            .await
            .map_err(|e| StorageError::store(Operation::ReadLastModified, object_type, None, e))?;
        match marker {
            Some(updated) => Ok(updated),
            None => {
                debug!(%object_type, "last-modified marker missing; scheduling creation");
                self.coordinator.signal(object_type);
                Ok(0)
            }
        }
    }
}

fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() {
        return Err(StorageError::Validation("object key must not be empty".into()));
    }
    Ok(())
}

fn observed<T>(operation: &str, result: Result<T, StorageError>) -> Result<T, StorageError> {
    record_operation(operation, result.is_ok());
    result
}

#[async_trait]
impl StorageService for BlobStorageService {
    async fn ensure_store_exists(&self) -> Result<(), StorageError> {
        if self.backend.bucket_exists().await.map_err(|e| self.bucket_error(e))? {
            return Ok(());
        }
        info!(bucket = %self.backend.bucket(), location = ?self.location, "creating versioned bucket");
        let spec = BucketSpec { versioning: true, location: self.location.clone() };
        match self.backend.create_bucket(&spec).await {
            // another caller created it after our existence check
            Ok(()) | Err(BackendError::BucketExists(_)) => Ok(()),
            Err(e) => Err(self.bucket_error(e)),
        }
    }

    async fn supports_versioning(&self) -> Result<bool, StorageError> {
        self.backend.versioning_enabled().await.map_err(|e| self.bucket_error(e))
    }

    async fn load(&self, object_type: ObjectType, key: &str) -> Result<Document, StorageError> {
        observed("load", self.load_document(object_type, key).await)
    }

    async fn store(&self, object_type: ObjectType, key: &str, document: &Document) -> Result<(), StorageError> {
        observed("store", self.store_document(object_type, key, document).await)
    }

    async fn delete(&self, object_type: ObjectType, key: &str) -> Result<(), StorageError> {
        observed("delete", self.delete_document(object_type, key).await)
    }

    async fn list_keys(&self, object_type: ObjectType) -> Result<HashMap<String, i64>, StorageError> {
        observed("list_keys", self.list_document_keys(object_type).await)
    }

    async fn list_versions(
        &self,
        object_type: ObjectType,
        key: &str,
        max_results: usize,
    ) -> Result<Vec<Document>, StorageError> {
        observed("list_versions", self.list_document_versions(object_type, key, max_results).await)
    }

    async fn last_modified(&self, object_type: ObjectType) -> Result<i64, StorageError> {
        observed("last_modified", self.read_last_modified(object_type).await)
    }

    fn health_interval(&self) -> Duration {
        self.health_interval
    }
}
