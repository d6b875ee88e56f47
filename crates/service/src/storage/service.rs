use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use models::{Document, ObjectType};

use crate::errors::StorageError;

/// Persistence of typed documents plus per-type freshness.
///
/// Implementations must be shareable across tasks; every method may be called
/// concurrently.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Create the backing bucket (versioned) if it is not there yet.
    async fn ensure_store_exists(&self) -> Result<(), StorageError>;

    async fn supports_versioning(&self) -> Result<bool, StorageError>;

    /// Load a document, stamped with the backend modification time.
    async fn load(&self, object_type: ObjectType, key: &str) -> Result<Document, StorageError>;

    /// Load several documents of one type, in `keys` order. Stops at the first failure.
    async fn load_many(&self, object_type: ObjectType, keys: &[String]) -> Result<Vec<Document>, StorageError> {
        let mut documents = Vec::with_capacity(keys.len());
        for key in keys {
            documents.push(self.load(object_type, key).await?);
        }
        Ok(documents)
    }

    /// Write `document` under `key`, replacing whatever is there.
    async fn store(&self, object_type: ObjectType, key: &str, document: &Document) -> Result<(), StorageError>;

    /// Delete `key`. Deleting an absent key succeeds without effect.
    async fn delete(&self, object_type: ObjectType, key: &str) -> Result<(), StorageError>;

    async fn bulk_delete(&self, object_type: ObjectType, keys: &[String]) -> Result<(), StorageError> {
        for key in keys {
            self.delete(object_type, key).await?;
        }
        Ok(())
    }

    /// Every key of `object_type` with its modification time. Order is unspecified.
    async fn list_keys(&self, object_type: ObjectType) -> Result<HashMap<String, i64>, StorageError>;

    /// Historical versions of one document, newest first, at most `max_results`.
    async fn list_versions(
        &self,
        object_type: ObjectType,
        key: &str,
        max_results: usize,
    ) -> Result<Vec<Document>, StorageError>;

    /// Modification time of the type's freshness marker, or 0 when the marker
    /// does not exist yet (its creation is scheduled as a side effect).
    async fn last_modified(&self, object_type: ObjectType) -> Result<i64, StorageError>;

    /// How often callers should poll health of this store.
    fn health_interval(&self) -> Duration {
        Duration::from_secs(30)
    }
}
