use async_trait::async_trait;
use thiserror::Error;

/// Content type written for documents.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Descriptor of one stored blob version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobMeta {
    pub name: String,
    /// Backend version id; distinguishes historical blobs at the same name.
    pub generation: u64,
    /// Backend modification time, milliseconds since the Unix epoch.
    pub updated: i64,
}

/// Bucket provisioning request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketSpec {
    pub versioning: bool,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("bucket not found: {0}")]
    BucketNotFound(String),
    #[error("bucket already exists: {0}")]
    BucketExists(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("backend error: {0}")]
    Other(String),
}

impl BackendError {
    /// The 404-equivalent condition for a missing object.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::NotFound(_))
    }
}

/// Versioned blob storage bound to a single bucket.
///
/// Implementations adapt a concrete object store (GCS, S3, Azure, ...) and must
/// be safe to share across tasks.
#[async_trait]
pub trait ObjectStoreBackend: Send + Sync {
    fn bucket(&self) -> &str;

    async fn bucket_exists(&self) -> Result<bool, BackendError>;

    async fn create_bucket(&self, spec: &BucketSpec) -> Result<(), BackendError>;

    async fn versioning_enabled(&self) -> Result<bool, BackendError>;

    /// Metadata of the live blob at `path`, `None` when absent.
    async fn get(&self, path: &str) -> Result<Option<BlobMeta>, BackendError>;

    /// Content of exactly the version described by `blob`.
    async fn get_bytes(&self, blob: &BlobMeta) -> Result<Vec<u8>, BackendError>;

    /// Write `bytes` at `path`, replacing the live blob.
    async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<BlobMeta, BackendError>;

    /// Metadata-only write that bumps the modification time.
    /// Fails with [`BackendError::NotFound`] when nothing lives at `path`.
    async fn update(&self, path: &str) -> Result<BlobMeta, BackendError>;

    /// Returns whether a live blob was removed.
    async fn delete(&self, path: &str) -> Result<bool, BackendError>;

    /// Blobs whose name starts with `prefix`. With `include_versions` every
    /// historical version is returned, otherwise only live blobs.
    async fn list(&self, prefix: &str, include_versions: bool) -> Result<Vec<BlobMeta>, BackendError>;
}
