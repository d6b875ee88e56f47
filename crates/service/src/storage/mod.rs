//! Blob-backed document storage.
//!
//! - `backend`: the object store boundary and its error type.
//! - `memory`: versioned in-memory backend.
//! - `paths`: (type, key) to object name mapping and its inverse.
//! - `freshness`: debounced refresh of the per-type `last-modified` markers.
//! - `marker`: reading and touching those markers.
//! - `service` / `blob_service`: the typed document API.

pub mod backend;
pub mod blob_service;
pub mod freshness;
pub mod marker;
pub mod memory;
pub mod paths;
pub mod service;

pub use backend::{BackendError, BlobMeta, BucketSpec, ObjectStoreBackend};
pub use blob_service::BlobStorageService;
pub use freshness::{MarkerRefresher, RefreshCoordinator, RefreshState};
pub use memory::{BackendOp, InMemoryObjectStore};
pub use service::StorageService;
