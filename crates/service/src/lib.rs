//! Storage layer for versioned configuration documents.
//! - Persists typed documents from the `models` crate into a versioned blob store.
//! - Keeps a per-type `last-modified` marker fresh so caches can poll for changes cheaply.
//! - Provides clear error types and documented interfaces.

pub mod errors;
pub mod observability;
pub mod storage;

pub use errors::StorageError;
pub use storage::{BlobStorageService, StorageService};
