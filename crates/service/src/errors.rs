use std::fmt;

use models::{ModelError, ObjectType};
use thiserror::Error;

use crate::storage::backend::BackendError;

/// Document-level operation, used to give store failures their context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Load,
    Store,
    Delete,
    ListKeys,
    ListVersions,
    ReadLastModified,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Load => "loading",
            Operation::Store => "storing",
            Operation::Delete => "deleting",
            Operation::ListKeys => "listing",
            Operation::ListVersions => "listing versions of",
            Operation::ReadLastModified => "reading last-modified of",
        })
    }
}

#[derive(Debug, Error)]
pub enum StoreCause {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{object_type} '{key}' not found")]
    NotFound { object_type: ObjectType, key: String },
    #[error("validation error: {0}")]
    Validation(String),
    #[error("error {operation} {object_type} {}", .key.as_deref().unwrap_or("objects"))]
    Store {
        operation: Operation,
        object_type: ObjectType,
        key: Option<String>,
        #[source]
        source: StoreCause,
    },
    #[error("error accessing bucket {bucket}")]
    Bucket {
        bucket: String,
        #[source]
        source: BackendError,
    },
}

impl StorageError {
    pub fn not_found(object_type: ObjectType, key: &str) -> Self {
        Self::NotFound { object_type, key: key.to_string() }
    }

    pub fn store(
        operation: Operation,
        object_type: ObjectType,
        key: Option<&str>,
        source: impl Into<StoreCause>,
    ) -> Self {
        Self::Store {
            operation,
            object_type,
            key: key.map(str::to_string),
            source: source.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}
