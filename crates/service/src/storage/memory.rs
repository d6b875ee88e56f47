use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::backend::{BackendError, BlobMeta, BucketSpec, ObjectStoreBackend};

/// Backend operations, for fault injection and call accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendOp {
    Get,
    GetBytes,
    Put,
    Update,
    Delete,
    List,
}

#[derive(Debug, Clone)]
struct StoredBlob {
    generation: u64,
    updated: i64,
    bytes: Vec<u8>,
}

#[derive(Debug, Default)]
struct StoredObject {
    /// Oldest first; the last entry is the live blob when `live` is set.
    versions: Vec<StoredBlob>,
    live: bool,
}

#[derive(Debug, Default)]
struct BucketState {
    exists: bool,
    versioning: bool,
    location: Option<String>,
    objects: BTreeMap<String, StoredObject>,
    next_generation: u64,
    last_updated: i64,
}

impl BucketState {
    /// Next modification time: wall clock, forced strictly past the previous one.
    fn tick(&mut self) -> (u64, i64) {
        self.next_generation += 1;
        self.last_updated = common::clock::now_millis().max(self.last_updated + 1);
        (self.next_generation, self.last_updated)
    }

    fn ensure_exists(&self, bucket: &str) -> Result<(), BackendError> {
        if self.exists {
            Ok(())
        } else {
            Err(BackendError::BucketNotFound(bucket.to_string()))
        }
    }
}

#[derive(Debug, Default)]
struct Instrumentation {
    faults: HashMap<BackendOp, VecDeque<BackendError>>,
    calls: HashMap<(BackendOp, String), usize>,
}

/// Versioned object store held in memory.
///
/// Behaves like a versioned bucket: overwrites and deletes keep noncurrent
/// versions when versioning is enabled, and modification times strictly
/// increase across the bucket. Object operations fail with
/// [`BackendError::BucketNotFound`] until the bucket is created.
#[derive(Debug)]
pub struct InMemoryObjectStore {
    bucket: String,
    state: RwLock<BucketState>,
    instrumentation: Mutex<Instrumentation>,
}

impl InMemoryObjectStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            state: RwLock::new(BucketState::default()),
            instrumentation: Mutex::new(Instrumentation::default()),
        }
    }

    /// Make the next call of `op` fail with `error`. Queued faults fire in order.
    pub fn inject_failure(&self, op: BackendOp, error: BackendError) {
        let mut inst = self.instrumentation.lock().unwrap_or_else(PoisonError::into_inner);
        inst.faults.entry(op).or_default().push_back(error);
    }

    /// Number of `op` calls made against `path` (or prefix, for listings).
    pub fn calls(&self, op: BackendOp, path: &str) -> usize {
        let inst = self.instrumentation.lock().unwrap_or_else(PoisonError::into_inner);
        inst.calls.get(&(op, path.to_string())).copied().unwrap_or(0)
    }

    pub async fn location(&self) -> Option<String> {
        self.state.read().await.location.clone()
    }

    fn record(&self, op: BackendOp, path: &str) -> Result<(), BackendError> {
        let mut inst = self.instrumentation.lock().unwrap_or_else(PoisonError::into_inner);
        *inst.calls.entry((op, path.to_string())).or_default() += 1;
        match inst.faults.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(error) => {
                debug!(?op, %path, %error, "injected backend failure");
                Err(error)
            }
            None => Ok(()),
        }
    }

    fn write(state: &mut BucketState, path: &str, bytes: Vec<u8>) -> BlobMeta {
        let (generation, updated) = state.tick();
        let versioning = state.versioning;
        let object = state.objects.entry(path.to_string()).or_default();
        if !versioning {
            object.versions.clear();
        }
        object.versions.push(StoredBlob { generation, updated, bytes });
        object.live = true;
        BlobMeta { name: path.to_string(), generation, updated }
    }
}

fn meta(name: &str, blob: &StoredBlob) -> BlobMeta {
    BlobMeta { name: name.to_string(), generation: blob.generation, updated: blob.updated }
}

#[async_trait]
impl ObjectStoreBackend for InMemoryObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn bucket_exists(&self) -> Result<bool, BackendError> {
        Ok(self.state.read().await.exists)
    }

    async fn create_bucket(&self, spec: &BucketSpec) -> Result<(), BackendError> {
        let mut state = self.state.write().await;
        if state.exists {
            return Err(BackendError::BucketExists(self.bucket.clone()));
        }
        state.exists = true;
        state.versioning = spec.versioning;
        state.location = spec.location.clone();
        Ok(())
    }

    async fn versioning_enabled(&self) -> Result<bool, BackendError> {
        let state = self.state.read().await;
        state.ensure_exists(&self.bucket)?;
        Ok(state.versioning)
    }

    async fn get(&self, path: &str) -> Result<Option<BlobMeta>, BackendError> {
        self.record(BackendOp::Get, path)?;
        let state = self.state.read().await;
        state.ensure_exists(&self.bucket)?;
        Ok(state
            .objects
            .get(path)
            .filter(|object| object.live)
            .and_then(|object| object.versions.last())
            .map(|blob| meta(path, blob)))
    }

    async fn get_bytes(&self, blob: &BlobMeta) -> Result<Vec<u8>, BackendError> {
        self.record(BackendOp::GetBytes, &blob.name)?;
        let state = self.state.read().await;
        state.ensure_exists(&self.bucket)?;
        state
            .objects
            .get(&blob.name)
            .and_then(|object| object.versions.iter().find(|v| v.generation == blob.generation))
            .map(|v| v.bytes.clone())
            .ok_or_else(|| BackendError::NotFound(format!("{}#{}", blob.name, blob.generation)))
    }

    async fn put(&self, path: &str, bytes: Vec<u8>, _content_type: &str) -> Result<BlobMeta, BackendError> {
        self.record(BackendOp::Put, path)?;
        let mut state = self.state.write().await;
        state.ensure_exists(&self.bucket)?;
        Ok(Self::write(&mut state, path, bytes))
    }

    async fn update(&self, path: &str) -> Result<BlobMeta, BackendError> {
        self.record(BackendOp::Update, path)?;
        let mut state = self.state.write().await;
        state.ensure_exists(&self.bucket)?;
        let (_, updated) = state.tick();
        let object = state
            .objects
            .get_mut(path)
            .filter(|object| object.live)
            .ok_or_else(|| BackendError::NotFound(path.to_string()))?;
        // metadata writes keep the generation, only the timestamp moves
        let live = object
            .versions
            .last_mut()
            .ok_or_else(|| BackendError::NotFound(path.to_string()))?;
        live.updated = updated;
        Ok(meta(path, live))
    }

    async fn delete(&self, path: &str) -> Result<bool, BackendError> {
        self.record(BackendOp::Delete, path)?;
        let mut state = self.state.write().await;
        state.ensure_exists(&self.bucket)?;
        let versioning = state.versioning;
        let Some(object) = state.objects.get_mut(path) else {
            return Ok(false);
        };
        if !object.live {
            return Ok(false);
        }
        object.live = false;
        if !versioning {
            state.objects.remove(path);
        }
        Ok(true)
    }

    async fn list(&self, prefix: &str, include_versions: bool) -> Result<Vec<BlobMeta>, BackendError> {
        self.record(BackendOp::List, prefix)?;
        let state = self.state.read().await;
        state.ensure_exists(&self.bucket)?;
        let mut blobs = Vec::new();
        for (name, object) in state.objects.range(prefix.to_string()..) {
            if !name.starts_with(prefix) {
                break;
            }
            if include_versions {
                blobs.extend(object.versions.iter().map(|blob| meta(name, blob)));
            } else if object.live {
                blobs.extend(object.versions.last().map(|blob| meta(name, blob)));
            }
        }
        Ok(blobs)
    }
}
