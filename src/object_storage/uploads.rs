//! Shared upload state
//!
//! Producers of one object may run on several workers. The registry here
//! makes sure they all share a single multipart upload, opened exactly once.

use super::client::StreamingUpload;
use crate::error::{Error, Result};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type OpenResult = std::result::Result<Arc<dyn StreamingUpload>, Arc<Error>>;

/// Single-assignment handle to an upload that is being opened
///
/// Cloning is cheap and every clone resolves to the same session. A failed
/// open is observed identically by every holder and is never retried.
#[derive(Clone)]
pub struct UploadHandle {
    object_key: String,
    inner: Shared<BoxFuture<'static, OpenResult>>,
}

impl UploadHandle {
    /// Spawn `open` on the runtime and return a handle to its result
    ///
    /// Returns immediately. The open runs on its own task, so dropping or
    /// cancelling a waiter never cancels it.
    pub fn spawn<F>(object_key: impl Into<String>, open: F) -> Self
    where
        F: Future<Output = Result<Arc<dyn StreamingUpload>>> + Send + 'static,
    {
        let task = tokio::spawn(open);
        let inner = async move {
            match task.await {
                Ok(Ok(upload)) => Ok(upload),
                Ok(Err(e)) => Err(Arc::new(e)),
                Err(e) => Err(Arc::new(Error::TaskJoin(e))),
            }
        }
        .boxed()
        .shared();

        Self {
            object_key: object_key.into(),
            inner,
        }
    }

    /// Storage key of the object being uploaded
    pub fn object_key(&self) -> &str {
        &self.object_key
    }

    /// Whether the open has finished, successfully or not
    pub fn is_resolved(&self) -> bool {
        self.inner.peek().is_some()
    }

    /// Whether both handles share the same underlying open
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.inner.ptr_eq(&other.inner)
    }

    /// Wait for the upload session
    pub async fn get(&self) -> Result<Arc<dyn StreamingUpload>> {
        let result = match self.inner.peek() {
            Some(resolved) => resolved.clone(),
            None => self.inner.clone().await,
        };
        result.map_err(|source| Error::UploadOpen {
            object_key: self.object_key.clone(),
            source,
        })
    }
}

impl fmt::Debug for UploadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadHandle")
            .field("object_key", &self.object_key)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// Upload state shared by every worker touching one object
#[derive(Debug, Clone)]
pub struct UploadState {
    /// Storage key of the object
    pub object_key: String,
    /// Handle to the upload session
    pub streaming_upload: UploadHandle,
}

impl UploadState {
    /// Create upload state
    pub fn new(object_key: impl Into<String>, streaming_upload: UploadHandle) -> Self {
        Self {
            object_key: object_key.into(),
            streaming_upload,
        }
    }
}

/// Registry of uploads in progress, keyed by lookup key
///
/// Entries are only added by [`UploadsInProgress::get_or_create`]. Nothing in
/// the part loader removes them; owners that finalize uploads call
/// [`UploadsInProgress::evict`] or [`UploadsInProgress::evict_object`].
#[derive(Debug, Default)]
pub struct UploadsInProgress {
    by_key: Mutex<HashMap<String, Arc<UploadState>>>,
}

impl UploadsInProgress {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the state for `key`, installing `factory()` if absent
    ///
    /// `factory` runs at most once per key and under the registry lock, so
    /// it must only schedule work.
    pub fn get_or_create<F>(&self, key: &str, factory: F) -> Arc<UploadState>
    where
        F: FnOnce() -> UploadState,
    {
        let mut by_key = self.lock();
        Arc::clone(
            by_key
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(factory())),
        )
    }

    /// State for `key`, if any
    pub fn get(&self, key: &str) -> Option<Arc<UploadState>> {
        self.lock().get(key).cloned()
    }

    /// Remove the entry for a lookup key
    pub fn evict(&self, key: &str) -> Option<Arc<UploadState>> {
        self.lock().remove(key)
    }

    /// Remove every entry uploading `object_key`, returning how many were removed
    pub fn evict_object(&self, object_key: &str) -> usize {
        let mut by_key = self.lock();
        let before = by_key.len();
        by_key.retain(|_, state| state.object_key != object_key);
        before - by_key.len()
    }

    /// Number of uploads in progress
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no uploads are in progress
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<UploadState>>> {
        self.by_key.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
