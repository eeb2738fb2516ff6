//! Upload completion bookkeeping
//!
//! Tracks part results per object and finalizes each upload once every part
//! up to and including the final one has been loaded.

use super::loader::PartResult;
use super::uploads::{UploadHandle, UploadsInProgress};
use crate::error::Result;
use crate::pipeline::{BatchState, WithBatchState};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// An upload that has been finalized
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletedUpload {
    /// Storage key of the object
    pub object_key: String,
    /// Full location of the object
    pub location: String,
    /// Number of parts loaded, including an empty final part
    pub parts: usize,
}

impl WithBatchState for CompletedUpload {
    fn state(&self) -> BatchState {
        BatchState::Complete
    }
}

#[derive(Debug)]
struct ObjectProgress {
    upload: UploadHandle,
    loaded: usize,
    final_index: Option<usize>,
}

impl ObjectProgress {
    fn is_done(&self) -> bool {
        self.final_index.is_some_and(|idx| self.loaded > idx)
    }
}

/// Finalizes uploads from a stream of part results
#[derive(Debug)]
pub struct UploadCompleter {
    uploads: Arc<UploadsInProgress>,
    progress: HashMap<String, ObjectProgress>,
    completed: Vec<CompletedUpload>,
}

impl UploadCompleter {
    /// Create a completer that evicts finalized uploads from `uploads`
    pub fn new(uploads: Arc<UploadsInProgress>) -> Self {
        Self {
            uploads,
            progress: HashMap::new(),
            completed: Vec::new(),
        }
    }

    /// Record a part result, finalizing the upload if it is now whole
    pub async fn accept(&mut self, result: PartResult) -> Result<Option<CompletedUpload>> {
        let (upload, object_key, part_index, is_final) = match result {
            PartResult::LoadedPart {
                upload,
                object_key,
                part_index,
                is_final,
                ..
            } => (upload, object_key, part_index, is_final),
            PartResult::NoPart { object_key } => {
                debug!(object_key = %object_key, "Worker finished object");
                return Ok(None);
            }
        };

        let progress = self
            .progress
            .entry(object_key.clone())
            .or_insert_with(|| ObjectProgress {
                upload,
                loaded: 0,
                final_index: None,
            });
        progress.loaded += 1;
        if is_final {
            progress.final_index = Some(part_index);
        }
        if !progress.is_done() {
            return Ok(None);
        }
        let upload = progress.upload.clone();
        let parts = progress.loaded;

        // Progress stays recorded until the upload is actually complete
        let location = upload.get().await?.complete().await?;
        self.progress.remove(&object_key);
        let evicted = self.uploads.evict_object(&object_key);
        info!(
            object_key = %object_key,
            location = %location,
            parts,
            evicted,
            "Upload complete"
        );

        let done = CompletedUpload {
            object_key,
            location,
            parts,
        };
        self.completed.push(done.clone());
        Ok(Some(done))
    }

    /// Uploads finalized so far
    pub fn completed(&self) -> &[CompletedUpload] {
        &self.completed
    }

    /// Object keys with parts loaded but not yet finalized
    pub fn pending(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.progress.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}
