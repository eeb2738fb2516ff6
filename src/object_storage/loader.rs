//! Part loader
//!
//! Streams formatted parts into multipart uploads. Uploads for the same
//! object are shared across workers through [`UploadsInProgress`], so parts
//! of one large object can be produced in parallel.

use super::client::ObjectStorageClient;
use super::key::ObjectKey;
use super::part::FormattedPart;
use super::uploads::{UploadHandle, UploadState, UploadsInProgress};
use crate::config::{DestinationCatalog, DestinationConfig};
use crate::error::{Error, Result};
use crate::pipeline::{BatchAccumulator, BatchAccumulatorResult, BatchState, WithBatchState};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tracing::debug;

/// Outcome of loading a part, consumed by upload bookkeeping
#[derive(Debug, Clone)]
pub enum PartResult {
    /// A part was processed
    LoadedPart {
        /// Upload the part belongs to
        upload: UploadHandle,
        /// Storage key of the object
        object_key: String,
        /// Position of the part
        part_index: usize,
        /// Whether this was the last part
        is_final: bool,
        /// The part carried no bytes, so nothing was uploaded
        empty: bool,
    },
    /// The worker is done with the object
    NoPart {
        /// Storage key of the object
        object_key: String,
    },
}

impl PartResult {
    /// Storage key of the object
    pub fn object_key(&self) -> &str {
        match self {
            Self::LoadedPart { object_key, .. } | Self::NoPart { object_key } => object_key,
        }
    }
}

impl WithBatchState for PartResult {
    fn state(&self) -> BatchState {
        BatchState::Staged
    }
}

/// Accumulator that uploads parts into shared streaming uploads
pub struct ObjectLoaderPartLoader {
    client: Arc<dyn ObjectStorageClient>,
    catalog: Arc<DestinationCatalog>,
    uploads: Arc<UploadsInProgress>,
    config: Arc<DestinationConfig>,
}

impl ObjectLoaderPartLoader {
    /// Create a part loader
    pub fn new(
        client: Arc<dyn ObjectStorageClient>,
        catalog: Arc<DestinationCatalog>,
        uploads: Arc<UploadsInProgress>,
        config: Arc<DestinationConfig>,
    ) -> Self {
        Self {
            client,
            catalog,
            uploads,
            config,
        }
    }

    /// The upload registry shared by this loader
    pub fn uploads(&self) -> &Arc<UploadsInProgress> {
        &self.uploads
    }
}

#[async_trait]
impl BatchAccumulator for ObjectLoaderPartLoader {
    type State = Arc<UploadState>;
    type Key = ObjectKey;
    type Input = FormattedPart;
    type Output = PartResult;

    async fn start(&self, key: &ObjectKey) -> Result<Arc<UploadState>> {
        let stream = self.catalog.get_stream(&key.stream)?;
        let metadata = self.config.metadata_for(stream);

        Ok(self.uploads.get_or_create(key.lookup_key(), || {
            debug!(
                object_key = %key.object_key,
                lookup_key = %key.lookup_key(),
                "Starting streaming upload"
            );
            let client = Arc::clone(&self.client);
            let object_key = key.object_key.clone();
            let handle = UploadHandle::spawn(key.object_key.clone(), async move {
                client.start_streaming_upload(&object_key, metadata).await
            });
            UploadState::new(key.object_key.clone(), handle)
        }))
    }

    async fn accept(
        &self,
        input: FormattedPart,
        state: Arc<UploadState>,
    ) -> Result<BatchAccumulatorResult<Arc<UploadState>, PartResult>> {
        debug!(
            object_key = %input.object_key,
            part_index = input.part_index,
            is_final = input.is_final,
            bytes = input.bytes.as_ref().map_or(0, Bytes::len),
            "Uploading part"
        );
        if !input.is_final && input.bytes.is_none() {
            return Err(Error::protocol_violation(input.object_key, input.part_index));
        }

        let empty = input.bytes.is_none();
        if let Some(bytes) = input.bytes {
            let upload = state.streaming_upload.get().await?;
            upload.upload_part(bytes, input.part_index).await?;
        }

        let output = PartResult::LoadedPart {
            upload: state.streaming_upload.clone(),
            object_key: input.object_key,
            part_index: input.part_index,
            is_final: input.is_final,
            empty,
        };
        Ok(BatchAccumulatorResult::Intermediate { state, output })
    }

    async fn finish(
        &self,
        state: Arc<UploadState>,
    ) -> Result<BatchAccumulatorResult<Arc<UploadState>, PartResult>> {
        Ok(BatchAccumulatorResult::Final {
            output: PartResult::NoPart {
                object_key: state.object_key.clone(),
            },
        })
    }
}
