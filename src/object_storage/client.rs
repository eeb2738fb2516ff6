//! Storage client contracts
//!
//! The accumulator talks to object storage only through these two traits,
//! so any multipart-capable backend can sit behind it.

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;

/// An open multipart upload that accepts parts by index
#[async_trait]
pub trait StreamingUpload: Send + Sync {
    /// Append `bytes` as part `part_index` of the object
    async fn upload_part(&self, bytes: Bytes, part_index: usize) -> Result<()>;

    /// Finalize the object, returning its location
    async fn complete(&self) -> Result<String>;
}

/// A client able to open multipart uploads
#[async_trait]
pub trait ObjectStorageClient: Send + Sync {
    /// Open a multipart upload for `object_key` with the given object metadata
    async fn start_streaming_upload(
        &self,
        object_key: &str,
        metadata: HashMap<String, String>,
    ) -> Result<Arc<dyn StreamingUpload>>;
}
