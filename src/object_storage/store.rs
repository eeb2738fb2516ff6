//! `object_store` backed storage client

use super::client::{ObjectStorageClient, StreamingUpload};
use super::cloud::CloudDestination;
use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use object_store::{Attribute, Attributes, MultipartUpload, PutMultipartOpts};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Storage client writing to any [`CloudDestination`]
#[derive(Debug, Clone)]
pub struct ObjectStoreClient {
    destination: CloudDestination,
}

impl ObjectStoreClient {
    /// Create a client for a destination
    pub fn new(destination: CloudDestination) -> Self {
        Self { destination }
    }

    /// Parse a destination URL and create a client for it
    pub fn from_url(url: &str) -> Result<Self> {
        Ok(Self::new(CloudDestination::parse(url)?))
    }

    /// The destination written to
    pub fn destination(&self) -> &CloudDestination {
        &self.destination
    }
}

#[async_trait]
impl ObjectStorageClient for ObjectStoreClient {
    async fn start_streaming_upload(
        &self,
        object_key: &str,
        metadata: HashMap<String, String>,
    ) -> Result<Arc<dyn StreamingUpload>> {
        let path = self.destination.object_path(object_key);
        let location = self.destination.location(&path);

        let mut attributes = Attributes::new();
        if self.destination.supports_attributes() {
            for (key, value) in metadata {
                attributes.insert(Attribute::Metadata(key.into()), value.into());
            }
        } else if !metadata.is_empty() {
            debug!(
                location = %location,
                "Destination does not store object metadata, dropping {} entries",
                metadata.len()
            );
        }

        let opts = PutMultipartOpts {
            attributes,
            ..Default::default()
        };
        let upload = self
            .destination
            .store()
            .put_multipart_opts(&path, opts)
            .await?;

        info!(location = %location, "Opened streaming upload");
        Ok(Arc::new(ObjectStoreUpload::new(object_key, location, upload)))
    }
}

/// A multipart upload writing parts in the order they are submitted
///
/// `object_store` numbers parts by submission order, so part indices must
/// increase from call to call. Any starting index is accepted.
#[derive(Debug)]
pub struct ObjectStoreUpload {
    object_key: String,
    location: String,
    inner: Mutex<UploadInner>,
}

#[derive(Debug)]
struct UploadInner {
    upload: Box<dyn MultipartUpload>,
    last_index: Option<usize>,
    parts: usize,
    completed: bool,
}

impl ObjectStoreUpload {
    fn new(object_key: &str, location: String, upload: Box<dyn MultipartUpload>) -> Self {
        Self {
            object_key: object_key.to_string(),
            location,
            inner: Mutex::new(UploadInner {
                upload,
                last_index: None,
                parts: 0,
                completed: false,
            }),
        }
    }
}

#[async_trait]
impl StreamingUpload for ObjectStoreUpload {
    async fn upload_part(&self, bytes: Bytes, part_index: usize) -> Result<()> {
        let put = {
            let mut inner = self.inner.lock().await;
            if inner.completed {
                return Err(Error::append(
                    &self.object_key,
                    part_index,
                    "upload already completed",
                ));
            }
            if let Some(last) = inner.last_index.filter(|last| part_index <= *last) {
                return Err(Error::append(
                    &self.object_key,
                    part_index,
                    format!("part {last} was already submitted"),
                ));
            }

            // Claims the next part number; the write itself runs unlocked
            let put = inner.upload.put_part(bytes.into());
            inner.last_index = Some(part_index);
            inner.parts += 1;
            put
        };

        put.await
            .map_err(|e| Error::append(&self.object_key, part_index, e.to_string()))?;
        debug!(object_key = %self.object_key, part_index, "Uploaded part");
        Ok(())
    }

    async fn complete(&self) -> Result<String> {
        let mut inner = self.inner.lock().await;
        if inner.completed {
            return Ok(self.location.clone());
        }

        inner
            .upload
            .complete()
            .await
            .map_err(|e| Error::complete(&self.object_key, e.to_string()))?;
        inner.completed = true;

        info!(
            location = %self.location,
            parts = inner.parts,
            "Completed streaming upload"
        );
        Ok(self.location.clone())
    }
}
