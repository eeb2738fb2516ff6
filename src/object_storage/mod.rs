//! Object storage module
//!
//! Streams formatted parts into multipart uploads on object storage.
//!
//! # Overview
//!
//! This module provides:
//! - `ObjectKey` - Identity of a destination object
//! - `PartFactory` / `FormattedPart` - Ordered parts of an object
//! - `UploadsInProgress` - Registry that opens each upload exactly once
//! - `ObjectLoaderPartLoader` - The start/accept/finish part loader
//! - `UploadCompleter` - Finalizes uploads once all parts are loaded
//! - `ObjectStoreClient` - Storage client for S3, R2, GCS, Azure, memory and local paths

mod client;
mod cloud;
mod completer;
mod key;
mod loader;
mod part;
mod store;
mod uploads;

pub use client::{ObjectStorageClient, StreamingUpload};
pub use cloud::{build_object_key, CloudDestination};
pub use completer::{CompletedUpload, UploadCompleter};
pub use key::ObjectKey;
pub use loader::{ObjectLoaderPartLoader, PartResult};
pub use part::{FormattedPart, PartFactory};
pub use store::{ObjectStoreClient, ObjectStoreUpload};
pub use uploads::{UploadHandle, UploadState, UploadsInProgress};
