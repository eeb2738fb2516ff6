// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Solidafy Load
//!
//! Streams connector output into object storage as multipart uploads.
//!
//! ## Features
//!
//! - **Shared Uploads**: Parts of one object can be produced by many workers;
//!   the multipart upload behind them is opened exactly once
//! - **Lazy Open**: Starting an object never waits on the network
//! - **Ordered Parts**: Parts are written in the order they are accepted
//! - **Any Store**: S3, R2, GCS, Azure, in-memory and local paths via `object_store`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use solidafy_load::object_storage::{ObjectKey, ObjectLoaderPartLoader, ObjectStoreClient, PartFactory, UploadsInProgress};
//! use solidafy_load::pipeline::BatchAccumulator;
//! use std::sync::Arc;
//!
//! let client = Arc::new(ObjectStoreClient::from_url("s3://bucket/raw")?);
//! let loader = ObjectLoaderPartLoader::new(client, catalog, Arc::new(UploadsInProgress::new()), config);
//!
//! let key = ObjectKey::new("public.users", "users/data.jsonl");
//! let mut state = loader.start(&key).await?;
//! for part in PartFactory::new(&key.object_key).split(bytes, 8 * 1024 * 1024)? {
//!     state = loader.accept(part, state).await?.state().cloned().unwrap();
//! }
//! let done = loader.finish(state).await?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   parts   ┌────────────────────────┐  results  ┌────────────────┐
//! │ PartFactory  │ ────────▶ │ ObjectLoaderPartLoader │ ────────▶ │ UploadCompleter│
//! └──────────────┘           │ start / accept / finish│           └───────┬────────┘
//!                            └───────────┬────────────┘                   │ complete()
//!                                        │ open once, append              │
//!                            ┌───────────▼────────────┐                   │
//!                            │   UploadsInProgress    │                   │
//!                            │ key → Shared<upload>   │ ◀─────────────────┘
//!                            └───────────┬────────────┘        evict
//!                                        │
//!                            ┌───────────▼────────────┐
//!                            │ ObjectStorageClient    │  S3 / R2 / GCS / Azure / memory / file
//!                            └────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Destination configuration and catalog
pub mod config;

/// Pipeline stage contracts
pub mod pipeline;

/// Multipart uploads into object storage
pub mod object_storage;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};

pub use config::{DestinationCatalog, DestinationConfig, DestinationStream};
pub use object_storage::{
    FormattedPart, ObjectKey, ObjectLoaderPartLoader, PartResult, UploadCompleter,
    UploadsInProgress,
};
pub use pipeline::{BatchAccumulator, BatchAccumulatorResult, BatchState};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
