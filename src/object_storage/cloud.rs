//! Cloud storage destinations (S3, R2, GCS, Azure)

use crate::error::{Error, Result};
use chrono::Utc;
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::sync::Arc;
use url::Url;

/// Build a Hive-style partitioned object key
///
/// Format: `{prefix}/{stream}/dt={YYYY-MM-DD}/{file_name}`
///
/// Examples:
/// - `products/dt=2025-12-14/data.jsonl`
/// - `landing/public_users/dt=2025-12-14/part-0001.parquet`
pub fn build_object_key(prefix: Option<&str>, stream_name: &str, file_name: &str) -> String {
    let date = Utc::now().format("%Y-%m-%d");
    // Dots in namespaced stream names become underscores
    let sanitized_stream = stream_name.replace('.', "_");
    match prefix.map(|p| p.trim_matches('/')).filter(|p| !p.is_empty()) {
        Some(prefix) => format!("{prefix}/{sanitized_stream}/dt={date}/{file_name}"),
        None => format!("{sanitized_stream}/dt={date}/{file_name}"),
    }
}

/// Cloud storage destination parsed from URL
#[derive(Debug, Clone)]
pub struct CloudDestination {
    /// The object store implementation
    store: Arc<dyn ObjectStore>,
    /// Base path prefix within the bucket/container
    prefix: String,
    /// Original URL scheme for logging
    scheme: String,
}

impl CloudDestination {
    /// Parse a destination URL and create appropriate object store
    ///
    /// Supported formats:
    /// - `s3://bucket/path/` - AWS S3
    /// - `r2://bucket/path/` - Cloudflare R2 (S3-compatible)
    /// - `gs://bucket/path/` - Google Cloud Storage
    /// - `az://container/path/` - Azure Blob Storage
    /// - `memory://path/` - In-process store, lost on exit
    /// - `/local/path/` or `./path/` - Local filesystem
    pub fn parse(url: &str) -> Result<Self> {
        if url.starts_with("s3://") || url.starts_with("r2://") {
            Self::parse_s3(url)
        } else if url.starts_with("gs://") {
            Self::parse_gcs(url)
        } else if url.starts_with("az://") {
            Self::parse_azure(url)
        } else if url.starts_with("memory://") {
            Self::parse_memory(url)
        } else {
            Self::parse_local(url)
        }
    }

    /// Wrap an existing store
    pub fn from_store(store: Arc<dyn ObjectStore>, scheme: &str, prefix: &str) -> Self {
        Self {
            store,
            prefix: prefix.trim_matches('/').to_string(),
            scheme: scheme.to_string(),
        }
    }

    /// Split `scheme://bucket/prefix` into bucket and prefix
    fn bucket_and_prefix(url: &str) -> Result<(String, String)> {
        let parsed = Url::parse(url)?;
        let bucket = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::config(format!("Missing bucket in URL: {url}")))?
            .to_string();
        let prefix = parsed.path().trim_matches('/').to_string();
        Ok((bucket, prefix))
    }

    /// Parse S3 or R2 URL
    fn parse_s3(url: &str) -> Result<Self> {
        let is_r2 = url.starts_with("r2://");
        let scheme = if is_r2 { "r2" } else { "s3" };
        let (bucket, prefix) = Self::bucket_and_prefix(url)?;

        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);

        // R2 endpoint: https://<account_id>.r2.cloudflarestorage.com
        // AWS_ENDPOINT is already read by from_env()
        if is_r2 {
            if let Ok(endpoint) = std::env::var("R2_ENDPOINT_URL") {
                builder = builder.with_endpoint(endpoint);
            }
        }

        let store = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to create {scheme} client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix,
            scheme: scheme.to_string(),
        })
    }

    /// Parse GCS URL
    fn parse_gcs(url: &str) -> Result<Self> {
        let (bucket, prefix) = Self::bucket_and_prefix(url)?;

        let store = GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| Error::config(format!("Failed to create GCS client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix,
            scheme: "gs".to_string(),
        })
    }

    /// Parse Azure Blob URL
    fn parse_azure(url: &str) -> Result<Self> {
        let (container, prefix) = Self::bucket_and_prefix(url)?;

        let store = MicrosoftAzureBuilder::from_env()
            .with_container_name(container)
            .build()
            .map_err(|e| Error::config(format!("Failed to create Azure client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix,
            scheme: "az".to_string(),
        })
    }

    /// Parse in-memory URL; everything after the scheme is the prefix
    fn parse_memory(url: &str) -> Result<Self> {
        let prefix = url.trim_start_matches("memory://").trim_matches('/');
        Ok(Self {
            store: Arc::new(InMemory::new()),
            prefix: prefix.to_string(),
            scheme: "memory".to_string(),
        })
    }

    /// Parse local filesystem path
    fn parse_local(path: &str) -> Result<Self> {
        let path = path.strip_prefix("file://").unwrap_or(path);

        std::fs::create_dir_all(path)
            .map_err(|e| Error::config(format!("Failed to create directory {path}: {e}")))?;

        let store = LocalFileSystem::new_with_prefix(path)
            .map_err(|e| Error::config(format!("Failed to create local store: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix: String::new(),
            scheme: "file".to_string(),
        })
    }

    /// Whether the backend stores user metadata on objects
    pub fn supports_attributes(&self) -> bool {
        self.scheme != "file"
    }

    /// Get the scheme (s3, r2, gs, az, memory, file)
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Get the underlying store
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Resolve an object key against the destination prefix
    pub fn object_path(&self, object_key: &str) -> ObjectPath {
        let object_key = object_key.trim_start_matches('/');
        if self.prefix.is_empty() {
            ObjectPath::from(object_key)
        } else {
            ObjectPath::from(format!("{}/{object_key}", self.prefix))
        }
    }

    /// Full location of a path, for logging and reporting
    pub fn location(&self, path: &ObjectPath) -> String {
        format!("{}://{path}", self.scheme)
    }
}
