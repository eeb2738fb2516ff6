//! Configuration types for object storage destinations
//!
//! This module contains the destination configuration and the catalog of
//! streams being loaded. Both can be read from YAML or JSON files.

use crate::error::{Error, Result, ResultExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

// ============================================================================
// Destination Config
// ============================================================================

/// Configuration of an object storage destination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// Destination URL (s3://, r2://, gs://, az://, memory://, or a local path)
    pub destination: String,

    /// Prefix prepended to every object key
    #[serde(default)]
    pub path_prefix: Option<String>,

    /// Metadata key that carries the stream's generation id
    #[serde(default = "default_generation_id_key")]
    pub generation_id_metadata_key: Option<String>,

    /// Static metadata attached to every uploaded object
    #[serde(default)]
    pub object_metadata: HashMap<String, String>,

    /// Size of each uploaded part in bytes
    #[serde(default = "default_part_size")]
    pub part_size_bytes: usize,

    /// Number of concurrent part workers
    #[serde(default = "default_part_workers")]
    pub part_workers: usize,
}

fn default_generation_id_key() -> Option<String> {
    Some("ab-generation-id".to_string())
}

fn default_part_size() -> usize {
    10 * 1024 * 1024
}

fn default_part_workers() -> usize {
    2
}

/// Smallest part size accepted by the major multipart APIs
pub const MIN_PART_SIZE: usize = 5 * 1024 * 1024;

impl DestinationConfig {
    /// Create a config for a destination with default settings
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            path_prefix: None,
            generation_id_metadata_key: default_generation_id_key(),
            object_metadata: HashMap::new(),
            part_size_bytes: default_part_size(),
            part_workers: default_part_workers(),
        }
    }

    /// Load config from a YAML or JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let config: Self = read_structured(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse config from a YAML string (JSON is valid YAML)
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config values
    pub fn validate(&self) -> Result<()> {
        if self.destination.trim().is_empty() {
            return Err(Error::invalid_value("destination", "must not be empty"));
        }
        if self.part_size_bytes == 0 {
            return Err(Error::invalid_value(
                "part_size_bytes",
                "must be greater than zero",
            ));
        }
        if self.part_workers == 0 {
            return Err(Error::invalid_value(
                "part_workers",
                "must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Object metadata for every object written for `stream`
    pub fn metadata_for(&self, stream: &DestinationStream) -> HashMap<String, String> {
        let mut metadata = self.object_metadata.clone();
        if let Some(key) = &self.generation_id_metadata_key {
            metadata.insert(key.clone(), stream.generation_id.to_string());
        }
        metadata
    }
}

// ============================================================================
// Catalog Types
// ============================================================================

/// Catalog of streams being loaded into the destination
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DestinationCatalog {
    /// Streams in the catalog
    #[serde(default)]
    pub streams: Vec<DestinationStream>,
}

/// A single stream in the destination catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationStream {
    /// Stream namespace
    #[serde(default)]
    pub namespace: Option<String>,

    /// Stream name
    pub name: String,

    /// Generation of the data being written
    #[serde(default)]
    pub generation_id: u64,
}

impl DestinationStream {
    /// Create a stream without a namespace
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            name: name.into(),
            generation_id: 0,
        }
    }

    /// Set the namespace
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the generation id
    #[must_use]
    pub fn with_generation_id(mut self, generation_id: u64) -> Self {
        self.generation_id = generation_id;
        self
    }

    /// Full name: `namespace.name`, or just `name`
    pub fn full_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}.{}", self.name),
            None => self.name.clone(),
        }
    }
}

impl DestinationCatalog {
    /// Create a catalog from streams
    pub fn new(streams: Vec<DestinationStream>) -> Self {
        Self { streams }
    }

    /// Load catalog from a YAML or JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        read_structured(path.as_ref())
    }

    /// Look up a stream by full name (`namespace.name`) or bare name
    pub fn get_stream(&self, name: &str) -> Result<&DestinationStream> {
        self.streams
            .iter()
            .find(|s| s.full_name() == name)
            .or_else(|| self.streams.iter().find(|s| s.name == name))
            .ok_or_else(|| Error::stream_not_found(name))
    }
}

/// Read a YAML or JSON file, picking the parser from the extension
fn read_structured<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        Ok(serde_json::from_str(&contents)?)
    } else {
        Ok(serde_yaml::from_str(&contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_minimal_config() {
        let yaml = r#"
destination: "s3://bucket/raw"
"#;
        let config = DestinationConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.destination, "s3://bucket/raw");
        assert_eq!(config.part_size_bytes, 10 * 1024 * 1024);
        assert_eq!(config.part_workers, 2);
        assert_eq!(
            config.generation_id_metadata_key.as_deref(),
            Some("ab-generation-id")
        );
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
destination: "gs://bucket"
path_prefix: "landing"
generation_id_metadata_key: null
object_metadata:
  owner: data-eng
part_size_bytes: 6291456
part_workers: 8
"#;
        let config = DestinationConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.path_prefix.as_deref(), Some("landing"));
        assert!(config.generation_id_metadata_key.is_none());
        assert_eq!(config.part_workers, 8);
        assert!(config.part_size_bytes > MIN_PART_SIZE);
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let err = DestinationConfig::from_yaml_str("destination: x\npart_workers: 0\n").unwrap_err();
        assert!(err.to_string().contains("part_workers"));
    }

    #[test]
    fn test_metadata_for_stream() {
        let mut config = DestinationConfig::new("memory://");
        config
            .object_metadata
            .insert("owner".to_string(), "data-eng".to_string());
        let stream = DestinationStream::new("users").with_generation_id(7);

        let metadata = config.metadata_for(&stream);
        assert_eq!(metadata.len(), 2);
        assert_eq!(metadata["ab-generation-id"], "7");
        assert_eq!(metadata["owner"], "data-eng");
    }

    #[test]
    fn test_metadata_without_generation_key() {
        let mut config = DestinationConfig::new("memory://");
        config.generation_id_metadata_key = None;
        let metadata = config.metadata_for(&DestinationStream::new("users"));
        assert!(metadata.is_empty());
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = DestinationCatalog::new(vec![
            DestinationStream::new("users").with_namespace("public"),
            DestinationStream::new("orders"),
        ]);

        assert_eq!(catalog.get_stream("public.users").unwrap().name, "users");
        assert_eq!(catalog.get_stream("users").unwrap().name, "users");
        assert_eq!(catalog.get_stream("orders").unwrap().name, "orders");
        assert!(matches!(
            catalog.get_stream("missing"),
            Err(Error::StreamNotFound { .. })
        ));
    }

    #[test]
    fn test_catalog_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"{"streams": [{"namespace": "public", "name": "users", "generation_id": 3}]}"#,
        )
        .unwrap();

        let catalog = DestinationCatalog::from_file(&path).unwrap();
        assert_eq!(catalog.streams.len(), 1);
        assert_eq!(catalog.streams[0].generation_id, 3);
    }

    #[test]
    fn test_unreadable_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.yaml");
        std::fs::create_dir(&path).unwrap();

        let err = DestinationCatalog::from_file(&path).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read "));
        assert!(err.to_string().contains("catalog.yaml"));
    }

    #[test]
    fn test_missing_file() {
        let err = DestinationCatalog::from_file("/nonexistent/catalog.yaml").unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }
}
