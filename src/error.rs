//! Error types for Solidafy Load
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use std::sync::Arc;
use thiserror::Error;

/// The main error type for Solidafy Load
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Catalog Errors
    // ============================================================================
    #[error("Stream '{stream}' not found in catalog")]
    StreamNotFound { stream: String },

    // ============================================================================
    // Upload Protocol Errors
    // ============================================================================
    #[error("Empty non-final part {part_index} received for '{object_key}'")]
    ProtocolViolation {
        object_key: String,
        part_index: usize,
    },

    #[error("Part {part_index} requested after the final part of '{object_key}'")]
    PartAfterFinal {
        object_key: String,
        part_index: usize,
    },

    #[error("Failed to open upload for '{object_key}': {source}")]
    UploadOpen {
        object_key: String,
        #[source]
        source: Arc<Error>,
    },

    #[error("Failed to upload part {part_index} of '{object_key}': {message}")]
    Append {
        object_key: String,
        part_index: usize,
        message: String,
    },

    #[error("Failed to complete upload of '{object_key}': {message}")]
    Complete { object_key: String, message: String },

    // ============================================================================
    // Storage Errors
    // ============================================================================
    #[error("Object store error: {0}")]
    Storage(#[from] object_store::Error),

    #[error("Background task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a stream not found error
    pub fn stream_not_found(stream: impl Into<String>) -> Self {
        Self::StreamNotFound {
            stream: stream.into(),
        }
    }

    /// Create a protocol violation error for an empty non-final part
    pub fn protocol_violation(object_key: impl Into<String>, part_index: usize) -> Self {
        Self::ProtocolViolation {
            object_key: object_key.into(),
            part_index,
        }
    }

    /// Create an append error
    pub fn append(
        object_key: impl Into<String>,
        part_index: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::Append {
            object_key: object_key.into(),
            part_index,
            message: message.into(),
        }
    }

    /// Create a completion error
    pub fn complete(object_key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Complete {
            object_key: object_key.into(),
            message: message.into(),
        }
    }

    /// Create an error for a part produced after the final one
    pub fn part_after_final(object_key: impl Into<String>, part_index: usize) -> Self {
        Self::PartAfterFinal {
            object_key: object_key.into(),
            part_index,
        }
    }

    /// Whether this error signals a bug upstream rather than a storage failure
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            Error::ProtocolViolation { .. } | Error::PartAfterFinal { .. }
        )
    }
}

/// Result type alias for Solidafy Load
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::stream_not_found("users");
        assert_eq!(err.to_string(), "Stream 'users' not found in catalog");

        let err = Error::protocol_violation("users/data.jsonl", 3);
        assert_eq!(
            err.to_string(),
            "Empty non-final part 3 received for 'users/data.jsonl'"
        );
    }

    #[test]
    fn test_upload_open_keeps_source() {
        let inner = Arc::new(Error::Other("connection refused".to_string()));
        let err = Error::UploadOpen {
            object_key: "a/b".to_string(),
            source: Arc::clone(&inner),
        };
        assert!(err.to_string().contains("connection refused"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_is_protocol_violation() {
        assert!(Error::protocol_violation("k", 0).is_protocol_violation());
        assert!(Error::part_after_final("k", 2).is_protocol_violation());
        assert!(!Error::append("k", 0, "boom").is_protocol_violation());
        assert!(!Error::config("bad").is_protocol_violation());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.with_context(|| "outer".to_string());
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
