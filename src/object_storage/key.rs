//! Object identity

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Identifies one destination object
///
/// Two keys are equal when their lookup keys are equal: the upload id when
/// one is set, otherwise the object's storage key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectKey {
    /// Stream the object belongs to
    pub stream: String,
    /// Storage key of the object
    pub object_key: String,
    /// Logical upload identifier shared by every producer of this object
    #[serde(default)]
    pub upload_id: Option<String>,
}

impl ObjectKey {
    /// Create a key without a distinct upload id
    pub fn new(stream: impl Into<String>, object_key: impl Into<String>) -> Self {
        Self {
            stream: stream.into(),
            object_key: object_key.into(),
            upload_id: None,
        }
    }

    /// Set the upload id
    #[must_use]
    pub fn with_upload_id(mut self, upload_id: impl Into<String>) -> Self {
        self.upload_id = Some(upload_id.into());
        self
    }

    /// Key used to deduplicate concurrent upload opens
    pub fn lookup_key(&self) -> &str {
        self.upload_id.as_deref().unwrap_or(&self.object_key)
    }
}

impl PartialEq for ObjectKey {
    fn eq(&self, other: &Self) -> bool {
        self.lookup_key() == other.lookup_key()
    }
}

impl Eq for ObjectKey {}

impl Hash for ObjectKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.lookup_key().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use test_case::test_case;

    #[test_case(None, "users/data.jsonl" ; "falls back to object key")]
    #[test_case(Some("u1"), "u1" ; "prefers upload id")]
    fn test_lookup_key(upload_id: Option<&str>, expected: &str) {
        let mut key = ObjectKey::new("users", "users/data.jsonl");
        key.upload_id = upload_id.map(str::to_string);
        assert_eq!(key.lookup_key(), expected);
    }

    #[test]
    fn test_equality_follows_lookup_key() {
        let a = ObjectKey::new("users", "a.jsonl").with_upload_id("u1");
        let b = ObjectKey::new("orders", "b.jsonl").with_upload_id("u1");
        let c = ObjectKey::new("users", "a.jsonl");

        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<ObjectKey> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }
}
