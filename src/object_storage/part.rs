//! Formatted parts and the part factory
//!
//! A part is one chunk of an object's bytes tagged with its position. Only
//! the final part of an object may omit its bytes.

use crate::error::{Error, Result};
use bytes::Bytes;

/// A chunk of formatted output destined for one object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedPart {
    /// Storage key of the destination object
    pub object_key: String,
    /// Position of this part within the object
    pub part_index: usize,
    /// Whether this is the last part of the object
    pub is_final: bool,
    /// Part payload; `None` only for a final "no more data" part
    pub bytes: Option<Bytes>,
}

impl FormattedPart {
    /// Whether this part carries no bytes
    pub fn is_empty(&self) -> bool {
        self.bytes.is_none()
    }

    /// Payload size in bytes
    pub fn len(&self) -> usize {
        self.bytes.as_ref().map_or(0, Bytes::len)
    }
}

/// Produces consecutive parts for a single object
#[derive(Debug)]
pub struct PartFactory {
    object_key: String,
    next_index: usize,
    finished: bool,
}

impl PartFactory {
    /// Create a factory whose first part has index 0
    pub fn new(object_key: impl Into<String>) -> Self {
        Self {
            object_key: object_key.into(),
            next_index: 0,
            finished: false,
        }
    }

    /// Storage key of the object
    pub fn object_key(&self) -> &str {
        &self.object_key
    }

    /// Whether the final part has been produced
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Produce the next part
    ///
    /// An empty buffer counts as no bytes.
    pub fn next_part(&mut self, bytes: Option<Bytes>, is_final: bool) -> Result<FormattedPart> {
        if self.finished {
            return Err(Error::part_after_final(&self.object_key, self.next_index));
        }
        let bytes = bytes.filter(|b| !b.is_empty());
        if !is_final && bytes.is_none() {
            return Err(Error::protocol_violation(&self.object_key, self.next_index));
        }

        let part = FormattedPart {
            object_key: self.object_key.clone(),
            part_index: self.next_index,
            is_final,
            bytes,
        };
        self.next_index += 1;
        self.finished = is_final;
        Ok(part)
    }

    /// Split a whole payload into parts of at most `part_size` bytes
    ///
    /// The last chunk is marked final. An empty payload yields a single
    /// final part with no bytes.
    pub fn split(&mut self, data: Bytes, part_size: usize) -> Result<Vec<FormattedPart>> {
        if part_size == 0 {
            return Err(Error::invalid_value("part_size", "must be greater than zero"));
        }
        if data.is_empty() {
            return Ok(vec![self.next_part(None, true)?]);
        }

        let count = data.len().div_ceil(part_size);
        let mut parts = Vec::with_capacity(count);
        for i in 0..count {
            let start = i * part_size;
            let end = (start + part_size).min(data.len());
            parts.push(self.next_part(Some(data.slice(start..end)), i + 1 == count)?);
        }
        Ok(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_part_indices() {
        let mut factory = PartFactory::new("users/data.jsonl");
        let p0 = factory.next_part(Some(Bytes::from_static(b"a")), false).unwrap();
        let p1 = factory.next_part(None, true).unwrap();

        assert_eq!(p0.part_index, 0);
        assert_eq!(p1.part_index, 1);
        assert!(!p0.is_empty());
        assert!(p1.is_empty());
        assert!(factory.is_finished());
    }

    #[test]
    fn test_rejects_empty_non_final() {
        let mut factory = PartFactory::new("k");
        let err = factory.next_part(Some(Bytes::new()), false).unwrap_err();
        assert!(err.is_protocol_violation());
        // Rejected parts do not consume an index
        let part = factory.next_part(Some(Bytes::from_static(b"x")), true).unwrap();
        assert_eq!(part.part_index, 0);
    }

    #[test]
    fn test_rejects_part_after_final() {
        let mut factory = PartFactory::new("k");
        factory.next_part(None, true).unwrap();
        let err = factory
            .next_part(Some(Bytes::from_static(b"x")), true)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::PartAfterFinal { part_index: 1, .. }
        ));
        assert!(err.is_protocol_violation());
    }

    #[test]
    fn test_split() {
        let mut factory = PartFactory::new("k");
        let parts = factory.split(Bytes::from_static(b"abcdefg"), 3).unwrap();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].bytes.as_deref(), Some(&b"abc"[..]));
        assert_eq!(parts[2].bytes.as_deref(), Some(&b"g"[..]));
        assert!(parts[2].is_final);
        assert!(parts[..2].iter().all(|p| !p.is_final));
        assert_eq!(parts.iter().map(FormattedPart::len).sum::<usize>(), 7);
    }

    #[test]
    fn test_split_empty_payload() {
        let mut factory = PartFactory::new("k");
        let parts = factory.split(Bytes::new(), 3).unwrap();
        assert_eq!(parts.len(), 1);
        assert!(parts[0].is_final);
        assert!(parts[0].is_empty());
    }
}
