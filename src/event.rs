//! Event payloads and the handles of the channels that deliver them

use crate::error::{DecodeError, EncodeError};
use crate::protocol::codec::{decode_bounded, encode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, PartialEq, Eq, Hash)]
struct SourceInfo {
    name: String,
    url: Option<String>,
}

/// Identifies the event channel that delivered a block.
///
/// Cloning is cheap and every clone refers to the same source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceHandle(Arc<SourceInfo>);

impl SourceHandle {
    pub fn new(name: impl Into<String>) -> Self {
        SourceHandle(Arc::new(SourceInfo {
            name: name.into(),
            url: None,
        }))
    }

    pub fn with_url(name: impl Into<String>, url: impl Into<String>) -> Self {
        SourceHandle(Arc::new(SourceInfo {
            name: name.into(),
            url: Some(url.into()),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn url(&self) -> Option<&str> {
        self.0.url.as_deref()
    }

    /// True when both handles were cloned from the same original
    pub fn same_source(&self, other: &SourceHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Display for SourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.0.url {
            Some(url) => write!(f, "{}@{}", self.0.name, url),
            None => write!(f, "{}", self.0.name),
        }
    }
}

/// A block event as handed over by the subscription layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(with = "serde_bytes")]
    pub creator: Vec<u8>,
    pub timestamp_millis: i64,
    #[serde(with = "serde_bytes")]
    block: Vec<u8>,
}

impl Event {
    pub fn new(block: Vec<u8>) -> Self {
        Event {
            creator: Vec::new(),
            timestamp_millis: Utc::now().timestamp_millis(),
            block,
        }
    }

    pub fn with_creator(mut self, creator: Vec<u8>) -> Self {
        self.creator = creator;
        self
    }

    pub fn block_bytes(&self) -> &[u8] {
        &self.block
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp_millis)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        encode("event", self)
    }

    /// Decode an event frame. A frame that does not parse carries no usable block.
    pub fn from_bytes(bytes: &[u8], limit: usize) -> Result<Self, DecodeError> {
        decode_bounded(bytes, limit)
            .map_err(|e| DecodeError::malformed_block(format!("event frame: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_handle_identity() {
        let a = SourceHandle::with_url("peer0", "grpc://peer0:7053");
        let b = a.clone();
        let c = SourceHandle::with_url("peer0", "grpc://peer0:7053");

        assert!(a.same_source(&b));
        assert!(!a.same_source(&c));
        assert_eq!(a, c);
        assert_eq!(a.to_string(), "peer0@grpc://peer0:7053");
        assert_eq!(SourceHandle::new("hub").to_string(), "hub");
    }

    #[test]
    fn test_event_frame() {
        let event = Event::new(vec![1, 2, 3]).with_creator(b"peer0".to_vec());
        let bytes = event.to_bytes().unwrap();

        let decoded = Event::from_bytes(&bytes, 1024).unwrap();
        assert_eq!(decoded, event);
        assert_eq!(decoded.block_bytes(), &[1, 2, 3]);
        assert!(decoded.timestamp().is_some());
    }

    #[test]
    fn test_truncated_event_frame() {
        let bytes = Event::new(vec![9; 32]).to_bytes().unwrap();
        let result = Event::from_bytes(&bytes[..bytes.len() - 4], 1024);
        assert!(matches!(result, Err(DecodeError::MalformedBlock { .. })));
    }
}
