//! Error types for block event decoding

use thiserror::Error;

/// Failure to interpret bytes as a block or as one of its envelopes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The block-level byte stream does not parse. No view is produced.
    #[error("Malformed block: {reason}")]
    MalformedBlock { reason: String },

    /// One envelope does not parse. Other envelopes of the block are unaffected.
    #[error("Malformed envelope at index {index}: {reason}")]
    MalformedEnvelope { index: usize, reason: String },
}

impl DecodeError {
    pub fn malformed_block(reason: impl Into<String>) -> Self {
        DecodeError::MalformedBlock {
            reason: reason.into(),
        }
    }

    pub fn malformed_envelope(index: usize, reason: impl Into<String>) -> Self {
        DecodeError::MalformedEnvelope {
            index,
            reason: reason.into(),
        }
    }

    /// Index of the failed envelope, if this is an envelope-level failure
    pub fn envelope_index(&self) -> Option<usize> {
        match self {
            DecodeError::MalformedEnvelope { index, .. } => Some(*index),
            DecodeError::MalformedBlock { .. } => None,
        }
    }

    /// Whether the rest of the block is still usable after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DecodeError::MalformedEnvelope { .. })
    }
}

/// Failure to produce wire bytes for a block, envelope or event.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Failed to encode {what}: {source}")]
    Serialize {
        what: &'static str,
        #[source]
        source: bincode::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, DecodeError>;
