//! Error types for photostore-media.

use thiserror::Error;

/// Result type for photostore-media operations.
pub type Result<T> = std::result::Result<T, MediaError>;

/// Error type for probing and derivation.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The source could not be decoded or reports a zero dimension.
    #[error("Unreadable image: {0}")]
    UnreadableImage(String),

    /// The source is well-formed but exceeds the decode limits.
    #[error("Image too large to derive: {0}")]
    TooLarge(String),

    /// A derivative could not be encoded.
    #[error("Encoding failed: {0}")]
    Encode(String),
}

impl MediaError {
    pub fn unreadable(msg: impl Into<String>) -> Self {
        Self::UnreadableImage(msg.into())
    }

    pub fn too_large(msg: impl Into<String>) -> Self {
        Self::TooLarge(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

impl From<MediaError> for photostore_common::Error {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::UnreadableImage(msg) => photostore_common::Error::InvalidImage(msg),
            MediaError::TooLarge(msg) => {
                photostore_common::Error::validation(format!("Image too large to derive: {}", msg))
            }
            MediaError::Encode(msg) => {
                photostore_common::Error::internal(format!("Encoding failed: {}", msg))
            }
        }
    }
}
