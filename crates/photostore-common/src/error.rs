//! Unified error type for photostore.
//!
//! The stores, the derivation engine and the ingest orchestrator all funnel
//! their failures into [`Error`], which carries enough context for the HTTP
//! layer to derive a status code via [`Error::http_status`].

use std::fmt;

use crate::types::StoreTarget;

/// Unified error type covering all failure modes in photostore.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Source bytes could not be decoded or report a zero dimension.
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// A record violates a field constraint (range, length, required).
    #[error("Validation error: {0}")]
    Validation(String),

    /// A backend rejected or could not complete a write.
    #[error("{target} store write failed for {key}: {message}")]
    StoreWrite {
        /// Which backend failed.
        target: StoreTarget,
        /// Object key or record identifier being written.
        key: String,
        /// Backend-provided description.
        message: String,
    },

    /// Required configuration is missing or malformed.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "photo", "thumbnail").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// A metadata read or query failed.
    #[error("Database error: {0}")]
    Database(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::InvalidImage(_) => 422,
            Error::Validation(_) => 400,
            Error::StoreWrite { .. } => 502,
            Error::Configuration(_) => 500,
            Error::NotFound { .. } => 404,
            Error::Database(_) => 500,
            Error::Io(_) => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Short machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidImage(_) => "invalid_image",
            Error::Validation(_) => "validation_error",
            Error::StoreWrite { .. } => "store_write_error",
            Error::Configuration(_) => "configuration_error",
            Error::NotFound { .. } => "not_found",
            Error::Database(_) => "database_error",
            Error::Io(_) => "io_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Whether the failure was caused by the caller's input.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.http_status())
    }

    /// Convenience constructor for [`Error::InvalidImage`].
    pub fn invalid_image<S: Into<String>>(msg: S) -> Self {
        Self::InvalidImage(msg.into())
    }

    /// Convenience constructor for [`Error::Validation`].
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Convenience constructor for [`Error::StoreWrite`].
    pub fn store_write(
        target: StoreTarget,
        key: impl fmt::Display,
        message: impl fmt::Display,
    ) -> Self {
        Self::StoreWrite {
            target,
            key: key.to_string(),
            message: message.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Configuration`].
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Database`].
    pub fn database<S: Into<String>>(msg: S) -> Self {
        Self::Database(msg.into())
    }

    /// Convenience constructor for [`Error::Internal`].
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
