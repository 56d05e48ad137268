//! Photostore-Common: Shared types, content keys, and errors.
//!
//! This crate provides common functionality used across photostore:
//!
//! - **Typed IDs**: UUID wrappers for photos and thumbnails
//! - **Content Keys**: The `photos/{id}` / `thumbnails/{id}` object key scheme
//! - **Core Types**: Thumbnail variant kinds and store targets
//! - **Error Handling**: The error taxonomy and result alias
//!
//! # Examples
//!
//! ```
//! use photostore_common::{ContentKey, Error, PhotoId, Result};
//!
//! let id = PhotoId::new();
//! let key = ContentKey::photo(id);
//! assert!(key.as_str().starts_with("photos/"));
//!
//! fn example() -> Result<()> {
//!     Err(Error::invalid_image("zero width"))
//! }
//! assert!(example().is_err());
//! ```

pub mod error;
pub mod ids;
pub mod keys;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use keys::ContentKey;
pub use types::*;
