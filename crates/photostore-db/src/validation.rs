//! Field constraints for photo and thumbnail records.
//!
//! Every backend calls these before writing a row, and the ingest
//! orchestrator calls them before any I/O so that an out-of-range record
//! never reaches either store.

use photostore_common::{Error, Result};

use crate::models::{Photo, Thumbnail};

/// Largest accepted original, in bytes (10 GB).
pub const MAX_PHOTO_SIZE: u64 = 10_000_000_000;

/// Largest accepted derivative, in bytes (fits a signed 32-bit column).
pub const MAX_THUMBNAIL_SIZE: u64 = i32::MAX as u64;

/// Largest accepted width or height (fits a signed 16-bit column).
pub const MAX_DIMENSION: u32 = i16::MAX as u32;

/// Longest accepted MIME type string.
pub const MAX_MIME_LEN: usize = 32;

/// Validate a photo record.
///
/// # Errors
///
/// Returns [`Error::Validation`] naming the first offending field.
pub fn validate_photo(photo: &Photo) -> Result<()> {
    check_range("photo size", photo.size, 1, MAX_PHOTO_SIZE)?;
    check_dimension("photo width", photo.width)?;
    check_dimension("photo height", photo.height)?;
    check_mime("photo mime", &photo.mime)
}

/// Validate a thumbnail record.
///
/// # Errors
///
/// Returns [`Error::Validation`] naming the first offending field.
pub fn validate_thumbnail(thumbnail: &Thumbnail) -> Result<()> {
    check_range("thumbnail size", thumbnail.size, 1, MAX_THUMBNAIL_SIZE)?;
    check_dimension("thumbnail width", thumbnail.width)?;
    check_dimension("thumbnail height", thumbnail.height)?;
    check_mime("thumbnail mime", &thumbnail.mime)
}

fn check_range(field: &str, value: u64, min: u64, max: u64) -> Result<()> {
    if value < min || value > max {
        return Err(Error::validation(format!(
            "{} must be between {} and {}, got {}",
            field, min, max, value
        )));
    }
    Ok(())
}

fn check_dimension(field: &str, value: u32) -> Result<()> {
    check_range(field, u64::from(value), 1, u64::from(MAX_DIMENSION))
}

fn check_mime(field: &str, mime: &str) -> Result<()> {
    if mime.trim().is_empty() {
        return Err(Error::validation(format!("{} must not be empty", field)));
    }
    if mime.len() > MAX_MIME_LEN {
        return Err(Error::validation(format!(
            "{} must be at most {} characters, got {}",
            field,
            MAX_MIME_LEN,
            mime.len()
        )));
    }
    Ok(())
}
