//! Header-only inspection of an image.

use std::io::Cursor;

use image::ImageReader;

use crate::error::{MediaError, Result};

/// Intrinsic properties of a source image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbedImage {
    pub width: u32,
    pub height: u32,
    /// MIME type of the detected container format, e.g. `image/jpeg`.
    pub mime: String,
}

/// Read width, height and format from the image header without decoding
/// pixel data.
///
/// # Errors
///
/// [`MediaError::UnreadableImage`] if the format is not recognised, the
/// header cannot be parsed, or either dimension is zero.
pub fn probe(bytes: &[u8]) -> Result<ProbedImage> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| MediaError::unreadable(e.to_string()))?;

    let format = reader
        .format()
        .ok_or_else(|| MediaError::unreadable("unrecognised image format"))?;

    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| MediaError::unreadable(e.to_string()))?;

    if width == 0 || height == 0 {
        return Err(MediaError::unreadable(format!(
            "image reports zero dimension ({}x{})",
            width, height
        )));
    }

    Ok(ProbedImage {
        width,
        height,
        mime: format.to_mime_type().to_string(),
    })
}
