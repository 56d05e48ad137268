//! Derivative generation.
//!
//! The source is decoded once per batch; every [`DerivationSpec`] is then
//! resized, filtered and encoded from that single decoded image.

use std::io::Cursor;

use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, ImageError, ImageReader, Limits};

use crate::error::{MediaError, Result};
use crate::variant::{DerivationSpec, Filter, FitMode, OutputFormat};

/// An encoded derivative.
#[derive(Debug, Clone)]
pub struct DerivedImage {
    pub bytes: Bytes,
    pub width: u32,
    pub height: u32,
    pub byte_size: u64,
    pub format: OutputFormat,
}

impl DerivedImage {
    pub fn mime_type(&self) -> String {
        self.format.mime_type()
    }
}

/// Largest width or height accepted for full decoding.
pub const MAX_DECODE_DIMENSION: u32 = i16::MAX as u32;

/// Bounds applied when a source is fully decoded.
///
/// The defaults admit any image whose header passes validation, up to
/// 8-bit RGBA at [`MAX_DECODE_DIMENSION`] on both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    pub max_dimension: u32,
    /// Upper bound on bytes allocated for decoded pixels.
    pub max_alloc: u64,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        let side = u64::from(MAX_DECODE_DIMENSION);
        Self {
            max_dimension: MAX_DECODE_DIMENSION,
            max_alloc: side * side * 4,
        }
    }
}

impl DecodeLimits {
    fn to_image_limits(self) -> Limits {
        let mut limits = Limits::default();
        limits.max_image_width = Some(self.max_dimension);
        limits.max_image_height = Some(self.max_dimension);
        limits.max_alloc = Some(self.max_alloc);
        limits
    }
}

/// Produce one derivative per [`DerivationSpec`], in input order.
///
/// CPU bound; async callers should run it on the blocking pool.
///
/// # Errors
///
/// * [`MediaError::UnreadableImage`] if the source cannot be decoded or has
///   a zero dimension. No derivatives are returned.
/// * [`MediaError::TooLarge`] if decoding would exceed the default
///   [`DecodeLimits`].
/// * [`MediaError::Encode`] if a derivative cannot be encoded.
pub fn derive(source: &[u8], specs: &[DerivationSpec]) -> Result<Vec<DerivedImage>> {
    derive_with_limits(source, specs, DecodeLimits::default())
}

/// [`derive`] with explicit decode limits.
pub fn derive_with_limits(
    source: &[u8],
    specs: &[DerivationSpec],
    limits: DecodeLimits,
) -> Result<Vec<DerivedImage>> {
    let img = decode(source, limits)?;

    if img.width() == 0 || img.height() == 0 {
        return Err(MediaError::unreadable(format!(
            "image reports zero dimension ({}x{})",
            img.width(),
            img.height()
        )));
    }

    specs.iter().map(|spec| derive_one(&img, spec)).collect()
}

fn decode(source: &[u8], limits: DecodeLimits) -> Result<DynamicImage> {
    let mut reader = ImageReader::new(Cursor::new(source))
        .with_guessed_format()
        .map_err(|e| MediaError::unreadable(e.to_string()))?;
    reader.limits(limits.to_image_limits());

    reader.decode().map_err(|e| match e {
        ImageError::Limits(err) => MediaError::too_large(err.to_string()),
        other => MediaError::unreadable(other.to_string()),
    })
}

fn derive_one(img: &DynamicImage, spec: &DerivationSpec) -> Result<DerivedImage> {
    let (width, height) = match spec.fit {
        FitMode::Inside => fit_inside(img.width(), img.height(), spec.max_width, spec.max_height),
    };

    let mut out = if (width, height) == (img.width(), img.height()) {
        img.clone()
    } else {
        img.resize_exact(width, height, FilterType::Lanczos3)
    };

    if let Some(Filter::Blur { radius }) = spec.filter {
        out = out.blur(radius);
    }

    let bytes = encode(out, spec.format)?;

    tracing::debug!(
        "Derived {}x{} {} ({} bytes) from {}x{}",
        width,
        height,
        spec.format,
        bytes.len(),
        img.width(),
        img.height()
    );

    Ok(DerivedImage {
        byte_size: bytes.len() as u64,
        bytes,
        width,
        height,
        format: spec.format,
    })
}

fn encode(img: DynamicImage, format: OutputFormat) -> Result<Bytes> {
    // JPEG has no alpha channel.
    let img = match format {
        OutputFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()),
        OutputFormat::Png => img,
    };

    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format.image_format())
        .map_err(|e| MediaError::encode(e.to_string()))?;
    Ok(Bytes::from(buf.into_inner()))
}

/// Largest size with the source aspect ratio that fits within the bounds.
///
/// Dimensions round down with a floor of 1 px. Sources already inside the
/// bounds keep their size.
pub fn fit_inside(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }

    let (w, h) = (u64::from(width), u64::from(height));
    let (mw, mh) = (u64::from(max_width), u64::from(max_height));

    // Compare w/mw against h/mh without floating point.
    if w * mh >= h * mw {
        let scaled = (h * mw / w).max(1);
        (max_width, scaled as u32)
    } else {
        let scaled = (w * mh / h).max(1);
        (scaled as u32, max_height)
    }
}
