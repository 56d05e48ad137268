//! Declarative description of a derivative image variant.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How the source is fitted into the target bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Scale to fit within the bounds, preserving aspect ratio. Never enlarges.
    #[default]
    Inside,
}

/// Filter applied after resizing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Filter {
    /// Gaussian blur with sigma equal to `radius`.
    Blur { radius: f32 },
}

/// Encoding of a derivative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        }
    }

    /// MIME type of the encoded output, `image/<format>`.
    pub fn mime_type(&self) -> String {
        format!("image/{}", self.as_str())
    }

    pub(crate) fn image_format(&self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One derivative to produce from a source image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivationSpec {
    pub max_width: u32,
    pub max_height: u32,
    #[serde(default)]
    pub fit: FitMode,
    #[serde(default)]
    pub filter: Option<Filter>,
    #[serde(default)]
    pub format: OutputFormat,
}

impl DerivationSpec {
    /// Plain fit-inside resize to PNG.
    pub fn inside(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
            fit: FitMode::Inside,
            filter: None,
            format: OutputFormat::Png,
        }
    }

    pub fn with_blur(mut self, radius: f32) -> Self {
        self.filter = Some(Filter::Blur { radius });
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }
}
