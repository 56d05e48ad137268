//! Core enums shared by the stores and the ingest pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Variant of a derived thumbnail.
///
/// Serialized in upper case, matching the values stored in the metadata
/// `thumbnails.kind` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThumbnailKind {
    /// Plain fit-inside resize.
    Normal,
    /// Resize followed by a Gaussian blur.
    Blur,
}

impl ThumbnailKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Blur => "BLUR",
        }
    }
}

impl fmt::Display for ThumbnailKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ThumbnailKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NORMAL" => Ok(Self::Normal),
            "BLUR" => Ok(Self::Blur),
            other => Err(format!("Unknown thumbnail kind: {}", other)),
        }
    }
}

/// Which backend a write was addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreTarget {
    /// Object storage holding original and derivative bytes.
    Content,
    /// Relational store holding photo and thumbnail records.
    Metadata,
}

impl fmt::Display for StoreTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Content => write!(f, "content"),
            Self::Metadata => write!(f, "metadata"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_display_matches_serde() {
        for kind in [ThumbnailKind::Normal, ThumbnailKind::Blur] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind));
        }
    }

    #[test]
    fn kind_from_str_is_case_insensitive() {
        assert_eq!("blur".parse::<ThumbnailKind>().unwrap(), ThumbnailKind::Blur);
        assert_eq!("NORMAL".parse::<ThumbnailKind>().unwrap(), ThumbnailKind::Normal);
        assert!("sepia".parse::<ThumbnailKind>().is_err());
    }

    #[test]
    fn store_target_display() {
        assert_eq!(StoreTarget::Content.to_string(), "content");
        assert_eq!(StoreTarget::Metadata.to_string(), "metadata");
    }
}
