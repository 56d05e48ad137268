//! Photostore-Media: Image probing and thumbnail derivation
//!
//! This crate inspects uploaded images and produces their derivatives.
//!
//! # Modules
//!
//! - `probe` - Header-only width/height/format detection
//! - `variant` - Declarative derivative descriptions (bounds, filter, format)
//! - `derive` - Decode once, then resize, filter and encode per variant
//!
//! # Example
//!
//! ```no_run
//! use photostore_media::{derive, probe, DerivationSpec};
//!
//! let bytes = std::fs::read("photo.jpg").unwrap();
//! let probed = probe(&bytes).unwrap();
//! println!("{}x{} {}", probed.width, probed.height, probed.mime);
//!
//! let specs = [
//!     DerivationSpec::inside(500, 500),
//!     DerivationSpec::inside(500, 500).with_blur(10.0),
//! ];
//! for derived in derive(&bytes, &specs).unwrap() {
//!     println!("{}x{} {} bytes", derived.width, derived.height, derived.byte_size);
//! }
//! ```

pub mod derive;
pub mod error;
pub mod probe;
pub mod variant;

pub use derive::{
    derive, derive_with_limits, fit_inside, DecodeLimits, DerivedImage, MAX_DECODE_DIMENSION,
};
pub use error::{MediaError, Result};
pub use probe::{probe, ProbedImage};
pub use variant::{DerivationSpec, Filter, FitMode, OutputFormat};
