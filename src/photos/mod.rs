//! Photo queries and lifecycle operations.
//!
//! Coordinates the metadata store with the content store for everything
//! after ingest: lookups, signed read URLs and deletion.

mod service;

pub use service::{DeletionReport, PhotoService, SignedUrl};
