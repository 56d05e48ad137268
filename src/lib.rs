//! Photostore - photo upload service
//!
//! Accepts image uploads, derives thumbnails, stores bytes in object storage
//! and records in a relational store. This library crate exposes the core
//! functionality for integration testing.

pub mod config;
pub mod ingest;
pub mod photos;
pub mod server;
pub mod store;
