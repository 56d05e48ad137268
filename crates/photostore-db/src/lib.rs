//! Photostore-DB: Records, validation, and the SQLite metadata schema
//!
//! This crate holds the photo and thumbnail records shared by every
//! metadata backend, the field constraints they must satisfy, and the
//! SQLite implementation built on rusqlite with r2d2 connection pooling.
//!
//! # Modules
//!
//! - `models` - Photo and thumbnail records
//! - `validation` - Field range and length constraints
//! - `migrations` - SQLite schema migrations
//! - `pool` - Connection pool management
//! - `queries` - Photo and thumbnail query operations
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use photostore_common::PhotoId;
//! use photostore_db::models::Photo;
//! use photostore_db::pool::{get_conn, init_memory_pool};
//! use photostore_db::queries::photos;
//!
//! let pool = init_memory_pool().unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! let photo = Photo {
//!     id: PhotoId::new(),
//!     size: 1024,
//!     width: 64,
//!     height: 48,
//!     mime: "image/png".to_string(),
//!     uploaded_at: Utc::now(),
//! };
//! photos::insert_photo(&conn, &photo).unwrap();
//! assert!(photos::get_photo(&conn, photo.id).unwrap().is_some());
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
pub mod validation;
