//! Upload-and-derivation pipeline.
//!
//! An ingest probes the upload, mints identifiers, derives the configured
//! thumbnail variants and commits everything to the content and metadata
//! stores. The two stores share no transaction, so a commit is tracked as
//! a set of independent writes in a [`CommitLog`]; a failed ingest hands the
//! log back so orphaned writes can be swept later.

mod buffer;
mod commit;
mod orchestrator;
mod state;

pub use buffer::UploadBuffer;
pub use commit::{CommitLog, WriteOutcome, WriteRecord};
pub use orchestrator::Ingestor;
pub use state::{IngestError, IngestState};
