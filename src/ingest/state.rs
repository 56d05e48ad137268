use std::fmt;

use photostore_common::Error;
use serde::Serialize;

use super::commit::CommitLog;

/// Progress of a single ingest.
///
/// `Received -> Validated -> Derived -> Committing -> {Committed | Failed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestState {
    Received,
    Validated,
    Derived,
    Committing,
    Committed,
    Failed,
}

impl fmt::Display for IngestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Received => "received",
            Self::Validated => "validated",
            Self::Derived => "derived",
            Self::Committing => "committing",
            Self::Committed => "committed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A failed ingest.
///
/// `failed_at` is the last state reached before the failure. Failures
/// during commit carry the [`CommitLog`] of every attempted write.
#[derive(Debug, thiserror::Error)]
#[error("ingest failed in state {failed_at}: {source}")]
pub struct IngestError {
    pub source: Error,
    pub failed_at: IngestState,
    pub commit_log: Option<CommitLog>,
}

impl IngestError {
    pub fn new(source: impl Into<Error>, failed_at: IngestState) -> Self {
        Self {
            source: source.into(),
            failed_at,
            commit_log: None,
        }
    }

    pub fn with_commit_log(mut self, log: CommitLog) -> Self {
        self.commit_log = Some(log);
        self
    }

    pub fn http_status(&self) -> u16 {
        self.source.http_status()
    }
}

impl From<IngestError> for Error {
    fn from(err: IngestError) -> Self {
        err.source
    }
}
