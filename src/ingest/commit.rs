use std::fmt;

use photostore_common::{Error, StoreTarget};
use serde::Serialize;

/// Result of one write attempted during commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum WriteOutcome {
    Committed,
    Failed(String),
    /// Not attempted because a write it depends on failed.
    Skipped(String),
}

/// One write addressed to a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteRecord {
    pub target: StoreTarget,
    /// Object key for content writes, `table/id` for metadata rows.
    pub key: String,
    pub outcome: WriteOutcome,
}

/// Every write of one ingest commit, in the order they settled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommitLog {
    records: Vec<WriteRecord>,
}

impl CommitLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record<T>(
        &mut self,
        target: StoreTarget,
        key: impl Into<String>,
        result: &Result<T, Error>,
    ) {
        let outcome = match result {
            Ok(_) => WriteOutcome::Committed,
            Err(Error::StoreWrite { message, .. }) => WriteOutcome::Failed(message.clone()),
            Err(e) => WriteOutcome::Failed(e.to_string()),
        };
        self.push(target, key, outcome);
    }

    pub fn push(&mut self, target: StoreTarget, key: impl Into<String>, outcome: WriteOutcome) {
        self.records.push(WriteRecord {
            target,
            key: key.into(),
            outcome,
        });
    }

    pub fn records(&self) -> &[WriteRecord] {
        &self.records
    }

    pub fn failures(&self) -> impl Iterator<Item = &WriteRecord> {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, WriteOutcome::Failed(_)))
    }

    pub fn committed(&self) -> impl Iterator<Item = &WriteRecord> {
        self.records
            .iter()
            .filter(|r| r.outcome == WriteOutcome::Committed)
    }

    pub fn is_clean(&self) -> bool {
        self.records
            .iter()
            .all(|r| r.outcome == WriteOutcome::Committed)
    }

    /// Writes that landed even though the commit as a whole failed.
    pub fn orphans(&self) -> Vec<&WriteRecord> {
        if self.is_clean() {
            return Vec::new();
        }
        self.committed().collect()
    }

    /// The first failed write as a [`Error::StoreWrite`].
    pub fn first_failure(&self) -> Option<Error> {
        self.records.iter().find_map(|r| match &r.outcome {
            WriteOutcome::Failed(msg) => Some(Error::store_write(r.target, &r.key, msg)),
            _ => None,
        })
    }
}

impl fmt::Display for CommitLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failed = self.failures().count();
        let committed = self.committed().count();
        write!(
            f,
            "{} writes: {} committed, {} failed, {} skipped",
            self.records.len(),
            committed,
            failed,
            self.records.len() - committed - failed
        )
    }
}
