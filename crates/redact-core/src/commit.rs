//! Local half of a commit: merging pending spans into the applied set
//!
//! The network call sits between [`Session::begin_commit`] and
//! [`Session::finish_commit`]; neither touches I/O.
//!
//! [`Session::begin_commit`]: crate::Session::begin_commit
//! [`Session::finish_commit`]: crate::Session::finish_commit

use serde::{Deserialize, Serialize};

use crate::span::{Span, SpanId};

/// When local state is updated relative to the persistence call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitPolicy {
    /// Install the merged set before persisting; keep it if persisting fails
    #[default]
    Optimistic,
    /// Install the merged set only once persisting succeeded
    Staged,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SyncState {
    /// Nothing committed in this session yet
    #[default]
    Clean,
    /// The last commit was persisted
    Synced,
    /// The last persistence call failed; local and stored spans may differ
    SyncFailed { message: String },
}

/// Everything the persistence call needs, plus what to do once it returns
#[derive(Debug, Clone)]
pub struct CommitPlan {
    pub filename: String,
    /// Full applied set after the merge
    pub applied: Vec<Span>,
    /// Pending span ids moved by this commit
    pub committed: Vec<SpanId>,
    pub policy: CommitPolicy,
}

impl CommitPlan {
    pub fn committed_count(&self) -> usize {
        self.committed.len()
    }
}

/// Result of the persistence call, as seen by the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Persisted { redaction_count: Option<usize> },
    Failed { message: String },
}
