//! Release execution state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Position of a release run in its state machine
///
/// `Idle → Syncing → QueryingVersions → AwaitingInput → Stepping(i) → Done | Failed`.
/// States only move forward. `Failed` is terminal and keeps the state it failed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReleaseState {
    /// Nothing started yet
    Idle,
    /// Rebuilding the distribution tree
    Syncing,
    /// Asking the platform and source control for their current versions
    QueryingVersions,
    /// Waiting for the operator's version and comment
    AwaitingInput,
    /// Running release step `i` (zero-based)
    Stepping(usize),
    /// All release steps succeeded
    Done,
    /// The run stopped; `at` is the state that failed
    Failed {
        at: Box<ReleaseState>,
        diagnostic: String,
    },
}

impl ReleaseState {
    /// Check if the state is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReleaseState::Done | ReleaseState::Failed { .. })
    }

    /// Whether `next` is a legal forward move from this state
    pub fn can_advance_to(&self, next: &ReleaseState) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            ReleaseState::Failed { .. } => !matches!(self, ReleaseState::Idle),
            _ => next.rank() > self.rank(),
        }
    }

    fn rank(&self) -> (u8, usize) {
        match self {
            ReleaseState::Idle => (0, 0),
            ReleaseState::Syncing => (1, 0),
            ReleaseState::QueryingVersions => (2, 0),
            ReleaseState::AwaitingInput => (3, 0),
            ReleaseState::Stepping(i) => (4, *i),
            ReleaseState::Done => (5, 0),
            ReleaseState::Failed { .. } => (6, 0),
        }
    }
}

impl Default for ReleaseState {
    fn default() -> Self {
        ReleaseState::Idle
    }
}

impl fmt::Display for ReleaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseState::Idle => write!(f, "idle"),
            ReleaseState::Syncing => write!(f, "syncing"),
            ReleaseState::QueryingVersions => write!(f, "querying versions"),
            ReleaseState::AwaitingInput => write!(f, "awaiting input"),
            ReleaseState::Stepping(i) => write!(f, "release step {}", i + 1),
            ReleaseState::Done => write!(f, "done"),
            ReleaseState::Failed { at, .. } => write!(f, "failed during {}", at),
        }
    }
}

/// Outcome of a completed release run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseReport {
    /// Unique run ID
    pub run_id: Uuid,

    /// Version identifier supplied by the operator
    pub version: String,

    /// Release comment supplied by the operator
    pub comment: String,

    /// Version the platform reported before the release (may be empty)
    pub platform_version: String,

    /// Source-control describe string before the release (may be empty)
    pub vcs_version: String,

    /// Number of files copied into the distribution tree
    pub files_synced: usize,

    /// Number of release steps executed
    pub steps_completed: usize,

    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}
