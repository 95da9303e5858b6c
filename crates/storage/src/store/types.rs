#![forbid(unsafe_code)]

use mp_core::progression::{ChallengeProgress, PathProgress};
use mp_core::{
    Challenge, Mentor, Path, PathId, Task, TaskWrapper, TaskWrapperId, TransitionKind, UserId,
    WrapperStatus,
};

/// A wrapper as one user sees it: definition, content, mentor and derived status.
#[derive(Clone, Debug, PartialEq)]
pub struct WrapperView {
    pub wrapper: TaskWrapper,
    pub task: Task,
    pub mentor: Mentor,
    pub status: WrapperStatus,
    pub submission: Option<String>,
    pub skip_reason: Option<String>,
    pub skip_count: u32,
    pub updated_at_ms: Option<i64>,
}

impl WrapperView {
    pub fn skipped(&self) -> bool {
        self.skip_count > 0 && self.status != WrapperStatus::Completed
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChallengeView {
    pub challenge: Challenge,
    pub mentor: Mentor,
    pub progress: ChallengeProgress,
    /// Locked by an outer gated path.
    pub gated: bool,
    pub wrappers: Vec<WrapperView>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PathView {
    pub path: Path,
    pub progress: PathProgress,
    pub challenges: Vec<ChallengeView>,
}

/// Result of an activate or skip: the wrapper and the revision this write produced.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionOutcome {
    pub wrapper: WrapperView,
    pub revision: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompleteOutcome {
    pub wrapper: WrapperView,
    pub challenge: ChallengeView,
    pub path: Option<PathView>,
    pub challenge_completed: bool,
    pub revision: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgressionState {
    pub user_id: UserId,
    pub active_wrapper_id: Option<TaskWrapperId>,
    pub revision: i64,
    /// Stored path aggregates, last written by the engine.
    pub paths: Vec<StoredPathProgress>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredPathProgress {
    pub path_id: PathId,
    pub progress: PathProgress,
    pub updated_at_ms: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AggregateSnapshot {
    Challenge(ChallengeProgress),
    Path {
        progress: PathProgress,
        challenges: Vec<ChallengeProgress>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionEvent {
    pub seq: i64,
    pub ts_ms: i64,
    pub wrapper_id: TaskWrapperId,
    pub kind: TransitionKind,
    /// `{"submission": ..}` or `{"reason": ..}` when the caller supplied one.
    pub detail: Option<serde_json::Value>,
    pub revision: i64,
}
