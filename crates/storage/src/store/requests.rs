#![forbid(unsafe_code)]

use mp_core::{ChallengeId, MentorId, PathId, TaskId, TaskWrapperId, UserId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActivateRequest {
    pub user_id: UserId,
    pub wrapper_id: TaskWrapperId,
    pub expected_revision: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompleteRequest {
    pub user_id: UserId,
    pub wrapper_id: TaskWrapperId,
    pub submission: Option<String>,
    pub expected_revision: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkipRequest {
    pub user_id: UserId,
    pub wrapper_id: TaskWrapperId,
    pub reason: Option<String>,
    pub expected_revision: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AggregateTarget {
    Challenge(ChallengeId),
    Path(PathId),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryRequest {
    pub user_id: UserId,
    pub wrapper_id: Option<TaskWrapperId>,
    /// Cursor: only events with a larger `seq` are returned.
    pub after_seq: Option<i64>,
    pub limit: usize,
}

/// Authored content. Applying the same catalog twice is a no-op; redefining an
/// existing entity differently is rejected.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    pub tasks: Vec<TaskDefinition>,
    pub mentors: Vec<MentorDefinition>,
    pub challenges: Vec<ChallengeDefinition>,
    pub paths: Vec<PathDefinition>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskDefinition {
    pub id: TaskId,
    pub name: String,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MentorDefinition {
    pub id: MentorId,
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChallengeDefinition {
    pub id: ChallengeId,
    pub name: String,
    pub description: String,
    pub mentor_id: MentorId,
    pub wrappers: Vec<WrapperDefinition>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WrapperDefinition {
    pub id: TaskWrapperId,
    pub task_id: TaskId,
    pub order: u32,
    /// Defaults to the challenge mentor.
    pub mentor_id: Option<MentorId>,
    pub icon: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathDefinition {
    pub id: PathId,
    pub name: String,
    pub description: String,
    pub gated: bool,
    pub challenges: Vec<ChallengeId>,
}
