#![forbid(unsafe_code)]

use crate::ids::{ChallengeId, MentorId, PathId, TaskId, TaskWrapperId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mentor {
    pub id: MentorId,
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
}

/// A positioned instance of a [`Task`] inside one challenge.
///
/// The definition is shared by every user; status lives in per-user facts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskWrapper {
    pub id: TaskWrapperId,
    pub task_id: TaskId,
    pub challenge_id: ChallengeId,
    pub order: u32,
    pub mentor_id: MentorId,
    pub icon: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Challenge {
    pub id: ChallengeId,
    pub name: String,
    pub description: String,
    pub mentor_id: MentorId,
    pub path_id: Option<PathId>,
    /// Wrapper ids sorted by ascending `order`.
    pub ordered_tasks: Vec<TaskWrapperId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    pub id: PathId,
    pub name: String,
    pub description: String,
    /// When set, a challenge stays locked until the previous one in the path is completed.
    pub gated: bool,
    pub challenges: Vec<ChallengeId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WrapperStatus {
    Locked,
    Available,
    Active,
    Completed,
    Skipped,
}

impl WrapperStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Available => "available",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Skipped => "skipped",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "locked" => Some(Self::Locked),
            "available" => Some(Self::Available),
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }
}

impl std::fmt::Display for WrapperStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The only per-wrapper facts that are persisted. Everything else is derived.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoredMark {
    Completed,
    Skipped,
}

impl StoredMark {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Skipped => "skipped",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "completed" => Some(Self::Completed),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WrapperFilter {
    /// Wrappers the user can work on right now: Active or Available.
    Active,
    Completed,
    All,
}

impl WrapperFilter {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::All => "all",
        }
    }

    pub fn matches(self, status: WrapperStatus) -> bool {
        match self {
            Self::Active => matches!(status, WrapperStatus::Active | WrapperStatus::Available),
            Self::Completed => status == WrapperStatus::Completed,
            Self::All => true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionKind {
    Activated,
    Completed,
    Skipped,
}

impl TransitionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Activated => "activated",
            Self::Completed => "completed",
            Self::Skipped => "skipped",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "activated" => Some(Self::Activated),
            "completed" => Some(Self::Completed),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }
}
