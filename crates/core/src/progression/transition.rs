#![forbid(unsafe_code)]

use crate::ids::TaskWrapperId;
use crate::model::{StoredMark, WrapperStatus};

/// Precondition failures for wrapper transitions. None of them is retryable as-is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransitionError {
    AlreadyActive { active_id: TaskWrapperId },
    NotAvailable { status: WrapperStatus },
    NotActive { active_id: Option<TaskWrapperId> },
    AlreadyCompleted,
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyActive { active_id } => {
                write!(f, "another task is already active (active={active_id})")
            }
            Self::NotAvailable { status } => write!(f, "task is not available (status={status})"),
            Self::NotActive { active_id } => match active_id {
                Some(active_id) => write!(f, "task is not the active one (active={active_id})"),
                None => write!(f, "task is not the active one (no active task)"),
            },
            Self::AlreadyCompleted => write!(f, "task is already completed"),
        }
    }
}

impl std::error::Error for TransitionError {}

/// Activation needs an available wrapper and a free active slot, checked in that order.
pub fn check_activate(
    status: WrapperStatus,
    active: Option<&TaskWrapperId>,
) -> Result<(), TransitionError> {
    match status {
        WrapperStatus::Locked | WrapperStatus::Completed => {
            return Err(TransitionError::NotAvailable { status });
        }
        WrapperStatus::Available | WrapperStatus::Active | WrapperStatus::Skipped => {}
    }
    if let Some(active_id) = active {
        return Err(TransitionError::AlreadyActive {
            active_id: active_id.clone(),
        });
    }
    Ok(())
}

pub fn check_complete(
    target: &TaskWrapperId,
    mark: Option<StoredMark>,
    active: Option<&TaskWrapperId>,
) -> Result<(), TransitionError> {
    if mark == Some(StoredMark::Completed) {
        return Err(TransitionError::AlreadyCompleted);
    }
    ensure_active(target, active)
}

pub fn check_skip(
    target: &TaskWrapperId,
    active: Option<&TaskWrapperId>,
) -> Result<(), TransitionError> {
    ensure_active(target, active)
}

fn ensure_active(
    target: &TaskWrapperId,
    active: Option<&TaskWrapperId>,
) -> Result<(), TransitionError> {
    if active.is_some_and(|id| id == target) {
        return Ok(());
    }
    Err(TransitionError::NotActive {
        active_id: active.cloned(),
    })
}

/// The "new mission" gate reads the same slot activation does.
pub fn check_mission_gate(active: Option<&TaskWrapperId>) -> Result<(), TransitionError> {
    match active {
        Some(active_id) => Err(TransitionError::AlreadyActive {
            active_id: active_id.clone(),
        }),
        None => Ok(()),
    }
}
