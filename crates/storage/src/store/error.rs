#![forbid(unsafe_code)]

use mp_core::WrapperStatus;
use mp_core::progression::{DefinitionError, TransitionError};

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Sql(rusqlite::Error),
    InvalidInput(&'static str),
    InvalidDefinition(DefinitionError),
    NotFound {
        kind: &'static str,
        id: String,
    },
    AlreadyActive {
        active_id: String,
    },
    NotAvailable {
        status: WrapperStatus,
    },
    NotActive {
        active_id: Option<String>,
    },
    AlreadyCompleted,
    ConcurrentConflict {
        expected: i64,
        actual: i64,
    },
}

impl StoreError {
    pub(crate) fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Sql(err) => write!(f, "sqlite: {err}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::InvalidDefinition(err) => write!(f, "invalid definition: {err}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found (id={id})"),
            Self::AlreadyActive { active_id } => {
                write!(f, "another task is already active (active={active_id})")
            }
            Self::NotAvailable { status } => write!(f, "task is not available (status={status})"),
            Self::NotActive { active_id } => match active_id {
                Some(active_id) => write!(f, "task is not active (active={active_id})"),
                None => write!(f, "task is not active (no active task)"),
            },
            Self::AlreadyCompleted => write!(f, "task already completed"),
            Self::ConcurrentConflict { expected, actual } => write!(
                f,
                "concurrent update (expected revision={expected}, actual={actual})"
            ),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sql(value)
    }
}

impl From<TransitionError> for StoreError {
    fn from(value: TransitionError) -> Self {
        match value {
            TransitionError::AlreadyActive { active_id } => Self::AlreadyActive {
                active_id: active_id.into_string(),
            },
            TransitionError::NotAvailable { status } => Self::NotAvailable { status },
            TransitionError::NotActive { active_id } => Self::NotActive {
                active_id: active_id.map(|id| id.into_string()),
            },
            TransitionError::AlreadyCompleted => Self::AlreadyCompleted,
        }
    }
}

impl From<DefinitionError> for StoreError {
    fn from(value: DefinitionError) -> Self {
        Self::InvalidDefinition(value)
    }
}
