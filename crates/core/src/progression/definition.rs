#![forbid(unsafe_code)]

use crate::ids::{ChallengeId, TaskWrapperId};
use std::collections::BTreeSet;

/// Authoring-time rejections. Users never see these at runtime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DefinitionError {
    EmptyChallenge,
    ZeroOrder { wrapper_id: TaskWrapperId },
    DuplicateOrder { order: u32 },
    DuplicateWrapper { wrapper_id: TaskWrapperId },
    DuplicateChallenge { challenge_id: ChallengeId },
}

impl std::fmt::Display for DefinitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyChallenge => write!(f, "challenge has no tasks"),
            Self::ZeroOrder { wrapper_id } => {
                write!(f, "order must be positive (wrapper={wrapper_id})")
            }
            Self::DuplicateOrder { order } => write!(f, "duplicate order {order} in challenge"),
            Self::DuplicateWrapper { wrapper_id } => {
                write!(f, "duplicate wrapper id {wrapper_id}")
            }
            Self::DuplicateChallenge { challenge_id } => {
                write!(f, "challenge {challenge_id} listed twice in path")
            }
        }
    }
}

impl std::error::Error for DefinitionError {}

/// Checks wrapper `(id, order)` pairs of one challenge: non-empty, positive and
/// unique orders, unique ids.
pub fn validate_challenge_orders(wrappers: &[(&TaskWrapperId, u32)]) -> Result<(), DefinitionError> {
    if wrappers.is_empty() {
        return Err(DefinitionError::EmptyChallenge);
    }
    let mut orders = BTreeSet::new();
    let mut ids = BTreeSet::new();
    for (id, order) in wrappers {
        if *order == 0 {
            return Err(DefinitionError::ZeroOrder {
                wrapper_id: (*id).clone(),
            });
        }
        if !orders.insert(*order) {
            return Err(DefinitionError::DuplicateOrder { order: *order });
        }
        if !ids.insert(id.as_str()) {
            return Err(DefinitionError::DuplicateWrapper {
                wrapper_id: (*id).clone(),
            });
        }
    }
    Ok(())
}

pub fn validate_path_challenges(challenges: &[ChallengeId]) -> Result<(), DefinitionError> {
    let mut seen = BTreeSet::new();
    for id in challenges {
        if !seen.insert(id.as_str()) {
            return Err(DefinitionError::DuplicateChallenge {
                challenge_id: id.clone(),
            });
        }
    }
    Ok(())
}
