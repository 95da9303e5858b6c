#![forbid(unsafe_code)]

use crate::ids::TaskWrapperId;
use crate::model::{StoredMark, WrapperStatus};

/// Stored facts for one wrapper of a challenge, as seen by one user.
#[derive(Clone, Copy, Debug)]
pub struct WrapperFacts<'a> {
    pub id: &'a TaskWrapperId,
    pub order: u32,
    pub mark: Option<StoredMark>,
}

/// Derives the read-time status of every wrapper in one challenge.
///
/// The result is aligned with `wrappers` (input order does not matter; the
/// ordering rule always uses `order`). A `Skipped` mark derives exactly like an
/// unmarked wrapper, so skipping never unlocks a successor.
pub fn derive_statuses(
    wrappers: &[WrapperFacts<'_>],
    active: Option<&TaskWrapperId>,
    gated: bool,
) -> Vec<WrapperStatus> {
    let mut by_order = (0..wrappers.len()).collect::<Vec<_>>();
    by_order.sort_by_key(|&index| wrappers[index].order);

    let mut out = vec![WrapperStatus::Locked; wrappers.len()];
    let mut previous_completed = true;
    for index in by_order {
        let facts = &wrappers[index];
        let completed = facts.mark == Some(StoredMark::Completed);
        out[index] = if completed {
            WrapperStatus::Completed
        } else if active.is_some_and(|id| id == facts.id) {
            WrapperStatus::Active
        } else if !gated && previous_completed {
            WrapperStatus::Available
        } else {
            WrapperStatus::Locked
        };
        previous_completed = completed;
    }
    out
}

/// Computes which challenges of a gated path are still locked by the path.
///
/// `completed` lists challenge completion in path order. Challenge `k` is gated
/// while challenge `k - 1` is not completed.
pub fn path_gates(completed: &[bool]) -> Vec<bool> {
    let mut gates = Vec::with_capacity(completed.len());
    let mut previous_completed = true;
    for done in completed {
        gates.push(!previous_completed);
        previous_completed = *done;
    }
    gates
}
