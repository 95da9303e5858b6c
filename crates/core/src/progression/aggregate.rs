#![forbid(unsafe_code)]

use crate::model::WrapperStatus;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChallengeProgress {
    pub completed_tasks: u32,
    pub total_tasks: u32,
    pub is_completed: bool,
    pub is_active: bool,
}

pub fn challenge_progress(statuses: &[WrapperStatus]) -> ChallengeProgress {
    let total_tasks = count_u32(statuses.len());
    let completed_tasks = count_u32(
        statuses
            .iter()
            .filter(|status| **status == WrapperStatus::Completed)
            .count(),
    );
    let is_completed = total_tasks > 0 && completed_tasks == total_tasks;
    let is_active = !is_completed
        && statuses
            .iter()
            .any(|status| matches!(status, WrapperStatus::Active | WrapperStatus::Available));
    ChallengeProgress {
        completed_tasks,
        total_tasks,
        is_completed,
        is_active,
    }
}

/// Path progress kept as an exact fraction; only [`PathProgress::percent`] rounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PathProgress {
    pub completed_challenges: u32,
    pub total_challenges: u32,
}

impl PathProgress {
    pub fn from_completion(completed: &[bool]) -> Self {
        Self {
            completed_challenges: count_u32(completed.iter().filter(|done| **done).count()),
            total_challenges: count_u32(completed.len()),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.total_challenges > 0 && self.completed_challenges >= self.total_challenges
    }

    /// Exact progress in `[0.0, 100.0]`.
    pub fn ratio_percent(&self) -> f64 {
        if self.total_challenges == 0 {
            return 0.0;
        }
        f64::from(self.completed_challenges) * 100.0 / f64::from(self.total_challenges)
    }

    /// Display percentage, rounded half up.
    pub fn percent(&self) -> u32 {
        if self.total_challenges == 0 {
            return 0;
        }
        let completed = u64::from(self.completed_challenges.min(self.total_challenges));
        let total = u64::from(self.total_challenges);
        let rounded = (completed * 200 + total) / (total * 2);
        u32::try_from(rounded).unwrap_or(100)
    }
}

fn count_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
