#![forbid(unsafe_code)]

use super::load::{self, UserState};
use super::{
    ActivateRequest, AggregateSnapshot, AggregateTarget, CompleteOutcome, CompleteRequest,
    ProgressionState, SkipRequest, SqliteStore, StoreError, StoredPathProgress,
    TransitionOutcome, now_ms,
};
use mp_core::progression::{
    ChallengeProgress, PathProgress, challenge_progress, check_activate, check_complete,
    check_skip,
};
use mp_core::{
    ChallengeId, PathId, StoredMark, TaskWrapperId, TransitionKind, UserId, WrapperStatus,
};
use rusqlite::{Connection, Transaction, params};

impl SqliteStore {
    pub fn activate(&mut self, request: ActivateRequest) -> Result<TransitionOutcome, StoreError> {
        let ActivateRequest {
            user_id,
            wrapper_id,
            expected_revision,
        } = request;

        let now_ms = now_ms();
        let tx = self.write_tx()?;
        let wrapper = load::require_wrapper(&tx, &wrapper_id)?;
        let state = begin_transition_tx(&tx, &user_id, expected_revision, now_ms)?;
        let derived = load::derive_wrapper(&tx, &user_id, &wrapper, state.active.as_ref())?;
        check_activate(derived.status, state.active.as_ref())?;

        let revision =
            load::advance_user_tx(&tx, &user_id, state.revision, Some(&wrapper_id), now_ms)?;
        insert_transition_tx(
            &tx,
            &user_id,
            &wrapper_id,
            TransitionKind::Activated,
            None,
            revision,
            now_ms,
        )?;
        recompute_challenge_tx(&tx, &user_id, &wrapper.challenge_id, now_ms)?;

        let view = super::views::wrapper_view(&tx, &user_id, &wrapper)?;
        tx.commit()?;
        Ok(TransitionOutcome {
            wrapper: view,
            revision,
        })
    }

    pub fn complete(&mut self, request: CompleteRequest) -> Result<CompleteOutcome, StoreError> {
        let CompleteRequest {
            user_id,
            wrapper_id,
            submission,
            expected_revision,
        } = request;

        let now_ms = now_ms();
        let tx = self.write_tx()?;
        let wrapper = load::require_wrapper(&tx, &wrapper_id)?;
        let mark = load::mark(&tx, &user_id, &wrapper_id)?;
        // A retried completion is settled by the mark alone, whatever revision it carries.
        if mark.as_ref().is_some_and(|row| row.mark == StoredMark::Completed) {
            return Err(StoreError::AlreadyCompleted);
        }
        let state = begin_transition_tx(&tx, &user_id, expected_revision, now_ms)?;
        check_complete(
            &wrapper_id,
            mark.as_ref().map(|row| row.mark),
            state.active.as_ref(),
        )?;

        let was_completed = load::challenge_completed(&tx, &user_id, &wrapper.challenge_id)?;
        tx.execute(
            r#"
            INSERT INTO wrapper_marks(user_id, wrapper_id, mark, submission, skip_reason, skip_count, updated_at_ms)
            VALUES (?1, ?2, 'completed', ?3, NULL, 0, ?4)
            ON CONFLICT(user_id, wrapper_id) DO UPDATE
              SET mark='completed', submission=excluded.submission, updated_at_ms=excluded.updated_at_ms
            "#,
            params![
                user_id.as_str(),
                wrapper_id.as_str(),
                submission.as_deref(),
                now_ms
            ],
        )?;
        let revision = load::advance_user_tx(&tx, &user_id, state.revision, None, now_ms)?;
        insert_transition_tx(
            &tx,
            &user_id,
            &wrapper_id,
            TransitionKind::Completed,
            detail_json("submission", submission.as_deref()),
            revision,
            now_ms,
        )?;

        let challenge_id = wrapper.challenge_id.clone();
        let progress = recompute_challenge_tx(&tx, &user_id, &challenge_id, now_ms)?;
        let challenge_completed = progress.is_completed && !was_completed;
        let challenge = load::require_challenge(&tx, &challenge_id)?;
        if challenge_completed && let Some(path_id) = challenge.path_id.as_ref() {
            recompute_path_tx(&tx, &user_id, path_id, now_ms)?;
        }

        let wrapper_view = super::views::wrapper_view(&tx, &user_id, &wrapper)?;
        let challenge_view = super::views::challenge_view(&tx, &user_id, &challenge)?;
        let path_view = match challenge.path_id.as_ref() {
            Some(path_id) => Some(super::views::path_view(
                &tx,
                &user_id,
                &load::require_path(&tx, path_id)?,
            )?),
            None => None,
        };
        tx.commit()?;

        Ok(CompleteOutcome {
            wrapper: wrapper_view,
            challenge: challenge_view,
            path: path_view,
            challenge_completed,
            revision,
        })
    }

    pub fn skip(&mut self, request: SkipRequest) -> Result<TransitionOutcome, StoreError> {
        let SkipRequest {
            user_id,
            wrapper_id,
            reason,
            expected_revision,
        } = request;

        let now_ms = now_ms();
        let tx = self.write_tx()?;
        let wrapper = load::require_wrapper(&tx, &wrapper_id)?;
        let state = begin_transition_tx(&tx, &user_id, expected_revision, now_ms)?;
        check_skip(&wrapper_id, state.active.as_ref())?;

        tx.execute(
            r#"
            INSERT INTO wrapper_marks(user_id, wrapper_id, mark, submission, skip_reason, skip_count, updated_at_ms)
            VALUES (?1, ?2, 'skipped', NULL, ?3, 1, ?4)
            ON CONFLICT(user_id, wrapper_id) DO UPDATE
              SET mark='skipped', skip_reason=excluded.skip_reason,
                  skip_count=wrapper_marks.skip_count + 1, updated_at_ms=excluded.updated_at_ms
            "#,
            params![
                user_id.as_str(),
                wrapper_id.as_str(),
                reason.as_deref(),
                now_ms
            ],
        )?;
        let revision = load::advance_user_tx(&tx, &user_id, state.revision, None, now_ms)?;
        insert_transition_tx(
            &tx,
            &user_id,
            &wrapper_id,
            TransitionKind::Skipped,
            detail_json("reason", reason.as_deref()),
            revision,
            now_ms,
        )?;
        recompute_challenge_tx(&tx, &user_id, &wrapper.challenge_id, now_ms)?;

        let mut view = super::views::wrapper_view(&tx, &user_id, &wrapper)?;
        tx.commit()?;
        // The skip itself is reported; the next read derives Available again.
        view.status = WrapperStatus::Skipped;
        Ok(TransitionOutcome {
            wrapper: view,
            revision,
        })
    }

    /// Rewrites stored challenge/path counters from the marks. Never touches marks or the slot.
    pub fn recompute_aggregates(
        &mut self,
        user_id: &UserId,
        target: &AggregateTarget,
    ) -> Result<AggregateSnapshot, StoreError> {
        let now_ms = now_ms();
        let tx = self.write_tx()?;
        let snapshot = match target {
            AggregateTarget::Challenge(challenge_id) => {
                load::require_challenge(&tx, challenge_id)?;
                AggregateSnapshot::Challenge(recompute_challenge_tx(
                    &tx,
                    user_id,
                    challenge_id,
                    now_ms,
                )?)
            }
            AggregateTarget::Path(path_id) => {
                let (progress, challenges) = recompute_path_tx(&tx, user_id, path_id, now_ms)?;
                AggregateSnapshot::Path {
                    progress,
                    challenges,
                }
            }
        };
        tx.commit()?;
        Ok(snapshot)
    }

    pub fn progression_state(&self, user_id: &UserId) -> Result<ProgressionState, StoreError> {
        let UserState { active, revision } = load::user_state(&self.conn, user_id)?;
        let mut stmt = self.conn.prepare(
            "SELECT path_id, completed_challenges, total_challenges, updated_at_ms \
             FROM path_progress WHERE user_id=?1 ORDER BY path_id ASC",
        )?;
        let rows = stmt
            .query_map(params![user_id.as_str()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        let mut paths = Vec::with_capacity(rows.len());
        for (path_id, completed, total, updated_at_ms) in rows {
            paths.push(StoredPathProgress {
                path_id: load::parse_id(PathId::try_new, path_id)?,
                progress: PathProgress {
                    completed_challenges: counter(completed)?,
                    total_challenges: counter(total)?,
                },
                updated_at_ms,
            });
        }
        Ok(ProgressionState {
            user_id: user_id.clone(),
            active_wrapper_id: active,
            revision,
            paths,
        })
    }
}

fn counter(value: i64) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::InvalidInput("stored counter out of range"))
}

fn begin_transition_tx(
    tx: &Transaction<'_>,
    user_id: &UserId,
    expected_revision: Option<i64>,
    now_ms: i64,
) -> Result<UserState, StoreError> {
    load::ensure_user_tx(tx, user_id, now_ms)?;
    let state = load::user_state(tx, user_id)?;
    if let Some(expected) = expected_revision
        && expected != state.revision
    {
        return Err(StoreError::ConcurrentConflict {
            expected,
            actual: state.revision,
        });
    }
    Ok(state)
}

fn detail_json(key: &str, value: Option<&str>) -> Option<String> {
    value.map(|value| {
        let mut detail = serde_json::Map::new();
        detail.insert(key.to_string(), serde_json::Value::String(value.to_string()));
        serde_json::Value::Object(detail).to_string()
    })
}

fn insert_transition_tx(
    tx: &Transaction<'_>,
    user_id: &UserId,
    wrapper_id: &TaskWrapperId,
    kind: TransitionKind,
    detail: Option<String>,
    revision: i64,
    now_ms: i64,
) -> Result<(), StoreError> {
    tx.execute(
        "INSERT INTO transitions(user_id, wrapper_id, kind, detail, revision, ts_ms) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user_id.as_str(),
            wrapper_id.as_str(),
            kind.as_str(),
            detail,
            revision,
            now_ms
        ],
    )?;
    Ok(())
}

fn challenge_progress_for(
    conn: &Connection,
    user_id: &UserId,
    challenge_id: &ChallengeId,
) -> Result<ChallengeProgress, StoreError> {
    let challenge = load::require_challenge(conn, challenge_id)?;
    let active = load::user_state(conn, user_id)?.active;
    let (_, derived) = load::derive_challenge(conn, user_id, &challenge, active.as_ref())?;
    let statuses = derived.iter().map(|entry| entry.status).collect::<Vec<_>>();
    Ok(challenge_progress(&statuses))
}

pub(super) fn recompute_challenge_tx(
    tx: &Transaction<'_>,
    user_id: &UserId,
    challenge_id: &ChallengeId,
    now_ms: i64,
) -> Result<ChallengeProgress, StoreError> {
    let progress = challenge_progress_for(tx, user_id, challenge_id)?;
    tx.execute(
        r#"
        INSERT INTO challenge_progress(user_id, challenge_id, completed_tasks, total_tasks, is_completed, is_active, updated_at_ms)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(user_id, challenge_id) DO UPDATE
          SET completed_tasks=excluded.completed_tasks, total_tasks=excluded.total_tasks,
              is_completed=excluded.is_completed, is_active=excluded.is_active,
              updated_at_ms=excluded.updated_at_ms
        "#,
        params![
            user_id.as_str(),
            challenge_id.as_str(),
            progress.completed_tasks,
            progress.total_tasks,
            progress.is_completed,
            progress.is_active,
            now_ms
        ],
    )?;
    Ok(progress)
}

/// Recomputes every member challenge (gates may have moved) and then the path counters.
pub(super) fn recompute_path_tx(
    tx: &Transaction<'_>,
    user_id: &UserId,
    path_id: &PathId,
    now_ms: i64,
) -> Result<(PathProgress, Vec<ChallengeProgress>), StoreError> {
    let path = load::require_path(tx, path_id)?;
    let mut challenges = Vec::with_capacity(path.challenges.len());
    for challenge_id in &path.challenges {
        challenges.push(recompute_challenge_tx(tx, user_id, challenge_id, now_ms)?);
    }
    let completion = challenges
        .iter()
        .map(|progress| progress.is_completed)
        .collect::<Vec<_>>();
    let progress = PathProgress::from_completion(&completion);
    tx.execute(
        r#"
        INSERT INTO path_progress(user_id, path_id, completed_challenges, total_challenges, updated_at_ms)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(user_id, path_id) DO UPDATE
          SET completed_challenges=excluded.completed_challenges,
              total_challenges=excluded.total_challenges,
              updated_at_ms=excluded.updated_at_ms
        "#,
        params![
            user_id.as_str(),
            path_id.as_str(),
            progress.completed_challenges,
            progress.total_challenges,
            now_ms
        ],
    )?;
    Ok((progress, challenges))
}
