#![forbid(unsafe_code)]

use super::load::{self, DerivedWrapper};
use super::{
    ChallengeView, HistoryRequest, PathView, SqliteStore, StoreError, TransitionEvent,
    WrapperView, to_sqlite_i64,
};
use mp_core::progression::{PathProgress, challenge_progress, check_mission_gate};
use mp_core::{
    Challenge, ChallengeId, MentorId, Path, PathId, TaskWrapper, TaskWrapperId, TransitionKind,
    UserId, WrapperFilter, WrapperStatus,
};
use rusqlite::{Connection, params};

impl SqliteStore {
    pub fn get_task_wrapper(
        &self,
        user_id: &UserId,
        wrapper_id: &TaskWrapperId,
    ) -> Result<WrapperView, StoreError> {
        let wrapper = load::require_wrapper(&self.conn, wrapper_id)?;
        wrapper_view(&self.conn, user_id, &wrapper)
    }

    /// Lists wrappers in authored order: challenges by path and position in the
    /// path (challenges outside any path last, by id), wrappers by `order`.
    pub fn list_task_wrappers(
        &self,
        user_id: &UserId,
        filter: WrapperFilter,
    ) -> Result<Vec<WrapperView>, StoreError> {
        let mut out = Vec::new();
        for challenge in all_challenges(&self.conn)? {
            for view in challenge_view(&self.conn, user_id, &challenge)?.wrappers {
                if filter.matches(view.status) {
                    out.push(view);
                }
            }
        }
        Ok(out)
    }

    pub fn get_challenge(
        &self,
        user_id: &UserId,
        challenge_id: &ChallengeId,
    ) -> Result<ChallengeView, StoreError> {
        let challenge = load::require_challenge(&self.conn, challenge_id)?;
        challenge_view(&self.conn, user_id, &challenge)
    }

    pub fn get_path(&self, user_id: &UserId, path_id: &PathId) -> Result<PathView, StoreError> {
        let path = load::require_path(&self.conn, path_id)?;
        path_view(&self.conn, user_id, &path)
    }

    /// The "new mission" gate: refused while a task is active, otherwise returns
    /// the wrappers the user could start next.
    pub fn mission_request(
        &self,
        user_id: &UserId,
        mentor_id: Option<&MentorId>,
    ) -> Result<Vec<WrapperView>, StoreError> {
        let state = load::user_state(&self.conn, user_id)?;
        check_mission_gate(state.active.as_ref())?;
        if let Some(mentor_id) = mentor_id
            && load::mentor(&self.conn, mentor_id)?.is_none()
        {
            return Err(StoreError::not_found("mentor", mentor_id.as_str()));
        }
        let available = self.list_task_wrappers(user_id, WrapperFilter::Active)?;
        Ok(available
            .into_iter()
            .filter(|view| view.status == WrapperStatus::Available)
            .filter(|view| mentor_id.is_none_or(|mentor| &view.wrapper.mentor_id == mentor))
            .collect())
    }

    pub fn transition_history(
        &self,
        request: HistoryRequest,
    ) -> Result<Vec<TransitionEvent>, StoreError> {
        let limit = to_sqlite_i64(request.limit)?;
        let mut stmt = self.conn.prepare(
            "SELECT seq, ts_ms, wrapper_id, kind, detail, revision FROM transitions \
             WHERE user_id=?1 AND (?2 IS NULL OR wrapper_id=?2) AND (?3 IS NULL OR seq > ?3) \
             ORDER BY seq ASC LIMIT ?4",
        )?;
        let rows = stmt
            .query_map(
                params![
                    request.user_id.as_str(),
                    request.wrapper_id.as_ref().map(|id| id.as_str()),
                    request.after_seq,
                    limit
                ],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, i64>(5)?,
                    ))
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;

        let mut out = Vec::with_capacity(rows.len());
        for (seq, ts_ms, wrapper_id, kind, detail, revision) in rows {
            let kind = TransitionKind::from_str(&kind)
                .ok_or(StoreError::InvalidInput("stored transition kind is malformed"))?;
            let detail = detail
                .map(|raw| serde_json::from_str(&raw))
                .transpose()
                .map_err(|_| StoreError::InvalidInput("stored transition detail is malformed"))?;
            out.push(TransitionEvent {
                seq,
                ts_ms,
                wrapper_id: load::parse_id(TaskWrapperId::try_new, wrapper_id)?,
                kind,
                detail,
                revision,
            });
        }
        Ok(out)
    }
}

fn all_challenges(conn: &Connection) -> Result<Vec<Challenge>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id FROM challenges \
         ORDER BY path_id IS NULL, path_id ASC, path_position ASC, id ASC",
    )?;
    let ids = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(challenge) = load::challenge(conn, &id)? {
            out.push(challenge);
        }
    }
    Ok(out)
}

fn expand(conn: &Connection, derived: DerivedWrapper) -> Result<WrapperView, StoreError> {
    let DerivedWrapper {
        wrapper,
        mark,
        status,
    } = derived;
    let task = load::task(conn, &wrapper.task_id)?
        .ok_or_else(|| StoreError::not_found("task", wrapper.task_id.as_str()))?;
    let mentor = load::mentor(conn, &wrapper.mentor_id)?
        .ok_or_else(|| StoreError::not_found("mentor", wrapper.mentor_id.as_str()))?;
    let (submission, skip_reason, skip_count, updated_at_ms) = match mark {
        Some(mark) => (
            mark.submission,
            mark.skip_reason,
            mark.skip_count,
            Some(mark.updated_at_ms),
        ),
        None => (None, None, 0, None),
    };
    Ok(WrapperView {
        wrapper,
        task,
        mentor,
        status,
        submission,
        skip_reason,
        skip_count,
        updated_at_ms,
    })
}

pub(super) fn wrapper_view(
    conn: &Connection,
    user_id: &UserId,
    wrapper: &TaskWrapper,
) -> Result<WrapperView, StoreError> {
    let active = load::user_state(conn, user_id)?.active;
    let derived = load::derive_wrapper(conn, user_id, wrapper, active.as_ref())?;
    expand(conn, derived)
}

pub(super) fn challenge_view(
    conn: &Connection,
    user_id: &UserId,
    challenge: &Challenge,
) -> Result<ChallengeView, StoreError> {
    let active = load::user_state(conn, user_id)?.active;
    let (gated, derived) = load::derive_challenge(conn, user_id, challenge, active.as_ref())?;
    let statuses = derived.iter().map(|entry| entry.status).collect::<Vec<_>>();
    let progress = challenge_progress(&statuses);
    let mentor = load::mentor(conn, &challenge.mentor_id)?
        .ok_or_else(|| StoreError::not_found("mentor", challenge.mentor_id.as_str()))?;
    let wrappers = derived
        .into_iter()
        .map(|entry| expand(conn, entry))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ChallengeView {
        challenge: challenge.clone(),
        mentor,
        progress,
        gated,
        wrappers,
    })
}

pub(super) fn path_view(
    conn: &Connection,
    user_id: &UserId,
    path: &Path,
) -> Result<PathView, StoreError> {
    let mut challenges = Vec::with_capacity(path.challenges.len());
    for challenge_id in &path.challenges {
        let challenge = load::require_challenge(conn, challenge_id)?;
        challenges.push(challenge_view(conn, user_id, &challenge)?);
    }
    let completion = challenges
        .iter()
        .map(|view| view.progress.is_completed)
        .collect::<Vec<_>>();
    Ok(PathView {
        path: path.clone(),
        progress: PathProgress::from_completion(&completion),
        challenges,
    })
}
