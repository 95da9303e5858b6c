#![forbid(unsafe_code)]

use super::StoreError;
use mp_core::progression::{WrapperFacts, derive_statuses, path_gates};
use mp_core::{
    Challenge, ChallengeId, IdError, Mentor, MentorId, Path, PathId, StoredMark, Task, TaskId,
    TaskWrapper, TaskWrapperId, UserId, WrapperStatus,
};
use rusqlite::{Connection, OptionalExtension, Transaction, params};

pub(super) fn parse_id<T>(
    parse: fn(String) -> Result<T, IdError>,
    raw: String,
) -> Result<T, StoreError> {
    parse(raw).map_err(|_| StoreError::InvalidInput("stored id is malformed"))
}

fn parse_opt_id<T>(
    parse: fn(String) -> Result<T, IdError>,
    raw: Option<String>,
) -> Result<Option<T>, StoreError> {
    raw.map(|raw| parse_id(parse, raw)).transpose()
}

fn to_u32(value: i64) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::InvalidInput("stored counter out of range"))
}

#[derive(Clone, Debug)]
pub(super) struct UserState {
    pub(super) active: Option<TaskWrapperId>,
    pub(super) revision: i64,
}

pub(super) fn user_state(conn: &Connection, user: &UserId) -> Result<UserState, StoreError> {
    let row = conn
        .query_row(
            "SELECT active_wrapper_id, revision FROM user_progress WHERE user_id=?1",
            params![user.as_str()],
            |row| Ok((row.get::<_, Option<String>>(0)?, row.get::<_, i64>(1)?)),
        )
        .optional()?;
    match row {
        Some((active, revision)) => Ok(UserState {
            active: parse_opt_id(TaskWrapperId::try_new, active)?,
            revision,
        }),
        None => Ok(UserState {
            active: None,
            revision: 0,
        }),
    }
}

pub(super) fn ensure_user_tx(
    tx: &Transaction<'_>,
    user: &UserId,
    now_ms: i64,
) -> Result<(), StoreError> {
    tx.execute(
        "INSERT OR IGNORE INTO user_progress(user_id, active_wrapper_id, revision, updated_at_ms) \
         VALUES (?1, NULL, 0, ?2)",
        params![user.as_str(), now_ms],
    )?;
    Ok(())
}

/// Compare-and-swap on the per-user aggregate. Returns the new revision.
pub(super) fn advance_user_tx(
    tx: &Transaction<'_>,
    user: &UserId,
    expected_revision: i64,
    active: Option<&TaskWrapperId>,
    now_ms: i64,
) -> Result<i64, StoreError> {
    let next = expected_revision + 1;
    let changed = tx.execute(
        "UPDATE user_progress SET active_wrapper_id=?3, revision=?4, updated_at_ms=?5 \
         WHERE user_id=?1 AND revision=?2",
        params![
            user.as_str(),
            expected_revision,
            active.map(|id| id.as_str()),
            next,
            now_ms
        ],
    )?;
    if changed == 0 {
        let actual = user_state(tx, user)?.revision;
        return Err(StoreError::ConcurrentConflict {
            expected: expected_revision,
            actual,
        });
    }
    Ok(next)
}

type WrapperRow = (String, String, String, i64, String, Option<String>);

const WRAPPER_COLUMNS: &str = "w.id, w.task_id, w.challenge_id, w.ord, w.mentor_id, w.icon";

fn wrapper_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<WrapperRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn wrapper_from_row(
    (id, task_id, challenge_id, order, mentor_id, icon): WrapperRow,
) -> Result<TaskWrapper, StoreError> {
    Ok(TaskWrapper {
        id: parse_id(TaskWrapperId::try_new, id)?,
        task_id: parse_id(TaskId::try_new, task_id)?,
        challenge_id: parse_id(ChallengeId::try_new, challenge_id)?,
        order: to_u32(order)?,
        mentor_id: parse_id(MentorId::try_new, mentor_id)?,
        icon,
    })
}

pub(super) fn wrapper(conn: &Connection, id: &str) -> Result<Option<TaskWrapper>, StoreError> {
    let row = conn
        .prepare_cached(&format!(
            "SELECT {WRAPPER_COLUMNS} FROM task_wrappers w WHERE w.id=?1"
        ))?
        .query_row(params![id], wrapper_row)
        .optional()?;
    row.map(wrapper_from_row).transpose()
}

pub(super) fn require_wrapper(
    conn: &Connection,
    id: &TaskWrapperId,
) -> Result<TaskWrapper, StoreError> {
    wrapper(conn, id.as_str())?.ok_or_else(|| StoreError::not_found("task_wrapper", id.as_str()))
}

pub(super) fn challenge_wrappers(
    conn: &Connection,
    challenge_id: &ChallengeId,
) -> Result<Vec<TaskWrapper>, StoreError> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {WRAPPER_COLUMNS} FROM task_wrappers w WHERE w.challenge_id=?1 ORDER BY w.ord ASC"
    ))?;
    let rows = stmt
        .query_map(params![challenge_id.as_str()], wrapper_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(wrapper_from_row).collect()
}

/// A challenge's wrappers in `order`, each with the user's mark, in one query.
fn challenge_wrappers_with_marks(
    conn: &Connection,
    user: &UserId,
    challenge_id: &ChallengeId,
) -> Result<Vec<(TaskWrapper, Option<MarkRow>)>, StoreError> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {WRAPPER_COLUMNS}, m.mark, m.submission, m.skip_reason, m.skip_count, m.updated_at_ms \
         FROM task_wrappers w \
         LEFT JOIN wrapper_marks m ON m.wrapper_id = w.id AND m.user_id = ?1 \
         WHERE w.challenge_id = ?2 \
         ORDER BY w.ord ASC"
    ))?;
    let rows = stmt
        .query_map(params![user.as_str(), challenge_id.as_str()], |row| {
            Ok((
                wrapper_row(row)?,
                row.get::<_, Option<String>>(6)?,
                row.get::<_, Option<String>>(7)?,
                row.get::<_, Option<String>>(8)?,
                row.get::<_, Option<i64>>(9)?,
                row.get::<_, Option<i64>>(10)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut out = Vec::with_capacity(rows.len());
    for (wrapper, mark, submission, skip_reason, skip_count, updated_at_ms) in rows {
        let mark = match mark {
            Some(raw) => Some(MarkRow {
                mark: StoredMark::from_str(&raw)
                    .ok_or(StoreError::InvalidInput("stored mark is malformed"))?,
                submission,
                skip_reason,
                skip_count: to_u32(skip_count.unwrap_or(0))?,
                updated_at_ms: updated_at_ms.unwrap_or(0),
            }),
            None => None,
        };
        out.push((wrapper_from_row(wrapper)?, mark));
    }
    Ok(out)
}

pub(super) fn challenge(conn: &Connection, id: &str) -> Result<Option<Challenge>, StoreError> {
    let row = conn
        .query_row(
            "SELECT id, name, description, mentor_id, path_id FROM challenges WHERE id=?1",
            params![id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            },
        )
        .optional()?;
    let Some((id, name, description, mentor_id, path_id)) = row else {
        return Ok(None);
    };
    let id = parse_id(ChallengeId::try_new, id)?;
    let ordered_tasks = challenge_wrappers(conn, &id)?
        .into_iter()
        .map(|wrapper| wrapper.id)
        .collect();
    Ok(Some(Challenge {
        id,
        name,
        description,
        mentor_id: parse_id(MentorId::try_new, mentor_id)?,
        path_id: parse_opt_id(PathId::try_new, path_id)?,
        ordered_tasks,
    }))
}

pub(super) fn require_challenge(
    conn: &Connection,
    id: &ChallengeId,
) -> Result<Challenge, StoreError> {
    challenge(conn, id.as_str())?.ok_or_else(|| StoreError::not_found("challenge", id.as_str()))
}

pub(super) fn path(conn: &Connection, id: &str) -> Result<Option<Path>, StoreError> {
    let row = conn
        .query_row(
            "SELECT id, name, description, gated FROM paths WHERE id=?1",
            params![id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            },
        )
        .optional()?;
    let Some((id, name, description, gated)) = row else {
        return Ok(None);
    };
    let mut stmt = conn.prepare(
        "SELECT id FROM challenges WHERE path_id=?1 ORDER BY path_position ASC",
    )?;
    let challenges = stmt
        .query_map(params![&id], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|raw| parse_id(ChallengeId::try_new, raw))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(Path {
        id: parse_id(PathId::try_new, id)?,
        name,
        description,
        gated: gated != 0,
        challenges,
    }))
}

pub(super) fn require_path(conn: &Connection, id: &PathId) -> Result<Path, StoreError> {
    path(conn, id.as_str())?.ok_or_else(|| StoreError::not_found("path", id.as_str()))
}

pub(super) fn task(conn: &Connection, id: &TaskId) -> Result<Option<Task>, StoreError> {
    let row = conn
        .prepare_cached("SELECT name, description FROM tasks WHERE id=?1")?
        .query_row(params![id.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .optional()?;
    Ok(row.map(|(name, description)| Task {
        id: id.clone(),
        name,
        description,
    }))
}

pub(super) fn mentor(conn: &Connection, id: &MentorId) -> Result<Option<Mentor>, StoreError> {
    let row = conn
        .prepare_cached("SELECT name, description, icon FROM mentors WHERE id=?1")?
        .query_row(params![id.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })
        .optional()?;
    Ok(row.map(|(name, description, icon)| Mentor {
        id: id.clone(),
        name,
        description,
        icon,
    }))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) struct MarkRow {
    pub(super) mark: StoredMark,
    pub(super) submission: Option<String>,
    pub(super) skip_reason: Option<String>,
    pub(super) skip_count: u32,
    pub(super) updated_at_ms: i64,
}

pub(super) fn mark(
    conn: &Connection,
    user: &UserId,
    wrapper_id: &TaskWrapperId,
) -> Result<Option<MarkRow>, StoreError> {
    let row = conn
        .query_row(
            "SELECT mark, submission, skip_reason, skip_count, updated_at_ms \
             FROM wrapper_marks WHERE user_id=?1 AND wrapper_id=?2",
            params![user.as_str(), wrapper_id.as_str()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            },
        )
        .optional()?;
    let Some((mark, submission, skip_reason, skip_count, updated_at_ms)) = row else {
        return Ok(None);
    };
    let mark = StoredMark::from_str(&mark)
        .ok_or(StoreError::InvalidInput("stored mark is malformed"))?;
    Ok(Some(MarkRow {
        mark,
        submission,
        skip_reason,
        skip_count: to_u32(skip_count)?,
        updated_at_ms,
    }))
}

pub(super) fn challenge_completed(
    conn: &Connection,
    user: &UserId,
    challenge_id: &ChallengeId,
) -> Result<bool, StoreError> {
    let (total, completed) = conn.query_row(
        "SELECT COUNT(w.id), COUNT(m.wrapper_id) \
         FROM task_wrappers w \
         LEFT JOIN wrapper_marks m \
           ON m.wrapper_id = w.id AND m.user_id = ?1 AND m.mark = 'completed' \
         WHERE w.challenge_id = ?2",
        params![user.as_str(), challenge_id.as_str()],
        |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
    )?;
    Ok(total > 0 && total == completed)
}

/// Completion of every challenge on a path, in path order, in one query.
fn path_completion(
    conn: &Connection,
    user: &UserId,
    path_id: &PathId,
) -> Result<Vec<(ChallengeId, bool)>, StoreError> {
    let mut stmt = conn.prepare_cached(
        "SELECT c.id, COUNT(w.id), COUNT(m.wrapper_id) \
         FROM challenges c \
         LEFT JOIN task_wrappers w ON w.challenge_id = c.id \
         LEFT JOIN wrapper_marks m \
           ON m.wrapper_id = w.id AND m.user_id = ?1 AND m.mark = 'completed' \
         WHERE c.path_id = ?2 \
         GROUP BY c.id \
         ORDER BY c.path_position ASC",
    )?;
    let rows = stmt
        .query_map(params![user.as_str(), path_id.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter()
        .map(|(id, total, completed)| {
            Ok((
                parse_id(ChallengeId::try_new, id)?,
                total > 0 && total == completed,
            ))
        })
        .collect()
}

/// Whether an outer gated path still holds this challenge locked for the user.
pub(super) fn challenge_gated(
    conn: &Connection,
    user: &UserId,
    challenge: &Challenge,
) -> Result<bool, StoreError> {
    let Some(path_id) = challenge.path_id.as_ref() else {
        return Ok(false);
    };
    let gated = conn
        .prepare_cached("SELECT gated FROM paths WHERE id=?1")?
        .query_row(params![path_id.as_str()], |row| row.get::<_, i64>(0))
        .optional()?;
    if gated.unwrap_or(0) == 0 {
        return Ok(false);
    }
    let members = path_completion(conn, user, path_id)?;
    let Some(position) = members.iter().position(|(id, _)| id == &challenge.id) else {
        return Ok(false);
    };
    let completed = members.iter().map(|(_, done)| *done).collect::<Vec<_>>();
    Ok(path_gates(&completed)[position])
}

#[derive(Clone, Debug)]
pub(super) struct DerivedWrapper {
    pub(super) wrapper: TaskWrapper,
    pub(super) mark: Option<MarkRow>,
    pub(super) status: WrapperStatus,
}

/// Loads one challenge's wrappers for a user and derives their statuses.
pub(super) fn derive_challenge(
    conn: &Connection,
    user: &UserId,
    challenge: &Challenge,
    active: Option<&TaskWrapperId>,
) -> Result<(bool, Vec<DerivedWrapper>), StoreError> {
    let gated = challenge_gated(conn, user, challenge)?;
    let (wrappers, marks): (Vec<_>, Vec<_>) =
        challenge_wrappers_with_marks(conn, user, &challenge.id)?
            .into_iter()
            .unzip();
    let facts = wrappers
        .iter()
        .zip(marks.iter())
        .map(|(wrapper, mark)| WrapperFacts {
            id: &wrapper.id,
            order: wrapper.order,
            mark: mark.as_ref().map(|row| row.mark),
        })
        .collect::<Vec<_>>();
    let statuses = derive_statuses(&facts, active, gated);
    let derived = wrappers
        .into_iter()
        .zip(marks)
        .zip(statuses)
        .map(|((wrapper, mark), status)| DerivedWrapper {
            wrapper,
            mark,
            status,
        })
        .collect();
    Ok((gated, derived))
}

/// Derived status of a single wrapper, computed over its whole challenge.
pub(super) fn derive_wrapper(
    conn: &Connection,
    user: &UserId,
    wrapper: &TaskWrapper,
    active: Option<&TaskWrapperId>,
) -> Result<DerivedWrapper, StoreError> {
    let challenge = require_challenge(conn, &wrapper.challenge_id)?;
    let (_, derived) = derive_challenge(conn, user, &challenge, active)?;
    derived
        .into_iter()
        .find(|entry| entry.wrapper.id == wrapper.id)
        .ok_or_else(|| StoreError::not_found("task_wrapper", wrapper.id.as_str()))
}
