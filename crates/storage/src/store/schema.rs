#![forbid(unsafe_code)]

use super::StoreError;
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::BTreeSet;

pub(super) const SCHEMA_VERSION: i64 = 1;

const TABLES: &[&str] = &[
    "schema_state",
    "tasks",
    "mentors",
    "paths",
    "challenges",
    "task_wrappers",
    "user_progress",
    "wrapper_marks",
    "challenge_progress",
    "path_progress",
    "transitions",
];

const SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS schema_state (
      singleton INTEGER PRIMARY KEY CHECK(singleton = 1),
      schema_version INTEGER NOT NULL,
      created_at_ms INTEGER NOT NULL,
      updated_at_ms INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS tasks (
      id TEXT PRIMARY KEY,
      name TEXT NOT NULL,
      description TEXT NOT NULL,
      created_at_ms INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS mentors (
      id TEXT PRIMARY KEY,
      name TEXT NOT NULL,
      description TEXT NOT NULL,
      icon TEXT,
      created_at_ms INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS paths (
      id TEXT PRIMARY KEY,
      name TEXT NOT NULL,
      description TEXT NOT NULL,
      gated INTEGER NOT NULL DEFAULT 0,
      created_at_ms INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS challenges (
      id TEXT PRIMARY KEY,
      name TEXT NOT NULL,
      description TEXT NOT NULL,
      mentor_id TEXT NOT NULL REFERENCES mentors(id),
      path_id TEXT REFERENCES paths(id),
      path_position INTEGER,
      created_at_ms INTEGER NOT NULL,
      UNIQUE(path_id, path_position)
    );

    CREATE TABLE IF NOT EXISTS task_wrappers (
      id TEXT PRIMARY KEY,
      task_id TEXT NOT NULL REFERENCES tasks(id),
      challenge_id TEXT NOT NULL REFERENCES challenges(id),
      ord INTEGER NOT NULL CHECK(ord > 0),
      mentor_id TEXT NOT NULL REFERENCES mentors(id),
      icon TEXT,
      UNIQUE(challenge_id, ord)
    );

    CREATE TABLE IF NOT EXISTS user_progress (
      user_id TEXT PRIMARY KEY,
      active_wrapper_id TEXT REFERENCES task_wrappers(id),
      revision INTEGER NOT NULL,
      updated_at_ms INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS wrapper_marks (
      user_id TEXT NOT NULL,
      wrapper_id TEXT NOT NULL REFERENCES task_wrappers(id),
      mark TEXT NOT NULL CHECK(mark IN ('completed', 'skipped')),
      submission TEXT,
      skip_reason TEXT,
      skip_count INTEGER NOT NULL DEFAULT 0,
      updated_at_ms INTEGER NOT NULL,
      PRIMARY KEY(user_id, wrapper_id)
    );

    CREATE TABLE IF NOT EXISTS challenge_progress (
      user_id TEXT NOT NULL,
      challenge_id TEXT NOT NULL REFERENCES challenges(id),
      completed_tasks INTEGER NOT NULL,
      total_tasks INTEGER NOT NULL,
      is_completed INTEGER NOT NULL,
      is_active INTEGER NOT NULL,
      updated_at_ms INTEGER NOT NULL,
      PRIMARY KEY(user_id, challenge_id)
    );

    CREATE TABLE IF NOT EXISTS path_progress (
      user_id TEXT NOT NULL,
      path_id TEXT NOT NULL REFERENCES paths(id),
      completed_challenges INTEGER NOT NULL,
      total_challenges INTEGER NOT NULL,
      updated_at_ms INTEGER NOT NULL,
      PRIMARY KEY(user_id, path_id)
    );

    CREATE TABLE IF NOT EXISTS transitions (
      seq INTEGER PRIMARY KEY AUTOINCREMENT,
      user_id TEXT NOT NULL,
      wrapper_id TEXT NOT NULL,
      kind TEXT NOT NULL,
      detail TEXT,
      revision INTEGER NOT NULL,
      ts_ms INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_task_wrappers_challenge
      ON task_wrappers(challenge_id, ord);
    CREATE INDEX IF NOT EXISTS idx_challenges_path
      ON challenges(path_id, path_position);
    CREATE INDEX IF NOT EXISTS idx_transitions_user
      ON transitions(user_id, wrapper_id, seq);
"#;

/// Refuses to open a database written by something else or by another schema version.
pub(super) fn preflight_gate(conn: &Connection) -> Result<(), StoreError> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
    )?;
    let mut rows = stmt.query([])?;
    let mut tables = BTreeSet::new();
    while let Some(row) = rows.next()? {
        tables.insert(row.get::<_, String>(0)?);
    }

    if tables.is_empty() {
        return Ok(());
    }

    if tables.iter().any(|table| !TABLES.contains(&table.as_str())) {
        return Err(StoreError::InvalidInput(
            "RESET_REQUIRED: unsupported tables detected",
        ));
    }

    let version = conn
        .query_row(
            "SELECT schema_version FROM schema_state WHERE singleton=1",
            [],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;

    match version {
        Some(v) if v == SCHEMA_VERSION => Ok(()),
        Some(_) => Err(StoreError::InvalidInput(
            "RESET_REQUIRED: schema version mismatch",
        )),
        None => Err(StoreError::InvalidInput(
            "RESET_REQUIRED: schema state row is missing",
        )),
    }
}

pub(super) fn install_schema(conn: &Connection, now_ms: i64) -> Result<(), StoreError> {
    conn.execute_batch(SQL)?;
    conn.execute(
        "INSERT INTO schema_state(singleton, schema_version, created_at_ms, updated_at_ms) \
         VALUES (1, ?1, ?2, ?2) \
         ON CONFLICT(singleton) DO UPDATE SET schema_version=excluded.schema_version, updated_at_ms=excluded.updated_at_ms",
        params![SCHEMA_VERSION, now_ms],
    )?;
    Ok(())
}
