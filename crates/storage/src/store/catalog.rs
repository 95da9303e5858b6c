#![forbid(unsafe_code)]

use super::load;
use super::{
    Catalog, ChallengeDefinition, MentorDefinition, PathDefinition, SqliteStore, StoreError,
    TaskDefinition, is_constraint_violation, now_ms,
};
use mp_core::progression::{validate_challenge_orders, validate_path_challenges};
use mp_core::{Mentor, Task};
use rusqlite::{Transaction, params};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CatalogSummary {
    pub tasks: usize,
    pub mentors: usize,
    pub challenges: usize,
    pub paths: usize,
}

impl SqliteStore {
    /// Installs authored content in one transaction. Entities that already
    /// exist must match exactly; nothing is ever updated in place.
    pub fn apply_catalog(&mut self, catalog: &Catalog) -> Result<CatalogSummary, StoreError> {
        let now_ms = now_ms();
        let tx = self.write_tx()?;
        for task in &catalog.tasks {
            ensure_task_tx(&tx, task, now_ms)?;
        }
        for mentor in &catalog.mentors {
            ensure_mentor_tx(&tx, mentor, now_ms)?;
        }
        for challenge in &catalog.challenges {
            ensure_challenge_tx(&tx, challenge, now_ms)?;
        }
        for path in &catalog.paths {
            ensure_path_tx(&tx, path, now_ms)?;
        }
        tx.commit()?;
        Ok(CatalogSummary {
            tasks: catalog.tasks.len(),
            mentors: catalog.mentors.len(),
            challenges: catalog.challenges.len(),
            paths: catalog.paths.len(),
        })
    }
}

fn ensure_task_tx(
    tx: &Transaction<'_>,
    task: &TaskDefinition,
    now_ms: i64,
) -> Result<(), StoreError> {
    let wanted = Task {
        id: task.id.clone(),
        name: task.name.clone(),
        description: task.description.clone(),
    };
    match load::task(tx, &task.id)? {
        Some(existing) if existing == wanted => Ok(()),
        Some(_) => Err(StoreError::InvalidInput(
            "task already exists with different content",
        )),
        None => {
            tx.execute(
                "INSERT INTO tasks(id, name, description, created_at_ms) VALUES (?1, ?2, ?3, ?4)",
                params![task.id.as_str(), &task.name, &task.description, now_ms],
            )?;
            Ok(())
        }
    }
}

fn ensure_mentor_tx(
    tx: &Transaction<'_>,
    mentor: &MentorDefinition,
    now_ms: i64,
) -> Result<(), StoreError> {
    let wanted = Mentor {
        id: mentor.id.clone(),
        name: mentor.name.clone(),
        description: mentor.description.clone(),
        icon: mentor.icon.clone(),
    };
    match load::mentor(tx, &mentor.id)? {
        Some(existing) if existing == wanted => Ok(()),
        Some(_) => Err(StoreError::InvalidInput(
            "mentor already exists with different content",
        )),
        None => {
            tx.execute(
                "INSERT INTO mentors(id, name, description, icon, created_at_ms) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    mentor.id.as_str(),
                    &mentor.name,
                    &mentor.description,
                    mentor.icon.as_deref(),
                    now_ms
                ],
            )?;
            Ok(())
        }
    }
}

fn ensure_challenge_tx(
    tx: &Transaction<'_>,
    challenge: &ChallengeDefinition,
    now_ms: i64,
) -> Result<(), StoreError> {
    let orders = challenge
        .wrappers
        .iter()
        .map(|wrapper| (&wrapper.id, wrapper.order))
        .collect::<Vec<_>>();
    validate_challenge_orders(&orders)?;

    if load::mentor(tx, &challenge.mentor_id)?.is_none() {
        return Err(StoreError::not_found("mentor", challenge.mentor_id.as_str()));
    }
    for wrapper in &challenge.wrappers {
        if load::task(tx, &wrapper.task_id)?.is_none() {
            return Err(StoreError::not_found("task", wrapper.task_id.as_str()));
        }
        if let Some(mentor_id) = wrapper.mentor_id.as_ref()
            && load::mentor(tx, mentor_id)?.is_none()
        {
            return Err(StoreError::not_found("mentor", mentor_id.as_str()));
        }
    }

    if let Some(existing) = load::challenge(tx, challenge.id.as_str())? {
        return if same_challenge(tx, &existing, challenge)? {
            Ok(())
        } else {
            Err(StoreError::InvalidInput(
                "challenge already exists with different content",
            ))
        };
    }

    tx.execute(
        "INSERT INTO challenges(id, name, description, mentor_id, path_id, path_position, created_at_ms) \
         VALUES (?1, ?2, ?3, ?4, NULL, NULL, ?5)",
        params![
            challenge.id.as_str(),
            &challenge.name,
            &challenge.description,
            challenge.mentor_id.as_str(),
            now_ms
        ],
    )?;
    for wrapper in &challenge.wrappers {
        let mentor_id = wrapper.mentor_id.as_ref().unwrap_or(&challenge.mentor_id);
        let insert = tx.execute(
            "INSERT INTO task_wrappers(id, task_id, challenge_id, ord, mentor_id, icon) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                wrapper.id.as_str(),
                wrapper.task_id.as_str(),
                challenge.id.as_str(),
                wrapper.order,
                mentor_id.as_str(),
                wrapper.icon.as_deref()
            ],
        );
        if let Err(err) = insert {
            if is_constraint_violation(&err) {
                return Err(StoreError::InvalidInput(
                    "task wrapper id already used by another challenge",
                ));
            }
            return Err(err.into());
        }
    }
    Ok(())
}

fn same_challenge(
    tx: &Transaction<'_>,
    existing: &mp_core::Challenge,
    wanted: &ChallengeDefinition,
) -> Result<bool, StoreError> {
    if existing.name != wanted.name
        || existing.description != wanted.description
        || existing.mentor_id != wanted.mentor_id
    {
        return Ok(false);
    }
    let stored = load::challenge_wrappers(tx, &existing.id)?;
    if stored.len() != wanted.wrappers.len() {
        return Ok(false);
    }
    let mut wanted_sorted = wanted.wrappers.iter().collect::<Vec<_>>();
    wanted_sorted.sort_by_key(|wrapper| wrapper.order);
    Ok(stored.iter().zip(wanted_sorted).all(|(stored, wanted_wrapper)| {
        stored.id == wanted_wrapper.id
            && stored.task_id == wanted_wrapper.task_id
            && stored.order == wanted_wrapper.order
            && &stored.mentor_id
                == wanted_wrapper
                    .mentor_id
                    .as_ref()
                    .unwrap_or(&wanted.mentor_id)
            && stored.icon == wanted_wrapper.icon
    }))
}

fn ensure_path_tx(
    tx: &Transaction<'_>,
    path: &PathDefinition,
    now_ms: i64,
) -> Result<(), StoreError> {
    validate_path_challenges(&path.challenges)?;

    if let Some(existing) = load::path(tx, path.id.as_str())? {
        let same = existing.name == path.name
            && existing.description == path.description
            && existing.gated == path.gated
            && existing.challenges == path.challenges;
        return if same {
            Ok(())
        } else {
            Err(StoreError::InvalidInput(
                "path already exists with different content",
            ))
        };
    }

    for challenge_id in &path.challenges {
        let challenge = load::require_challenge(tx, challenge_id)?;
        if challenge.path_id.is_some() {
            return Err(StoreError::InvalidInput(
                "challenge already belongs to another path",
            ));
        }
    }

    tx.execute(
        "INSERT INTO paths(id, name, description, gated, created_at_ms) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            path.id.as_str(),
            &path.name,
            &path.description,
            path.gated,
            now_ms
        ],
    )?;
    for (position, challenge_id) in path.challenges.iter().enumerate() {
        tx.execute(
            "UPDATE challenges SET path_id=?2, path_position=?3 WHERE id=?1",
            params![
                challenge_id.as_str(),
                path.id.as_str(),
                super::to_sqlite_i64(position)?
            ],
        )?;
    }
    Ok(())
}
