#![forbid(unsafe_code)]
#![allow(dead_code)]

use mp_core::{ChallengeId, MentorId, PathId, TaskId, TaskWrapperId, UserId};
use mp_storage::{
    Catalog, ChallengeDefinition, MentorDefinition, PathDefinition, SqliteStore, TaskDefinition,
    WrapperDefinition,
};
use std::path::PathBuf;

pub fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("mp_storage_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

pub fn user(raw: &str) -> UserId {
    UserId::try_new(raw).expect("user id")
}

pub fn wid(raw: &str) -> TaskWrapperId {
    TaskWrapperId::try_new(raw).expect("wrapper id")
}

pub fn cid(raw: &str) -> ChallengeId {
    ChallengeId::try_new(raw).expect("challenge id")
}

pub fn pid(raw: &str) -> PathId {
    PathId::try_new(raw).expect("path id")
}

pub fn mid(raw: &str) -> MentorId {
    MentorId::try_new(raw).expect("mentor id")
}

pub fn task(id: &str) -> TaskDefinition {
    TaskDefinition {
        id: TaskId::try_new(id).expect("task id"),
        name: format!("Task {id}"),
        description: format!("Do {id}."),
    }
}

pub fn mentor(id: &str) -> MentorDefinition {
    MentorDefinition {
        id: mid(id),
        name: format!("Mentor {id}"),
        description: "Guides the user.".to_string(),
        icon: None,
    }
}

pub fn wrapper(id: &str, task_id: &str, order: u32) -> WrapperDefinition {
    WrapperDefinition {
        id: wid(id),
        task_id: TaskId::try_new(task_id).expect("task id"),
        order,
        mentor_id: None,
        icon: None,
    }
}

pub fn challenge(id: &str, mentor_id: &str, wrappers: Vec<WrapperDefinition>) -> ChallengeDefinition {
    ChallengeDefinition {
        id: cid(id),
        name: format!("Challenge {id}"),
        description: String::new(),
        mentor_id: mid(mentor_id),
        wrappers,
    }
}

pub fn path(id: &str, gated: bool, challenges: &[&str]) -> PathDefinition {
    PathDefinition {
        id: pid(id),
        name: format!("Path {id}"),
        description: String::new(),
        gated,
        challenges: challenges.iter().map(|raw| cid(raw)).collect(),
    }
}

/// Two mentors and five challenges:
/// - `c:x` = w1, w2, w3 (orders 1..3) and `c:y` = b1, b2 on the open path `p:main`;
/// - `c:z` = z1 outside any path;
/// - `c:g1` = g1a and `c:g2` = g2a on the gated path `p:gated`;
/// - `p:empty` has no challenges.
pub fn fixture_catalog() -> Catalog {
    Catalog {
        tasks: ["t:read", "t:write", "t:review", "t:reflect", "t:share", "t:rest"]
            .iter()
            .map(|id| task(id))
            .collect(),
        mentors: vec![mentor("m:sage"), mentor("m:coach")],
        challenges: vec![
            challenge(
                "c:x",
                "m:sage",
                vec![
                    // Declared out of order on purpose; `order` decides.
                    wrapper("w3", "t:review", 3),
                    wrapper("w1", "t:read", 1),
                    wrapper("w2", "t:write", 2),
                ],
            ),
            challenge(
                "c:y",
                "m:coach",
                vec![wrapper("b1", "t:reflect", 1), wrapper("b2", "t:share", 2)],
            ),
            challenge("c:z", "m:coach", vec![wrapper("z1", "t:rest", 10)]),
            challenge("c:g1", "m:sage", vec![wrapper("g1a", "t:read", 1)]),
            challenge("c:g2", "m:sage", vec![wrapper("g2a", "t:write", 1)]),
        ],
        paths: vec![
            path("p:main", false, &["c:x", "c:y"]),
            path("p:gated", true, &["c:g1", "c:g2"]),
            path("p:empty", false, &[]),
        ],
    }
}

pub fn seeded_store(test_name: &str) -> (PathBuf, SqliteStore) {
    let storage_dir = temp_dir(test_name);
    let mut store = SqliteStore::open(&storage_dir).expect("open store");
    store
        .apply_catalog(&fixture_catalog())
        .expect("apply catalog");
    (storage_dir, store)
}
