#![forbid(unsafe_code)]

use crate::ts_ms_to_rfc3339;
use mp_core::progression::{ChallengeProgress, PathProgress};
use mp_core::{Mentor, Task};
use mp_storage::{ChallengeView, PathView, StoredPathProgress, TransitionEvent, WrapperView};
use serde_json::{Value, json};

pub(super) fn task_json(task: &Task) -> Value {
    json!({
        "id": task.id.as_str(),
        "name": task.name,
        "description": task.description,
    })
}

pub(super) fn mentor_json(mentor: &Mentor) -> Value {
    json!({
        "id": mentor.id.as_str(),
        "name": mentor.name,
        "description": mentor.description,
        "icon": mentor.icon,
    })
}

pub(super) fn wrapper_json(view: &WrapperView) -> Value {
    json!({
        "id": view.wrapper.id.as_str(),
        "task_id": view.wrapper.task_id.as_str(),
        "challenge_id": view.wrapper.challenge_id.as_str(),
        "order": view.wrapper.order,
        "mentor_id": view.wrapper.mentor_id.as_str(),
        "icon": view.wrapper.icon,
        "status": view.status.as_str(),
        "skipped": view.skipped(),
        "skip_count": view.skip_count,
        "skip_reason": view.skip_reason,
        "submission": view.submission,
        "updated_at": view.updated_at_ms.map(ts_ms_to_rfc3339),
        "task": task_json(&view.task),
        "mentor": mentor_json(&view.mentor),
    })
}

pub(super) fn challenge_progress_json(progress: &ChallengeProgress) -> Value {
    json!({
        "completed_tasks": progress.completed_tasks,
        "total_tasks": progress.total_tasks,
        "is_completed": progress.is_completed,
        "is_active": progress.is_active,
    })
}

pub(super) fn path_progress_json(progress: &PathProgress) -> Value {
    json!({
        "completed_challenges": progress.completed_challenges,
        "total_challenges": progress.total_challenges,
        "is_completed": progress.is_completed(),
        "progress": progress.percent(),
        "progress_exact": progress.ratio_percent(),
    })
}

pub(super) fn challenge_json(view: &ChallengeView) -> Value {
    json!({
        "id": view.challenge.id.as_str(),
        "name": view.challenge.name,
        "description": view.challenge.description,
        "mentor": mentor_json(&view.mentor),
        "path_id": view.challenge.path_id.as_ref().map(|id| id.as_str()),
        "gated": view.gated,
        "ordered_tasks": view
            .challenge
            .ordered_tasks
            .iter()
            .map(|id| id.as_str())
            .collect::<Vec<_>>(),
        "progress": challenge_progress_json(&view.progress),
        "wrappers": view.wrappers.iter().map(wrapper_json).collect::<Vec<_>>(),
    })
}

pub(super) fn path_json(view: &PathView) -> Value {
    json!({
        "id": view.path.id.as_str(),
        "name": view.path.name,
        "description": view.path.description,
        "gated": view.path.gated,
        "progress": path_progress_json(&view.progress),
        "challenges": view.challenges.iter().map(challenge_json).collect::<Vec<_>>(),
    })
}

pub(super) fn stored_path_json(entry: &StoredPathProgress) -> Value {
    let mut value = path_progress_json(&entry.progress);
    if let Some(obj) = value.as_object_mut() {
        obj.insert("path_id".to_string(), json!(entry.path_id.as_str()));
        obj.insert(
            "updated_at".to_string(),
            json!(ts_ms_to_rfc3339(entry.updated_at_ms)),
        );
    }
    value
}

pub(super) fn event_json(event: &TransitionEvent) -> Value {
    json!({
        "seq": event.seq,
        "ts": ts_ms_to_rfc3339(event.ts_ms),
        "ts_ms": event.ts_ms,
        "wrapper_id": event.wrapper_id.as_str(),
        "kind": event.kind.as_str(),
        "detail": event.detail,
        "revision": event.revision,
    })
}
