#![forbid(unsafe_code)]

use super::wire::{challenge_progress_json, path_progress_json, stored_path_json, wrapper_json};
use crate::{ProgressionServer, ai_error, ai_ok, optional_id, store_error_response};
use mp_core::{ChallengeId, MentorId, PathId, UserId};
use mp_storage::{AggregateSnapshot, AggregateTarget};
use serde_json::{Map, Value, json};

pub(super) fn state(server: &mut ProgressionServer, user: &UserId) -> Result<Value, Value> {
    let state = server
        .store()
        .progression_state(user)
        .map_err(store_error_response)?;
    Ok(ai_ok(
        "progression.state",
        json!({
            "user_id": state.user_id.as_str(),
            "active_wrapper_id": state.active_wrapper_id.as_ref().map(|id| id.as_str()),
            "revision": state.revision,
            "paths": state.paths.iter().map(stored_path_json).collect::<Vec<_>>(),
        }),
    ))
}

pub(super) fn recompute(
    server: &mut ProgressionServer,
    user: &UserId,
    args: &Map<String, Value>,
) -> Result<Value, Value> {
    let challenge_id = optional_id(args, "challenge_id", ChallengeId::try_new)?;
    let path_id = optional_id(args, "path_id", PathId::try_new)?;
    let target = match (challenge_id, path_id) {
        (Some(challenge_id), None) => AggregateTarget::Challenge(challenge_id),
        (None, Some(path_id)) => AggregateTarget::Path(path_id),
        _ => {
            return Err(ai_error(
                "INVALID_INPUT",
                "exactly one of challenge_id or path_id is required",
            ));
        }
    };
    let snapshot = server
        .store_mut()
        .recompute_aggregates(user, &target)
        .map_err(store_error_response)?;
    let result = match (&target, &snapshot) {
        (AggregateTarget::Challenge(id), AggregateSnapshot::Challenge(progress)) => json!({
            "challenge_id": id.as_str(),
            "challenge": challenge_progress_json(progress),
        }),
        (
            AggregateTarget::Path(id),
            AggregateSnapshot::Path {
                progress,
                challenges,
            },
        ) => json!({
            "path_id": id.as_str(),
            "path": path_progress_json(progress),
            "challenges": challenges.iter().map(challenge_progress_json).collect::<Vec<_>>(),
        }),
        _ => return Err(ai_error("STORE_ERROR", "aggregate snapshot does not match its target")),
    };
    Ok(ai_ok("progression.recompute", result))
}

pub(super) fn mission_request(
    server: &mut ProgressionServer,
    user: &UserId,
    args: &Map<String, Value>,
) -> Result<Value, Value> {
    let mentor_id = optional_id(args, "mentor_id", MentorId::try_new)?;
    let missions = server
        .store()
        .mission_request(user, mentor_id.as_ref())
        .map_err(store_error_response)?;
    Ok(ai_ok(
        "mission.request",
        json!({
            "mentor_id": mentor_id.as_ref().map(|id| id.as_str()),
            "missions": missions.iter().map(wrapper_json).collect::<Vec<_>>(),
        }),
    ))
}
