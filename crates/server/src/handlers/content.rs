#![forbid(unsafe_code)]

use super::wire::{challenge_json, path_json};
use crate::{ProgressionServer, ai_ok, require_id, store_error_response};
use mp_core::{ChallengeId, PathId, UserId};
use serde_json::{Map, Value, json};

pub(super) fn challenge_get(
    server: &mut ProgressionServer,
    user: &UserId,
    args: &Map<String, Value>,
) -> Result<Value, Value> {
    let challenge_id = require_id(args, "challenge_id", ChallengeId::try_new)?;
    let view = server
        .store()
        .get_challenge(user, &challenge_id)
        .map_err(store_error_response)?;
    Ok(ai_ok("challenge.get", json!({ "challenge": challenge_json(&view) })))
}

pub(super) fn path_get(
    server: &mut ProgressionServer,
    user: &UserId,
    args: &Map<String, Value>,
) -> Result<Value, Value> {
    let path_id = require_id(args, "path_id", PathId::try_new)?;
    let view = server
        .store()
        .get_path(user, &path_id)
        .map_err(store_error_response)?;
    Ok(ai_ok("path.get", json!({ "path": path_json(&view) })))
}
