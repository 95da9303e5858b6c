#![forbid(unsafe_code)]

use super::wire::{challenge_json, event_json, path_json, wrapper_json};
use crate::{
    ProgressionServer, ai_error, ai_ok, optional_i64, optional_id, optional_string,
    optional_usize, require_id, store_error_response,
};
use mp_core::{TaskWrapperId, UserId, WrapperFilter};
use mp_storage::{ActivateRequest, CompleteRequest, HistoryRequest, SkipRequest};
use serde_json::{Map, Value, json};

const DEFAULT_HISTORY_LIMIT: usize = 50;
const MAX_HISTORY_LIMIT: usize = 500;

type Args = Map<String, Value>;

pub(super) fn get(server: &mut ProgressionServer, user: &UserId, args: &Args) -> Result<Value, Value> {
    let wrapper_id = require_id(args, "wrapper_id", TaskWrapperId::try_new)?;
    let view = server
        .store()
        .get_task_wrapper(user, &wrapper_id)
        .map_err(store_error_response)?;
    Ok(ai_ok("task_wrapper.get", json!({ "wrapper": wrapper_json(&view) })))
}

pub(super) fn list(server: &mut ProgressionServer, user: &UserId, args: &Args) -> Result<Value, Value> {
    let filter = match optional_string(args, "filter")? {
        None => WrapperFilter::All,
        Some(raw) => WrapperFilter::from_str(raw.trim()).ok_or_else(|| {
            ai_error(
                "INVALID_INPUT",
                "filter must be one of: active|completed|all",
            )
        })?,
    };
    let views = server
        .store()
        .list_task_wrappers(user, filter)
        .map_err(store_error_response)?;
    Ok(ai_ok(
        "task_wrapper.list",
        json!({
            "filter": filter.as_str(),
            "count": views.len(),
            "wrappers": views.iter().map(wrapper_json).collect::<Vec<_>>(),
        }),
    ))
}

pub(super) fn activate(
    server: &mut ProgressionServer,
    user: &UserId,
    args: &Args,
) -> Result<Value, Value> {
    let wrapper_id = require_id(args, "wrapper_id", TaskWrapperId::try_new)?;
    let expected_revision = optional_i64(args, "expected_revision")?;
    let outcome = server
        .store_mut()
        .activate(ActivateRequest {
            user_id: user.clone(),
            wrapper_id,
            expected_revision,
        })
        .map_err(store_error_response)?;
    Ok(ai_ok(
        "task_wrapper.activate",
        json!({
            "wrapper": wrapper_json(&outcome.wrapper),
            "revision": outcome.revision,
        }),
    ))
}

pub(super) fn complete(
    server: &mut ProgressionServer,
    user: &UserId,
    args: &Args,
) -> Result<Value, Value> {
    let wrapper_id = require_id(args, "wrapper_id", TaskWrapperId::try_new)?;
    let submission = optional_string(args, "submission")?;
    let expected_revision = optional_i64(args, "expected_revision")?;
    let outcome = server
        .store_mut()
        .complete(CompleteRequest {
            user_id: user.clone(),
            wrapper_id,
            submission,
            expected_revision,
        })
        .map_err(store_error_response)?;
    Ok(ai_ok(
        "task_wrapper.complete",
        json!({
            "wrapper": wrapper_json(&outcome.wrapper),
            "challenge": challenge_json(&outcome.challenge),
            "path": outcome.path.as_ref().map(path_json),
            "challenge_completed": outcome.challenge_completed,
            "revision": outcome.revision,
        }),
    ))
}

pub(super) fn skip(server: &mut ProgressionServer, user: &UserId, args: &Args) -> Result<Value, Value> {
    let wrapper_id = require_id(args, "wrapper_id", TaskWrapperId::try_new)?;
    let reason = optional_string(args, "reason")?;
    let expected_revision = optional_i64(args, "expected_revision")?;
    let outcome = server
        .store_mut()
        .skip(SkipRequest {
            user_id: user.clone(),
            wrapper_id,
            reason,
            expected_revision,
        })
        .map_err(store_error_response)?;
    Ok(ai_ok(
        "task_wrapper.skip",
        json!({
            "wrapper": wrapper_json(&outcome.wrapper),
            "revision": outcome.revision,
        }),
    ))
}

pub(super) fn history(
    server: &mut ProgressionServer,
    user: &UserId,
    args: &Args,
) -> Result<Value, Value> {
    let wrapper_id = optional_id(args, "wrapper_id", TaskWrapperId::try_new)?;
    let after_seq = optional_i64(args, "after_seq")?;
    let limit = optional_usize(args, "limit")?
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    let events = server
        .store()
        .transition_history(HistoryRequest {
            user_id: user.clone(),
            wrapper_id,
            after_seq,
            limit,
        })
        .map_err(store_error_response)?;
    // A full page may have more behind it.
    let next_after_seq = if events.len() == limit {
        events.last().map(|event| event.seq)
    } else {
        None
    };
    Ok(ai_ok(
        "task_wrapper.history",
        json!({
            "limit": limit,
            "events": events.iter().map(event_json).collect::<Vec<_>>(),
            "next_after_seq": next_after_seq,
        }),
    ))
}
