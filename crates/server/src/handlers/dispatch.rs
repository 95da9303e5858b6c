#![forbid(unsafe_code)]

use crate::{ProgressionServer, ai_error};
use serde_json::{Map, Value};

use super::{content, progression, wrappers};

pub(crate) const METHOD_NAMES: &[&str] = &[
    "task_wrapper.get",
    "task_wrapper.list",
    "task_wrapper.activate",
    "task_wrapper.complete",
    "task_wrapper.skip",
    "task_wrapper.history",
    "challenge.get",
    "path.get",
    "progression.state",
    "progression.recompute",
    "mission.request",
];

/// Runs one progression method. `None` means the name is not a progression method.
pub(crate) fn dispatch_handler(
    server: &mut ProgressionServer,
    name: &str,
    args: Value,
) -> Option<Value> {
    if !METHOD_NAMES.contains(&name) {
        return None;
    }
    let args = match args {
        Value::Object(obj) => obj,
        Value::Null => Map::new(),
        _ => return Some(ai_error("INVALID_INPUT", "params must be an object")),
    };
    let user = match server.authenticate(&args) {
        Ok(user) => user,
        Err(resp) => return Some(resp),
    };

    let result = match name {
        "task_wrapper.get" => wrappers::get(server, &user, &args),
        "task_wrapper.list" => wrappers::list(server, &user, &args),
        "task_wrapper.activate" => wrappers::activate(server, &user, &args),
        "task_wrapper.complete" => wrappers::complete(server, &user, &args),
        "task_wrapper.skip" => wrappers::skip(server, &user, &args),
        "task_wrapper.history" => wrappers::history(server, &user, &args),
        "challenge.get" => content::challenge_get(server, &user, &args),
        "path.get" => content::path_get(server, &user, &args),
        "progression.state" => progression::state(server, &user),
        "progression.recompute" => progression::recompute(server, &user, &args),
        "mission.request" => progression::mission_request(server, &user, &args),
        _ => return None,
    };
    Some(result.unwrap_or_else(|resp| resp))
}
