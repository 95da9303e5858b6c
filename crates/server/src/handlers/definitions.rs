#![forbid(unsafe_code)]

use serde_json::{Map, Value, json};

fn method(name: &str, description: &str, properties: Value, required: &[&str]) -> Value {
    let mut props = Map::new();
    props.insert(
        "session".to_string(),
        json!({ "type": "string", "description": "Session token; resolves the calling user." }),
    );
    if let Some(extra) = properties.as_object() {
        for (key, value) in extra {
            props.insert(key.clone(), value.clone());
        }
    }
    let mut required_all = vec!["session"];
    required_all.extend_from_slice(required);
    json!({
        "name": name,
        "description": description,
        "inputSchema": {
            "type": "object",
            "properties": Value::Object(props),
            "required": required_all,
        }
    })
}

fn expected_revision() -> Value {
    json!({ "type": "integer", "description": "Fail with CONCURRENT_CONFLICT unless the user's revision matches." })
}

pub(crate) fn handler_definitions() -> Vec<Value> {
    let mut handlers = vec![
        method(
            "task_wrapper.get",
            "One task wrapper with its derived status, task and mentor.",
            json!({ "wrapper_id": { "type": "string" } }),
            &["wrapper_id"],
        ),
        method(
            "task_wrapper.list",
            "Task wrappers ordered by challenge id, then order.",
            json!({ "filter": { "type": "string", "enum": ["active", "completed", "all"] } }),
            &[],
        ),
        method(
            "task_wrapper.activate",
            "Make an available wrapper the user's single active task.",
            json!({
                "wrapper_id": { "type": "string" },
                "expected_revision": expected_revision()
            }),
            &["wrapper_id"],
        ),
        method(
            "task_wrapper.complete",
            "Complete the active wrapper; cascades into challenge and path progress.",
            json!({
                "wrapper_id": { "type": "string" },
                "submission": { "type": "string" },
                "expected_revision": expected_revision()
            }),
            &["wrapper_id"],
        ),
        method(
            "task_wrapper.skip",
            "Release the active wrapper without completing it.",
            json!({
                "wrapper_id": { "type": "string" },
                "reason": { "type": "string" },
                "expected_revision": expected_revision()
            }),
            &["wrapper_id"],
        ),
        method(
            "task_wrapper.history",
            "Transition events for the user, oldest first. Page with after_seq.",
            json!({
                "wrapper_id": { "type": "string" },
                "after_seq": { "type": "integer", "minimum": 0 },
                "limit": { "type": "integer", "minimum": 1, "maximum": 500 }
            }),
            &[],
        ),
        method(
            "challenge.get",
            "A challenge with its wrappers and progress.",
            json!({ "challenge_id": { "type": "string" } }),
            &["challenge_id"],
        ),
        method(
            "path.get",
            "A path with its challenges and progress.",
            json!({ "path_id": { "type": "string" } }),
            &["path_id"],
        ),
        method(
            "progression.state",
            "Active wrapper, revision and stored path progress.",
            json!({}),
            &[],
        ),
        method(
            "progression.recompute",
            "Recompute stored aggregates for one challenge or path.",
            json!({
                "challenge_id": { "type": "string" },
                "path_id": { "type": "string" }
            }),
            &[],
        ),
        method(
            "mission.request",
            "Available wrappers to start next; refused while a task is active.",
            json!({ "mentor_id": { "type": "string" } }),
            &[],
        ),
    ];
    handlers.sort_by_key(|tool| {
        tool.get("name")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string()
    });
    handlers
}
