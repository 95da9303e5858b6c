#![forbid(unsafe_code)]

use mp_storage::StoreError;
use serde_json::{Value, json};

pub(crate) fn ai_ok(intent: &str, result: Value) -> Value {
    json!({
        "success": true,
        "intent": intent,
        "result": result,
        "warnings": [],
        "error": null
    })
}

pub(crate) fn ai_error(code: &str, message: &str) -> Value {
    ai_error_with(code, message, None)
}

pub(crate) fn ai_error_with(code: &str, message: &str, recovery: Option<&str>) -> Value {
    let mut error_obj = serde_json::Map::new();
    error_obj.insert("code".to_string(), Value::String(code.to_string()));
    error_obj.insert(
        "message".to_string(),
        Value::String(message.trim().to_string()),
    );
    if let Some(recovery) = recovery {
        error_obj.insert(
            "recovery".to_string(),
            Value::String(recovery.trim().to_string()),
        );
    }

    json!({
        "success": false,
        "intent": "error",
        "result": {},
        "warnings": [],
        "error": Value::Object(error_obj)
    })
}

/// Stable wire code and recovery hint for each store failure.
pub(crate) fn store_error_code(err: &StoreError) -> (&'static str, Option<&'static str>) {
    match err {
        StoreError::NotFound { .. } => (
            "NOT_FOUND",
            Some("check the id against challenge.get or task_wrapper.list"),
        ),
        StoreError::AlreadyActive { .. } => (
            "ALREADY_ACTIVE",
            Some("complete or skip the active task first"),
        ),
        StoreError::NotAvailable { .. } => (
            "NOT_AVAILABLE",
            Some("complete the preceding task in the challenge first"),
        ),
        StoreError::NotActive { .. } => ("NOT_ACTIVE", Some("activate the task first")),
        StoreError::AlreadyCompleted => ("ALREADY_COMPLETED", None),
        StoreError::ConcurrentConflict { .. } => (
            "CONCURRENT_CONFLICT",
            Some("re-fetch state and retry once"),
        ),
        StoreError::InvalidInput(_) | StoreError::InvalidDefinition(_) => ("INVALID_INPUT", None),
        StoreError::Io(_) | StoreError::Sql(_) => (
            "STORE_ERROR",
            Some("retry; if it persists inspect mentorpath_last_session.txt in the storage dir"),
        ),
    }
}

pub(crate) fn store_error_response(err: StoreError) -> Value {
    let (code, recovery) = store_error_code(&err);
    ai_error_with(code, &err.to_string(), recovery)
}
