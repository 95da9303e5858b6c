#![forbid(unsafe_code)]

use super::ai::ai_error;
use mp_core::IdError;
use serde_json::{Map, Value};

pub(crate) fn require_string(args: &Map<String, Value>, key: &str) -> Result<String, Value> {
    let Some(v) = args.get(key).and_then(|v| v.as_str()) else {
        return Err(ai_error("INVALID_INPUT", &format!("{key} is required")));
    };
    Ok(v.to_string())
}

pub(crate) fn optional_string(
    args: &Map<String, Value>,
    key: &str,
) -> Result<Option<String>, Value> {
    let Some(value) = args.get(key) else {
        return Ok(None);
    };
    match value {
        Value::Null => Ok(None),
        Value::String(v) => Ok(Some(v.to_string())),
        _ => Err(ai_error(
            "INVALID_INPUT",
            &format!("{key} must be a string"),
        )),
    }
}

pub(crate) fn optional_i64(args: &Map<String, Value>, key: &str) -> Result<Option<i64>, Value> {
    let Some(value) = args.get(key) else {
        return Ok(None);
    };
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| ai_error("INVALID_INPUT", &format!("{key} must be an integer"))),
        _ => Err(ai_error(
            "INVALID_INPUT",
            &format!("{key} must be an integer"),
        )),
    }
}

pub(crate) fn optional_usize(
    args: &Map<String, Value>,
    key: &str,
) -> Result<Option<usize>, Value> {
    let Some(value) = args.get(key) else {
        return Ok(None);
    };
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .and_then(|v| usize::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| {
                ai_error(
                    "INVALID_INPUT",
                    &format!("{key} must be a positive integer"),
                )
            }),
        _ => Err(ai_error(
            "INVALID_INPUT",
            &format!("{key} must be a positive integer"),
        )),
    }
}

/// Reads a required id argument and validates it with the id type's constructor.
pub(crate) fn require_id<T>(
    args: &Map<String, Value>,
    key: &str,
    parse: fn(String) -> Result<T, IdError>,
) -> Result<T, Value> {
    let raw = require_string(args, key)?;
    parse_id_arg(key, raw, parse)
}

pub(crate) fn optional_id<T>(
    args: &Map<String, Value>,
    key: &str,
    parse: fn(String) -> Result<T, IdError>,
) -> Result<Option<T>, Value> {
    optional_string(args, key)?
        .map(|raw| parse_id_arg(key, raw, parse))
        .transpose()
}

fn parse_id_arg<T>(
    key: &str,
    raw: String,
    parse: fn(String) -> Result<T, IdError>,
) -> Result<T, Value> {
    parse(raw).map_err(|err| {
        ai_error(
            "INVALID_INPUT",
            &format!("{key}: {}", err.message()),
        )
    })
}
