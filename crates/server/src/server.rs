#![forbid(unsafe_code)]

use crate::identity::IdentityProvider;
use crate::{
    INVALID_PARAMS, JsonRpcRequest, METHOD_NOT_FOUND, NOT_INITIALIZED, ProgressionServer,
    ai_error, ai_error_with, json_rpc_error, json_rpc_response, require_string,
};
use mp_core::UserId;
use mp_storage::SqliteStore;
use serde_json::{Map, Value, json};

impl ProgressionServer {
    pub(crate) fn new(store: SqliteStore, identity: Box<dyn IdentityProvider>) -> Self {
        Self {
            initialized: false,
            store,
            identity,
        }
    }

    pub(crate) fn store(&self) -> &SqliteStore {
        &self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut SqliteStore {
        &mut self.store
    }

    /// Handles one request. Returns `None` for notifications.
    pub(crate) fn handle(&mut self, request: JsonRpcRequest) -> Option<Value> {
        let JsonRpcRequest {
            method, id, params, ..
        } = request;
        let is_notification = id.is_none();
        let response = self.respond(&method, id, params);
        if is_notification { None } else { response }
    }

    fn respond(&mut self, method: &str, id: Option<Value>, params: Option<Value>) -> Option<Value> {
        if method == "initialize" {
            return Some(json_rpc_response(
                id,
                json!({
                    "protocolVersion": crate::PROTOCOL_VERSION,
                    "serverInfo": { "name": crate::SERVER_NAME, "version": crate::SERVER_VERSION },
                    "capabilities": {
                        "tools": {},
                        "methods": crate::handlers::METHOD_NAMES,
                    }
                }),
            ));
        }

        if method == "notifications/initialized" {
            self.initialized = true;
            return None;
        }

        if method == "ping" {
            return Some(json_rpc_response(id, json!({})));
        }

        if !self.initialized {
            return Some(json_rpc_error(id, NOT_INITIALIZED, "Server not initialized"));
        }

        if method == "tools/list" {
            return Some(json_rpc_response(
                id,
                json!({ "tools": crate::handlers::handler_definitions() }),
            ));
        }

        if method == "tools/call" {
            let Some(params_obj) = params.as_ref().and_then(|v| v.as_object()) else {
                return Some(json_rpc_error(id, INVALID_PARAMS, "params must be an object"));
            };
            let name = params_obj
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            let args = params_obj
                .get("arguments")
                .cloned()
                .unwrap_or_else(|| json!({}));
            let body = crate::handlers::dispatch_handler(self, &name, args).unwrap_or_else(|| {
                ai_error("UNKNOWN_METHOD", &format!("Unknown method: {name}"))
            });
            return Some(json_rpc_response(
                id,
                json!({
                    "content": [crate::tool_text_content(&body)],
                    "isError": !body.get("success").and_then(|v| v.as_bool()).unwrap_or(false)
                }),
            ));
        }

        let args = match params {
            None | Some(Value::Null) => json!({}),
            Some(value @ Value::Object(_)) => value,
            Some(_) => {
                return Some(json_rpc_error(id, INVALID_PARAMS, "params must be an object"));
            }
        };
        match crate::handlers::dispatch_handler(self, method, args) {
            Some(body) => Some(json_rpc_response(id, body)),
            None => Some(json_rpc_error(
                id,
                METHOD_NOT_FOUND,
                &format!("Method not found: {method}"),
            )),
        }
    }

    /// Resolves `session` to a user. A caller-supplied `user_id` is refused outright.
    pub(crate) fn authenticate(&self, args: &Map<String, Value>) -> Result<UserId, Value> {
        if args.contains_key("user_id") {
            return Err(ai_error(
                "INVALID_INPUT",
                "user_id is derived from the session and cannot be passed",
            ));
        }
        let token = require_string(args, "session").map_err(|_| unauthenticated())?;
        self.identity.resolve(&token).ok_or_else(unauthenticated)
    }
}

fn unauthenticated() -> Value {
    ai_error_with(
        "UNAUTHENTICATED",
        "unknown or missing session",
        Some("pass params.session with a token issued for this user"),
    )
}
