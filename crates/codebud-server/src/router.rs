//! Request dispatch for the local API, independent of the HTTP transport.

use crate::state::ApiState;
use codebud_core::constants::{api, editor::HIGHLIGHT_DURATION_MS};
use codebud_core::diagnostics;
use codebud_core::protocol::{
    HighlightRequest, HighlightResponse, InsertRequest, ModeRequest, ModeResponse,
    ReplaceRequest, StatusResponse,
};
use codebud_core::{get_context, CodebudError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tiny_http::Method;

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// `None` for bodiless replies such as CORS preflight.
    pub body: Option<Value>,
}

impl ApiResponse {
    fn ok<T: Serialize>(body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => Self {
                status: 200,
                body: Some(value),
            },
            Err(e) => Self::error(500, &e.to_string()),
        }
    }

    fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: Some(json!({ "error": message })),
        }
    }

    /// Rejections of mutating requests also carry `success: false`.
    fn rejected(err: &CodebudError) -> Self {
        Self {
            status: err.status_code(),
            body: Some(json!({ "success": false, "error": err.to_string() })),
        }
    }

    fn no_content() -> Self {
        Self {
            status: 204,
            body: None,
        }
    }
}

pub fn handle(state: &ApiState, method: &Method, path: &str, body: &str) -> ApiResponse {
    let path = path.split('?').next().unwrap_or(path);
    tracing::debug!(%method, path, "API request");

    match (method, path) {
        (Method::Options, _) => ApiResponse::no_content(),
        (Method::Get, api::CONTEXT) => context(state),
        (Method::Get, api::DIAGNOSTICS) => ApiResponse::ok(&state.diagnostics()),
        (Method::Get, api::STATUS) => ApiResponse::ok(&StatusResponse {
            active: true,
            mode: state.mode(),
        }),
        (Method::Post, api::INSERT) => insert(state, body),
        (Method::Post, api::REPLACE) => replace(state, body),
        (Method::Post, api::HIGHLIGHT) => highlight(state, body),
        (Method::Post, api::MODE) => set_mode(state, body),
        _ => ApiResponse::error(404, "Not found"),
    }
}

fn context(state: &ApiState) -> ApiResponse {
    let mode = state.mode();
    let mut host = state.host();
    let Some(mut context) = get_context(&mut host, mode) else {
        return ApiResponse::error(404, &CodebudError::NoActiveDocument.to_string());
    };
    let found = diagnostics::collect(&*host, host.active_uri(), None);
    context.diagnostics_summary = Some(diagnostics::summary(&found));
    ApiResponse::ok(&context)
}

fn insert(state: &ApiState, body: &str) -> ApiResponse {
    if let Err(e) = state.require_driver("Code insertion") {
        return ApiResponse::rejected(&e);
    }
    let request: InsertRequest = match parse(body, "Invalid params") {
        Ok(request) => request,
        Err(e) => return ApiResponse::rejected(&e),
    };
    match state.insert(request.line, &request.code) {
        Ok(result) => ApiResponse::ok(&result),
        Err(e) => ApiResponse::rejected(&e),
    }
}

fn replace(state: &ApiState, body: &str) -> ApiResponse {
    if let Err(e) = state.require_driver("Code replacement") {
        return ApiResponse::rejected(&e);
    }
    let request: ReplaceRequest = match parse(body, "Invalid params: startLine, endLine, code required") {
        Ok(request) => request,
        Err(e) => return ApiResponse::rejected(&e),
    };
    match state.replace(request.start_line, request.end_line, &request.code) {
        Ok(result) => ApiResponse::ok(&result),
        Err(e) => ApiResponse::rejected(&e),
    }
}

/// Answers success as soon as the request is well formed, whether or not
/// the line exists.
fn highlight(state: &ApiState, body: &str) -> ApiResponse {
    let request: HighlightRequest = match parse(body, "Invalid params: line required") {
        Ok(request) => request,
        Err(e) => return ApiResponse::rejected(&e),
    };
    let shown = state.highlight(request.line, HIGHLIGHT_DURATION_MS);
    if !shown {
        tracing::debug!(line = request.line, "Highlight request out of range");
    }
    ApiResponse::ok(&HighlightResponse { success: true })
}

fn set_mode(state: &ApiState, body: &str) -> ApiResponse {
    let invalid = r#"Invalid mode: must be "driver" or "navigator""#;
    let request: ModeRequest = match parse(body, invalid) {
        Ok(request) => request,
        Err(e) => return ApiResponse::rejected(&e),
    };
    let mut mode_state = state.mode_state();
    match mode_state.set_mode_str(&request.mode) {
        Ok(mode) => ApiResponse::ok(&ModeResponse {
            success: true,
            mode,
        }),
        Err(e) => ApiResponse::rejected(&e),
    }
}

fn parse<T: DeserializeOwned>(body: &str, message: &str) -> Result<T, CodebudError> {
    serde_json::from_str(body).map_err(|e| {
        tracing::debug!(error = %e, "Rejected request body");
        CodebudError::invalid_params(message)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use codebud_core::{EditorHost, ManualClock, ModeState, TextDocument};
    use std::sync::Arc;

    fn state_with(text: &str) -> ApiState {
        let clock = ManualClock::new(1_700_000_000_000);
        let mut host = EditorHost::new(Arc::new(clock));
        host.open_document(TextDocument::new("/work/app.py", text));
        ApiState::new(host, ModeState::default())
    }

    fn post(state: &ApiState, path: &str, body: Value) -> ApiResponse {
        handle(state, &Method::Post, path, &body.to_string())
    }

    fn get(state: &ApiState, path: &str) -> ApiResponse {
        handle(state, &Method::Get, path, "")
    }

    #[test]
    fn test_insert_is_gated_by_mode() {
        let state = state_with("a\nb\n");
        let forbidden = post(&state, api::INSERT, json!({"line": 1, "code": "x"}));
        assert_eq!(forbidden.status, 403);
        let body = forbidden.body.unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Code insertion only allowed in driver mode");

        let switched = post(&state, api::MODE, json!({"mode": "driver"}));
        assert_eq!(switched.status, 200);
        assert_eq!(switched.body.unwrap(), json!({"success": true, "mode": "driver"}));

        let inserted = post(&state, api::INSERT, json!({"line": 2, "code": "x"}));
        assert_eq!(inserted.status, 200);
        assert_eq!(inserted.body.unwrap(), json!({"success": true}));
        assert_eq!(state.host().active_document().unwrap().text(), "a\nx\nb\n");
    }

    #[test]
    fn test_mode_is_checked_before_params() {
        let state = state_with("a\n");
        let response = post(&state, api::REPLACE, json!({"code": 3}));
        assert_eq!(response.status, 403);
        assert_eq!(
            response.body.unwrap()["error"],
            "Code replacement only allowed in driver mode"
        );
    }

    #[test]
    fn test_bad_params_are_400() {
        let state = state_with("a\n");
        post(&state, api::MODE, json!({"mode": "driver"}));

        let response = post(&state, api::INSERT, json!({"line": "one", "code": "x"}));
        assert_eq!(response.status, 400);
        assert_eq!(
            response.body.unwrap(),
            json!({"success": false, "error": "Invalid params"})
        );

        let response = handle(&state, &Method::Post, api::REPLACE, "not json");
        assert_eq!(response.status, 400);

        let response = post(&state, api::HIGHLIGHT, json!({}));
        assert_eq!(response.status, 400);
        assert_eq!(
            response.body.unwrap()["error"],
            "Invalid params: line required"
        );
    }

    #[test]
    fn test_invalid_mode_leaves_mode_unchanged() {
        let state = state_with("a\n");
        let response = post(&state, api::MODE, json!({"mode": "pilot"}));
        assert_eq!(response.status, 400);
        assert_eq!(
            response.body.unwrap()["error"],
            r#"Invalid mode: must be "driver" or "navigator""#
        );
        let status = get(&state, api::STATUS).body.unwrap();
        assert_eq!(status, json!({"active": true, "mode": "navigator"}));
    }

    #[test]
    fn test_failed_edit_is_200_with_error() {
        let state = state_with("a\nb\n");
        post(&state, api::MODE, json!({"mode": "driver"}));
        let response = post(&state, api::REPLACE, json!({"startLine": 3, "endLine": 1, "code": "x"}));
        assert_eq!(response.status, 200);
        let body = response.body.unwrap();
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid range"));
    }

    #[test]
    fn test_context_includes_diagnostics_summary() {
        let state = state_with("def f():\n    pass\n");
        let response = get(&state, api::CONTEXT);
        assert_eq!(response.status, 200);
        let body = response.body.unwrap();
        assert_eq!(body["fileName"], "app.py");
        assert_eq!(body["totalLines"], 3);
        assert_eq!(body["diagnosticsSummary"], "No problems found.");
    }

    #[test]
    fn test_context_without_document_is_404() {
        let state = ApiState::default();
        let response = get(&state, api::CONTEXT);
        assert_eq!(response.status, 404);
        assert_eq!(response.body.unwrap(), json!({"error": "No active editor"}));

        let diagnostics = get(&state, api::DIAGNOSTICS);
        assert_eq!(diagnostics.body.unwrap(), json!({"errors": []}));
    }

    #[test]
    fn test_highlight_out_of_range_still_succeeds() {
        let state = state_with("a\n");
        let response = post(&state, api::HIGHLIGHT, json!({"line": 50}));
        assert_eq!(response.body.unwrap(), json!({"success": true}));
        assert!(state.host().active_highlight().is_none());
    }

    #[test]
    fn test_preflight_and_unknown_routes() {
        let state = state_with("a\n");
        assert_eq!(handle(&state, &Method::Options, api::INSERT, ""), ApiResponse::no_content());
        let missing = get(&state, "/api/nope");
        assert_eq!(missing.status, 404);
        assert_eq!(missing.body.unwrap(), json!({"error": "Not found"}));
        assert_eq!(get(&state, "/api/status?x=1").status, 200);
    }
}
