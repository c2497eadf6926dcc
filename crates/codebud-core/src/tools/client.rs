//! Tools the conversational session may call. Each one forwards to the local
//! API and reports failures inside its JSON answer.

use super::traits::{Tool, ToolResult};
use crate::error::CodebudError;
use crate::mode::Mode;
use crate::monitor::CodeBudApi;
use serde_json::{json, Value};
use std::sync::Arc;

fn required_i64(params: &Value, key: &str) -> Result<i64, CodebudError> {
    params
        .get(key)
        .and_then(Value::as_i64)
        .ok_or_else(|| CodebudError::invalid_params(format!("Invalid params: missing or invalid '{key}'")))
}

fn required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str, CodebudError> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| CodebudError::invalid_params(format!("Invalid params: missing or invalid '{key}'")))
}

fn edit_failure(action: &str, e: CodebudError) -> Value {
    json!({ "success": false, "error": format!("Failed to {action}: {e}") })
}

pub struct GetCodeContextTool {
    api: Arc<dyn CodeBudApi>,
}

impl GetCodeContextTool {
    pub fn new(api: Arc<dyn CodeBudApi>) -> Self {
        Self { api }
    }
}

#[async_trait::async_trait]
impl Tool for GetCodeContextTool {
    fn name(&self) -> &str {
        "get_code_context"
    }

    fn description(&self) -> &str {
        "Get the code the user is working on: file, language, content, the lines around the cursor, recent changes and typing state."
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _params: Value) -> ToolResult {
        Ok(match self.api.context().await {
            Ok(context) => serde_json::to_value(context)?,
            Err(e) => json!({ "error": format!("Failed to get code context: {e}") }),
        })
    }
}

pub struct GetDiagnosticsTool {
    api: Arc<dyn CodeBudApi>,
}

impl GetDiagnosticsTool {
    pub fn new(api: Arc<dyn CodeBudApi>) -> Self {
        Self { api }
    }
}

#[async_trait::async_trait]
impl Tool for GetDiagnosticsTool {
    fn name(&self) -> &str {
        "get_diagnostics"
    }

    fn description(&self) -> &str {
        "Get the errors and warnings reported for the current file. Lines are 1-indexed."
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _params: Value) -> ToolResult {
        Ok(match self.api.diagnostics().await {
            Ok(diagnostics) => serde_json::to_value(diagnostics)?,
            Err(e) => json!({ "error": format!("Failed to get diagnostics: {e}") }),
        })
    }
}

pub struct InsertCodeLineTool {
    api: Arc<dyn CodeBudApi>,
}

impl InsertCodeLineTool {
    pub fn new(api: Arc<dyn CodeBudApi>) -> Self {
        Self { api }
    }
}

#[async_trait::async_trait]
impl Tool for InsertCodeLineTool {
    fn name(&self) -> &str {
        "insert_code_line"
    }

    fn description(&self) -> &str {
        "Insert code above the given 1-indexed line of the current file. Use the line after the last line to append. Only works in driver mode."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "line": { "type": "integer", "description": "1-indexed line to insert at" },
                "code": { "type": "string", "description": "Code to insert" }
            },
            "required": ["line", "code"]
        })
    }

    async fn execute(&self, params: Value) -> ToolResult {
        let result = async {
            let line = required_i64(&params, "line")?;
            let code = required_str(&params, "code")?;
            self.api.insert(line, code).await
        }
        .await;

        Ok(match result {
            Ok(edit) => serde_json::to_value(edit)?,
            Err(e) => edit_failure("insert code", e),
        })
    }
}

pub struct ReplaceCodeLineTool {
    api: Arc<dyn CodeBudApi>,
}

impl ReplaceCodeLineTool {
    pub fn new(api: Arc<dyn CodeBudApi>) -> Self {
        Self { api }
    }
}

#[async_trait::async_trait]
impl Tool for ReplaceCodeLineTool {
    fn name(&self) -> &str {
        "replace_code_line"
    }

    fn description(&self) -> &str {
        "Replace a single 1-indexed line of the current file with new code. Only works in driver mode."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "line": { "type": "integer", "description": "1-indexed line to replace" },
                "code": { "type": "string", "description": "Replacement code" }
            },
            "required": ["line", "code"]
        })
    }

    async fn execute(&self, params: Value) -> ToolResult {
        let result = async {
            let line = required_i64(&params, "line")?;
            let code = required_str(&params, "code")?;
            self.api.replace(line, line, code).await
        }
        .await;

        Ok(match result {
            Ok(edit) => serde_json::to_value(edit)?,
            Err(e) => edit_failure("replace code", e),
        })
    }
}

pub struct SwitchModeTool {
    api: Arc<dyn CodeBudApi>,
}

impl SwitchModeTool {
    pub fn new(api: Arc<dyn CodeBudApi>) -> Self {
        Self { api }
    }
}

#[async_trait::async_trait]
impl Tool for SwitchModeTool {
    fn name(&self) -> &str {
        "switch_mode"
    }

    fn description(&self) -> &str {
        "Switch between driver mode (you may edit the code) and navigator mode (observe and advise only)."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "mode": { "type": "string", "enum": ["driver", "navigator"] }
            },
            "required": ["mode"]
        })
    }

    async fn execute(&self, params: Value) -> ToolResult {
        let mode = match params.get("mode").and_then(Value::as_str).map(str::parse::<Mode>) {
            Some(Ok(mode)) => mode,
            _ => {
                return Ok(json!({
                    "success": false,
                    "error": "Invalid mode. Must be \"driver\" or \"navigator\".",
                }))
            }
        };

        Ok(match self.api.set_mode(mode).await {
            Ok(response) => {
                if response.success {
                    tracing::info!(mode = %response.mode, "Mode switched by assistant");
                }
                serde_json::to_value(response)?
            }
            Err(e) => edit_failure("switch mode", e),
        })
    }
}
