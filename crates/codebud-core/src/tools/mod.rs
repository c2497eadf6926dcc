mod client;
mod traits;

pub use client::{
    GetCodeContextTool, GetDiagnosticsTool, InsertCodeLineTool, ReplaceCodeLineTool,
    SwitchModeTool,
};
pub use traits::{Tool, ToolDefinition, ToolRegistry, ToolResult};

use crate::monitor::CodeBudApi;
use std::sync::Arc;

impl ToolRegistry {
    /// The five tools exposed to the conversational session.
    pub fn client_tools(api: Arc<dyn CodeBudApi>) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(GetCodeContextTool::new(api.clone())));
        registry.register(Box::new(GetDiagnosticsTool::new(api.clone())));
        registry.register(Box::new(InsertCodeLineTool::new(api.clone())));
        registry.register(Box::new(ReplaceCodeLineTool::new(api.clone())));
        registry.register(Box::new(SwitchModeTool::new(api)));
        registry
    }
}
