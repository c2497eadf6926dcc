pub mod analysis;
pub mod clock;
pub mod config;
pub mod constants;
pub mod context;
pub mod diagnostics;
pub mod editor;
pub mod error;
pub mod insights;
pub mod llm;
pub mod mode;
pub mod monitor;
pub mod protocol;
pub mod session;
#[cfg(test)]
pub(crate) mod testing;
pub mod tools;
pub mod tracker;

// Re-export key types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Settings;
pub use context::{get_context, CodeContext};
pub use diagnostics::{DiagnosticsProvider, DiagnosticsResponse, MinSeverity, Severity};
pub use editor::{
    split_lines_inclusive, strip_line_break, EditResult, EditorActions, EditorHost, Position,
    TextDocument,
};
pub use error::{CodebudError, Result};
pub use insights::{Insights, InsightsService, SessionStore};
pub use llm::{LlmClient, LlmResponse, Message, Role};
pub use mode::{Mode, ModeIndicator, ModeState};
pub use monitor::{ApiClient, CodeBudApi, CodeMonitor, MonitorEvent};
pub use session::{ConsoleSession, ConversationSession, LlmConversation, TranscriptEntry};
pub use tools::{Tool, ToolDefinition, ToolRegistry, ToolResult};
pub use tracker::{ChangeRecord, ChangeTracker, TypingState};
