//! CodeBud constants. Magic numbers, strings and limits live here.

// ─── Local API ────────────────────────────────────────────────────────────────

pub mod api {
    pub const HOST: &str = "127.0.0.1";
    pub const PORT: u16 = 3001;

    pub const CONTEXT: &str = "/api/context";
    pub const DIAGNOSTICS: &str = "/api/diagnostics";
    pub const INSERT: &str = "/api/insert";
    pub const REPLACE: &str = "/api/replace";
    pub const HIGHLIGHT: &str = "/api/highlight";
    pub const MODE: &str = "/api/mode";
    pub const STATUS: &str = "/api/status";
}

// ─── Change Tracking ──────────────────────────────────────────────────────────

pub mod tracking {
    /// Ring buffer capacity for recent changes.
    pub const MAX_CHANGES: usize = 20;
    /// How many changes `recentChanges` reports by default.
    pub const DEFAULT_RECENT_CHANGES: usize = 5;
    /// Idle window after the last change before typing is considered stopped.
    pub const TYPING_TIMEOUT_MS: i64 = 3000;
}

// ─── Code Context ─────────────────────────────────────────────────────────────

pub mod context {
    /// Lines shown on each side of the cursor in `surroundingCode`.
    pub const SURROUNDING_RADIUS: usize = 10;
    /// `fileContent` is cut after this many lines.
    pub const MAX_CONTENT_LINES: usize = 500;
    pub const NO_PROBLEMS: &str = "No problems found.";
}

// ─── Editor Actions ───────────────────────────────────────────────────────────

pub mod editor {
    pub const HIGHLIGHT_DURATION_MS: i64 = 2000;
}

// ─── Monitor ──────────────────────────────────────────────────────────────────

pub mod monitor {
    pub const POLL_INTERVAL_MS: u64 = 4000;
    pub const STATUS_POLL_INTERVAL_MS: u64 = 3000;
    pub const PAUSE_THRESHOLD_SECS: i64 = 5;
    /// Pauses older than this are not "recent activity" and never trigger a review.
    pub const RECENT_ACTIVITY_SECS: i64 = 60;
    pub const MAX_TOOL_ITERATIONS: usize = 8;
    /// Conversation turns kept for the model; older ones are dropped.
    pub const MAX_HISTORY_MESSAGES: usize = 100;
}

// ─── LLM ──────────────────────────────────────────────────────────────────────

pub mod llm {
    pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
    pub const DEFAULT_MODEL: &str = "qwen2.5-coder:7b";
    pub const DEFAULT_API_KEY_ENV: &str = "CODEBUD_API_KEY";
    pub const DEFAULT_MAX_TOKENS: u32 = 2048;
}

// ─── Insights ─────────────────────────────────────────────────────────────────

pub mod insights {
    /// Only the most recent sessions are sent for analysis.
    pub const MAX_ANALYZED_SESSIONS: usize = 10;
    pub const TOP_LANGUAGES: usize = 5;
}

// ─── Config Paths ─────────────────────────────────────────────────────────────

pub mod paths {
    pub const CONFIG_DIR: &str = "codebud";
    pub const CONFIG_FILE: &str = "config.toml";
    pub const DATA_DIR: &str = ".codebud";
    pub const SESSIONS_FILE: &str = "sessions.json";
    pub const INSIGHTS_CACHE_FILE: &str = "insights_cache.json";
    pub const API_CALLS_FILE: &str = "api_calls.json";
}
