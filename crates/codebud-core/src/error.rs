use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodebudError {
    #[error("Extension not initialized: {0}")]
    NotInitialized(String),

    #[error("No active editor")]
    NoActiveDocument,

    #[error("{0}")]
    InvalidParams(String),

    #[error("{0} only allowed in driver mode")]
    ModeForbidden(String),

    #[error("Invalid line number: {line}. Document has {total} lines.")]
    InvalidLine { line: i64, total: usize },

    #[error("Invalid range: {start}-{end}.")]
    InvalidRange { start: i64, end: i64 },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse AI response: {0}")]
    UpstreamParse(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl CodebudError {
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams(message.into())
    }

    pub fn forbidden(operation: impl Into<String>) -> Self {
        Self::ModeForbidden(operation.into())
    }

    /// HTTP status used when this error crosses the local API boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NoActiveDocument => 404,
            Self::InvalidParams(_) => 400,
            Self::ModeForbidden(_) => 403,
            // Edit failures travel as `{success: false}` bodies, not HTTP faults.
            Self::InvalidLine { .. } | Self::InvalidRange { .. } => 200,
            Self::ConnectionFailed(_) | Self::Api { .. } | Self::Http(_) => 502,
            _ => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, CodebudError>;
