use super::Insights;
use crate::constants::paths::{API_CALLS_FILE, INSIGHTS_CACHE_FILE, SESSIONS_FILE};
use crate::error::{CodebudError, Result};
use crate::session::TranscriptEntry;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// A finished conversation as persisted for later analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub transcript: Vec<TranscriptEntry>,
    pub file_context: String,
    pub language: String,
    /// Seconds.
    pub duration: u64,
}

/// A session about to be saved; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSession {
    pub timestamp: DateTime<Utc>,
    pub transcript: Vec<TranscriptEntry>,
    pub file_context: String,
    pub language: String,
    pub duration: u64,
}

/// JSON files under one data directory: the session list, the insights
/// cache and the analysis call counter.
pub struct SessionStore {
    base_dir: PathBuf,
}

impl SessionStore {
    pub fn with_dir(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir).map_err(|e| {
            CodebudError::Config(format!("Failed to create data directory: {e}"))
        })?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// `session_<millis>_<9 base36 chars>`.
    pub fn generate_id(now: DateTime<Utc>) -> String {
        let mut n = uuid::Uuid::new_v4().as_u128();
        let mut suffix = String::with_capacity(9);
        for _ in 0..9 {
            let digit = (n % 36) as u32;
            n /= 36;
            suffix.push(char::from_digit(digit, 36).unwrap_or('0'));
        }
        format!("session_{}_{}", now.timestamp_millis(), suffix)
    }

    pub fn save_session(&self, session: NewSession) -> Result<SessionRecord> {
        let mut sessions = self.sessions()?;
        let record = SessionRecord {
            id: Self::generate_id(Utc::now()),
            timestamp: session.timestamp,
            transcript: session.transcript,
            file_context: session.file_context,
            language: session.language,
            duration: session.duration,
        };
        sessions.push(record.clone());
        self.write_json(SESSIONS_FILE, &sessions)?;
        tracing::info!(id = %record.id, "Saved session");
        Ok(record)
    }

    pub fn sessions(&self) -> Result<Vec<SessionRecord>> {
        Ok(self.read_json(SESSIONS_FILE)?.unwrap_or_default())
    }

    /// Drops every session and the insights cache. The call counter stays.
    pub fn clear(&self) -> Result<()> {
        self.write_json::<Vec<SessionRecord>>(SESSIONS_FILE, &Vec::new())?;
        self.remove(INSIGHTS_CACHE_FILE)?;
        tracing::info!("Cleared all sessions");
        Ok(())
    }

    pub fn cached_insights(&self) -> Result<Option<Insights>> {
        self.read_json(INSIGHTS_CACHE_FILE)
    }

    pub fn cache_insights(&self, insights: &Insights) -> Result<()> {
        self.write_json(INSIGHTS_CACHE_FILE, insights)
    }

    pub fn api_calls_used(&self) -> Result<u64> {
        Ok(self.read_json(API_CALLS_FILE)?.unwrap_or(0))
    }

    pub fn increment_api_calls(&self) -> Result<u64> {
        let count = self.api_calls_used()? + 1;
        self.write_json(API_CALLS_FILE, &count)?;
        Ok(count)
    }

    fn path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.path(name);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)?;
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| CodebudError::Config(format!("Failed to parse {name}: {e}")))
    }

    fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.path(name);
        let contents = serde_json::to_string_pretty(value)?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, contents).map_err(|e| {
            CodebudError::Config(format!("Failed to write temporary {name}: {e}"))
        })?;
        fs::rename(&tmp_path, &path)
            .map_err(|e| CodebudError::Config(format!("Failed to rename {name}: {e}")))?;
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<()> {
        match fs::remove_file(self.path(name)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
