use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{api, llm, monitor, paths};
use crate::error::{CodebudError, Result};
use crate::llm::{LlmClient, OpenAIClient};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub monitor: MonitorSettings,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub insights: InsightsSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            host: api::HOST.to_string(),
            port: api::PORT,
        }
    }
}

impl ApiSettings {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorSettings {
    pub poll_interval_ms: u64,
    pub pause_threshold_secs: i64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: monitor::POLL_INTERVAL_MS,
            pause_threshold_secs: monitor::PAUSE_THRESHOLD_SECS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Ollama,
    OpenAI,
    LmStudio,
    /// No model: sessions run console-only and insights are stats-only.
    None,
}

impl LlmProvider {
    fn default_base_url(&self) -> &'static str {
        match self {
            LlmProvider::Ollama | LlmProvider::None => llm::DEFAULT_BASE_URL,
            LlmProvider::OpenAI => "https://api.openai.com",
            LlmProvider::LmStudio => "http://localhost:1234",
        }
    }

    fn requires_key(&self) -> bool {
        matches!(self, LlmProvider::OpenAI)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    pub model: String,
    pub api_key_env: String,
    pub base_url: Option<String>,
    pub max_tokens: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Ollama,
            model: llm::DEFAULT_MODEL.to_string(),
            api_key_env: llm::DEFAULT_API_KEY_ENV.to_string(),
            base_url: None,
            max_tokens: llm::DEFAULT_MAX_TOKENS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightsSettings {
    /// Where sessions and the insights cache live. Defaults to
    /// `~/.codebud`.
    pub data_dir: Option<PathBuf>,
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(paths::CONFIG_DIR)
            .join(paths::CONFIG_FILE)
    }

    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Missing or unreadable files fall back to defaults.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match toml::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring invalid config file");
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| CodebudError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// The API key from the environment variable named in settings.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.llm.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    pub fn data_dir(&self) -> PathBuf {
        self.insights.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(paths::DATA_DIR)
        })
    }

    /// The configured chat model, or `None` when none is usable.
    pub fn build_llm_client(&self) -> Option<Box<dyn LlmClient>> {
        let provider = self.llm.provider;
        if provider == LlmProvider::None {
            return None;
        }

        let api_key = self.api_key();
        if provider.requires_key() && api_key.is_none() {
            tracing::warn!(env = %self.llm.api_key_env, "No API key set; model disabled");
            return None;
        }

        let base_url = self
            .llm
            .base_url
            .clone()
            .unwrap_or_else(|| provider.default_base_url().to_string());

        Some(Box::new(
            OpenAIClient::new(api_key)
                .with_base_url(base_url)
                .with_model(&self.llm.model)
                .with_max_tokens(self.llm.max_tokens),
        ))
    }
}
