//! Persisted conversation sessions and the coaching insights derived from
//! them.

mod service;
mod store;

pub use service::{aggregate_transcripts, calculate_stats, parse_insights, InsightsService};
pub use store::{NewSession, SessionRecord, SessionStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorPattern {
    pub error: String,
    pub count: u32,
    pub suggestion: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImprovementArea {
    pub topic: String,
    pub reason: String,
    #[serde(default)]
    pub resources: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestedConcept {
    pub name: String,
    pub description: String,
    pub relevance: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightStats {
    pub total_sessions: usize,
    pub total_minutes: u64,
    pub top_languages: Vec<String>,
    pub last_analyzed: Option<DateTime<Utc>>,
    pub api_calls_used: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    #[serde(default)]
    pub common_errors: Vec<ErrorPattern>,
    #[serde(default)]
    pub areas_to_improve: Vec<ImprovementArea>,
    #[serde(default)]
    pub suggested_concepts: Vec<SuggestedConcept>,
    #[serde(default)]
    pub stats: InsightStats,
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
}
