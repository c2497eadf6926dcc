use super::store::{SessionRecord, SessionStore};
use super::{ImprovementArea, InsightStats, Insights, SuggestedConcept};
use crate::constants::insights::{MAX_ANALYZED_SESSIONS, TOP_LANGUAGES};
use crate::error::{CodebudError, Result};
use crate::llm::{LlmClient, Message};
use chrono::Utc;

/// Turns stored sessions into coaching feedback with the help of a model.
pub struct InsightsService {
    store: SessionStore,
    llm: Option<Box<dyn LlmClient>>,
}

impl InsightsService {
    pub fn new(store: SessionStore, llm: Option<Box<dyn LlmClient>>) -> Self {
        Self { store, llm }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Insights over every stored session. The cache is reused unless
    /// `force_refresh` is set or a session arrived after it was generated.
    /// Analysis failures come back as an "Analysis Error" insight; only
    /// storage failures are errors.
    pub async fn generate_insights(&self, force_refresh: bool) -> Result<Insights> {
        let sessions = self.store.sessions()?;
        let cached = self.store.cached_insights()?;

        if !force_refresh {
            if let Some(ref cached) = cached {
                let newest = sessions.iter().map(|s| s.timestamp).max();
                if let (Some(newest), Some(generated_at)) = (newest, cached.generated_at) {
                    if newest <= generated_at {
                        tracing::debug!("Using cached insights");
                        return Ok(cached.clone());
                    }
                }
            }
        }

        let stats = calculate_stats(
            &sessions,
            cached.as_ref().and_then(|c| c.generated_at),
            self.store.api_calls_used()?,
        );

        let Some(ref llm) = self.llm else {
            return Ok(fallback(
                stats,
                vec![ImprovementArea {
                    topic: "API Key Required".into(),
                    reason: "Configure a model in config.toml (or set the API key environment variable) to enable AI-powered insights analysis.".into(),
                    resources: vec!["https://ollama.com/".into()],
                }],
                vec![],
            ));
        };

        if sessions.is_empty() {
            return Ok(fallback(
                stats,
                vec![],
                vec![SuggestedConcept {
                    name: "Start Coding!".into(),
                    description: "Have some conversations with CodeBud to generate personalized insights.".into(),
                    relevance: "Your coding patterns will be analyzed after your first sessions.".into(),
                }],
            ));
        }

        match self.analyze(llm.as_ref(), &sessions).await {
            Ok(mut insights) => {
                insights.stats = InsightStats {
                    api_calls_used: self.store.increment_api_calls()?,
                    ..stats
                };
                insights.generated_at = Some(Utc::now());
                self.store.cache_insights(&insights)?;
                Ok(insights)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to generate insights");
                Ok(fallback(
                    stats,
                    vec![ImprovementArea {
                        topic: "Analysis Error".into(),
                        reason: format!("Failed to analyze transcripts: {e}"),
                        resources: vec![],
                    }],
                    vec![],
                ))
            }
        }
    }

    async fn analyze(&self, llm: &dyn LlmClient, sessions: &[SessionRecord]) -> Result<Insights> {
        let prompt = analysis_prompt(sessions);
        let response = llm.chat(&[Message::user(prompt)], &[]).await?;
        parse_insights(&response.message.content)
    }
}

fn fallback(
    stats: InsightStats,
    areas_to_improve: Vec<ImprovementArea>,
    suggested_concepts: Vec<SuggestedConcept>,
) -> Insights {
    Insights {
        common_errors: vec![],
        areas_to_improve,
        suggested_concepts,
        stats,
        generated_at: Some(Utc::now()),
    }
}

/// Usage numbers. Minutes are summed before rounding; languages are ranked by
/// session count, ties in order of first appearance.
pub fn calculate_stats(
    sessions: &[SessionRecord],
    last_analyzed: Option<chrono::DateTime<Utc>>,
    api_calls_used: u64,
) -> InsightStats {
    let total_seconds: u64 = sessions.iter().map(|s| s.duration).sum();

    let mut counts: Vec<(&str, usize)> = Vec::new();
    for session in sessions.iter().filter(|s| !s.language.is_empty()) {
        let language = session.language.as_str();
        match counts.iter_mut().find(|(lang, _)| *lang == language) {
            Some((_, count)) => *count += 1,
            None => counts.push((language, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    InsightStats {
        total_sessions: sessions.len(),
        total_minutes: (total_seconds as f64 / 60.0).round() as u64,
        top_languages: counts
            .into_iter()
            .take(TOP_LANGUAGES)
            .map(|(lang, _)| lang.to_string())
            .collect(),
        last_analyzed,
        api_calls_used,
    }
}

/// The most recent transcripts as one block of text.
pub fn aggregate_transcripts(sessions: &[SessionRecord]) -> String {
    let skip = sessions.len().saturating_sub(MAX_ANALYZED_SESSIONS);

    sessions[skip..]
        .iter()
        .enumerate()
        .map(|(idx, session)| {
            let language = if session.language.is_empty() {
                "unknown"
            } else {
                session.language.as_str()
            };
            let entries = session
                .transcript
                .iter()
                .map(|e| format!("{}: {}", e.role.to_string().to_uppercase(), e.text))
                .collect::<Vec<_>>()
                .join("\n");
            format!(
                "--- Session {} ({}, {}) ---\n{}",
                idx + 1,
                session.timestamp.format("%Y-%m-%d"),
                language,
                entries
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn analysis_prompt(sessions: &[SessionRecord]) -> String {
    let mut languages: Vec<&str> = Vec::new();
    for session in sessions {
        if !session.language.is_empty() && !languages.contains(&session.language.as_str()) {
            languages.push(&session.language);
        }
    }
    let languages = if languages.is_empty() {
        "Various".to_string()
    } else {
        languages.join(", ")
    };

    format!(
        r#"You are reviewing transcripts of a learner pair programming with an assistant called CodeBud. Give encouraging, concrete feedback that helps them improve.

Languages used: {languages}

From the transcripts, extract:
1. COMMON ERRORS: mistakes the user repeats, each with a suggestion.
2. AREAS TO IMPROVE: topics the user struggles with, each with learning resources.
3. SUGGESTED CONCEPTS: data structures, algorithms, patterns or concepts worth studying next, and why they matter for this user.

TRANSCRIPTS:
{transcripts}

Respond ONLY with raw JSON (no markdown) in exactly this shape:
{{
  "commonErrors": [{{"error": "...", "count": 2, "suggestion": "..."}}],
  "areasToImprove": [{{"topic": "...", "reason": "...", "resources": ["..."]}}],
  "suggestedConcepts": [{{"name": "...", "description": "...", "relevance": "..."}}]
}}
Use an empty array for any category without findings."#,
        transcripts = aggregate_transcripts(sessions),
    )
}

/// Parses the model's answer, tolerating a surrounding Markdown code fence.
pub fn parse_insights(text: &str) -> Result<Insights> {
    let mut json = text.trim();
    if let Some(rest) = json.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        let rest = rest.strip_prefix('\n').unwrap_or(rest);
        json = rest.strip_suffix("```").unwrap_or(rest).trim_end();
    }

    serde_json::from_str::<Insights>(json).map_err(|e| {
        tracing::debug!(response = %text, "Unparseable analysis response");
        CodebudError::UpstreamParse(e.to_string())
    })
}
