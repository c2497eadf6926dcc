use codebud_core::config::{LlmProvider, Settings};
use codebud_core::editor::EditorActions;
use codebud_core::*;
use std::sync::Arc;
use tempfile::TempDir;

fn host_with(uri: &str, text: &str) -> (EditorHost, ManualClock) {
    let clock = ManualClock::new(1_700_000_000_000);
    let mut host = EditorHost::new(Arc::new(clock.clone()));
    host.open_document(TextDocument::new(uri, text));
    (host, clock)
}

// ========================================================================
// Settings
// ========================================================================

#[test]
fn test_settings_default_values() {
    let settings = Settings::default();
    assert_eq!(settings.api.port, 3001);
    assert_eq!(settings.api.base_url(), "http://127.0.0.1:3001");
    assert_eq!(settings.monitor.poll_interval_ms, 4000);
    assert_eq!(settings.monitor.pause_threshold_secs, 5);
    assert_eq!(settings.llm.provider, LlmProvider::Ollama);
}

#[test]
fn test_settings_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut settings = Settings::default();
    settings.api.port = 4100;
    settings.llm.provider = LlmProvider::None;
    settings.save_to(&path).unwrap();

    let loaded = Settings::load_from(&path);
    assert_eq!(loaded, settings);
    assert!(loaded.build_llm_client().is_none());
}

#[test]
fn test_partial_config_keeps_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[monitor]\npoll_interval_ms = 1000\npause_threshold_secs = 8\n").unwrap();

    let loaded = Settings::load_from(&path);
    assert_eq!(loaded.monitor.pause_threshold_secs, 8);
    assert_eq!(loaded.api.port, 3001);
}

// ========================================================================
// Typing, pause and context
// ========================================================================

#[test]
fn test_typing_then_pause_is_visible_in_context() {
    let (mut host, clock) = host_with("/work/calc.py", "def add(a, b):\n    pass\n");

    host.edit_active(Position::new(1, 4), Position::new(1, 8), "return a + b")
        .unwrap();
    host.set_cursor(Position::new(1, 4));

    let typing = get_context(&mut host, Mode::Navigator).unwrap();
    assert!(typing.is_typing);
    assert_eq!(typing.cursor_line, 2);
    assert_eq!(typing.changes_since_last_poll, vec!["return a + b".to_string()]);
    assert_eq!(typing.seconds_since_last_change, 0);

    clock.advance(5_200);
    let paused = get_context(&mut host, Mode::Navigator).unwrap();
    assert!(!paused.is_typing);
    assert_eq!(paused.seconds_since_last_change, 5);
    assert!(paused.changes_since_last_poll.is_empty());
    assert!(!paused.has_new_changes);
    assert_eq!(paused.recent_changes, vec!["return a + b".to_string()]);
    assert!(paused.surrounding_code.contains("def add(a, b):"));
}

#[test]
fn test_whitespace_only_edits_extend_typing_without_recording() {
    let (mut host, clock) = host_with("/work/a.rs", "fn a() {}\n");
    host.edit_active(Position::new(0, 0), Position::new(0, 0), "x")
        .unwrap();
    clock.advance(2_500);
    host.edit_active(Position::new(1, 0), Position::new(1, 0), "   \n")
        .unwrap();
    clock.advance(2_500);

    let context = get_context(&mut host, Mode::Driver).unwrap();
    assert!(context.is_typing);
    assert_eq!(context.changes_since_last_poll, vec!["x".to_string()]);
    assert_eq!(context.mode, Mode::Driver);
}

#[test]
fn test_recent_changes_keep_last_five() {
    let (mut host, _) = host_with("/work/a.txt", "");
    for i in 0..8 {
        host.edit_active(Position::new(0, 0), Position::new(0, 0), &format!("c{i}\n"))
            .unwrap();
    }
    let context = get_context(&mut host, Mode::Navigator).unwrap();
    assert_eq!(context.recent_changes, vec!["c3", "c4", "c5", "c6", "c7"]);
    assert_eq!(context.changes_since_last_poll.len(), 8);
}

// ========================================================================
// Editor actions
// ========================================================================

#[test]
fn test_insert_then_replace_keeps_indentation() {
    let (mut host, _) = host_with("/work/a.py", "def f():\n    a = 1\n    return a\n");
    let actions = EditorActions::new();

    let inserted = actions.insert_code(&mut host, 3, "b = 2\nc = 3");
    assert!(inserted.success);
    assert_eq!(
        host.active_document().unwrap().text(),
        "def f():\n    a = 1\n    b = 2\n    c = 3\n    return a\n"
    );

    let replaced = actions.replace_code(&mut host, 5, 5, "return a + b + c");
    assert!(replaced.success);
    assert!(host
        .active_document()
        .unwrap()
        .text()
        .ends_with("    return a + b + c\n"));
    assert_eq!(host.active_highlight().map(|h| h.line), Some(5));
}

#[test]
fn test_failed_edits_leave_document_untouched() {
    let (mut host, _) = host_with("/work/a.py", "x\n");
    let actions = EditorActions::new();

    let result = actions.insert_code(&mut host, 9, "y");
    assert_eq!(
        result.error.as_deref(),
        Some("Invalid line number: 9. Document has 2 lines.")
    );
    let result = actions.replace_code(&mut host, 0, 1, "y");
    assert!(!result.success);
    assert_eq!(host.active_document().unwrap().text(), "x\n");
    assert!(host.tracker().is_empty());
}

// ========================================================================
// Diagnostics
// ========================================================================

#[test]
fn test_linter_diagnostics_flow_into_summary() {
    let (mut host, _) = host_with("/work/main.rs", "fn main() {\n    let v = x.unwrap();\n}\n");
    let linter = analysis::Linter::new().unwrap();
    let uri = host.active_uri().unwrap().to_string();
    let found = linter.lint_document(host.active_document().unwrap());
    host.publish_diagnostics(&uri, found);

    let response = diagnostics::collect(&host, host.active_uri(), None);
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].line, 2);
    assert_eq!(response.errors[0].severity, Severity::Warning);
    assert_eq!(diagnostics::summary(&response), "1 warning");

    let only_errors = diagnostics::collect(&host, host.active_uri(), Some(MinSeverity::Error));
    assert!(only_errors.errors.is_empty());
}

// ========================================================================
// Sessions and insights
// ========================================================================

#[tokio::test]
async fn test_insights_without_model_report_stats() {
    let dir = TempDir::new().unwrap();
    let store = SessionStore::with_dir(dir.path()).unwrap();
    store
        .save_session(insights::NewSession {
            timestamp: chrono::Utc::now(),
            transcript: vec![
                TranscriptEntry::user("why is this None?"),
                TranscriptEntry::assistant("You never assign it."),
            ],
            file_context: "main.rs".into(),
            language: "rust".into(),
            duration: 120,
        })
        .unwrap();

    let service = InsightsService::new(store, None);
    let insights = service.generate_insights(false).await.unwrap();

    assert_eq!(insights.stats.total_sessions, 1);
    assert_eq!(insights.stats.total_minutes, 2);
    assert_eq!(insights.stats.top_languages, vec!["rust".to_string()]);
    assert_eq!(insights.areas_to_improve[0].topic, "API Key Required");
    assert_eq!(service.store().api_calls_used().unwrap(), 0);
}
