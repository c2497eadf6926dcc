use crate::commands::{handle_command, CommandResult, ModeChange};
use anyhow::{Context, Result};
use chrono::Utc;
use codebud_core::analysis::Linter;
use codebud_core::constants::monitor::STATUS_POLL_INTERVAL_MS;
use codebud_core::insights::NewSession;
use codebud_core::{
    ApiClient, CodeBudApi, CodeMonitor, ConsoleSession, ConversationSession, EditorHost,
    Insights, InsightsService, LlmConversation, ModeState, MonitorEvent, SessionStore, Settings,
    ToolRegistry,
};
use codebud_server::{start_api_server, ApiState, FileMirror};
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Serves the local API until Ctrl-C, optionally mirroring a file on disk.
pub async fn run_serve(settings: &Settings, file: Option<&Path>) -> Result<()> {
    let linter = Linter::new().context("Failed to build linter")?;
    let mut state = ApiState::new(EditorHost::default(), ModeState::default()).with_linter(linter);
    if let Some(path) = file {
        state = state.with_write_back(path);
    }
    let state = Arc::new(state);

    let _mirror = match file {
        Some(path) => Some(
            FileMirror::watch(path, Arc::clone(&state))
                .with_context(|| format!("Failed to open {}", path.display()))?,
        ),
        None => None,
    };

    let addr = format!("{}:{}", settings.api.host, settings.api.port);
    let server = start_api_server(&addr, state)
        .with_context(|| format!("Port {} may already be in use", settings.api.port))?;
    println!("CodeBud API listening on http://{}", server.local_addr());
    if file.is_none() {
        println!("No file given; /api/context answers 404 until one is opened.");
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    server.stop();
    Ok(())
}

/// Polls the API, feeds the session and forwards typed input until the user
/// quits, then saves the transcript.
pub async fn run_monitor(settings: &Settings) -> Result<()> {
    let api: Arc<dyn CodeBudApi> = Arc::new(ApiClient::new(settings.api.base_url()));
    let mut session: Box<dyn ConversationSession> = match settings.build_llm_client() {
        Some(llm) => {
            println!("Assistant: {}", llm.model());
            Box::new(LlmConversation::new(
                llm,
                ToolRegistry::client_tools(Arc::clone(&api)),
            ))
        }
        None => {
            println!("No model configured; running console-only.");
            Box::new(ConsoleSession::new())
        }
    };

    let mut monitor = CodeMonitor::new()
        .with_poll_interval(Duration::from_millis(settings.monitor.poll_interval_ms))
        .with_pause_threshold(settings.monitor.pause_threshold_secs);

    session.start_session().await?;
    let started_at = Utc::now();
    let started = Instant::now();
    println!("Monitoring {}. Type /help for commands.", settings.api.base_url());

    let (input_tx, input_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let console = run_console(Arc::clone(&api), read_stdin_lines(), event_rx, input_tx);
    let shutdown = async {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = console => {}
        }
    };
    monitor
        .run(api.as_ref(), session.as_mut(), input_rx, event_tx, shutdown)
        .await;

    let transcript = session.end_session().await?;
    if transcript.is_empty() {
        tracing::info!("Empty session; nothing saved");
        return Ok(());
    }

    let (file_context, language) = monitor
        .last_context()
        .map(|c| (c.file_name.clone(), c.language.clone()))
        .unwrap_or_else(|| (String::new(), "unknown".to_string()));
    let store = SessionStore::with_dir(settings.data_dir())?;
    let record = store.save_session(NewSession {
        timestamp: started_at,
        transcript,
        file_context,
        language,
        duration: started.elapsed().as_secs(),
    })?;
    println!("Session saved as {}", record.id);
    Ok(())
}

/// Reads stdin on its own thread so a pending read never holds up exit.
fn read_stdin_lines() -> UnboundedReceiver<io::Result<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in io::stdin().lines() {
            let failed = line.is_err();
            if tx.send(line).is_err() || failed {
                break;
            }
        }
    });
    rx
}

/// Prints monitor events and handles typed commands. Returns when the user
/// quits or stdin ends; anything that is not a command goes to `input`.
async fn run_console(
    api: Arc<dyn CodeBudApi>,
    mut lines: UnboundedReceiver<io::Result<String>>,
    mut events: UnboundedReceiver<MonitorEvent>,
    input: UnboundedSender<String>,
) {
    let mut last_summary: Option<String> = None;
    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                if let MonitorEvent::ContextUpdate(summary) = &event {
                    last_summary = Some(summary.clone());
                }
                print_event(&event);
            }
            line = lines.recv() => {
                let line = match line {
                    Some(Ok(line)) => line,
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Failed to read stdin");
                        break;
                    }
                    None => break,
                };
                match handle_command(&line) {
                    CommandResult::Quit => break,
                    CommandResult::Message(msg) => println!("{msg}"),
                    CommandResult::ShowStatus => show_status(api.as_ref()).await,
                    CommandResult::ShowContext => match &last_summary {
                        Some(summary) => println!("{summary}"),
                        None => println!("No context received yet."),
                    },
                    CommandResult::SwitchMode(change) => {
                        if let Err(e) = switch_mode(api.as_ref(), change).await {
                            println!("Error: {e}");
                        }
                    }
                    CommandResult::NotACommand => {
                        let text = line.trim();
                        if !text.is_empty() && input.send(text.to_string()).is_err() {
                            break;
                        }
                    }
                }
            }
        }
    }
}

fn print_event(event: &MonitorEvent) {
    match event {
        MonitorEvent::Connected => println!("● Connected to CodeBud API"),
        MonitorEvent::Disconnected(error) => println!("○ Disconnected: {error}"),
        MonitorEvent::ContextUpdate(summary) => tracing::debug!("{summary}"),
        MonitorEvent::Review { label, .. } => println!("{label}"),
        MonitorEvent::Reply(reply) => println!("CodeBud: {reply}"),
        MonitorEvent::SessionError(error) => println!("Error: {error}"),
    }
}

async fn show_status(api: &dyn CodeBudApi) {
    match api.status().await {
        Ok(status) => println!("Connected. Mode: {}", status.mode.label()),
        Err(e) => println!("Offline: {e}"),
    }
}

async fn switch_mode(api: &dyn CodeBudApi, change: ModeChange) -> Result<()> {
    let target = match change {
        ModeChange::Set(mode) => mode,
        ModeChange::Toggle => change.resolve(api.status().await?.mode),
    };
    let response = api.set_mode(target).await?;
    println!(
        "Switched to {} Mode - {}",
        response.mode.label(),
        response.mode.description()
    );
    Ok(())
}

pub async fn run_mode(settings: &Settings, change: ModeChange) -> Result<()> {
    let api = ApiClient::new(settings.api.base_url());
    switch_mode(&api, change).await
}

/// One status check, or one every few seconds with `watch`, printing only
/// when the answer changes.
pub async fn run_status(settings: &Settings, watch: bool) -> Result<()> {
    let api = ApiClient::new(settings.api.base_url());
    if !watch {
        let status = api.status().await?;
        println!("active: {}, mode: {}", status.active, status.mode);
        return Ok(());
    }

    let mut interval = tokio::time::interval(Duration::from_millis(STATUS_POLL_INTERVAL_MS));
    let mut last: Option<String> = None;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => return Ok(()),
            _ = interval.tick() => {
                let line = match api.status().await {
                    Ok(status) => format!("● connected, mode: {}", status.mode),
                    Err(e) => format!("○ offline ({e})"),
                };
                if last.as_deref() != Some(line.as_str()) {
                    println!("{line}");
                    last = Some(line);
                }
            }
        }
    }
}

pub async fn run_insights(settings: &Settings, refresh: bool, json: bool) -> Result<()> {
    let store = SessionStore::with_dir(settings.data_dir())?;
    let service = InsightsService::new(store, settings.build_llm_client());
    let insights = service.generate_insights(refresh).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&insights)?);
    } else {
        print_insights(&insights);
    }
    Ok(())
}

fn print_insights(insights: &Insights) {
    let stats = &insights.stats;
    println!(
        "Sessions: {}  Minutes: {}  Analyses used: {}",
        stats.total_sessions, stats.total_minutes, stats.api_calls_used
    );
    if !stats.top_languages.is_empty() {
        println!("Top languages: {}", stats.top_languages.join(", "));
    }

    if !insights.common_errors.is_empty() {
        println!("\nCommon errors:");
        for pattern in &insights.common_errors {
            println!("  {} (x{}): {}", pattern.error, pattern.count, pattern.suggestion);
        }
    }
    if !insights.areas_to_improve.is_empty() {
        println!("\nAreas to improve:");
        for area in &insights.areas_to_improve {
            println!("  {}: {}", area.topic, area.reason);
            for resource in &area.resources {
                println!("    - {resource}");
            }
        }
    }
    if !insights.suggested_concepts.is_empty() {
        println!("\nSuggested concepts:");
        for concept in &insights.suggested_concepts {
            println!("  {}: {} ({})", concept.name, concept.description, concept.relevance);
        }
    }
}

pub fn run_sessions_list(settings: &Settings) -> Result<()> {
    let store = SessionStore::with_dir(settings.data_dir())?;
    let sessions = store.sessions()?;
    if sessions.is_empty() {
        println!("No sessions recorded yet.");
        return Ok(());
    }
    for session in sessions {
        println!(
            "{}  {}  {:<12} {:>5}s  {} turns",
            session.id,
            session.timestamp.format("%Y-%m-%d %H:%M"),
            session.language,
            session.duration,
            session.transcript.len()
        );
    }
    Ok(())
}

pub fn run_sessions_clear(settings: &Settings) -> Result<()> {
    let store = SessionStore::with_dir(settings.data_dir())?;
    store.clear()?;
    println!("Cleared saved sessions and cached insights.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_console_stops_at_stdin_error() {
        let api: Arc<dyn CodeBudApi> = Arc::new(ApiClient::new("http://127.0.0.1:9"));
        let (line_tx, lines) = mpsc::unbounded_channel();
        let (_event_tx, events) = mpsc::unbounded_channel();
        let (input_tx, mut input) = mpsc::unbounded_channel();

        line_tx.send(Ok("  explain this  ".to_string())).unwrap();
        line_tx
            .send(Err(io::Error::new(io::ErrorKind::InvalidData, "not utf-8")))
            .unwrap();
        line_tx.send(Ok("never read".to_string())).unwrap();

        run_console(api, lines, events, input_tx).await;

        assert_eq!(input.recv().await.as_deref(), Some("explain this"));
        assert!(input.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_console_quits_on_command() {
        let api: Arc<dyn CodeBudApi> = Arc::new(ApiClient::new("http://127.0.0.1:9"));
        let (line_tx, lines) = mpsc::unbounded_channel();
        let (event_tx, events) = mpsc::unbounded_channel();
        let (input_tx, mut input) = mpsc::unbounded_channel();

        event_tx.send(MonitorEvent::Connected).unwrap();
        line_tx.send(Ok("/quit".to_string())).unwrap();

        run_console(api, lines, events, input_tx).await;
        assert!(input.recv().await.is_none());
    }
}
