use super::api::CodeBudApi;
use super::messages::{context_summary, review_label, review_message};
use crate::constants::monitor::{PAUSE_THRESHOLD_SECS, POLL_INTERVAL_MS, RECENT_ACTIVITY_SECS};
use crate::context::CodeContext;
use crate::error::Result;
use crate::session::ConversationSession;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::time::MissedTickBehavior;

/// Everything the monitor does, reported to whoever is watching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    Connected,
    Disconnected(String),
    /// Channel 1: ambient summary for the session.
    ContextUpdate(String),
    /// Channel 2: the user paused after typing.
    Review {
        line: usize,
        message: String,
        label: String,
    },
    Reply(String),
    SessionError(String),
}

/// Poll-driven two-channel client state. `observe` is pure over its inputs;
/// `tick` and `run` add the I/O.
#[derive(Debug)]
pub struct CodeMonitor {
    poll_interval: Duration,
    pause_threshold_secs: i64,
    review_fired: bool,
    connected: bool,
    last_error: Option<String>,
    last_context: Option<CodeContext>,
}

impl CodeMonitor {
    pub fn new() -> Self {
        Self {
            poll_interval: Duration::from_millis(POLL_INTERVAL_MS),
            pause_threshold_secs: PAUSE_THRESHOLD_SECS,
            review_fired: false,
            connected: false,
            last_error: None,
            last_context: None,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_pause_threshold(mut self, seconds: i64) -> Self {
        self.pause_threshold_secs = seconds;
        self
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_context(&self) -> Option<&CodeContext> {
        self.last_context.as_ref()
    }

    /// Folds one poll result into the state and returns what should happen.
    pub fn observe(&mut self, poll: Result<CodeContext>) -> Vec<MonitorEvent> {
        let mut events = Vec::new();

        let context = match poll {
            Ok(context) => context,
            Err(e) => {
                let error = e.to_string();
                if self.connected || self.last_error.as_deref() != Some(error.as_str()) {
                    events.push(MonitorEvent::Disconnected(error.clone()));
                }
                self.connected = false;
                self.last_error = Some(error);
                return events;
            }
        };

        if !self.connected {
            events.push(MonitorEvent::Connected);
        }
        self.connected = true;
        self.last_error = None;

        events.push(MonitorEvent::ContextUpdate(context_summary(&context)));

        let seconds = context.seconds_since_last_change;
        let recent_activity = (0..RECENT_ACTIVITY_SECS).contains(&seconds);
        if !context.is_typing
            && recent_activity
            && seconds >= self.pause_threshold_secs
            && !self.review_fired
        {
            self.review_fired = true;
            events.push(MonitorEvent::Review {
                line: context.cursor_line,
                message: review_message(&context),
                label: review_label(&context),
            });
        }

        if context.is_typing {
            self.review_fired = false;
        }

        self.last_context = Some(context);
        events
    }

    /// Polls once and feeds the outcome to `session`. Nothing is polled
    /// while the session is inactive.
    pub async fn tick(
        &mut self,
        api: &dyn CodeBudApi,
        session: &mut dyn ConversationSession,
    ) -> Vec<MonitorEvent> {
        if !session.is_active() {
            return Vec::new();
        }

        let mut events = self.observe(api.context().await);
        let mut extra = Vec::new();

        for event in &events {
            let outcome = match event {
                MonitorEvent::ContextUpdate(summary) => {
                    session.send_contextual_update(summary).await.map(|_| None)
                }
                MonitorEvent::Review { message, label, .. } => {
                    session.send_user_message(message, Some(label)).await
                }
                _ => Ok(None),
            };

            match outcome {
                Ok(Some(reply)) => extra.push(MonitorEvent::Reply(reply)),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Session rejected monitor update");
                    extra.push(MonitorEvent::SessionError(e.to_string()));
                }
            }
        }

        events.extend(extra);
        events
    }

    /// Ticks on a fixed interval and hands typed `input` to `session` until
    /// `shutdown` resolves. Failed polls are never retried early.
    pub async fn run(
        &mut self,
        api: &dyn CodeBudApi,
        session: &mut dyn ConversationSession,
        mut input: UnboundedReceiver<String>,
        events: UnboundedSender<MonitorEvent>,
        shutdown: impl Future<Output = ()>,
    ) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        tracing::info!(
            interval_ms = self.poll_interval.as_millis() as u64,
            pause_threshold = self.pause_threshold_secs,
            "Monitor started"
        );

        let emit = |event: MonitorEvent| {
            if events.send(event).is_err() {
                tracing::debug!("Monitor event receiver dropped");
            }
        };

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = interval.tick() => {
                    for event in self.tick(api, session).await {
                        if let MonitorEvent::Disconnected(ref error) = event {
                            tracing::warn!(error = %error, "Lost connection to CodeBud API");
                        }
                        emit(event);
                    }
                }
                Some(text) = input.recv() => {
                    match session.send_user_message(&text, None).await {
                        Ok(Some(reply)) => emit(MonitorEvent::Reply(reply)),
                        Ok(None) => {}
                        Err(e) => emit(MonitorEvent::SessionError(e.to_string())),
                    }
                }
            }
        }

        tracing::info!("Monitor stopped");
    }
}

impl Default for CodeMonitor {
    fn default() -> Self {
        Self::new()
    }
}
