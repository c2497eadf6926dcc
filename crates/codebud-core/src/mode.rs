use crate::error::CodebudError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// The assistant may edit the document.
    Driver,
    /// The assistant only observes and advises.
    #[default]
    Navigator,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Driver => "driver",
            Mode::Navigator => "navigator",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Mode::Driver => "Driver",
            Mode::Navigator => "Navigator",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Mode::Driver => "AI can now modify your code",
            Mode::Navigator => "AI will observe and advise only",
        }
    }

    pub fn toggled(&self) -> Mode {
        match self {
            Mode::Driver => Mode::Navigator,
            Mode::Navigator => Mode::Driver,
        }
    }

    pub fn can_edit(&self) -> bool {
        matches!(self, Mode::Driver)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = CodebudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "driver" => Ok(Mode::Driver),
            "navigator" => Ok(Mode::Navigator),
            _ => Err(CodebudError::invalid_params(
                r#"Invalid mode: must be "driver" or "navigator""#,
            )),
        }
    }
}

/// Visible surface that reflects the current mode (status bar item, prompt
/// segment, ...) and shows notifications.
pub trait ModeIndicator: Send + Sync {
    fn show(&self, mode: Mode);
    fn notify(&self, message: &str);
}

/// Indicator that reports through the log.
#[derive(Debug, Default)]
pub struct LogIndicator;

impl ModeIndicator for LogIndicator {
    fn show(&self, mode: Mode) {
        let text = match mode {
            Mode::Navigator => "NAVIGATOR",
            Mode::Driver => "DRIVER",
        };
        tracing::debug!(indicator = text, "Mode indicator updated");
    }

    fn notify(&self, message: &str) {
        tracing::info!("{message}");
    }
}

pub struct ModeState {
    current: Mode,
    indicator: Box<dyn ModeIndicator>,
}

impl ModeState {
    pub fn new(indicator: Box<dyn ModeIndicator>) -> Self {
        let state = Self {
            current: Mode::default(),
            indicator,
        };
        state.indicator.show(state.current);
        state
    }

    pub fn mode(&self) -> Mode {
        self.current
    }

    /// Sets the mode and refreshes the indicator before returning. A
    /// notification is only shown when the mode actually changes.
    /// Returns whether it changed.
    pub fn set_mode(&mut self, mode: Mode) -> bool {
        let previous = self.current;
        self.current = mode;
        self.indicator.show(mode);

        if previous == mode {
            return false;
        }
        self.indicator.notify(&format!(
            "CodeBud: Switched to {} Mode - {}",
            mode.label(),
            mode.description()
        ));
        true
    }

    /// Wire-level variant: unknown values are rejected without touching state.
    pub fn set_mode_str(&mut self, value: &str) -> Result<Mode, CodebudError> {
        let mode: Mode = value.parse()?;
        self.set_mode(mode);
        Ok(self.current)
    }

    pub fn toggle(&mut self) -> Mode {
        self.set_mode(self.current.toggled());
        self.current
    }
}

impl Default for ModeState {
    fn default() -> Self {
        Self::new(Box::new(LogIndicator))
    }
}
