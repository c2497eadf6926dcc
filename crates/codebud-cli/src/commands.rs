use codebud_core::Mode;

/// Requested mode transition, from the `mode` subcommand or `/mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeChange {
    Set(Mode),
    Toggle,
}

impl ModeChange {
    /// The mode to request given the one currently reported by the API.
    pub fn resolve(&self, current: Mode) -> Mode {
        match self {
            ModeChange::Set(mode) => *mode,
            ModeChange::Toggle => current.toggled(),
        }
    }
}

pub fn parse_mode_change(arg: &str) -> Option<ModeChange> {
    match arg.trim() {
        "toggle" => Some(ModeChange::Toggle),
        other => other.parse::<Mode>().ok().map(ModeChange::Set),
    }
}

/// Result of processing a line typed during `codebud monitor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Display a message to the user.
    Message(String),
    /// End the session and quit.
    Quit,
    /// Switch the editor mode.
    SwitchMode(ModeChange),
    /// Show connection and mode.
    ShowStatus,
    /// Show the last context summary the monitor saw.
    ShowContext,
    /// Not a command: send it to the assistant.
    NotACommand,
}

pub fn handle_command(input: &str) -> CommandResult {
    let input = input.trim();
    if !input.starts_with('/') {
        return CommandResult::NotACommand;
    }

    let (cmd, arg) = match input.split_once(' ') {
        Some((cmd, arg)) => (cmd, arg.trim()),
        None => (input, ""),
    };

    match cmd {
        "/help" | "/h" => show_help(),
        "/exit" | "/quit" | "/q" => CommandResult::Quit,
        "/status" => CommandResult::ShowStatus,
        "/context" => CommandResult::ShowContext,
        "/mode" => {
            if arg.is_empty() {
                return CommandResult::SwitchMode(ModeChange::Toggle);
            }
            match parse_mode_change(arg) {
                Some(change) => CommandResult::SwitchMode(change),
                None => CommandResult::Message(
                    "Unknown mode. Usage: /mode <driver|navigator|toggle>".into(),
                ),
            }
        }
        "/driver" => CommandResult::SwitchMode(ModeChange::Set(Mode::Driver)),
        "/navigator" => CommandResult::SwitchMode(ModeChange::Set(Mode::Navigator)),
        _ => CommandResult::Message(format!(
            "Unknown command: {cmd}. Type /help for available commands."
        )),
    }
}

fn show_help() -> CommandResult {
    CommandResult::Message(
        "CodeBud Monitor Commands:
  /help, /h          Show this help
  /mode [m]          Switch to driver, navigator, or toggle (default)
  /driver            Let the assistant edit your code
  /navigator         Assistant observes and advises only
  /status            Show connection and mode
  /context           Show the last context the monitor saw
  /quit, /q          End the session

Anything else is sent to the assistant."
            .into(),
    )
}
