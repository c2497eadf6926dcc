// Library interface for codebud-cli, so integration tests can reach the
// command parser.

pub mod app;
pub mod commands;

pub use commands::{handle_command, parse_mode_change, CommandResult, ModeChange};
