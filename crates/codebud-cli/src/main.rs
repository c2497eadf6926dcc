use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use codebud_cli::{app, parse_mode_change};
use codebud_core::config::LlmProvider;
use codebud_core::Settings;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "codebud")]
#[command(about = "CodeBud - a pair programmer that watches you type")]
#[command(version)]
struct Cli {
    /// Local API port
    #[arg(long, global = true)]
    port: Option<u16>,

    /// LLM model to use
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// LLM provider (ollama, openai, lmstudio, none)
    #[arg(long, global = true)]
    provider: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the local API server
    Serve {
        /// File to open and keep in sync with disk
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Watch the editor and talk to the assistant
    Monitor,
    /// Switch mode: driver, navigator or toggle
    Mode { mode: String },
    /// Show whether the API is up and its mode
    Status {
        /// Keep probing and report changes
        #[arg(short, long)]
        watch: bool,
    },
    /// Coaching insights from past sessions
    Insights {
        /// Ignore the cache and analyze again
        #[arg(long)]
        refresh: bool,
        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage saved sessions
    Sessions {
        #[command(subcommand)]
        action: SessionsAction,
    },
}

#[derive(Subcommand)]
enum SessionsAction {
    /// List saved sessions
    List,
    /// Delete saved sessions and cached insights
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::load();
    if let Some(port) = cli.port {
        settings.api.port = port;
    }
    if let Some(ref model) = cli.model {
        settings.llm.model = model.clone();
    }
    if let Some(ref provider) = cli.provider {
        settings.llm.provider = match provider.as_str() {
            "ollama" => LlmProvider::Ollama,
            "openai" => LlmProvider::OpenAI,
            "lmstudio" => LlmProvider::LmStudio,
            "none" => LlmProvider::None,
            other => bail!("Unknown provider: {other}"),
        };
    }

    match cli.command {
        Command::Serve { file } => app::run_serve(&settings, file.as_deref()).await?,
        Command::Monitor => app::run_monitor(&settings).await?,
        Command::Mode { mode } => {
            let Some(change) = parse_mode_change(&mode) else {
                bail!(r#"Invalid mode "{mode}". Use driver, navigator or toggle."#);
            };
            app::run_mode(&settings, change).await?;
        }
        Command::Status { watch } => app::run_status(&settings, watch).await?,
        Command::Insights { refresh, json } => {
            app::run_insights(&settings, refresh, json).await?
        }
        Command::Sessions { action } => match action {
            SessionsAction::List => app::run_sessions_list(&settings)?,
            SessionsAction::Clear => app::run_sessions_clear(&settings)?,
        },
    }

    Ok(())
}
