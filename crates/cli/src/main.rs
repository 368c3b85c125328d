//! officechat CLI: the main entry point.
//!
//! Commands:
//! - `chat`: Interactive office chat (default)
//! - `ask`: Ask one agent a single question
//! - `models`: List known models
//! - `doctor`: Diagnose the Ollama backend and configuration

use clap::{Parser, Subcommand};
use officechat_config::AppConfig;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod printer;
mod setup;

#[derive(Parser)]
#[command(
    name = "officechat",
    about = "officechat — a chat room of specialist LLM agents",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (default: ~/.officechat/config.toml)
    #[arg(long, global = true, env = "OFFICECHAT_CONFIG")]
    config: Option<PathBuf>,

    /// Ollama model for every agent (overrides DEFAULT_MODEL and the config)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Log level when RUST_LOG is not set (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Skip the Ollama backend check
    #[arg(long, global = true)]
    skip_check: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the whole office
    Chat {
        /// Print whole replies instead of streaming direct asks
        #[arg(long)]
        no_streaming: bool,

        /// Give up waiting on a message's replies after this many seconds
        #[arg(long)]
        publish_timeout: Option<u64>,
    },

    /// Ask one agent directly
    Ask {
        /// Agent name (case-insensitive)
        agent: String,

        /// The question
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,

        /// Stream the answer as it is generated
        #[arg(long)]
        stream: bool,
    },

    /// List known models
    Models,

    /// Diagnose the backend and configuration
    Doctor,
}

/// Settings shared by every command.
pub struct RunContext {
    pub config: AppConfig,
    pub config_path: PathBuf,
    pub model: String,
    pub skip_check: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));
    let config = match AppConfig::load_with_env(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("  ❌ {e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&cli, &config);

    let ctx = RunContext {
        model: cli.model.clone().unwrap_or_else(|| config.default_model.clone()),
        config,
        config_path,
        skip_check: cli.skip_check,
    };

    let result = match cli.command.unwrap_or(Commands::Chat {
        no_streaming: false,
        publish_timeout: None,
    }) {
        Commands::Chat {
            no_streaming,
            publish_timeout,
        } => commands::chat::run(&ctx, !no_streaming, publish_timeout).await,
        Commands::Ask {
            agent,
            question,
            stream,
        } => commands::ask::run(&ctx, &agent, &question.join(" "), stream).await,
        Commands::Models => commands::models::run(&ctx).await,
        Commands::Doctor => commands::doctor::run(&ctx).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            eprintln!("  ❌ {e}");
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins; then `--verbose`, `--log-level`, the config's `log_level`.
/// Logs go to stderr so chat output on stdout stays readable.
fn init_tracing(cli: &Cli, config: &AppConfig) {
    let level = if cli.verbose {
        "debug".to_string()
    } else {
        cli.log_level
            .clone()
            .unwrap_or_else(|| config.log_level.clone())
            .to_lowercase()
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
