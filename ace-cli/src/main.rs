//! ACE CLI: offline evaluation and prompt rendering for the PATENTMATCH adapter.

mod commands;

use ace_core::AceConfig;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// ACE: PATENTMATCH task adapter tooling
#[derive(Parser, Debug)]
#[command(name = "ace", version, about, long_about = None)]
struct Cli {
    /// Workspace directory (reads `.ace/config.toml` from here)
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Configuration file path (replaces the layered lookup)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum Commands {
    /// Evaluate recorded generator answers from a JSONL file
    Evaluate {
        /// JSONL file with one sample + answer per line
        file: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Render a PATENTMATCH prompt template
    Prompt {
        /// Role: generator, reflector or curator
        role: ace_patent::PromptRole,
        /// JSON file holding one sample (claim, paragraph, context, ...)
        #[arg(short, long)]
        sample: Option<PathBuf>,
        /// Text file with the current playbook
        #[arg(short, long)]
        playbook: Option<PathBuf>,
    },
    /// Print the effective configuration as TOML
    Config,
}

fn init_tracing(cli: &Cli, config: &AceConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = match cli.verbose {
        0 if cli.quiet => "error".to_string(),
        0 => config.logging.level.clone(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    // Human-readable layer for stderr (always active)
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    // JSON file layer for structured logging
    let (json_layer, guard) = if config.logging.json_file {
        let log_dir = config.logging.log_dir.clone().unwrap_or_else(|| {
            directories::ProjectDirs::from("dev", "ace", "ace")
                .map(|d| d.data_dir().join("logs"))
                .unwrap_or_else(|| PathBuf::from("."))
        });
        let _ = std::fs::create_dir_all(&log_dir);
        let file_appender = tracing_appender::rolling::daily(&log_dir, "ace.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(non_blocking)
            .with_filter(EnvFilter::new("debug"));
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();
    guard
}

/// Where the effective configuration came from.
fn config_source(explicit: Option<&Path>, workspace: &Path) -> &'static str {
    if explicit.is_some() {
        "file"
    } else if ace_core::config::config_exists(Some(workspace)) {
        "layered"
    } else {
        "defaults"
    }
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let config = match &cli.config {
        Some(path) => ace_core::config::load_config_file(path)?,
        None => ace_core::load_config(Some(&workspace), None)
            .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?,
    };
    config.evaluation.validate()?;

    let _guard = init_tracing(&cli, &config);
    tracing::debug!(
        workspace = %workspace.display(),
        source = config_source(cli.config.as_deref(), &workspace),
        "Starting"
    );

    commands::handle_command(cli.command, &config)
}
