//! MultiMind - Main Entry Point
//!
//! Loads configuration and credentials, builds the providers once, and runs
//! the interactive session on stdin/stdout.

use clap::{Parser, Subcommand};
use multimind::config::{RouterConfig, DEFAULT_CONFIG_PATHS};
use multimind::observability::init_default_logging;
use multimind::session::run_session;
use multimind::StartupResult;
use std::path::{Path, PathBuf};
use std::process;
use tokio::io::BufReader;
use tracing::{error, info};

/// Routes each line you type to a chat, code or image model
#[derive(Parser)]
#[command(name = "multimind")]
#[command(about = "Single-turn request router for text, code and image generation")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive session (default)
    Run,
    /// Validate configuration
    Config {
        /// Show the effective configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    init_default_logging(cli.verbose);

    info!("Starting MultiMind v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_configuration(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_router(&config).await,
        Commands::Config { show } => handle_config_command(&config, show),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

fn load_configuration(config_path: Option<&Path>) -> StartupResult<RouterConfig> {
    if let Some(path) = config_path {
        info!("Loading configuration from: {}", path.display());
        return Ok(RouterConfig::load_from_file(path)?);
    }

    for path_str in DEFAULT_CONFIG_PATHS {
        let path = Path::new(path_str);
        if path.exists() {
            info!("Loading configuration from: {}", path.display());
            return Ok(RouterConfig::load_from_file(path)?);
        }
    }

    info!("No configuration file found, using built-in defaults");
    Ok(RouterConfig::default())
}

async fn run_router(config: &RouterConfig) -> StartupResult<()> {
    let router = config.build_router()?;

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let summary = run_session(&router, stdin, &mut stdout).await?;

    info!(
        "Session ended after {} requests ({} failed)",
        summary.requests_routed, summary.requests_failed
    );
    Ok(())
}

fn handle_config_command(config: &RouterConfig, show: bool) -> StartupResult<()> {
    if show {
        println!("{}", config.to_toml_string()?);
    }

    info!("Configuration validation complete");
    Ok(())
}
