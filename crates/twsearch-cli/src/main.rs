//! twsearch CLI - fetch tweets from the search API into CSV or JSON
//!
//! This is the main entry point for the twsearch command, providing
//! commands for searching, fetching single tweets, and inspecting rate
//! limits and resume markers.

mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod output;

use cli::{Cli, Commands};
use colored::control;
use config::Config;
use error::Result;
use logging::redaction;
use logging::LoggingConfig;
use output::OutputWriter;
use std::process;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

#[tokio::main]
async fn main() {
    // Credentials may come from a .env file
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();

    control::set_override(cli.use_color());

    let _log_guard = match init_logging(&cli) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            None
        }
    };

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping");
            on_interrupt.cancel();
        }
    });

    match run(cli, cancel).await {
        Ok(()) => {}
        Err(e) => {
            eprintln!("{}", error::format_error(&e, control::SHOULD_COLORIZE.should_colorize()));
            drop(_log_guard);
            process::exit(e.exit_code());
        }
    }
}

/// Main application logic
#[instrument(skip_all, fields(run_id = logging::current_run_id()))]
async fn run(cli: Cli, cancel: CancellationToken) -> Result<()> {
    let config = Config::load_with_file(cli.config.as_deref())?;
    if let Ok(mut shown) = serde_json::to_value(&config) {
        redaction::redact_json_value(&mut shown);
        tracing::debug!(config = %shown, "Configuration loaded");
    }

    let mut output = OutputWriter::new(cli.use_color(), cli.quiet);

    tracing::info!(command = ?cli.command, verbosity = cli.verbosity_level(), "Executing command");

    match cli.command {
        Commands::Search(args) => handlers::handle_search(args, &config, &mut output, cancel).await,
        Commands::Show(args) => handlers::handle_show(args, &config, &mut output, cancel).await,
        Commands::Limits(args) => handlers::handle_limits(args, &config, &mut output).await,
        Commands::Resume(args) => handlers::handle_resume(args, &config, &mut output),
        Commands::Completions(args) => handlers::handle_completions(args),
    }
}

/// Initialize the logging system
fn init_logging(cli: &Cli) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let mut logging_config = LoggingConfig::from_verbosity(cli.verbosity_level());
    logging_config.merge_with_env(|key| std::env::var(key).ok());
    logging_config.ansi = cli.use_color();

    if cli.quiet {
        logging_config.level = "error".to_string();
    }

    logging::init_logging(logging_config)
}
