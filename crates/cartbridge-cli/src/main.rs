//! Cartbridge CLI - Command-line interface for store data migrations
//!
//! This is the main entry point for the Cartbridge CLI application, providing
//! commands for running and checking field-mapping rule sets and for
//! simulating webhook ingestion end to end.

mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod output;

use clap::ValueEnum;
use cli::{Cli, Commands, OutputFormat};
use colored::control;
use config::Config;
use error::Result;
use logging::{timing::Timer, LoggingConfig};
use output::OutputWriter;
use std::process;
use tracing::{instrument, Instrument};
use tracing_appender::non_blocking::WorkerGuard;

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse_args();

    // Configuration feeds logging, so it is loaded first
    let config = match Config::load_with_file(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", error::format_error(&e, cli.use_color()));
            process::exit(e.exit_code());
        }
    };

    // Set up colored output
    control::set_override(cli.use_color() && config.output.color);

    // Initialize logging; the guard flushes file output on exit
    let guard = match init_logging(&cli, &config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            None
        }
    };

    // Run the application
    let result = run(cli, config).instrument(logging::run_span()).await;

    // Handle the result
    match result {
        Ok(()) => drop(guard),
        Err(e) => {
            eprintln!(
                "{}",
                error::format_error(&e, control::SHOULD_COLORIZE.should_colorize())
            );

            if e.should_show_help() {
                eprintln!("\nFor more information, try '--help'");
            }

            drop(guard);
            process::exit(e.exit_code());
        }
    }
}

/// Main application logic
#[instrument(skip(cli, config), fields(command = ?cli.command))]
async fn run(cli: Cli, config: Config) -> Result<()> {
    let _timer = Timer::new("cli_execution");

    let use_color = control::SHOULD_COLORIZE.should_colorize();
    let mut output = OutputWriter::new(resolve_output_format(&cli, &config), use_color, cli.quiet);

    tracing::info!(
        verbosity = cli.verbosity_level(),
        format = ?output.format(),
        "Executing command"
    );

    // Handle the subcommand
    match cli.command {
        Commands::Transform(args) => handlers::handle_transform(args, &config, &mut output).await,
        Commands::Validate(args) => handlers::handle_validate(args, &config, &mut output).await,
        Commands::Defaults(args) => handlers::handle_defaults(args, &mut output).await,
        Commands::Ingest(args) => handlers::handle_ingest(args, &config, &mut output).await,
        Commands::Config(args) => {
            handlers::handle_config(args, &config, cli.config.as_deref(), &mut output).await
        }
        Commands::Completions(args) => handlers::handle_completions(args),
    }
}

/// Output format from the flag, falling back to `output.format` in the config
///
/// The config's `pretty` switch turns plain JSON into pretty JSON.
fn resolve_output_format(cli: &Cli, config: &Config) -> OutputFormat {
    let format = if cli.output == OutputFormat::Human {
        OutputFormat::from_str(&config.output.format, true).unwrap_or(OutputFormat::Human)
    } else {
        cli.output
    };

    match format {
        OutputFormat::Json if config.output.pretty => OutputFormat::JsonPretty,
        other => other,
    }
}

/// Initialize the logging system
fn init_logging(cli: &Cli, config: &Config) -> Result<Option<WorkerGuard>> {
    // Create logging configuration from CLI args, config file and environment
    let mut logging_config = LoggingConfig::from_verbosity(cli.verbosity_level());
    logging_config.merge_with_file(&config.logging, cli.verbosity_level());
    logging_config.merge_with_env();

    // If quiet mode, only log errors
    if cli.quiet {
        logging_config.level = "error".to_string();
        logging_config.console = false;
    }

    logging::init_logging(logging_config)
}
