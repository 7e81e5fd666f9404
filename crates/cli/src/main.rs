//! navcheck CLI - Main Entry Point
//!
//! Verifies that navigation links in a web application lead to the
//! expected routes, driving a real browser through Playwright.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use navcheck::config::{NavcheckConfig, DEFAULT_CONFIG_FILE};

mod commands;
mod output;

use commands::{init_config, list, run, validate};
use output::print_error;

/// navcheck - click-then-assert navigation checks
#[derive(Parser)]
#[command(name = "navcheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run navigation scenarios against the application
    Run(run::RunArgs),

    /// List scenarios
    List(list::ListArgs),

    /// Check scenario files for errors
    Validate(validate::ValidateArgs),

    /// Write a default configuration file
    InitConfig(init_config::InitConfigArgs),
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            print_error(&format!("Failed to create tokio runtime: {}", e));
            std::process::exit(2);
        }
    };

    match rt.block_on(async_main(cli)) {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            print_error(&format!("{:#}", e));
            std::process::exit(2);
        }
    }
}

/// Returns whether the command succeeded
async fn async_main(cli: Cli) -> anyhow::Result<bool> {
    let config = NavcheckConfig::load(&cli.config)?;

    match cli.command {
        Commands::Run(args) => run::execute(args, config, cli.format).await,
        Commands::List(args) => {
            list::execute(args, &config, cli.format)?;
            Ok(true)
        }
        Commands::Validate(args) => validate::execute(args, &config),
        Commands::InitConfig(args) => {
            init_config::execute(args)?;
            Ok(true)
        }
    }
}
