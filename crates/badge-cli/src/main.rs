//! # badgecheck CLI entry point
//!
//! Parses command-line arguments, installs logging, and dispatches to
//! subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use badge_cli::guid::{run_guid, GuidArgs};
use badge_cli::validate::{run_validate, ValidateArgs};

/// badgecheck: Open Badges assertion validator.
///
/// Validates hosted and signed badge assertions (0.5.0, 1.0.0, 1.1.0),
/// including their linked badge class, issuer, resources and extensions.
#[derive(Parser, Debug)]
#[command(name = "badgecheck", version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging. Repeat for more (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Write logs to stderr as JSON lines.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate an assertion and print the report.
    Validate(ValidateArgs),

    /// Print the GUID of an assertion without validating it.
    Guid(GuidArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });
    let logs = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.json {
        logs.json().init();
    } else {
        logs.init();
    }

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "badgecheck starting");

    let result = match cli.command {
        Commands::Validate(args) => run_validate(&args).await,
        Commands::Guid(args) => run_guid(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}
