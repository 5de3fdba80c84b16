//! # mgw CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mgw_cli::presignup::{run_presignup, PresignupArgs};
use mgw_cli::render::{run_render, RenderArgs};
use mgw_cli::token::{run_token, TokenArgs};
use mgw_cli::validate::{run_validate, ValidateArgs};

/// Developer tooling for the mock gateway.
#[derive(Parser, Debug)]
#[command(name = "mgw", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load and validate a gateway configuration.
    Validate(ValidateArgs),

    /// Evaluate a mapping template against a JSON context.
    Render(RenderArgs),

    /// Mint an HS256 development credential.
    Token(TokenArgs),

    /// Run the pre-sign-up hook on an event.
    Presignup(PresignupArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut out = std::io::stdout().lock();
    let result = match cli.command {
        Commands::Validate(args) => run_validate(&args, &mut out),
        Commands::Render(args) => run_render(&args, &mut out),
        Commands::Token(args) => run_token(&args, &mut out),
        Commands::Presignup(args) => run_presignup(&args, &mut std::io::stdin().lock(), &mut out),
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
