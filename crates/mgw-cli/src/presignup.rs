//! # Presignup Subcommand
//!
//! Feeds an identity-provider pre-sign-up event through the bootstrap hook
//! and prints the completed event.

use std::io::{Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use mgw_auth::bootstrap::{self, PreSignUpEvent};

#[derive(Args, Debug)]
pub struct PresignupArgs {
    /// Event file. Reads standard input when omitted.
    #[arg(long)]
    pub event: Option<PathBuf>,
}

pub fn run_presignup(args: &PresignupArgs, input: &mut dyn Read, out: &mut dyn Write) -> Result<u8> {
    let text = match &args.event {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut text = String::new();
            input.read_to_string(&mut text).context("reading standard input")?;
            text
        }
    };
    let event: PreSignUpEvent =
        serde_json::from_str(&text).context("parsing pre-sign-up event")?;
    let decided = bootstrap::decide(event);
    writeln!(out, "{}", serde_json::to_string_pretty(&decided)?)?;
    Ok(0)
}
