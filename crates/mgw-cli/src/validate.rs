//! # Validate Subcommand
//!
//! Runs every load-time check the server runs, without binding a port.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use mgw_synth::Gateway;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Gateway configuration file.
    #[arg(long, env = "MGW_CONFIG")]
    pub config: PathBuf,
}

pub fn run_validate(args: &ValidateArgs, out: &mut dyn Write) -> Result<u8> {
    let gateway = match Gateway::load(&args.config) {
        Ok(gateway) => gateway,
        Err(e) => {
            writeln!(out, "FAIL: {e}")?;
            return Ok(1);
        }
    };

    writeln!(out, "OK: {}", args.config.display())?;
    writeln!(out, "Scopes ({}):", gateway.registry().len())?;
    for grant in gateway.registry().grants() {
        writeln!(out, "  {}", grant.canonical())?;
    }
    writeln!(out, "Operations ({}):", gateway.operations().len())?;
    for op in gateway.operations() {
        let scopes: Vec<&str> = op.required_scopes.iter().map(|s| s.as_str()).collect();
        let statuses: Vec<String> = op
            .integration_responses
            .keys()
            .map(u16::to_string)
            .collect();
        writeln!(
            out,
            "  {:<7} {:<24} {} [{}] -> {}",
            op.method,
            op.resource,
            op.name,
            scopes.join(" "),
            statuses.join(",")
        )?;
    }
    Ok(0)
}
