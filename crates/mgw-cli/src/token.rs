//! # Token Subcommand
//!
//! Mints an HS256 bearer credential for local testing. Production credentials
//! come from the identity provider; this only exists so a developer can call
//! a running gateway configured with a shared secret.

use std::io::Write;

use anyhow::{bail, Context, Result};
use clap::Args;
use jsonwebtoken::{encode, get_current_timestamp, EncodingKey, Header};
use serde_json::{json, Map, Value};

#[derive(Args, Debug)]
pub struct TokenArgs {
    /// Environment variable holding the HMAC secret.
    #[arg(long, default_value = "MGW_JWT_SECRET")]
    pub secret_env: String,

    /// Granted scope as `resourceServer/scope`. Repeatable.
    #[arg(long = "scope", required = true)]
    pub scopes: Vec<String>,

    #[arg(long, default_value = "dev-user")]
    pub sub: String,

    /// Lifetime in seconds.
    #[arg(long, default_value_t = 3600)]
    pub ttl_secs: u64,

    #[arg(long)]
    pub issuer: Option<String>,

    #[arg(long)]
    pub client_id: Option<String>,

    /// `token_use` claim, e.g. `access`.
    #[arg(long)]
    pub token_use: Option<String>,

    /// Key id placed in the header.
    #[arg(long)]
    pub kid: Option<String>,
}

pub fn run_token(args: &TokenArgs, out: &mut dyn Write) -> Result<u8> {
    let secret = std::env::var(&args.secret_env)
        .with_context(|| format!("environment variable {} is not set", args.secret_env))?;
    let token = mint(args, secret.as_bytes(), get_current_timestamp())?;
    writeln!(out, "{token}")?;
    Ok(0)
}

/// Build and sign the credential. `now` is seconds since the epoch.
pub fn mint(args: &TokenArgs, secret: &[u8], now: u64) -> Result<String> {
    if secret.is_empty() {
        bail!("the HMAC secret is empty");
    }
    if let Some(bad) = args.scopes.iter().find(|s| !s.contains('/')) {
        bail!("scope {bad:?} must be written as resourceServer/scope");
    }

    let mut claims = Map::new();
    claims.insert("sub".into(), json!(args.sub));
    claims.insert("iat".into(), json!(now));
    claims.insert("exp".into(), json!(now + args.ttl_secs));
    claims.insert("scope".into(), json!(args.scopes.join(" ")));
    let optional = [
        ("iss", &args.issuer),
        ("client_id", &args.client_id),
        ("token_use", &args.token_use),
    ];
    for (name, value) in optional {
        if let Some(value) = value {
            claims.insert(name.into(), json!(value));
        }
    }

    let mut header = Header::default();
    header.kid = args.kid.clone();
    encode(&header, &Value::Object(claims), &EncodingKey::from_secret(secret))
        .context("signing credential")
}
