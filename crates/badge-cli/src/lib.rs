//! # badge-cli: badgecheck Command-Line Interface
//!
//! Provides the `badgecheck` binary.
//!
//! ## Subcommands
//!
//! - `badgecheck validate`: Run the full verification pipeline and print
//!   the report.
//! - `badgecheck guid`: Compute an assertion's GUID without validating it.
//!
//! ```bash
//! badgecheck validate https://issuer.example.org/assertions/123.json
//! badgecheck validate @signed.jws --expect-scheme signed
//! badgecheck guid @assertion.json
//! ```
//!
//! ## Crate Policy
//!
//! - Argument parsing lives here; verification lives in `badge-verify`.
//! - Reports and failures are printed to stdout as pretty JSON.
//! - Exit codes: 0 valid, 1 invalid, 2 operational error.

pub mod guid;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use serde_json::Value;

use badge_fetch::config::{DEFAULT_MAX_REDIRECTS, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use badge_fetch::FetchConfig;

/// HTTP settings shared by subcommands that touch the network.
#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// Per-request timeout in seconds.
    #[arg(long, env = "BADGECHECK_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Redirects followed before a request fails.
    #[arg(long, env = "BADGECHECK_MAX_REDIRECTS", default_value_t = DEFAULT_MAX_REDIRECTS)]
    pub max_redirects: usize,

    /// Override the User-Agent header.
    #[arg(long, env = "BADGECHECK_USER_AGENT")]
    pub user_agent: Option<String>,
}

impl FetchArgs {
    pub fn to_config(&self) -> FetchConfig {
        FetchConfig {
            timeout_secs: self.timeout_secs,
            max_redirects: self.max_redirects,
            user_agent: self
                .user_agent
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        }
    }
}

/// Resolve an `INPUT` argument to the value handed to the verifier.
///
/// `@path` reads the input from a file. Text that parses as a JSON object
/// becomes that object; anything else (URL, compact JWS, garbage) is passed
/// through as a trimmed string.
pub fn read_input(arg: &str) -> Result<Value> {
    let text = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(Path::new(path))
            .with_context(|| format!("failed to read input file {path}"))?,
        None => arg.to_string(),
    };
    Ok(parse_input(&text))
}

pub fn parse_input(text: &str) -> Value {
    let trimmed = text.trim();
    match serde_json::from_str::<Value>(trimmed) {
        Ok(obj @ Value::Object(_)) => obj,
        _ => Value::String(trimmed.to_string()),
    }
}

/// Print a value as pretty JSON on stdout.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_text_becomes_object() {
        assert_eq!(parse_input(r#" {"uid": "abc"} "#), json!({"uid": "abc"}));
    }

    #[test]
    fn other_text_stays_a_string() {
        assert_eq!(parse_input(" https://x.org/a.json\n"), json!("https://x.org/a.json"));
        assert_eq!(parse_input("a.b.c"), json!("a.b.c"));
        assert_eq!(parse_input("[1, 2]"), json!("[1, 2]"));
        assert_eq!(parse_input(r#""quoted""#), json!(r#""quoted""#));
    }

    #[test]
    fn at_prefix_reads_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assertion.json");
        std::fs::write(&path, r#"{"uid": "from-file"}"#).unwrap();
        let value = read_input(&format!("@{}", path.display())).unwrap();
        assert_eq!(value["uid"], "from-file");
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(read_input("@/definitely/not/here.json").is_err());
    }

    #[test]
    fn fetch_args_fill_default_user_agent() {
        let args = FetchArgs { timeout_secs: 3, max_redirects: 0, user_agent: None };
        let config = args.to_config();
        assert_eq!(config.timeout_secs, 3);
        assert_eq!(config.max_redirects, 0);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }
}
