//! # GUID Subcommand
//!
//! Prints the deterministic GUID of an assertion. Works offline: a URL is
//! hashed as given, and a token is decoded but not verified.

use anyhow::Result;
use clap::Args;
use serde_json::json;

use badge_verify::assertion_guid;

use crate::{print_json, read_input};

/// Arguments for the `badgecheck guid` subcommand.
#[derive(Args, Debug)]
pub struct GuidArgs {
    /// Hosted assertion URL, 1.x assertion JSON, compact JWS, or `@path`.
    #[arg(value_name = "INPUT")]
    pub input: String,
}

/// Execute the guid subcommand.
pub fn run_guid(args: &GuidArgs) -> Result<u8> {
    let input = read_input(&args.input)?;
    match assertion_guid(&input) {
        Ok(guid) => {
            println!("{guid}");
            Ok(0)
        }
        Err(err) => {
            print_json(&json!({"error": err}))?;
            Ok(1)
        }
    }
}
