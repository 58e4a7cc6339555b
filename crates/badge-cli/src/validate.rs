//! # Validate Subcommand
//!
//! Runs the verification pipeline over one input and prints either the
//! report or the failure as JSON.

use anyhow::{Context, Result};
use clap::Args;

use badge_core::{SchemeKind, SpecVersion};
use badge_verify::{Validator, ValidatorConfig};

use crate::{print_json, read_input, FetchArgs};

/// Arguments for the `badgecheck validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Assertion URL, JSON document, compact JWS, or `@path` to read one from a file.
    #[arg(value_name = "INPUT")]
    pub input: String,

    /// Reject assertions of any other version (0.5.0, 1.0.0, 1.1.0).
    #[arg(long, value_name = "VERSION")]
    pub expect_version: Option<SpecVersion>,

    /// Reject assertions using the other verification scheme (hosted, signed).
    #[arg(long, value_name = "SCHEME")]
    pub expect_scheme: Option<SchemeKind>,

    #[command(flatten)]
    pub fetch: FetchArgs,
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 when the assertion is valid, 1 when it is not.
/// Operational failures (unreadable input file, bad HTTP settings) are
/// returned as errors.
pub async fn run_validate(args: &ValidateArgs) -> Result<u8> {
    let input = read_input(&args.input)?;
    let validator = Validator::new(ValidatorConfig {
        fetch: args.fetch.to_config(),
        ..ValidatorConfig::default()
    })
    .context("failed to build HTTP client")?;

    match validator.validate(&input, args.expect_version, args.expect_scheme).await {
        Ok(report) => {
            print_json(&report)?;
            Ok(0)
        }
        Err(err) => {
            tracing::debug!(code = %err.code(), "validation failed");
            print_json(&err)?;
            Ok(1)
        }
    }
}
