//! CLI entry point for the application registry.
//!
//! # Responsibility
//! - Run one registry operation per invocation against a SQLite file.
//! - Map service outcomes to deterministic exit codes.
//!
//! # Exit codes
//! - `0`: success
//! - `10`: invalid argument (bad identifier, path/body mismatch)
//! - `12`: not found
//! - `13`: conflict (identifier already taken)
//! - `1`: any other failure

mod cli;

use app_registry_core::AppServiceError;
use clap::Parser;
use cli::{Cli, Outcome};
use log::error;
use std::process::ExitCode;

const GENERIC_ERROR: u8 = 1;
const VALIDATION_ERROR: u8 = 10;
const NOT_FOUND: u8 = 12;
const CONFLICT: u8 = 13;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli::run(cli, &mut std::io::stdout().lock()) {
        Ok(Outcome::Printed) => ExitCode::SUCCESS,
        Ok(Outcome::Failed(err)) => {
            eprintln!("error ({}): {err}", err.status_code());
            ExitCode::from(exit_code_for(&err))
        }
        Err(err) => {
            error!("event=cli_failed module=cli status=error error={err:#}");
            eprintln!("error: {err:#}");
            ExitCode::from(GENERIC_ERROR)
        }
    }
}

fn exit_code_for(err: &AppServiceError) -> u8 {
    match err {
        AppServiceError::InvalidArgument(_) => VALIDATION_ERROR,
        AppServiceError::NotFound(_) => NOT_FOUND,
        AppServiceError::Conflict(_) => CONFLICT,
        AppServiceError::Repo(_) | AppServiceError::Mapping(_) => GENERIC_ERROR,
    }
}
