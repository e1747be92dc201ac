// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command line parsing for the `ogd` binary.
//!
//! Hand-rolled option loop; the surface is small enough that an argument
//! parser dependency would outweigh it.

use std::path::PathBuf;

use thiserror::Error;

use crate::logging::{LogOptions, MAX_LOG_FILE_SIZE, MAX_ROTATE_COUNT, MIN_LOG_FILE_SIZE};

/// Maximum length of the configuration file path.
pub const MAX_CONFIG_PATH: usize = 255;

/// Parsed command line
#[derive(Debug, PartialEq, Eq)]
pub enum Cli {
    /// `-h`: print usage and exit cleanly.
    Help,
    /// Run the supervisor with these options.
    Run(CliOptions),
}

/// Options accepted by the `ogd` binary
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CliOptions {
    /// `-c FILE`: configuration file to load over the defaults.
    pub config_path: Option<String>,
    /// Logging options (`-l`, `-f`, `-r`, `-m`, `-s`).
    pub log: LogOptions,
}

/// Argument errors; the caller prints usage and exits with code 2.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("missing value for option {0}")]
    MissingValue(&'static str),

    #[error("configuration file path is too long: \"{0}\"")]
    ConfigPathTooLong(String),

    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),

    #[error("invalid rotate file count value: {0}")]
    InvalidRotateCount(String),

    #[error("log file size limit is invalid: {0}")]
    InvalidSizeLimit(String),

    #[error("unexpected argument '{0}'")]
    UnexpectedArgument(String),
}

/// Parse the argument list (without the program name).
pub fn parse_args(args: impl Iterator<Item = String>) -> Result<Cli, CliError> {
    let mut args = args;
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" => return Ok(Cli::Help),
            "-c" => {
                let value = args.next().ok_or(CliError::MissingValue("-c"))?;
                if value.len() > MAX_CONFIG_PATH {
                    return Err(CliError::ConfigPathTooLong(value));
                }
                options.config_path = Some(value);
            }
            "-l" => {
                let value = args.next().ok_or(CliError::MissingValue("-l"))?;
                options.log.level = match value.parse() {
                    Ok(level @ 1..=4) => level,
                    _ => return Err(CliError::InvalidLogLevel(value)),
                };
            }
            "-f" => {
                let value = args.next().ok_or(CliError::MissingValue("-f"))?;
                options.log.file = Some(PathBuf::from(value));
            }
            "-r" => {
                let value = args.next().ok_or(CliError::MissingValue("-r"))?;
                options.log.rotate_count = match value.parse() {
                    Ok(count @ 1..=MAX_ROTATE_COUNT) => count,
                    _ => return Err(CliError::InvalidRotateCount(value)),
                };
            }
            "-m" => {
                let value = args.next().ok_or(CliError::MissingValue("-m"))?;
                options.log.size_limit = match value.parse() {
                    Ok(size @ MIN_LOG_FILE_SIZE..=MAX_LOG_FILE_SIZE) => size,
                    _ => return Err(CliError::InvalidSizeLimit(value)),
                };
            }
            "-s" => options.log.silent = true,
            other => return Err(CliError::UnexpectedArgument(other.to_string())),
        }
    }

    Ok(Cli::Run(options))
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
