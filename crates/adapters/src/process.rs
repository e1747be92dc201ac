// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process discovery and spawning.

use std::path::Path;
use std::process::Stdio;

use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::debug;

/// Hard cap on the number of tokens in a spawn command line.
pub const MAX_COMMAND_ARGS: usize = 16;

/// Rolling buffer size for hook command output.
const HOOK_OUTPUT_SIZE: usize = 4096;

/// Pid file read errors
#[derive(Debug, Error)]
pub enum PidFileError {
    #[error("failed to read \"{path}\": {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode pid from \"{path}\"")]
    Decode { path: String },
}

/// Spawn errors
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("empty command line")]
    EmptyCommand,

    #[error("too many arguments in command (> {MAX_COMMAND_ARGS}): {0}")]
    TooManyArgs(String),

    #[error("failed to spawn process: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Read a pid from a text file: the first whitespace-terminated decimal
/// integer.
pub fn pid_from_file(path: impl AsRef<Path>) -> Result<i32, PidFileError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| PidFileError::Read {
        path: path.display().to_string(),
        source,
    })?;

    text.split_whitespace()
        .next()
        .and_then(|token| token.parse().ok())
        .ok_or_else(|| PidFileError::Decode { path: path.display().to_string() })
}

/// Scan the process table for an executable name.
///
/// Walks the numeric entries of `/proc`, reads each command line, and
/// compares its first token (cut at the first NUL or space) to `name`.
/// Returns the first matching pid.
pub fn find_process(name: &str) -> Option<i32> {
    let entries = std::fs::read_dir("/proc").ok()?;

    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let Some(pid) = file_name.to_str().and_then(|s| s.parse::<i32>().ok()) else {
            continue;
        };

        let Ok(cmdline) = std::fs::read(format!("/proc/{pid}/cmdline")) else {
            continue;
        };

        let first = cmdline.split(|b| *b == 0 || *b == b' ').next().unwrap_or_default();
        if first == name.as_bytes() {
            return Some(pid);
        }
    }

    None
}

/// Split a command line on spaces, capped at [`MAX_COMMAND_ARGS`] tokens.
fn tokenize(command_line: &str) -> Result<Vec<&str>, SpawnError> {
    let mut tokens = command_line.split(' ').filter(|t| !t.is_empty());

    let argv: Vec<&str> = tokens.by_ref().take(MAX_COMMAND_ARGS).collect();
    if argv.is_empty() {
        return Err(SpawnError::EmptyCommand);
    }
    if tokens.next().is_some() {
        return Err(SpawnError::TooManyArgs(command_line.to_string()));
    }

    Ok(argv)
}

/// Spawn a daemon from a configured command line, fire-and-forget.
///
/// A bare first token is resolved through `$PATH`. The child gets no
/// supervisor descriptors (stdio is detached and every other descriptor
/// is close-on-exec) and is never awaited here; a background task reaps
/// it once it exits. Managed daemons are expected to detach themselves,
/// so the direct child is short-lived.
pub fn spawn_from_command(command_line: &str) -> Result<(), SpawnError> {
    let argv = tokenize(command_line)?;
    for (index, arg) in argv.iter().enumerate() {
        debug!("-- arg[{index}] = {arg}");
    }

    let mut command = Command::new(argv[0]);
    command
        .args(&argv[1..])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    let mut child = command.spawn().map_err(SpawnError::Spawn)?;
    debug!(pid = child.id(), "forked a child process");

    tokio::spawn(async move {
        let _ = child.wait().await;
    });

    Ok(())
}

/// Run a hook command through the shell and wait for it to finish.
///
/// Stdout is drained through a rolling 4 KiB buffer and logged at debug
/// level; the command's exit status is returned.
pub async fn run_hook(command_line: &str) -> std::io::Result<std::process::ExitStatus> {
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command_line)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .spawn()?;

    if let Some(mut stdout) = child.stdout.take() {
        let mut chunk = [0u8; HOOK_OUTPUT_SIZE - 1];
        loop {
            let count = stdout.read(&mut chunk).await?;
            if count == 0 {
                break;
            }
            debug!("-- {}", String::from_utf8_lossy(&chunk[..count]));
        }
    }

    child.wait().await
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
