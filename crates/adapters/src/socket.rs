// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stream unix socket connection with errno classification.

use nix::errno::Errno;
use thiserror::Error;
use tokio::net::UnixStream;

/// Maximum usable `sun_path` length on Linux (108 bytes minus the NUL).
const UNIX_PATH_MAX: usize = 107;

/// Unix socket connect errors
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("no socket path configured")]
    NoAddress,

    #[error("socket path too long: \"{0}\"")]
    PathTooLong(String),

    #[error("connect failed: {0}")]
    Connect(#[source] std::io::Error),
}

impl ConnectError {
    /// Whether the failure means "peer not there" (retriable by
    /// restarting the peer) rather than a local fault.
    pub fn is_no_connection(&self) -> bool {
        match self {
            ConnectError::NoAddress => true,
            ConnectError::PathTooLong(_) => false,
            ConnectError::Connect(source) => matches!(
                source.raw_os_error().map(Errno::from_raw),
                Some(
                    Errno::ETIMEDOUT
                        | Errno::ENETUNREACH
                        | Errno::ECONNREFUSED
                        | Errno::EADDRNOTAVAIL
                )
            ),
        }
    }
}

/// Connect a stream unix socket at `path`.
pub async fn connect_unix(path: &str) -> Result<UnixStream, ConnectError> {
    if path.is_empty() {
        return Err(ConnectError::NoAddress);
    }
    if path.len() > UNIX_PATH_MAX {
        return Err(ConnectError::PathTooLong(path.to_string()));
    }

    UnixStream::connect(path).await.map_err(ConnectError::Connect)
}

#[cfg(test)]
#[path = "socket_tests.rs"]
mod tests;
