// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status taxonomies shared by the prober, the monitor, and the engine.

/// Outcome of a single JSON-RPC exchange over a control socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// A well-formed reply (or notification batch) was handled.
    Success,
    /// The control socket path could not be composed.
    UnixSocketNameError,
    /// Unexpected connect/send/recv failure.
    SocketError,
    /// The receive buffer filled up without a complete message.
    SystemError,
    /// Connect failed with a "peer not there" errno class.
    NoConnection,
    /// recv timed out, or the peer closed before a valid reply.
    ReceiveTimeout,
    /// The peer replied with something other than the expected response.
    ProtocolError,
    /// The peer answered the request with a non-null error member.
    ReturnedError,
    /// Orderly close on an established session.
    ConnectionClosed,
}

/// Liveness classification of a managed daemon, derived from pid lookup
/// plus one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonStatus {
    /// The daemon answered its control socket.
    Alive,
    /// The probe failed and the pid is gone; retriable.
    NoResponse,
    /// The probe failed but the pid still exists; kill and restart.
    NotAlive,
    /// No pid could be found at all.
    NoProcess,
    /// A platform failure prevented classification.
    SystemError,
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
