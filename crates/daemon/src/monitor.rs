// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Controller connectivity monitor.
//!
//! A persistent `monitor` subscription on the database's notification
//! socket. The reply to the subscription carries the initial snapshot;
//! every subsequent change arrives as an `update` notification.
//! Notifications are pipelined: the receive buffer is drained one framed
//! object at a time with an in-place slide, so a burst of updates is
//! handled in a single read callback without reallocation.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;
use tracing::{debug, error};

use og_adapters::connect_unix;
use og_core::{Config, QueryStatus};
use og_jrpc::{parse_frame, Envelope, MONITOR_REQUEST};

/// Receive buffer capacity of a monitor session.
const MONITOR_BUFFER_SIZE: usize = 32 * 1024;

/// Invoked when every controller reports `is_connected == false`.
///
/// Called at most once per notification frame, from the engine's thread,
/// so it serializes with check cycles.
#[async_trait]
pub trait DisconnectHandler {
    async fn on_disconnect(&mut self);
}

/// A live subscription to controller connectivity changes.
#[derive(Debug)]
pub struct MonitorSession {
    stream: UnixStream,
    buf: Box<[u8]>,
    len: usize,
}

impl MonitorSession {
    /// Connect to the database's notification socket and subscribe.
    ///
    /// The configured receive timeout applies only to this handshake;
    /// afterwards the engine blocks on socket readiness with no timeout.
    /// The initial snapshot in the reply is fed through `handler` before
    /// this returns, as are any notifications already buffered behind it.
    pub async fn create<H>(conf: &Config, handler: &mut H) -> Result<Self, QueryStatus>
    where
        H: DisconnectHandler + Send,
    {
        let mut stream = match connect_unix(&conf.ovs_unixsock_db).await {
            Ok(stream) => stream,
            Err(err) => {
                error!("failed to connect to unix socket {}: {err}", conf.ovs_unixsock_db);
                return Err(if err.is_no_connection() {
                    QueryStatus::NoConnection
                } else {
                    QueryStatus::SocketError
                });
            }
        };

        if let Err(err) = stream.write_all(MONITOR_REQUEST).await {
            error!("failed to send a request: {err}");
            return Err(QueryStatus::SocketError);
        }

        debug!("sent a request: {}", String::from_utf8_lossy(MONITOR_REQUEST));

        let timeout = Duration::from_millis(conf.receive_timeout);
        let mut session =
            Self { stream, buf: vec![0u8; MONITOR_BUFFER_SIZE].into_boxed_slice(), len: 0 };

        loop {
            let space = &mut session.buf[session.len..];
            let read = match tokio::time::timeout(timeout, session.stream.read(space)).await {
                Err(_elapsed) => {
                    debug!("recv timed out during monitor handshake");
                    return Err(QueryStatus::ReceiveTimeout);
                }
                Ok(Err(err)) => {
                    debug!("recv failed: {err}");
                    return Err(QueryStatus::SocketError);
                }
                Ok(Ok(0)) => {
                    debug!("connection closed during monitor handshake");
                    return Err(QueryStatus::ReceiveTimeout);
                }
                Ok(Ok(read)) => read,
            };

            debug!("received {read} bytes");
            session.len += read;

            if let Some((envelope, end)) = parse_frame(&session.buf[..session.len]) {
                if !envelope.is_response_to(0) {
                    return Err(QueryStatus::ProtocolError);
                }

                let mut status = QueryStatus::Success;
                if let Some(result) = envelope.result.value() {
                    // the initial snapshot rides in the reply body
                    handle_changes(result, handler).await;
                } else if envelope.error.value().is_some() {
                    status = QueryStatus::ReturnedError;
                }

                // keep whatever arrived behind the reply
                session.buf.copy_within(end..session.len, 0);
                session.len -= end;
                session.drain_notifications(handler).await;

                return match status {
                    QueryStatus::Success => Ok(session),
                    status => Err(status),
                };
            }

            if session.len == session.buf.len() {
                // no space left to receive data
                return Err(QueryStatus::SystemError);
            }
        }
    }

    /// Read callback: append received bytes and drain complete frames.
    ///
    /// Any return other than `Success` is a signal to the engine to
    /// destroy the session and reopen it after a back-off.
    pub async fn read_once<H>(&mut self, handler: &mut H) -> QueryStatus
    where
        H: DisconnectHandler + Send,
    {
        let space = &mut self.buf[self.len..];
        let read = match self.stream.read(space).await {
            Ok(0) => {
                debug!("connection closed");
                return QueryStatus::ConnectionClosed;
            }
            Ok(read) => read,
            Err(err) => {
                debug!("recv failed: {err}");
                return QueryStatus::SocketError;
            }
        };

        debug!("received {read} bytes");
        self.len += read;

        self.drain_notifications(handler).await;

        if self.len == self.buf.len() {
            // a full buffer that no longer parses can never make progress
            return QueryStatus::SystemError;
        }

        QueryStatus::Success
    }

    /// Wait until the monitor socket is readable.
    ///
    /// Consumes nothing, so the engine can race it against the check
    /// timer and invoke [`MonitorSession::read_once`] only for the
    /// winner.
    pub async fn readable(&self) -> std::io::Result<()> {
        self.stream.readable().await
    }

    /// Bytes currently pending in the receive buffer.
    pub fn buffered(&self) -> usize {
        self.len
    }

    /// Parse framed objects from the buffer start until one fails
    /// (incomplete frame) or the buffer is empty, sliding the buffer
    /// past each consumed frame.
    async fn drain_notifications<H>(&mut self, handler: &mut H)
    where
        H: DisconnectHandler + Send,
    {
        debug!("monitor buffer size: {}", self.len);

        while self.len > 0 {
            let Some((envelope, end)) = parse_frame(&self.buf[..self.len]) else {
                break;
            };

            if envelope.is_update() {
                if let Some(changes) = notification_changes(&envelope) {
                    handle_changes(changes, handler).await;
                }
            }

            self.buf.copy_within(end..self.len, 0);
            self.len -= end;

            debug!("monitor buffer size: {}", self.len);
        }
    }
}

/// The row-change object of an `update` notification: the second element
/// of a `params` array of size >= 2.
fn notification_changes(envelope: &Envelope) -> Option<&Value> {
    let params = envelope.params.value()?.as_array()?;
    if params.len() < 2 {
        return None;
    }
    Some(&params[1])
}

/// Walk the `Controller` rows of a change object and fire the handler
/// once if any row reports a new `is_connected == false`.
///
/// Only `"new"` deltas count: a row that merely reports its previous
/// state (`"old"`) does not signal disconnection. The first matching row
/// wins; further rows in the same frame are coalesced.
async fn handle_changes<H>(changes: &Value, handler: &mut H)
where
    H: DisconnectHandler + Send,
{
    let Some(rows) = changes.get("Controller").and_then(Value::as_object) else {
        return;
    };

    for row in rows.values() {
        let Some(delta) = row.as_object() else {
            return;
        };
        if delta.is_empty() {
            return;
        }

        let Some(fields) = delta.get("new").and_then(Value::as_object) else {
            continue;
        };

        if fields.get("is_connected").and_then(Value::as_bool) == Some(false) {
            debug!("found controller is_connected == false");
            handler.on_disconnect().await;
            return;
        }
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
