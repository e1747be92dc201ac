// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON-RPC plumbing for the ovsdb/unixctl control protocol.
//!
//! Wire format: bare JSON objects over a stream unix socket, no framing
//! bytes. Pipelined messages are separated by parsing one top-level
//! object at a time and sliding the receive buffer past its end offset.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod message;

pub use message::{parse_frame, Envelope, Field, MessageKind, RpcId};

/// Liveness probe request sent to a daemon's control socket.
///
/// Byte-exact: no trailing newline, no framing. Any well-formed response
/// with id 0 counts as proof of life, whatever its payload.
pub const LIST_COMMANDS_REQUEST: &[u8] = br#"{"id":0,"method":"list-commands","params":[]}"#;

/// Subscription request for controller connectivity changes.
///
/// Watches the single `is_connected` column of the `Controller` table;
/// the reply carries the initial snapshot, further changes arrive as
/// `update` notifications.
pub const MONITOR_REQUEST: &[u8] = br#"{"id":0,"method":"monitor","params":["Open_vSwitch",null,{"Controller":[{"columns":["is_connected"]}]}]}"#;
