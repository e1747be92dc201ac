// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! og-daemon: the ovsguard supervision engine.
//!
//! Architecture:
//! - Prober: one `list-commands` round trip per daemon as a liveness oracle
//! - Monitor: persistent subscription to controller-connectivity changes
//! - Engine: single-threaded loop multiplexing the check tick, the
//!   monitor socket, and SIGINT; owns the counters and the reboot policy

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod cli;
pub mod engine;
pub mod logging;
pub mod monitor;
pub mod probe;

pub use cli::{parse_args, Cli, CliError, CliOptions};
pub use engine::{DisconnectCommand, Engine, EngineError};
pub use logging::LogOptions;
pub use monitor::{DisconnectHandler, MonitorSession};
