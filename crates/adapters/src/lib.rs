// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! og-adapters: platform plumbing for the ovsguard supervisor.
//!
//! Everything that touches the host lives here: pid discovery, unix
//! socket connection, process spawning, hook commands, and the host
//! reboot of last resort.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod process;
pub mod socket;
pub mod system;

pub use process::{
    find_process, pid_from_file, run_hook, spawn_from_command, PidFileError, SpawnError,
};
pub use socket::{connect_unix, ConnectError};
pub use system::reboot_host;
