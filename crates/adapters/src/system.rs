// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host reboot, the escalation of last resort.

use nix::sys::reboot::{reboot, RebootMode};
use nix::unistd::{setuid, sync, Uid};
use tracing::error;

/// Flush filesystems and reboot the host.
///
/// Attempts to re-acquire root first; the reboot syscall requires it and
/// the supervisor may have been started with dropped privileges.
pub fn reboot_host() -> Result<(), nix::errno::Errno> {
    sync();

    if let Err(errno) = setuid(Uid::from_raw(0)) {
        error!("failed to setuid: {errno}");
    }

    reboot(RebootMode::RB_AUTOBOOT).map(|_| ())
}
