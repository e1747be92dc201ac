// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon liveness probing.
//!
//! One `list-commands` round trip over the daemon's control socket. The
//! payload of the reply is irrelevant: any well-formed response with id 0
//! proves the daemon's RPC loop is serving, which is the only liveness
//! signal we trust.

use std::time::Duration;

use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

use og_adapters::{connect_unix, find_process, pid_from_file};
use og_core::{Config, DaemonStatus, QueryStatus, Target};
use og_jrpc::{parse_frame, LIST_COMMANDS_REQUEST};

/// Receive buffer size for one probe exchange.
const RESPONSE_BUFFER_SIZE: usize = 32 * 1024;

/// Compose the control socket path for `target`.
///
/// An absolute target is used verbatim; otherwise the per-process
/// convention `<run_dir>/<target>.<pid>.ctl` applies, which needs a
/// positive pid.
fn make_socket_path(conf: &Config, target: &str, pid: i32) -> Option<String> {
    if target.starts_with('/') {
        Some(target.to_string())
    } else if pid <= 0 {
        None
    } else {
        Some(format!("{}/{}.{}.ctl", conf.ovs_run_dir, target, pid))
    }
}

/// Resolve the pid of `name`: pid file first, process table second.
///
/// An absolute pid file path is used verbatim, a relative one is joined
/// with the run directory, an empty one defaults to
/// `<run_dir>/<name>.pid`. Returns 0 when nothing was found.
fn resolve_pid(conf: &Config, name: &str, pidfile: &str) -> i32 {
    let path = if pidfile.is_empty() {
        format!("{}/{}.pid", conf.ovs_run_dir, name)
    } else if pidfile.starts_with('/') {
        pidfile.to_string()
    } else {
        format!("{}/{}", conf.ovs_run_dir, pidfile)
    };

    match pid_from_file(&path) {
        Ok(pid) if pid > 0 => pid,
        Ok(_) | Err(_) => {
            warn!("failed to get pid from pidfile for process \"{name}\"");
            find_process(name).unwrap_or(0)
        }
    }
}

/// Whether a pid still names a live process (null signal check).
fn pid_exists(pid: i32) -> bool {
    !matches!(kill(Pid::from_raw(pid), None), Err(Errno::ESRCH))
}

/// Issue one `list-commands` request to `target`'s control socket and
/// wait for a well-formed reply.
pub async fn query_daemon(conf: &Config, target: &str, pid: i32) -> QueryStatus {
    let Some(socket_path) = make_socket_path(conf, target, pid) else {
        error!("failed to get unix socket name for \"{target}\"");
        return QueryStatus::UnixSocketNameError;
    };

    debug!("got unix socket name {socket_path} for \"{target}\"");

    let mut stream = match connect_unix(&socket_path).await {
        Ok(stream) => stream,
        Err(err) => {
            error!("failed to connect to unix socket {socket_path}: {err}");
            return if err.is_no_connection() {
                QueryStatus::NoConnection
            } else {
                QueryStatus::SocketError
            };
        }
    };

    if let Err(err) = stream.write_all(LIST_COMMANDS_REQUEST).await {
        error!("failed to send a request: {err}");
        return QueryStatus::SocketError;
    }

    debug!("sent a request: {}", String::from_utf8_lossy(LIST_COMMANDS_REQUEST));

    let timeout = Duration::from_millis(conf.receive_timeout);
    let mut buffer = vec![0u8; RESPONSE_BUFFER_SIZE];
    let mut total = 0usize;

    loop {
        let read = match tokio::time::timeout(timeout, stream.read(&mut buffer[total..])).await {
            Err(_elapsed) => {
                debug!("recv timed out after {total} bytes");
                return QueryStatus::ReceiveTimeout;
            }
            Ok(Err(err)) => {
                debug!("recv failed: {err}");
                return QueryStatus::SocketError;
            }
            Ok(Ok(0)) => {
                debug!("connection closed after {total} bytes");
                return QueryStatus::ReceiveTimeout;
            }
            Ok(Ok(read)) => read,
        };

        debug!("received {read} bytes");
        total += read;

        if let Some((envelope, _)) = parse_frame(&buffer[..total]) {
            if envelope.is_response_to(0) {
                debug!("received valid response in {total} bytes");
                return QueryStatus::Success;
            }
        }

        if total == buffer.len() {
            // no space left to receive data
            return QueryStatus::SystemError;
        }
    }
}

/// Classify the liveness of a supervised daemon.
///
/// Resolves the pid, probes the control socket, and refines a failed
/// probe with a null-signal test: a vanished pid is `NoResponse`
/// (retriable), a live but unreachable one is `NotAlive` (kill and
/// restart). Returns the resolved pid alongside the status.
pub async fn daemon_status(conf: &Config, target: &Target<'_>) -> (DaemonStatus, i32) {
    info!("checking process \"{}\"...", target.name);

    let pid = resolve_pid(conf, target.name, target.pidfile);
    if pid <= 0 {
        error!("failed to find pid by name for process \"{}\"", target.name);
        return (DaemonStatus::NoProcess, pid);
    }

    debug!("found process \"{}\" with pid: {pid}", target.name);

    match query_daemon(conf, target.name, pid).await {
        QueryStatus::Success => {
            info!("process \"{}\" is alive", target.name);
            (DaemonStatus::Alive, pid)
        }
        QueryStatus::ReceiveTimeout | QueryStatus::NoConnection => {
            if !pid_exists(pid) {
                warn!("process \"{}\" is not responding", target.name);
                (DaemonStatus::NoResponse, pid)
            } else {
                error!("process \"{}\" is not alive", target.name);
                (DaemonStatus::NotAlive, pid)
            }
        }
        _ => (DaemonStatus::SystemError, pid),
    }
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
