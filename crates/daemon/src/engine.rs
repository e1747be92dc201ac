// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The supervision engine.
//!
//! A single-threaded loop over two wait sources: the repeating check
//! timer and, when a session exists, the monitor socket. Counters are
//! plain fields; nothing here crosses a thread boundary, so the whole
//! state machine reads sequentially.

use std::time::Duration;

use async_trait::async_trait;
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use thiserror::Error;
use tokio::signal::unix::{signal, SignalKind};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use og_adapters::{reboot_host, run_hook, spawn_from_command};
use og_core::{Config, DaemonStatus, QueryStatus, Stats, Target};

use crate::monitor::{DisconnectHandler, MonitorSession};
use crate::probe;

/// Pause before reopening a failed monitor session.
const RECONNECT_BACKOFF: Duration = Duration::from_secs(1);

/// Engine startup errors
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to install signal handler: {0}")]
    Signal(#[from] std::io::Error),
}

/// What woke the engine loop.
enum Wake {
    Interrupted,
    Tick,
    Monitor,
}

/// The operator-supplied recovery command, run when every controller
/// reports disconnected. An empty command is a no-op.
pub struct DisconnectCommand {
    command: String,
}

impl DisconnectCommand {
    pub fn new(command: String) -> Self {
        Self { command }
    }
}

#[async_trait]
impl DisconnectHandler for DisconnectCommand {
    async fn on_disconnect(&mut self) {
        warn!("received disconnect notification");

        if self.command.is_empty() {
            return;
        }

        match run_hook(&self.command).await {
            Ok(status) => {
                warn!("invoked disconnect command \"{}\"", self.command);
                if !status.success() {
                    error!("disconnect command \"{}\" exited with {status}", self.command);
                }
            }
            Err(err) => {
                error!("failed to invoke disconnect command \"{}\": {err}", self.command);
            }
        }
    }
}

/// The supervision engine: configuration, counters, and the monitor
/// session, driven by [`Engine::run`].
pub struct Engine {
    conf: Config,
    stats: Stats,
    hook: DisconnectCommand,
    monitor: Option<MonitorSession>,
}

impl Engine {
    pub fn new(conf: Config) -> Self {
        let hook = DisconnectCommand::new(conf.ovs_cmd_disconnect.clone());
        Self { conf, stats: Stats::new(), hook, monitor: None }
    }

    /// Current counter values.
    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// Run the event loop until SIGINT.
    pub async fn run(&mut self) -> Result<(), EngineError> {
        let mut sigint = signal(SignalKind::interrupt())?;
        // Registering replaces the default terminate disposition; the
        // stream itself is never polled. Children are reaped by the
        // runtime, so SIGCHLD needs no handler of its own.
        let _sighup = signal(SignalKind::hangup())?;

        let period = Duration::from_millis(self.conf.check_interval.max(1));
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("created timer with {} msec interval", self.conf.check_interval);

        loop {
            if self.monitor.is_none() {
                match MonitorSession::create(&self.conf, &mut self.hook).await {
                    Ok(session) => {
                        info!("created ovsdb monitor");
                        self.monitor = Some(session);
                    }
                    Err(status) => error!("failed to create ovsdb monitor: {status:?}"),
                }
            }

            let wake = tokio::select! {
                _ = sigint.recv() => Wake::Interrupted,
                _ = ticker.tick() => Wake::Tick,
                _ = Self::monitor_readable(&self.monitor), if self.monitor.is_some() => {
                    Wake::Monitor
                }
            };

            match wake {
                Wake::Interrupted => {
                    warn!("received SIGINT");
                    break;
                }
                Wake::Tick => {
                    debug!("-- timer");
                    self.check_cycle().await;
                }
                Wake::Monitor => {
                    debug!("-- ovsdb monitor event");
                    let status = match self.monitor.as_mut() {
                        Some(session) => session.read_once(&mut self.hook).await,
                        None => QueryStatus::Success,
                    };
                    if status != QueryStatus::Success {
                        tokio::time::sleep(RECONNECT_BACKOFF).await;
                        warn!("destroying ovsdb monitor");
                        self.monitor = None;
                    }
                }
            }

            self.check_reboot().await;
        }

        Ok(())
    }

    /// Resolves only while a session exists; the `if` guard on the
    /// select arm covers the `None` case.
    async fn monitor_readable(monitor: &Option<MonitorSession>) {
        match monitor {
            Some(session) => {
                let _ = session.readable().await;
            }
            None => std::future::pending().await,
        }
    }

    /// One check cycle: database daemon first, then the switch. A
    /// freshly restarted switch should find its database already back.
    pub async fn check_cycle(&mut self) {
        Self::check_daemon(&self.conf, &mut self.stats, self.conf.db_target()).await;
        Self::check_daemon(&self.conf, &mut self.stats, self.conf.switch_target()).await;
    }

    /// Check one target and act on the outcome.
    ///
    /// `NoResponse` is the only retriable status. A target that is
    /// `NotAlive` is killed first; kill refusal (EINVAL/EPERM) counts as
    /// a failure and suppresses the spawn, because respawning over a
    /// live but unreachable process would race on the pid. Every other
    /// non-alive outcome falls through to the spawn.
    async fn check_daemon(conf: &Config, stats: &mut Stats, target: Target<'_>) {
        let total = if conf.request_retries <= 0 { 1 } else { conf.request_retries };

        let mut status = DaemonStatus::SystemError;
        let mut pid = 0;
        let mut remaining = total;
        while remaining > 0 {
            (status, pid) = probe::daemon_status(conf, &target).await;
            if status == DaemonStatus::Alive {
                return;
            }
            if status != DaemonStatus::NoResponse {
                break;
            }

            warn!("check attempt {} of {} has failed - retrying", total - remaining + 1, total);
            remaining -= 1;
        }

        if status == DaemonStatus::NotAlive {
            warn!("trying to kill the process \"{}\" with pid {pid}", target.name);
            match kill(Pid::from_raw(pid), Signal::SIGKILL) {
                Err(errno @ (Errno::EINVAL | Errno::EPERM)) => {
                    error!("failed to kill process \"{}\" with pid {pid}: {errno}", target.name);
                    stats.record_failure();
                    return;
                }
                Err(_) => {
                    // ESRCH and friends: the process is already gone
                }
                Ok(()) => {
                    warn!("killed the process \"{}\" with pid {pid}", target.name);
                    stats.record_kill();
                }
            }
        }

        if let Err(err) = spawn_from_command(target.spawn_cmd) {
            error!("failed to spawn a process for \"{}\": {err}", target.name);
            stats.record_failure();
        } else {
            info!("spawned a new process from command: {}", target.spawn_cmd);
            stats.record_restart();
        }
    }

    /// Whether the counters have crossed a configured threshold.
    ///
    /// Strictly greater than: a threshold of N permits exactly N events
    /// before escalation. A threshold of 0 disables that arm.
    pub fn reboot_due(&self) -> bool {
        let conf = &self.conf;
        (conf.restarts_before_reboot > 0 && self.stats.restarts_count > conf.restarts_before_reboot)
            || (conf.failures_before_reboot > 0
                && self.stats.failures_count > conf.failures_before_reboot)
    }

    /// Evaluate the reboot predicate and escalate if it holds.
    pub async fn check_reboot(&self) {
        if !self.reboot_due() {
            return;
        }

        let conf = &self.conf;
        info!(
            "restarts count: {} (max: {})",
            self.stats.restarts_count, conf.restarts_before_reboot
        );
        info!(
            "failures count: {} (max: {})",
            self.stats.failures_count, conf.failures_before_reboot
        );
        warn!("rebooting the system...");

        if conf.ovs_cmd_reboot.is_empty() {
            if let Err(errno) = reboot_host() {
                error!("failed to reboot the system: {errno}");
            }
            return;
        }

        warn!("invoking reboot command \"{}\"", conf.ovs_cmd_reboot);
        match run_hook(&conf.ovs_cmd_reboot).await {
            Ok(status) if !status.success() => {
                error!("reboot command \"{}\" exited with {status}", conf.ovs_cmd_reboot);
            }
            Ok(_) => {}
            Err(err) => {
                error!("failed to invoke reboot command \"{}\": {err}", conf.ovs_cmd_reboot);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn stats_mut(&mut self) -> &mut Stats {
        &mut self.stats
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
