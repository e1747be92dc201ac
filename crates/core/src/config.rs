// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor configuration: defaults, `key = value` file loader, and
//! environment overrides.
//!
//! The configuration is built once at startup (defaults, then file, then
//! environment) and never mutated afterwards. An empty string means
//! "unset"; a threshold of 0 disables that escalation.

use std::path::Path;

use thiserror::Error;
use tracing::error;

/// Default run directory of the managed Open vSwitch installation.
pub const DEFAULT_RUN_DIR: &str = "/usr/local/var/run/openvswitch";

/// Default interval between check cycles, in milliseconds.
pub const DEFAULT_CHECK_INTERVAL_MS: u64 = 60_000;

/// Default receive timeout for control-socket exchanges, in milliseconds.
pub const DEFAULT_RECV_TIMEOUT_MS: u64 = 15_000;

/// Immutable supervisor configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding pid files and control sockets.
    pub ovs_run_dir: String,
    /// Executable name of the switch daemon.
    pub ovs_name_switch: String,
    /// Executable name of the database daemon.
    pub ovs_name_db: String,
    /// Explicit pid file for the switch daemon ("" = derive from name).
    pub ovs_pidfile_switch: String,
    /// Explicit pid file for the database daemon ("" = derive from name).
    pub ovs_pidfile_db: String,
    /// Accepted for compatibility; the probe path is always derived.
    pub ovs_unixctl_switch: String,
    /// Accepted for compatibility; the probe path is always derived.
    pub ovs_unixctl_db: String,
    /// Command line used to respawn the switch daemon.
    pub ovs_cmd_switch: String,
    /// Command line used to respawn the database daemon.
    pub ovs_cmd_db: String,
    /// Recovery command run when every controller disconnects ("" = none).
    pub ovs_cmd_disconnect: String,
    /// Command used instead of the platform reboot ("" = platform reboot).
    pub ovs_cmd_reboot: String,
    /// Path of the database notification socket ("" = monitor disabled).
    pub ovs_unixsock_db: String,
    /// Interval between check cycles, in milliseconds.
    pub check_interval: u64,
    /// Probe attempts per check before giving up; <= 0 is treated as 1.
    pub request_retries: i64,
    /// Receive timeout for control-socket exchanges, in milliseconds.
    pub receive_timeout: u64,
    /// Failures tolerated before rebooting the host; 0 disables.
    pub failures_before_reboot: u64,
    /// Restarts tolerated before rebooting the host; 0 disables.
    pub restarts_before_reboot: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ovs_run_dir: DEFAULT_RUN_DIR.to_string(),
            ovs_name_switch: "ovs-vswitchd".to_string(),
            ovs_name_db: "ovsdb-server".to_string(),
            ovs_pidfile_switch: String::new(),
            ovs_pidfile_db: String::new(),
            ovs_unixctl_switch: String::new(),
            ovs_unixctl_db: String::new(),
            ovs_cmd_switch: format!(
                "ovs-vswitchd unix:{run}/db.sock --log-file={run}/vswitchd.log \
                 --pidfile={run}/ovs-vswitchd.pid --detach",
                run = DEFAULT_RUN_DIR
            ),
            ovs_cmd_db: format!(
                "ovsdb-server {run}/conf.db --remote=punix:{run}/db.sock \
                 --log-file={run}/ovsdb.log --pidfile={run}/ovsdb-server.pid --detach",
                run = DEFAULT_RUN_DIR
            ),
            ovs_cmd_disconnect: String::new(),
            ovs_cmd_reboot: String::new(),
            ovs_unixsock_db: String::new(),
            check_interval: DEFAULT_CHECK_INTERVAL_MS,
            request_retries: 1,
            receive_timeout: DEFAULT_RECV_TIMEOUT_MS,
            failures_before_reboot: 0,
            restarts_before_reboot: 0,
        }
    }
}

/// One supervised daemon, viewed through the configuration.
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    /// Executable name, used for pid discovery, the control socket
    /// path, and log lines.
    pub name: &'a str,
    /// Explicit pid file ("" = `<run_dir>/<name>.pid`).
    pub pidfile: &'a str,
    /// Command line used to respawn the daemon.
    pub spawn_cmd: &'a str,
}

impl Config {
    /// The database daemon target. Checked first in every cycle: the
    /// switch cannot come up without its database.
    pub fn db_target(&self) -> Target<'_> {
        Target {
            name: &self.ovs_name_db,
            pidfile: &self.ovs_pidfile_db,
            spawn_cmd: &self.ovs_cmd_db,
        }
    }

    /// The switch daemon target.
    pub fn switch_target(&self) -> Target<'_> {
        Target {
            name: &self.ovs_name_switch,
            pidfile: &self.ovs_pidfile_switch,
            spawn_cmd: &self.ovs_cmd_switch,
        }
    }
}

/// Configuration load errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read \"{path}\": {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: expected `key = value`")]
    MalformedLine { line: usize },

    #[error("line {line}: invalid integer value for key \"{key}\"")]
    InvalidInteger { key: String, line: usize },
}

/// Known keys and their environment override names, in table order.
const ENV_KEYS: &[(&str, &str)] = &[
    ("ovs_run_dir", "CHANDLER_OVS_RUNDIR"),
    ("ovs_name_switch", "CHANDLER_NAME_SW"),
    ("ovs_name_db", "CHANDLER_NAME_DB"),
    ("ovs_pidfile_switch", "CHANDLER_PIDFILE_SW"),
    ("ovs_pidfile_db", "CHANDLER_PIDFILE_DB"),
    ("ovs_unixctl_switch", "CHANDLER_UNIXCTL_SW"),
    ("ovs_unixctl_db", "CHANDLER_UNIXCTL_DB"),
    ("ovs_cmd_switch", "CHANDLER_CMD_RUN_SW"),
    ("ovs_cmd_db", "CHANDLER_CMD_RUN_DB"),
    ("ovs_cmd_disconnect", "CHANDLER_CMD_DISCON"),
    ("ovs_cmd_reboot", "CHANDLER_CMD_REBOOT"),
    ("ovs_unixsock_db", "CHANDLER_UNIXSOCK_DB"),
    ("check_interval", "CHANDLER_CHECK_INTERVAL"),
    ("request_retries", "CHANDLER_REQ_RETRIES"),
    ("receive_timeout", "CHANDLER_RECV_TIMEOUT"),
    ("failures_before_reboot", "CHANDLER_FAILURES_TO_REBOOT"),
    ("restarts_before_reboot", "CHANDLER_RESTARTS_TO_REBOOT"),
];

impl Config {
    /// Load `key = value` lines from a file on top of the current values.
    ///
    /// Whitespace around `=` is trimmed. Unknown keys are ignored. A line
    /// without `=`, an empty key, an empty value, or a malformed integer
    /// aborts the load.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let (key, value) = split_key_value(raw).ok_or(ConfigError::MalformedLine { line })?;

            if self.apply(key, value).is_err() {
                error!("failed to read integer value for key \"{}\" from configuration", key);
                return Err(ConfigError::InvalidInteger { key: key.to_string(), line });
            }
        }

        Ok(())
    }

    /// Apply environment overrides (`CHANDLER_*`) for every known key.
    ///
    /// Unset or empty variables leave the current value in place. Malformed
    /// integer values are logged and ignored so a bad override cannot take
    /// the supervisor down.
    pub fn load_env(&mut self) {
        for (key, env_name) in ENV_KEYS {
            let Ok(value) = std::env::var(env_name) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }

            if self.apply(key, &value).is_err() {
                error!(
                    "failed to read integer value for key \"{}\" from environment variable \"{}\"",
                    key, env_name
                );
            }
        }
    }

    /// Apply one key/value pair. `Err(())` means the value failed to parse
    /// for an integer key; unknown keys are silently ignored.
    fn apply(&mut self, key: &str, value: &str) -> Result<(), ()> {
        match key {
            "ovs_run_dir" => self.ovs_run_dir = value.to_string(),
            "ovs_name_switch" => self.ovs_name_switch = value.to_string(),
            "ovs_name_db" => self.ovs_name_db = value.to_string(),
            "ovs_pidfile_switch" => self.ovs_pidfile_switch = value.to_string(),
            "ovs_pidfile_db" => self.ovs_pidfile_db = value.to_string(),
            "ovs_unixctl_switch" => self.ovs_unixctl_switch = value.to_string(),
            "ovs_unixctl_db" => self.ovs_unixctl_db = value.to_string(),
            "ovs_cmd_switch" => self.ovs_cmd_switch = value.to_string(),
            "ovs_cmd_db" => self.ovs_cmd_db = value.to_string(),
            "ovs_cmd_disconnect" => self.ovs_cmd_disconnect = value.to_string(),
            "ovs_cmd_reboot" => self.ovs_cmd_reboot = value.to_string(),
            "ovs_unixsock_db" => self.ovs_unixsock_db = value.to_string(),
            "check_interval" => self.check_interval = parse_int(value)?,
            "request_retries" => self.request_retries = parse_int(value)?,
            "receive_timeout" => self.receive_timeout = parse_int(value)?,
            "failures_before_reboot" => self.failures_before_reboot = parse_int(value)?,
            "restarts_before_reboot" => self.restarts_before_reboot = parse_int(value)?,
            _ => {}
        }

        Ok(())
    }
}

/// Strict base-10 integer parse into the target field type.
fn parse_int<T: std::str::FromStr>(value: &str) -> Result<T, ()> {
    value.parse().map_err(|_| ())
}

/// Split a configuration line into trimmed key and value parts.
///
/// Returns `None` when the line has no `=`, an empty key, or an empty
/// value.
fn split_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim_matches(' ');
    let value = value.trim_matches(' ').trim_end_matches(['\n', ' ']);

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
