//! End-to-end scenarios for the ovsguard supervisor.
//!
//! These tests drive the engine, the prober, and the monitor against
//! fake unixctl/ovsdb servers on throwaway unix sockets, plus the `ogd`
//! binary for CLI exit codes.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::path::Path;

use og_core::Config;
use og_daemon::{DisconnectCommand, Engine, MonitorSession};
use og_jrpc::MONITOR_REQUEST;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixListener;

const VALID_REPLY: &[u8] = br#"{"id":0,"result":"ok","error":null}"#;

const SNAPSHOT_CONNECTED: &[u8] =
    br#"{"id":0,"result":{"Controller":{"u1":{"new":{"is_connected":true}}}},"error":null}"#;

fn base_conf(run_dir: &Path) -> Config {
    Config {
        ovs_run_dir: run_dir.display().to_string(),
        ovs_cmd_db: "true".to_string(),
        ovs_cmd_switch: "true".to_string(),
        receive_timeout: 200,
        ..Config::default()
    }
}

/// Back a daemon with a pidfile and a control socket answering one probe.
fn back_daemon(run_dir: &Path, name: &str, pid: i32) {
    std::fs::write(run_dir.join(format!("{name}.pid")), format!("{pid}\n")).unwrap();
    let listener = UnixListener::bind(run_dir.join(format!("{name}.{pid}.ctl"))).unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 256];
        let _ = stream.read(&mut request).await.unwrap();
        stream.write_all(VALID_REPLY).await.unwrap();
    });
}

/// Same, but answering every probe for the test's lifetime.
fn back_daemon_forever(run_dir: &Path, name: &str, pid: i32) {
    std::fs::write(run_dir.join(format!("{name}.pid")), format!("{pid}\n")).unwrap();
    let listener = UnixListener::bind(run_dir.join(format!("{name}.{pid}.ctl"))).unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            let mut request = [0u8; 256];
            let _ = stream.read(&mut request).await.unwrap();
            stream.write_all(VALID_REPLY).await.unwrap();
        }
    });
}

/// Serve the monitor handshake; await the handle for the server-side
/// stream once the subscriber is connected.
fn serve_monitor(
    sock: &Path,
    reply: &'static [u8],
) -> tokio::task::JoinHandle<tokio::net::UnixStream> {
    let listener = UnixListener::bind(sock).unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut request = vec![0u8; 1024];
        let count = stream.read(&mut request).await.unwrap();
        assert_eq!(&request[..count], MONITOR_REQUEST);
        stream.write_all(reply).await.unwrap();
        stream
    })
}

mod liveness {
    use super::*;

    // Both daemons answer their control sockets; nothing is touched.
    #[tokio::test]
    async fn clean_liveness_mutates_no_counter() {
        let dir = tempfile::tempdir().unwrap();
        let conf = base_conf(dir.path());
        back_daemon(dir.path(), "ovsdb-server", 4242);
        back_daemon(dir.path(), "ovs-vswitchd", 4243);

        let mut engine = Engine::new(conf);
        engine.check_cycle().await;

        let stats = engine.stats();
        assert_eq!(stats.kills_count, 0);
        assert_eq!(stats.restarts_count, 0);
        assert_eq!(stats.failures_count, 0);
    }

    // No pidfile, no process: straight to spawn, no kill attempted.
    #[tokio::test]
    async fn dead_daemon_is_respawned() {
        let dir = tempfile::tempdir().unwrap();
        let mut conf = base_conf(dir.path());
        conf.ovs_name_db = "ovsguard-spec-absent".to_string();
        back_daemon(dir.path(), "ovs-vswitchd", 4243);

        let mut engine = Engine::new(conf);
        engine.check_cycle().await;

        let stats = engine.stats();
        assert_eq!(stats.restarts_count, 1);
        assert_eq!(stats.kills_count, 0);
        assert_eq!(stats.failures_count, 0);
        assert!(!engine.reboot_due());
    }

    // The pid lives but its socket never answers: kill, then respawn.
    #[tokio::test]
    async fn hung_daemon_is_killed_and_respawned() {
        let dir = tempfile::tempdir().unwrap();
        let mut conf = base_conf(dir.path());
        conf.receive_timeout = 100;
        conf.request_retries = 3;
        back_daemon(dir.path(), "ovs-vswitchd", 4243);

        let mut child = tokio::process::Command::new("sleep")
            .arg("300")
            .kill_on_drop(true)
            .spawn()
            .unwrap();
        let pid = child.id().unwrap() as i32;
        std::fs::write(dir.path().join("ovsdb-server.pid"), format!("{pid}\n")).unwrap();

        // accept and hold every probe connection without replying
        let listener =
            UnixListener::bind(dir.path().join(format!("ovsdb-server.{pid}.ctl"))).unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                held.push(stream);
            }
        });

        let mut engine = Engine::new(conf);
        engine.check_cycle().await;

        let stats = engine.stats();
        assert_eq!(stats.kills_count, 1);
        assert_eq!(stats.restarts_count, 1);
        assert_eq!(stats.failures_count, 0);

        // SIGKILL landed on the hung process
        let status = child.wait().await.unwrap();
        assert!(!status.success());
    }
}

mod disconnect {
    use super::*;

    // One notification with several disconnected rows: one invocation.
    #[tokio::test]
    async fn disconnect_command_fires_once_per_notification() {
        let dir = tempfile::tempdir().unwrap();
        let sock = dir.path().join("db.sock");
        let marker = dir.path().join("invocations");
        let mut conf = base_conf(dir.path());
        conf.ovs_unixsock_db = sock.display().to_string();
        conf.ovs_cmd_disconnect = format!("echo fired >> {}", marker.display());

        let server = serve_monitor(&sock, SNAPSHOT_CONNECTED);
        let mut hook = DisconnectCommand::new(conf.ovs_cmd_disconnect.clone());
        let mut session = MonitorSession::create(&conf, &mut hook).await.unwrap();
        let mut peer = server.await.unwrap();

        let notification = serde_json::json!({
            "id": null,
            "method": "update",
            "params": [null, {"Controller": {
                "u1": {"new": {"is_connected": false}},
                "u2": {"new": {"is_connected": false}},
            }}],
        });
        peer.write_all(notification.to_string().as_bytes()).await.unwrap();

        let status = session.read_once(&mut hook).await;
        assert_eq!(status, og_core::QueryStatus::Success);

        // both rows consumed, buffer empty, command invoked exactly once
        assert_eq!(session.buffered(), 0);
        let invocations = std::fs::read_to_string(&marker).unwrap();
        assert_eq!(invocations.lines().count(), 1);
    }

    // Two pipelined notifications in one receive: once per frame.
    #[tokio::test]
    async fn pipelined_notifications_fire_once_per_frame() {
        let dir = tempfile::tempdir().unwrap();
        let sock = dir.path().join("db.sock");
        let marker = dir.path().join("invocations");
        let mut conf = base_conf(dir.path());
        conf.ovs_unixsock_db = sock.display().to_string();

        let server = serve_monitor(&sock, SNAPSHOT_CONNECTED);
        let mut hook = DisconnectCommand::new(format!("echo fired >> {}", marker.display()));
        let mut session = MonitorSession::create(&conf, &mut hook).await.unwrap();
        let mut peer = server.await.unwrap();

        let disconnected = serde_json::json!({
            "id": null,
            "method": "update",
            "params": [null, {"Controller": {"u1": {"new": {"is_connected": false}}}}],
        })
        .to_string();
        let connected = serde_json::json!({
            "id": null,
            "method": "update",
            "params": [null, {"Controller": {"u1": {"new": {"is_connected": true}}}}],
        })
        .to_string();

        // disconnected + disconnected: one invocation per frame
        let burst = format!("{disconnected}{disconnected}");
        peer.write_all(burst.as_bytes()).await.unwrap();
        session.read_once(&mut hook).await;
        assert_eq!(session.buffered(), 0);
        assert_eq!(std::fs::read_to_string(&marker).unwrap().lines().count(), 2);

        // a frame with no disconnected row adds nothing
        let burst = format!("{connected}{disconnected}");
        peer.write_all(burst.as_bytes()).await.unwrap();
        session.read_once(&mut hook).await;
        assert_eq!(session.buffered(), 0);
        assert_eq!(std::fs::read_to_string(&marker).unwrap().lines().count(), 3);
    }
}

mod escalation {
    use super::*;

    // A threshold of 2 permits exactly two failures; the third reboots.
    #[tokio::test]
    async fn reboot_fires_only_when_the_counter_strictly_exceeds() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("rebooted");
        let mut conf = base_conf(dir.path());
        conf.failures_before_reboot = 2;
        conf.ovs_name_db = "ovsguard-spec-absent".to_string();
        conf.ovs_cmd_db = "/no/such/binary".to_string();
        conf.ovs_cmd_reboot = format!("touch {}", marker.display());
        back_daemon_forever(dir.path(), "ovs-vswitchd", 4243);

        let mut engine = Engine::new(conf);

        for expected_failures in 1..=2 {
            engine.check_cycle().await;
            assert_eq!(engine.stats().failures_count, expected_failures);
            assert!(!engine.reboot_due());
            engine.check_reboot().await;
            assert!(!marker.exists());
        }

        engine.check_cycle().await;
        assert_eq!(engine.stats().failures_count, 3);
        assert!(engine.reboot_due());
        engine.check_reboot().await;
        assert!(marker.exists());
    }
}

mod cli {
    // Exit codes: 0 on help, 1 on init/config failure, 2 on bad arguments.

    #[test]
    fn help_exits_cleanly() {
        let mut cmd = assert_cmd::Command::cargo_bin("ogd").unwrap();
        cmd.arg("-h").assert().success();
    }

    #[test]
    fn invalid_arguments_exit_with_two() {
        let mut cmd = assert_cmd::Command::cargo_bin("ogd").unwrap();
        cmd.arg("--bogus").assert().code(2);

        let mut cmd = assert_cmd::Command::cargo_bin("ogd").unwrap();
        cmd.args(["-l", "9"]).assert().code(2);

        let mut cmd = assert_cmd::Command::cargo_bin("ogd").unwrap();
        cmd.arg("-c").arg("x".repeat(256)).assert().code(2);
    }

    #[test]
    fn unloadable_configuration_exits_with_one() {
        let mut cmd = assert_cmd::Command::cargo_bin("ogd").unwrap();
        cmd.args(["-c", "/no/such/ovsguard.conf", "-s"]).assert().code(1);
    }
}
