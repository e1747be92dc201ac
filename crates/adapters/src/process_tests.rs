// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::Write;
use yare::parameterized;

fn write_pidfile(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[parameterized(
    newline_terminated = { "4242\n", 4242 },
    space_terminated = { "17 extra junk", 17 },
    leading_whitespace = { "  99\n", 99 },
    bare = { "1", 1 },
)]
fn pid_from_file_reads_first_integer(contents: &str, expected: i32) {
    let file = write_pidfile(contents);
    assert_eq!(pid_from_file(file.path()).unwrap(), expected);
}

#[parameterized(
    empty = { "" },
    garbage = { "not-a-pid\n" },
    trailing_garbage = { "4242x\n" },
)]
fn pid_from_file_rejects_undecodable_contents(contents: &str) {
    let file = write_pidfile(contents);
    assert!(matches!(pid_from_file(file.path()), Err(PidFileError::Decode { .. })));
}

#[test]
fn pid_from_file_reports_missing_file() {
    assert!(matches!(
        pid_from_file("/no/such/pidfile"),
        Err(PidFileError::Read { .. })
    ));
}

#[test]
fn find_process_locates_our_own_binary() {
    // our own /proc entry is guaranteed to exist and to match its
    // cmdline's first token
    let cmdline = std::fs::read("/proc/self/cmdline").unwrap();
    let first = cmdline.split(|b| *b == 0 || *b == b' ').next().unwrap();
    let name = String::from_utf8(first.to_vec()).unwrap();

    assert_eq!(find_process(&name), Some(std::process::id() as i32));
}

#[test]
fn find_process_returns_none_for_unknown_name() {
    assert_eq!(find_process("ovsguard-no-such-process"), None);
}

#[tokio::test]
async fn spawn_from_command_runs_detached() {
    spawn_from_command("true").unwrap();
}

#[tokio::test]
async fn spawn_from_command_collapses_space_runs() {
    spawn_from_command("true   --flag    value").unwrap();
}

#[tokio::test]
async fn spawn_rejects_empty_command() {
    assert!(matches!(spawn_from_command(""), Err(SpawnError::EmptyCommand)));
    assert!(matches!(spawn_from_command("   "), Err(SpawnError::EmptyCommand)));
}

#[tokio::test]
async fn spawn_rejects_too_many_arguments() {
    // sixteen tokens pass, seventeen do not
    let command = format!("true{}", " x".repeat(15));
    spawn_from_command(&command).unwrap();

    let command = format!("true{}", " x".repeat(16));
    assert!(matches!(spawn_from_command(&command), Err(SpawnError::TooManyArgs(_))));
}

#[tokio::test]
async fn spawn_reports_missing_executable() {
    assert!(matches!(
        spawn_from_command("/no/such/binary --flag"),
        Err(SpawnError::Spawn(_))
    ));
}

#[tokio::test]
async fn run_hook_returns_exit_status() {
    let status = run_hook("echo recovery output; exit 0").await.unwrap();
    assert!(status.success());

    let status = run_hook("exit 3").await.unwrap();
    assert_eq!(status.code(), Some(3));
}

#[tokio::test]
async fn run_hook_drains_large_output() {
    // more than one rolling-buffer round
    let status = run_hook("head -c 20000 /dev/zero | tr '\\0' 'a'").await.unwrap();
    assert!(status.success());
}
