// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tokio::net::UnixListener;

#[tokio::test]
async fn empty_path_is_no_address() {
    let err = connect_unix("").await.unwrap_err();
    assert!(matches!(err, ConnectError::NoAddress));
    assert!(err.is_no_connection());
}

#[tokio::test]
async fn overlong_path_is_rejected_before_connecting() {
    let path = format!("/tmp/{}", "x".repeat(150));
    let err = connect_unix(&path).await.unwrap_err();
    assert!(matches!(err, ConnectError::PathTooLong(_)));
    assert!(!err.is_no_connection());
}

#[tokio::test]
async fn missing_socket_is_a_socket_error() {
    // ENOENT is not in the "peer not there" errno class
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.sock");

    let err = connect_unix(path.to_str().unwrap()).await.unwrap_err();
    assert!(matches!(err, ConnectError::Connect(_)));
    assert!(!err.is_no_connection());
}

#[tokio::test]
async fn refused_connection_is_no_connection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stale.sock");

    // bind and drop: the path stays behind with nobody accepting
    drop(UnixListener::bind(&path).unwrap());

    let err = connect_unix(path.to_str().unwrap()).await.unwrap_err();
    assert!(err.is_no_connection());
}

#[tokio::test]
async fn listening_socket_connects() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("live.sock");
    let _listener = UnixListener::bind(&path).unwrap();

    assert!(connect_unix(path.to_str().unwrap()).await.is_ok());
}
