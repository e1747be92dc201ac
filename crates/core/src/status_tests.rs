// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn statuses_compare_by_variant() {
    assert_eq!(QueryStatus::Success, QueryStatus::Success);
    assert_ne!(QueryStatus::ReceiveTimeout, QueryStatus::NoConnection);
    assert_ne!(DaemonStatus::NoResponse, DaemonStatus::NotAlive);
}
