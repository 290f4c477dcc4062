//! E2E tests for config reloads seen by a running session.
//!
//! These tests verify that:
//! - A reload with the same connection parameters keeps the connection
//! - Changed parameters renew the connection
//! - Slider state is re-read on the next token, without emitting anything
//! - Edits on disk reach the session through the file watcher

use crate::common::{MockRig, THREE_SLIDERS};
use std::time::Duration;

/// Longer than the session's post-reload delays.
const SETTLE: Duration = Duration::from_millis(200);

#[tokio::test]
async fn test_reload_with_same_params_keeps_connection() {
    let mut rig = MockRig::started(THREE_SLIDERS);

    rig.send(b"r\n");
    rig.next_move().await;
    assert_eq!(rig.session.cached_slider_count(), 3);

    rig.config.manager.reload().await.unwrap();
    tokio::time::sleep(SETTLE).await;

    assert_eq!(rig.opener.requests().len(), 1);
    assert!(rig.session.is_connected());
    assert_eq!(rig.session.cached_slider_count(), 0);
    rig.assert_no_move().await;

    // The next token refreshes the count and still works.
    rig.send(b"r\n");
    assert_eq!(rig.next_move().await.slider_id, "master");
    assert_eq!(rig.session.cached_slider_count(), 3);

    rig.session.stop().await;
}

#[tokio::test]
async fn test_changed_port_renews_connection() {
    let mut rig = MockRig::started(THREE_SLIDERS);

    rig.config
        .rewrite(&THREE_SLIDERS.replace("serial_port: MOCK0", "serial_port: MOCK1"));
    rig.config.manager.reload().await.unwrap();
    tokio::time::sleep(SETTLE).await;

    let requests = rig.opener.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].port_name, "MOCK1");
    assert!(rig.session.is_connected());

    rig.send(b"r\n");
    assert_eq!(rig.next_move().await.percent_value, 0.51);

    rig.session.stop().await;
}

#[tokio::test]
async fn test_changed_baud_rate_renews_connection() {
    let rig = MockRig::started(THREE_SLIDERS);

    rig.config
        .rewrite(&THREE_SLIDERS.replace("baud_rate: 9600", "baud_rate: 115200"));
    rig.config.manager.reload().await.unwrap();
    tokio::time::sleep(SETTLE).await;

    let requests = rig.opener.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].baud_rate, 115_200);

    rig.session.stop().await;
}

#[tokio::test]
async fn test_failed_renewal_leaves_session_disconnected() {
    let rig = MockRig::started(THREE_SLIDERS);

    rig.opener.fail_next_open();
    rig.config
        .rewrite(&THREE_SLIDERS.replace("serial_port: MOCK0", "serial_port: GONE"));
    rig.config.manager.reload().await.unwrap();
    tokio::time::sleep(SETTLE).await;

    assert_eq!(rig.opener.requests().len(), 2);
    assert!(!rig.session.is_connected());

    // Fixing the file brings it back.
    rig.config.rewrite(THREE_SLIDERS);
    rig.config.manager.reload().await.unwrap();
    tokio::time::sleep(SETTLE).await;
    assert!(rig.session.is_connected());

    rig.session.stop().await;
}

#[tokio::test]
async fn test_reload_before_start_does_not_connect() {
    let rig = MockRig::new(THREE_SLIDERS);

    rig.config.manager.reload().await.unwrap();
    tokio::time::sleep(SETTLE).await;

    assert!(rig.opener.requests().is_empty());
    assert!(!rig.session.is_connected());
}

#[tokio::test]
async fn test_shrinking_reload_reclamps_selection() {
    let mut rig = MockRig::started(THREE_SLIDERS);

    rig.send(b"d\nr\nr\nu\nr\n");
    assert_eq!(rig.next_move().await.slider_id, "chat");

    rig.config.rewrite(
        "slider_mappings:\n  solo:\n    volume: 0.3\nconnection_info:\n  serial_port: MOCK0\n  baud_rate: 9600\n",
    );
    rig.config.manager.reload().await.unwrap();
    tokio::time::sleep(SETTLE).await;

    rig.send(b"r\n");
    let event = rig.next_move().await;
    assert_eq!(event.slider_id, "solo");
    assert_eq!(event.percent_value, 0.31);

    rig.session.stop().await;
}

#[tokio::test]
async fn test_file_edit_reaches_session_through_watcher() {
    let mut rig = MockRig::started(THREE_SLIDERS);
    let mut reloads = rig.config.manager.subscribe_to_changes();
    let watcher = rig.config.manager.spawn_watcher().unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    rig.config
        .rewrite(&THREE_SLIDERS.replacen("volume: 0.5", "volume: 0.2", 1));
    tokio::time::timeout(Duration::from_secs(3), reloads.recv())
        .await
        .expect("reload not observed")
        .expect("reload channel closed");
    tokio::time::sleep(SETTLE).await;

    rig.send(b"r\n");
    let event = rig.next_move().await;
    assert_eq!(event.slider_id, "master");
    assert_eq!(event.percent_value, 0.21);

    let titles: Vec<String> = rig.config.notifier.sent().into_iter().map(|(t, _)| t).collect();
    assert!(titles.contains(&"Configuration reloaded!".to_string()));

    watcher.stop().await;
    rig.session.stop().await;
}
