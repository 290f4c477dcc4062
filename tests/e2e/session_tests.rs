//! E2E tests for the serial session.
//!
//! These tests verify that the session:
//! - Turns encoder detents into volume changes on the current slider
//! - Walks the slider list while the button is held
//! - Drops malformed lines
//! - Enforces a single connection and survives device loss

use crate::common::{MockRig, THREE_SLIDERS};
use rotary_mixer::session::{Mode, SessionError};
use std::time::Duration;

#[tokio::test]
async fn test_right_turn_raises_master() {
    let mut rig = MockRig::started(THREE_SLIDERS);

    rig.send(b"r\n");
    let event = rig.next_move().await;

    assert_eq!(event.slider_id, "master");
    assert_eq!(event.percent_value, 0.51);
    rig.assert_no_move().await;

    assert_eq!(rig.config.manager.slider_mapping("master").unwrap().volume, 0.51);
    assert!(rig.config.manager.is_dirty());
    rig.session.stop().await;
}

#[tokio::test]
async fn test_select_second_slider_then_turn_left() {
    let mut rig = MockRig::started(THREE_SLIDERS);

    rig.send(b"d\nr\nu\n");
    rig.drain().await;
    rig.assert_no_move().await;
    assert_eq!(rig.session.current_slider().as_deref(), Some("game"));
    assert_eq!(rig.session.mode(), Mode::Volume);

    rig.send(b"l\n");
    let event = rig.next_move().await;
    assert_eq!(event.slider_id, "game");
    assert_eq!(event.percent_value, 0.49);
    assert_eq!(rig.config.manager.slider_mapping("master").unwrap().volume, 0.5);

    rig.session.stop().await;
}

#[tokio::test]
async fn test_channel_selection_clamps_at_both_ends() {
    let mut rig = MockRig::started(THREE_SLIDERS);

    rig.send(b"d\nr\nr\nr\nr\nr\nu\nr\n");
    let event = rig.next_move().await;
    assert_eq!(event.slider_id, "chat");

    rig.send(b"d\nl\nl\nl\nl\nl\nu\nr\n");
    let event = rig.next_move().await;
    assert_eq!(event.slider_id, "master");

    rig.session.stop().await;
}

#[tokio::test]
async fn test_malformed_lines_are_ignored() {
    let mut rig = MockRig::started(THREE_SLIDERS);

    rig.send(b"xq\nr\r\nrr\n\nR\n");
    rig.drain().await;
    rig.assert_no_move().await;
    assert!(!rig.config.manager.is_dirty());

    // Input keeps flowing after the noise.
    rig.send(b"l\n");
    assert_eq!(rig.next_move().await.percent_value, 0.49);

    rig.session.stop().await;
}

#[tokio::test]
async fn test_overlong_noise_line_is_dropped_whole() {
    let mut rig = MockRig::started(THREE_SLIDERS);

    let mut noise = vec![b'x'; 300];
    noise.extend_from_slice(b"d\n");
    rig.send(&noise);
    rig.drain().await;
    assert_eq!(rig.session.mode(), Mode::Volume);

    rig.send(b"r\n");
    assert_eq!(rig.next_move().await.percent_value, 0.51);

    rig.session.stop().await;
}

#[tokio::test]
async fn test_token_split_across_reads() {
    let mut rig = MockRig::started(THREE_SLIDERS);

    rig.send(b"r");
    rig.drain().await;
    rig.assert_no_move().await;

    rig.send(b"\n");
    assert_eq!(rig.next_move().await.slider_id, "master");

    rig.session.stop().await;
}

#[tokio::test]
async fn test_events_arrive_in_order() {
    let mut rig = MockRig::started(THREE_SLIDERS);
    let mut second = rig.session.subscribe_to_slider_moves();

    rig.send(b"r\nr\nr\nl\n");
    let mut seen = Vec::new();
    for _ in 0..4 {
        seen.push(rig.next_move().await.percent_value);
    }
    assert_eq!(seen, vec![0.51, 0.52, 0.53, 0.52]);

    for expected in seen {
        let event = tokio::time::timeout(Duration::from_secs(1), second.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.percent_value, expected);
    }

    rig.session.stop().await;
}

#[tokio::test]
async fn test_second_start_is_rejected() {
    let rig = MockRig::started(THREE_SLIDERS);

    let err = rig.session.start().unwrap_err();
    assert!(matches!(err, SessionError::AlreadyActive));
    assert_eq!(err.to_string(), "serial: connection already active");
    assert_eq!(rig.opener.requests().len(), 1);

    rig.session.stop().await;
}

#[tokio::test]
async fn test_stop_when_disconnected_is_noop() {
    let rig = MockRig::new(THREE_SLIDERS);

    rig.session.stop().await;
    assert!(!rig.session.is_connected());
    assert!(rig.opener.requests().is_empty());
}

#[tokio::test]
async fn test_restart_after_stop() {
    let mut rig = MockRig::started(THREE_SLIDERS);
    rig.session.stop().await;
    assert!(!rig.session.is_connected());

    rig.session.start().unwrap();
    rig.send(b"r\n");
    assert_eq!(rig.next_move().await.percent_value, 0.51);
    assert_eq!(rig.opener.requests().len(), 2);

    rig.session.stop().await;
}

#[tokio::test]
async fn test_open_failure_reports_port_error() {
    let rig = MockRig::new(THREE_SLIDERS);
    rig.opener.fail_next_open();

    let err = rig.session.start().unwrap_err();
    assert!(matches!(err, SessionError::Port(_)));
    assert!(err.to_string().starts_with("open serial connection"));
    assert!(!rig.session.is_connected());

    // A later attempt is allowed.
    rig.session.start().unwrap();
    rig.session.stop().await;
}

#[tokio::test]
async fn test_device_loss_keeps_session_until_stop() {
    let mut rig = MockRig::started(THREE_SLIDERS);

    rig.port.disconnect();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(rig.session.is_connected());
    rig.assert_no_move().await;

    tokio::time::timeout(Duration::from_secs(2), rig.session.stop())
        .await
        .expect("stop hung after device loss");
    assert!(!rig.session.is_connected());
}
