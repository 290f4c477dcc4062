//! E2E tests for writing encoder changes back to the config file.

use crate::common::{MockRig, TempConfig, THREE_SLIDERS};
use pretty_assertions::assert_eq;
use std::time::Duration;

#[tokio::test]
async fn test_save_keeps_slider_order_and_values() {
    let mut rig = MockRig::started(THREE_SLIDERS);

    rig.send(b"d\nr\nr\nu\nl\nl\n");
    rig.next_move().await;
    assert_eq!(rig.next_move().await.percent_value, 0.48);
    rig.session.stop().await;

    rig.config.manager.save().unwrap();
    assert!(!rig.config.manager.is_dirty());

    let text = std::fs::read_to_string(rig.config.path()).unwrap();
    let master = text.find("master:").unwrap();
    let game = text.find("game:").unwrap();
    let chat = text.find("chat:").unwrap();
    assert!(master < game && game < chat, "slider order lost:\n{text}");

    let reread = TempConfig::new(&text);
    assert_eq!(
        reread.manager.slider_keys().unwrap(),
        vec!["master", "game", "chat"]
    );
    assert_eq!(reread.manager.slider_mapping("chat").unwrap().volume, 0.48);
    assert_eq!(reread.manager.slider_mapping("game").unwrap().volume, 0.5);
    assert_eq!(reread.manager.snapshot(), rig.config.manager.snapshot());
}

#[tokio::test]
async fn test_periodic_save_persists_encoder_changes() {
    let mut rig = MockRig::started(THREE_SLIDERS);
    let saver = rig
        .config
        .manager
        .spawn_periodic_save(Duration::from_millis(30));

    rig.send(b"r\nr\n");
    rig.next_move().await;
    rig.next_move().await;
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert!(!rig.config.manager.is_dirty());
    let reread = TempConfig::new(&std::fs::read_to_string(rig.config.path()).unwrap());
    assert_eq!(reread.manager.slider_mapping("master").unwrap().volume, 0.52);

    saver.stop().await;
    rig.session.stop().await;
}

#[tokio::test]
async fn test_own_save_does_not_trigger_reload() {
    let rig = MockRig::new(THREE_SLIDERS);
    let manager = &rig.config.manager;
    let watcher = manager.spawn_watcher().unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut mapping = manager.slider_mapping("game").unwrap();
    mapping.muted = true;
    manager.update_slider_mapping("game", mapping);
    manager.save().unwrap();

    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(manager.load_count(), 1);
    assert!(rig.config.notifier.sent().is_empty());

    watcher.stop().await;
}

#[tokio::test]
async fn test_invalid_edit_keeps_running_config() {
    let mut rig = MockRig::started(THREE_SLIDERS);

    rig.config.rewrite("slider_mappings:\n  master:\n    gain: 2\n");
    assert!(rig.config.manager.reload().await.unwrap_err().is_decode());
    assert_eq!(rig.config.manager.slider_count(), 3);

    rig.send(b"r\n");
    assert_eq!(rig.next_move().await.percent_value, 0.51);

    rig.session.stop().await;
}

#[test]
fn test_missing_file_is_reported() {
    let dir = tempfile::TempDir::new().unwrap();
    let notifier = std::sync::Arc::new(rotary_mixer::notifier::RecordingNotifier::new());
    let manager = rotary_mixer::config::ConfigManager::new(
        dir.path().join("config.yaml"),
        notifier.clone(),
    );

    assert!(manager.load().unwrap_err().is_not_found());
    assert_eq!(notifier.sent()[0].0, "Can't find configuration!");
}
