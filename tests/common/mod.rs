//! Shared test utilities for rotary-mixer tests.
//!
//! This module provides common test infrastructure including:
//! - Temporary config files
//! - A session wired to a mock port
//! - Helpers for waiting on slider events

#![allow(dead_code)]

use rotary_mixer::config::ConfigManager;
use rotary_mixer::notifier::RecordingNotifier;
use rotary_mixer::port::{MockPortOpener, MockSerialPort};
use rotary_mixer::session::{SerialSession, SliderMoveEvent};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

/// Three sliders at half volume on `MOCK0`.
pub const THREE_SLIDERS: &str = r#"slider_mappings:
  master:
    volume: 0.5
    targets: [master]
  game:
    volume: 0.5
    targets: [game.exe]
  chat:
    volume: 0.5
    targets: [discord.exe]
invert_sliders: false
connection_info:
  serial_port: MOCK0
  baud_rate: 9600
noise_reduction_level: default
config_save_interval: 60
"#;

/// How long to wait for something that should happen.
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(2);

/// How long to wait before concluding that something did not happen.
pub const QUIET_PERIOD: Duration = Duration::from_millis(150);

/// A config file in a temporary directory, loaded into a manager.
pub struct TempConfig {
    pub dir: TempDir,
    pub notifier: Arc<RecordingNotifier>,
    pub manager: Arc<ConfigManager>,
}

impl TempConfig {
    pub fn new(content: &str) -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, content).expect("write config");

        let notifier = Arc::new(RecordingNotifier::new());
        let manager = Arc::new(ConfigManager::new(path, notifier.clone()));
        manager.load().expect("load config");

        Self {
            dir,
            notifier,
            manager,
        }
    }

    pub fn path(&self) -> PathBuf {
        self.manager.path().to_path_buf()
    }

    /// Replace the file on disk without reloading.
    pub fn rewrite(&self, content: &str) {
        std::fs::write(self.path(), content).expect("rewrite config");
    }
}

/// A session over a mock port, plus the handles tests poke at.
pub struct MockRig {
    pub config: TempConfig,
    pub port: MockSerialPort,
    pub opener: MockPortOpener,
    pub session: Arc<SerialSession>,
    pub moves: mpsc::Receiver<SliderMoveEvent>,
}

impl MockRig {
    /// Build a disconnected session subscribed to slider moves.
    pub fn new(content: &str) -> Self {
        let config = TempConfig::new(content);
        let port = MockSerialPort::new("MOCK0");
        let opener = MockPortOpener::new(port.clone());
        let session = SerialSession::new(Arc::clone(&config.manager), Arc::new(opener.clone()));
        let moves = session.subscribe_to_slider_moves();

        Self {
            config,
            port,
            opener,
            session,
            moves,
        }
    }

    /// Build and start.
    pub fn started(content: &str) -> Self {
        let rig = Self::new(content);
        rig.session.start().expect("start session");
        rig
    }

    /// Feed raw device bytes.
    pub fn send(&mut self, bytes: &[u8]) {
        self.port.enqueue_read(bytes);
    }

    /// Wait for the next slider move.
    pub async fn next_move(&mut self) -> SliderMoveEvent {
        tokio::time::timeout(EVENT_TIMEOUT, self.moves.recv())
            .await
            .expect("timed out waiting for slider move")
            .expect("slider move channel closed")
    }

    /// Give the session time to drain input, then assert nothing was emitted.
    pub async fn assert_no_move(&mut self) {
        tokio::time::sleep(QUIET_PERIOD).await;
        if let Ok(event) = self.moves.try_recv() {
            panic!("unexpected slider move: {event:?}");
        }
    }

    /// Wait until the mock port has no unread bytes left.
    pub async fn drain(&self) {
        let deadline = tokio::time::Instant::now() + EVENT_TIMEOUT;
        while self.port.available_bytes() > 0 {
            assert!(tokio::time::Instant::now() < deadline, "port input not drained");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
