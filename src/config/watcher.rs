//! Configuration file watcher for hot-reload support.
//!
//! Watches the directory holding the config file (editors often replace the
//! file rather than write it in place) and reloads on changes to that file
//! name. At most one reload is honoured per [`MIN_TIME_BETWEEN_RELOADS`], and
//! each honoured event waits [`DELAY_AFTER_CHANGE`] before reading so a writer
//! can finish.

use super::error::ConfigResult;
use super::manager::ConfigManager;
use crate::task::LoopHandle;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

pub const MIN_TIME_BETWEEN_RELOADS: Duration = Duration::from_millis(500);
pub const DELAY_AFTER_CHANGE: Duration = Duration::from_millis(50);

/// Decides which change events trigger a reload.
#[derive(Debug, Clone)]
pub struct ReloadDebouncer {
    min_interval: Duration,
    last_reload: Option<Instant>,
}

impl ReloadDebouncer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_reload: None,
        }
    }

    /// Returns true, and starts a new window, if no reload was honoured
    /// within the last `min_interval`.
    pub fn should_reload(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_reload {
            if now.saturating_duration_since(last) < self.min_interval {
                return false;
            }
        }
        self.last_reload = Some(now);
        true
    }
}

impl Default for ReloadDebouncer {
    fn default() -> Self {
        Self::new(MIN_TIME_BETWEEN_RELOADS)
    }
}

impl ConfigManager {
    /// Start watching the config file. Reload failures are logged and the
    /// watcher keeps running until stopped.
    pub fn spawn_watcher(self: &Arc<Self>) -> ConfigResult<LoopHandle> {
        let path = self.path().to_path_buf();
        let (dir, file_name) = watch_target(&path);

        let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
        let mut watcher: RecommendedWatcher =
            notify::recommended_watcher(move |res: Result<Event, notify::Error>| match res {
                Ok(event) => {
                    // Receiver gone means the loop stopped.
                    let _ = tx.send(event);
                }
                Err(e) => error!(error = %e, "Watch error"),
            })?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        info!(path = %path.display(), "Watching config file for changes");

        let manager = Arc::clone(self);
        Ok(LoopHandle::spawn("config-watcher", move |mut stop_rx| async move {
            // Dropping the watcher ends the notification thread.
            let _watcher = watcher;
            let mut debouncer = ReloadDebouncer::default();

            loop {
                tokio::select! {
                    _ = &mut stop_rx => {
                        debug!("Stopping config file watcher");
                        return;
                    }
                    event = rx.recv() => {
                        let Some(event) = event else { return };
                        if !is_relevant(&event, &file_name) {
                            continue;
                        }
                        if !debouncer.should_reload(Instant::now()) {
                            continue;
                        }

                        debug!(kind = ?event.kind, "Config file modified, reloading");
                        tokio::time::sleep(DELAY_AFTER_CHANGE).await;

                        if manager.file_matches_last_write() {
                            debug!("Change was our own save, skipping reload");
                            continue;
                        }
                        if let Err(e) = manager.reload().await {
                            warn!(error = %e, "Failed to reload config");
                        }
                    }
                }
            }
        }))
    }
}

/// Directory to watch and the file name to filter on.
fn watch_target(path: &Path) -> (PathBuf, OsString) {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = path.file_name().map(OsString::from).unwrap_or_default();
    (dir, file_name)
}

fn is_relevant(event: &Event, file_name: &OsString) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
}
