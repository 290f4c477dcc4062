//! Guarded access to the live configuration.
//!
//! `ConfigManager` owns the [`ConfigStore`] behind a single mutex. Every read,
//! mutation, load and save takes that lock, so the config aggregate and the
//! ordered key index never disagree. Reloads are announced to subscribers
//! after the new store is in place.

use super::error::{ConfigError, ConfigResult};
use super::loader::{read_config_file, write_config_file};
use super::schema::{Config, ConnectionInfo, SliderMapping};
use super::store::ConfigStore;
use crate::fanout::Broadcaster;
use crate::notifier::Notifier;
use crate::task::LoopHandle;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Signal sent to subscribers after every successful reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigReloaded {
    /// Number of successful loads so far, including this one.
    pub generation: u64,
}

#[derive(Debug, Default)]
struct ManagerState {
    store: ConfigStore,
    dirty: bool,
    /// YAML most recently written by `save`, used to skip our own file events.
    last_written: Option<String>,
}

pub struct ConfigManager {
    path: PathBuf,
    state: Mutex<ManagerState>,
    notifier: Arc<dyn Notifier>,
    reload_subscribers: Broadcaster<ConfigReloaded>,
    loads: AtomicU64,
}

impl ConfigManager {
    /// Create a manager for `path`. Nothing is read until [`load`](Self::load).
    pub fn new(path: impl Into<PathBuf>, notifier: Arc<dyn Notifier>) -> Self {
        let path = path.into();
        debug!(path = %path.display(), "Created config manager instance");
        Self {
            path,
            state: Mutex::new(ManagerState::default()),
            notifier,
            reload_subscribers: Broadcaster::new(),
            loads: AtomicU64::new(0),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and decode the config file, replacing the in-memory config.
    ///
    /// On failure the previous config is left untouched. A missing file also
    /// raises a user notification.
    pub fn load(&self) -> ConfigResult<()> {
        debug!(path = %self.path.display(), "Loading config");

        let content = match read_config_file(&self.path) {
            Ok(content) => content,
            Err(ConfigError::NotFound(path)) => {
                warn!(path = %path.display(), "Config file not found");
                self.notifier.notify(
                    "Can't find configuration!",
                    &format!(
                        "{} must be in the directory. Please re-launch",
                        path.display()
                    ),
                );
                return Err(ConfigError::NotFound(path));
            }
            Err(e) => return Err(e),
        };

        let store = ConfigStore::from_yaml(&content).map_err(|e| {
            warn!(error = %e, "Failed to decode config");
            e
        })?;

        let keys = store.ordered_keys().to_vec();
        {
            let mut state = self.state.lock();
            state.store = store;
            state.dirty = false;
        }
        self.loads.fetch_add(1, Ordering::SeqCst);

        info!(ordered_keys = ?keys, "Config loaded successfully");
        Ok(())
    }

    /// Load, then tell the user and every reload subscriber.
    pub async fn reload(&self) -> ConfigResult<()> {
        self.load()?;
        info!("Config reloaded successfully");
        self.notifier
            .notify("Configuration reloaded!", "Your changes have been applied.");
        self.notify_subscribers().await;
        Ok(())
    }

    /// Number of successful loads since the manager was created.
    pub fn load_count(&self) -> u64 {
        self.loads.load(Ordering::SeqCst)
    }

    /// Write the current config to disk and clear the dirty flag.
    ///
    /// The lock is held for the whole write. On failure the dirty flag stays
    /// set so the periodic saver retries.
    pub fn save(&self) -> ConfigResult<()> {
        let mut state = self.state.lock();

        let content = state.store.to_yaml().map_err(|e| {
            warn!(error = %e, "Failed to encode config");
            e
        })?;
        write_config_file(&self.path, &content).map_err(|e| {
            warn!(error = %e, "Failed to write config file");
            e
        })?;

        state.dirty = false;
        state.last_written = Some(content);
        info!(path = %self.path.display(), "Config saved successfully to disk");
        Ok(())
    }

    /// Save every `interval` while the config is dirty, until stopped.
    pub fn spawn_periodic_save(self: &Arc<Self>, interval: Duration) -> LoopHandle {
        let manager = Arc::clone(self);
        LoopHandle::spawn("periodic-save", move |mut stop_rx| async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = &mut stop_rx => {
                        debug!("Stopping periodic config save");
                        return;
                    }
                    _ = ticker.tick() => {
                        // Check under the lock, save after releasing it.
                        if !manager.is_dirty() {
                            continue;
                        }
                        info!("Config modified, preparing to save");
                        let saver = Arc::clone(&manager);
                        match tokio::task::spawn_blocking(move || saver.save()).await {
                            Ok(Ok(())) => {}
                            Ok(Err(e)) => warn!(error = %e, "Failed to save config to disk"),
                            Err(e) => warn!(error = %e, "Config save task failed"),
                        }
                    }
                }
            }
        })
    }

    /// Receive a [`ConfigReloaded`] after every successful reload.
    pub fn subscribe_to_changes(&self) -> mpsc::Receiver<ConfigReloaded> {
        self.reload_subscribers.subscribe()
    }

    /// Deliver a reload signal to each subscriber in turn.
    pub async fn notify_subscribers(&self) {
        debug!("Notifying subscribers about config reload");
        let signal = ConfigReloaded {
            generation: self.load_count(),
        };
        self.reload_subscribers.broadcast(signal).await;
    }

    pub fn is_dirty(&self) -> bool {
        self.state.lock().dirty
    }

    /// Whether the file on disk is exactly what `save` last wrote.
    pub(crate) fn file_matches_last_write(&self) -> bool {
        let Ok(content) = std::fs::read_to_string(&self.path) else {
            return false;
        };
        self.state.lock().last_written.as_deref() == Some(content.as_str())
    }

    pub fn snapshot(&self) -> Config {
        self.state.lock().store.config().clone()
    }

    pub fn connection_info(&self) -> ConnectionInfo {
        self.state.lock().store.config().connection_info.clone()
    }

    pub fn save_interval(&self) -> Duration {
        self.state.lock().store.config().save_interval()
    }

    pub fn slider_mapping(&self, key: &str) -> ConfigResult<SliderMapping> {
        self.state.lock().store.get(key).cloned()
    }

    pub fn slider_mapping_at(&self, index: usize) -> ConfigResult<SliderMapping> {
        self.state.lock().store.get_at(index).cloned()
    }

    /// Slider names in index order. Fails when no sliders are configured.
    pub fn slider_keys(&self) -> ConfigResult<Vec<String>> {
        let state = self.state.lock();
        if state.store.is_empty() {
            return Err(ConfigError::NoSliders);
        }
        Ok(state.store.ordered_keys().to_vec())
    }

    pub fn slider_count(&self) -> usize {
        self.state.lock().store.len()
    }

    pub fn slider_key_at(&self, index: usize) -> ConfigResult<String> {
        self.state.lock().store.key_at(index).map(str::to_string)
    }

    /// Every mapping in index order. Fails when no sliders are configured.
    pub fn slider_mappings(&self) -> ConfigResult<Vec<SliderMapping>> {
        let state = self.state.lock();
        if state.store.is_empty() {
            return Err(ConfigError::NoSliders);
        }
        state
            .store
            .ordered_keys()
            .iter()
            .map(|key| state.store.get(key).cloned())
            .collect()
    }

    /// Replace one slider's mapping and mark the config dirty.
    pub fn update_slider_mapping(&self, key: &str, mapping: SliderMapping) {
        let mut state = self.state.lock();
        state.store.set(key, mapping);
        state.dirty = true;
        debug!(key, "Updated slider mapping");
    }

    /// Change one slider in place under a single lock.
    ///
    /// Fails with `SliderNotFound` when the key is gone, e.g. removed by a
    /// reload since the caller last looked; nothing is inserted then. The
    /// config is marked dirty only if `f` actually changed the mapping.
    pub fn modify_slider<R>(
        &self,
        key: &str,
        f: impl FnOnce(&mut SliderMapping) -> R,
    ) -> ConfigResult<R> {
        let mut state = self.state.lock();
        let mapping = state.store.get_mut(key)?;
        let before = mapping.clone();
        let result = f(mapping);
        let changed = *mapping != before;
        if changed {
            state.dirty = true;
            debug!(key, "Modified slider mapping");
        }
        Ok(result)
    }

    /// Replace the mapping at `index` and mark the config dirty.
    ///
    /// Callers validate the index first (e.g. with
    /// [`slider_key_at`](Self::slider_key_at)); an invalid index changes
    /// nothing and returns `IndexOutOfRange`.
    pub fn update_slider_mapping_at(&self, index: usize, mapping: SliderMapping) -> ConfigResult<()> {
        let mut state = self.state.lock();
        let key = state.store.key_at(index)?.to_string();
        state.store.set(&key, mapping);
        state.dirty = true;
        debug!(key = %key, index, "Updated slider mapping");
        Ok(())
    }
}

impl std::fmt::Debug for ConfigManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigManager")
            .field("path", &self.path)
            .field("loads", &self.load_count())
            .field("reload_subscribers", &self.reload_subscribers)
            .finish()
    }
}
