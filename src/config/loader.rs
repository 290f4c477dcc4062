//! Config file location and raw file access.

use super::error::{ConfigError, ConfigResult};
use std::path::{Path, PathBuf};

/// Config file name
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Environment variable for explicit config path
pub const CONFIG_PATH_ENV: &str = "ROTARY_MIXER_CONFIG";

/// Resolve which config file to use.
///
/// Priority (highest to lowest):
/// 1. `explicit` (the `--config` flag)
/// 2. `ROTARY_MIXER_CONFIG` environment variable
/// 3. `./config.yaml`
/// 4. `config.yaml` in the platform config directory, if it exists
///
/// When nothing exists the current-directory path is returned so that the
/// subsequent load reports it as missing.
pub fn resolve_config_path(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }

    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return cwd_config;
    }

    if let Some(app_config) = default_config_path() {
        if app_config.exists() {
            return app_config;
        }
    }

    cwd_config
}

/// `config.yaml` inside the platform config directory.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "rotary-mixer")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Read the whole config file.
pub(crate) fn read_config_file(path: &Path) -> ConfigResult<String> {
    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound(path.to_path_buf())
        } else {
            ConfigError::Read {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })
}

/// Replace the config file contents.
pub(crate) fn write_config_file(path: &Path, content: &str) -> ConfigResult<()> {
    std::fs::write(path, content).map_err(|e| ConfigError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}
