//! In-memory configuration plus the ordered slider key index.
//!
//! `ConfigStore` has no locking of its own; `ConfigManager` wraps it. The
//! ordered keys follow the order sliders appear in the YAML file and are the
//! index space used for channel selection.

use super::error::{ConfigError, ConfigResult};
use super::schema::{Config, ConnectionInfo, SliderMapping};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_yaml::{Mapping, Value};

const SLIDER_MAPPINGS_KEY: &str = "slider_mappings";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigStore {
    config: Config,
    ordered_keys: Vec<String>,
}

impl ConfigStore {
    /// Decode a YAML document.
    ///
    /// An empty document yields the default configuration. Unknown keys,
    /// duplicate slider names and type mismatches fail with `Decode`.
    pub fn from_yaml(content: &str) -> ConfigResult<Self> {
        let value: Value = serde_yaml::from_str(content).map_err(ConfigError::Decode)?;
        let value = match value {
            Value::Null => Value::Mapping(Mapping::new()),
            other => other,
        };

        let ordered_keys = slider_key_order(&value);
        let config: Config = serde_yaml::from_value(value).map_err(ConfigError::Decode)?;

        Ok(Self::with_key_order(config, ordered_keys))
    }

    /// Build a store from an already decoded config.
    ///
    /// Keys listed in `order` come first, in that order; any remaining
    /// slider names are appended sorted so the result is deterministic.
    pub fn with_key_order(config: Config, order: Vec<String>) -> Self {
        let mut ordered_keys: Vec<String> = order
            .into_iter()
            .filter(|key| config.slider_mappings.contains_key(key))
            .collect();

        let mut rest: Vec<String> = config
            .slider_mappings
            .keys()
            .filter(|key| !ordered_keys.contains(key))
            .cloned()
            .collect();
        rest.sort();
        ordered_keys.extend(rest);

        Self {
            config,
            ordered_keys,
        }
    }

    /// Encode to YAML, writing sliders in index order.
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let ordered = OrderedConfig {
            slider_mappings: OrderedSliders(self),
            invert_sliders: self.config.invert_sliders,
            connection_info: &self.config.connection_info,
            noise_reduction_level: &self.config.noise_reduction_level,
            config_save_interval: self.config.config_save_interval,
        };
        serde_yaml::to_string(&ordered).map_err(ConfigError::Encode)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ordered_keys(&self) -> &[String] {
        &self.ordered_keys
    }

    pub fn len(&self) -> usize {
        self.ordered_keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered_keys.is_empty()
    }

    pub fn get(&self, key: &str) -> ConfigResult<&SliderMapping> {
        self.config
            .slider_mappings
            .get(key)
            .ok_or_else(|| ConfigError::SliderNotFound(key.to_string()))
    }

    pub fn get_mut(&mut self, key: &str) -> ConfigResult<&mut SliderMapping> {
        self.config
            .slider_mappings
            .get_mut(key)
            .ok_or_else(|| ConfigError::SliderNotFound(key.to_string()))
    }

    pub fn key_at(&self, index: usize) -> ConfigResult<&str> {
        self.ordered_keys
            .get(index)
            .map(String::as_str)
            .ok_or(ConfigError::IndexOutOfRange {
                index,
                len: self.ordered_keys.len(),
            })
    }

    pub fn get_at(&self, index: usize) -> ConfigResult<&SliderMapping> {
        let key = self.key_at(index)?;
        self.get(key)
    }

    /// Replace a slider's mapping. Inserting a new name appends it to the
    /// ordered keys so the index stays in sync with the mapping set.
    pub fn set(&mut self, key: &str, mapping: SliderMapping) {
        if self
            .config
            .slider_mappings
            .insert(key.to_string(), mapping)
            .is_none()
        {
            self.ordered_keys.push(key.to_string());
        }
    }
}

/// Borrowed view of a [`Config`] whose sliders serialize in index order.
#[derive(Serialize)]
struct OrderedConfig<'a> {
    slider_mappings: OrderedSliders<'a>,
    invert_sliders: bool,
    connection_info: &'a ConnectionInfo,
    noise_reduction_level: &'a str,
    config_save_interval: u64,
}

struct OrderedSliders<'a>(&'a ConfigStore);

impl Serialize for OrderedSliders<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let store = self.0;
        let mut map = serializer.serialize_map(Some(store.ordered_keys.len()))?;
        for key in &store.ordered_keys {
            if let Some(mapping) = store.config.slider_mappings.get(key) {
                map.serialize_entry(key, mapping)?;
            }
        }
        map.end()
    }
}

/// Slider names in document order, read before typed decoding loses it.
fn slider_key_order(root: &Value) -> Vec<String> {
    root.get(SLIDER_MAPPINGS_KEY)
        .and_then(Value::as_mapping)
        .map(|sliders| {
            sliders
                .keys()
                .filter_map(|key| key.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
