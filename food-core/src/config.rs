use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ConfigError;

const APP_DIR: &str = "foodswipe";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub deck: DeckConfig,
    pub gesture: GestureConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
    /// Remaining-card count below which the deck is extended.
    pub low_water_mark: usize,
    pub extend_batch: usize,
    pub lookahead: usize,
    pub window: usize,
    pub initial_prefetch: usize,
    pub settle_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub swipe_threshold: f32,
    pub vertical_swipe_threshold: f32,
    /// Horizontal travel needed before a move is captured as a drag.
    pub capture_slop: f32,
    pub max_rotation_deg: f32,
    pub stack_offset: f32,
    pub vertical_damping: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub capacity: usize,
    pub ttl_minutes: u64,
    pub batch_size: usize,
    pub request_timeout_seconds: u64,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            low_water_mark: 3,
            extend_batch: 5,
            lookahead: 3,
            window: 3,
            initial_prefetch: 5,
            settle_ms: 800,
        }
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            swipe_threshold: 120.0,
            vertical_swipe_threshold: 80.0,
            capture_slop: 10.0,
            max_rotation_deg: 15.0,
            stack_offset: 12.0,
            vertical_damping: 0.3,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 50,
            ttl_minutes: 30,
            batch_size: 5,
            request_timeout_seconds: 10,
        }
    }
}

impl DeckConfig {
    pub fn settle_window(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_minutes.saturating_mul(60))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Directory holding `config.json` and an optional `foods.json`.
pub fn app_config_dir() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(config_dir.join(APP_DIR))
}

impl AppConfig {
    pub fn config_file_path() -> Result<PathBuf, ConfigError> {
        Ok(app_config_dir()?.join("config.json"))
    }

    /// Loads the user configuration, or writes and returns the defaults.
    pub fn load() -> Self {
        let loaded = Self::config_file_path().and_then(|path| Self::load_from(&path));
        match loaded {
            Ok(config) => config,
            Err(err) => {
                warn!(error = %err, "failed to load configuration, using defaults");
                let config = Self::default();
                if let Err(save_err) = config.save() {
                    warn!(error = %save_err, "failed to save default configuration");
                }
                config
            }
        }
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&content)?;
        debug!(path = %path.as_ref().display(), "configuration loaded");
        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(Self::config_file_path()?)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        // Atomic write, same as the data stores.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_constants() {
        let config = AppConfig::default();
        assert_eq!(config.deck.low_water_mark, 3);
        assert_eq!(config.deck.extend_batch, 5);
        assert_eq!(config.deck.settle_window(), Duration::from_millis(800));
        assert_eq!(config.gesture.swipe_threshold, 120.0);
        assert_eq!(config.gesture.vertical_swipe_threshold, 80.0);
        assert_eq!(config.cache.capacity, 50);
        assert_eq!(config.cache.ttl(), Duration::from_secs(30 * 60));
        assert_eq!(config.cache.batch_size, 5);
    }

    #[test]
    fn oversized_ttl_saturates() {
        let config: CacheConfig =
            serde_json::from_str(&format!(r#"{{ "ttl_minutes": {} }}"#, u64::MAX)).unwrap();
        assert_eq!(config.ttl(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "cache": { "capacity": 10 } }"#).unwrap();
        assert_eq!(config.cache.capacity, 10);
        assert_eq!(config.cache.ttl_minutes, 30);
        assert_eq!(config.deck, DeckConfig::default());
    }

    #[test]
    fn save_and_reload_round_trip_through_disk() {
        let mut dir = std::env::temp_dir();
        dir.push(format!("foodswipe_config_{}", std::process::id()));
        let path = dir.join("config.json");

        let mut config = AppConfig::default();
        config.deck.window = 4;
        config.save_to(&path).unwrap();

        let reloaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(reloaded, config);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
