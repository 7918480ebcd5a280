//! Configuration types for Transit Watch
//!
//! Defines:
//! - `Settings` - Global application settings (`config.toml`)
//! - `FavoritesFile` - Persisted favorites list (`favorites.toml`)
//! - Related sub-types

use std::time::Duration;

use serde::{Deserialize, Serialize};
use twatch_core::FavoriteEntity;

use crate::feed::{PollPolicy, MIN_POLL_INTERVAL};

/// Application settings (config.toml)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub polling: PollingSettings,

    #[serde(default)]
    pub transit: TransitSettings,

    #[serde(default)]
    pub watcher: WatcherSettings,
}

/// Poll frequency and startup stagger
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PollingSettings {
    /// Seconds between fetches while the app is in the foreground
    #[serde(default = "default_foreground_interval")]
    pub foreground_interval_seconds: u64,

    /// Seconds between fetches while the app is in the background
    #[serde(default = "default_background_interval")]
    pub background_interval_seconds: u64,

    /// Stop polling entirely while in the background
    #[serde(default)]
    pub suspend_in_background: bool,

    /// Startup offset between consecutive favorites, in milliseconds
    #[serde(default = "default_stagger_ms")]
    pub stagger_ms: u64,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            foreground_interval_seconds: default_foreground_interval(),
            background_interval_seconds: default_background_interval(),
            suspend_in_background: false,
            stagger_ms: default_stagger_ms(),
        }
    }
}

impl PollingSettings {
    /// Build the poll policy, clamping intervals to [`MIN_POLL_INTERVAL`]
    pub fn poll_policy(&self) -> PollPolicy {
        let foreground =
            Duration::from_secs(self.foreground_interval_seconds).max(MIN_POLL_INTERVAL);
        if self.suspend_in_background {
            PollPolicy::suspended_in_background(foreground)
        } else {
            let background =
                Duration::from_secs(self.background_interval_seconds).max(MIN_POLL_INTERVAL);
            PollPolicy::new(foreground, background)
        }
    }

    pub fn stagger(&self) -> Duration {
        Duration::from_millis(self.stagger_ms)
    }
}

fn default_foreground_interval() -> u64 {
    30
}

fn default_background_interval() -> u64 {
    180
}

fn default_stagger_ms() -> u64 {
    500
}

/// Transit API settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TransitSettings {
    /// Base URL of the arrivals API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for TransitSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl TransitSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_timeout_seconds() -> u64 {
    10
}

/// Favorites file watcher settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WatcherSettings {
    /// Rebuild the favorites list when favorites.toml changes
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: default_debounce_ms(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_debounce_ms() -> u64 {
    300
}

/// Favorites file (favorites.toml)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct FavoritesFile {
    /// Favorites in display order
    #[serde(default)]
    pub favorites: Vec<FavoriteEntity>,
}
