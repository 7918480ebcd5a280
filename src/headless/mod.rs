//! Headless mode - NDJSON event output
//!
//! Runs the polling engine without any UI and writes structured JSON events
//! to stdout, one per line. Lifecycle commands are read from stdin, so a
//! host process (or a shell) can drive foreground/background transitions.
//!
//! # Example Output
//!
//! ```json
//! {"event":"favorites_rebuilt","favorites":[...],"timestamp":1704700001000}
//! {"event":"favorite_updated","index":0,"favorite":{...},"timestamp":1704700001400}
//! {"event":"activity_mode_changed","mode":"background","timestamp":1704700030000}
//! ```

pub mod runner;

use chrono::Utc;
use serde::Serialize;
use std::io::{self, Write};
use tracing::error;

use twatch_app::{EngineEvent, FavoriteView};
use twatch_core::ActivityMode;

/// Events emitted in headless mode
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HeadlessEvent {
    /// The favorites list was (re)built
    FavoritesRebuilt {
        favorites: Vec<FavoriteView>,
        timestamp: i64,
    },

    /// One favorite row changed
    FavoriteUpdated {
        index: usize,
        favorite: FavoriteView,
        timestamp: i64,
    },

    /// Foreground/background mode changed
    ActivityModeChanged { mode: ActivityMode, timestamp: i64 },

    /// Error occurred
    Error {
        message: String,
        fatal: bool,
        timestamp: i64,
    },

    /// Engine shut down
    Shutdown { timestamp: i64 },
}

impl HeadlessEvent {
    /// Emit this event to stdout as JSON
    pub fn emit(&self) {
        let json = match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize headless event: {}", e);
                return;
            }
        };

        let mut stdout = io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", json) {
            error!("Failed to write headless event to stdout: {}", e);
            return;
        }

        if let Err(e) = stdout.flush() {
            error!("Failed to flush headless stdout: {}", e);
        }
    }

    /// Get current timestamp in milliseconds
    fn now() -> i64 {
        Utc::now().timestamp_millis()
    }

    pub fn error(message: String, fatal: bool) -> Self {
        Self::Error {
            message,
            fatal,
            timestamp: Self::now(),
        }
    }
}

impl From<EngineEvent> for HeadlessEvent {
    fn from(event: EngineEvent) -> Self {
        let timestamp = Self::now();
        match event {
            EngineEvent::FavoritesRebuilt { views } => Self::FavoritesRebuilt {
                favorites: views,
                timestamp,
            },
            EngineEvent::FavoriteUpdated { index, view } => Self::FavoriteUpdated {
                index,
                favorite: view,
                timestamp,
            },
            EngineEvent::ActivityModeChanged { mode } => {
                Self::ActivityModeChanged { mode, timestamp }
            }
            EngineEvent::Error { message } => Self::Error {
                message,
                fatal: false,
                timestamp,
            },
            EngineEvent::Shutdown => Self::Shutdown { timestamp },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_mode_changed_serialization() {
        let event = HeadlessEvent::from(EngineEvent::ActivityModeChanged {
            mode: ActivityMode::Background,
        });
        let json = serde_json::to_string(&event).expect("serialization failed");

        let value: serde_json::Value = serde_json::from_str(&json).expect("invalid JSON");

        assert_eq!(value["event"], "activity_mode_changed");
        assert_eq!(value["mode"], "background");
        assert!(value["timestamp"].is_number());
    }

    #[test]
    fn test_engine_error_is_not_fatal() {
        let event = HeadlessEvent::from(EngineEvent::Error {
            message: "inotify limit".to_string(),
        });
        let value = serde_json::to_value(&event).expect("serialization failed");

        assert_eq!(value["event"], "error");
        assert_eq!(value["message"], "inotify limit");
        assert_eq!(value["fatal"], false);
    }

    #[test]
    fn test_fatal_error_serialization() {
        let event = HeadlessEvent::error("favorites.toml is malformed".to_string(), true);
        let value = serde_json::to_value(&event).expect("serialization failed");

        assert_eq!(value["event"], "error");
        assert_eq!(value["fatal"], true);
        assert!(value["timestamp"].is_number());
    }

    #[test]
    fn test_favorites_rebuilt_serialization() {
        let event = HeadlessEvent::from(EngineEvent::FavoritesRebuilt { views: vec![] });
        let value = serde_json::to_value(&event).expect("serialization failed");

        assert_eq!(value["event"], "favorites_rebuilt");
        assert!(value["favorites"].as_array().expect("array").is_empty());
    }

    #[test]
    fn test_shutdown_serialization() {
        let value = serde_json::to_value(HeadlessEvent::from(EngineEvent::Shutdown))
            .expect("serialization failed");

        assert_eq!(value["event"], "shutdown");
        assert!(value["timestamp"].is_number());
    }
}
