//! Application state (Model in TEA pattern)

use std::path::PathBuf;

use crate::config::{default_config_dir, Settings};
use crate::coordinator::FavoritesCoordinator;

/// Engine run phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppPhase {
    #[default]
    Running,
    Quitting,
}

/// Complete application state
#[derive(Debug)]
pub struct AppState {
    pub phase: AppPhase,

    /// Favorites and their feeds
    pub coordinator: FavoritesCoordinator,

    /// Settings the coordinator was built from
    pub settings: Settings,

    /// Directory holding config.toml and favorites.toml
    pub config_dir: PathBuf,

    /// Most recent non-fatal error (favorites reload, watcher)
    pub last_error: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::with_settings(default_config_dir(), Settings::default())
    }

    pub fn with_settings(config_dir: PathBuf, settings: Settings) -> Self {
        let coordinator = FavoritesCoordinator::new(
            settings.polling.poll_policy(),
            settings.polling.stagger(),
        );
        Self {
            phase: AppPhase::Running,
            coordinator,
            settings,
            config_dir,
            last_error: None,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.phase == AppPhase::Quitting
    }
}
