//! Domain events emitted by the Engine for external consumers
//!
//! Events are broadcast after each message processing cycle via
//! `Engine::subscribe()`, so subscribers see a consistent view of state.

use twatch_core::ActivityMode;

use crate::view::FavoriteView;

/// Domain events emitted by the Engine for external consumers.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// The favorites list was rebuilt; `views` is the full new list
    FavoritesRebuilt { views: Vec<FavoriteView> },

    /// One row changed
    FavoriteUpdated { index: usize, view: FavoriteView },

    /// The foreground/background mode changed
    ActivityModeChanged { mode: ActivityMode },

    /// A non-fatal error (watcher failure, unreadable favorites file)
    Error { message: String },

    /// Engine is shutting down
    Shutdown,
}

impl EngineEvent {
    /// Event name for logging and the headless protocol
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::FavoritesRebuilt { .. } => "favorites_rebuilt",
            Self::FavoriteUpdated { .. } => "favorite_updated",
            Self::ActivityModeChanged { .. } => "activity_mode_changed",
            Self::Error { .. } => "error",
            Self::Shutdown => "shutdown",
        }
    }
}
