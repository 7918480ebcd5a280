//! Message types for the application (TEA pattern)

use twatch_core::{ArrivalSample, FavoriteEntity, FetchError};

use crate::subscription::SubscriptionId;

/// All possible messages/actions in the application
#[derive(Debug, Clone)]
pub enum Message {
    // ─────────────────────────────────────────────────────────
    // Lifecycle Messages
    // ─────────────────────────────────────────────────────────
    /// App entered the foreground
    Foreground,

    /// App entered the background
    Background,

    /// Favorites view became visible
    ViewVisible,

    /// Favorites view was hidden
    ViewHidden,

    // ─────────────────────────────────────────────────────────
    // Favorites Messages
    // ─────────────────────────────────────────────────────────
    /// The favorites list was replaced
    FavoritesChanged { favorites: Vec<FavoriteEntity> },

    /// Re-read favorites.toml and rebuild
    ReloadFavorites,

    /// favorites.toml could not be read; the current list stays in place
    FavoritesLoadFailed { message: String },

    /// Start every feed that isn't running
    ResumeAll,

    /// Stop every feed, keeping subscriptions
    StopAll,

    // ─────────────────────────────────────────────────────────
    // Scheduler Messages
    // ─────────────────────────────────────────────────────────
    /// A subscription's stagger delay elapsed
    StartDelayElapsed { subscription_id: SubscriptionId },

    /// A feed's poll timer fired
    PollTick {
        subscription_id: SubscriptionId,
        generation: u64,
        tick: u64,
    },

    /// A fetch finished
    ArrivalsFetched {
        subscription_id: SubscriptionId,
        generation: u64,
        result: Result<Vec<ArrivalSample>, FetchError>,
    },

    // ─────────────────────────────────────────────────────────
    // File Watcher Messages
    // ─────────────────────────────────────────────────────────
    /// Watcher error occurred
    WatcherError { message: String },

    /// Shut down (signal handler, `quit` command)
    Quit,
}
