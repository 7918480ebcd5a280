//! Handler module - TEA update function and message handlers
//!
//! Organized into submodules:
//! - `update`: Main update() function and message dispatch
//! - `lifecycle`: Foreground/background and view visibility handlers

pub(crate) mod lifecycle;
pub(crate) mod update;


use std::path::PathBuf;
use std::time::Duration;

use twatch_core::ArrivalQuery;

use crate::message::Message;
use crate::subscription::SubscriptionId;

// Re-export main entry point
pub use update::update;

/// Actions that the event loop should perform after update
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateAction {
    /// Run one fetch; the result comes back as `ArrivalsFetched`
    FetchArrivals {
        subscription_id: SubscriptionId,
        generation: u64,
        query: ArrivalQuery,
    },

    /// Deliver `PollTick` after `delay`
    SchedulePoll {
        subscription_id: SubscriptionId,
        generation: u64,
        tick: u64,
        delay: Duration,
    },

    /// Deliver `StartDelayElapsed` after `delay`
    ScheduleStart {
        subscription_id: SubscriptionId,
        delay: Duration,
    },

    /// Read favorites.toml; the result comes back as `FavoritesChanged`
    LoadFavorites { config_dir: PathBuf },
}

/// Result of processing a message
#[derive(Debug, Default)]
pub struct UpdateResult {
    /// Optional follow-up message to process
    pub message: Option<Message>,
    /// Actions for the event loop to perform, in order
    pub actions: Vec<UpdateAction>,
}

impl UpdateResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn action(action: UpdateAction) -> Self {
        Self::actions(vec![action])
    }

    pub fn actions(actions: Vec<UpdateAction>) -> Self {
        Self {
            message: None,
            actions,
        }
    }
}
