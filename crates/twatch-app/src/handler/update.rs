//! Main update function - handles state transitions (TEA pattern)

use twatch_core::prelude::*;

use crate::message::Message;
use crate::state::{AppPhase, AppState};

use super::{lifecycle, UpdateAction, UpdateResult};

/// Process a message and update state
/// Returns optional follow-up message and actions
pub fn update(state: &mut AppState, message: Message) -> UpdateResult {
    if state.phase == AppPhase::Quitting {
        trace!("Ignoring {:?} while quitting", message);
        return UpdateResult::none();
    }

    match message {
        Message::Quit => {
            state.phase = AppPhase::Quitting;
            state.coordinator.stop_all();
            UpdateResult::none()
        }

        // ─────────────────────────────────────────────────────────
        // Lifecycle Messages
        // ─────────────────────────────────────────────────────────
        Message::Foreground => lifecycle::handle_foreground(state),
        Message::Background => lifecycle::handle_background(state),
        Message::ViewVisible => lifecycle::handle_view_visible(state),
        Message::ViewHidden => lifecycle::handle_view_hidden(state),

        // ─────────────────────────────────────────────────────────
        // Favorites Messages
        // ─────────────────────────────────────────────────────────
        Message::FavoritesChanged { favorites } => {
            UpdateResult::actions(state.coordinator.rebuild(favorites))
        }

        Message::ReloadFavorites => UpdateResult::action(UpdateAction::LoadFavorites {
            config_dir: state.config_dir.clone(),
        }),

        Message::FavoritesLoadFailed { message } => {
            warn!("Keeping current favorites: {}", message);
            state.last_error = Some(message);
            UpdateResult::none()
        }

        Message::ResumeAll => UpdateResult::actions(state.coordinator.resume_all()),

        Message::StopAll => {
            state.coordinator.stop_all();
            UpdateResult::none()
        }

        // ─────────────────────────────────────────────────────────
        // Scheduler Messages
        // ─────────────────────────────────────────────────────────
        Message::StartDelayElapsed { subscription_id } => {
            UpdateResult::actions(state.coordinator.on_start_delay_elapsed(subscription_id))
        }

        Message::PollTick {
            subscription_id,
            generation,
            tick,
        } => UpdateResult::actions(
            state
                .coordinator
                .on_poll_tick(subscription_id, generation, tick),
        ),

        Message::ArrivalsFetched {
            subscription_id,
            generation,
            result,
        } => UpdateResult::actions(state.coordinator.on_arrivals_fetched(
            subscription_id,
            generation,
            result,
        )),

        // ─────────────────────────────────────────────────────────
        // File Watcher Messages
        // ─────────────────────────────────────────────────────────
        Message::WatcherError { message } => {
            warn!("Favorites watcher: {}", message);
            state.last_error = Some(message);
            UpdateResult::none()
        }
    }
}
