//! App lifecycle handlers
//!
//! Maps host lifecycle signals onto the coordinator:
//! - foreground: foreground cadence, then resume every feed
//! - background: background cadence (or suspension)
//! - view visible: resume every feed
//! - view hidden: nothing; polling continues at the current cadence

use twatch_core::prelude::*;
use twatch_core::ActivityMode;

use crate::state::AppState;

use super::UpdateResult;

pub fn handle_foreground(state: &mut AppState) -> UpdateResult {
    let mut actions = state
        .coordinator
        .set_activity_mode(ActivityMode::Foreground);
    actions.extend(state.coordinator.resume_all());
    UpdateResult::actions(actions)
}

pub fn handle_background(state: &mut AppState) -> UpdateResult {
    UpdateResult::actions(
        state
            .coordinator
            .set_activity_mode(ActivityMode::Background),
    )
}

pub fn handle_view_visible(state: &mut AppState) -> UpdateResult {
    UpdateResult::actions(state.coordinator.resume_all())
}

pub fn handle_view_hidden(state: &mut AppState) -> UpdateResult {
    debug!(
        "Favorites view hidden; {} feeds keep polling",
        state.coordinator.len()
    );
    UpdateResult::none()
}
