//! Render-ready row state

use chrono::{DateTime, Local};
use serde::Serialize;
use twatch_core::FavoriteEntity;

use crate::subscription::{FavoriteSubscription, SubscriptionId};

/// How many upcoming arrivals a row carries
pub const UPCOMING_LIMIT: usize = 3;

/// Snapshot of one favorite row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FavoriteView {
    pub subscription_id: SubscriptionId,
    pub entity: FavoriteEntity,

    /// "Now", "5m", "--" or the placeholder
    pub display_text: String,
    pub should_show_loader: bool,

    /// The last fetch failed
    pub has_error: bool,
    /// The failure should be surfaced (no samples to show instead)
    pub show_error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Minutes until the next few arrivals, soonest first
    pub upcoming_minutes: Vec<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Local>>,

    pub revision: u64,
}

impl FavoriteView {
    pub fn from_subscription(subscription: &FavoriteSubscription) -> Self {
        let feed = subscription.feed();
        Self {
            subscription_id: subscription.id(),
            entity: subscription.entity().clone(),
            display_text: feed.display_text(),
            should_show_loader: feed.should_show_loader(),
            has_error: feed.has_error(),
            show_error: feed.shows_error(),
            error_message: feed.last_error().map(|e| e.to_string()),
            upcoming_minutes: feed
                .samples()
                .iter()
                .take(UPCOMING_LIMIT)
                .map(|s| s.minutes_until_arrival)
                .collect(),
            last_updated: feed.last_updated(),
            revision: feed.revision(),
        }
    }
}

impl std::fmt::Display for FavoriteView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = if self.should_show_loader {
            "loading"
        } else if self.show_error {
            "error"
        } else {
            ""
        };
        if status.is_empty() {
            write!(f, "{:<32} {:>5}", self.entity.to_string(), self.display_text)
        } else {
            write!(
                f,
                "{:<32} {:>5} ({})",
                self.entity.to_string(),
                self.display_text,
                status
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{PollPolicy, PLACEHOLDER_TEXT};
    use twatch_core::ActivityMode;

    #[test]
    fn test_view_of_fresh_subscription() {
        let sub = FavoriteSubscription::new(
            FavoriteEntity::new("G", "Bedford", "N"),
            PollPolicy::default(),
            ActivityMode::Foreground,
        );
        let view = sub.view();

        assert_eq!(view.subscription_id, sub.id());
        assert_eq!(view.display_text, PLACEHOLDER_TEXT);
        assert!(!view.should_show_loader);
        assert!(!view.has_error);
        assert!(view.upcoming_minutes.is_empty());
    }

    #[test]
    fn test_view_serializes_without_empty_optionals() {
        let sub = FavoriteSubscription::new(
            FavoriteEntity::new("L", "Lorimer St", "S"),
            PollPolicy::default(),
            ActivityMode::Foreground,
        );
        let json = serde_json::to_value(sub.view()).unwrap();

        assert_eq!(json["entity"]["line_id"], "L");
        assert!(json.get("error_message").is_none());
        assert!(json.get("last_updated").is_none());
    }

    #[test]
    fn test_display_marks_loading() {
        let mut sub = FavoriteSubscription::new(
            FavoriteEntity::new("G", "Bedford", "N"),
            PollPolicy::default(),
            ActivityMode::Foreground,
        );
        let _ = sub.start_delayed(std::time::Duration::ZERO);

        assert!(sub.view().to_string().ends_with("(loading)"));
    }
}
