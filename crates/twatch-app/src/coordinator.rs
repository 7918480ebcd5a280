//! Favorites coordinator
//!
//! Owns the ordered list of [`FavoriteSubscription`]s, rebuilds it when the
//! favorites list changes, staggers feed startup, and fans activity-mode
//! changes and lifecycle commands out to every subscription.
//!
//! Like the feeds it owns, the coordinator performs no I/O. Operations return
//! [`UpdateAction`]s for the engine to dispatch and queue
//! [`Notification`]s that the engine turns into events.

use std::time::Duration;

use twatch_core::prelude::*;
use twatch_core::{ActivityMode, ArrivalSample, FavoriteEntity, FetchError};

use crate::actions::SpawnedTask;
use crate::feed::{FeedAction, PollPolicy};
use crate::handler::UpdateAction;
use crate::subscription::{
    FavoriteSubscription, SubscriptionAction, SubscriptionEffects, SubscriptionId,
};
use crate::view::FavoriteView;

/// Something observers of the favorites list should hear about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// The list was replaced
    Rebuilt,
    /// One row's observable state changed
    RowChanged(SubscriptionId),
    ModeChanged(ActivityMode),
}

#[derive(Debug)]
pub struct FavoritesCoordinator {
    subscriptions: Vec<FavoriteSubscription>,
    activity_mode: ActivityMode,
    policy: PollPolicy,
    stagger: Duration,
    notifications: Vec<Notification>,
}

impl FavoritesCoordinator {
    pub fn new(policy: PollPolicy, stagger: Duration) -> Self {
        Self {
            subscriptions: Vec::new(),
            activity_mode: ActivityMode::default(),
            policy,
            stagger,
            notifications: Vec::new(),
        }
    }

    // ─────────────────────────────────────────────────────────
    // Favorites list
    // ─────────────────────────────────────────────────────────

    /// Replace every subscription with one per favorite, in order
    ///
    /// Old subscriptions are stopped before any new one exists. The feed at
    /// index `i` starts `i * stagger` from now.
    pub fn rebuild(&mut self, favorites: Vec<FavoriteEntity>) -> Vec<UpdateAction> {
        for subscription in &mut self.subscriptions {
            subscription.stop();
        }
        self.subscriptions.clear();
        self.notifications
            .retain(|n| !matches!(n, Notification::RowChanged(_)));

        info!(
            "Rebuilding {} favorites ({} mode)",
            favorites.len(),
            self.activity_mode
        );

        let mut actions = Vec::new();
        for (index, entity) in favorites.into_iter().enumerate() {
            let mut subscription =
                FavoriteSubscription::new(entity, self.policy, self.activity_mode);
            let delay = self.stagger_for(index);
            let effects = subscription.start_delayed(delay);
            actions.extend(to_update_actions(subscription.id(), effects.actions));
            self.subscriptions.push(subscription);
        }

        self.notifications.push(Notification::Rebuilt);
        actions
    }

    /// Propagate a foreground/background transition
    pub fn set_activity_mode(&mut self, mode: ActivityMode) -> Vec<UpdateAction> {
        if mode == self.activity_mode {
            return Vec::new();
        }
        info!("Activity mode {} -> {}", self.activity_mode, mode);
        self.activity_mode = mode;
        self.notifications.push(Notification::ModeChanged(mode));

        let mut actions = Vec::new();
        for index in 0..self.subscriptions.len() {
            let effects = self.subscriptions[index].set_activity_mode(mode);
            actions.extend(self.apply(index, effects));
        }
        actions
    }

    /// Start every feed that is not running, including those still
    /// waiting on their stagger delay
    pub fn resume_all(&mut self) -> Vec<UpdateAction> {
        let mut actions = Vec::new();
        for index in 0..self.subscriptions.len() {
            let effects = self.subscriptions[index].resume();
            actions.extend(self.apply(index, effects));
        }
        if !actions.is_empty() {
            debug!("Resumed {} feeds", actions.len());
        }
        actions
    }

    /// Stop every feed without discarding the subscriptions
    ///
    /// Rows that were still loading their first result are notified, since
    /// a stopped feed no longer shows the loader.
    pub fn stop_all(&mut self) {
        for subscription in &mut self.subscriptions {
            if subscription.pause() {
                self.notifications
                    .push(Notification::RowChanged(subscription.id()));
            }
        }
        debug!("Stopped {} feeds", self.subscriptions.len());
    }

    /// Stop and discard everything
    pub fn shutdown(&mut self) {
        for subscription in &mut self.subscriptions {
            subscription.stop();
        }
        self.subscriptions.clear();
        self.notifications.clear();
    }

    // ─────────────────────────────────────────────────────────
    // Scheduler callbacks
    // ─────────────────────────────────────────────────────────

    pub fn on_start_delay_elapsed(&mut self, id: SubscriptionId) -> Vec<UpdateAction> {
        let Some(index) = self.index_of(id) else {
            trace!("Start timer for discarded subscription {}", id);
            return Vec::new();
        };
        let effects = self.subscriptions[index].on_start_delay_elapsed();
        self.apply(index, effects)
    }

    pub fn on_poll_tick(
        &mut self,
        id: SubscriptionId,
        generation: u64,
        tick: u64,
    ) -> Vec<UpdateAction> {
        let Some(index) = self.index_of(id) else {
            trace!("Poll tick for discarded subscription {}", id);
            return Vec::new();
        };
        let effects = self.subscriptions[index].on_poll_tick(generation, tick);
        self.apply(index, effects)
    }

    pub fn on_arrivals_fetched(
        &mut self,
        id: SubscriptionId,
        generation: u64,
        result: std::result::Result<Vec<ArrivalSample>, FetchError>,
    ) -> Vec<UpdateAction> {
        let Some(index) = self.index_of(id) else {
            trace!("Fetch result for discarded subscription {}", id);
            return Vec::new();
        };
        let effects = self.subscriptions[index].on_fetch_complete(generation, result);
        self.apply(index, effects)
    }

    /// Hand a freshly spawned timer or fetch to the subscription that asked
    /// for it
    ///
    /// Tasks for subscriptions that no longer exist are cancelled.
    pub fn attach_task(&mut self, spawned: SpawnedTask) {
        match spawned {
            SpawnedTask::Start {
                subscription_id,
                task,
            } => match self.index_of(subscription_id) {
                Some(index) => {
                    self.subscriptions[index].attach_start_timer(task);
                }
                None => task.cancel(),
            },
            SpawnedTask::Poll {
                subscription_id,
                generation,
                tick,
                task,
            } => match self.index_of(subscription_id) {
                Some(index) => {
                    self.subscriptions[index].attach_poll_timer(generation, tick, task);
                }
                None => task.cancel(),
            },
            SpawnedTask::Fetch {
                subscription_id,
                generation,
                task,
            } => match self.index_of(subscription_id) {
                Some(index) => {
                    self.subscriptions[index].attach_fetch(generation, task);
                }
                None => task.abort(),
            },
        }
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    pub fn activity_mode(&self) -> ActivityMode {
        self.activity_mode
    }

    pub fn subscriptions(&self) -> &[FavoriteSubscription] {
        &self.subscriptions
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub fn index_of(&self, id: SubscriptionId) -> Option<usize> {
        self.subscriptions.iter().position(|s| s.id() == id)
    }

    /// All rows in display order
    pub fn views(&self) -> Vec<FavoriteView> {
        self.subscriptions.iter().map(|s| s.view()).collect()
    }

    /// One row and its position
    pub fn view(&self, id: SubscriptionId) -> Option<(usize, FavoriteView)> {
        let index = self.index_of(id)?;
        Some((index, self.subscriptions[index].view()))
    }

    /// Drain queued notifications in the order they were raised
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    // ─────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────

    fn stagger_for(&self, index: usize) -> Duration {
        let factor = u32::try_from(index).unwrap_or(u32::MAX);
        self.stagger.saturating_mul(factor)
    }

    fn apply(&mut self, index: usize, effects: SubscriptionEffects) -> Vec<UpdateAction> {
        let id = self.subscriptions[index].id();
        if effects.changed {
            self.notifications.push(Notification::RowChanged(id));
        }
        to_update_actions(id, effects.actions)
    }
}

fn to_update_actions(
    subscription_id: SubscriptionId,
    actions: Vec<SubscriptionAction>,
) -> Vec<UpdateAction> {
    actions
        .into_iter()
        .map(|action| match action {
            SubscriptionAction::ScheduleStart { delay } => UpdateAction::ScheduleStart {
                subscription_id,
                delay,
            },
            SubscriptionAction::Feed(FeedAction::Fetch { generation, query }) => {
                UpdateAction::FetchArrivals {
                    subscription_id,
                    generation,
                    query,
                }
            }
            SubscriptionAction::Feed(FeedAction::SchedulePoll {
                generation,
                tick,
                delay,
            }) => UpdateAction::SchedulePoll {
                subscription_id,
                generation,
                tick,
                delay,
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::SubscriptionPhase;

    fn favorites() -> Vec<FavoriteEntity> {
        vec![
            FavoriteEntity::new("G", "Bedford", "N"),
            FavoriteEntity::new("L", "Lorimer St", "S"),
            FavoriteEntity::new("A", "Jay St", "N"),
        ]
    }

    fn coordinator() -> FavoritesCoordinator {
        FavoritesCoordinator::new(PollPolicy::default(), Duration::from_millis(500))
    }

    fn fetch_of(actions: &[UpdateAction], id: SubscriptionId) -> u64 {
        actions
            .iter()
            .find_map(|a| match a {
                UpdateAction::FetchArrivals {
                    subscription_id,
                    generation,
                    ..
                } if *subscription_id == id => Some(*generation),
                _ => None,
            })
            .expect("no fetch for subscription")
    }

    #[test]
    fn test_rebuild_staggers_starts() {
        let mut coordinator = coordinator();
        let actions = coordinator.rebuild(favorites());

        let ids: Vec<_> = coordinator.subscriptions().iter().map(|s| s.id()).collect();
        assert_eq!(actions.len(), 3);
        assert!(matches!(
            actions[0],
            UpdateAction::FetchArrivals { subscription_id, .. } if subscription_id == ids[0]
        ));
        assert_eq!(
            actions[1],
            UpdateAction::ScheduleStart {
                subscription_id: ids[1],
                delay: Duration::from_millis(500)
            }
        );
        assert_eq!(
            actions[2],
            UpdateAction::ScheduleStart {
                subscription_id: ids[2],
                delay: Duration::from_millis(1000)
            }
        );
        assert_eq!(coordinator.take_notifications(), vec![Notification::Rebuilt]);
    }

    #[test]
    fn test_rebuild_preserves_order() {
        let mut coordinator = coordinator();
        let _ = coordinator.rebuild(favorites());

        let lines: Vec<_> = coordinator
            .views()
            .into_iter()
            .map(|v| v.entity.line_id)
            .collect();
        assert_eq!(lines, vec!["G", "L", "A"]);
    }

    #[test]
    fn test_rebuild_replaces_subscriptions_and_ignores_old_results() {
        let mut coordinator = coordinator();
        let actions = coordinator.rebuild(favorites());
        let old_id = coordinator.subscriptions()[0].id();
        let old_gen = fetch_of(&actions, old_id);

        let _ = coordinator.rebuild(vec![FavoriteEntity::new("7", "Vernon", "S")]);
        assert_eq!(coordinator.len(), 1);
        assert!(coordinator.index_of(old_id).is_none());

        let follow_up =
            coordinator.on_arrivals_fetched(old_id, old_gen, Ok(vec![ArrivalSample::new(1)]));
        assert!(follow_up.is_empty());
        assert_eq!(
            coordinator.take_notifications(),
            vec![Notification::Rebuilt, Notification::Rebuilt]
        );
    }

    #[test]
    fn test_rebuild_empty_list() {
        let mut coordinator = coordinator();
        let _ = coordinator.rebuild(favorites());
        let actions = coordinator.rebuild(Vec::new());

        assert!(actions.is_empty());
        assert!(coordinator.is_empty());
        assert!(coordinator.views().is_empty());
    }

    #[test]
    fn test_rebuild_keeps_duplicates() {
        let mut coordinator = coordinator();
        let twice = vec![
            FavoriteEntity::new("G", "Bedford", "N"),
            FavoriteEntity::new("G", "Bedford", "N"),
        ];
        let _ = coordinator.rebuild(twice);

        assert_eq!(coordinator.len(), 2);
        assert_ne!(
            coordinator.subscriptions()[0].id(),
            coordinator.subscriptions()[1].id()
        );
    }

    #[test]
    fn test_fetch_result_notifies_row() {
        let mut coordinator = coordinator();
        let actions = coordinator.rebuild(favorites());
        let id = coordinator.subscriptions()[0].id();
        let generation = fetch_of(&actions, id);
        let _ = coordinator.take_notifications();

        let follow_up = coordinator.on_arrivals_fetched(
            id,
            generation,
            Ok(vec![ArrivalSample::new(5), ArrivalSample::new(12)]),
        );

        assert!(matches!(
            follow_up.as_slice(),
            [UpdateAction::SchedulePoll { delay, .. }] if *delay == Duration::from_secs(30)
        ));
        assert_eq!(
            coordinator.take_notifications(),
            vec![Notification::RowChanged(id)]
        );
        let (index, view) = coordinator.view(id).unwrap();
        assert_eq!(index, 0);
        assert_eq!(view.display_text, "5m");
    }

    #[test]
    fn test_set_activity_mode_notifies_once() {
        let mut coordinator = coordinator();
        let _ = coordinator.rebuild(favorites());
        let _ = coordinator.take_notifications();

        let _ = coordinator.set_activity_mode(ActivityMode::Background);
        let _ = coordinator.set_activity_mode(ActivityMode::Background);

        assert_eq!(
            coordinator.take_notifications(),
            vec![Notification::ModeChanged(ActivityMode::Background)]
        );
        assert!(coordinator
            .subscriptions()
            .iter()
            .all(|s| s.feed().activity_mode() == ActivityMode::Background));
    }

    #[test]
    fn test_new_subscriptions_inherit_mode() {
        let mut coordinator = coordinator();
        let _ = coordinator.set_activity_mode(ActivityMode::Background);
        let _ = coordinator.rebuild(favorites());

        assert!(coordinator
            .subscriptions()
            .iter()
            .all(|s| s.feed().activity_mode() == ActivityMode::Background));
    }

    #[test]
    fn test_resume_all_starts_waiting_subscriptions() {
        let mut coordinator = coordinator();
        let _ = coordinator.rebuild(favorites());

        let actions = coordinator.resume_all();

        assert_eq!(actions.len(), 2);
        assert!(actions
            .iter()
            .all(|a| matches!(a, UpdateAction::FetchArrivals { .. })));
        assert!(coordinator
            .subscriptions()
            .iter()
            .all(|s| s.phase() == SubscriptionPhase::Started && s.feed().is_running()));
    }

    #[test]
    fn test_stop_all_then_resume_all() {
        let mut coordinator = coordinator();
        let _ = coordinator.rebuild(favorites());
        let _ = coordinator.resume_all();

        coordinator.stop_all();
        assert!(coordinator
            .subscriptions()
            .iter()
            .all(|s| !s.feed().is_running()));
        assert_eq!(coordinator.len(), 3);

        let actions = coordinator.resume_all();
        assert_eq!(actions.len(), 3);
    }

    #[test]
    fn test_stop_all_notifies_rows_still_loading() {
        let mut coordinator = coordinator();
        let actions = coordinator.rebuild(favorites());
        let first = coordinator.subscriptions()[0].id();
        let _ = coordinator.on_arrivals_fetched(
            first,
            fetch_of(&actions, first),
            Ok(vec![ArrivalSample::new(4)]),
        );
        let _ = coordinator.resume_all();
        let _ = coordinator.take_notifications();

        coordinator.stop_all();

        // The first row already has data; the other two lose their loader
        let ids: Vec<_> = coordinator.subscriptions()[1..]
            .iter()
            .map(|s| s.id())
            .collect();
        assert_eq!(
            coordinator.take_notifications(),
            vec![
                Notification::RowChanged(ids[0]),
                Notification::RowChanged(ids[1])
            ]
        );
        assert!(coordinator.views().iter().all(|v| !v.should_show_loader));
        assert_eq!(coordinator.views()[0].display_text, "4m");
        assert_eq!(coordinator.views()[1].display_text, crate::feed::PLACEHOLDER_TEXT);
    }

    #[tokio::test]
    async fn test_fetch_for_discarded_subscription_is_aborted() {
        let mut coordinator = coordinator();
        let actions = coordinator.rebuild(favorites());
        let old_id = coordinator.subscriptions()[0].id();
        let old_gen = fetch_of(&actions, old_id);
        let _ = coordinator.rebuild(favorites());

        let (tx, mut rx) = tokio::sync::mpsc::channel::<crate::message::Message>(1);
        coordinator.attach_task(SpawnedTask::Fetch {
            subscription_id: old_id,
            generation: old_gen,
            task: crate::deferred::FetchTask::new(tokio::spawn(async move {
                std::future::pending::<()>().await;
                drop(tx);
            })),
        });

        // Aborting drops the task's sender
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_attached_fetch_is_routed_to_its_row() {
        let mut coordinator = coordinator();
        let actions = coordinator.rebuild(favorites());
        let id = coordinator.subscriptions()[0].id();

        coordinator.attach_task(SpawnedTask::Fetch {
            subscription_id: id,
            generation: fetch_of(&actions, id),
            task: crate::deferred::FetchTask::new(tokio::spawn(std::future::pending::<()>())),
        });

        assert!(coordinator.subscriptions()[0].feed().has_fetch_task());
        coordinator.stop_all();
        assert!(!coordinator.subscriptions()[0].feed().has_fetch_task());
    }

    #[test]
    fn test_stop_all_before_stagger_then_late_timer() {
        let mut coordinator = coordinator();
        let _ = coordinator.rebuild(favorites());
        let id = coordinator.subscriptions()[2].id();

        coordinator.stop_all();

        assert!(coordinator.on_start_delay_elapsed(id).is_empty());
        assert!(!coordinator.subscriptions()[2].feed().is_running());
    }

    #[test]
    fn test_unknown_subscription_is_ignored() {
        let mut coordinator = coordinator();
        assert!(coordinator.on_start_delay_elapsed(999_999).is_empty());
        assert!(coordinator.on_poll_tick(999_999, 1, 1).is_empty());
        assert!(coordinator
            .on_arrivals_fetched(999_999, 1, Err(FetchError::NoData))
            .is_empty());
    }

    #[test]
    fn test_shutdown_clears() {
        let mut coordinator = coordinator();
        let _ = coordinator.rebuild(favorites());
        coordinator.shutdown();
        assert!(coordinator.is_empty());
        assert!(coordinator.take_notifications().is_empty());
    }
}
