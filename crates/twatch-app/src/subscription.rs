//! Per-favorite subscription lifecycle
//!
//! A [`FavoriteSubscription`] binds one [`FavoriteEntity`] to its own
//! [`ArrivalFeed`] and gates when that feed starts:
//!
//! ```text
//! Created ──start──▶ Started ──stop──▶ Stopped
//!    │                                    ▲
//!    └───────────────stop─────────────────┘
//! ```
//!
//! `Stopped` is terminal. A subscription starts its feed at most once per
//! lifetime through `start_delayed`; later restarts happen only via
//! [`FavoriteSubscription::resume`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use twatch_core::prelude::*;
use twatch_core::{ActivityMode, ArrivalSample, FavoriteEntity, FetchError};

use crate::deferred::{DeferredTask, FetchTask};
use crate::feed::{ArrivalFeed, FeedAction, FeedEffects, PollPolicy};
use crate::view::FavoriteView;

/// Unique identifier for a subscription
pub type SubscriptionId = u64;

static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a process-unique subscription id
pub fn next_subscription_id() -> SubscriptionId {
    NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionPhase {
    /// Waiting for its (possibly delayed) start
    Created,
    Started,
    /// Terminal; the feed never runs again
    Stopped,
}

/// Work a subscription asks its owner to start
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptionAction {
    /// Call `on_start_delay_elapsed` after `delay`
    ScheduleStart { delay: Duration },
    Feed(FeedAction),
}

/// Result of a subscription operation
#[derive(Debug, Default, PartialEq)]
#[must_use]
pub struct SubscriptionEffects {
    pub actions: Vec<SubscriptionAction>,
    pub changed: bool,
}

impl SubscriptionEffects {
    pub fn none() -> Self {
        Self::default()
    }
}

impl From<FeedEffects> for SubscriptionEffects {
    fn from(effects: FeedEffects) -> Self {
        Self {
            actions: effects
                .actions
                .into_iter()
                .map(SubscriptionAction::Feed)
                .collect(),
            changed: effects.changed,
        }
    }
}

/// One favorite row and the feed behind it
#[derive(Debug)]
pub struct FavoriteSubscription {
    id: SubscriptionId,
    entity: FavoriteEntity,
    feed: ArrivalFeed,
    phase: SubscriptionPhase,
    has_started: bool,
    /// A delayed start was requested and not yet fired or cancelled
    start_pending: bool,
    start_timer: Option<DeferredTask>,
}

impl FavoriteSubscription {
    pub fn new(entity: FavoriteEntity, policy: PollPolicy, mode: ActivityMode) -> Self {
        Self {
            id: next_subscription_id(),
            entity,
            feed: ArrivalFeed::new(policy, mode),
            phase: SubscriptionPhase::Created,
            has_started: false,
            start_pending: false,
            start_timer: None,
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn entity(&self) -> &FavoriteEntity {
        &self.entity
    }

    pub fn feed(&self) -> &ArrivalFeed {
        &self.feed
    }

    pub fn phase(&self) -> SubscriptionPhase {
        self.phase
    }

    pub fn has_started(&self) -> bool {
        self.has_started
    }

    pub fn is_stopped(&self) -> bool {
        self.phase == SubscriptionPhase::Stopped
    }

    /// Start the feed after `delay`, or right away for a zero delay
    ///
    /// Only the first call on a fresh subscription has any effect.
    pub fn start_delayed(&mut self, delay: Duration) -> SubscriptionEffects {
        if self.phase != SubscriptionPhase::Created || self.has_started {
            return SubscriptionEffects::none();
        }
        if self.start_pending {
            debug!("Subscription {} already waiting to start", self.id);
            return SubscriptionEffects::none();
        }

        if delay.is_zero() {
            return self.start_now();
        }

        self.start_pending = true;
        SubscriptionEffects {
            actions: vec![SubscriptionAction::ScheduleStart { delay }],
            changed: false,
        }
    }

    /// Hold on to the start timer so `stop` can cancel it
    ///
    /// Returns false (and cancels the timer) if the start is no longer wanted.
    pub fn attach_start_timer(&mut self, task: DeferredTask) -> bool {
        if self.phase != SubscriptionPhase::Created || self.has_started || !self.start_pending {
            task.cancel();
            return false;
        }
        if let Some(previous) = self.start_timer.replace(task) {
            previous.cancel();
        }
        true
    }

    /// Start timer fired
    pub fn on_start_delay_elapsed(&mut self) -> SubscriptionEffects {
        if !self.start_pending {
            trace!("Subscription {} start timer no longer armed", self.id);
            return SubscriptionEffects::none();
        }
        self.start_pending = false;
        self.start_timer = None;
        if self.phase != SubscriptionPhase::Created {
            return SubscriptionEffects::none();
        }
        self.start_now()
    }

    /// Stop permanently
    ///
    /// Cancels a pending start and stops the feed. Idempotent.
    pub fn stop(&mut self) {
        self.cancel_start_timer();
        let _ = self.feed.stop();
        self.phase = SubscriptionPhase::Stopped;
    }

    /// Stop the feed but keep the subscription alive for `resume`
    ///
    /// Returns true when the row's observable state changed.
    pub fn pause(&mut self) -> bool {
        self.cancel_start_timer();
        self.feed.stop()
    }

    /// Ensure the feed is running, starting it now if it was still waiting
    ///
    /// No effect once stopped.
    pub fn resume(&mut self) -> SubscriptionEffects {
        match self.phase {
            SubscriptionPhase::Stopped => SubscriptionEffects::none(),
            SubscriptionPhase::Created => self.start_now(),
            SubscriptionPhase::Started if self.feed.is_running() => SubscriptionEffects::none(),
            SubscriptionPhase::Started => self.feed.start(self.entity.query()).into(),
        }
    }

    pub fn set_activity_mode(&mut self, mode: ActivityMode) -> SubscriptionEffects {
        self.feed.set_activity_mode(mode).into()
    }

    pub fn on_poll_tick(&mut self, generation: u64, tick: u64) -> SubscriptionEffects {
        self.feed.on_tick(generation, tick).into()
    }

    pub fn on_fetch_complete(
        &mut self,
        generation: u64,
        result: std::result::Result<Vec<ArrivalSample>, FetchError>,
    ) -> SubscriptionEffects {
        self.feed.on_fetch_complete(generation, result).into()
    }

    pub fn attach_poll_timer(&mut self, generation: u64, tick: u64, task: DeferredTask) -> bool {
        if self.is_stopped() {
            task.cancel();
            return false;
        }
        self.feed.attach_poll_timer(generation, tick, task)
    }

    pub fn attach_fetch(&mut self, generation: u64, task: FetchTask) -> bool {
        if self.is_stopped() {
            task.abort();
            return false;
        }
        self.feed.attach_fetch(generation, task)
    }

    /// Render the row
    pub fn view(&self) -> FavoriteView {
        FavoriteView::from_subscription(self)
    }

    fn start_now(&mut self) -> SubscriptionEffects {
        self.cancel_start_timer();
        if self.has_started {
            return SubscriptionEffects::none();
        }
        self.has_started = true;
        self.phase = SubscriptionPhase::Started;
        debug!("Starting subscription {} ({})", self.id, self.entity);
        self.feed.start(self.entity.query()).into()
    }

    fn cancel_start_timer(&mut self) {
        self.start_pending = false;
        if let Some(timer) = self.start_timer.take() {
            timer.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscription() -> FavoriteSubscription {
        FavoriteSubscription::new(
            FavoriteEntity::new("G", "Bedford", "N"),
            PollPolicy::default(),
            ActivityMode::Foreground,
        )
    }

    fn is_fetch(effects: &SubscriptionEffects) -> bool {
        matches!(
            effects.actions.as_slice(),
            [SubscriptionAction::Feed(FeedAction::Fetch { .. })]
        )
    }

    #[test]
    fn test_ids_are_unique() {
        let a = subscription();
        let b = subscription();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_zero_delay_starts_immediately() {
        let mut sub = subscription();
        let effects = sub.start_delayed(Duration::ZERO);

        assert!(is_fetch(&effects));
        assert!(effects.changed);
        assert_eq!(sub.phase(), SubscriptionPhase::Started);
        assert!(sub.has_started());
    }

    #[test]
    fn test_positive_delay_schedules_start() {
        let mut sub = subscription();
        let effects = sub.start_delayed(Duration::from_millis(500));

        assert_eq!(
            effects.actions,
            vec![SubscriptionAction::ScheduleStart {
                delay: Duration::from_millis(500)
            }]
        );
        assert_eq!(sub.phase(), SubscriptionPhase::Created);
        assert!(!sub.feed().is_running());
    }

    #[test]
    fn test_start_delayed_only_once() {
        let mut sub = subscription();
        let _ = sub.start_delayed(Duration::ZERO);
        assert_eq!(
            sub.start_delayed(Duration::ZERO),
            SubscriptionEffects::none()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_elapsed_starts_feed() {
        let (tx, _rx) = tokio::sync::mpsc::channel(4);
        let mut sub = subscription();
        let _ = sub.start_delayed(Duration::from_millis(500));
        assert!(sub.attach_start_timer(DeferredTask::schedule(
            Duration::from_millis(500),
            tx,
            crate::message::Message::ResumeAll,
        )));

        let effects = sub.on_start_delay_elapsed();

        assert!(is_fetch(&effects));
        assert_eq!(sub.phase(), SubscriptionPhase::Started);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_before_delay_wins() {
        let (tx, _rx) = tokio::sync::mpsc::channel(4);
        let mut sub = subscription();
        let _ = sub.start_delayed(Duration::from_millis(500));
        let _ = sub.attach_start_timer(DeferredTask::schedule(
            Duration::from_millis(500),
            tx,
            crate::message::Message::ResumeAll,
        ));

        sub.stop();
        let effects = sub.on_start_delay_elapsed();

        assert_eq!(effects, SubscriptionEffects::none());
        assert_eq!(sub.phase(), SubscriptionPhase::Stopped);
        assert!(!sub.feed().is_running());
        assert!(!sub.has_started());
    }

    #[test]
    fn test_stop_is_terminal() {
        let mut sub = subscription();
        sub.stop();
        sub.stop();

        assert_eq!(sub.start_delayed(Duration::ZERO), SubscriptionEffects::none());
        assert_eq!(sub.resume(), SubscriptionEffects::none());
        assert!(!sub.feed().is_running());
    }

    #[test]
    fn test_pause_then_resume_restarts_feed() {
        let mut sub = subscription();
        let _ = sub.start_delayed(Duration::ZERO);
        assert!(sub.pause(), "pausing the first fetch clears the loader");
        assert!(!sub.feed().is_running());
        assert!(!sub.view().should_show_loader);
        assert_eq!(sub.phase(), SubscriptionPhase::Started);

        let effects = sub.resume();
        assert!(is_fetch(&effects));
        assert!(sub.feed().is_running());
    }

    #[test]
    fn test_resume_running_is_noop() {
        let mut sub = subscription();
        let _ = sub.start_delayed(Duration::ZERO);
        assert_eq!(sub.resume(), SubscriptionEffects::none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_while_waiting_starts_now() {
        let (tx, _rx) = tokio::sync::mpsc::channel(4);
        let mut sub = subscription();
        let _ = sub.start_delayed(Duration::from_secs(2));
        let _ = sub.attach_start_timer(DeferredTask::schedule(
            Duration::from_secs(2),
            tx,
            crate::message::Message::ResumeAll,
        ));

        let effects = sub.resume();
        assert!(is_fetch(&effects));

        // The cancelled timer's message, if it slipped through, changes nothing
        assert_eq!(sub.on_start_delay_elapsed(), SubscriptionEffects::none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_attach_start_timer_after_stop_rejected() {
        let (tx, _rx) = tokio::sync::mpsc::channel(4);

        let mut sub = subscription();
        sub.stop();
        let task = DeferredTask::schedule(
            Duration::from_secs(1),
            tx,
            crate::message::Message::ResumeAll,
        );
        assert!(!sub.attach_start_timer(task));
    }

    fn fetch_generation(effects: &SubscriptionEffects) -> u64 {
        match effects.actions.as_slice() {
            [SubscriptionAction::Feed(FeedAction::Fetch { generation, .. })] => *generation,
            other => panic!("expected a fetch, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_pause_aborts_fetch_and_resume_takes_new_one() {
        let mut sub = subscription();
        let first = fetch_generation(&sub.start_delayed(Duration::ZERO));
        assert!(sub.attach_fetch(
            first,
            FetchTask::new(tokio::spawn(std::future::pending::<()>()))
        ));

        let _ = sub.pause();
        assert!(!sub.feed().has_fetch_task());

        let second = fetch_generation(&sub.resume());
        assert_ne!(first, second);
        assert!(sub.attach_fetch(
            second,
            FetchTask::new(tokio::spawn(std::future::pending::<()>()))
        ));
    }

    #[tokio::test]
    async fn test_attach_fetch_after_stop_rejected() {
        let mut sub = subscription();
        let generation = fetch_generation(&sub.start_delayed(Duration::ZERO));
        sub.stop();

        assert!(!sub.attach_fetch(
            generation,
            FetchTask::new(tokio::spawn(std::future::pending::<()>()))
        ));
    }
}
