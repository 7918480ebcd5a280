//! Arrival feed state machine
//!
//! An [`ArrivalFeed`] owns the arrival state for one line/station/direction
//! and decides *when* to fetch. It never performs I/O itself: every operation
//! returns [`FeedEffects`] describing the fetches and timers its owner must
//! start. Completions and timer ticks come back through
//! [`ArrivalFeed::on_fetch_complete`] and [`ArrivalFeed::on_tick`], tagged
//! with the generation they were issued under. Starting or stopping the feed
//! bumps the generation, so anything issued before that point is ignored.
//!
//! At most one fetch is outstanding per feed, and the next poll is only
//! scheduled after the current fetch completes. The owner hands the spawned
//! fetch back through [`ArrivalFeed::attach_fetch`]; stopping the feed aborts
//! it, so a restart never overlaps the request it replaced.

use std::time::Duration;

use chrono::{DateTime, Local};
use twatch_core::prelude::*;
use twatch_core::{sort_samples, ActivityMode, ArrivalQuery, ArrivalSample, FetchError};

use crate::deferred::{DeferredTask, FetchTask};

/// Lower bound for any poll interval
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Text shown when there are no samples yet
pub const PLACEHOLDER_TEXT: &str = "\u{2014}";

/// Text shown when there are no samples and the last fetch failed
pub const ERROR_TEXT: &str = "--";

/// Poll cadence per activity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    foreground: Duration,
    /// `None` suspends polling while in the background
    background: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(30), Duration::from_secs(180))
    }
}

impl PollPolicy {
    pub fn new(foreground: Duration, background: Duration) -> Self {
        Self {
            foreground,
            background: Some(background),
        }
    }

    /// Poll in the foreground only
    pub fn suspended_in_background(foreground: Duration) -> Self {
        Self {
            foreground,
            background: None,
        }
    }

    /// Interval for `mode`, or `None` if polling is suspended in that mode
    pub fn interval_for(&self, mode: ActivityMode) -> Option<Duration> {
        match mode {
            ActivityMode::Foreground => Some(self.foreground),
            ActivityMode::Background => self.background,
        }
    }
}

/// Work a feed asks its owner to start
#[derive(Debug, Clone, PartialEq)]
pub enum FeedAction {
    /// Run one fetch and report back via `on_fetch_complete(generation, ..)`
    Fetch {
        generation: u64,
        query: ArrivalQuery,
    },

    /// Call `on_tick(generation, tick)` after `delay`
    SchedulePoll {
        generation: u64,
        tick: u64,
        delay: Duration,
    },
}

/// Result of a feed operation
#[derive(Debug, Default, PartialEq)]
#[must_use]
pub struct FeedEffects {
    pub actions: Vec<FeedAction>,
    /// Observable state changed; the owner should notify
    pub changed: bool,
}

impl FeedEffects {
    pub fn none() -> Self {
        Self::default()
    }

    fn push(&mut self, action: FeedAction) {
        self.actions.push(action);
    }
}

/// Arrival state and poll scheduling for one query
#[derive(Debug)]
pub struct ArrivalFeed {
    query: Option<ArrivalQuery>,
    samples: Vec<ArrivalSample>,
    is_loading: bool,
    last_error: Option<FetchError>,
    last_updated: Option<DateTime<Local>>,

    policy: PollPolicy,
    mode: ActivityMode,

    running: bool,
    in_flight: bool,
    /// Bumped on start and stop; stale completions and ticks carry an old one
    generation: u64,
    /// Identifies the most recently scheduled poll within a generation
    tick: u64,
    tick_pending: bool,
    poll_timer: Option<DeferredTask>,
    fetch_task: Option<FetchTask>,

    /// Bumped on every observable change
    revision: u64,
}

impl ArrivalFeed {
    pub fn new(policy: PollPolicy, mode: ActivityMode) -> Self {
        Self {
            query: None,
            samples: Vec::new(),
            is_loading: false,
            last_error: None,
            last_updated: None,
            policy,
            mode,
            running: false,
            in_flight: false,
            generation: 0,
            tick: 0,
            tick_pending: false,
            poll_timer: None,
            fetch_task: None,
            revision: 0,
        }
    }

    // ─────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────

    /// Bind to `query` and fetch immediately
    ///
    /// No-op if already running.
    pub fn start(&mut self, query: ArrivalQuery) -> FeedEffects {
        if self.running {
            debug!("Feed {} already running, ignoring start", query);
            return FeedEffects::none();
        }

        self.running = true;
        self.generation += 1;
        self.query = Some(query.clone());
        self.is_loading = true;
        self.touch();

        let mut effects = FeedEffects {
            changed: true,
            ..Default::default()
        };
        effects.push(self.begin_fetch(query));
        effects
    }

    /// Cancel any pending poll and abort the in-flight fetch, if any
    ///
    /// Idempotent. Returns true when observable state changed, which only
    /// happens when the first fetch was still loading: a stopped feed never
    /// shows the loader.
    pub fn stop(&mut self) -> bool {
        if !self.running {
            return false;
        }

        self.running = false;
        self.generation += 1;
        self.in_flight = false;
        if let Some(task) = self.fetch_task.take() {
            trace!("Aborting in-flight fetch for {:?}", self.query);
            task.abort();
        }
        self.cancel_poll();

        if self.is_loading {
            self.is_loading = false;
            self.touch();
            return true;
        }
        false
    }

    /// Switch poll cadence
    ///
    /// A pending poll is re-armed with the new interval; entering a suspended
    /// mode cancels it, and leaving one fetches right away.
    pub fn set_activity_mode(&mut self, mode: ActivityMode) -> FeedEffects {
        if mode == self.mode {
            return FeedEffects::none();
        }
        self.mode = mode;

        // An outstanding fetch picks up the new interval when it completes
        if !self.running || self.in_flight {
            return FeedEffects::none();
        }

        let was_pending = self.tick_pending;
        self.cancel_poll();

        let mut effects = FeedEffects::none();
        match self.policy.interval_for(mode) {
            Some(_) if was_pending => {
                if let Some(action) = self.schedule_next() {
                    effects.push(action);
                }
            }
            Some(_) => {
                // Idle with nothing scheduled: polling was suspended
                if let Some(query) = self.query.clone() {
                    let was_loading = self.is_loading;
                    effects.push(self.begin_fetch(query));
                    effects.changed = self.is_loading != was_loading;
                }
            }
            None => {
                debug!("Polling suspended in {} mode", mode);
            }
        }
        effects
    }

    // ─────────────────────────────────────────────────────────
    // Scheduler callbacks
    // ─────────────────────────────────────────────────────────

    /// Handle a poll timer firing
    pub fn on_tick(&mut self, generation: u64, tick: u64) -> FeedEffects {
        if !self.running || generation != self.generation || tick != self.tick || !self.tick_pending
        {
            trace!(
                "Ignoring stale poll tick (gen {} tick {}, current gen {} tick {})",
                generation,
                tick,
                self.generation,
                self.tick
            );
            return FeedEffects::none();
        }

        self.tick_pending = false;
        self.poll_timer = None;

        if self.in_flight || self.policy.interval_for(self.mode).is_none() {
            return FeedEffects::none();
        }

        let Some(query) = self.query.clone() else {
            return FeedEffects::none();
        };

        let was_loading = self.is_loading;
        let mut effects = FeedEffects::none();
        effects.push(self.begin_fetch(query));
        effects.changed = self.is_loading != was_loading;
        effects
    }

    /// Apply a fetch result and schedule the next poll
    pub fn on_fetch_complete(
        &mut self,
        generation: u64,
        result: std::result::Result<Vec<ArrivalSample>, FetchError>,
    ) -> FeedEffects {
        if !self.running || generation != self.generation || !self.in_flight {
            trace!(
                "Discarding fetch result for generation {} (current {})",
                generation,
                self.generation
            );
            return FeedEffects::none();
        }

        self.in_flight = false;
        self.is_loading = false;
        self.fetch_task = None;

        match result {
            Ok(mut samples) => {
                sort_samples(&mut samples);
                self.samples = samples;
                self.last_error = None;
                self.last_updated = Some(Local::now());
            }
            Err(error) => {
                debug!("Fetch failed for {:?}: {}", self.query, error);
                self.last_error = Some(error);
            }
        }
        self.touch();

        let mut effects = FeedEffects {
            changed: true,
            ..Default::default()
        };
        if let Some(action) = self.schedule_next() {
            effects.push(action);
        }
        effects
    }

    /// Hold on to the timer for a scheduled poll
    ///
    /// Returns false (and cancels the timer) if the poll is no longer current.
    pub fn attach_poll_timer(&mut self, generation: u64, tick: u64, task: DeferredTask) -> bool {
        if !self.running || generation != self.generation || tick != self.tick || !self.tick_pending
        {
            task.cancel();
            return false;
        }
        if let Some(previous) = self.poll_timer.replace(task) {
            previous.cancel();
        }
        true
    }

    /// Hold on to the task running the current fetch
    ///
    /// Returns false (and aborts the task) if that fetch is no longer wanted.
    pub fn attach_fetch(&mut self, generation: u64, task: FetchTask) -> bool {
        if !self.running || generation != self.generation || !self.in_flight {
            task.abort();
            return false;
        }
        if let Some(previous) = self.fetch_task.replace(task) {
            previous.abort();
        }
        true
    }

    pub fn has_fetch_task(&self) -> bool {
        self.fetch_task.is_some()
    }

    // ─────────────────────────────────────────────────────────
    // Observable state
    // ─────────────────────────────────────────────────────────

    pub fn samples(&self) -> &[ArrivalSample] {
        &self.samples
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    pub fn last_updated(&self) -> Option<DateTime<Local>> {
        self.last_updated
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn has_pending_poll(&self) -> bool {
        self.tick_pending
    }

    pub fn activity_mode(&self) -> ActivityMode {
        self.mode
    }

    /// Current poll interval, `None` while suspended
    pub fn poll_interval(&self) -> Option<Duration> {
        self.policy.interval_for(self.mode)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Show the loader only while loading with nothing to show yet
    pub fn should_show_loader(&self) -> bool {
        self.is_loading && self.samples.is_empty()
    }

    pub fn has_error(&self) -> bool {
        self.last_error.is_some()
    }

    /// Errors surface only when there are no samples to show instead
    pub fn shows_error(&self) -> bool {
        self.has_error() && self.samples.is_empty()
    }

    /// Short label for the soonest arrival
    pub fn display_text(&self) -> String {
        match self.samples.first() {
            Some(sample) => sample.label(),
            None if self.has_error() => ERROR_TEXT.to_string(),
            None => PLACEHOLDER_TEXT.to_string(),
        }
    }

    // ─────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────

    fn begin_fetch(&mut self, query: ArrivalQuery) -> FeedAction {
        self.in_flight = true;
        if self.samples.is_empty() && !self.is_loading {
            self.is_loading = true;
            self.touch();
        }
        FeedAction::Fetch {
            generation: self.generation,
            query,
        }
    }

    fn schedule_next(&mut self) -> Option<FeedAction> {
        let delay = self.policy.interval_for(self.mode)?;
        self.tick += 1;
        self.tick_pending = true;
        Some(FeedAction::SchedulePoll {
            generation: self.generation,
            tick: self.tick,
            delay,
        })
    }

    fn cancel_poll(&mut self) {
        self.tick_pending = false;
        // Invalidate a tick already queued behind the cancelled timer
        self.tick += 1;
        if let Some(timer) = self.poll_timer.take() {
            timer.cancel();
        }
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}
