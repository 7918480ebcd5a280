//! Test utilities for arrival sources
//!
//! Provides [`ScriptedSource`], an in-memory [`ArrivalSource`] that replays
//! scripted responses per query and records every call, including how many
//! fetches for the same query were outstanding at once. A fetch whose future
//! is dropped mid-flight (an aborted task) stops counting as outstanding.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;
use twatch_core::{ArrivalQuery, ArrivalSample, FetchError};

use crate::source::ArrivalSource;

/// One scripted reply
#[derive(Debug, Clone)]
pub struct ScriptedResponse {
    /// How long the fetch stays in flight
    pub delay: Duration,
    pub result: Result<Vec<ArrivalSample>, FetchError>,
}

impl ScriptedResponse {
    /// Immediate success with the given minutes
    pub fn minutes(minutes: &[i64]) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(samples(minutes)),
        }
    }

    /// Immediate failure
    pub fn failure(error: FetchError) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(error),
        }
    }

    /// Keep the fetch in flight for `delay` before answering
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A call observed by the scripted source
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub query: ArrivalQuery,
    pub at: Instant,
}

#[derive(Debug)]
struct ScriptState {
    scripts: HashMap<ArrivalQuery, VecDeque<ScriptedResponse>>,
    fallback: ScriptedResponse,
    calls: Vec<RecordedCall>,
    in_flight: HashMap<ArrivalQuery, usize>,
    max_in_flight: HashMap<ArrivalQuery, usize>,
}

/// In-memory arrival source for tests
#[derive(Debug)]
pub struct ScriptedSource {
    state: Mutex<ScriptState>,
}

impl Default for ScriptedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedSource {
    /// Create a source that answers `[5, 12]` to every unscripted query
    pub fn new() -> Self {
        Self::with_fallback(ScriptedResponse::minutes(&[5, 12]))
    }

    /// Create a source with a custom reply for unscripted queries
    pub fn with_fallback(fallback: ScriptedResponse) -> Self {
        Self {
            state: Mutex::new(ScriptState {
                scripts: HashMap::new(),
                fallback,
                calls: Vec::new(),
                in_flight: HashMap::new(),
                max_in_flight: HashMap::new(),
            }),
        }
    }

    /// Queue a reply for the next unanswered call matching `query`
    pub fn push(&self, query: ArrivalQuery, response: ScriptedResponse) {
        let mut state = self.lock();
        state.scripts.entry(query).or_default().push_back(response);
    }

    /// All calls observed so far, in call order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Calls observed for one query
    pub fn calls_for(&self, query: &ArrivalQuery) -> Vec<RecordedCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| &c.query == query)
            .cloned()
            .collect()
    }

    /// Highest number of simultaneously outstanding fetches for `query`
    pub fn max_in_flight(&self, query: &ArrivalQuery) -> usize {
        self.lock().max_in_flight.get(query).copied().unwrap_or(0)
    }

    /// Fetches for `query` outstanding right now
    pub fn in_flight(&self, query: &ArrivalQuery) -> usize {
        self.lock().in_flight.get(query).copied().unwrap_or(0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptState> {
        // A panicking test thread must not hide the recorded calls.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ArrivalSource for ScriptedSource {
    async fn fetch_arrivals(
        &self,
        query: &ArrivalQuery,
    ) -> Result<Vec<ArrivalSample>, FetchError> {
        let response = {
            let mut state = self.lock();
            state.calls.push(RecordedCall {
                query: query.clone(),
                at: Instant::now(),
            });

            let outstanding = {
                let count = state.in_flight.entry(query.clone()).or_insert(0);
                *count += 1;
                *count
            };
            let max = state.max_in_flight.entry(query.clone()).or_insert(0);
            *max = (*max).max(outstanding);

            let scripted = state
                .scripts
                .get_mut(query)
                .and_then(|queue| queue.pop_front());
            scripted.unwrap_or_else(|| state.fallback.clone())
        };

        let _outstanding = InFlight {
            source: self,
            query,
        };
        if !response.delay.is_zero() {
            tokio::time::sleep(response.delay).await;
        }

        response.result
    }
}

/// Decrements the in-flight count when the fetch ends or is dropped
struct InFlight<'a> {
    source: &'a ScriptedSource,
    query: &'a ArrivalQuery,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = self.source.lock();
        if let Some(count) = state.in_flight.get_mut(self.query) {
            *count = count.saturating_sub(1);
        }
    }
}

/// Build samples from whole minutes
pub fn samples(minutes: &[i64]) -> Vec<ArrivalSample> {
    minutes.iter().copied().map(ArrivalSample::new).collect()
}

/// Build a query from its three parts
pub fn test_query(line_id: &str, station_name: &str, direction: &str) -> ArrivalQuery {
    ArrivalQuery {
        line_id: line_id.to_string(),
        station_name: station_name.to_string(),
        direction: direction.to_string(),
    }
}
