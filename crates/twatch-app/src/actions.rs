//! Action handlers: UpdateAction dispatch and background task spawning
//!
//! Fetches and file reads run as tokio tasks and report back through the
//! message channel. Timers and fetches are returned to the caller as
//! [`SpawnedTask`]s so the owning subscription can cancel them.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use twatch_core::prelude::*;
use twatch_core::ArrivalQuery;
use twatch_transit::ArrivalSource;

use crate::config::load_favorites;
use crate::deferred::{DeferredTask, FetchTask};
use crate::message::Message;
use crate::subscription::SubscriptionId;
use crate::UpdateAction;

/// A task spawned for a subscription, to be handed back to it
#[derive(Debug)]
pub enum SpawnedTask {
    Start {
        subscription_id: SubscriptionId,
        task: DeferredTask,
    },
    Poll {
        subscription_id: SubscriptionId,
        generation: u64,
        tick: u64,
        task: DeferredTask,
    },
    Fetch {
        subscription_id: SubscriptionId,
        generation: u64,
        task: FetchTask,
    },
}

/// Execute an action by spawning a background task
///
/// Returns the task handle for fetches and scheduling actions.
pub fn handle_action<S>(
    action: UpdateAction,
    msg_tx: mpsc::Sender<Message>,
    source: &Arc<S>,
    shutdown_rx: watch::Receiver<bool>,
) -> Option<SpawnedTask>
where
    S: ArrivalSource + Send + Sync + 'static,
{
    match action {
        UpdateAction::FetchArrivals {
            subscription_id,
            generation,
            query,
        } => Some(SpawnedTask::Fetch {
            subscription_id,
            generation,
            task: spawn_fetch(
                subscription_id,
                generation,
                query,
                source.clone(),
                msg_tx,
                shutdown_rx,
            ),
        }),

        UpdateAction::SchedulePoll {
            subscription_id,
            generation,
            tick,
            delay,
        } => Some(SpawnedTask::Poll {
            subscription_id,
            generation,
            tick,
            task: DeferredTask::schedule(
                delay,
                msg_tx,
                Message::PollTick {
                    subscription_id,
                    generation,
                    tick,
                },
            ),
        }),

        UpdateAction::ScheduleStart {
            subscription_id,
            delay,
        } => Some(SpawnedTask::Start {
            subscription_id,
            task: DeferredTask::schedule(
                delay,
                msg_tx,
                Message::StartDelayElapsed { subscription_id },
            ),
        }),

        UpdateAction::LoadFavorites { config_dir } => {
            tokio::task::spawn_blocking(move || {
                let message = match load_favorites(&config_dir) {
                    Ok(favorites) => Message::FavoritesChanged { favorites },
                    Err(e) => Message::FavoritesLoadFailed {
                        message: e.to_string(),
                    },
                };
                let _ = msg_tx.blocking_send(message);
            });
            None
        }
    }
}

/// Run one fetch and report the result
///
/// The task ends early, without reporting, when the engine shuts down or
/// the returned handle aborts it.
fn spawn_fetch<S>(
    subscription_id: SubscriptionId,
    generation: u64,
    query: ArrivalQuery,
    source: Arc<S>,
    msg_tx: mpsc::Sender<Message>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> FetchTask
where
    S: ArrivalSource + Send + Sync + 'static,
{
    let handle = tokio::spawn(async move {
        let started = tokio::time::Instant::now();

        let result = tokio::select! {
            result = source.fetch_arrivals(&query) => result,
            _ = shutdown_rx.changed() => {
                debug!("Fetch for {} abandoned on shutdown", query);
                return;
            }
        };

        let elapsed = started.elapsed();
        match &result {
            Ok(samples) => debug!(
                "Fetched {} arrivals for {} in {:?}",
                samples.len(),
                query,
                elapsed
            ),
            Err(e) => warn!(
                "Fetch for {} failed ({}) after {:?}: {}",
                query,
                e.kind(),
                elapsed,
                e
            ),
        }
        if elapsed > SLOW_FETCH_THRESHOLD {
            warn!("Slow fetch for {}: {:?}", query, elapsed);
        }

        if msg_tx
            .send(Message::ArrivalsFetched {
                subscription_id,
                generation,
                result,
            })
            .await
            .is_err()
        {
            trace!("Engine gone; dropping fetch result for {}", query);
        }
    });
    FetchTask::new(handle)
}

/// Fetches slower than this are logged at warn level
const SLOW_FETCH_THRESHOLD: Duration = Duration::from_secs(5);
