//! Cancellable background tasks
//!
//! A [`DeferredTask`] delivers a single [`Message`] to the engine loop after a
//! delay. Timers never touch state directly: the message they deliver is
//! handled by `update()` like any other, and feeds re-check their generation
//! counters there, so a timer that fires just as it is cancelled is harmless.
//!
//! A [`FetchTask`] holds a running fetch so its feed can abort the request
//! when it stops, instead of letting it run to completion unobserved.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::message::Message;

/// Handle to a pending delayed message
///
/// Dropping the handle cancels the timer.
#[derive(Debug)]
pub struct DeferredTask {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl DeferredTask {
    /// Send `message` on `msg_tx` once `delay` has elapsed
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(delay: Duration, msg_tx: mpsc::Sender<Message>, message: Message) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown_rx.changed() => return,
            }

            if *shutdown_rx.borrow() {
                return;
            }

            // Engine gone; nothing left to notify
            let _ = msg_tx.send(message).await;
        });

        Self {
            shutdown_tx,
            handle,
        }
    }

    /// Cancel the timer. Safe to call any number of times.
    pub fn cancel(&self) {
        self.shutdown_tx.send_replace(true);
        self.handle.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.shutdown_tx.borrow()
    }
}

impl Drop for DeferredTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Handle to an outstanding fetch
///
/// Dropping the handle aborts the fetch.
#[derive(Debug)]
pub struct FetchTask {
    handle: JoinHandle<()>,
}

impl FetchTask {
    pub fn new(handle: JoinHandle<()>) -> Self {
        Self { handle }
    }

    /// Abort the fetch. Safe to call any number of times, and after it finished.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

impl Drop for FetchTask {
    fn drop(&mut self) {
        self.abort();
    }
}
