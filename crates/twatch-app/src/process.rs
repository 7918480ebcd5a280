//! Message processing
//!
//! Runs a message through the TEA update function, follows any chained
//! messages, dispatches resulting actions and hands spawned timers and
//! fetches back to the subscriptions that requested them.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use twatch_transit::ArrivalSource;

use crate::actions::handle_action;
use crate::handler;
use crate::message::Message;
use crate::state::AppState;

/// Process a message through the TEA update function
pub fn process_message<S>(
    state: &mut AppState,
    message: Message,
    msg_tx: &mpsc::Sender<Message>,
    source: &Arc<S>,
    shutdown_rx: &watch::Receiver<bool>,
) where
    S: ArrivalSource + Send + Sync + 'static,
{
    let mut msg = Some(message);
    while let Some(m) = msg {
        let result = handler::update(state, m);

        for action in result.actions {
            if let Some(task) = handle_action(action, msg_tx.clone(), source, shutdown_rx.clone())
            {
                state.coordinator.attach_task(task);
            }
        }

        msg = result.message;
    }
}
