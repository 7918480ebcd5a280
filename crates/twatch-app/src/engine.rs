//! Engine - the single scheduler behind every frontend
//!
//! The Engine owns the TEA state, the message channel every background task
//! reports into, the shutdown signal, the favorites watcher and the arrival
//! source. All state changes happen in [`Engine::process_message`], one
//! message at a time; fetches and timers only ever send messages back.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use twatch_core::prelude::*;
use twatch_transit::ArrivalSource;

use crate::config::{self, Settings};
use crate::coordinator::Notification;
use crate::engine_event::EngineEvent;
use crate::message::Message;
use crate::process;
use crate::state::AppState;
use crate::view::FavoriteView;
use crate::watcher::{FavoritesWatcher, WatcherConfig};

/// Message channel capacity
const MESSAGE_CHANNEL_CAPACITY: usize = 256;

/// Event broadcast capacity
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Orchestration engine for Transit Watch.
pub struct Engine<S> {
    /// TEA application state (the Model)
    pub state: AppState,

    /// Sender half of the unified message channel.
    /// Clone this to give to input sources (signal handler, watcher, stdin).
    pub msg_tx: mpsc::Sender<Message>,

    /// Receiver half of the unified message channel.
    pub msg_rx: mpsc::Receiver<Message>,

    /// Sender for the shutdown signal. Send `true` to abandon in-flight fetches.
    shutdown_tx: watch::Sender<bool>,

    /// Receiver for the shutdown signal. Cloned into fetch tasks.
    shutdown_rx: watch::Receiver<bool>,

    /// Favorites watcher. None if disabled or failed to start.
    favorites_watcher: Option<FavoritesWatcher>,

    source: Arc<S>,

    event_tx: broadcast::Sender<EngineEvent>,
}

impl<S> Engine<S>
where
    S: ArrivalSource + Send + Sync + 'static,
{
    /// Create an Engine from already-loaded settings.
    ///
    /// Nothing is spawned until [`Engine::start`].
    pub fn new(config_dir: PathBuf, settings: Settings, source: S) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel(MESSAGE_CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            state: AppState::with_settings(config_dir, settings),
            msg_tx,
            msg_rx,
            shutdown_tx,
            shutdown_rx,
            favorites_watcher: None,
            source: Arc::new(source),
            event_tx,
        }
    }

    /// Create an Engine for a config directory.
    ///
    /// Initializes the directory with a default config.toml (non-fatal if
    /// that fails) and loads settings from it.
    pub fn from_config_dir(config_dir: PathBuf, source: S) -> Self {
        if let Err(e) = config::init_config_dir(&config_dir) {
            warn!("Failed to initialize {}: {}", config_dir.display(), e);
        }
        let settings = config::load_settings(&config_dir);
        Self::new(config_dir, settings, source)
    }

    /// Load favorites, build the subscriptions and start the watcher.
    ///
    /// A malformed favorites file is an error; the watcher failing to start
    /// is logged and otherwise ignored.
    pub fn start(&mut self) -> Result<()> {
        let favorites = config::load_favorites(&self.state.config_dir)?;
        info!("Starting with {} favorites", favorites.len());
        self.process_message(Message::FavoritesChanged { favorites });

        if self.state.settings.watcher.enabled {
            let watcher_config =
                WatcherConfig::new().with_debounce_ms(self.state.settings.watcher.debounce_ms);
            let mut watcher = FavoritesWatcher::new(self.state.config_dir.clone(), watcher_config);
            match watcher.start(self.msg_tx.clone()) {
                Ok(()) => self.favorites_watcher = Some(watcher),
                Err(e) => warn!("Favorites watcher not started: {}", e),
            }
        }

        Ok(())
    }

    /// Subscribe to engine events.
    ///
    /// If the subscriber falls behind, older events are dropped
    /// (`broadcast::error::RecvError::Lagged`).
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_tx.subscribe()
    }

    /// Process a single message through the TEA update cycle and emit the
    /// resulting events.
    pub fn process_message(&mut self, msg: Message) {
        let error = match &msg {
            Message::WatcherError { message } | Message::FavoritesLoadFailed { message } => {
                Some(message.clone())
            }
            _ => None,
        };

        process::process_message(
            &mut self.state,
            msg,
            &self.msg_tx,
            &self.source,
            &self.shutdown_rx,
        );

        if let Some(message) = error {
            self.emit(EngineEvent::Error { message });
        }
        self.emit_notifications();
    }

    /// Drain and process all pending messages from the channel.
    ///
    /// Returns the number of messages processed.
    pub fn drain_pending_messages(&mut self) -> usize {
        let mut count = 0;
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.process_message(msg);
            count += 1;
        }
        count
    }

    /// Get a clone of the message sender for input sources.
    pub fn msg_sender(&self) -> mpsc::Sender<Message> {
        self.msg_tx.clone()
    }

    pub fn should_quit(&self) -> bool {
        self.state.should_quit()
    }

    /// Current rows in display order
    pub fn views(&self) -> Vec<FavoriteView> {
        self.state.coordinator.views()
    }

    /// The arrival source shared by every feed
    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Stop the watcher, every feed and timer, and abandon in-flight fetches.
    pub async fn shutdown(&mut self) {
        self.emit(EngineEvent::Shutdown);

        if let Some(ref mut watcher) = self.favorites_watcher {
            watcher.stop();
        }
        self.favorites_watcher = None;

        self.state.coordinator.shutdown();
        self.shutdown_tx.send_replace(true);

        // Let abandoned fetch tasks observe the signal before the runtime goes away
        tokio::task::yield_now().await;
        info!("Engine shut down");
    }

    /// Turn coordinator notifications into events
    fn emit_notifications(&mut self) {
        for notification in self.state.coordinator.take_notifications() {
            match notification {
                Notification::Rebuilt => self.emit(EngineEvent::FavoritesRebuilt {
                    views: self.state.coordinator.views(),
                }),
                Notification::RowChanged(id) => {
                    if let Some((index, view)) = self.state.coordinator.view(id) {
                        self.emit(EngineEvent::FavoriteUpdated { index, view });
                    }
                }
                Notification::ModeChanged(mode) => {
                    self.emit(EngineEvent::ActivityModeChanged { mode })
                }
            }
        }
    }

    /// Emit a single EngineEvent to all subscribers.
    ///
    /// send() returns Err only if there are no receivers.
    fn emit(&self, event: EngineEvent) {
        let _ = self.event_tx.send(event);
    }
}
