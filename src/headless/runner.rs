//! Headless mode runner - main event loop without UI
//!
//! Builds the engine over the HTTP transit source, forwards engine events as
//! NDJSON and feeds stdin commands back in as lifecycle messages.

use std::path::Path;

use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::sync::mpsc;

use twatch_app::{config, message::Message, signals, Engine, EngineEvent};
use twatch_core::prelude::*;
use twatch_transit::{ArrivalSource, HttpArrivalSource};

use super::HeadlessEvent;

/// Run in headless mode - output JSON events until quit or a signal
pub async fn run_headless(config_dir: &Path) -> Result<()> {
    info!("═══════════════════════════════════════════════════════");
    info!("Transit Watch starting in HEADLESS mode");
    info!("Config: {}", config_dir.display());
    info!("═══════════════════════════════════════════════════════");

    if let Err(e) = config::init_config_dir(config_dir) {
        warn!("Failed to initialize {}: {}", config_dir.display(), e);
    }
    let settings = config::load_settings(config_dir);

    let source =
        match HttpArrivalSource::new(&settings.transit.base_url, settings.transit.timeout()) {
            Ok(source) => source,
            Err(e) => {
                HeadlessEvent::error(e.to_string(), true).emit();
                return Err(e);
            }
        };
    info!("Transit API: {}", settings.transit.base_url);

    let mut engine = Engine::new(config_dir.to_path_buf(), settings, source);
    let mut events = engine.subscribe();

    signals::spawn_signal_handler(engine.msg_sender());

    let stdin_tx = engine.msg_sender();
    std::thread::spawn(move || {
        spawn_stdin_reader_blocking(stdin_tx);
    });

    let result = match engine.start().context("Failed to start engine") {
        Ok(()) => {
            forward_events(&mut events);
            headless_event_loop(&mut engine, &mut events).await
        }
        Err(e) => {
            HeadlessEvent::error(format!("Failed to load favorites: {}", e), true).emit();
            Err(e)
        }
    };

    engine.shutdown().await;
    forward_events(&mut events);

    info!("Transit Watch headless mode exiting");
    result
}

/// Main headless event loop
async fn headless_event_loop<S>(
    engine: &mut Engine<S>,
    events: &mut broadcast::Receiver<EngineEvent>,
) -> Result<()>
where
    S: ArrivalSource + Send + Sync + 'static,
{
    loop {
        if engine.should_quit() {
            info!("Quit requested");
            break;
        }

        match engine.msg_rx.recv().await {
            Some(msg) => {
                engine.process_message(msg);
                forward_events(events);
            }
            None => {
                info!("Message channel closed");
                break;
            }
        }
    }

    Ok(())
}

/// Write every pending engine event to stdout
fn forward_events(events: &mut broadcast::Receiver<EngineEvent>) {
    for event in drain_events(events) {
        event.emit();
    }
}

/// Collect pending engine events without blocking
fn drain_events(events: &mut broadcast::Receiver<EngineEvent>) -> Vec<HeadlessEvent> {
    let mut drained = Vec::new();
    loop {
        match events.try_recv() {
            Ok(event) => drained.push(HeadlessEvent::from(event)),
            Err(TryRecvError::Lagged(skipped)) => {
                warn!("Headless output fell behind, {} events dropped", skipped);
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
    drained
}

/// Map one stdin line to a message
///
/// Returns `None` for blank lines and unknown commands.
fn parse_command(line: &str) -> Option<Message> {
    match line.trim() {
        "fg" | "foreground" => Some(Message::Foreground),
        "bg" | "background" => Some(Message::Background),
        "visible" => Some(Message::ViewVisible),
        "hidden" => Some(Message::ViewHidden),
        "resume" => Some(Message::ResumeAll),
        "stop" => Some(Message::StopAll),
        "reload" => Some(Message::ReloadFavorites),
        "q" | "quit" => Some(Message::Quit),
        _ => None,
    }
}

/// Read stdin commands and send them to the message channel (blocking)
fn spawn_stdin_reader_blocking(msg_tx: mpsc::Sender<Message>) {
    use std::io::BufRead;

    let stdin = std::io::stdin();
    let reader = stdin.lock();

    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match parse_command(trimmed) {
            Some(msg) => {
                info!("Stdin: {}", trimmed);
                let quit = matches!(msg, Message::Quit);
                if msg_tx.blocking_send(msg).is_err() || quit {
                    break;
                }
            }
            None => warn!("Unknown stdin command: {}", trimmed),
        }
    }

    info!("Stdin reader exiting");
}
