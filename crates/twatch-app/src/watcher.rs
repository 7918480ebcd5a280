//! Favorites file watcher
//!
//! Watches the config directory and asks the engine to reload favorites
//! whenever `favorites.toml` changes, with debouncing. Saves that go through
//! a temp file and rename show up as a single change.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::RecursiveMode;
use notify_debouncer_full::{new_debouncer, DebounceEventResult};
use tokio::sync::mpsc;
use twatch_core::prelude::*;

use crate::config::FAVORITES_FILENAME;
use crate::message::Message;

/// Default debounce duration in milliseconds
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Configuration for the favorites watcher
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    pub debounce: Duration,
    /// File name to react to inside the watched directory
    pub file_name: String,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            file_name: FAVORITES_FILENAME.to_string(),
        }
    }
}

impl WatcherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set debounce duration in milliseconds
    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.debounce = Duration::from_millis(ms);
        self
    }
}

/// Watches favorites.toml in a config directory
pub struct FavoritesWatcher {
    config_dir: PathBuf,
    config: WatcherConfig,
    /// Handle to stop the watcher
    stop_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl FavoritesWatcher {
    pub fn new(config_dir: PathBuf, config: WatcherConfig) -> Self {
        Self {
            config_dir,
            config,
            stop_tx: None,
        }
    }

    /// Start watching
    ///
    /// Sends `Message::ReloadFavorites` on change and `Message::WatcherError`
    /// on failure.
    pub fn start(&mut self, message_tx: mpsc::Sender<Message>) -> Result<()> {
        if self.is_running() {
            return Err(Error::config("Favorites watcher is already running"));
        }
        if !self.config_dir.is_dir() {
            return Err(Error::config(format!(
                "Config directory does not exist: {}",
                self.config_dir.display()
            )));
        }

        let config_dir = self.config_dir.clone();
        let config = self.config.clone();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel();

        self.stop_tx = Some(stop_tx);

        tokio::task::spawn_blocking(move || {
            Self::run_watcher(config_dir, config, message_tx, stop_rx);
        });

        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }

    pub fn is_running(&self) -> bool {
        self.stop_tx.is_some()
    }

    fn run_watcher(
        config_dir: PathBuf,
        config: WatcherConfig,
        message_tx: mpsc::Sender<Message>,
        mut stop_rx: tokio::sync::oneshot::Receiver<()>,
    ) {
        let tx_clone = message_tx.clone();
        let file_name = config.file_name.clone();

        let debouncer_result = new_debouncer(
            config.debounce,
            None,
            move |result: DebounceEventResult| match result {
                Ok(events) => {
                    let touched = events
                        .iter()
                        .any(|event| event.paths.iter().any(|p| is_watched_file(p, &file_name)));
                    if touched {
                        debug!("{} changed on disk", file_name);
                        let _ = tx_clone.blocking_send(Message::ReloadFavorites);
                    }
                }
                Err(errors) => {
                    for error in errors {
                        warn!("Favorites watcher error: {:?}", error);
                        let _ = tx_clone.blocking_send(Message::WatcherError {
                            message: error.to_string(),
                        });
                    }
                }
            },
        );

        let mut debouncer = match debouncer_result {
            Ok(d) => d,
            Err(e) => {
                error!("Failed to create favorites watcher: {}", e);
                let _ = message_tx.blocking_send(Message::WatcherError {
                    message: format!("Failed to create watcher: {}", e),
                });
                return;
            }
        };

        if let Err(e) = debouncer.watch(&config_dir, RecursiveMode::NonRecursive) {
            warn!("Failed to watch {}: {}", config_dir.display(), e);
            let _ = message_tx.blocking_send(Message::WatcherError {
                message: format!("Failed to watch {}: {}", config_dir.display(), e),
            });
            return;
        }
        info!("Watching {}", config_dir.join(&config.file_name).display());

        loop {
            match stop_rx.try_recv() {
                Ok(()) | Err(tokio::sync::oneshot::error::TryRecvError::Closed) => {
                    info!("Favorites watcher stopping");
                    break;
                }
                Err(tokio::sync::oneshot::error::TryRecvError::Empty) => {
                    std::thread::sleep(Duration::from_millis(100));
                }
            }
        }
    }
}

impl Drop for FavoritesWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn is_watched_file(path: &Path, file_name: &str) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name == file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watcher_config_default() {
        let config = WatcherConfig::default();
        assert_eq!(config.debounce, Duration::from_millis(DEFAULT_DEBOUNCE_MS));
        assert_eq!(config.file_name, "favorites.toml");
    }

    #[test]
    fn test_with_debounce_ms() {
        let config = WatcherConfig::new().with_debounce_ms(50);
        assert_eq!(config.debounce, Duration::from_millis(50));
    }

    #[test]
    fn test_is_watched_file() {
        assert!(is_watched_file(
            Path::new("/tmp/cfg/favorites.toml"),
            "favorites.toml"
        ));
        assert!(!is_watched_file(
            Path::new("/tmp/cfg/.favorites.toml.tmp"),
            "favorites.toml"
        ));
        assert!(!is_watched_file(Path::new("/tmp/cfg/config.toml"), "favorites.toml"));
    }

    #[tokio::test]
    async fn test_start_requires_existing_dir() {
        let (tx, _rx) = mpsc::channel(4);
        let mut watcher = FavoritesWatcher::new(
            PathBuf::from("/definitely/not/a/real/dir"),
            WatcherConfig::default(),
        );
        assert!(watcher.start(tx).is_err());
        assert!(!watcher.is_running());
    }

    #[tokio::test]
    async fn test_start_stop() {
        let temp = tempfile::tempdir().unwrap();
        let (tx, _rx) = mpsc::channel(4);
        let mut watcher = FavoritesWatcher::new(temp.path().to_path_buf(), WatcherConfig::default());

        watcher.start(tx.clone()).unwrap();
        assert!(watcher.is_running());
        assert!(watcher.start(tx).is_err());

        watcher.stop();
        assert!(!watcher.is_running());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_change_triggers_reload() {
        let temp = tempfile::tempdir().unwrap();
        let (tx, mut rx) = mpsc::channel(16);
        let mut watcher = FavoritesWatcher::new(
            temp.path().to_path_buf(),
            WatcherConfig::new().with_debounce_ms(50),
        );
        watcher.start(tx).unwrap();

        // Give the backend time to register the watch
        tokio::time::sleep(Duration::from_millis(300)).await;
        crate::config::save_favorites(
            temp.path(),
            &[twatch_core::FavoriteEntity::new("G", "Bedford", "N")],
        )
        .unwrap();

        let msg = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                match rx.recv().await {
                    Some(Message::ReloadFavorites) => return true,
                    Some(_) => continue,
                    None => return false,
                }
            }
        })
        .await;
        assert_eq!(msg, Ok(true));
        watcher.stop();
    }
}
