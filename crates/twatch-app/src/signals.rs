//! OS signal handling
//!
//! SIGINT and SIGTERM quit the engine. On unix, SIGHUP re-reads the
//! favorites file, the conventional daemon reload.

use tokio::sync::mpsc;
use twatch_core::prelude::*;

use crate::message::Message;

/// What a received signal asks the engine to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignalRequest {
    Quit,
    Reload,
}

impl SignalRequest {
    fn into_message(self) -> Message {
        match self {
            SignalRequest::Quit => Message::Quit,
            SignalRequest::Reload => Message::ReloadFavorites,
        }
    }
}

/// Spawn a task that turns OS signals into engine messages
///
/// The task ends after the first quit request or when the engine is gone.
pub fn spawn_signal_handler(tx: mpsc::Sender<Message>) {
    tokio::spawn(async move {
        let mut listener = match SignalListener::new() {
            Ok(listener) => listener,
            Err(e) => {
                error!("Signal handler error: {}", e);
                return;
            }
        };

        loop {
            let request = match listener.next().await {
                Ok(request) => request,
                Err(e) => {
                    error!("Signal handler error: {}", e);
                    return;
                }
            };

            info!("Signal received: {:?}", request);
            if tx.send(request.into_message()).await.is_err() || request == SignalRequest::Quit
            {
                return;
            }
        }
    });
}

#[cfg(unix)]
struct SignalListener {
    sigint: tokio::signal::unix::Signal,
    sigterm: tokio::signal::unix::Signal,
    sighup: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl SignalListener {
    fn new() -> Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        let install = |kind: SignalKind, name: &str| {
            signal(kind)
                .map_err(|e| Error::signal(format!("Failed to install {} handler: {}", name, e)))
        };

        Ok(Self {
            sigint: install(SignalKind::interrupt(), "SIGINT")?,
            sigterm: install(SignalKind::terminate(), "SIGTERM")?,
            sighup: install(SignalKind::hangup(), "SIGHUP")?,
        })
    }

    async fn next(&mut self) -> Result<SignalRequest> {
        tokio::select! {
            _ = self.sigint.recv() => Ok(SignalRequest::Quit),
            _ = self.sigterm.recv() => Ok(SignalRequest::Quit),
            _ = self.sighup.recv() => Ok(SignalRequest::Reload),
        }
    }
}

#[cfg(windows)]
struct SignalListener;

#[cfg(windows)]
impl SignalListener {
    fn new() -> Result<Self> {
        Ok(Self)
    }

    async fn next(&mut self) -> Result<SignalRequest> {
        tokio::signal::ctrl_c()
            .await
            .map_err(|e| Error::signal(format!("Failed to listen for Ctrl+C: {}", e)))?;
        Ok(SignalRequest::Quit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_requests_map_to_messages() {
        assert!(matches!(
            SignalRequest::Quit.into_message(),
            Message::Quit
        ));
        assert!(matches!(
            SignalRequest::Reload.into_message(),
            Message::ReloadFavorites
        ));
    }

    #[tokio::test]
    async fn test_signal_handler_spawn() {
        let (tx, mut rx) = mpsc::channel::<Message>(1);

        spawn_signal_handler(tx);
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        // No signal sent yet
        assert!(rx.try_recv().is_err());
    }
}
