//! Application error types with rich context

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ─────────────────────────────────────────────────────────────
    // Favorites Store Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Favorites error: {message}")]
    Favorites { message: String },

    // ─────────────────────────────────────────────────────────────
    // Transit API Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Transit source error: {message}")]
    Transit { message: String },

    #[error("Failed to install signal handler: {message}")]
    Signal { message: String },
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn favorites(message: impl Into<String>) -> Self {
        Self::Favorites {
            message: message.into(),
        }
    }

    pub fn transit(message: impl Into<String>) -> Self {
        Self::Transit {
            message: message.into(),
        }
    }

    pub fn signal(message: impl Into<String>) -> Self {
        Self::Signal {
            message: message.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }
}
