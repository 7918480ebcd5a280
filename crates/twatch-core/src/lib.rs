//! # twatch-core - Core Domain Types
//!
//! Foundation crate for Transit Watch. Provides the favorite and arrival
//! domain types, the fetch failure taxonomy, error handling, and logging.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, thiserror, toml, tracing).
//!
//! ## Public API
//!
//! ### Domain Types (`types`, `arrivals`)
//! - [`FavoriteEntity`] - A monitored line/station/direction tuple
//! - [`ActivityMode`] - Foreground/background classification
//! - [`ArrivalSample`] - One arrival prediction in minutes
//! - [`ArrivalQuery`] - Parameters of one transit API fetch
//! - [`FetchError`] - Network / decode / no-data failure taxonomy
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum for config, favorites, transit and signal failures
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! ```rust
//! use twatch_core::prelude::*;
//! ```

pub mod arrivals;
pub mod error;
pub mod logging;
pub mod types;

/// Prelude for common imports used throughout all Transit Watch crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

pub use arrivals::{sort_samples, ArrivalQuery, ArrivalSample, FetchError};
pub use error::{Error, Result, ResultExt};
pub use types::{ActivityMode, FavoriteEntity};
