//! twatch-app - Polling engine and orchestration for Transit Watch
//!
//! This crate implements the TEA (The Elm Architecture) pattern for state
//! management: every change flows through [`handler::update`] on a single
//! engine loop, while fetches and timers run as tokio tasks that report back
//! through the message channel.
//!
//! ## Layers
//! - [`feed`] - per-query arrival state and poll scheduling
//! - [`subscription`] - one favorite bound to one feed, with delayed start
//! - [`coordinator`] - the ordered favorites list, stagger and lifecycle fan-out
//! - [`engine`] - the loop owner: channels, dispatch, watcher, events

pub mod actions;
pub mod config;
pub mod coordinator;
pub mod deferred;
pub mod engine;
pub mod engine_event;
pub mod feed;
pub mod handler;
pub mod message;
pub mod process;
pub mod signals;
pub mod state;
pub mod subscription;
pub mod view;
pub mod watcher;

// Re-export primary types
pub use coordinator::{FavoritesCoordinator, Notification};
pub use engine::Engine;
pub use engine_event::EngineEvent;
pub use feed::{ArrivalFeed, PollPolicy};
pub use handler::{UpdateAction, UpdateResult};
pub use message::Message;
pub use state::AppState;
pub use subscription::{FavoriteSubscription, SubscriptionId};
pub use view::FavoriteView;
