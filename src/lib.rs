//! Transit Watch Library
//!
//! Live subway arrival favorites: a headless runner over the polling engine
//! in `twatch-app`, plus favorites store maintenance commands.

pub mod commands;
pub mod headless;

// Re-export main entry points
pub use headless::runner::run_headless;
