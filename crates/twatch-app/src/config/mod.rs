//! Configuration file parsing for Transit Watch
//!
//! Supports:
//! - `<config_dir>/config.toml` - Global settings
//! - `<config_dir>/favorites.toml` - Favorites list

pub mod favorites;
pub mod settings;
pub mod types;

pub use favorites::{
    add_favorite, load_favorites, remove_favorite, save_favorites, FAVORITES_FILENAME,
};
pub use settings::{
    default_config_dir, init_config_dir, load_settings, save_settings, APP_DIR_NAME,
    CONFIG_FILENAME,
};
pub use types::*;
