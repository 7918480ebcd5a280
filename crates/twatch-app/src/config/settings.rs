//! Settings loading from config.toml

use std::path::{Path, PathBuf};

use twatch_core::prelude::*;

use super::types::Settings;

/// Directory name under the platform config directory
pub const APP_DIR_NAME: &str = "transit-watch";

pub const CONFIG_FILENAME: &str = "config.toml";

/// Platform config directory for Transit Watch
///
/// Falls back to `./.transit-watch` when the platform has no config dir.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(format!(".{}", APP_DIR_NAME)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Settings Loading
// ─────────────────────────────────────────────────────────────────────────────

/// Load settings from `<config_dir>/config.toml`
///
/// Returns default settings if file doesn't exist or can't be parsed.
pub fn load_settings(config_dir: &Path) -> Settings {
    let config_path = config_dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return Settings::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", config_path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", config_path, e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            Settings::default()
        }
    }
}

/// Create the config directory and a commented default config.toml
///
/// Existing files are left untouched.
pub fn init_config_dir(config_dir: &Path) -> Result<()> {
    if !config_dir.exists() {
        std::fs::create_dir_all(config_dir).map_err(|e| {
            Error::config(format!("Failed to create {}: {}", config_dir.display(), e))
        })?;
    }

    let config_path = config_dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        std::fs::write(&config_path, generate_default_config())
            .map_err(|e| Error::config(format!("Failed to write config.toml: {}", e)))?;
        info!("Created default config at {:?}", config_path);
    }

    Ok(())
}

/// Save settings to `<config_dir>/config.toml`
///
/// Uses atomic write (temp file + rename).
pub fn save_settings(config_dir: &Path, settings: &Settings) -> Result<()> {
    if !config_dir.exists() {
        std::fs::create_dir_all(config_dir).map_err(|e| {
            Error::config(format!("Failed to create {}: {}", config_dir.display(), e))
        })?;
    }

    let config_path = config_dir.join(CONFIG_FILENAME);
    let temp_path = config_dir.join(".config.toml.tmp");

    let content = toml::to_string_pretty(settings)
        .map_err(|e| Error::config(format!("Failed to serialize settings: {}", e)))?;
    let full_content = format!("# Transit Watch Configuration\n\n{}", content);

    std::fs::write(&temp_path, &full_content)
        .map_err(|e| Error::config(format!("Failed to write temp file: {}", e)))?;

    std::fs::rename(&temp_path, &config_path)
        .map_err(|e| Error::config(format!("Failed to rename temp file: {}", e)))?;

    info!("Saved settings to {:?}", config_path);
    Ok(())
}

fn generate_default_config() -> &'static str {
    r#"# Transit Watch Configuration

[polling]
foreground_interval_seconds = 30    # Refresh cadence while in the foreground
background_interval_seconds = 180   # Refresh cadence while in the background
suspend_in_background = false       # true = no polling at all in the background
stagger_ms = 500                    # Startup offset between consecutive favorites

[transit]
base_url = "http://localhost:8080/api"
timeout_seconds = 10

[watcher]
enabled = true                      # Rebuild when favorites.toml changes
debounce_ms = 300
"#
}
