//! Favorites store maintenance commands (`twatch add|remove|list`)

use std::io::Write;
use std::path::Path;

use twatch_app::config;
use twatch_core::prelude::*;
use twatch_core::FavoriteEntity;

/// Add a favorite and print the resulting list
pub fn add(config_dir: &Path, favorite: FavoriteEntity, out: &mut impl Write) -> Result<()> {
    info!("Adding favorite {}", favorite);
    let favorites = config::add_favorite(config_dir, favorite)?;
    write_list(&favorites, out)
}

/// Remove a favorite by line, station and direction and print the rest
pub fn remove(
    config_dir: &Path,
    line_id: &str,
    station_name: &str,
    direction: &str,
    out: &mut impl Write,
) -> Result<()> {
    info!(
        "Removing favorite {} @ {} ({})",
        line_id, station_name, direction
    );
    let favorites = config::remove_favorite(config_dir, line_id, station_name, direction)?;
    write_list(&favorites, out)
}

/// Print the stored favorites in order
pub fn list(config_dir: &Path, out: &mut impl Write) -> Result<()> {
    let favorites = config::load_favorites(config_dir)?;
    write_list(&favorites, out)
}

fn write_list(favorites: &[FavoriteEntity], out: &mut impl Write) -> Result<()> {
    if favorites.is_empty() {
        writeln!(out, "No favorites.")?;
        return Ok(());
    }
    for (index, favorite) in favorites.iter().enumerate() {
        writeln!(out, "{:>3}. {}", index + 1, favorite)?;
    }
    Ok(())
}
