//! Favorites persistence (favorites.toml)
//!
//! The file is the source of truth for the favorites list. The engine
//! rebuilds its subscriptions whenever it changes.

use std::path::Path;

use twatch_core::prelude::*;
use twatch_core::FavoriteEntity;

use super::types::FavoritesFile;

pub const FAVORITES_FILENAME: &str = "favorites.toml";

/// Load the favorites list in stored order
///
/// A missing file is an empty list. Unlike settings, a malformed file is an
/// error: silently dropping every favorite would look like a deletion.
pub fn load_favorites(config_dir: &Path) -> Result<Vec<FavoriteEntity>> {
    let path = config_dir.join(FAVORITES_FILENAME);

    if !path.exists() {
        debug!("No favorites file at {:?}", path);
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::favorites(format!("Failed to read {}: {}", path.display(), e)))?;

    let file: FavoritesFile = toml::from_str(&content)
        .map_err(|e| Error::favorites(format!("Failed to parse {}: {}", path.display(), e)))?;

    debug!("Loaded {} favorites from {:?}", file.favorites.len(), path);
    Ok(file.favorites)
}

/// Replace the stored favorites list
///
/// Uses atomic write (temp file + rename) so a watcher never observes a
/// half-written file.
pub fn save_favorites(config_dir: &Path, favorites: &[FavoriteEntity]) -> Result<()> {
    if !config_dir.exists() {
        std::fs::create_dir_all(config_dir).map_err(|e| {
            Error::favorites(format!("Failed to create {}: {}", config_dir.display(), e))
        })?;
    }

    let path = config_dir.join(FAVORITES_FILENAME);
    let temp_path = config_dir.join(".favorites.toml.tmp");

    let file = FavoritesFile {
        favorites: favorites.to_vec(),
    };
    let content = toml::to_string_pretty(&file)
        .map_err(|e| Error::favorites(format!("Failed to serialize favorites: {}", e)))?;

    std::fs::write(&temp_path, format!("# Transit Watch favorites\n\n{}", content))
        .map_err(|e| Error::favorites(format!("Failed to write temp file: {}", e)))?;

    std::fs::rename(&temp_path, &path)
        .map_err(|e| Error::favorites(format!("Failed to rename temp file: {}", e)))?;

    info!("Saved {} favorites to {:?}", favorites.len(), path);
    Ok(())
}

/// Append a favorite, rejecting exact duplicates
///
/// Returns the new list.
pub fn add_favorite(config_dir: &Path, favorite: FavoriteEntity) -> Result<Vec<FavoriteEntity>> {
    let mut favorites = load_favorites(config_dir)?;

    if favorites.contains(&favorite) {
        return Err(Error::favorites(format!(
            "'{}' is already a favorite",
            favorite
        )));
    }

    favorites.push(favorite);
    save_favorites(config_dir, &favorites)?;
    Ok(favorites)
}

/// Remove every favorite matching line, station and direction
///
/// Returns the new list. Errors if nothing matched.
pub fn remove_favorite(
    config_dir: &Path,
    line_id: &str,
    station_name: &str,
    direction: &str,
) -> Result<Vec<FavoriteEntity>> {
    let mut favorites = load_favorites(config_dir)?;
    let before = favorites.len();

    favorites.retain(|f| {
        !(f.line_id == line_id && f.station_name == station_name && f.direction == direction)
    });

    if favorites.len() == before {
        return Err(Error::favorites(format!(
            "No favorite matches {} @ {} ({})",
            line_id, station_name, direction
        )));
    }

    save_favorites(config_dir, &favorites)?;
    Ok(favorites)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_favorites_missing_file_is_empty() {
        let temp = tempdir().unwrap();
        assert!(load_favorites(temp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_load_favorites_malformed_is_error() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join(FAVORITES_FILENAME), "[[favorites]\n").unwrap();

        let err = load_favorites(temp.path()).unwrap_err();
        assert!(matches!(err, Error::Favorites { .. }));
    }

    #[test]
    fn test_save_then_load_preserves_order() {
        let temp = tempdir().unwrap();
        let favorites = vec![
            FavoriteEntity::new("L", "Lorimer St", "S"),
            FavoriteEntity::new("G", "Bedford", "N").with_display("Bedford-Nostrand"),
        ];

        save_favorites(temp.path(), &favorites).unwrap();

        assert_eq!(load_favorites(temp.path()).unwrap(), favorites);
        assert!(!temp.path().join(".favorites.toml.tmp").exists());
    }

    #[test]
    fn test_add_favorite_appends() {
        let temp = tempdir().unwrap();
        add_favorite(temp.path(), FavoriteEntity::new("G", "Bedford", "N")).unwrap();
        let list = add_favorite(temp.path(), FavoriteEntity::new("G", "Bedford", "S")).unwrap();

        assert_eq!(list.len(), 2);
        assert_eq!(list[1].direction, "S");
        assert_eq!(load_favorites(temp.path()).unwrap(), list);
    }

    #[test]
    fn test_add_favorite_rejects_duplicate() {
        let temp = tempdir().unwrap();
        add_favorite(temp.path(), FavoriteEntity::new("G", "Bedford", "N")).unwrap();

        let err = add_favorite(temp.path(), FavoriteEntity::new("G", "Bedford", "N")).unwrap_err();
        assert!(err.to_string().contains("already a favorite"));
        assert_eq!(load_favorites(temp.path()).unwrap().len(), 1);
    }

    #[test]
    fn test_remove_favorite() {
        let temp = tempdir().unwrap();
        add_favorite(temp.path(), FavoriteEntity::new("G", "Bedford", "N")).unwrap();
        add_favorite(temp.path(), FavoriteEntity::new("L", "Lorimer St", "S")).unwrap();

        let list = remove_favorite(temp.path(), "G", "Bedford", "N").unwrap();

        assert_eq!(list, vec![FavoriteEntity::new("L", "Lorimer St", "S")]);
    }

    #[test]
    fn test_remove_missing_favorite_is_error() {
        let temp = tempdir().unwrap();
        add_favorite(temp.path(), FavoriteEntity::new("G", "Bedford", "N")).unwrap();

        assert!(remove_favorite(temp.path(), "G", "Bedford", "S").is_err());
        assert_eq!(load_favorites(temp.path()).unwrap().len(), 1);
    }
}
