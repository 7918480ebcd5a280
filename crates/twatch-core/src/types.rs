//! Core domain types for favorites and activity state

use serde::{Deserialize, Serialize};

use crate::arrivals::ArrivalQuery;

/// A persisted line/station/direction tuple the user wants monitored.
///
/// Identity is value equality over all four fields; the favorites store
/// may hold the same station twice only if the direction or line differs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FavoriteEntity {
    /// Subway line identifier (e.g. "G", "A", "7")
    pub line_id: String,

    /// Station name as understood by the transit API
    pub station_name: String,

    /// Station name shown to the user
    #[serde(default)]
    pub station_display: String,

    /// Direction of travel (e.g. "N", "S")
    pub direction: String,
}

impl FavoriteEntity {
    pub fn new(
        line_id: impl Into<String>,
        station_name: impl Into<String>,
        direction: impl Into<String>,
    ) -> Self {
        let station_name = station_name.into();
        Self {
            line_id: line_id.into(),
            station_display: station_name.clone(),
            station_name,
            direction: direction.into(),
        }
    }

    /// Set a display name that differs from the API station name
    pub fn with_display(mut self, station_display: impl Into<String>) -> Self {
        self.station_display = station_display.into();
        self
    }

    /// Name to show the user, falling back to the API station name
    pub fn display_name(&self) -> &str {
        if self.station_display.is_empty() {
            &self.station_name
        } else {
            &self.station_display
        }
    }

    /// The fetch parameters for this favorite
    pub fn query(&self) -> ArrivalQuery {
        ArrivalQuery {
            line_id: self.line_id.clone(),
            station_name: self.station_name.clone(),
            direction: self.direction.clone(),
        }
    }
}

impl std::fmt::Display for FavoriteEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} @ {} ({})",
            self.line_id,
            self.display_name(),
            self.direction
        )
    }
}

/// Foreground/background classification driving the poll interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityMode {
    #[default]
    Foreground,
    Background,
}

impl std::fmt::Display for ActivityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivityMode::Foreground => write!(f, "foreground"),
            ActivityMode::Background => write!(f, "background"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_favorite_display_defaults_to_station_name() {
        let fav = FavoriteEntity::new("G", "Bedford", "N");
        assert_eq!(fav.display_name(), "Bedford");

        let fav = fav.with_display("Bedford Av");
        assert_eq!(fav.display_name(), "Bedford Av");
        assert_eq!(fav.station_name, "Bedford");
    }

    #[test]
    fn test_favorite_equality_covers_direction() {
        let north = FavoriteEntity::new("G", "Bedford", "N");
        let south = FavoriteEntity::new("G", "Bedford", "S");
        assert_ne!(north, south);
        assert_eq!(north, FavoriteEntity::new("G", "Bedford", "N"));
    }

    #[test]
    fn test_favorite_query_uses_api_station_name() {
        let fav = FavoriteEntity::new("L", "Lorimer St", "S").with_display("Lorimer");
        let query = fav.query();
        assert_eq!(query.line_id, "L");
        assert_eq!(query.station_name, "Lorimer St");
        assert_eq!(query.direction, "S");
    }

    #[test]
    fn test_favorite_missing_display_deserializes_empty() {
        let json = r#"{"line_id":"A","station_name":"Jay St","direction":"N"}"#;
        let fav: FavoriteEntity = serde_json::from_str(json).unwrap();
        assert!(fav.station_display.is_empty());
        assert_eq!(fav.display_name(), "Jay St");
    }

    #[test]
    fn test_activity_mode_display() {
        assert_eq!(ActivityMode::Foreground.to_string(), "foreground");
        assert_eq!(ActivityMode::Background.to_string(), "background");
        assert_eq!(ActivityMode::default(), ActivityMode::Foreground);
    }
}
