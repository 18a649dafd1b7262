//! Hand-authored destinations with fixed world coordinates.
//!
//! Tables live in `data/destinations/*.ron`; files are merged in file-name
//! order, points in declaration order.
use bevy::log::info;
use bevy::prelude::Vec3;
use serde::{Deserialize, Serialize};

use crate::ron::load_ron_files;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedDestination {
    pub label: String,
    pub position: Vec3,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DestinationTable {
    #[serde(default)]
    pub points: Vec<FixedDestination>,
}

/// Built-in table used when no files are found (e.g. in the browser).
#[must_use]
pub fn default_destinations() -> Vec<FixedDestination> {
    [
        ("Main Entrance", Vec3::new(0.0, 1.0, 12.0)),
        ("Reception", Vec3::new(4.0, 1.0, 6.0)),
        ("Emergency Exit", Vec3::new(-14.0, 1.0, -10.0)),
    ]
    .into_iter()
    .map(|(label, position)| FixedDestination { label: label.to_string(), position })
    .collect()
}

/// Load and merge every destination table under `dir`.
#[must_use]
pub fn load_destinations(dir: &str) -> Vec<FixedDestination> {
    let tables: Vec<DestinationTable> = load_ron_files(dir);
    if tables.is_empty() {
        info!("no destination tables in {dir}, using built-in list");
        return default_destinations();
    }
    tables.into_iter().flat_map(|t| t.points).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_parses_from_ron() {
        let t: DestinationTable = crate::ron::parse_ron_str(
            "inline",
            "(points: [(label: \"Cafeteria\", position: (1.0, 0.0, -3.5))])",
        )
        .unwrap();
        assert_eq!(t.points.len(), 1);
        assert_eq!(t.points[0].position, Vec3::new(1.0, 0.0, -3.5));
    }

    #[test]
    fn missing_dir_falls_back_to_builtin() {
        assert_eq!(load_destinations("no/such/dir"), default_destinations());
    }
}
