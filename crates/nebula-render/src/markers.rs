//! Static spawn-point marker coordinates.
//!
//! Each (location, color set) pair maps to the spawn points drawn on that
//! location's image, as percentages of the image width and height. The
//! table is read-only data; a missing key means "draw nothing".

use std::collections::BTreeMap;

use nebula_types::{ColorSet, Location, SpawnKind};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// One marker, positioned relative to the location image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MarkerPoint {
    /// Horizontal position, 0 (left) to 100 (right).
    pub x_percent: u8,
    /// Vertical position, 0 (top) to 100 (bottom).
    pub y_percent: u8,
    /// What spawns at this point.
    pub kind: SpawnKind,
}

const fn chest(x_percent: u8, y_percent: u8) -> MarkerPoint {
    MarkerPoint {
        x_percent,
        y_percent,
        kind: SpawnKind::Chest,
    }
}

const fn ore(x_percent: u8, y_percent: u8) -> MarkerPoint {
    MarkerPoint {
        x_percent,
        y_percent,
        kind: SpawnKind::Ore,
    }
}

/// Lookup table from (location, color set) to marker points.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerTable {
    entries: BTreeMap<(Location, ColorSet), Vec<MarkerPoint>>,
}

impl MarkerTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The surveyed in-game coordinates.
    pub fn standard() -> Self {
        let mut table = Self::new();

        table.insert(Location::ArkeumPost, ColorSet::Blue, vec![chest(85, 45), ore(92, 75)]);
        table.insert(Location::ArkeumPost, ColorSet::Green, vec![chest(70, 80), ore(75, 60)]);
        table.insert(Location::ArkeumPost, ColorSet::Orange, vec![chest(45, 70), ore(88, 55)]);

        table.insert(Location::OrcVillage, ColorSet::Blue, vec![chest(15, 25), ore(15, 65)]);
        table.insert(Location::OrcVillage, ColorSet::Green, vec![chest(40, 50), ore(25, 85)]);
        table.insert(Location::OrcVillage, ColorSet::Orange, vec![chest(85, 40), ore(65, 70)]);

        table.insert(
            Location::ShrineOfDevotion,
            ColorSet::Blue,
            vec![chest(55, 65), ore(75, 85)],
        );
        table.insert(
            Location::ShrineOfDevotion,
            ColorSet::Green,
            vec![chest(50, 25), ore(75, 55)],
        );
        table.insert(
            Location::ShrineOfDevotion,
            ColorSet::Orange,
            vec![chest(75, 30), ore(55, 45)],
        );

        table.insert(
            Location::SanctuarySeal,
            ColorSet::Blue,
            vec![chest(45, 55), ore(55, 55), chest(65, 55)],
        );
        table.insert(
            Location::SanctuarySeal,
            ColorSet::Green,
            vec![chest(25, 25), ore(45, 25), chest(65, 25), ore(75, 25)],
        );
        table.insert(
            Location::SanctuarySeal,
            ColorSet::Orange,
            vec![chest(35, 85), ore(45, 85), chest(55, 85)],
        );

        table
    }

    /// Set the markers for one (location, color set) pair, replacing any
    /// previous entry.
    pub fn insert(&mut self, location: Location, color_set: ColorSet, points: Vec<MarkerPoint>) {
        self.entries.insert((location, color_set), points);
    }

    /// Markers for a pair, or an empty slice when the pair is unknown.
    pub fn markers(&self, location: Location, color_set: ColorSet) -> &[MarkerPoint] {
        self.entries
            .get(&(location, color_set))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of (location, color set) pairs with markers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
