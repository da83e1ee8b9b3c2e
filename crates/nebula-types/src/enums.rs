//! Enumeration types for the Nebula Relics spawn tracker.
//!
//! Locations, spawn kinds, and marker color sets. Every enum derives
//! `ts-rs` so the browser rendering layer shares the exact same names.

use core::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

/// A named map location that can host a relic spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Location {
    /// Arkeum Post.
    ArkeumPost,
    /// Orc Village.
    OrcVillage,
    /// Sanctuary Seal.
    SanctuarySeal,
    /// Shrine of Devotion.
    ShrineOfDevotion,
}

impl Location {
    /// Every location, in display order.
    pub const ALL: [Self; 4] = [
        Self::ArkeumPost,
        Self::OrcVillage,
        Self::SanctuarySeal,
        Self::ShrineOfDevotion,
    ];

    /// Human-readable name as shown in game.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::ArkeumPost => "Arkeum Post",
            Self::OrcVillage => "Orc Village",
            Self::SanctuarySeal => "Sanctuary Seal",
            Self::ShrineOfDevotion => "Shrine of Devotion",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ---------------------------------------------------------------------------
// Spawn kinds
// ---------------------------------------------------------------------------

/// What spawns at a location. Also used as the kind of a marker point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum SpawnKind {
    /// A relic chest.
    Chest,
    /// A relic ore node.
    Ore,
}

impl SpawnKind {
    /// Human-readable label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Chest => "Chest",
            Self::Ore => "Ore",
        }
    }

    /// Single-character glyph used by text renderers.
    pub const fn glyph(self) -> char {
        match self {
            Self::Chest => 'C',
            Self::Ore => 'O',
        }
    }
}

impl fmt::Display for SpawnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Color sets
// ---------------------------------------------------------------------------

/// Cosmetic grouping of spawn-point markers. One color set is active per
/// 20-minute window, cycling three times per hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ColorSet {
    /// First window of the hour.
    Blue,
    /// Second window of the hour.
    Green,
    /// Third window of the hour.
    Orange,
}

impl ColorSet {
    /// Lower-case label, matching the marker table keys.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Orange => "orange",
        }
    }
}

impl fmt::Display for ColorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_display_names() {
        assert_eq!(Location::ArkeumPost.to_string(), "Arkeum Post");
        assert_eq!(Location::ShrineOfDevotion.to_string(), "Shrine of Devotion");
    }

    #[test]
    fn all_locations_are_distinct() {
        let mut sorted = Location::ALL.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), Location::ALL.len());
    }

    #[test]
    fn enums_serialize_as_variant_names() {
        let json = serde_json::to_string(&Location::SanctuarySeal).ok();
        assert_eq!(json.as_deref(), Some("\"SanctuarySeal\""));
        let json = serde_json::to_string(&ColorSet::Orange).ok();
        assert_eq!(json.as_deref(), Some("\"Orange\""));
    }

    #[test]
    fn spawn_kind_glyphs() {
        assert_eq!(SpawnKind::Chest.glyph(), 'C');
        assert_eq!(SpawnKind::Ore.glyph(), 'O');
    }
}
