//! Core structs for the Nebula Relics spawn tracker.
//!
//! Covers the static rotation data ([`SpawnSite`], [`RotationEntry`]) and
//! the computed snapshots ([`SpawnState`], [`Forecast`]) that the driver
//! publishes to renderers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ColorSet, Location, SpawnKind};

// ---------------------------------------------------------------------------
// Rotation data
// ---------------------------------------------------------------------------

/// A single (location, spawn kind) assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SpawnSite {
    /// Where the relic spawns.
    pub location: Location,
    /// What spawns there.
    pub kind: SpawnKind,
}

impl SpawnSite {
    /// Create a new spawn site.
    pub const fn new(location: Location, kind: SpawnKind) -> Self {
        Self { location, kind }
    }
}

/// One hour of the rotation: the two sites active during that hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RotationEntry {
    /// First active site.
    pub first: SpawnSite,
    /// Second active site.
    pub second: SpawnSite,
}

impl RotationEntry {
    /// Create a rotation entry from its two sites.
    pub const fn new(first: SpawnSite, second: SpawnSite) -> Self {
        Self { first, second }
    }

    /// Attach a color set to both sites.
    pub const fn activate(self, color_set: ColorSet) -> [ActiveSpawn; 2] {
        [
            ActiveSpawn::new(self.first, color_set),
            ActiveSpawn::new(self.second, color_set),
        ]
    }
}

// ---------------------------------------------------------------------------
// Computed state
// ---------------------------------------------------------------------------

/// An active spawn with the color set of its window attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ActiveSpawn {
    /// Where the relic spawns.
    pub location: Location,
    /// What spawns there.
    pub kind: SpawnKind,
    /// Marker color set in effect for this window.
    pub color_set: ColorSet,
}

impl ActiveSpawn {
    /// Attach `color_set` to `site`.
    pub const fn new(site: SpawnSite, color_set: ColorSet) -> Self {
        Self {
            location: site.location,
            kind: site.kind,
            color_set,
        }
    }
}

/// Spawn state for a single instant.
///
/// Derived only from the time elapsed since the reference epoch. Two
/// instants with the same elapsed minute (modulo the rotation and color
/// cycles) always produce equal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SpawnState {
    /// The two active spawns for the current hour.
    pub spawns: [ActiveSpawn; 2],
    /// Whole minutes until the current 20-minute window ends, in `1..=20`.
    /// Exactly 20 means the window has just started.
    pub minutes_to_next_transition: u32,
    /// Marker color set of the current window.
    pub color_set: ColorSet,
    /// Index into the rotation table selected for the current hour.
    #[ts(type = "number")]
    pub rotation_index: usize,
}

/// The snapshot published by the presentation driver on every tick.
///
/// Always replaced as a whole; never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Forecast {
    /// Wall-clock instant the forecast was computed for.
    pub sampled_at: DateTime<Utc>,
    /// Instant the current 20-minute window ends.
    pub next_transition_at: DateTime<Utc>,
    /// State at `sampled_at`.
    pub current: SpawnState,
    /// State of the window after the current one.
    pub next: SpawnState,
    /// State of the window after `next`.
    pub following: SpawnState,
}

impl Forecast {
    /// Time left until the current window ends, clamped at zero.
    pub fn countdown(&self) -> chrono::Duration {
        let remaining = self.next_transition_at.signed_duration_since(self.sampled_at);
        remaining.max(chrono::Duration::zero())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn sample_state(color_set: ColorSet) -> SpawnState {
        let entry = RotationEntry::new(
            SpawnSite::new(Location::SanctuarySeal, SpawnKind::Ore),
            SpawnSite::new(Location::OrcVillage, SpawnKind::Chest),
        );
        SpawnState {
            spawns: entry.activate(color_set),
            minutes_to_next_transition: 20,
            color_set,
            rotation_index: 0,
        }
    }

    #[test]
    fn activate_attaches_color_to_both_sites() {
        let entry = RotationEntry::new(
            SpawnSite::new(Location::ArkeumPost, SpawnKind::Chest),
            SpawnSite::new(Location::OrcVillage, SpawnKind::Ore),
        );
        let [a, b] = entry.activate(ColorSet::Green);
        assert_eq!(a.location, Location::ArkeumPost);
        assert_eq!(a.kind, SpawnKind::Chest);
        assert_eq!(a.color_set, ColorSet::Green);
        assert_eq!(b.location, Location::OrcVillage);
        assert_eq!(b.color_set, ColorSet::Green);
    }

    #[test]
    fn countdown_measures_until_transition() {
        let sampled_at = Utc.with_ymd_and_hms(2025, 1, 17, 2, 5, 30).unwrap();
        let next_transition_at = Utc.with_ymd_and_hms(2025, 1, 17, 2, 20, 0).unwrap();
        let forecast = Forecast {
            sampled_at,
            next_transition_at,
            current: sample_state(ColorSet::Blue),
            next: sample_state(ColorSet::Green),
            following: sample_state(ColorSet::Orange),
        };
        assert_eq!(forecast.countdown().num_seconds(), 870);
    }

    #[test]
    fn forecast_json_roundtrip() {
        let at = Utc.with_ymd_and_hms(2025, 1, 17, 2, 0, 0).unwrap();
        let forecast = Forecast {
            sampled_at: at,
            next_transition_at: at,
            current: sample_state(ColorSet::Blue),
            next: sample_state(ColorSet::Green),
            following: sample_state(ColorSet::Orange),
        };
        let json = serde_json::to_string(&forecast).unwrap();
        let back: Forecast = serde_json::from_str(&json).unwrap();
        assert_eq!(back, forecast);
    }
}
