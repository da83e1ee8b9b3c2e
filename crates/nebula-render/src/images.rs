//! Location image references.
//!
//! Where the background image for each location lives. The default points
//! at relative asset paths; deployments override individual entries from
//! the `display.images` config section.

use std::collections::BTreeMap;

use nebula_types::Location;

/// Lookup table from location to image reference (path or URL).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageTable {
    entries: BTreeMap<Location, String>,
}

impl ImageTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Relative asset paths, one per location.
    pub fn standard() -> Self {
        let entries = Location::ALL
            .into_iter()
            .map(|location| (location, format!("assets/{}.png", asset_stem(location))))
            .collect();
        Self { entries }
    }

    /// Replace entries with the given overrides, keeping the rest.
    #[must_use]
    pub fn with_overrides(mut self, overrides: &BTreeMap<Location, String>) -> Self {
        for (location, image) in overrides {
            self.entries.insert(*location, image.clone());
        }
        self
    }

    /// Image for `location`, if one is known.
    pub fn image(&self, location: Location) -> Option<&str> {
        self.entries.get(&location).map(String::as_str)
    }
}

const fn asset_stem(location: Location) -> &'static str {
    match location {
        Location::ArkeumPost => "arkeum-post",
        Location::OrcVillage => "orc-village",
        Location::SanctuarySeal => "sanctuary-seal",
        Location::ShrineOfDevotion => "shrine-of-devotion",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_images_use_asset_paths() {
        let table = ImageTable::standard();
        assert_eq!(table.image(Location::OrcVillage), Some("assets/orc-village.png"));
        for location in Location::ALL {
            assert!(table.image(location).is_some());
        }
    }

    #[test]
    fn overrides_replace_single_entries() {
        let mut overrides = BTreeMap::new();
        overrides.insert(Location::ArkeumPost, "https://cdn.example/a.png".to_owned());
        let table = ImageTable::standard().with_overrides(&overrides);

        assert_eq!(table.image(Location::ArkeumPost), Some("https://cdn.example/a.png"));
        assert_eq!(
            table.image(Location::SanctuarySeal),
            Some("assets/sanctuary-seal.png")
        );
    }

    #[test]
    fn empty_table_has_no_images() {
        assert_eq!(ImageTable::new().image(Location::ShrineOfDevotion), None);
    }
}
