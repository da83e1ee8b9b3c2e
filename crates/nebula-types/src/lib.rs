//! Shared type definitions for the Nebula Relics spawn tracker.
//!
//! This crate is the single source of truth for the types passed between
//! the predictor, the presentation driver, and the rendering layer. Types
//! flow downstream to `TypeScript` via `ts-rs` for the browser widget.
//!
//! # Modules
//!
//! - [`enums`] -- Locations, spawn kinds, and marker color sets
//! - [`structs`] -- Rotation entries, spawn state, and the published forecast

pub mod enums;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{ColorSet, Location, SpawnKind};
pub use structs::{ActiveSpawn, Forecast, RotationEntry, SpawnSite, SpawnState};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs writes bindings for every #[ts(export)] type into the
        // `bindings/` directory relative to the crate root.
        use ts_rs::TS;

        let _ = crate::enums::Location::export_all();
        let _ = crate::enums::SpawnKind::export_all();
        let _ = crate::enums::ColorSet::export_all();

        let _ = crate::structs::SpawnSite::export_all();
        let _ = crate::structs::RotationEntry::export_all();
        let _ = crate::structs::ActiveSpawn::export_all();
        let _ = crate::structs::SpawnState::export_all();
        let _ = crate::structs::Forecast::export_all();
    }
}
