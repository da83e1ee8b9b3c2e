//! Rendering layer for the Nebula Relics spawn tracker.
//!
//! Turns a published [`Forecast`](nebula_types::Forecast) into something a
//! person can read: a serializable [`ForecastView`](view::ForecastView)
//! that a browser widget consumes as JSON, and a plain-text frame for the
//! terminal.
//!
//! # Modules
//!
//! - [`images`] -- Location image references.
//! - [`markers`] -- Spawn-point coordinates per location and color set.
//! - [`text`] -- Terminal rendition with ASCII marker overlays.
//! - [`view`] -- View model assembly and JSON encoding.

pub mod images;
pub mod markers;
pub mod text;
pub mod view;

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        use ts_rs::TS;

        let _ = crate::markers::MarkerPoint::export_all();
        let _ = crate::view::SpawnCard::export_all();
        let _ = crate::view::WindowView::export_all();
        let _ = crate::view::ForecastView::export_all();
    }
}
