//! View model assembly.
//!
//! Joins a published [`Forecast`] with the static marker and image tables
//! and formats instants in the configured display time zone. The result is
//! plain serializable data; [`crate::text`] draws it for a terminal and
//! [`to_json`] hands it to a browser.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use nebula_core::config::DisplayConfig;
use nebula_core::predictor::{self, WINDOW_MINUTES};
use nebula_types::{ActiveSpawn, ColorSet, Forecast, Location, SpawnKind, SpawnState};
use serde::Serialize;
use tracing::debug;
use ts_rs::TS;

use crate::images::ImageTable;
use crate::markers::{MarkerPoint, MarkerTable};

const SECONDS_PER_MINUTE: i64 = 60;

/// Label of the window after the current one.
pub const NEXT_LABEL: &str = "Next Spawn";

/// Label of the window after that.
pub const FOLLOWING_LABEL: &str = "Following Spawn";

/// One location card: where, what, and the markers to overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SpawnCard {
    /// Location key.
    pub location: Location,
    /// Location display name.
    pub name: String,
    /// What spawns there.
    pub kind: SpawnKind,
    /// Color set whose markers are shown.
    pub color_set: ColorSet,
    /// Background image, if known.
    pub image: Option<String>,
    /// Marker points to overlay on the image. Empty if unknown.
    pub markers: Vec<MarkerPoint>,
}

/// An upcoming window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WindowView {
    /// "Next Spawn" or "Following Spawn".
    pub label: String,
    /// Local start time of the window.
    pub starts_at: String,
    /// Zone abbreviation in effect at the window start, e.g. `EDT`.
    pub timezone_label: String,
    /// Color set of the window.
    pub color_set: ColorSet,
    /// Cards for the two spawns of the window.
    pub cards: Vec<SpawnCard>,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ForecastView {
    /// Local time the forecast was sampled.
    pub server_time: String,
    /// Zone abbreviation in effect at the sample instant, e.g. `EST`.
    pub timezone_label: String,
    /// Time left in the current window, as `"{m}m {s}s"`.
    pub countdown: String,
    /// Time left in the current window, in seconds.
    #[ts(type = "number")]
    pub countdown_seconds: i64,
    /// Color set of the current window.
    pub color_set: ColorSet,
    /// Cards for the currently active spawns.
    pub current: Vec<SpawnCard>,
    /// The next two windows.
    pub upcoming: Vec<WindowView>,
}

/// Build the view for `forecast`.
pub fn build(
    forecast: &Forecast,
    markers: &MarkerTable,
    images: &ImageTable,
    display: &DisplayConfig,
) -> ForecastView {
    let tz = display.timezone;
    let countdown_seconds = forecast.countdown().num_seconds();

    let following_at = predictor::offset_minutes(forecast.next_transition_at, WINDOW_MINUTES);

    ForecastView {
        server_time: format_local(forecast.sampled_at, tz),
        timezone_label: zone_label(forecast.sampled_at, tz),
        countdown: format_countdown(countdown_seconds),
        countdown_seconds,
        color_set: forecast.current.color_set,
        current: cards(&forecast.current, markers, images),
        upcoming: vec![
            window(NEXT_LABEL, forecast.next_transition_at, &forecast.next, tz, markers, images),
            window(FOLLOWING_LABEL, following_at, &forecast.following, tz, markers, images),
        ],
    }
}

/// Serialize a view for a browser or other JSON consumer.
///
/// # Errors
///
/// Returns the underlying [`serde_json::Error`] if serialization fails.
pub fn to_json(view: &ForecastView) -> Result<String, serde_json::Error> {
    serde_json::to_string(view)
}

/// Format an instant as a 12-hour local clock time, e.g. `9:05:30 PM`.
pub fn format_local(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format("%-I:%M:%S %p").to_string()
}

/// Abbreviation of the zone offset in effect at `instant`, e.g. `EST` or
/// `EDT`.
pub fn zone_label(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format("%Z").to_string()
}

/// Format a second count as `"{m}m {s}s"`. Negative input shows as zero.
pub fn format_countdown(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let minutes = seconds.checked_div(SECONDS_PER_MINUTE).unwrap_or(0);
    let rest = seconds.checked_rem(SECONDS_PER_MINUTE).unwrap_or(0);
    format!("{minutes}m {rest}s")
}

fn window(
    label: &str,
    starts_at: DateTime<Utc>,
    state: &SpawnState,
    tz: Tz,
    markers: &MarkerTable,
    images: &ImageTable,
) -> WindowView {
    WindowView {
        label: label.to_owned(),
        starts_at: format_local(starts_at, tz),
        timezone_label: zone_label(starts_at, tz),
        color_set: state.color_set,
        cards: cards(state, markers, images),
    }
}

fn cards(state: &SpawnState, markers: &MarkerTable, images: &ImageTable) -> Vec<SpawnCard> {
    state
        .spawns
        .iter()
        .map(|spawn| card(spawn, markers, images))
        .collect()
}

fn card(spawn: &ActiveSpawn, markers: &MarkerTable, images: &ImageTable) -> SpawnCard {
    let points = markers.markers(spawn.location, spawn.color_set);
    if points.is_empty() {
        debug!(
            location = %spawn.location,
            color_set = %spawn.color_set,
            "No markers for location"
        );
    }
    SpawnCard {
        location: spawn.location,
        name: spawn.location.display_name().to_owned(),
        kind: spawn.kind,
        color_set: spawn.color_set,
        image: images.image(spawn.location).map(str::to_owned),
        markers: points.to_vec(),
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
mod tests {
    use chrono::{TimeDelta, TimeZone};
    use nebula_core::config::PredictorConfig;
    use nebula_core::driver::evaluate;
    use nebula_core::predictor::SpawnPredictor;

    use super::*;

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 17, 2, 0, 0).unwrap()
    }

    fn forecast_at(minutes: i64, seconds: i64) -> Forecast {
        let predictor = SpawnPredictor::new(&PredictorConfig::default()).unwrap();
        let now = epoch()
            .checked_add_signed(TimeDelta::try_seconds(minutes * 60 + seconds).unwrap())
            .unwrap();
        evaluate(&predictor, now)
    }

    #[test]
    fn countdown_formatting() {
        assert_eq!(format_countdown(0), "0m 0s");
        assert_eq!(format_countdown(870), "14m 30s");
        assert_eq!(format_countdown(1200), "20m 0s");
        assert_eq!(format_countdown(-5), "0m 0s");
    }

    #[test]
    fn local_time_uses_display_zone() {
        let at = epoch() + TimeDelta::try_seconds(5 * 60 + 30).unwrap();
        assert_eq!(format_local(at, Tz::America__New_York), "9:05:30 PM");
        assert_eq!(zone_label(at, Tz::America__New_York), "EST");
        assert_eq!(format_local(at, Tz::UTC), "2:05:30 AM");
        assert_eq!(zone_label(at, Tz::UTC), "UTC");
    }

    #[test]
    fn summer_time_follows_daylight_saving() {
        let summer = Utc.with_ymd_and_hms(2025, 7, 1, 14, 0, 0).unwrap();
        assert_eq!(format_local(summer, Tz::America__New_York), "10:00:00 AM");
        assert_eq!(zone_label(summer, Tz::America__New_York), "EDT");

        let predictor = SpawnPredictor::new(&PredictorConfig::default()).unwrap();
        let view = build(
            &evaluate(&predictor, summer),
            &MarkerTable::standard(),
            &ImageTable::standard(),
            &DisplayConfig::default(),
        );
        assert_eq!(view.server_time, "10:00:00 AM");
        assert_eq!(view.timezone_label, "EDT");
        assert_eq!(view.upcoming[0].starts_at, "10:20:00 AM");
        assert_eq!(view.upcoming[0].timezone_label, "EDT");
    }

    #[test]
    fn window_label_tracks_the_switch_to_daylight_time() {
        // 2025-03-09 01:50 EST; clocks jump from 2:00 EST to 3:00 EDT.
        let before = Utc.with_ymd_and_hms(2025, 3, 9, 6, 50, 0).unwrap();
        let predictor = SpawnPredictor::new(&PredictorConfig::default()).unwrap();
        let view = build(
            &evaluate(&predictor, before),
            &MarkerTable::standard(),
            &ImageTable::standard(),
            &DisplayConfig::default(),
        );
        assert_eq!(view.server_time, "1:50:00 AM");
        assert_eq!(view.timezone_label, "EST");
        assert_eq!(view.upcoming[0].starts_at, "3:00:00 AM");
        assert_eq!(view.upcoming[0].timezone_label, "EDT");
    }

    #[test]
    fn view_for_reference_epoch() {
        let forecast = forecast_at(5, 30);
        let view = build(
            &forecast,
            &MarkerTable::standard(),
            &ImageTable::standard(),
            &DisplayConfig::default(),
        );

        assert_eq!(view.server_time, "9:05:30 PM");
        assert_eq!(view.timezone_label, "EST");
        assert_eq!(view.countdown, "14m 30s");
        assert_eq!(view.countdown_seconds, 870);
        assert_eq!(view.color_set, ColorSet::Blue);

        assert_eq!(view.current.len(), 2);
        assert_eq!(view.current[0].name, "Sanctuary Seal");
        assert_eq!(view.current[0].kind, SpawnKind::Chest);
        assert_eq!(view.current[0].markers.len(), 3);
        assert_eq!(
            view.current[0].image.as_deref(),
            Some("assets/sanctuary-seal.png")
        );
        assert_eq!(view.current[1].name, "Shrine of Devotion");

        assert_eq!(view.upcoming.len(), 2);
        assert_eq!(view.upcoming[0].label, NEXT_LABEL);
        assert_eq!(view.upcoming[0].starts_at, "9:20:00 PM");
        assert_eq!(view.upcoming[0].color_set, ColorSet::Green);
        assert_eq!(view.upcoming[0].cards[0].markers.len(), 4);
        assert_eq!(view.upcoming[1].label, FOLLOWING_LABEL);
        assert_eq!(view.upcoming[1].starts_at, "9:40:00 PM");
        assert_eq!(view.upcoming[1].color_set, ColorSet::Orange);
    }

    #[test]
    fn missing_markers_and_images_render_empty() {
        let forecast = forecast_at(0, 0);
        let view = build(
            &forecast,
            &MarkerTable::new(),
            &ImageTable::new(),
            &DisplayConfig::default(),
        );
        for card in &view.current {
            assert!(card.markers.is_empty());
            assert!(card.image.is_none());
        }
    }

    #[test]
    fn json_uses_field_names() {
        let forecast = forecast_at(0, 0);
        let view = build(
            &forecast,
            &MarkerTable::standard(),
            &ImageTable::standard(),
            &DisplayConfig::default(),
        );
        let json = to_json(&view).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["countdown"], "20m 0s");
        assert_eq!(value["color_set"], "Blue");
        assert_eq!(value["current"][0]["location"], "SanctuarySeal");
        assert_eq!(value["upcoming"][1]["label"], "Following Spawn");
    }
}
