//! Integration tests for the predictor -> driver -> view -> output path.
//!
//! Time is driven by a `ManualClock` and ticks by a `ManualScheduler`, so
//! every frame is deterministic and no real timer is involved.

#![allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use nebula_core::clock::{Clock, ManualClock};
use nebula_core::config::{DisplayConfig, TrackerConfig};
use nebula_core::driver::PresentationDriver;
use nebula_core::predictor::SpawnPredictor;
use nebula_core::schedule::ManualScheduler;
use nebula_render::images::ImageTable;
use nebula_render::markers::MarkerTable;
use nebula_render::text;
use nebula_render::view::{self, ForecastView};
use nebula_types::{ColorSet, Location, SpawnKind};
use serde_json::Value;

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 17, 2, 0, 0).unwrap()
}

fn seconds(n: i64) -> TimeDelta {
    TimeDelta::try_seconds(n).unwrap()
}

struct Harness {
    clock: Arc<ManualClock>,
    driver: Arc<PresentationDriver>,
    scheduler: ManualScheduler,
    display: DisplayConfig,
}

impl Harness {
    fn new(config: &TrackerConfig, start: DateTime<Utc>) -> Self {
        let predictor = SpawnPredictor::new(&config.predictor).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let driver = Arc::new(PresentationDriver::new(
            predictor,
            Arc::clone(&clock) as Arc<dyn Clock>,
        ));
        Self {
            clock,
            driver,
            scheduler: ManualScheduler::new(),
            display: config.display.clone(),
        }
    }

    fn frame(&self) -> ForecastView {
        view::build(
            &self.driver.snapshot(),
            &MarkerTable::standard(),
            &ImageTable::standard().with_overrides(&self.display.images),
            &self.display,
        )
    }
}

#[test]
fn first_frame_is_ready_before_ticking() {
    let config = TrackerConfig::default();
    let harness = Harness::new(&config, epoch() + seconds(5 * 60 + 30));

    let frame = harness.frame();
    assert_eq!(frame.server_time, "9:05:30 PM");
    assert_eq!(frame.countdown, "14m 30s");
    assert_eq!(frame.current[0].location, Location::SanctuarySeal);
    assert_eq!(frame.current[0].kind, SpawnKind::Chest);
    assert_eq!(frame.current[1].location, Location::ShrineOfDevotion);
    assert_eq!(frame.current[1].kind, SpawnKind::Ore);

    let rendered = text::render(&frame);
    assert!(rendered.contains("Sanctuary Seal: Chest"));
    assert!(rendered.contains("Shrine of Devotion: Ore"));
    assert!(rendered.contains("Next Spawn at 9:20:00 PM EST (green)"));
    assert!(rendered.contains("Following Spawn at 9:40:00 PM EST (orange)"));
}

#[test]
fn ticking_across_the_hour_rotates_locations() {
    let config = TrackerConfig::default();
    let harness = Harness::new(&config, epoch() + seconds(59 * 60));
    let handle = harness
        .driver
        .start(&harness.scheduler, Duration::from_secs(1));

    let before = harness.frame();
    assert_eq!(before.color_set, ColorSet::Orange);
    assert_eq!(before.countdown, "1m 0s");
    assert_eq!(before.upcoming[0].starts_at, "10:00:00 PM");
    assert_eq!(before.upcoming[0].cards[0].location, Location::OrcVillage);

    harness.clock.advance(seconds(60));
    assert_eq!(harness.scheduler.fire(), 1);

    let after = harness.frame();
    assert_eq!(after.server_time, "10:00:00 PM");
    assert_eq!(after.color_set, ColorSet::Blue);
    assert_eq!(after.countdown, "20m 0s");
    assert_eq!(after.current[0].location, Location::OrcVillage);
    assert_eq!(after.current[0].kind, SpawnKind::Ore);
    assert_eq!(after.current[1].location, Location::ArkeumPost);
    assert_eq!(after.current[1].kind, SpawnKind::Chest);
    assert_eq!(after.current, before.upcoming[0].cards);

    drop(handle);
    assert_eq!(harness.scheduler.live_tasks(), 0);
}

#[test]
fn configured_display_and_recalibration_flow_through() {
    let yaml = r"
predictor:
  phase_offset: 0
display:
  timezone: UTC
  format: json
  images:
    OrcVillage: https://cdn.example/orc.png
";
    let config = TrackerConfig::parse_with(yaml, |_| None).unwrap();
    let harness = Harness::new(&config, epoch());

    let frame = harness.frame();
    assert_eq!(frame.server_time, "2:00:00 AM");
    assert_eq!(frame.timezone_label, "UTC");
    // Rotation entry 0: Sanctuary Seal ore, Orc Village chest.
    assert_eq!(frame.current[0].location, Location::SanctuarySeal);
    assert_eq!(frame.current[0].kind, SpawnKind::Ore);
    assert_eq!(
        frame.current[1].image.as_deref(),
        Some("https://cdn.example/orc.png")
    );

    let json: Value = serde_json::from_str(&view::to_json(&frame).unwrap()).unwrap();
    assert_eq!(json["timezone_label"], "UTC");
    assert_eq!(json["current"][1]["location"], "OrcVillage");
    assert_eq!(json["current"][1]["markers"].as_array().unwrap().len(), 2);
    assert_eq!(json["upcoming"][0]["color_set"], "Green");
}

#[test]
fn stopped_driver_keeps_last_frame() {
    let config = TrackerConfig::default();
    let harness = Harness::new(&config, epoch());
    let handle = harness
        .driver
        .start(&harness.scheduler, Duration::from_secs(1));
    handle.cancel();

    harness.clock.advance(seconds(30 * 60));
    assert_eq!(harness.scheduler.fire(), 0);

    let frame = harness.frame();
    assert_eq!(frame.server_time, "9:00:00 PM");
    assert_eq!(frame.color_set, ColorSet::Blue);
}

#[test]
fn summer_frames_show_daylight_time() {
    let config = TrackerConfig::default();
    let harness = Harness::new(&config, Utc.with_ymd_and_hms(2025, 7, 1, 14, 5, 0).unwrap());

    let frame = harness.frame();
    assert_eq!(frame.server_time, "10:05:00 AM");
    assert_eq!(frame.timezone_label, "EDT");

    let rendered = text::render(&frame);
    assert!(rendered.contains("Server Time: 10:05:00 AM EDT"));
    assert!(rendered.contains("Next Spawn at 10:20:00 AM EDT"));
    assert!(rendered.contains("Following Spawn at 10:40:00 AM EDT"));
}
