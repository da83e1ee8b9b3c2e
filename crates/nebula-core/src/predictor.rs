//! Spawn predictor: a pure mapping from an instant to the spawn state.
//!
//! Everything is derived from the minutes elapsed since the reference
//! epoch:
//!
//! - the hour bucket (`elapsed / 60 + phase_offset`) selects a rotation
//!   entry, wrapped with a Euclidean modulo;
//! - the minute of the hour selects one of three 20-minute windows and
//!   therefore the color set;
//! - the minute within the window gives the countdown, `20 - into`, so a
//!   window that has just started reports 20, never 0.
//!
//! Hour rollover and window rollover are computed independently. All
//! arithmetic is checked or Euclidean, so instants before the epoch still
//! produce in-range indices.

use chrono::{DateTime, TimeDelta, Utc};
use nebula_types::{ColorSet, RotationEntry, SpawnState};

use crate::config::PredictorConfig;

/// Length of one color-set window.
pub const WINDOW_MINUTES: i64 = 20;

/// Minutes per rotation bucket.
pub const MINUTES_PER_HOUR: i64 = 60;

/// Number of color-set windows in one hour.
pub const WINDOWS_PER_HOUR: usize = 3;

const MILLIS_PER_MINUTE: i64 = 60_000;

/// Errors raised while building a predictor.
#[derive(Debug, thiserror::Error)]
pub enum PredictorError {
    /// The calibration data cannot drive a total predictor.
    #[error("invalid predictor configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// Deterministic spawn predictor.
///
/// Built once from a [`PredictorConfig`]; [`predict`](Self::predict) is then
/// total and holds no mutable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnPredictor {
    /// Cycle phase zero.
    reference_epoch: DateTime<Utc>,

    /// Calibrated shift applied to the hour bucket.
    phase_offset: i64,

    /// Hourly rotation, never empty.
    rotation: Vec<RotationEntry>,

    /// Rotation length as `i64`, never zero.
    rotation_len: i64,

    /// Fallback for a rotation lookup miss. Always `rotation[0]`.
    anchor: RotationEntry,

    /// Color set per window of the hour.
    color_sequence: [ColorSet; WINDOWS_PER_HOUR],
}

impl SpawnPredictor {
    /// Build a predictor from calibration data.
    ///
    /// # Errors
    ///
    /// Returns [`PredictorError::InvalidConfig`] if the rotation table is
    /// empty or the color sequence does not have exactly one entry per
    /// 20-minute window.
    pub fn new(config: &PredictorConfig) -> Result<Self, PredictorError> {
        let anchor = config
            .rotation
            .first()
            .copied()
            .ok_or_else(|| PredictorError::InvalidConfig {
                reason: "rotation table must have at least one entry".to_owned(),
            })?;

        let rotation_len =
            i64::try_from(config.rotation.len()).map_err(|_err| PredictorError::InvalidConfig {
                reason: "rotation table length exceeds i64 range".to_owned(),
            })?;

        let color_sequence = <[ColorSet; WINDOWS_PER_HOUR]>::try_from(
            config.color_sequence.as_slice(),
        )
        .map_err(|_err| PredictorError::InvalidConfig {
            reason: format!(
                "color sequence must have exactly {WINDOWS_PER_HOUR} entries, got {}",
                config.color_sequence.len()
            ),
        })?;

        Ok(Self {
            reference_epoch: config.reference_epoch.with_timezone(&Utc),
            phase_offset: config.phase_offset,
            rotation: config.rotation.clone(),
            rotation_len,
            anchor,
            color_sequence,
        })
    }

    /// Compute the spawn state at `instant`.
    pub fn predict(&self, instant: DateTime<Utc>) -> SpawnState {
        let elapsed = self.elapsed_minutes(instant);

        let rotation_index = self.rotation_index(elapsed);
        let entry = self
            .rotation
            .get(rotation_index)
            .copied()
            .unwrap_or(self.anchor);

        let color_set = self.color_set(elapsed);

        let into_window = elapsed.checked_rem_euclid(WINDOW_MINUTES).unwrap_or(0);
        let remaining = WINDOW_MINUTES.saturating_sub(into_window);
        // remaining is in 1..=20 by construction.
        let minutes_to_next_transition = u32::try_from(remaining).unwrap_or(20);

        SpawnState {
            spawns: entry.activate(color_set),
            minutes_to_next_transition,
            color_set,
            rotation_index,
        }
    }

    /// Whole minutes from the reference epoch to `instant`, floored.
    pub fn elapsed_minutes(&self, instant: DateTime<Utc>) -> i64 {
        instant
            .signed_duration_since(self.reference_epoch)
            .num_milliseconds()
            .checked_div_euclid(MILLIS_PER_MINUTE)
            .unwrap_or(0)
    }

    /// Start of the 20-minute window containing `instant`.
    pub fn window_start(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        let elapsed = self.elapsed_minutes(instant);
        let into_window = elapsed.checked_rem_euclid(WINDOW_MINUTES).unwrap_or(0);
        offset_minutes(self.reference_epoch, elapsed.saturating_sub(into_window))
    }

    /// End of the 20-minute window containing `instant`, which is also the
    /// start of the next one.
    pub fn next_transition(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        offset_minutes(self.window_start(instant), WINDOW_MINUTES)
    }

    /// The reference epoch, in UTC.
    pub const fn reference_epoch(&self) -> DateTime<Utc> {
        self.reference_epoch
    }

    /// The rotation table.
    pub fn rotation(&self) -> &[RotationEntry] {
        &self.rotation
    }

    /// The calibrated phase offset.
    pub const fn phase_offset(&self) -> i64 {
        self.phase_offset
    }

    fn rotation_index(&self, elapsed: i64) -> usize {
        let hour = elapsed.checked_div_euclid(MINUTES_PER_HOUR).unwrap_or(0);
        let bucket = hour.saturating_add(self.phase_offset);
        let index = bucket.checked_rem_euclid(self.rotation_len).unwrap_or(0);
        usize::try_from(index).unwrap_or(0)
    }

    fn color_set(&self, elapsed: i64) -> ColorSet {
        let minute_of_hour = elapsed.checked_rem_euclid(MINUTES_PER_HOUR).unwrap_or(0);
        let window = minute_of_hour.checked_div(WINDOW_MINUTES).unwrap_or(0);
        let [first, second, third] = self.color_sequence;
        match window {
            0 => first,
            1 => second,
            // 2 is the only remaining case (0..60 / 20).
            _ => third,
        }
    }
}

/// `instant` shifted by `minutes`, or `instant` unchanged if the result
/// would leave chrono's representable range.
pub fn offset_minutes(instant: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    TimeDelta::try_minutes(minutes)
        .and_then(|delta| instant.checked_add_signed(delta))
        .unwrap_or(instant)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
mod tests {
    use chrono::TimeZone;
    use nebula_types::{Location, SpawnKind, SpawnSite};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    /// Number of random instants sampled by the property tests.
    const SAMPLES: usize = 2_000;

    /// Minutes in roughly five years, the sampling range for properties.
    const SAMPLE_RANGE_MINUTES: i64 = 5 * 365 * 24 * 60;

    fn predictor() -> SpawnPredictor {
        SpawnPredictor::new(&PredictorConfig::default()).unwrap()
    }

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 17, 2, 0, 0).unwrap()
    }

    fn at(minutes: i64) -> DateTime<Utc> {
        offset_minutes(epoch(), minutes)
    }

    /// Random instants at or after the epoch, with sub-minute jitter.
    fn sample_instants(seed: u64) -> Vec<DateTime<Utc>> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..SAMPLES)
            .map(|_| {
                let minutes = rng.random_range(0..SAMPLE_RANGE_MINUTES);
                let millis = rng.random_range(0..60_000_i64);
                at(minutes) + TimeDelta::try_milliseconds(millis).unwrap()
            })
            .collect()
    }

    fn next_color(color: ColorSet) -> ColorSet {
        match color {
            ColorSet::Blue => ColorSet::Green,
            ColorSet::Green => ColorSet::Orange,
            ColorSet::Orange => ColorSet::Blue,
        }
    }

    // --- Reference scenario ---

    #[test]
    fn epoch_starts_first_window() {
        let p = predictor();
        let state = p.predict(at(0));

        // Phase offset 1 selects entry 1 at the epoch.
        assert_eq!(state.rotation_index, 1);
        assert_eq!(
            state.spawns.map(|s| (s.location, s.kind)),
            [
                (Location::SanctuarySeal, SpawnKind::Chest),
                (Location::ShrineOfDevotion, SpawnKind::Ore),
            ]
        );
        assert_eq!(state.color_set, ColorSet::Blue);
        assert_eq!(state.minutes_to_next_transition, 20);
        assert!(state.spawns.iter().all(|s| s.color_set == ColorSet::Blue));
    }

    #[test]
    fn last_minute_of_first_window() {
        let p = predictor();
        let state = p.predict(at(19));
        assert_eq!(state.rotation_index, 1);
        assert_eq!(state.color_set, ColorSet::Blue);
        assert_eq!(state.minutes_to_next_transition, 1);
    }

    #[test]
    fn second_window_advances_color() {
        let p = predictor();
        let state = p.predict(at(20));
        assert_eq!(state.rotation_index, 1);
        assert_eq!(state.color_set, ColorSet::Green);
        assert_eq!(state.minutes_to_next_transition, 20);
    }

    #[test]
    fn next_hour_advances_rotation_and_resets_color() {
        let p = predictor();
        let state = p.predict(at(60));
        assert_eq!(state.rotation_index, 2);
        assert_eq!(state.color_set, ColorSet::Blue);
        assert_eq!(
            state.spawns.map(|s| (s.location, s.kind)),
            [
                (Location::OrcVillage, SpawnKind::Ore),
                (Location::ArkeumPost, SpawnKind::Chest),
            ]
        );
    }

    #[test]
    fn rotation_wraps_after_table_length() {
        let p = predictor();
        assert_eq!(p.predict(at(2 * 60)).rotation_index, 3);
        assert_eq!(p.predict(at(3 * 60)).rotation_index, 0);
        assert_eq!(p.predict(at(4 * 60)).rotation_index, 1);
    }

    #[test]
    fn seconds_within_a_minute_do_not_matter() {
        let p = predictor();
        let early = at(7);
        let late = early + TimeDelta::try_milliseconds(59_999).unwrap();
        assert_eq!(p.predict(early), p.predict(late));
        assert_eq!(p.predict(late).minutes_to_next_transition, 13);
    }

    // --- Edge cases ---

    #[test]
    fn instant_before_epoch_wraps_non_negatively() {
        let p = predictor();
        let state = p.predict(at(-1));
        // Hour bucket -1 + offset 1 = 0; minute 59 of that hour.
        assert_eq!(state.rotation_index, 0);
        assert_eq!(state.color_set, ColorSet::Orange);
        assert_eq!(state.minutes_to_next_transition, 1);
    }

    #[test]
    fn large_negative_phase_offset_still_indexes() {
        let config = PredictorConfig {
            phase_offset: -1_000_003,
            ..PredictorConfig::default()
        };
        let p = SpawnPredictor::new(&config).unwrap();
        let state = p.predict(at(0));
        assert!(state.rotation_index < 4);
        // -1_000_003 rem_euclid 4 == 1
        assert_eq!(state.rotation_index, 1);
    }

    #[test]
    fn single_entry_rotation_never_changes() {
        let entry = RotationEntry::new(
            SpawnSite::new(Location::ArkeumPost, SpawnKind::Chest),
            SpawnSite::new(Location::OrcVillage, SpawnKind::Ore),
        );
        let config = PredictorConfig {
            rotation: vec![entry],
            ..PredictorConfig::default()
        };
        let p = SpawnPredictor::new(&config).unwrap();
        for hour in 0..10 {
            let state = p.predict(at(hour * 60 + 30));
            assert_eq!(state.rotation_index, 0);
            assert_eq!(state.spawns, entry.activate(ColorSet::Green));
        }
    }

    #[test]
    fn empty_rotation_is_rejected() {
        let config = PredictorConfig {
            rotation: Vec::new(),
            ..PredictorConfig::default()
        };
        assert!(SpawnPredictor::new(&config).is_err());
    }

    #[test]
    fn wrong_color_count_is_rejected() {
        let config = PredictorConfig {
            color_sequence: vec![ColorSet::Blue, ColorSet::Green],
            ..PredictorConfig::default()
        };
        assert!(SpawnPredictor::new(&config).is_err());
    }

    #[test]
    fn window_bounds() {
        let p = predictor();
        let inside = at(47) + TimeDelta::try_seconds(12).unwrap();
        assert_eq!(p.window_start(inside), at(40));
        assert_eq!(p.next_transition(inside), at(60));
        // Exactly on a boundary, the window starts there.
        assert_eq!(p.window_start(at(40)), at(40));
        assert_eq!(p.next_transition(at(40)), at(60));
    }

    // --- Properties over random instants ---

    #[test]
    fn predict_is_deterministic() {
        let p = predictor();
        let other = predictor();
        for t in sample_instants(1) {
            assert_eq!(p.predict(t), p.predict(t));
            assert_eq!(p.predict(t), other.predict(t));
        }
    }

    #[test]
    fn color_advances_one_step_per_window() {
        let p = predictor();
        for t in sample_instants(2) {
            let now = p.predict(t);
            let later = p.predict(t + TimeDelta::try_minutes(WINDOW_MINUTES).unwrap());
            assert_eq!(later.color_set, next_color(now.color_set), "at {t}");
            let hour_later = p.predict(t + TimeDelta::try_minutes(MINUTES_PER_HOUR).unwrap());
            assert_eq!(hour_later.color_set, now.color_set, "at {t}");
        }
    }

    #[test]
    fn rotation_advances_one_step_per_hour() {
        let p = predictor();
        let len = p.rotation().len();
        for t in sample_instants(3) {
            let now = p.predict(t);
            let later = p.predict(t + TimeDelta::try_minutes(MINUTES_PER_HOUR).unwrap());
            assert_eq!(later.rotation_index, (now.rotation_index + 1) % len, "at {t}");
            let expected = p.rotation()[later.rotation_index].activate(later.color_set);
            assert_eq!(later.spawns, expected);
        }
    }

    #[test]
    fn rotation_is_stable_within_an_hour() {
        let p = predictor();
        for t in sample_instants(4) {
            let hour_start = at(p.elapsed_minutes(t).div_euclid(60) * 60);
            let index = p.predict(hour_start).rotation_index;
            for minute in [1, 19, 20, 39, 40, 59] {
                assert_eq!(
                    p.predict(offset_minutes(hour_start, minute)).rotation_index,
                    index
                );
            }
        }
    }

    #[test]
    fn countdown_is_bounded() {
        let p = predictor();
        for t in sample_instants(5) {
            let minutes = p.predict(t).minutes_to_next_transition;
            assert!((1..=20).contains(&minutes), "{minutes} at {t}");
        }
    }

    #[test]
    fn aligned_instants_report_full_window() {
        let p = predictor();
        let mut rng = StdRng::seed_from_u64(6);
        for _ in 0..SAMPLES {
            let window = rng.random_range(-1_000..100_000_i64);
            let state = p.predict(at(window * WINDOW_MINUTES));
            assert_eq!(state.minutes_to_next_transition, 20);
        }
    }

    #[test]
    fn countdown_reaches_transition_exactly() {
        let p = predictor();
        for t in sample_instants(7) {
            let state = p.predict(t);
            let boundary = p.next_transition(t);
            assert_eq!(
                boundary,
                p.window_start(t) + TimeDelta::try_minutes(20).unwrap()
            );
            // One minute before the boundary is the last minute of the window.
            let last = p.predict(boundary - TimeDelta::try_minutes(1).unwrap());
            assert_eq!(last.minutes_to_next_transition, 1);
            assert_eq!(last.color_set, state.color_set);
            assert_eq!(p.predict(boundary).minutes_to_next_transition, 20);
        }
    }
}
