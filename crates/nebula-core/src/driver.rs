//! Presentation driver: periodic re-evaluation of the spawn forecast.
//!
//! On every tick the driver samples its [`Clock`], asks the predictor for
//! the current window and the two that follow it, and publishes the
//! resulting [`Forecast`] on a `tokio::sync::watch` channel. The snapshot
//! is always replaced as a whole, so a reader never observes a mix of two
//! ticks.
//!
//! The first evaluation happens synchronously in
//! [`PresentationDriver::new`], so the channel is never empty.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use nebula_types::Forecast;
use tokio::sync::watch;
use tracing::{info, trace};

use crate::clock::Clock;
use crate::predictor::{self, SpawnPredictor, WINDOW_MINUTES};
use crate::schedule::{Scheduler, TaskHandle};

/// Compute the forecast for `now`.
///
/// The "next" state is evaluated `minutes_to_next_transition` minutes
/// after `now` and the "following" state 20 minutes after that, which
/// always lands inside the two windows after the current one.
pub fn evaluate(predictor: &SpawnPredictor, now: DateTime<Utc>) -> Forecast {
    let current = predictor.predict(now);
    let lead = i64::from(current.minutes_to_next_transition);

    let next_at = predictor::offset_minutes(now, lead);
    let following_at = predictor::offset_minutes(now, lead.saturating_add(WINDOW_MINUTES));

    Forecast {
        sampled_at: now,
        next_transition_at: predictor.next_transition(now),
        current,
        next: predictor.predict(next_at),
        following: predictor.predict(following_at),
    }
}

/// Owns the predictor, the clock, and the published forecast.
pub struct PresentationDriver {
    predictor: SpawnPredictor,
    clock: Arc<dyn Clock>,
    tx: watch::Sender<Forecast>,
}

impl PresentationDriver {
    /// Create a driver and publish the forecast for the clock's current
    /// instant immediately.
    pub fn new(predictor: SpawnPredictor, clock: Arc<dyn Clock>) -> Self {
        let initial = evaluate(&predictor, clock.now());
        info!(
            sampled_at = %initial.sampled_at,
            color_set = %initial.current.color_set,
            rotation_index = initial.current.rotation_index,
            minutes_to_next = initial.current.minutes_to_next_transition,
            "Initial spawn forecast"
        );
        let (tx, _rx) = watch::channel(initial);
        Self {
            predictor,
            clock,
            tx,
        }
    }

    /// Subscribe to published forecasts. The receiver starts with the
    /// latest snapshot already available.
    pub fn subscribe(&self) -> watch::Receiver<Forecast> {
        self.tx.subscribe()
    }

    /// A copy of the latest published forecast.
    pub fn snapshot(&self) -> Forecast {
        self.tx.borrow().clone()
    }

    /// The predictor this driver evaluates.
    pub const fn predictor(&self) -> &SpawnPredictor {
        &self.predictor
    }

    /// Sample the clock, evaluate, and publish.
    pub fn refresh(&self) {
        let forecast = evaluate(&self.predictor, self.clock.now());
        let previous = self.tx.send_replace(forecast.clone());

        if previous.next_transition_at != forecast.next_transition_at {
            let [first, second] = forecast.current.spawns;
            info!(
                color_set = %forecast.current.color_set,
                rotation_index = forecast.current.rotation_index,
                rotation_changed =
                    previous.current.rotation_index != forecast.current.rotation_index,
                first = %first.location,
                first_kind = %first.kind,
                second = %second.location,
                second_kind = %second.kind,
                "Spawn window advanced"
            );
        }

        trace!(
            sampled_at = %forecast.sampled_at,
            minutes_to_next = forecast.current.minutes_to_next_transition,
            "Forecast published"
        );
    }

    /// Refresh now, then every `period` on `scheduler`. Dropping the
    /// returned handle stops the updates.
    pub fn start(self: &Arc<Self>, scheduler: &dyn Scheduler, period: Duration) -> TaskHandle {
        self.refresh();
        let driver = Arc::clone(self);
        scheduler.every(period, Box::new(move || driver.refresh()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use chrono::{TimeDelta, TimeZone};
    use nebula_types::{ColorSet, Location};

    use super::*;
    use crate::clock::ManualClock;
    use crate::config::PredictorConfig;
    use crate::schedule::{ManualScheduler, TokioScheduler};

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 17, 2, 0, 0).unwrap()
    }

    fn predictor() -> SpawnPredictor {
        SpawnPredictor::new(&PredictorConfig::default()).unwrap()
    }

    fn minutes(n: i64) -> TimeDelta {
        TimeDelta::try_minutes(n).unwrap()
    }

    #[test]
    fn evaluate_covers_three_consecutive_windows() {
        let p = predictor();
        let now = epoch() + minutes(5) + TimeDelta::try_seconds(30).unwrap();
        let forecast = evaluate(&p, now);

        assert_eq!(forecast.sampled_at, now);
        assert_eq!(forecast.next_transition_at, epoch() + minutes(20));
        assert_eq!(forecast.current.color_set, ColorSet::Blue);
        assert_eq!(forecast.current.minutes_to_next_transition, 15);
        assert_eq!(forecast.next.color_set, ColorSet::Green);
        assert_eq!(forecast.following.color_set, ColorSet::Orange);
        assert_eq!(forecast.countdown().num_seconds(), 14 * 60 + 30);
    }

    #[test]
    fn evaluate_crosses_hour_boundary() {
        let p = predictor();
        let now = epoch() + minutes(45);
        let forecast = evaluate(&p, now);

        assert_eq!(forecast.current.color_set, ColorSet::Orange);
        assert_eq!(forecast.current.rotation_index, 1);
        assert_eq!(forecast.next.color_set, ColorSet::Blue);
        assert_eq!(forecast.next.rotation_index, 2);
        assert_eq!(forecast.following.color_set, ColorSet::Green);
        assert_eq!(forecast.following.rotation_index, 2);
        assert_eq!(forecast.next.spawns[1].location, Location::ArkeumPost);
    }

    #[test]
    fn evaluate_on_boundary_looks_a_full_window_ahead() {
        let p = predictor();
        let forecast = evaluate(&p, epoch() + minutes(20));
        assert_eq!(forecast.current.minutes_to_next_transition, 20);
        assert_eq!(forecast.current.color_set, ColorSet::Green);
        assert_eq!(forecast.next.color_set, ColorSet::Orange);
        assert_eq!(forecast.following.color_set, ColorSet::Blue);
        assert_eq!(forecast.next_transition_at, epoch() + minutes(40));
    }

    #[test]
    fn initial_snapshot_is_available_before_any_tick() {
        let clock = Arc::new(ManualClock::new(epoch() + minutes(3)));
        let driver = PresentationDriver::new(predictor(), clock);
        let rx = driver.subscribe();

        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot.sampled_at, epoch() + minutes(3));
        assert_eq!(snapshot.current.minutes_to_next_transition, 17);
        assert_eq!(driver.snapshot(), snapshot);
    }

    #[test]
    fn refresh_replaces_the_snapshot() {
        let clock = Arc::new(ManualClock::new(epoch()));
        let driver = PresentationDriver::new(predictor(), Arc::clone(&clock) as Arc<dyn Clock>);
        let mut rx = driver.subscribe();

        clock.advance(minutes(25));
        driver.refresh();

        assert!(rx.has_changed().unwrap());
        let seen = rx.borrow_and_update().clone();
        assert_eq!(seen, driver.snapshot());
        assert_eq!(seen.sampled_at, epoch() + minutes(25));
        assert_eq!(seen.current.color_set, ColorSet::Green);
        assert_eq!(seen.current.minutes_to_next_transition, 15);
    }

    #[test]
    fn start_refreshes_immediately_and_on_each_fire() {
        let clock = Arc::new(ManualClock::new(epoch()));
        let driver = Arc::new(PresentationDriver::new(
            predictor(),
            Arc::clone(&clock) as Arc<dyn Clock>,
        ));
        let scheduler = ManualScheduler::new();

        clock.advance(minutes(1));
        let handle = driver.start(&scheduler, Duration::from_secs(1));
        assert_eq!(driver.snapshot().current.minutes_to_next_transition, 19);
        assert_eq!(scheduler.periods(), vec![Duration::from_secs(1)]);

        clock.advance(minutes(20));
        assert_eq!(scheduler.fire(), 1);
        let snapshot = driver.snapshot();
        assert_eq!(snapshot.current.color_set, ColorSet::Green);
        assert_eq!(snapshot.current.minutes_to_next_transition, 19);

        // Tearing down the handle releases the timer.
        drop(handle);
        clock.advance(minutes(20));
        assert_eq!(scheduler.fire(), 0);
        assert_eq!(driver.snapshot().current.color_set, ColorSet::Green);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_loop_publishes_every_second() {
        let clock = Arc::new(ManualClock::new(epoch()));
        let driver = Arc::new(PresentationDriver::new(
            predictor(),
            Arc::clone(&clock) as Arc<dyn Clock>,
        ));
        let mut rx = driver.subscribe();
        let scheduler = TokioScheduler::current().unwrap();

        let handle = driver.start(&scheduler, Duration::from_secs(1));
        // The immediate refresh marks the channel as changed.
        assert!(rx.has_changed().unwrap());
        let _ = rx.borrow_and_update();

        clock.advance(minutes(20));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().current.color_set, ColorSet::Green);

        drop(handle);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!rx.has_changed().unwrap());
    }
}
