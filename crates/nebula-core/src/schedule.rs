//! Cancellable repeating tasks.
//!
//! The presentation driver does not own a timer directly; it asks a
//! [`Scheduler`] to run a task every period and holds the returned
//! [`TaskHandle`]. Dropping the handle cancels the task, so a driver that
//! goes away can never leave a recurring callback behind.
//!
//! - [`TokioScheduler`] runs tasks on a `tokio::time::interval`.
//! - [`ManualScheduler`] runs tasks only when [`fire`](ManualScheduler::fire)
//!   is called, for tests that need no real timer at all.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::config::MIN_TICK_INTERVAL_MS;

/// A task run once per period.
pub type RepeatingTask = Box<dyn FnMut() + Send + 'static>;

/// Errors raised when creating a scheduler.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// No tokio runtime is available on the calling thread.
    #[error("no tokio runtime available: {message}")]
    NoRuntime {
        /// Description of the runtime lookup failure.
        message: String,
    },
}

/// Something that can run a task repeatedly.
pub trait Scheduler {
    /// Run `task` once every `period` until the returned handle is
    /// cancelled or dropped. The first run happens one period from now.
    fn every(&self, period: Duration, task: RepeatingTask) -> TaskHandle;
}

/// Owner of a scheduled task. Cancels the task on drop.
#[derive(Debug)]
pub struct TaskHandle {
    cancelled: Arc<AtomicBool>,
    abort: Option<AbortHandle>,
}

impl TaskHandle {
    fn new(cancelled: Arc<AtomicBool>, abort: Option<AbortHandle>) -> Self {
        Self { cancelled, abort }
    }

    /// Stop the task. Idempotent.
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            if let Some(ref abort) = self.abort {
                abort.abort();
            }
            debug!("Repeating task cancelled");
        }
    }

    /// Whether [`cancel`](Self::cancel) has run.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ---------------------------------------------------------------------------
// Tokio
// ---------------------------------------------------------------------------

/// Scheduler backed by the tokio timer.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    /// Create a scheduler that spawns onto `handle`.
    pub const fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Create a scheduler for the runtime the caller is running in.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::NoRuntime`] outside a tokio runtime.
    pub fn current() -> Result<Self, ScheduleError> {
        let handle = Handle::try_current().map_err(|e| ScheduleError::NoRuntime {
            message: format!("{e}"),
        })?;
        Ok(Self::new(handle))
    }
}

impl Scheduler for TokioScheduler {
    fn every(&self, period: Duration, mut task: RepeatingTask) -> TaskHandle {
        let min = Duration::from_millis(MIN_TICK_INTERVAL_MS);
        let period = if period < min {
            warn!(
                requested = ?period,
                min_ms = MIN_TICK_INTERVAL_MS,
                "Repeating task period too short, clamping"
            );
            min
        } else {
            period
        };

        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);

        let join = self.handle.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                if flag.load(Ordering::Acquire) {
                    break;
                }
                task();
            }
        });

        debug!(period = ?period, "Repeating task scheduled");
        TaskHandle::new(cancelled, Some(join.abort_handle()))
    }
}

// ---------------------------------------------------------------------------
// Manual
// ---------------------------------------------------------------------------

struct ScheduledTask {
    period: Duration,
    cancelled: Arc<AtomicBool>,
    task: RepeatingTask,
}

/// Scheduler that only runs tasks when told to.
#[derive(Default)]
pub struct ManualScheduler {
    tasks: Mutex<Vec<ScheduledTask>>,
}

impl ManualScheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every live task once, dropping cancelled ones. Returns how many
    /// tasks ran.
    ///
    /// Tasks run without the lock held, so a task may schedule further
    /// tasks on this scheduler. Those first run on the next `fire`.
    pub fn fire(&self) -> usize {
        let mut tasks = match self.tasks.lock() {
            Ok(mut tasks) => std::mem::take(&mut *tasks),
            Err(_) => return 0,
        };
        tasks.retain(|t| !t.cancelled.load(Ordering::Acquire));
        for scheduled in &mut tasks {
            (scheduled.task)();
        }
        let ran = tasks.len();

        if let Ok(mut current) = self.tasks.lock() {
            let added = std::mem::replace(&mut *current, tasks);
            current.extend(added);
        }
        ran
    }

    /// Number of tasks not yet cancelled.
    pub fn live_tasks(&self) -> usize {
        self.tasks.lock().map_or(0, |tasks| {
            tasks
                .iter()
                .filter(|t| !t.cancelled.load(Ordering::Acquire))
                .count()
        })
    }

    /// Periods of the live tasks, in scheduling order.
    pub fn periods(&self) -> Vec<Duration> {
        self.tasks.lock().map_or_else(
            |_err| Vec::new(),
            |tasks| {
                tasks
                    .iter()
                    .filter(|t| !t.cancelled.load(Ordering::Acquire))
                    .map(|t| t.period)
                    .collect()
            },
        )
    }
}

impl Scheduler for ManualScheduler {
    fn every(&self, period: Duration, task: RepeatingTask) -> TaskHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.push(ScheduledTask {
                period,
                cancelled: Arc::clone(&cancelled),
                task,
            });
        }
        TaskHandle::new(cancelled, None)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    fn counter() -> (Arc<AtomicUsize>, RepeatingTask) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        let task: RepeatingTask = Box::new(move || {
            inner.fetch_add(1, Ordering::AcqRel);
        });
        (count, task)
    }

    #[test]
    fn manual_scheduler_runs_on_fire() {
        let scheduler = ManualScheduler::new();
        let (count, task) = counter();
        let _handle = scheduler.every(Duration::from_secs(1), task);

        assert_eq!(count.load(Ordering::Acquire), 0);
        assert_eq!(scheduler.fire(), 1);
        assert_eq!(scheduler.fire(), 1);
        assert_eq!(count.load(Ordering::Acquire), 2);
        assert_eq!(scheduler.periods(), vec![Duration::from_secs(1)]);
    }

    #[test]
    fn manual_task_can_schedule_another() {
        let scheduler = Arc::new(ManualScheduler::new());
        let (count, inner_task) = counter();
        let spawned = Arc::new(Mutex::new(Vec::new()));

        let mut pending = Some((Arc::clone(&scheduler), inner_task));
        let sink = Arc::clone(&spawned);
        let outer: RepeatingTask = Box::new(move || {
            if let Some((scheduler, task)) = pending.take() {
                let handle = scheduler.every(Duration::from_millis(500), task);
                sink.lock().unwrap().push(handle);
            }
        });
        let _outer_handle = scheduler.every(Duration::from_secs(1), outer);

        assert_eq!(scheduler.fire(), 1);
        assert_eq!(scheduler.live_tasks(), 2);
        assert_eq!(count.load(Ordering::Acquire), 0);
        assert_eq!(
            scheduler.periods(),
            vec![Duration::from_secs(1), Duration::from_millis(500)]
        );

        assert_eq!(scheduler.fire(), 2);
        assert_eq!(count.load(Ordering::Acquire), 1);

        spawned.lock().unwrap().clear();
        assert_eq!(scheduler.fire(), 1);
        assert_eq!(count.load(Ordering::Acquire), 1);
    }

    #[test]
    fn dropping_handle_cancels_manual_task() {
        let scheduler = ManualScheduler::new();
        let (count, task) = counter();
        let handle = scheduler.every(Duration::from_secs(1), task);
        assert_eq!(scheduler.live_tasks(), 1);

        drop(handle);
        assert_eq!(scheduler.live_tasks(), 0);
        assert_eq!(scheduler.fire(), 0);
        assert_eq!(count.load(Ordering::Acquire), 0);
    }

    #[test]
    fn cancel_is_idempotent() {
        let scheduler = ManualScheduler::new();
        let (_count, task) = counter();
        let handle = scheduler.every(Duration::from_secs(1), task);
        handle.cancel();
        handle.cancel();
        assert!(handle.is_cancelled());
    }

    #[test]
    fn tokio_scheduler_needs_a_runtime() {
        assert!(TokioScheduler::current().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_scheduler_ticks_each_period() {
        let scheduler = TokioScheduler::current().unwrap();
        let (count, task) = counter();
        let handle = scheduler.every(Duration::from_secs(1), task);

        // Nothing runs before the first full period.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::Acquire), 0);

        tokio::time::sleep(Duration::from_millis(3_000)).await;
        assert_eq!(count.load(Ordering::Acquire), 3);

        drop(handle);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::Acquire), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_scheduler_clamps_short_periods() {
        let scheduler = TokioScheduler::current().unwrap();
        let (count, task) = counter();
        let _handle = scheduler.every(Duration::ZERO, task);

        tokio::time::sleep(Duration::from_millis(250)).await;
        // Clamped to 100 ms: runs at 100 and 200.
        assert_eq!(count.load(Ordering::Acquire), 2);
    }
}
