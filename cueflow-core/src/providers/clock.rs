//! Clock provider for delay suspension.
//!
//! `delay`/`wait` steps suspend through this trait so a host can run on the
//! real tokio timer while tests and dry runs skip the wait entirely.

use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Future returned by [`ClockProvider::sleep`].
pub type SleepFuture<'a> = BoxFuture<'a, ()>;

/// Provider trait for time operations.
pub trait ClockProvider: Send + Sync {
    /// Monotonic nanoseconds since the clock was created.
    fn now(&self) -> u64;

    /// Current system time as milliseconds since UNIX epoch.
    fn system_time_millis(&self) -> u64;

    /// Suspend for the specified duration.
    fn sleep(&self, duration: Duration) -> SleepFuture<'_>;
}

/// Real clock backed by the tokio timer.
#[derive(Debug, Clone)]
pub struct RealClock {
    start: Instant,
}

impl RealClock {
    /// Create a new real clock.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for RealClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockProvider for RealClock {
    fn now(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }

    fn system_time_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    fn sleep(&self, duration: Duration) -> SleepFuture<'_> {
        Box::pin(async move {
            tokio::time::sleep(duration).await;
        })
    }
}

/// Clock whose sleeps complete immediately.
///
/// Each requested duration is recorded and added to a virtual elapsed time,
/// so tests can assert on how long a walk would have waited.
#[derive(Debug, Default)]
pub struct ImmediateClock {
    elapsed_nanos: Mutex<u64>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ImmediateClock {
    /// Create a clock at virtual time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Durations requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().clone()
    }

    /// Sum of all requested sleeps.
    pub fn total_slept(&self) -> Duration {
        self.sleeps.lock().iter().sum()
    }
}

impl ClockProvider for ImmediateClock {
    fn now(&self) -> u64 {
        *self.elapsed_nanos.lock()
    }

    fn system_time_millis(&self) -> u64 {
        *self.elapsed_nanos.lock() / 1_000_000
    }

    fn sleep(&self, duration: Duration) -> SleepFuture<'_> {
        self.sleeps.lock().push(duration);
        *self.elapsed_nanos.lock() += duration.as_nanos() as u64;
        Box::pin(std::future::ready(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn real_clock_sleeps_on_tokio_timer() {
        let clock = RealClock::new();
        let before = tokio::time::Instant::now();
        clock.sleep(Duration::from_millis(250)).await;
        assert!(before.elapsed() >= Duration::from_millis(250));
    }

    #[tokio::test]
    async fn immediate_clock_records_sleeps() {
        let clock = ImmediateClock::new();
        clock.sleep(Duration::from_millis(100)).await;
        clock.sleep(Duration::from_millis(50)).await;

        assert_eq!(clock.sleeps().len(), 2);
        assert_eq!(clock.total_slept(), Duration::from_millis(150));
        assert_eq!(clock.system_time_millis(), 150);
    }
}
