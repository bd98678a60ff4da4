//! Polling for renderer output.
//!
//! The renderer mounts its nodes at some unobservable point after `render`
//! returns. `wait_for` probes the document on a fixed retry schedule and gives
//! up quietly when the budget is spent.

use crate::clock::Clock;
use std::time::Duration;

/// Delay before each probe. The first entry is usually zero (probe immediately).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrySchedule {
    delays: Vec<Duration>,
}

impl RetrySchedule {
    pub fn from_millis(delays: &[u64]) -> Self {
        Self { delays: delays.iter().map(|ms| Duration::from_millis(*ms)).collect() }
    }

    pub fn attempts(&self) -> usize {
        self.delays.len()
    }
}

/// Run `probe` on `schedule` until it yields a value.
///
/// Returns `None` once every attempt has come back empty.
pub async fn wait_for<T, F>(clock: &dyn Clock, schedule: &RetrySchedule, mut probe: F) -> Option<T>
where
    F: FnMut() -> Option<T>,
{
    for (attempt, delay) in schedule.delays.iter().enumerate() {
        if !delay.is_zero() {
            clock.sleep(*delay).await;
        }
        if let Some(found) = probe() {
            log::debug!("readiness probe succeeded on attempt {}", attempt + 1);
            return Some(found);
        }
    }
    log::debug!("readiness probe gave up after {} attempts", schedule.attempts());
    None
}
