//! Trailing-edge debounce for resize bursts.

use crate::clock::Clock;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Runs only the last of a burst of calls, `delay` after it arrived.
pub struct ResizeDebouncer {
    clock: Arc<dyn Clock>,
    delay: Duration,
    generation: Arc<AtomicU64>,
}

impl ResizeDebouncer {
    pub fn new(clock: Arc<dyn Clock>, delay: Duration) -> Self {
        Self { clock, delay, generation: Arc::new(AtomicU64::new(0)) }
    }

    /// Schedule `action`, superseding anything still pending.
    ///
    /// The handle resolves to whether this call's action actually ran.
    pub fn call<F, Fut>(&self, action: F) -> JoinHandle<bool>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = self.generation.clone();
        let sleep = self.clock.sleep(self.delay);
        tokio::spawn(async move {
            sleep.await;
            if generation.load(Ordering::SeqCst) != ticket {
                return false;
            }
            action().await;
            true
        })
    }

    /// Drop whatever is pending.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}
