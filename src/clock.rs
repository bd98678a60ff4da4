//! Time source and per-frame task driver.
//!
//! Everything time-dependent goes through `Clock` so tests can run on tokio's
//! paused clock or on a fake that records the requested delays.

use futures::future::BoxFuture;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Monotonic time plus delayed wake-ups
pub trait Clock: Send + Sync {
    /// Time elapsed since the clock was created
    fn now(&self) -> Duration;

    /// Resolve after `delay`
    fn sleep(&self, delay: Duration) -> BoxFuture<'static, ()>;
}

/// `Clock` backed by `tokio::time`, so it follows a paused test runtime.
#[derive(Debug, Clone)]
pub struct TokioClock {
    origin: tokio::time::Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self { origin: tokio::time::Instant::now() }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, delay: Duration) -> BoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep(delay))
    }
}

/// A cancellable task that calls `on_frame` once per frame interval.
///
/// The loop ends when the callback returns `ControlFlow::Break`, when `stop`
/// is called, or when the `FrameLoop` is dropped.
pub struct FrameLoop {
    stop_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl FrameLoop {
    /// Spawn the loop on the current tokio runtime.
    pub fn spawn<F>(clock: Arc<dyn Clock>, interval: Duration, mut on_frame: F) -> Self
    where
        F: FnMut(Duration) -> ControlFlow<()> + Send + 'static,
    {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => break,
                    _ = clock.sleep(interval) => {
                        if on_frame(clock.now()).is_break() {
                            break;
                        }
                    }
                }
            }
        });
        Self { stop_tx: Some(stop_tx), handle: Some(handle) }
    }

    /// Signal the loop to stop after the current frame.
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map(|h| h.is_finished()).unwrap_or(true)
    }

    /// Wait for the loop to exit on its own.
    pub async fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Resolves every sleep immediately and records what was asked for.
    #[derive(Default)]
    pub struct RecordingClock {
        pub slept: Mutex<Vec<Duration>>,
        now: Mutex<Duration>,
    }

    impl Clock for RecordingClock {
        fn now(&self) -> Duration {
            *self.now.lock().unwrap()
        }

        fn sleep(&self, delay: Duration) -> BoxFuture<'static, ()> {
            self.slept.lock().unwrap().push(delay);
            *self.now.lock().unwrap() += delay;
            Box::pin(futures::future::ready(()))
        }
    }
}
