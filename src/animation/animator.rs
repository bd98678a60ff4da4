use crate::animation::tween::Tween;
use crate::clock::{Clock, FrameLoop};
use crate::dom::{Style, TransformOrigin};
use crate::platform::ChartContainer;
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Drives at most one tween at a time.
///
/// Playing a new tween stops the previous one, so repeated calls never stack
/// animation state on the same elements.
pub struct Animator {
    clock: Arc<dyn Clock>,
    frame_interval: Duration,
    active: Mutex<Option<FrameLoop>>,
}

impl Animator {
    pub fn new(clock: Arc<dyn Clock>, frame_interval: Duration) -> Self {
        Self { clock, frame_interval, active: Mutex::new(None) }
    }

    /// Start `tween` on `container`, replacing any running tween.
    pub fn play(&self, container: ChartContainer, tween: Tween) {
        // The old loop must be stopped before the new one can tick.
        drop(self.lock().take());
        let epoch = container.epoch();
        let frames = FrameLoop::spawn(self.clock.clone(), self.frame_interval, move |now| {
            if container.epoch() != epoch {
                return ControlFlow::Break(());
            }
            let applied = container.with_document_mut(|doc| {
                for (i, id) in tween.targets.iter().enumerate() {
                    let style = doc.style(*id);
                    doc.set_style(
                        *id,
                        Style { scale_y: tween.value_at(i, now), origin: Some(TransformOrigin::BOTTOM_CENTER), ..style },
                    );
                }
            });
            if applied.is_none() || tween.is_complete(now) {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        *self.lock() = Some(frames);
    }

    /// Stop the running tween where it is.
    pub fn cancel(&self) {
        self.lock().take();
    }

    pub fn is_running(&self) -> bool {
        self.lock().as_ref().is_some_and(|f| !f.is_finished())
    }

    /// Wait until no tween is running.
    pub async fn settle(&self) {
        while self.is_running() {
            self.clock.sleep(self.frame_interval).await;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<FrameLoop>> {
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }
}
