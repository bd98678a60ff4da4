//! Smooth scrolling.
//!
//! `SmoothScroll` turns raw wheel input into an eased scroll position that
//! advances once per frame. `SmoothScrollCoordinator` owns at most one driver
//! at a time plus the frame loop feeding it; every emitted position goes to a
//! single callback (the pipeline uses it to move the page and the scroll pin).

use crate::clock::{Clock, FrameLoop};
use crate::config::SmoothScrollOptions;
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Eased scroll state for one page
#[derive(Debug, Clone)]
pub struct SmoothScroll {
    opts: SmoothScrollOptions,
    current: f64,
    target: f64,
    from: f64,
    limit: f64,
    started_at: Duration,
    animating: bool,
}

impl SmoothScroll {
    pub fn new(opts: SmoothScrollOptions, position: f64, limit: f64) -> Self {
        let limit = limit.max(0.0);
        let position = position.clamp(0.0, limit);
        Self {
            opts,
            current: position,
            target: position,
            from: position,
            limit,
            started_at: Duration::ZERO,
            animating: false,
        }
    }

    /// Displayed scroll offset
    pub fn scroll(&self) -> f64 {
        self.current
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn limit(&self) -> f64 {
        self.limit
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    /// Ease toward `target` starting at `now`.
    pub fn scroll_to(&mut self, target: f64, now: Duration) {
        self.target = target.clamp(0.0, self.limit);
        self.from = self.current;
        self.started_at = now;
        self.animating = self.target != self.current;
    }

    pub fn on_wheel(&mut self, delta: f64, now: Duration) {
        self.scroll_to(self.target + delta * self.opts.wheel_multiplier, now);
    }

    /// Touch input scrolls immediately unless touch smoothing is on.
    /// Returns the new position when it changed without easing.
    pub fn on_touch(&mut self, delta: f64, now: Duration) -> Option<f64> {
        if self.opts.smooth_touch {
            self.on_wheel(delta, now);
            return None;
        }
        let next = (self.current + delta).clamp(0.0, self.limit);
        self.current = next;
        self.target = next;
        self.animating = false;
        Some(next)
    }

    /// Advance one frame. Returns the new position while easing.
    pub fn raf(&mut self, now: Duration) -> Option<f64> {
        if !self.animating {
            return None;
        }
        let elapsed = now.saturating_sub(self.started_at).as_secs_f64();
        let t = if self.opts.duration_secs > 0.0 { elapsed / self.opts.duration_secs } else { 1.0 };
        if t >= 1.0 {
            self.current = self.target;
            self.animating = false;
        } else {
            self.current = self.from + (self.target - self.from) * self.opts.ease.apply(t);
        }
        Some(self.current)
    }

    /// Apply a new scrollable range, clamping the position into it.
    pub fn resize(&mut self, limit: f64) {
        self.limit = limit.max(0.0);
        self.target = self.target.clamp(0.0, self.limit);
        self.current = self.current.clamp(0.0, self.limit);
        if self.current == self.target {
            self.animating = false;
        }
    }
}

/// Receives every scroll position the driver emits
pub type ScrollCallback = Arc<dyn Fn(f64) + Send + Sync>;

struct ActiveDriver {
    driver: Arc<Mutex<SmoothScroll>>,
    on_scroll: ScrollCallback,
    _frames: FrameLoop,
}

/// Keeps at most one `SmoothScroll` alive with its frame loop.
pub struct SmoothScrollCoordinator {
    clock: Arc<dyn Clock>,
    frame_interval: Duration,
    opts: SmoothScrollOptions,
    slot: Mutex<Option<ActiveDriver>>,
}

impl SmoothScrollCoordinator {
    pub fn new(clock: Arc<dyn Clock>, frame_interval: Duration, opts: SmoothScrollOptions) -> Self {
        Self { clock, frame_interval, opts, slot: Mutex::new(None) }
    }

    fn lock(&self) -> MutexGuard<'_, Option<ActiveDriver>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start a driver at `position`, destroying any previous one first.
    pub fn enable(&self, position: f64, limit: f64, on_scroll: ScrollCallback) {
        if self.disable() {
            log::debug!("replacing smooth-scroll driver");
        }
        let driver = Arc::new(Mutex::new(SmoothScroll::new(self.opts.clone(), position, limit)));
        let ticking = driver.clone();
        let emit = on_scroll.clone();
        let frames = FrameLoop::spawn(self.clock.clone(), self.frame_interval, move |now| {
            let moved = ticking.lock().unwrap_or_else(|e| e.into_inner()).raf(now);
            if let Some(y) = moved {
                emit(y);
            }
            ControlFlow::Continue(())
        });
        *self.lock() = Some(ActiveDriver { driver, on_scroll, _frames: frames });
    }

    /// Destroy the driver and stop its frame loop. Returns whether one existed.
    pub fn disable(&self) -> bool {
        self.lock().take().is_some()
    }

    pub fn is_active(&self) -> bool {
        self.lock().is_some()
    }

    fn driver(&self) -> Option<(Arc<Mutex<SmoothScroll>>, ScrollCallback)> {
        self.lock().as_ref().map(|a| (a.driver.clone(), a.on_scroll.clone()))
    }

    /// Feed wheel input. Returns false when no driver is active.
    pub fn wheel(&self, delta: f64) -> bool {
        let Some((driver, _)) = self.driver() else {
            return false;
        };
        driver.lock().unwrap_or_else(|e| e.into_inner()).on_wheel(delta, self.clock.now());
        true
    }

    pub fn touch(&self, delta: f64) -> bool {
        let Some((driver, on_scroll)) = self.driver() else {
            return false;
        };
        let moved = driver.lock().unwrap_or_else(|e| e.into_inner()).on_touch(delta, self.clock.now());
        if let Some(y) = moved {
            on_scroll(y);
        }
        true
    }

    pub fn resize(&self, limit: f64) {
        if let Some((driver, _)) = self.driver() {
            driver.lock().unwrap_or_else(|e| e.into_inner()).resize(limit);
        }
    }

    pub fn scroll(&self) -> Option<f64> {
        self.driver().map(|(d, _)| d.lock().unwrap_or_else(|e| e.into_inner()).scroll())
    }
}
