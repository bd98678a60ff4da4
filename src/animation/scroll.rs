//! Scroll-linked bar animation.
//!
//! While the chart is pinned, scroll position maps to a progress value in
//! [0, 1] and every bar's height follows a staggered slice of that progress.

use crate::animation::legend::normalize_legends;
use crate::clock::{Clock, FrameLoop};
use crate::dom::{NodeId, Style, SvgDocument, TransformOrigin};
use crate::platform::accessibility::{label_contains, within_legend, ARIA_ROLEDESCRIPTION, GRAPHICS_SYMBOL, LEGEND, ROLE};
use crate::platform::{ChartContainer, DeviceClass, DeviceMetrics};
use crate::readiness::{wait_for, RetrySchedule};
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Substring of a bar's accessible label that identifies data marks
pub const POPULATION_MARKER: &str = "pop:";
/// Progress offset between consecutive bars
pub const STAGGER_STEP: f64 = 0.05;

/// Data bars eligible for scroll animation, in document order.
///
/// Legend symbols also carry the graphics-symbol role, so anything that is
/// or sits inside a legend is excluded.
pub fn classify_bars(doc: &SvgDocument) -> Vec<NodeId> {
    doc.select(|id, el| {
        el.attr(ROLE) == Some(GRAPHICS_SYMBOL)
            && label_contains(doc, id, POPULATION_MARKER)
            && el.attr(ARIA_ROLEDESCRIPTION) != Some(LEGEND)
            && !within_legend(doc, id)
    })
}

/// Progress of bar `index` for global progress `progress`.
///
/// Bar `i` starts at `i * STAGGER_STEP` and still finishes at 1, so later
/// bars grow faster. A bar whose start offset reaches 1 snaps at the end.
pub fn bar_progress(progress: f64, index: usize) -> f64 {
    let delay = index as f64 * STAGGER_STEP;
    if delay >= 1.0 {
        return if progress >= 1.0 { 1.0 } else { 0.0 };
    }
    ((progress - delay) / (1.0 - delay)).clamp(0.0, 1.0)
}

/// Device-dependent pin tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinSettings {
    /// Pinned scroll distance, in viewport heights
    pub distance_factor: f64,
    /// Seconds the displayed progress takes to catch up with the scroll
    pub scrub_secs: f64,
    /// Reserve layout space for the pinned distance
    pub pin_spacing: bool,
}

impl PinSettings {
    pub fn for_class(class: DeviceClass) -> Self {
        match class {
            // Touch scrolling covers distance faster; reserving space breaks mobile layouts.
            DeviceClass::Mobile => Self { distance_factor: 1.5, scrub_secs: 1.5, pin_spacing: false },
            DeviceClass::Desktop => Self { distance_factor: 1.0, scrub_secs: 1.0, pin_spacing: true },
        }
    }
}

/// Where the page is relative to the pinned region
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PinState {
    Before,
    /// Pinned, `offset` pixels into the pinned distance
    Pinned { offset: f64 },
    After,
}

/// One pinned, scrubbed animation over a container's bars
pub struct ScrollPin {
    container: ChartContainer,
    epoch: u64,
    bars: Vec<NodeId>,
    settings: PinSettings,
    start: f64,
    distance: f64,
    target: f64,
    progress: f64,
    last_tick: Option<Duration>,
}

impl ScrollPin {
    pub fn new(container: ChartContainer, bars: Vec<NodeId>, metrics: DeviceMetrics) -> Self {
        let settings = PinSettings::for_class(metrics.class());
        let start = container.offset_top();
        let distance = metrics.viewport.height as f64 * settings.distance_factor;
        let epoch = container.epoch();
        Self { container, epoch, bars, settings, start, distance, target: 0.0, progress: 0.0, last_tick: None }
    }

    pub fn settings(&self) -> PinSettings {
        self.settings
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Displayed (smoothed) progress
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn bar_count(&self) -> usize {
        self.bars.len()
    }

    /// Unsmoothed progress for a scroll offset
    pub fn raw_progress(&self, scroll_y: f64) -> f64 {
        if self.distance <= 0.0 {
            return if scroll_y >= self.start { 1.0 } else { 0.0 };
        }
        ((scroll_y - self.start) / self.distance).clamp(0.0, 1.0)
    }

    pub fn pin_state(&self, scroll_y: f64) -> PinState {
        if scroll_y < self.start {
            PinState::Before
        } else if scroll_y <= self.start + self.distance {
            PinState::Pinned { offset: scroll_y - self.start }
        } else {
            PinState::After
        }
    }

    /// Layout space reserved below the pinned element
    pub fn spacer(&self) -> f64 {
        if self.settings.pin_spacing {
            self.distance
        } else {
            0.0
        }
    }

    pub fn set_scroll(&mut self, scroll_y: f64) {
        self.target = self.raw_progress(scroll_y);
    }

    /// Jump straight to `progress`, skipping the scrub.
    pub fn seek(&mut self, progress: f64) -> bool {
        self.target = progress.clamp(0.0, 1.0);
        self.progress = self.target;
        self.apply()
    }

    /// Recompute geometry after a viewport change.
    pub fn refresh(&mut self, metrics: DeviceMetrics) {
        self.settings = PinSettings::for_class(metrics.class());
        self.start = self.container.offset_top();
        self.distance = metrics.viewport.height as f64 * self.settings.distance_factor;
    }

    /// Advance the scrub toward the scroll target and repaint.
    ///
    /// Returns false once the container has been re-rendered under the pin.
    pub fn tick(&mut self, now: Duration) -> bool {
        let dt = self.last_tick.map(|t| now.saturating_sub(t)).unwrap_or_default().as_secs_f64();
        self.last_tick = Some(now);
        if self.settings.scrub_secs <= 0.0 {
            self.progress = self.target;
        } else {
            let alpha = 1.0 - (-dt / self.settings.scrub_secs).exp();
            self.progress += (self.target - self.progress) * alpha;
            if (self.target - self.progress).abs() < 1e-4 {
                self.progress = self.target;
            }
        }
        self.apply()
    }

    /// Write bar scales for the current progress, then put the legend back.
    ///
    /// The legend reset runs on every update: anything transformed this frame
    /// must not leak into the legend.
    pub fn apply(&self) -> bool {
        if self.container.epoch() != self.epoch {
            return false;
        }
        let progress = self.progress;
        let bars = &self.bars;
        self.container
            .with_document_mut(|doc| {
                for (i, id) in bars.iter().enumerate() {
                    let style = doc.style(*id);
                    doc.set_style(
                        *id,
                        Style {
                            scale_y: bar_progress(progress, i),
                            origin: Some(TransformOrigin::BOTTOM_CENTER),
                            ..style
                        },
                    );
                }
                normalize_legends(doc);
            })
            .is_some()
    }
}

struct ActivePin {
    pin: Arc<Mutex<ScrollPin>>,
    _frames: FrameLoop,
}

/// Holds the single live `ScrollPin`; creating a new one destroys the old.
pub struct ScrollPinRegistry {
    clock: Arc<dyn Clock>,
    frame_interval: Duration,
    slot: Mutex<Option<ActivePin>>,
}

impl ScrollPinRegistry {
    pub fn new(clock: Arc<dyn Clock>, frame_interval: Duration) -> Self {
        Self { clock, frame_interval, slot: Mutex::new(None) }
    }

    fn lock(&self) -> MutexGuard<'_, Option<ActivePin>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Install `pin` and start its scrub ticker.
    pub fn create(&self, pin: ScrollPin) {
        self.destroy();
        pin.apply();
        let pin = Arc::new(Mutex::new(pin));
        let ticking = pin.clone();
        let frames = FrameLoop::spawn(self.clock.clone(), self.frame_interval, move |now| {
            let mut pin = ticking.lock().unwrap_or_else(|e| e.into_inner());
            if pin.tick(now) {
                ControlFlow::Continue(())
            } else {
                ControlFlow::Break(())
            }
        });
        *self.lock() = Some(ActivePin { pin, _frames: frames });
    }

    /// Stop and drop the live pin. Returns whether one existed.
    pub fn destroy(&self) -> bool {
        self.lock().take().is_some()
    }

    pub fn is_active(&self) -> bool {
        self.lock().is_some()
    }

    /// Run `f` against the live pin.
    pub fn with_pin<R>(&self, f: impl FnOnce(&mut ScrollPin) -> R) -> Option<R> {
        let pin = self.lock().as_ref().map(|a| a.pin.clone())?;
        let mut guard = pin.lock().unwrap_or_else(|e| e.into_inner());
        Some(f(&mut guard))
    }

    /// Feed a new scroll offset; the ticker scrubs toward it.
    pub fn update(&self, scroll_y: f64) {
        self.with_pin(|pin| pin.set_scroll(scroll_y));
    }

    pub fn seek(&self, progress: f64) {
        self.with_pin(|pin| pin.seek(progress));
    }

    pub fn refresh(&self, metrics: DeviceMetrics) {
        self.with_pin(|pin| pin.refresh(metrics));
    }

    pub fn progress(&self) -> Option<f64> {
        self.with_pin(|pin| pin.progress())
    }
}

/// Wait for the chart's bars, collapse them and hand them to a new scroll pin.
///
/// Returns false when no bars appeared within `schedule`.
pub async fn animate_on_scroll(
    container: &ChartContainer,
    registry: &ScrollPinRegistry,
    metrics: DeviceMetrics,
    scroll_y: f64,
    clock: &dyn Clock,
    schedule: &RetrySchedule,
) -> bool {
    let probe = || container.with_document(classify_bars).filter(|bars| !bars.is_empty());
    let Some(bars) = wait_for(clock, schedule, probe).await else {
        log::warn!("no bars found for scroll animation");
        return false;
    };
    log::debug!("pinning {} bars", bars.len());
    let mut pin = ScrollPin::new(container.clone(), bars, metrics);
    pin.set_scroll(scroll_y);
    registry.create(pin);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TokioClock;
    use crate::platform::Viewport;

    const CHART: &str = r#"<svg>
        <g role="graphics-object" aria-roledescription="legend">
            <path role="graphics-symbol" aria-label="density: 1; pop: legend" d="M0,0h100v10h-100Z"/>
        </g>
        <path role="graphics-symbol" aria-roledescription="bar" aria-label="name: A; pop: 30" d="M0,100h30v-100h-30Z"/>
        <path role="graphics-symbol" aria-roledescription="bar" aria-label="name: B; pop: 20" d="M40,100h30v-60h-30Z"/>
        <path role="graphics-symbol" aria-roledescription="legend" aria-label="pop: key" d="M0,0h30v10h-30Z"/>
        <path role="graphics-symbol" aria-label="density: 9" d="M0,0h30v10h-30Z"/>
    </svg>"#;

    fn desktop() -> DeviceMetrics {
        DeviceMetrics { viewport: Viewport { width: 1280, height: 800 }, ..DeviceMetrics::default() }
    }

    fn mounted() -> ChartContainer {
        let c = ChartContainer::new("chart");
        c.mount(c.clear(), SvgDocument::parse(CHART));
        c
    }

    #[test]
    fn only_data_bars_are_classified() {
        let doc = SvgDocument::parse(CHART);
        let bars = classify_bars(&doc);
        assert_eq!(bars.len(), 2);
        assert!(bars.iter().all(|id| doc.attr(*id, "aria-roledescription") == Some("bar")));
    }

    #[test]
    fn progress_mapping_edges() {
        for i in 0..10 {
            assert_eq!(bar_progress(1.0, i), 1.0, "bar {}", i);
            assert_eq!(bar_progress(0.0, i), 0.0, "bar {}", i);
        }
        assert_eq!(bar_progress(0.25, 5), 0.0);
        assert!(bar_progress(0.5, 1) < bar_progress(0.5, 0));
        assert_eq!(bar_progress(0.99, 20), 0.0);
        assert_eq!(bar_progress(1.0, 20), 1.0);
    }

    #[test]
    fn device_tuning() {
        let m = PinSettings::for_class(DeviceClass::Mobile);
        let d = PinSettings::for_class(DeviceClass::Desktop);
        assert!(m.distance_factor > d.distance_factor);
        assert!(m.scrub_secs > d.scrub_secs);
        assert!(!m.pin_spacing && d.pin_spacing);
    }

    #[test]
    fn geometry_follows_container_offset() {
        let c = mounted();
        c.set_offset_top(200.0);
        let pin = ScrollPin::new(c, vec![], desktop());
        assert_eq!(pin.distance(), 800.0);
        assert_eq!(pin.raw_progress(600.0), 0.5);
        assert_eq!(pin.pin_state(100.0), PinState::Before);
        assert_eq!(pin.pin_state(300.0), PinState::Pinned { offset: 100.0 });
        assert_eq!(pin.pin_state(1200.0), PinState::After);
        assert_eq!(pin.spacer(), 800.0);
    }

    #[test]
    fn seek_scales_bars_and_protects_legend() {
        let c = mounted();
        let bars = c.with_document(classify_bars).unwrap();
        c.with_document_mut(|doc| {
            let all: Vec<_> = doc.ids().collect();
            for id in all {
                doc.set_style(id, Style { scale_y: 0.2, ..Style::default() });
            }
        });
        let mut pin = ScrollPin::new(c.clone(), bars.clone(), desktop());
        assert!(pin.seek(0.5));
        c.with_document(|doc| {
            assert_eq!(doc.style(bars[0]).scale_y, 0.5);
            assert!((doc.style(bars[1]).scale_y - bar_progress(0.5, 1)).abs() < 1e-12);
            let swatch = doc.by_tag("path")[0];
            assert!(doc.style(swatch).is_identity());
        });
    }

    #[test]
    fn rerendered_container_retires_pin() {
        let c = mounted();
        let mut pin = ScrollPin::new(c.clone(), vec![], desktop());
        c.clear();
        assert!(!pin.seek(1.0));
    }

    #[tokio::test(start_paused = true)]
    async fn scrub_catches_up_with_scroll() {
        let clock: Arc<dyn Clock> = Arc::new(TokioClock::new());
        let registry = ScrollPinRegistry::new(clock.clone(), Duration::from_millis(16));
        let c = mounted();
        let schedule = RetrySchedule::from_millis(&[0, 20, 50]);
        assert!(animate_on_scroll(&c, &registry, desktop(), 0.0, clock.as_ref(), &schedule).await);
        assert_eq!(registry.progress(), Some(0.0));

        registry.update(800.0);
        clock.sleep(Duration::from_millis(100)).await;
        let partial = registry.progress().unwrap();
        assert!(partial > 0.0 && partial < 1.0, "partial {}", partial);

        clock.sleep(Duration::from_secs(20)).await;
        assert_eq!(registry.progress(), Some(1.0));
        let scales = c.with_document(|doc| classify_bars(doc).iter().map(|id| doc.style(*id).scale_y).collect::<Vec<_>>());
        assert_eq!(scales, Some(vec![1.0, 1.0]));
    }

    #[tokio::test(start_paused = true)]
    async fn creating_a_pin_replaces_the_previous_one() {
        let clock: Arc<dyn Clock> = Arc::new(TokioClock::new());
        let registry = ScrollPinRegistry::new(clock.clone(), Duration::from_millis(16));
        let c = mounted();
        registry.create(ScrollPin::new(c.clone(), vec![], desktop()));
        registry.create(ScrollPin::new(c, vec![], desktop()));
        assert!(registry.is_active());
        assert!(registry.destroy());
        assert!(!registry.destroy());
    }
}
