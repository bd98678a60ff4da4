//! The render pipeline.
//!
//! One `ChartPipeline` owns everything a page needs to show the chart: asset
//! loading, specification assembly, the renderer, both animation modes, the
//! selection bridge, smooth scrolling and resize handling. `Settings` decide
//! which optional stages run; there is a single code path either way.

use crate::animation::{animate_entrance, animate_on_scroll, classify_bars, prepare_bars, Animator, ScrollPinRegistry};
use crate::assets::{AssetLoader, Assets};
use crate::axis;
use crate::clock::Clock;
use crate::config::PipelineConfig;
use crate::data::top_n;
use crate::dom::Style;
use crate::platform::{ChartContainer, Page, Viewport};
use crate::readiness::RetrySchedule;
use crate::rendering::{Renderer, ViewHandle};
use crate::resize::ResizeDebouncer;
use crate::selection;
use crate::settings::{AnimationMode, Effect, Settings, SettingsUpdate};
use crate::smooth_scroll::SmoothScrollCoordinator;
use crate::spec::{assemble, attach_data};
use crate::{Error, Result};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Text shown in place of the chart when rendering fails
pub const RENDER_ERROR_MESSAGE: &str = "Error loading chart. Please check the console for details.";
/// Container class enabling horizontal scrolling on narrow screens
pub const SCROLL_AFFORDANCE_CLASS: &str = "scroll-x";

/// How a render cycle ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The chart was handed to the renderer with this many rows
    Rendered { rows: usize },
    /// The container does not exist; nothing was attempted
    NoContainer,
    /// The renderer rejected the specification; the container shows a message
    Failed(String),
}

impl RenderOutcome {
    /// Rendered row count, or the error that stopped the cycle.
    pub fn into_result(self, container_id: &str) -> Result<usize> {
        match self {
            RenderOutcome::Rendered { rows } => Ok(rows),
            RenderOutcome::NoContainer => Err(Error::ContainerNotFound(format!("#{}", container_id))),
            RenderOutcome::Failed(reason) => Err(Error::Other(reason)),
        }
    }
}

pub struct ChartPipeline {
    config: PipelineConfig,
    page: Arc<Page>,
    loader: AssetLoader,
    renderer: Arc<dyn Renderer>,
    clock: Arc<dyn Clock>,
    settings: Mutex<Settings>,
    animator: Animator,
    pins: Arc<ScrollPinRegistry>,
    smooth: SmoothScrollCoordinator,
    debouncer: ResizeDebouncer,
    view: Mutex<Option<Arc<dyn ViewHandle>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl ChartPipeline {
    pub fn new(
        config: PipelineConfig,
        page: Arc<Page>,
        loader: AssetLoader,
        renderer: Arc<dyn Renderer>,
        clock: Arc<dyn Clock>,
        settings: Settings,
    ) -> Self {
        let frame = config.timing.frame_interval();
        let debounce = Duration::from_millis(config.timing.resize_debounce_ms);
        Self {
            animator: Animator::new(clock.clone(), frame),
            pins: Arc::new(ScrollPinRegistry::new(clock.clone(), frame)),
            smooth: SmoothScrollCoordinator::new(clock.clone(), frame, config.smooth_scroll.clone()),
            debouncer: ResizeDebouncer::new(clock.clone(), debounce),
            view: Mutex::new(None),
            tasks: Mutex::new(Vec::new()),
            settings: Mutex::new(settings),
            config,
            page,
            loader,
            renderer,
            clock,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn page(&self) -> &Arc<Page> {
        &self.page
    }

    pub fn settings(&self) -> Settings {
        *lock(&self.settings)
    }

    /// View from the last successful render
    pub fn view(&self) -> Option<Arc<dyn ViewHandle>> {
        lock(&self.view).clone()
    }

    pub fn container(&self) -> Option<ChartContainer> {
        self.page.container(&self.config.container_id)
    }

    /// First render of a page: start smooth scrolling if enabled, then render.
    pub async fn init(&self) -> RenderOutcome {
        if self.settings().smooth_scroll_enabled {
            self.start_smooth_scroll();
        }
        self.render_chart().await
    }

    /// Run one full render cycle into the configured container.
    pub async fn render_chart(&self) -> RenderOutcome {
        let Some(container) = self.container() else {
            log::error!("Chart container not found: #{}", self.config.container_id);
            return RenderOutcome::NoContainer;
        };
        let viewport = self.page.viewport().state();
        let settings = self.settings();

        let Assets { rows, theme, chart } = self.loader.load_all().await;
        let rows = top_n(rows, self.config.top_n);
        log::info!("rendering {} rows (mobile: {}, small: {})", rows.len(), viewport.is_mobile, viewport.is_small_mobile);

        self.animator.cancel();
        self.pins.destroy();
        self.sync_pin_spacing();
        container.clear();
        lock(&self.view).take();

        let rendered = attach_data(assemble(&chart, &theme, viewport), &rows)
            .and_then(|spec| self.renderer.render(&spec, &container));
        let view = match rendered {
            Ok(view) => view,
            Err(e) => {
                log::error!("Error rendering chart: {}", e);
                container.show_message(RENDER_ERROR_MESSAGE);
                return RenderOutcome::Failed(e.to_string());
            }
        };
        *lock(&self.view) = Some(view.clone());

        let fixup_target = container.clone();
        let clock = self.clock.clone();
        let fixup_delay = Duration::from_millis(self.config.timing.axis_fixup_ms);
        self.spawn(async move {
            axis::compact_after(&fixup_target, clock.as_ref(), fixup_delay).await;
        });

        container.set_class(SCROLL_AFFORDANCE_CLASS, settings.scroll_affordance(viewport));

        if let Err(e) = selection::attach(view, &container, self.page.events().clone(), &self.config.selection_signal) {
            log::warn!("selection disabled: {}", e);
        }

        match settings.animation_mode(viewport) {
            AnimationMode::Static => log::debug!("animations disabled; leaving chart static"),
            AnimationMode::Entrance => {
                let initial = RetrySchedule::from_millis(&self.config.timing.initial_state_schedule_ms);
                prepare_bars(&container, self.clock.as_ref(), &initial).await;
                animate_entrance(&container, &self.animator, self.clock.as_ref(), &self.entrance_schedule(), &self.config.entrance)
                    .await;
            }
            AnimationMode::ScrollLinked => {
                self.attach_scroll_pin(&container).await;
            }
        }

        RenderOutcome::Rendered { rows: rows.len() }
    }

    fn entrance_schedule(&self) -> RetrySchedule {
        RetrySchedule::from_millis(&self.config.timing.entrance_schedule_ms)
    }

    fn spawn<F>(&self, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let mut tasks = lock(&self.tasks);
        tasks.retain(|t| !t.is_finished());
        tasks.push(tokio::spawn(task));
    }

    async fn attach_scroll_pin(&self, container: &ChartContainer) -> bool {
        self.clock.sleep(Duration::from_millis(self.config.timing.scroll_pin_setup_ms)).await;
        let attached = animate_on_scroll(
            container,
            &self.pins,
            self.page.metrics(),
            self.page.scroll_y(),
            self.clock.as_ref(),
            &self.entrance_schedule(),
        )
        .await;
        self.sync_pin_spacing();
        attached
    }

    // The page grows by the active pin's spacer; smooth scrolling follows the new limit.
    fn sync_pin_spacing(&self) {
        self.page.set_pin_spacer(self.pins.with_pin(|pin| pin.spacer()).unwrap_or(0.0));
        self.smooth.resize(self.page.scroll_limit());
    }

    /// Wait for the mount, post-render fixups and any entrance tween.
    pub async fn settle(&self) {
        if let Some(view) = self.view() {
            view.mounted().await;
        }
        let tasks: Vec<JoinHandle<()>> = std::mem::take(&mut *lock(&self.tasks));
        for task in tasks {
            let _ = task.await;
        }
        self.animator.settle().await;
    }

    /// Store `update.settings` and carry out its effect.
    ///
    /// Returns the outcome when the effect re-rendered the chart.
    pub async fn apply_settings(&self, update: SettingsUpdate) -> Option<RenderOutcome> {
        *lock(&self.settings) = update.settings;
        match update.effect {
            Effect::None => None,
            Effect::Rerender => Some(self.render_chart().await),
            Effect::AttachScrollPin => {
                if let Some(container) = self.container().filter(ChartContainer::has_content) {
                    self.animator.cancel();
                    self.attach_scroll_pin(&container).await;
                }
                None
            }
            Effect::DetachScrollPin => {
                if self.pins.destroy() {
                    self.sync_pin_spacing();
                    if let Some(container) = self.container() {
                        restore_bars(&container);
                    }
                }
                None
            }
            Effect::StartSmoothScroll => {
                self.start_smooth_scroll();
                None
            }
            Effect::StopSmoothScroll => {
                self.smooth.disable();
                None
            }
        }
    }

    pub async fn toggle_scroll_pin(&self, enable: bool) {
        self.apply_settings(self.settings().with_scroll_pin(enable)).await;
    }

    pub async fn toggle_smooth_scroll(&self, enable: bool) {
        self.apply_settings(self.settings().with_smooth_scroll(enable)).await;
    }

    fn start_smooth_scroll(&self) {
        let page = self.page.clone();
        let pins = self.pins.clone();
        self.smooth.enable(
            self.page.scroll_y(),
            self.page.scroll_limit(),
            Arc::new(move |y| {
                page.set_scroll_y(y);
                pins.update(page.scroll_y());
            }),
        );
    }

    /// Raw scroll position change (no smoothing).
    pub fn on_scroll(&self, y: f64) {
        self.page.set_scroll_y(y);
        self.pins.update(self.page.scroll_y());
    }

    /// Wheel input: eased when smooth scrolling is on, applied directly otherwise.
    pub fn on_wheel(&self, delta: f64) {
        if !self.smooth.wheel(delta) {
            self.on_scroll(self.page.scroll_y() + delta);
        }
    }

    /// Touch drag: eased only when smooth touch is configured.
    pub fn on_touch(&self, delta: f64) {
        if !self.smooth.touch(delta) {
            self.on_scroll(self.page.scroll_y() + delta);
        }
    }

    /// Drive the active scroll pin straight to `progress`.
    pub fn seek_scroll_pin(&self, progress: f64) -> bool {
        self.pins.with_pin(|pin| pin.seek(progress)).unwrap_or(false)
    }

    pub fn scroll_progress(&self) -> Option<f64> {
        self.pins.progress()
    }

    /// Viewport change: refresh scroll geometry now, re-render once the burst ends.
    ///
    /// The re-render is skipped when nothing has been rendered yet. The handle
    /// resolves to whether this call's debounced action ran.
    pub fn on_resize(self: &Arc<Self>, viewport: Viewport) -> JoinHandle<bool> {
        self.page.set_viewport(viewport);
        self.pins.refresh(self.page.metrics());
        self.sync_pin_spacing();

        let this = self.clone();
        self.debouncer.call(move || async move {
            match this.container() {
                Some(container) if container.has_content() => {
                    this.render_chart().await;
                }
                _ => log::debug!("resize before first render; nothing to redraw"),
            }
        })
    }
}

// Put every bar back at full height once nothing drives them.
fn restore_bars(container: &ChartContainer) {
    container.with_document_mut(|doc| {
        for id in classify_bars(doc) {
            doc.set_style(id, Style::default());
        }
    });
}
