//! Page surface: viewport, scroll offset, chart containers and events.
//!
//! This is the headless stand-in for the browser window the chart lives in.
//! Containers are cheap clonable handles so spawned animation tasks and the
//! pipeline can share them.

pub mod accessibility;
pub mod device;
pub mod events;

pub use accessibility::{AccessibilityNode, AccessibilityTree};
pub use device::{DeviceClass, DeviceMetrics, Viewport, ViewportState};
pub use events::{EventBus, PageEvent, SubscriptionId};

use crate::dom::{escape_xml, SvgDocument};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

/// Input delivered to a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerEvent {
    DoubleClick,
    KeyDown(String),
}

/// Whether a listener consumed the browser's default action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Default,
    PreventDefault,
}

type ContainerListener = Arc<dyn Fn(&ContainerEvent) -> EventOutcome + Send + Sync>;

/// What a container currently shows
#[derive(Debug, Clone, Default)]
pub enum Content {
    #[default]
    Empty,
    Chart(SvgDocument),
    /// Plain-text message shown in place of the chart
    Message(String),
}

#[derive(Default)]
struct ContainerState {
    content: Content,
    /// Bumped on every clear; stale mounts compare against it
    epoch: u64,
    tabindex: Option<i32>,
    classes: BTreeSet<String>,
    /// Distance from the top of the page, in CSS pixels
    offset_top: f64,
    listeners: Vec<ContainerListener>,
}

/// Shared handle to a chart container element
#[derive(Clone)]
pub struct ChartContainer {
    id: Arc<str>,
    state: Arc<Mutex<ContainerState>>,
}

impl std::fmt::Debug for ChartContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChartContainer").field("id", &self.id).finish()
    }
}

impl ChartContainer {
    pub fn new(id: &str) -> Self {
        Self { id: Arc::from(id), state: Arc::new(Mutex::new(ContainerState::default())) }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    // A poisoned lock only means a listener panicked; the state itself is plain data.
    fn lock(&self) -> MutexGuard<'_, ContainerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Remove all content and listeners. Returns the new epoch.
    pub fn clear(&self) -> u64 {
        let mut s = self.lock();
        s.content = Content::Empty;
        s.listeners.clear();
        s.epoch += 1;
        s.epoch
    }

    pub fn epoch(&self) -> u64 {
        self.lock().epoch
    }

    /// Install a rendered document if no clear happened since `epoch`.
    pub fn mount(&self, epoch: u64, doc: SvgDocument) -> bool {
        let mut s = self.lock();
        if s.epoch != epoch {
            return false;
        }
        s.content = Content::Chart(doc);
        true
    }

    pub fn show_message(&self, text: impl Into<String>) {
        self.lock().content = Content::Message(text.into());
    }

    pub fn has_content(&self) -> bool {
        !matches!(self.lock().content, Content::Empty)
    }

    pub fn content(&self) -> Content {
        self.lock().content.clone()
    }

    /// Run `f` against the mounted chart, if any.
    pub fn with_document<R>(&self, f: impl FnOnce(&SvgDocument) -> R) -> Option<R> {
        match &self.lock().content {
            Content::Chart(doc) => Some(f(doc)),
            _ => None,
        }
    }

    pub fn with_document_mut<R>(&self, f: impl FnOnce(&mut SvgDocument) -> R) -> Option<R> {
        match &mut self.lock().content {
            Content::Chart(doc) => Some(f(doc)),
            _ => None,
        }
    }

    pub fn set_tabindex(&self, index: i32) {
        self.lock().tabindex = Some(index);
    }

    pub fn tabindex(&self) -> Option<i32> {
        self.lock().tabindex
    }

    pub fn set_class(&self, class: &str, on: bool) {
        let mut s = self.lock();
        if on {
            s.classes.insert(class.to_string());
        } else {
            s.classes.remove(class);
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.lock().classes.contains(class)
    }

    pub fn set_offset_top(&self, offset: f64) {
        self.lock().offset_top = offset;
    }

    pub fn offset_top(&self) -> f64 {
        self.lock().offset_top
    }

    pub fn add_listener<F>(&self, listener: F)
    where
        F: Fn(&ContainerEvent) -> EventOutcome + Send + Sync + 'static,
    {
        self.lock().listeners.push(Arc::new(listener));
    }

    /// Deliver an input event. Listeners run outside the lock.
    pub fn dispatch(&self, event: &ContainerEvent) -> EventOutcome {
        let listeners = self.lock().listeners.clone();
        let mut outcome = EventOutcome::Default;
        for listener in listeners {
            if listener(event) == EventOutcome::PreventDefault {
                outcome = EventOutcome::PreventDefault;
            }
        }
        outcome
    }

    /// Outer markup of the container element
    pub fn to_markup(&self) -> String {
        let s = self.lock();
        let mut open = format!("<div id=\"{}\"", escape_xml(&self.id));
        if !s.classes.is_empty() {
            let classes: Vec<&str> = s.classes.iter().map(String::as_str).collect();
            open.push_str(&format!(" class=\"{}\"", classes.join(" ")));
        }
        if let Some(t) = s.tabindex {
            open.push_str(&format!(" tabindex=\"{}\"", t));
        }
        let inner = match &s.content {
            Content::Empty => String::new(),
            Content::Chart(doc) => doc.to_markup(),
            Content::Message(msg) => format!("<p>{}</p>", escape_xml(msg)),
        };
        format!("{}>{}</div>", open, inner)
    }
}

/// A page holding chart containers
pub struct Page {
    metrics: Mutex<DeviceMetrics>,
    scroll_y: Mutex<f64>,
    /// Total scrollable height; unbounded until set
    document_height: Mutex<f64>,
    /// Extra height reserved below the chart by an active scroll pin
    pin_spacer: Mutex<f64>,
    containers: Mutex<HashMap<String, ChartContainer>>,
    events: Arc<EventBus>,
}

impl Page {
    pub fn new(metrics: DeviceMetrics) -> Self {
        Self {
            metrics: Mutex::new(metrics),
            scroll_y: Mutex::new(0.0),
            document_height: Mutex::new(f64::INFINITY),
            pin_spacer: Mutex::new(0.0),
            containers: Mutex::new(HashMap::new()),
            events: Arc::new(EventBus::new()),
        }
    }

    /// Create (or return the existing) container with `id`.
    pub fn add_container(&self, id: &str) -> ChartContainer {
        let mut containers = self.containers.lock().unwrap_or_else(|e| e.into_inner());
        containers.entry(id.to_string()).or_insert_with(|| ChartContainer::new(id)).clone()
    }

    pub fn container(&self, id: &str) -> Option<ChartContainer> {
        self.containers.lock().unwrap_or_else(|e| e.into_inner()).get(id).cloned()
    }

    pub fn metrics(&self) -> DeviceMetrics {
        *self.metrics.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn viewport(&self) -> Viewport {
        self.metrics().viewport
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        self.metrics.lock().unwrap_or_else(|e| e.into_inner()).viewport = viewport;
    }

    pub fn scroll_y(&self) -> f64 {
        *self.scroll_y.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_scroll_y(&self, y: f64) {
        *self.scroll_y.lock().unwrap_or_else(|e| e.into_inner()) = y.max(0.0);
    }

    pub fn set_document_height(&self, height: f64) {
        *self.document_height.lock().unwrap_or_else(|e| e.into_inner()) = height.max(0.0);
    }

    pub fn set_pin_spacer(&self, height: f64) {
        *self.pin_spacer.lock().unwrap_or_else(|e| e.into_inner()) = height.max(0.0);
    }

    pub fn pin_spacer(&self) -> f64 {
        *self.pin_spacer.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Largest reachable scroll offset, including any pin spacer
    pub fn scroll_limit(&self) -> f64 {
        let height = *self.document_height.lock().unwrap_or_else(|e| e.into_inner());
        (height + self.pin_spacer() - self.viewport().height as f64).max(0.0)
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(DeviceMetrics::default())
    }
}
