//! Chart rendering seam.
//!
//! The pipeline only talks to a `Renderer` and the `ViewHandle` it returns.
//! `render` hands back as soon as the specification is accepted; the markup
//! shows up in the container at some later, unobservable point, so callers
//! that need the elements poll for them (see `readiness`).

pub mod layout;
pub mod paint;
pub mod svg;

pub use svg::{RendererOptions, SvgBarRenderer, SvgView};

use crate::platform::ChartContainer;
use crate::Result;
use futures::future::BoxFuture;
use serde_json::Value;
use std::sync::Arc;

/// Called with the signal name and its new value
pub type SignalListener = Arc<dyn Fn(&str, &Value) + Send + Sync>;

/// A live, rendered chart
pub trait ViewHandle: Send + Sync {
    /// Register `listener` for changes of signal `name`.
    fn add_signal_listener(&self, name: &str, listener: SignalListener) -> Result<()>;

    /// Set signal `name` and notify its listeners.
    fn set_signal(&self, name: &str, value: Value) -> Result<()>;

    /// Current value of signal `name`, if the view declares it
    fn signal(&self, name: &str) -> Option<Value>;

    /// Resolves once the view's markup has been mounted (or discarded as stale).
    fn mounted(&self) -> BoxFuture<'static, ()>;
}

/// Turns a chart specification into a view inside a container
pub trait Renderer: Send + Sync {
    fn render(&self, spec: &Value, container: &ChartContainer) -> Result<Arc<dyn ViewHandle>>;
}
