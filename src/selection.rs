//! Selection bridge between the rendered view and the page.
//!
//! Selection changes on the view's signal are re-emitted as
//! `PageEvent::Selection` with the selected identifiers as a list, whatever
//! shape the signal value has. A double click clears the selection.

use crate::platform::{ChartContainer, ContainerEvent, EventBus, EventOutcome, PageEvent};
use crate::rendering::ViewHandle;
use crate::Result;
use serde_json::Value;
use std::sync::Arc;

/// Field of the selection value holding the identifiers
pub const SELECTION_FIELD: &str = "geoid";

/// Selected identifiers carried by a selection signal value.
///
/// `null`, `false` and other non-object values select nothing. An object's
/// `geoid` entry may be a list or a single value.
pub fn normalize_selection(value: &Value) -> Vec<String> {
    let Some(ids) = value.as_object().and_then(|o| o.get(SELECTION_FIELD)) else {
        return Vec::new();
    };
    match ids {
        Value::Array(items) => items.iter().filter_map(id_text).collect(),
        other => id_text(other).into_iter().collect(),
    }
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Wire `view`'s selection signal and the container's input to the page.
///
/// The container becomes keyboard-focusable. Enter and Space are claimed
/// (default scrolling suppressed) but trigger nothing yet.
pub fn attach(view: Arc<dyn ViewHandle>, container: &ChartContainer, bus: Arc<EventBus>, signal: &str) -> Result<()> {
    view.add_signal_listener(
        signal,
        Arc::new(move |_, value| {
            bus.dispatch(&PageEvent::Selection { geoids: normalize_selection(value) });
        }),
    )?;

    let name = signal.to_string();
    container.add_listener(move |event| match event {
        ContainerEvent::DoubleClick => {
            if let Err(e) = view.set_signal(&name, Value::Null) {
                log::warn!("could not clear selection: {}", e);
            }
            EventOutcome::Default
        }
        ContainerEvent::KeyDown(key) if key == "Enter" || key == " " => EventOutcome::PreventDefault,
        ContainerEvent::KeyDown(_) => EventOutcome::Default,
    });
    container.set_tabindex(0);
    Ok(())
}
