//! Specification assembler.
//!
//! Builds a fresh render-ready chart specification from the base spec, the
//! theme and the current viewport. Inputs are borrowed and never modified, so
//! the same assets can be reused for every render cycle.

use crate::data::CityRow;
use crate::platform::ViewportState;
use crate::Result;
use serde::Deserialize;
use serde_json::{json, Map, Value};

/// Theme document: only its `config` subtree is used.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Theme {
    #[serde(default)]
    pub config: Map<String, Value>,
}

impl Theme {
    /// Interpret an arbitrary JSON document as a theme, treating anything
    /// without an object `config` as an empty theme.
    pub fn from_value(value: &Value) -> Self {
        let config = value
            .get("config")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        Self { config }
    }
}

/// Axis label size for the category axis.
pub fn label_font_size(viewport: ViewportState) -> u32 {
    if viewport.is_small_mobile {
        10
    } else if viewport.is_mobile {
        11
    } else {
        12
    }
}

/// Merge base spec, theme and viewport overrides into a new specification.
///
/// `config` keys from the base spec win over the theme's. A base spec that is
/// not an object is treated as empty.
pub fn assemble(base: &Value, theme: &Theme, viewport: ViewportState) -> Value {
    let mut spec = base.as_object().cloned().unwrap_or_default();

    let encoding = object_entry(&mut spec, "encoding");
    let x_axis = object_entry(object_entry(encoding, "x"), "axis");
    x_axis.insert("labelFontSize".into(), json!(label_font_size(viewport)));

    let legend = object_entry(object_entry(encoding, "color"), "legend");
    let (orient, direction) = if viewport.is_mobile { ("bottom", "horizontal") } else { ("right", "vertical") };
    legend.insert("orient".into(), json!(orient));
    legend.insert("direction".into(), json!(direction));

    let mut config = theme.config.clone();
    if let Some(own) = spec.get("config").and_then(Value::as_object) {
        for (key, value) in own {
            config.insert(key.clone(), value.clone());
        }
    }
    spec.insert("config".into(), Value::Object(config));

    Value::Object(spec)
}

/// Attach the table rows as inline data. Runs after all config merging.
pub fn attach_data(mut spec: Value, rows: &[CityRow]) -> Result<Value> {
    let values = serde_json::to_value(rows)?;
    if let Some(obj) = spec.as_object_mut() {
        obj.insert("data".into(), json!({ "values": values }));
    }
    Ok(spec)
}

// Get `key` as an object, replacing any non-object value.
fn object_entry<'a>(map: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    let slot = map.entry(key.to_string()).or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    match slot {
        Value::Object(obj) => obj,
        _ => unreachable!("slot was just made an object"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Viewport;

    fn state(width: u32) -> ViewportState {
        Viewport { width, height: 800 }.state()
    }

    fn base() -> Value {
        json!({
            "mark": "bar",
            "encoding": {
                "x": { "field": "name", "type": "nominal", "axis": { "labelAngle": -45 } },
                "y": { "field": "pop", "type": "quantitative" },
                "color": { "field": "density", "type": "quantitative", "legend": { "title": "Density" } }
            },
            "config": { "b": 3 }
        })
    }

    #[test]
    fn base_config_wins_over_theme() {
        let theme = Theme::from_value(&json!({ "config": { "a": 1, "b": 2 } }));
        let spec = assemble(&base(), &theme, state(1024));
        assert_eq!(spec["config"], json!({ "a": 1, "b": 3 }));
    }

    #[test]
    fn viewport_overrides() {
        let theme = Theme::default();
        for (width, size, orient, direction) in [
            (400, 10, "bottom", "horizontal"),
            (600, 11, "bottom", "horizontal"),
            (1024, 12, "right", "vertical"),
        ] {
            let spec = assemble(&base(), &theme, state(width));
            assert_eq!(spec["encoding"]["x"]["axis"]["labelFontSize"], json!(size), "width {}", width);
            assert_eq!(spec["encoding"]["color"]["legend"]["orient"], json!(orient));
            assert_eq!(spec["encoding"]["color"]["legend"]["direction"], json!(direction));
        }
    }

    #[test]
    fn existing_channel_settings_survive() {
        let spec = assemble(&base(), &Theme::default(), state(1024));
        assert_eq!(spec["encoding"]["x"]["axis"]["labelAngle"], json!(-45));
        assert_eq!(spec["encoding"]["color"]["legend"]["title"], json!("Density"));
        assert_eq!(spec["encoding"]["y"]["field"], json!("pop"));
    }

    #[test]
    fn inputs_are_not_mutated() {
        let b = base();
        let before = b.clone();
        let theme = Theme::from_value(&json!({ "config": { "a": 1 } }));
        let _ = assemble(&b, &theme, state(400));
        assert_eq!(b, before);
        assert_eq!(theme.config.len(), 1);
    }

    #[test]
    fn empty_base_still_assembles() {
        let spec = assemble(&json!({}), &Theme::from_value(&json!(null)), state(1024));
        assert_eq!(spec["encoding"]["x"]["axis"]["labelFontSize"], json!(12));
        assert_eq!(spec["config"], json!({}));
    }

    #[test]
    fn data_is_attached_last() {
        let spec = assemble(&base(), &Theme::default(), state(1024));
        let rows = vec![CityRow::new("1", "A", 10.0, 100.0)];
        let spec = attach_data(spec, &rows).unwrap();
        assert_eq!(spec["data"]["values"][0]["name"], json!("A"));
        assert_eq!(spec["data"]["values"].as_array().map(Vec::len), Some(1));
    }
}
