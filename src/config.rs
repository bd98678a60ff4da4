//! Pipeline configuration.
//!
//! Every field has a default matching the shipped assets, so an override file
//! only needs the keys it changes.

use crate::animation::ease::Ease;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Configuration for a `ChartPipeline`
///
/// # Examples
///
/// ```
/// let cfg = cochart::PipelineConfig::default();
/// assert_eq!(cfg.top_n, 15);
/// assert_eq!(cfg.container_id, "chart");
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Id of the element the chart mounts into
    pub container_id: String,
    /// Relative asset locations, resolved against the asset base
    pub assets: AssetPaths,
    /// Property names read from each GeoJSON feature
    pub fields: FieldMap,
    /// Number of cities kept after ranking by population
    pub top_n: usize,
    /// Name of the view signal carrying the selected identifiers
    pub selection_signal: String,
    pub timing: Timing,
    pub entrance: EntranceOptions,
    pub smooth_scroll: SmoothScrollOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            container_id: "chart".to_string(),
            assets: AssetPaths::default(),
            fields: FieldMap::default(),
            top_n: 15,
            selection_signal: "selected_geoids".to_string(),
            timing: Timing::default(),
            entrance: EntranceOptions::default(),
            smooth_scroll: SmoothScrollOptions::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration override from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&text)
            .map_err(|e| Error::ConfigError(format!("Invalid config {}: {}", path.display(), e)))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetPaths {
    pub data: String,
    pub theme: String,
    pub chart: String,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            data: "data/colorado-cities-enriched.geojson".to_string(),
            theme: "specs/vega-lite/theme.json".to_string(),
            chart: "specs/vega-lite/chart.json".to_string(),
        }
    }
}

/// Names of the feature properties the transformer reads
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldMap {
    pub id: String,
    pub name: String,
    pub population: String,
    /// Land area in square meters
    pub area: String,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            id: "GEOID".to_string(),
            name: "NAME".to_string(),
            population: "Total_Pop".to_string(),
            area: "ALAND".to_string(),
        }
    }
}

/// Fixed delays used by the pipeline. All values are milliseconds in JSON.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Timing {
    pub resize_debounce_ms: u64,
    pub axis_fixup_ms: u64,
    pub scroll_pin_setup_ms: u64,
    /// Delay before each attempt to find bars for the entrance animation
    pub entrance_schedule_ms: Vec<u64>,
    /// Delay before each attempt to hide bars ahead of the animation
    pub initial_state_schedule_ms: Vec<u64>,
    pub frame_interval_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            resize_debounce_ms: 250,
            axis_fixup_ms: 200,
            scroll_pin_setup_ms: 100,
            entrance_schedule_ms: vec![0, 20, 50],
            initial_state_schedule_ms: vec![0, 10],
            frame_interval_ms: 16,
            request_timeout_ms: 30000,
        }
    }
}

impl Timing {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }
}

/// Tuning for the staggered entrance tween
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EntranceOptions {
    pub duration_secs: f64,
    pub stagger_secs: f64,
    pub delay_secs: f64,
    pub ease: Ease,
}

impl Default for EntranceOptions {
    fn default() -> Self {
        Self {
            duration_secs: 1.2,
            stagger_secs: 0.05,
            delay_secs: 0.1,
            ease: Ease::Power2Out,
        }
    }
}

/// Options for the smooth-scroll driver
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SmoothScrollOptions {
    pub duration_secs: f64,
    pub ease: Ease,
    pub wheel_multiplier: f64,
    /// Smooth touch input too. Off by default: touch scrolls immediately.
    pub smooth_touch: bool,
}

impl Default for SmoothScrollOptions {
    fn default() -> Self {
        Self {
            duration_secs: 1.2,
            ease: Ease::ExpoOut,
            wheel_multiplier: 1.0,
            smooth_touch: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_override_keeps_defaults() {
        let cfg: PipelineConfig =
            serde_json::from_str(r#"{ "top_n": 5, "timing": { "resize_debounce_ms": 100 } }"#).unwrap();
        assert_eq!(cfg.top_n, 5);
        assert_eq!(cfg.timing.resize_debounce_ms, 100);
        assert_eq!(cfg.timing.entrance_schedule_ms, vec![0, 20, 50]);
        assert_eq!(cfg.fields.population, "Total_Pop");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let res: std::result::Result<PipelineConfig, _> = serde_json::from_str(r#"{ "top_m": 5 }"#);
        assert!(res.is_err());
    }

    #[test]
    fn missing_config_file_is_config_error() {
        let err = PipelineConfig::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }
}
