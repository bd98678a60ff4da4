//! Built-in headless bar chart renderer.
//!
//! Produces Vega-style SVG for a single `bar` mark: accessible bar paths, a
//! gradient color legend and two axes with raw numeric tick labels. Markup is
//! built synchronously but mounted after `mount_delay`, so downstream code
//! sees the same late-appearing DOM an asynchronous chart library gives.

use super::layout::{layout_chart, BandScale, LegendPlacement, LinearScale};
use super::paint::ColorScale;
use super::{Renderer, SignalListener, ViewHandle};
use crate::axis::format_grouped;
use crate::clock::Clock;
use crate::dom::{escape_xml, SvgDocument};
use crate::platform::ChartContainer;
use crate::{Error, Result};
use futures::future::{self, BoxFuture, FutureExt, Shared};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Renderer knobs
#[derive(Debug, Clone, PartialEq)]
pub struct RendererOptions {
    /// Canvas width when the specification has no numeric `width`
    pub width: f64,
    /// Canvas height when the specification has no numeric `height`
    pub height: f64,
    /// Export/source action menu. Never drawn by this renderer.
    pub actions: bool,
    pub mount_delay: Duration,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self { width: 800.0, height: 500.0, actions: false, mount_delay: Duration::from_millis(15) }
    }
}

pub struct SvgBarRenderer {
    clock: Arc<dyn Clock>,
    options: RendererOptions,
}

// Channel settings the renderer reads out of `encoding`.
struct Channels<'a> {
    x_field: &'a str,
    y_field: &'a str,
    color_field: Option<&'a str>,
    label_font_size: f64,
    label_angle: f64,
    legend_orient: Option<&'a str>,
    legend_direction: Option<&'a str>,
}

impl<'a> Channels<'a> {
    fn read(encoding: &'a Map<String, Value>) -> Self {
        let channel = |name: &str| encoding.get(name).and_then(Value::as_object);
        let field = |name: &str| channel(name).and_then(|c| c.get("field")).and_then(Value::as_str);
        let x_axis = channel("x").and_then(|c| c.get("axis"));
        let legend = channel("color").and_then(|c| c.get("legend"));
        Self {
            x_field: field("x").unwrap_or("name"),
            y_field: field("y").unwrap_or("pop"),
            color_field: field("color"),
            label_font_size: x_axis.and_then(|a| a.get("labelFontSize")).and_then(Value::as_f64).unwrap_or(10.0),
            label_angle: x_axis.and_then(|a| a.get("labelAngle")).and_then(Value::as_f64).unwrap_or(-45.0),
            legend_orient: legend.and_then(|l| l.get("orient")).and_then(Value::as_str),
            legend_direction: legend.and_then(|l| l.get("direction")).and_then(Value::as_str),
        }
    }
}

impl SvgBarRenderer {
    pub fn new(clock: Arc<dyn Clock>, options: RendererOptions) -> Self {
        Self { clock, options }
    }

    pub fn options(&self) -> &RendererOptions {
        &self.options
    }

    /// Build the chart markup for `spec` without mounting it.
    pub fn markup(&self, spec: &Value) -> Result<String> {
        let obj = spec.as_object().ok_or_else(|| Error::RenderError("specification is not an object".into()))?;
        let mark = obj
            .get("mark")
            .and_then(|m| m.as_str().or_else(|| m.get("type").and_then(Value::as_str)))
            .ok_or_else(|| Error::RenderError("specification has no mark".into()))?;
        if mark != "bar" {
            return Err(Error::RenderError(format!("unsupported mark type: {}", mark)));
        }
        let encoding = obj
            .get("encoding")
            .and_then(Value::as_object)
            .ok_or_else(|| Error::RenderError("specification has no encoding".into()))?;
        let ch = Channels::read(encoding);

        let rows: Vec<&Map<String, Value>> = obj
            .get("data")
            .and_then(|d| d.get("values"))
            .and_then(Value::as_array)
            .map(|values| values.iter().filter_map(Value::as_object).collect())
            .unwrap_or_default();
        let bars: Vec<(&Map<String, Value>, f64)> = rows
            .into_iter()
            .filter_map(|row| row.get(ch.y_field).and_then(Value::as_f64).filter(|v| v.is_finite()).map(|v| (row, v)))
            .collect();

        let width = obj.get("width").and_then(Value::as_f64).unwrap_or(self.options.width);
        let height = obj.get("height").and_then(Value::as_f64).unwrap_or(self.options.height);
        let placement = LegendPlacement::from_orient(ch.legend_orient);
        let layout = layout_chart(width, height, placement, ch.label_font_size);
        let plot = layout.plot;

        let x = BandScale::new(bars.len(), plot.x, plot.right());
        let y_max = bars.iter().map(|(_, v)| *v).fold(0.0, f64::max);
        let y = LinearScale::new(y_max, plot.bottom(), plot.y, 5);
        let colors = match ch.color_field {
            Some(f) => ColorScale::from_values(bars.iter().filter_map(|(row, _)| row.get(f).and_then(Value::as_f64))),
            None => ColorScale::from_values([]),
        };

        let mut out = String::new();
        let title = obj.get("title").and_then(Value::as_str);
        let _ = write!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" class="marks" width="{w}" height="{h}" viewBox="0 0 {w} {h}" role="graphics-document" aria-roledescription="visualization""#,
            w = num(width),
            h = num(height)
        );
        if let Some(t) = title {
            let _ = write!(out, r#" aria-label="{}""#, escape_xml(t));
        }
        out.push('>');

        if ch.color_field.is_some() {
            let (x2, y1) = if ch.legend_direction == Some("horizontal") { (1, 0) } else { (0, 1) };
            let _ = write!(out, r#"<defs><linearGradient id="gradient_0" x1="0" y1="{}" x2="{}" y2="0">"#, y1, x2);
            for (offset, color) in colors.stops(5) {
                let _ = write!(out, r#"<stop offset="{}" stop-color="{}"/>"#, num(offset), color);
            }
            out.push_str("</linearGradient></defs>");
        }

        out.push_str(r#"<g class="mark-group role-frame root" role="graphics-object" aria-roledescription="group mark container">"#);

        // y axis
        let ticks = y.ticks();
        let _ = write!(
            out,
            r#"<g class="mark-group role-axis" role="graphics-object" aria-roledescription="axis" aria-label="Y-axis titled '{}' for a linear scale with values from 0 to {}">"#,
            escape_xml(ch.y_field),
            format_grouped(y.max)
        );
        for tick in &ticks {
            let ty = num(y.map(*tick));
            let _ = write!(
                out,
                r##"<line class="grid" x1="{x0}" y1="{ty}" x2="{x1}" y2="{ty}" stroke="#ddd"/><text class="tick-label" x="{lx}" y="{ty}" text-anchor="end" font-size="10">{label}</text>"##,
                x0 = num(plot.x),
                x1 = num(plot.right()),
                lx = num(plot.x - 6.0),
                label = raw_number(*tick)
            );
        }
        let _ = write!(
            out,
            r##"<line class="domain" x1="{x}" y1="{y0}" x2="{x}" y2="{y1}" stroke="#888"/><text class="axis-title" x="12" y="{ym}" font-size="11" font-weight="bold">{t}</text></g>"##,
            x = num(plot.x),
            y0 = num(plot.y),
            y1 = num(plot.bottom()),
            ym = num(plot.y + plot.height / 2.0),
            t = escape_xml(ch.y_field)
        );

        // x axis
        let _ = write!(
            out,
            r#"<g class="mark-group role-axis" role="graphics-object" aria-roledescription="axis" aria-label="X-axis titled '{}' for a discrete scale with {} values">"#,
            escape_xml(ch.x_field),
            bars.len()
        );
        for (i, (row, _)) in bars.iter().enumerate() {
            let cx = num(x.position(i) + x.bandwidth() / 2.0);
            let ly = num(plot.bottom() + 8.0);
            let _ = write!(
                out,
                r#"<text class="tick-label" transform="translate({cx},{ly}) rotate({a})" text-anchor="end" font-size="{fs}">{label}</text>"#,
                a = num(ch.label_angle),
                fs = num(ch.label_font_size),
                label = escape_xml(&text_of(row.get(ch.x_field)))
            );
        }
        let _ = write!(
            out,
            r##"<line class="domain" x1="{x0}" y1="{y}" x2="{x1}" y2="{y}" stroke="#888"/></g>"##,
            x0 = num(plot.x),
            x1 = num(plot.right()),
            y = num(plot.bottom())
        );

        // bars
        out.push_str(r#"<g class="mark-rect role-mark marks" role="graphics-object" aria-roledescription="rect mark container">"#);
        for (i, (row, value)) in bars.iter().enumerate() {
            let top = y.map(*value);
            let mut label = format!(
                "{}: {}; {}: {}",
                ch.x_field,
                text_of(row.get(ch.x_field)),
                ch.y_field,
                format_grouped(*value)
            );
            let mut fill = "#4c78a8".to_string();
            if let Some(cf) = ch.color_field {
                if let Some(c) = row.get(cf).and_then(Value::as_f64) {
                    let _ = write!(label, "; {}: {}", cf, format_grouped(c.round()));
                    fill = colors.color(c);
                }
            }
            let _ = write!(
                out,
                r#"<path role="graphics-symbol" aria-roledescription="bar" aria-label="{label}" fill="{fill}" d="M{x},{y}h{w}v{h}h-{w}Z"/>"#,
                label = escape_xml(&label),
                x = num(x.position(i)),
                y = num(top),
                w = num(x.bandwidth()),
                h = num(plot.bottom() - top)
            );
        }
        out.push_str("</g>");

        // legend
        if let Some(cf) = ch.color_field {
            let lg = layout.legend;
            let _ = write!(
                out,
                r#"<g class="mark-group role-legend" role="graphics-symbol" aria-roledescription="legend" aria-label="Gradient legend titled '{t}' for fill color with values from {lo} to {hi}">"#,
                t = escape_xml(cf),
                lo = format_grouped(colors.min.round()),
                hi = format_grouped(colors.max.round())
            );
            let _ = write!(
                out,
                r#"<text class="legend-title" x="{x}" y="{y}" font-size="11" font-weight="bold">{t}</text><path class="gradient" fill="url(#gradient_0)" d="M{x},{gy}h{w}v{h}h-{w}Z"/>"#,
                x = num(lg.x),
                y = num(lg.y - 6.0),
                gy = num(lg.y),
                w = num(lg.width),
                h = num(lg.height),
                t = escape_xml(cf)
            );
            let (lo_at, hi_at) = match placement {
                LegendPlacement::Right => ((lg.right() + 4.0, lg.bottom()), (lg.right() + 4.0, lg.y + 10.0)),
                LegendPlacement::Bottom => ((lg.x, lg.bottom() + 12.0), (lg.right(), lg.bottom() + 12.0)),
            };
            for ((lx, ly), v) in [(lo_at, colors.min), (hi_at, colors.max)] {
                let _ = write!(
                    out,
                    r#"<text class="legend-label" x="{}" y="{}" font-size="10">{}</text>"#,
                    num(lx),
                    num(ly),
                    raw_number(v.round())
                );
            }
            out.push_str("</g>");
        }

        if let Some(t) = title {
            let _ = write!(
                out,
                r#"<text class="title" x="{}" y="20" text-anchor="middle" font-size="14" font-weight="bold">{}</text>"#,
                num(width / 2.0),
                escape_xml(t)
            );
        }
        out.push_str("</g></svg>");
        Ok(out)
    }
}

impl Renderer for SvgBarRenderer {
    fn render(&self, spec: &Value, container: &ChartContainer) -> Result<Arc<dyn ViewHandle>> {
        let markup = self.markup(spec)?;
        let doc = SvgDocument::parse(&markup);
        let epoch = container.epoch();
        let delay = self.options.mount_delay;

        let mounted = if delay.is_zero() {
            container.mount(epoch, doc);
            future::ready(()).boxed()
        } else {
            let clock = self.clock.clone();
            let target = container.clone();
            let handle = tokio::spawn(async move {
                clock.sleep(delay).await;
                if !target.mount(epoch, doc) {
                    log::debug!("discarding stale render for #{}", target.id());
                }
            });
            handle.map(|_| ()).boxed()
        };

        Ok(Arc::new(SvgView::new(selection_params(spec), mounted)))
    }
}

// Names of selection parameters declared by the specification.
fn selection_params(spec: &Value) -> Vec<String> {
    spec.get("params")
        .and_then(Value::as_array)
        .map(|params| {
            params
                .iter()
                .filter(|p| p.get("select").is_some())
                .filter_map(|p| p.get("name").and_then(Value::as_str).map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// View returned by `SvgBarRenderer`: named signals with listeners.
pub struct SvgView {
    signals: Mutex<HashMap<String, Value>>,
    listeners: Mutex<HashMap<String, Vec<SignalListener>>>,
    mounted: Shared<BoxFuture<'static, ()>>,
}

impl SvgView {
    pub fn new(signal_names: Vec<String>, mounted: BoxFuture<'static, ()>) -> Self {
        let signals = signal_names.into_iter().map(|n| (n, Value::Null)).collect();
        Self { signals: Mutex::new(signals), listeners: Mutex::new(HashMap::new()), mounted: mounted.shared() }
    }

    fn known(&self, name: &str) -> Result<()> {
        let signals = self.signals.lock().unwrap_or_else(|e| e.into_inner());
        if signals.contains_key(name) {
            Ok(())
        } else {
            Err(Error::Other(format!("Unrecognized signal name: {}", name)))
        }
    }
}

impl ViewHandle for SvgView {
    fn add_signal_listener(&self, name: &str, listener: SignalListener) -> Result<()> {
        self.known(name)?;
        let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        listeners.entry(name.to_string()).or_default().push(listener);
        Ok(())
    }

    fn set_signal(&self, name: &str, value: Value) -> Result<()> {
        self.known(name)?;
        self.signals.lock().unwrap_or_else(|e| e.into_inner()).insert(name.to_string(), value.clone());
        let listeners = self
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
            .unwrap_or_default();
        for listener in listeners {
            listener(name, &value);
        }
        Ok(())
    }

    fn signal(&self, name: &str) -> Option<Value> {
        self.signals.lock().unwrap_or_else(|e| e.into_inner()).get(name).cloned()
    }

    fn mounted(&self) -> BoxFuture<'static, ()> {
        self.mounted.clone().boxed()
    }
}

// Attribute-friendly number: at most two decimals, no trailing zeros.
fn num(v: f64) -> String {
    let r = (v * 100.0).round() / 100.0;
    if r == 0.0 {
        "0".into()
    } else {
        format!("{}", r)
    }
}

// Tick text as a chart library prints an unformatted number.
fn raw_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

fn text_of(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
