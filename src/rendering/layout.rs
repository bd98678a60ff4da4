//! Plot geometry for the bar chart: frame rectangles and the two scales bars
//! are placed with.

/// Axis-aligned rectangle in chart pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// Where the color legend sits relative to the plot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendPlacement {
    Right,
    Bottom,
}

impl LegendPlacement {
    /// Vega-Lite `orient` value; anything but "bottom" places the legend right.
    pub fn from_orient(orient: Option<&str>) -> Self {
        match orient {
            Some("bottom") => LegendPlacement::Bottom,
            _ => LegendPlacement::Right,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartLayout {
    pub plot: Rect,
    pub legend: Rect,
    pub placement: LegendPlacement,
}

const LEFT_GUTTER: f64 = 64.0;
const TOP_GUTTER: f64 = 32.0;
const LEGEND_BREADTH: f64 = 16.0;
const LEGEND_GAP: f64 = 24.0;

/// Split a `width` x `height` canvas into plot and legend areas.
///
/// Rotated category labels need room below the plot, roughly eight glyphs at
/// `label_font_size`.
pub fn layout_chart(width: f64, height: f64, placement: LegendPlacement, label_font_size: f64) -> ChartLayout {
    let label_band = label_font_size * 8.0;
    let (plot, legend) = match placement {
        LegendPlacement::Right => {
            let plot = Rect {
                x: LEFT_GUTTER,
                y: TOP_GUTTER,
                width: (width - LEFT_GUTTER - LEGEND_GAP * 2.0 - LEGEND_BREADTH - 40.0).max(0.0),
                height: (height - TOP_GUTTER - label_band).max(0.0),
            };
            let legend = Rect {
                x: plot.right() + LEGEND_GAP,
                y: plot.y,
                width: LEGEND_BREADTH,
                height: plot.height.min(200.0),
            };
            (plot, legend)
        }
        LegendPlacement::Bottom => {
            let plot = Rect {
                x: LEFT_GUTTER,
                y: TOP_GUTTER,
                width: (width - LEFT_GUTTER - 16.0).max(0.0),
                height: (height - TOP_GUTTER - label_band - LEGEND_GAP * 2.0 - LEGEND_BREADTH).max(0.0),
            };
            let legend = Rect {
                x: plot.x,
                y: plot.bottom() + label_band + LEGEND_GAP,
                width: plot.width.min(200.0),
                height: LEGEND_BREADTH,
            };
            (plot, legend)
        }
    };
    ChartLayout { plot, legend, placement }
}

/// Evenly spaced bands with inner padding, like a Vega band scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandScale {
    pub count: usize,
    pub start: f64,
    pub end: f64,
    /// Fraction of each step left empty
    pub padding: f64,
}

impl BandScale {
    pub fn new(count: usize, start: f64, end: f64) -> Self {
        Self { count, start, end, padding: 0.1 }
    }

    pub fn step(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            (self.end - self.start) / self.count as f64
        }
    }

    pub fn bandwidth(&self) -> f64 {
        self.step() * (1.0 - self.padding)
    }

    /// Left edge of band `index`
    pub fn position(&self, index: usize) -> f64 {
        self.start + self.step() * index as f64 + self.step() * self.padding / 2.0
    }
}

/// Zero-based linear scale with a "nice" upper bound.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearScale {
    pub max: f64,
    /// Pixel position of zero
    pub bottom: f64,
    /// Pixel position of `max`
    pub top: f64,
    step: f64,
}

impl LinearScale {
    pub fn new(data_max: f64, bottom: f64, top: f64, tick_count: usize) -> Self {
        let data_max = if data_max.is_finite() && data_max > 0.0 { data_max } else { 1.0 };
        let step = tick_step(data_max, tick_count.max(1));
        let max = (data_max / step).ceil() * step;
        Self { max, bottom, top, step }
    }

    pub fn map(&self, value: f64) -> f64 {
        self.bottom - (value / self.max) * (self.bottom - self.top)
    }

    pub fn ticks(&self) -> Vec<f64> {
        let n = (self.max / self.step).round() as usize;
        (0..=n).map(|i| i as f64 * self.step).collect()
    }
}

// 1, 2 or 5 times a power of ten, as d3 picks tick steps.
fn tick_step(span: f64, count: usize) -> f64 {
    let raw = span / count as f64;
    let power = 10f64.powf(raw.log10().floor());
    let err = raw / power;
    let factor = if err >= 50f64.sqrt() {
        10.0
    } else if err >= 10f64.sqrt() {
        5.0
    } else if err >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    power * factor
}
