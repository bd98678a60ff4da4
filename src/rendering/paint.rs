//! Fill colors for the quantitative color channel

/// An sRGB color
pub type Rgb = (u8, u8, u8);

// Sequential ramp, low to high.
const RAMP: [Rgb; 5] = [(68, 1, 84), (59, 82, 139), (33, 145, 140), (94, 201, 98), (253, 231, 37)];

/// Color at `t` in [0, 1] along the sequential ramp. Out-of-range input clamps.
pub fn ramp(t: f64) -> Rgb {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let scaled = t * (RAMP.len() - 1) as f64;
    let i = (scaled.floor() as usize).min(RAMP.len() - 2);
    let f = scaled - i as f64;
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * f).round() as u8;
    let (a, b) = (RAMP[i], RAMP[i + 1]);
    (lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
}

pub fn hex(c: Rgb) -> String {
    format!("#{:02x}{:02x}{:02x}", c.0, c.1, c.2)
}

/// Maps a value domain onto the ramp
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    pub min: f64,
    pub max: f64,
}

impl ColorScale {
    /// Domain spanning the finite values in `values`; empty input gives [0, 1].
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let (min, max) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if min > max {
            Self { min: 0.0, max: 1.0 }
        } else {
            Self { min, max }
        }
    }

    pub fn color(&self, value: f64) -> String {
        let span = self.max - self.min;
        let t = if span > 0.0 { (value - self.min) / span } else { 0.5 };
        hex(ramp(t))
    }

    /// Gradient stops for the legend swatch, as (offset, color)
    pub fn stops(&self, count: usize) -> Vec<(f64, String)> {
        let count = count.max(2);
        (0..count)
            .map(|i| {
                let t = i as f64 / (count - 1) as f64;
                (t, hex(ramp(t)))
            })
            .collect()
    }
}
