//! Viewport and device classification

/// Viewport width at or below which the layout is treated as mobile
pub const MOBILE_MAX_WIDTH: u32 = 768;
/// Viewport width at or below which the layout is treated as small mobile
pub const SMALL_MOBILE_MAX_WIDTH: u32 = 480;

/// Viewport dimensions in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: 1280, height: 720 }
    }
}

impl Viewport {
    pub fn state(&self) -> ViewportState {
        ViewportState {
            is_mobile: self.width <= MOBILE_MAX_WIDTH,
            is_small_mobile: self.width <= SMALL_MOBILE_MAX_WIDTH,
        }
    }
}

/// Facts derived from the viewport width, recomputed on every render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportState {
    pub is_mobile: bool,
    pub is_small_mobile: bool,
}

/// Device metrics of the page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceMetrics {
    pub viewport: Viewport,
    pub dpr: f32,
    pub touch: bool,
}

impl Default for DeviceMetrics {
    fn default() -> Self {
        Self { viewport: Viewport::default(), dpr: 1.0, touch: false }
    }
}

/// Coarse device class used to tune scroll-driven animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    /// Narrow viewport or touch input
    Mobile,
    Desktop,
}

impl DeviceMetrics {
    pub fn class(&self) -> DeviceClass {
        if self.touch || self.viewport.state().is_mobile {
            DeviceClass::Mobile
        } else {
            DeviceClass::Desktop
        }
    }
}
