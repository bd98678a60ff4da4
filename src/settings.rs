//! Process-wide feature toggles.
//!
//! `Settings` is a plain value handed to the pipeline. Each setter returns the
//! updated value together with the `Effect` the pipeline must apply, instead of
//! mutating shared state.

use crate::platform::ViewportState;

/// Feature toggles observable and settable by callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub animations_enabled: bool,
    pub mobile_animations_enabled: bool,
    pub scroll_pin_enabled: bool,
    pub smooth_scroll_enabled: bool,
    pub mobile_scroll_affordance_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            animations_enabled: true,
            mobile_animations_enabled: true,
            scroll_pin_enabled: false,
            smooth_scroll_enabled: false,
            mobile_scroll_affordance_enabled: true,
        }
    }
}

/// Side effect the pipeline applies after a toggle changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Rebuild the chart from scratch
    Rerender,
    AttachScrollPin,
    DetachScrollPin,
    StartSmoothScroll,
    StopSmoothScroll,
}

/// Result of a setter: the new settings and what to do about it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub settings: Settings,
    pub effect: Effect,
}

/// How bars should be animated for one render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationMode {
    Static,
    Entrance,
    ScrollLinked,
}

impl Settings {
    pub fn with_animations(self, enabled: bool) -> SettingsUpdate {
        let settings = Settings { animations_enabled: enabled, ..self };
        // Disabling must repaint without the hidden pre-animation state.
        let effect = if !enabled && self.animations_enabled { Effect::Rerender } else { Effect::None };
        SettingsUpdate { settings, effect }
    }

    pub fn with_mobile_animations(self, enabled: bool) -> SettingsUpdate {
        let settings = Settings { mobile_animations_enabled: enabled, ..self };
        let effect = if enabled != self.mobile_animations_enabled { Effect::Rerender } else { Effect::None };
        SettingsUpdate { settings, effect }
    }

    /// Enabling attaches to the current chart without a re-render.
    pub fn with_scroll_pin(self, enabled: bool) -> SettingsUpdate {
        let settings = Settings { scroll_pin_enabled: enabled, ..self };
        let effect = match (self.scroll_pin_enabled, enabled) {
            (false, true) => Effect::AttachScrollPin,
            (true, false) => Effect::DetachScrollPin,
            _ => Effect::None,
        };
        SettingsUpdate { settings, effect }
    }

    pub fn with_smooth_scroll(self, enabled: bool) -> SettingsUpdate {
        let settings = Settings { smooth_scroll_enabled: enabled, ..self };
        let effect = match (self.smooth_scroll_enabled, enabled) {
            (false, true) => Effect::StartSmoothScroll,
            (true, false) => Effect::StopSmoothScroll,
            _ => Effect::None,
        };
        SettingsUpdate { settings, effect }
    }

    pub fn with_mobile_scroll_affordance(self, enabled: bool) -> SettingsUpdate {
        SettingsUpdate {
            settings: Settings { mobile_scroll_affordance_enabled: enabled, ..self },
            effect: Effect::None,
        }
    }

    /// Pick the animation mode for the given viewport.
    pub fn animation_mode(&self, viewport: ViewportState) -> AnimationMode {
        if !self.animations_enabled || (viewport.is_mobile && !self.mobile_animations_enabled) {
            AnimationMode::Static
        } else if self.scroll_pin_enabled {
            AnimationMode::ScrollLinked
        } else {
            AnimationMode::Entrance
        }
    }

    /// Whether the container should offer horizontal scrolling.
    pub fn scroll_affordance(&self, viewport: ViewportState) -> bool {
        viewport.is_mobile && self.mobile_scroll_affordance_enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESKTOP: ViewportState = ViewportState { is_mobile: false, is_small_mobile: false };
    const MOBILE: ViewportState = ViewportState { is_mobile: true, is_small_mobile: false };

    #[test]
    fn disabling_animations_rerenders() {
        let up = Settings::default().with_animations(false);
        assert_eq!(up.effect, Effect::Rerender);
        assert!(!up.settings.animations_enabled);
        assert_eq!(up.settings.with_animations(false).effect, Effect::None);
    }

    #[test]
    fn enabling_scroll_pin_does_not_rerender() {
        let up = Settings::default().with_scroll_pin(true);
        assert_eq!(up.effect, Effect::AttachScrollPin);
        assert_eq!(up.settings.with_scroll_pin(false).effect, Effect::DetachScrollPin);
    }

    #[test]
    fn modes_are_mutually_exclusive() {
        let s = Settings::default();
        assert_eq!(s.animation_mode(DESKTOP), AnimationMode::Entrance);
        let s = s.with_scroll_pin(true).settings;
        assert_eq!(s.animation_mode(DESKTOP), AnimationMode::ScrollLinked);
        let s = s.with_mobile_animations(false).settings;
        assert_eq!(s.animation_mode(MOBILE), AnimationMode::Static);
        assert_eq!(s.animation_mode(DESKTOP), AnimationMode::ScrollLinked);
    }

    #[test]
    fn affordance_only_on_mobile() {
        let s = Settings::default();
        assert!(s.scroll_affordance(MOBILE));
        assert!(!s.scroll_affordance(DESKTOP));
        assert!(!s.with_mobile_scroll_affordance(false).settings.scroll_affordance(MOBILE));
    }
}
