//! Bar animations: a time-based entrance and a scroll-linked scrub.
//!
//! Both operate on the document mounted in a `ChartContainer` and only ever
//! touch per-element transform state.

pub mod animator;
pub mod ease;
pub mod entrance;
pub mod legend;
pub mod scroll;
pub mod tween;

pub use animator::Animator;
pub use ease::Ease;
pub use entrance::{animate_entrance, prepare_bars};
pub use legend::normalize_legends;
pub use scroll::{animate_on_scroll, bar_progress, classify_bars, PinSettings, ScrollPin, ScrollPinRegistry};
pub use tween::Tween;
