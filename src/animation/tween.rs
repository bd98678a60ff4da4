use crate::animation::ease::Ease;
use crate::config::EntranceOptions;
use crate::dom::NodeId;
use std::time::Duration;

/// A staggered scale-Y tween over a fixed set of elements.
///
/// Element `i` starts `delay + i * stagger` after `started_at` and runs for
/// `duration`.
#[derive(Debug, Clone)]
pub struct Tween {
    pub targets: Vec<NodeId>,
    pub from: f64,
    pub to: f64,
    duration: f64,
    stagger: f64,
    delay: f64,
    ease: Ease,
    started_at: f64,
}

impl Tween {
    pub fn new(targets: Vec<NodeId>, opts: &EntranceOptions, from: f64, to: f64, started_at: Duration) -> Self {
        Self {
            targets,
            from,
            to,
            duration: opts.duration_secs.max(0.0),
            stagger: opts.stagger_secs.max(0.0),
            delay: opts.delay_secs.max(0.0),
            ease: opts.ease,
            started_at: started_at.as_secs_f64(),
        }
    }

    /// Value of target `index` at time `now`
    pub fn value_at(&self, index: usize, now: Duration) -> f64 {
        let local = now.as_secs_f64() - self.started_at - self.delay - self.stagger * index as f64;
        if local <= 0.0 {
            return self.from;
        }
        let t = if self.duration == 0.0 { 1.0 } else { local / self.duration };
        self.from + (self.to - self.from) * self.ease.apply(t)
    }

    /// Time at which the last target reaches `to`
    pub fn end(&self) -> Duration {
        let last = self.targets.len().saturating_sub(1) as f64;
        Duration::from_secs_f64(self.started_at + self.delay + self.stagger * last + self.duration)
    }

    pub fn is_complete(&self, now: Duration) -> bool {
        now >= self.end()
    }
}
