//! Time-based entrance animation: bars grow from the baseline with a stagger.

use crate::animation::animator::Animator;
use crate::animation::scroll::POPULATION_MARKER;
use crate::animation::tween::Tween;
use crate::clock::Clock;
use crate::config::EntranceOptions;
use crate::dom::{NodeId, Style, SvgDocument, TransformOrigin};
use crate::platform::accessibility::{label_contains, within_legend};
use crate::platform::ChartContainer;
use crate::readiness::{wait_for, RetrySchedule};

/// Marks narrower than this are treated as degenerate and left alone.
pub const MIN_BAR_WIDTH: f64 = 10.0;

/// Data bar paths wide enough to animate, in document order.
///
/// A bar's accessible label mentions its population; legend swatches and
/// gradients are never bars however wide they are.
pub fn find_bars(doc: &SvgDocument) -> Vec<NodeId> {
    doc.by_tag("path")
        .into_iter()
        .filter(|id| {
            doc.rendered_width(*id) > MIN_BAR_WIDTH
                && label_contains(doc, *id, POPULATION_MARKER)
                && !within_legend(doc, *id)
        })
        .collect()
}

/// Put `bars` in their pre-animation state: collapsed onto the baseline.
pub fn hide_bars(doc: &mut SvgDocument, bars: &[NodeId]) {
    for id in bars {
        let style = doc.style(*id);
        doc.set_style(*id, Style { scale_y: 0.0, origin: Some(TransformOrigin::BOTTOM_CENTER), ..style });
    }
}

fn probe_bars(container: &ChartContainer) -> Option<Vec<NodeId>> {
    container.with_document(find_bars).filter(|bars| !bars.is_empty())
}

/// Hide bars as soon as they appear so they never flash at full height.
///
/// Returns false when no bars showed up within `schedule`.
pub async fn prepare_bars(container: &ChartContainer, clock: &dyn Clock, schedule: &RetrySchedule) -> bool {
    match wait_for(clock, schedule, || probe_bars(container)).await {
        Some(bars) => container.with_document_mut(|doc| hide_bars(doc, &bars)).is_some(),
        None => false,
    }
}

/// Find the bars and grow them from 0 to full height.
///
/// Each call starts over from the current document: bars are collapsed again
/// and the tween replaces whatever the animator was running. Gives up quietly
/// if the renderer never produced bars, leaving a static chart.
pub async fn animate_entrance(
    container: &ChartContainer,
    animator: &Animator,
    clock: &dyn Clock,
    schedule: &RetrySchedule,
    opts: &EntranceOptions,
) -> bool {
    let Some(bars) = wait_for(clock, schedule, || probe_bars(container)).await else {
        return false;
    };
    if container.with_document_mut(|doc| hide_bars(doc, &bars)).is_none() {
        return false;
    }
    log::debug!("animating {} bars", bars.len());
    animator.play(container.clone(), Tween::new(bars, opts, 0.0, 1.0, clock.now()));
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TokioClock;
    use std::sync::Arc;
    use std::time::Duration;

    const CHART: &str = r#"<svg>
        <g aria-roledescription="axis"><path d="M0,0h1v200"/></g>
        <path aria-label="name: A; pop: 30" d="M0,100h30v-100h-30Z"/>
        <path aria-label="name: B; pop: 20" d="M40,100h30v-60h-30Z"/>
        <path aria-label="name: C; pop: 5" d="M80,100h5v-20h-5Z"/>
        <path d="M90,100h40v-10h-40Z"/>
        <g aria-roledescription="legend"><path class="gradient" aria-label="pop: key" d="M0,0h16v200h-16Z"/></g>
    </svg>"#;

    fn mounted() -> ChartContainer {
        let c = ChartContainer::new("chart");
        let epoch = c.clear();
        c.mount(epoch, SvgDocument::parse(CHART));
        c
    }

    fn scales(c: &ChartContainer) -> Vec<f64> {
        c.with_document(|doc| find_bars(doc).iter().map(|id| doc.style(*id).scale_y).collect()).unwrap()
    }

    #[test]
    fn only_labelled_data_paths_are_bars() {
        let doc = SvgDocument::parse(CHART);
        let bars = find_bars(&doc);
        assert_eq!(bars.len(), 2);
        assert!(bars.iter().all(|id| !within_legend(&doc, *id)));
    }

    #[tokio::test(start_paused = true)]
    async fn legend_gradient_is_left_alone() {
        let clock: Arc<dyn Clock> = Arc::new(TokioClock::new());
        let animator = Animator::new(clock.clone(), Duration::from_millis(16));
        let c = mounted();
        let schedule = RetrySchedule::from_millis(&[0]);

        assert!(prepare_bars(&c, clock.as_ref(), &schedule).await);
        assert!(animate_entrance(&c, &animator, clock.as_ref(), &schedule, &EntranceOptions::default()).await);
        let gradient = c
            .with_document(|doc| doc.select(|_, el| el.attr("class") == Some("gradient")).into_iter().map(|id| doc.style(id)).collect::<Vec<_>>())
            .unwrap();
        assert_eq!(gradient, vec![Style::default()]);
    }

    #[tokio::test(start_paused = true)]
    async fn bars_grow_to_full_height() {
        let clock: Arc<dyn Clock> = Arc::new(TokioClock::new());
        let animator = Animator::new(clock.clone(), Duration::from_millis(16));
        let c = mounted();
        let schedule = RetrySchedule::from_millis(&[0, 20, 50]);

        assert!(animate_entrance(&c, &animator, clock.as_ref(), &schedule, &EntranceOptions::default()).await);
        assert_eq!(scales(&c), vec![0.0, 0.0]);
        animator.settle().await;
        assert_eq!(scales(&c), vec![1.0, 1.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn second_call_restarts_instead_of_stacking() {
        let clock: Arc<dyn Clock> = Arc::new(TokioClock::new());
        let animator = Animator::new(clock.clone(), Duration::from_millis(16));
        let schedule = RetrySchedule::from_millis(&[0, 20, 50]);
        let opts = EntranceOptions::default();

        let once = mounted();
        animate_entrance(&once, &animator, clock.as_ref(), &schedule, &opts).await;
        animator.settle().await;

        let twice = mounted();
        animate_entrance(&twice, &animator, clock.as_ref(), &schedule, &opts).await;
        clock.sleep(Duration::from_millis(400)).await;
        animate_entrance(&twice, &animator, clock.as_ref(), &schedule, &opts).await;
        assert_eq!(scales(&twice), vec![0.0, 0.0]);
        animator.settle().await;

        let final_once = once.with_document(SvgDocument::to_markup).unwrap();
        let final_twice = twice.with_document(SvgDocument::to_markup).unwrap();
        assert_eq!(final_once, final_twice);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_container_gives_up_quietly() {
        let clock: Arc<dyn Clock> = Arc::new(TokioClock::new());
        let animator = Animator::new(clock.clone(), Duration::from_millis(16));
        let c = ChartContainer::new("chart");
        let schedule = RetrySchedule::from_millis(&[0, 20, 50]);
        assert!(!prepare_bars(&c, clock.as_ref(), &RetrySchedule::from_millis(&[0, 10])).await);
        assert!(!animate_entrance(&c, &animator, clock.as_ref(), &schedule, &EntranceOptions::default()).await);
        assert!(!animator.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn late_mount_is_found_on_retry() {
        let clock: Arc<dyn Clock> = Arc::new(TokioClock::new());
        let c = ChartContainer::new("chart");
        let epoch = c.clear();
        let late = c.clone();
        let mount_clock = clock.clone();
        tokio::spawn(async move {
            mount_clock.sleep(Duration::from_millis(30)).await;
            late.mount(epoch, SvgDocument::parse(CHART));
        });
        let schedule = RetrySchedule::from_millis(&[0, 20, 50]);
        let animator = Animator::new(clock.clone(), Duration::from_millis(16));
        assert!(animate_entrance(&c, &animator, clock.as_ref(), &schedule, &EntranceOptions::default()).await);
    }
}
