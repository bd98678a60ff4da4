//! Axis label compaction.
//!
//! Chart libraries sometimes print large tick values unformatted ("200000",
//! "2e+5"). Shortly after render, such labels are rewritten in place: values
//! of a thousand or more become "200K", smaller positive values get digit
//! grouping.

use crate::clock::Clock;
use crate::dom::SvgDocument;
use crate::platform::ChartContainer;
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;

fn unformatted_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:\d+\.?\d*e\+\d+|\d{4,})$").expect("axis label regex must compile"))
}

/// `value` with thousands separators and at most three decimals, like
/// `Number.toLocaleString("en-US")`.
pub fn format_grouped(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let fixed = format!("{:.3}", value.abs());
    let (int, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac = frac.trim_end_matches('0');

    let mut out = String::new();
    if value < 0.0 && !fixed.trim_matches(|c| c == '0' || c == '.').is_empty() {
        out.push('-');
    }
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if !frac.is_empty() {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Compact form of a raw tick label, or `None` to leave it alone.
pub fn compact_label(text: &str) -> Option<String> {
    let t = text.trim();
    if !unformatted_number().is_match(t) {
        return None;
    }
    let value: f64 = t.parse().ok()?;
    if value >= 1000.0 {
        Some(format!("{}K", (value / 1000.0).round()))
    } else if value > 0.0 {
        Some(format_grouped(value))
    } else {
        None
    }
}

/// Rewrite every unformatted numeric `text` element. Returns how many changed.
pub fn compact_axis_labels(doc: &mut SvgDocument) -> usize {
    let targets: Vec<_> = doc
        .by_tag("text")
        .into_iter()
        .filter_map(|id| compact_label(&doc.get(id).text).map(|label| (id, label)))
        .collect();
    let changed = targets.len();
    for (id, label) in targets {
        doc.set_text(id, label);
    }
    changed
}

/// Wait `delay`, then compact the labels of whatever chart is mounted.
pub async fn compact_after(container: &ChartContainer, clock: &dyn Clock, delay: Duration) -> usize {
    clock.sleep(delay).await;
    let changed = container.with_document_mut(compact_axis_labels).unwrap_or(0);
    if changed > 0 {
        log::debug!("compacted {} axis labels in #{}", changed, container.id());
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::testing::RecordingClock;

    #[test]
    fn grouping() {
        assert_eq!(format_grouped(715522.0), "715,522");
        assert_eq!(format_grouped(999.5), "999.5");
        assert_eq!(format_grouped(1234567.891), "1,234,567.891");
        assert_eq!(format_grouped(0.0), "0");
        assert_eq!(format_grouped(-4200.0), "-4,200");
    }

    #[test]
    fn compaction_rules() {
        assert_eq!(compact_label("200000").as_deref(), Some("200K"));
        assert_eq!(compact_label(" 2e+5 ").as_deref(), Some("200K"));
        assert_eq!(compact_label("1500").as_deref(), Some("2K"));
        assert_eq!(compact_label("5e+2").as_deref(), Some("500"));
        assert_eq!(compact_label("0000"), None);
        assert_eq!(compact_label("250"), None);
        assert_eq!(compact_label("Denver"), None);
        assert_eq!(compact_label("1,000"), None);
    }

    #[tokio::test]
    async fn labels_rewritten_after_delay() {
        let c = ChartContainer::new("chart");
        c.mount(c.clear(), SvgDocument::parse("<svg><text>0</text><text>400000</text><text>Aurora</text></svg>"));
        let clock = RecordingClock::default();
        assert_eq!(compact_after(&c, &clock, Duration::from_millis(200)).await, 1);
        assert_eq!(*clock.slept.lock().unwrap(), vec![Duration::from_millis(200)]);
        let texts = c.with_document(|doc| doc.by_tag("text").iter().map(|id| doc.get(*id).text.clone()).collect::<Vec<_>>());
        assert_eq!(texts, Some(vec!["0".to_string(), "400K".to_string(), "Aurora".to_string()]));

        let empty = ChartContainer::new("other");
        assert_eq!(compact_after(&empty, &clock, Duration::from_millis(200)).await, 0);
    }
}
