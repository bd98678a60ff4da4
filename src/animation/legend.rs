//! Keeps the legend out of scroll-driven transforms.

use crate::dom::{NodeId, Style, SvgDocument};
use crate::platform::accessibility::is_legend;

fn is_gradient(doc: &SvgDocument, id: NodeId) -> bool {
    let el = doc.get(id);
    el.tag.to_ascii_lowercase().ends_with("gradient")
        || el.attr("id").is_some_and(|v| v.contains("gradient"))
        || el.attr("class").is_some_and(|v| v.contains("gradient"))
}

/// Reset every legend and legend-gradient element, and their descendants,
/// to an identity transform. Returns the number of elements touched.
pub fn normalize_legends(doc: &mut SvgDocument) -> usize {
    let view: &SvgDocument = doc;
    let mut touched: Vec<NodeId> = Vec::new();
    for root in view.select(|id, _| is_legend(view, id) || is_gradient(view, id)) {
        touched.push(root);
        touched.extend(view.descendants(root));
    }
    touched.sort();
    touched.dedup();
    for id in &touched {
        doc.set_style(*id, Style::default());
    }
    touched.len()
}
