//! Accessible-attribute helpers over a rendered chart

use crate::dom::{NodeId, SvgDocument};

pub const ROLE: &str = "role";
pub const ARIA_LABEL: &str = "aria-label";
pub const ARIA_ROLEDESCRIPTION: &str = "aria-roledescription";
pub const GRAPHICS_SYMBOL: &str = "graphics-symbol";
pub const LEGEND: &str = "legend";

/// Whether the element itself is a legend, by role or role description
pub fn is_legend(doc: &SvgDocument, id: NodeId) -> bool {
    doc.attr(id, ROLE) == Some(LEGEND) || doc.attr(id, ARIA_ROLEDESCRIPTION) == Some(LEGEND)
}

/// Whether the element is a legend or sits inside one
pub fn within_legend(doc: &SvgDocument, id: NodeId) -> bool {
    is_legend(doc, id) || doc.ancestors(id).any(|a| is_legend(doc, a))
}

/// Whether the element's accessible label mentions `marker`
pub fn label_contains(doc: &SvgDocument, id: NodeId, marker: &str) -> bool {
    doc.attr(id, ARIA_LABEL).is_some_and(|label| label.contains(marker))
}

/// One node of an exported accessibility tree
#[derive(Debug, Clone, PartialEq)]
pub struct AccessibilityNode {
    pub role: String,
    pub description: Option<String>,
    pub name: Option<String>,
    pub children: Vec<AccessibilityNode>,
}

/// Accessibility snapshot of a chart: only elements that carry a role
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AccessibilityTree {
    pub nodes: Vec<AccessibilityNode>,
}

impl AccessibilityTree {
    pub fn export(doc: &SvgDocument) -> Self {
        let nodes = match doc.root() {
            Some(root) => collect(doc, root),
            None => Vec::new(),
        };
        Self { nodes }
    }

    /// Depth-first iterator over every node
    pub fn walk(&self) -> Vec<&AccessibilityNode> {
        let mut out = Vec::new();
        let mut stack: Vec<&AccessibilityNode> = self.nodes.iter().rev().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(n.children.iter().rev());
        }
        out
    }
}

// Roleless wrappers are flattened into their parent.
fn collect(doc: &SvgDocument, id: NodeId) -> Vec<AccessibilityNode> {
    let children: Vec<AccessibilityNode> = doc.get(id).children.iter().flat_map(|c| collect(doc, *c)).collect();
    match doc.attr(id, ROLE) {
        Some(role) => vec![AccessibilityNode {
            role: role.to_string(),
            description: doc.attr(id, ARIA_ROLEDESCRIPTION).map(str::to_string),
            name: doc.attr(id, ARIA_LABEL).map(str::to_string),
            children,
        }],
        None => children,
    }
}
