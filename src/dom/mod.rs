//! Headless, mutable view of a rendered SVG chart.
//!
//! Renderer markup is parsed once with `scraper` and copied into an owned
//! element arena, so animation code can read accessible attributes, measure
//! elements and adjust per-element transform state.

pub mod path;

use scraper::{Html, Node, Selector};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt::Write as _;

pub use path::{path_bbox, BBox};

/// Index of an element in a `SvgDocument`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

/// Transform origin, as fractions of the element's box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformOrigin {
    pub x: f64,
    pub y: f64,
}

impl TransformOrigin {
    pub const BOTTOM_CENTER: TransformOrigin = TransformOrigin { x: 0.5, y: 1.0 };
    pub const CENTER: TransformOrigin = TransformOrigin { x: 0.5, y: 0.5 };
}

/// Animated transform state of one element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Style {
    pub scale_x: f64,
    pub scale_y: f64,
    pub origin: Option<TransformOrigin>,
}

impl Default for Style {
    fn default() -> Self {
        Self { scale_x: 1.0, scale_y: 1.0, origin: None }
    }
}

impl Style {
    pub fn is_identity(&self) -> bool {
        self.scale_x == 1.0 && self.scale_y == 1.0
    }

    fn css(&self) -> Option<String> {
        if self.is_identity() && self.origin.is_none() {
            return None;
        }
        let mut css = format!("transform: scale({}, {});", fmt_num(self.scale_x), fmt_num(self.scale_y));
        if let Some(o) = self.origin {
            let _ = write!(css, " transform-origin: {}% {}%;", fmt_num(o.x * 100.0), fmt_num(o.y * 100.0));
        }
        Some(css)
    }
}

#[derive(Debug, Clone)]
pub struct Element {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    /// Direct text content
    pub text: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub style: Style,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }
}

/// An SVG tree held in document order
#[derive(Debug, Clone, Default)]
pub struct SvgDocument {
    nodes: Vec<Element>,
}

impl SvgDocument {
    /// Parse renderer output. Only the first `<svg>` subtree is kept; markup
    /// without one yields an empty document.
    pub fn parse(markup: &str) -> Self {
        let fragment = Html::parse_fragment(markup);
        let mut doc = SvgDocument::default();
        let Ok(svg_sel) = Selector::parse("svg") else {
            return doc;
        };
        if let Some(svg) = fragment.select(&svg_sel).next() {
            doc.copy_subtree(svg, None);
        }
        doc
    }

    fn copy_subtree(&mut self, el: scraper::ElementRef<'_>, parent: Option<NodeId>) {
        let id = NodeId(self.nodes.len());
        let text = el
            .children()
            .filter_map(|n| match n.value() {
                Node::Text(t) => Some((**t).to_string()),
                _ => None,
            })
            .collect::<String>();
        self.nodes.push(Element {
            tag: el.value().name().to_string(),
            attrs: el.value().attrs().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            text,
            parent,
            children: Vec::new(),
            style: Style::default(),
        });
        if let Some(p) = parent {
            self.nodes[p.0].children.push(id);
        }
        for child in el.children().filter_map(scraper::ElementRef::wrap) {
            self.copy_subtree(child, Some(id));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn root(&self) -> Option<NodeId> {
        (!self.nodes.is_empty()).then_some(NodeId(0))
    }

    pub fn get(&self, id: NodeId) -> &Element {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Element {
        &mut self.nodes[id.0]
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.get(id).attr(name)
    }

    /// All elements in document order
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Elements matching `pred`, in document order
    pub fn select<F>(&self, pred: F) -> Vec<NodeId>
    where
        F: Fn(NodeId, &Element) -> bool,
    {
        self.ids().filter(|id| pred(*id, self.get(*id))).collect()
    }

    pub fn by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.select(|_, el| el.tag.eq_ignore_ascii_case(tag))
    }

    /// Parent chain, nearest first
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.get(id).parent, move |p| self.get(*p).parent)
    }

    /// All descendants in document order, excluding `id` itself
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.get(id).children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.get(next).children.iter().rev().copied());
        }
        out
    }

    /// Unscaled geometric box, if the element has one
    pub fn bbox(&self, id: NodeId) -> Option<BBox> {
        let el = self.get(id);
        match el.tag.as_str() {
            "path" => path_bbox(el.attr("d")?),
            "rect" => {
                let num = |k: &str| el.attr(k).and_then(|v| v.trim().parse::<f64>().ok());
                let x = num("x").unwrap_or(0.0);
                let y = num("y").unwrap_or(0.0);
                Some(BBox { min_x: x, min_y: y, max_x: x + num("width")?, max_y: y + num("height")? })
            }
            _ => None,
        }
    }

    /// On-screen width after the element's own horizontal scale
    pub fn rendered_width(&self, id: NodeId) -> f64 {
        self.bbox(id).map(|b| b.width() * self.get(id).style.scale_x.abs()).unwrap_or(0.0)
    }

    pub fn style(&self, id: NodeId) -> Style {
        self.get(id).style
    }

    pub fn set_style(&mut self, id: NodeId, style: Style) {
        self.get_mut(id).style = style;
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        self.get_mut(id).text = text.into();
    }

    /// Serialize back to markup, folding transform state into `style`.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        if let Some(root) = self.root() {
            self.write_element(root, &mut out);
        }
        out
    }

    fn write_element(&self, id: NodeId, out: &mut String) {
        let el = self.get(id);
        out.push('<');
        out.push_str(&el.tag);
        let style_css = el.style.css();
        for (k, v) in &el.attrs {
            if k == "style" && style_css.is_some() {
                continue;
            }
            let _ = write!(out, " {}=\"{}\"", k, escape_xml(v));
        }
        if let Some(css) = style_css {
            let merged = match el.attr("style") {
                Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim_end(), css),
                _ => css,
            };
            let _ = write!(out, " style=\"{}\"", escape_xml(&merged));
        }
        if el.children.is_empty() && el.text.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        out.push_str(&escape_xml(&el.text));
        for child in &el.children {
            self.write_element(*child, out);
        }
        let _ = write!(out, "</{}>", el.tag);
    }

    /// Hex SHA-256 of the serialized markup, for golden comparisons.
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(self.to_markup().as_bytes()))
    }
}

pub(crate) fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn fmt_num(v: f64) -> String {
    let rounded = (v * 10000.0).round() / 10000.0;
    if rounded == rounded.trunc() {
        format!("{}", rounded as i64)
    } else {
        format!("{}", rounded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKUP: &str = r#"<div><svg width="100" height="50">
        <g role="graphics-object" aria-roledescription="legend">
          <path d="M0,0h40v8h-40Z" fill="url(#g)"/>
        </g>
        <g><path role="graphics-symbol" aria-label="name: A; pop: 10" d="M0,50h20v-50h-20Z"/>
        <rect x="1" y="2" width="5" height="6"/><text>1000</text></g>
    </svg></div>"#;

    #[test]
    fn parses_svg_subtree_in_document_order() {
        let doc = SvgDocument::parse(MARKUP);
        let root = doc.root().unwrap();
        assert_eq!(doc.get(root).tag, "svg");
        let paths = doc.by_tag("path");
        assert_eq!(paths.len(), 2);
        assert_eq!(doc.attr(paths[1], "role"), Some("graphics-symbol"));
        let texts = doc.by_tag("text");
        assert_eq!(doc.get(texts[0]).text, "1000");
    }

    #[test]
    fn markup_without_svg_is_empty() {
        assert!(SvgDocument::parse("<p>Error</p>").is_empty());
    }

    #[test]
    fn width_follows_horizontal_scale_only() {
        let mut doc = SvgDocument::parse(MARKUP);
        let bar = doc.by_tag("path")[1];
        assert_eq!(doc.rendered_width(bar), 20.0);
        doc.set_style(bar, Style { scale_y: 0.0, ..Style::default() });
        assert_eq!(doc.rendered_width(bar), 20.0);
        doc.set_style(bar, Style { scale_x: 0.25, ..Style::default() });
        assert_eq!(doc.rendered_width(bar), 5.0);
        let rect = doc.by_tag("rect")[0];
        assert_eq!(doc.rendered_width(rect), 5.0);
    }

    #[test]
    fn ancestors_and_descendants() {
        let doc = SvgDocument::parse(MARKUP);
        let legend_path = doc.by_tag("path")[0];
        let chain: Vec<_> = doc.ancestors(legend_path).map(|id| doc.get(id).tag.clone()).collect();
        assert_eq!(chain, vec!["g", "svg"]);
        let root = doc.root().unwrap();
        assert_eq!(doc.descendants(root).len(), doc.len() - 1);
    }

    #[test]
    fn style_is_serialized() {
        let mut doc = SvgDocument::parse(MARKUP);
        let bar = doc.by_tag("path")[1];
        let before = doc.digest();
        doc.set_style(bar, Style { scale_y: 0.5, origin: Some(TransformOrigin::BOTTOM_CENTER), ..Style::default() });
        let markup = doc.to_markup();
        assert!(markup.contains("transform: scale(1, 0.5); transform-origin: 50% 100%;"));
        assert_ne!(doc.digest(), before);
    }
}
