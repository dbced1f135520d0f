use std::path::Path;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Node, Selector};

use super::{Document, DomNode, Rect, SelectorSet};
use crate::error::DomError;

/// Attribute the capture step writes with `top,left,width,height` in pixels.
pub const BBOX_ATTR: &str = "data-bbox";

static CANONICAL_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("link[rel='canonical'][href]").unwrap());
static OG_URL_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("meta[property='og:url'][content]").unwrap());

/// HTML dump of a rendered record page.
pub struct Snapshot {
    html: Html,
}

impl Snapshot {
    pub fn parse(source: &str) -> Self {
        Snapshot {
            html: Html::parse_document(source),
        }
    }

    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Ok(Self::parse(&source))
    }

    /// URL the page was captured from, if the dump recorded one.
    pub fn page_url(&self) -> Option<String> {
        let canonical = self
            .html
            .select(&CANONICAL_SEL)
            .find_map(|el| el.value().attr("href"));
        let og = || {
            self.html
                .select(&OG_URL_SEL)
                .find_map(|el| el.value().attr("content"))
        };
        canonical
            .or_else(og)
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string)
    }
}

impl Document for Snapshot {
    type Node<'a> = SnapshotNode<'a>;

    fn query_all(&self, selectors: &SelectorSet) -> Result<Vec<SnapshotNode<'_>>, DomError> {
        Ok(self.html.select(selectors.group()).map(SnapshotNode).collect())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SnapshotNode<'a>(ElementRef<'a>);

impl DomNode for SnapshotNode<'_> {
    fn tag_name(&self) -> &str {
        self.0.value().name()
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.0.value().attr(name)
    }

    fn text(&self) -> String {
        self.0.text().collect()
    }

    fn text_excluding(&self, excluded: &Selector) -> String {
        let root = self.0.id();
        let mut out = String::new();
        for node in self.0.descendants() {
            let Node::Text(text) = node.value() else {
                continue;
            };
            let inside_excluded = node
                .ancestors()
                .take_while(|a| a.id() != root)
                .filter_map(ElementRef::wrap)
                .any(|el| excluded.matches(&el));
            if !inside_excluded {
                out.push_str(text);
            }
        }
        out
    }

    fn is_visible(&self) -> bool {
        let el = self.0.value();
        if el.attr("hidden").is_some() {
            return false;
        }
        let Some(style) = el.attr("style") else {
            return true;
        };
        let compact: String = style
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        !(compact.contains("display:none") || compact.contains("visibility:hidden"))
    }

    fn bounding_box(&self) -> Result<Rect, DomError> {
        let tag = || self.tag_name().to_string();
        let raw = self
            .attribute(BBOX_ATTR)
            .ok_or_else(|| DomError::MissingGeometry { tag: tag() })?;
        let malformed = || DomError::MalformedGeometry {
            tag: tag(),
            value: raw.to_string(),
        };
        let parts = raw
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| malformed())?;
        match parts.as_slice() {
            [top, left, width, height] if parts.iter().all(|v| v.is_finite()) => {
                Ok(Rect::new(*top, *left, *width, *height))
            }
            _ => Err(malformed()),
        }
    }

    fn parent(&self) -> Option<Self> {
        self.0.parent().and_then(ElementRef::wrap).map(SnapshotNode)
    }

    fn previous_sibling(&self) -> Option<Self> {
        self.0.prev_siblings().find_map(ElementRef::wrap).map(SnapshotNode)
    }

    fn matches(&self, selector: &Selector) -> bool {
        selector.matches(&self.0)
    }

    fn select(&self, selector: &Selector) -> Vec<Self> {
        self.0.select(selector).map(SnapshotNode).collect()
    }
}
