pub mod snapshot;

use scraper::Selector;

use crate::error::DomError;

pub use snapshot::{Snapshot, SnapshotNode};

/// Page-space bounding box of a rendered element, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Rect { top, left, width, height }
    }

    pub fn center_x(&self) -> f64 {
        self.left + self.width / 2.0
    }
}

/// An ordered list of CSS selectors, usable either as one comma group
/// (matches in document order) or one selector at a time (priority order).
#[derive(Debug)]
pub struct SelectorSet {
    patterns: Vec<&'static str>,
    group: Selector,
    ordered: Vec<Selector>,
}

impl SelectorSet {
    pub fn new(patterns: &[&'static str]) -> Result<Self, DomError> {
        let ordered = patterns
            .iter()
            .map(|p| Selector::parse(p).map_err(|_| DomError::InvalidSelector(p.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        let joined = patterns.join(", ");
        let group =
            Selector::parse(&joined).map_err(|_| DomError::InvalidSelector(joined.clone()))?;
        Ok(SelectorSet {
            patterns: patterns.to_vec(),
            group,
            ordered,
        })
    }

    pub fn group(&self) -> &Selector {
        &self.group
    }

    /// Selectors paired with their source text, in priority order.
    pub fn each(&self) -> impl Iterator<Item = (&'static str, &Selector)> + '_ {
        self.patterns.iter().copied().zip(self.ordered.iter())
    }
}

/// Read access to one element of a rendered page.
pub trait DomNode: Clone {
    /// Lowercase tag name.
    fn tag_name(&self) -> &str;
    fn attribute(&self, name: &str) -> Option<&str>;
    /// Concatenated text of every descendant text node, unnormalized.
    fn text(&self) -> String;
    /// Like [`DomNode::text`] but skipping every subtree rooted at an element
    /// matching `excluded`.
    fn text_excluding(&self, excluded: &Selector) -> String;
    fn is_visible(&self) -> bool;
    fn bounding_box(&self) -> Result<Rect, DomError>;
    fn parent(&self) -> Option<Self>;
    /// Nearest preceding sibling that is an element.
    fn previous_sibling(&self) -> Option<Self>;
    fn matches(&self, selector: &Selector) -> bool;
    /// Descendants (excluding self) matching `selector`, in document order.
    fn select(&self, selector: &Selector) -> Vec<Self>;

    fn select_first(&self, selector: &Selector) -> Option<Self> {
        self.select(selector).into_iter().next()
    }

    fn class_name(&self) -> &str {
        self.attribute("class").unwrap_or("")
    }

    fn is_body(&self) -> bool {
        self.tag_name() == "body"
    }

    /// Nearest ancestor-or-self matching any selector in the set, never
    /// climbing to or past `<body>`.
    fn closest(&self, selectors: &SelectorSet) -> Option<Self> {
        let mut current = Some(self.clone());
        while let Some(node) = current {
            if node.is_body() {
                return None;
            }
            if node.matches(selectors.group()) {
                return Some(node);
            }
            current = node.parent();
        }
        None
    }
}

/// A rendered page that can be queried as a whole.
pub trait Document {
    type Node<'a>: DomNode
    where
        Self: 'a;

    /// Every element matching the set, in document order.
    fn query_all(&self, selectors: &SelectorSet) -> Result<Vec<Self::Node<'_>>, DomError>;

    fn query(&self, selectors: &SelectorSet) -> Result<Option<Self::Node<'_>>, DomError> {
        Ok(self.query_all(selectors)?.into_iter().next())
    }
}
