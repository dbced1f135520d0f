use std::cell::OnceCell;
use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::dictionaries::{default_section_for, lookup_section_key, UNCLASSIFIED};
use super::selectors::SECTION_TITLES;
use super::text::{camelize, normalize_label, normalize_text};
use crate::dom::{Document, DomNode, Rect};
use crate::error::DomError;

static PARENTHETICAL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\([^)]*\)").unwrap());
static FULLWIDTH_PARENTHETICAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"（[^）]*）").unwrap());

const MAX_ANCESTOR_DEPTH: usize = 15;
const MAX_SIBLING_HOPS: usize = 3;
/// Headings may sit slightly below a field's top edge and still own it.
const ABOVE_TOLERANCE_PX: f64 = 8.0;

/// A visible section heading with its page position.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingEntry {
    pub title: String,
    pub key: String,
    pub bounds: Rect,
    pub center_x: f64,
    pub top: f64,
}

/// Resolves the section title owning an element for the duration of one
/// extraction pass. The geometric heading list is collected on first use
/// and discarded with the resolver.
pub struct SectionResolver<'d, D: Document> {
    doc: &'d D,
    headings: OnceCell<Vec<HeadingEntry>>,
}

impl<'d, D: Document> SectionResolver<'d, D> {
    pub fn new(doc: &'d D) -> Self {
        SectionResolver {
            doc,
            headings: OnceCell::new(),
        }
    }

    pub fn headings(&self) -> &[HeadingEntry] {
        self.headings.get_or_init(|| {
            let headings = collect_headings(self.doc);
            debug!(count = headings.len(), "heading cache built");
            headings
        })
    }

    /// Ancestor search first, page geometry second. Empty when neither finds
    /// a heading; an error only when the element's geometry is unreadable.
    pub fn resolve_title<N: DomNode>(&self, el: &N) -> Result<String, DomError> {
        let title = find_nearest_heading(el);
        if !title.is_empty() {
            return Ok(title);
        }
        self.title_by_geometry(el)
    }

    fn title_by_geometry<N: DomNode>(&self, el: &N) -> Result<String, DomError> {
        let headings = self.headings();
        if headings.is_empty() {
            return Ok(String::new());
        }
        let bounds = match el.bounding_box() {
            Ok(bounds) => bounds,
            Err(DomError::MissingGeometry { .. }) => return Ok(String::new()),
            Err(e) => return Err(e),
        };
        Ok(nearest_heading_by_geometry(headings, bounds)
            .map(|h| h.title.clone())
            .unwrap_or_default())
    }
}

/// Walk up from `el` looking for a labelled region, a heading inside an
/// ancestor, or a heading in one of the ancestor's preceding siblings.
pub fn find_nearest_heading<N: DomNode>(el: &N) -> String {
    let mut current = Some(el.clone());
    for _ in 0..MAX_ANCESTOR_DEPTH {
        let Some(node) = current else { break };
        if node.is_body() {
            break;
        }
        if let Some(title) = region_label(&node)
            .or_else(|| heading_within(&node))
            .or_else(|| heading_in_preceding_siblings(&node))
        {
            return title;
        }
        current = node.parent();
    }
    String::new()
}

fn region_label<N: DomNode>(node: &N) -> Option<String> {
    node.attribute("aria-label")
        .filter(|a| !a.is_empty())
        .or_else(|| node.attribute("data-label"))
        .map(normalize_text)
        .filter(|t| !t.is_empty())
}

fn visible_title<N: DomNode>(node: &N) -> Option<String> {
    if !node.is_visible() {
        return None;
    }
    let text = normalize_text(&node.text());
    (!text.is_empty()).then_some(text)
}

fn heading_within<N: DomNode>(node: &N) -> Option<String> {
    SECTION_TITLES
        .each()
        .find_map(|(_, selector)| node.select_first(selector).and_then(|h| visible_title(&h)))
}

fn heading_in_preceding_siblings<N: DomNode>(node: &N) -> Option<String> {
    let mut sibling = node.previous_sibling();
    for _ in 0..MAX_SIBLING_HOPS {
        let sib = sibling?;
        for (_, selector) in SECTION_TITLES.each() {
            let heading = if sib.matches(selector) {
                Some(sib.clone())
            } else {
                sib.select_first(selector)
            };
            if let Some(title) = heading.and_then(|h| visible_title(&h)) {
                return Some(title);
            }
        }
        sibling = sib.previous_sibling();
    }
    None
}

/// Every visible heading on the page, deduplicated by key and rounded
/// position, ordered top to bottom then left to right.
pub fn collect_headings<D: Document>(doc: &D) -> Vec<HeadingEntry> {
    let nodes = match doc.query_all(&SECTION_TITLES) {
        Ok(nodes) => nodes,
        Err(e) => {
            debug!(error = %e, "heading query failed");
            return Vec::new();
        }
    };
    let mut seen = HashSet::new();
    let mut headings = Vec::new();
    for node in nodes {
        match heading_entry(&node) {
            Ok(Some(entry)) => {
                let signature = format!(
                    "{}@{}@{}",
                    entry.key,
                    entry.top.round(),
                    entry.bounds.left.round()
                );
                if seen.insert(signature) {
                    headings.push(entry);
                }
            }
            Ok(None) => {}
            Err(e) => debug!(error = %e, "heading skipped"),
        }
    }
    headings.sort_by(|a, b| {
        a.top
            .total_cmp(&b.top)
            .then(a.center_x.total_cmp(&b.center_x))
    });
    headings
}

fn heading_entry<N: DomNode>(node: &N) -> Result<Option<HeadingEntry>, DomError> {
    if !node.is_visible() {
        return Ok(None);
    }
    let raw = match node.attribute("title").filter(|t| !t.trim().is_empty()) {
        Some(title) => title.to_string(),
        None => node.text(),
    };
    let title = normalize_section_title(&raw);
    if title.is_empty() {
        return Ok(None);
    }
    let bounds = node.bounding_box()?;
    Ok(Some(HeadingEntry {
        key: camelize(&title),
        center_x: bounds.center_x(),
        top: bounds.top,
        bounds,
        title,
    }))
}

/// Closest heading above (or just below) `field`: vertical gap counts
/// double, horizontal offset between centers counts once. Ties keep the
/// earlier heading.
pub fn nearest_heading_by_geometry(
    headings: &[HeadingEntry],
    field: Rect,
) -> Option<&HeadingEntry> {
    let ref_top = field.top;
    let ref_cx = field.center_x();
    headings
        .iter()
        .filter(|h| h.top <= ref_top + ABOVE_TOLERANCE_PX)
        .map(|h| {
            let dy = (ref_top - h.top).max(0.0);
            let dx = (h.center_x - ref_cx).abs();
            (dy * 2.0 + dx, h)
        })
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, h)| h)
}

/// Strip parenthetical qualifiers such as `(DRI: Submitter)`. Titles made
/// only of a qualifier are kept whole.
pub fn normalize_section_title(title: &str) -> String {
    let stripped = PARENTHETICAL_RE.replace_all(title, "");
    let stripped = FULLWIDTH_PARENTHETICAL_RE.replace_all(&stripped, "");
    let cleaned = normalize_text(&stripped);
    if cleaned.is_empty() {
        normalize_text(title)
    } else {
        cleaned
    }
}

/// Canonical key for a heading title; `other` when the title is empty.
pub fn section_key_for_title(title: &str) -> String {
    let normalized = normalize_label(&normalize_section_title(title));
    if normalized.is_empty() {
        return UNCLASSIFIED.to_string();
    }
    if let Some(key) = lookup_section_key(&normalized) {
        return key.to_string();
    }
    let key = camelize(&normalized);
    if key.is_empty() {
        UNCLASSIFIED.to_string()
    } else {
        key
    }
}

/// Section a field lands in: its heading when that names a section,
/// otherwise the field's default section, otherwise `other`.
pub fn resolve_section_key(title_hint: &str, field_key: &str) -> String {
    let key = section_key_for_title(title_hint);
    if key == UNCLASSIFIED {
        if let Some(section) = default_section_for(field_key) {
            return section.to_string();
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{SelectorSet, Snapshot};

    fn heading(title: &str, top: f64, left: f64, width: f64) -> HeadingEntry {
        let bounds = Rect::new(top, left, width, 20.0);
        HeadingEntry {
            title: title.to_string(),
            key: camelize(title),
            center_x: bounds.center_x(),
            top,
            bounds,
        }
    }

    fn first<'a>(snap: &'a Snapshot, selector: &'static str) -> crate::dom::SnapshotNode<'a> {
        let set = SelectorSet::new(&[selector]).unwrap();
        snap.query(&set).unwrap().unwrap()
    }

    #[test]
    fn title_normalization() {
        assert_eq!(normalize_section_title("General (DRI: Submitter)"), "General");
        assert_eq!(normalize_section_title("Funding（内部）"), "Funding");
        assert_eq!(normalize_section_title("  Budget   and Payments "), "Budget and Payments");
        assert_eq!(normalize_section_title("(DRI: Submitter)"), "(DRI: Submitter)");
    }

    #[test]
    fn section_keys() {
        assert_eq!(section_key_for_title("General (DRI: Submitter)"), "general");
        assert_eq!(section_key_for_title("Budget & Payments"), "budgetAndPayments");
        assert_eq!(section_key_for_title("Discounts and Fees"), "discountsAndFees");
        assert_eq!(section_key_for_title("Campaign Timeline"), "campaignTimeline");
        assert_eq!(section_key_for_title(""), "other");
        assert_eq!(section_key_for_title("???"), "other");
    }

    #[test]
    fn fallback_to_default_section() {
        assert_eq!(resolve_section_key("", "startDate"), "general");
        assert_eq!(resolve_section_key("", "dailyBudgetCap"), "budgetAndPayments");
        assert_eq!(resolve_section_key("", "mysteryField"), "other");
        assert_eq!(resolve_section_key("Funding", "startDate"), "funding");
    }

    #[test]
    fn geometry_prefers_heading_above() {
        let headings = vec![
            heading("General", 0.0, 0.0, 400.0),
            heading("Funding", 200.0, 0.0, 400.0),
        ];
        let field = Rect::new(210.0, 0.0, 400.0, 30.0);
        assert_eq!(nearest_heading_by_geometry(&headings, field).unwrap().title, "Funding");
    }

    #[test]
    fn geometry_ignores_headings_far_below() {
        let headings = vec![
            heading("General", 0.0, 0.0, 400.0),
            heading("Funding", 200.0, 0.0, 400.0),
        ];
        let field = Rect::new(100.0, 0.0, 400.0, 30.0);
        assert_eq!(nearest_heading_by_geometry(&headings, field).unwrap().title, "General");

        let just_below = Rect::new(195.0, 0.0, 400.0, 30.0);
        assert_eq!(nearest_heading_by_geometry(&headings, just_below).unwrap().title, "Funding");
    }

    #[test]
    fn geometry_weighs_columns() {
        let headings = vec![
            heading("Left", 100.0, 0.0, 200.0),
            heading("Right", 100.0, 400.0, 200.0),
        ];
        let field = Rect::new(150.0, 420.0, 160.0, 30.0);
        assert_eq!(nearest_heading_by_geometry(&headings, field).unwrap().title, "Right");
    }

    #[test]
    fn geometry_with_nothing_above() {
        let headings = vec![heading("Funding", 500.0, 0.0, 400.0)];
        assert!(nearest_heading_by_geometry(&headings, Rect::new(10.0, 0.0, 10.0, 10.0)).is_none());
        assert!(nearest_heading_by_geometry(&[], Rect::default()).is_none());
    }

    #[test]
    fn nearest_heading_from_ancestor() {
        let snap = Snapshot::parse(
            r#"<body><section>
                <h3 class="slds-section__title">Budget and Payments</h3>
                <div><div id="field"><span>Bid</span></div></div>
            </section></body>"#,
        );
        assert_eq!(find_nearest_heading(&first(&snap, "#field")), "Budget and Payments");
    }

    #[test]
    fn nearest_heading_prefers_region_label() {
        let snap = Snapshot::parse(
            r#"<body><div aria-label="Funding"><div id="field"></div><h3>Other Heading</h3></div></body>"#,
        );
        assert_eq!(find_nearest_heading(&first(&snap, "#field")), "Funding");
    }

    #[test]
    fn nearest_heading_from_preceding_sibling() {
        let snap = Snapshot::parse(
            r#"<body><div>
                <div class="slds-section__title">General</div>
                <p>spacer</p>
                <div id="field"><span>Stage</span></div>
            </div></body>"#,
        );
        assert_eq!(find_nearest_heading(&first(&snap, "#field")), "General");
    }

    #[test]
    fn hidden_headings_are_ignored() {
        let snap = Snapshot::parse(
            r#"<body><div><h2 hidden>Ghost</h2><div id="field"></div></div></body>"#,
        );
        assert_eq!(find_nearest_heading(&first(&snap, "#field")), "");
    }

    #[test]
    fn collected_headings_are_sorted_and_deduplicated() {
        let snap = Snapshot::parse(
            r#"<body>
                <h2 data-bbox="200,0,400,20">Funding</h2>
                <h2 data-bbox="0,0,400,20">General</h2>
                <span title="General" data-bbox="0,0,400,20">General</span>
                <h3 style="display:none" data-bbox="50,0,400,20">Hidden</h3>
                <h3>No Geometry</h3>
            </body>"#,
        );
        let titles: Vec<_> = collect_headings(&snap).into_iter().map(|h| h.title).collect();
        assert_eq!(titles, vec!["General", "Funding"]);
    }

    #[test]
    fn resolver_falls_back_to_geometry() {
        let snap = Snapshot::parse(
            r#"<body>
                <main><div id="field" data-bbox="210,0,400,30"></div></main>
                <aside>
                    <h2 data-bbox="0,0,400,20">General</h2>
                    <h2 data-bbox="200,0,400,20">Funding</h2>
                </aside>
            </body>"#,
        );
        let resolver = SectionResolver::new(&snap);
        let field = first(&snap, "#field");
        assert_eq!(resolver.resolve_title(&field).unwrap(), "Funding");
        assert_eq!(resolver.headings().len(), 2);
    }

    #[test]
    fn resolver_surfaces_malformed_geometry() {
        let snap = Snapshot::parse(
            r#"<body>
                <main><div id="field" data-bbox="oops"></div></main>
                <aside><h2 data-bbox="0,0,400,20">General</h2></aside>
            </body>"#,
        );
        let resolver = SectionResolver::new(&snap);
        assert!(resolver.resolve_title(&first(&snap, "#field")).is_err());
    }
}
