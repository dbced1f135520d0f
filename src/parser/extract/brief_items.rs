use std::sync::LazyLock;

use regex::Regex;
use scraper::Selector;
use serde::Serialize;
use tracing::debug;

use crate::dom::{Document, DomNode};
use crate::error::DomError;
use crate::parser::selectors::{CARD_CONTAINERS, CARD_HEADERS, CARD_HEADINGS};
use crate::parser::text::normalize_text;

static TABLE_ROWS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table tbody tr").unwrap());
static CELLS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());
static LIST_ITEMS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li, .slds-item, .slds-media").unwrap());
static TRUNCATED: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".slds-truncate").unwrap());
static PRODUCT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)product[:：]\s*([^|]+?)(?:\||$)").unwrap());
static STATUS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)status[:：]\s*([^|]+?)(?:\||$)").unwrap());

const CARD_KEYWORDS: &[&str] = &["brief items", "brief item", "brief", "简报", "briefs"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BriefItem {
    pub name: String,
    pub product: String,
    pub status: String,
    pub link: String,
}

/// Rows of the related "Brief Items" card, table or list layout.
pub fn extract<D: Document>(doc: &D) -> Vec<BriefItem> {
    match find_card(doc) {
        Ok(Some(card)) => {
            let rows = card.select(&TABLE_ROWS);
            let items: Vec<BriefItem> = if rows.is_empty() {
                card.select(&LIST_ITEMS).iter().filter_map(read_list_item).collect()
            } else {
                rows.iter().filter_map(read_row).collect()
            };
            debug!(items = items.len(), "brief items collected");
            items
        }
        Ok(None) => Vec::new(),
        Err(e) => {
            debug!(error = %e, "brief items card unreadable");
            Vec::new()
        }
    }
}

/// First card, in container-selector priority, whose header names brief items.
fn find_card<D: Document>(doc: &D) -> Result<Option<D::Node<'_>>, DomError> {
    let boxes = doc.query_all(&CARD_CONTAINERS)?;
    for (_, selector) in CARD_CONTAINERS.each() {
        for card in boxes.iter().filter(|b| b.matches(selector)) {
            if card_title_matches(card) {
                return Ok(Some(card.clone()));
            }
        }
    }
    Ok(None)
}

fn card_title_matches<N: DomNode>(card: &N) -> bool {
    let header = card
        .select_first(CARD_HEADERS.group())
        .map(|h| normalize_text(&h.text()))
        .unwrap_or_default();
    if !header.is_empty() && names_brief_items(&header) {
        return true;
    }
    card.select_first(CARD_HEADINGS.group())
        .is_some_and(|h| names_brief_items(&normalize_text(&h.text())))
}

fn names_brief_items(title: &str) -> bool {
    let title = title.to_lowercase();
    CARD_KEYWORDS.iter().any(|k| title.contains(k))
}

fn read_row<N: DomNode>(row: &N) -> Option<BriefItem> {
    let cells = row.select(&CELLS);
    let first_cell = cells.first()?;
    let anchor = row.select_first(&ANCHOR);
    let cell_text = |i: usize| cells.get(i).map(|c| normalize_text(&c.text())).unwrap_or_default();

    let name = anchor
        .as_ref()
        .map(|a| normalize_text(&a.text()))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| normalize_text(&first_cell.text()));
    if name.is_empty() {
        return None;
    }
    Some(BriefItem {
        name,
        product: cell_text(1),
        status: cell_text(2),
        link: anchor
            .as_ref()
            .and_then(|a| a.attribute("href"))
            .unwrap_or("")
            .to_string(),
    })
}

fn read_list_item<N: DomNode>(item: &N) -> Option<BriefItem> {
    let anchor = item.select_first(&ANCHOR);
    let name = anchor
        .as_ref()
        .map(|a| normalize_text(&a.text()))
        .filter(|t| !t.is_empty())
        .or_else(|| item.select_first(&TRUNCATED).map(|t| normalize_text(&t.text())))
        .unwrap_or_default();
    if name.is_empty() {
        return None;
    }
    let text = normalize_text(&item.text());
    let fragment = |re: &Regex| {
        re.captures(&text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default()
    };
    Some(BriefItem {
        product: fragment(&PRODUCT_RE),
        status: fragment(&STATUS_RE),
        link: anchor
            .as_ref()
            .and_then(|a| a.attribute("href"))
            .unwrap_or("")
            .to_string(),
        name,
    })
}
