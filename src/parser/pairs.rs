use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, trace};

use super::clean::{has_help_residue, is_help_question};
use super::locate::{find_value_element, is_link_field, pick_best_text, try_find_link};
use super::sections::SectionResolver;
use super::selectors::{FIELD_CONTAINERS, LABELS};
use super::text::{is_field_label, normalize_label, normalize_text, strip_label_colon};
use crate::dom::{Document, DomNode};
use crate::error::DomError;

/// One label as seen on the page, before key mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPair {
    pub label: String,
    pub value: String,
    pub link: String,
    pub section_title_hint: String,
}

/// Walk every field label in document order and read its value, link and
/// owning section. Labels that fail are logged and skipped.
pub fn collect_pairs<D: Document>(
    doc: &D,
    resolver: &SectionResolver<'_, D>,
) -> Result<Vec<RawPair>, DomError> {
    let labels = doc.query_all(&LABELS)?;
    let mut pairs = Vec::new();
    let mut seen = HashSet::new();
    for label_el in &labels {
        match read_pair(label_el, pairs.len(), &mut seen, resolver) {
            Ok(Some(pair)) => pairs.push(pair),
            Ok(None) => {}
            Err(e) => debug!(error = %e, "field label skipped"),
        }
    }
    debug!(labels = labels.len(), pairs = pairs.len(), "pairs collected");
    Ok(pairs)
}

fn read_pair<N: DomNode, D: Document>(
    label_el: &N,
    pair_count: usize,
    seen: &mut HashSet<String>,
    resolver: &SectionResolver<'_, D>,
) -> Result<Option<RawPair>, DomError> {
    let label_raw = normalize_text(&label_el.text());
    let normalized = normalize_label(&label_raw);
    if normalized.is_empty() {
        return Ok(None);
    }

    let container = label_el.closest(&FIELD_CONTAINERS);
    let dedup_key = match &container {
        Some(c) => format!("{normalized}::{pair_count}::{}", c.class_name()),
        None => normalized.clone(),
    };
    if !seen.insert(dedup_key) {
        trace!(label = %label_raw, "duplicate label");
        return Ok(None);
    }

    let value_el = container
        .as_ref()
        .and_then(|c| find_value_element(c))
        .or_else(|| container.clone());
    let mut value = value_el.as_ref().map(pick_best_text).unwrap_or_default();

    let link = container.as_ref().map(try_find_link).unwrap_or_default();
    if !link.href.is_empty() {
        if is_link_field(&normalized) {
            value = link.href.clone();
        } else if value.is_empty() {
            value = if link.text.is_empty() {
                link.href.clone()
            } else {
                link.text.clone()
            };
        }
    }

    if value.trim().is_empty()
        || is_field_label(&value, &label_raw)
        || is_help_question(&value)
        || has_help_residue(&value)
    {
        value.clear();
    }

    let anchor = container.as_ref().unwrap_or(label_el);
    let section_title_hint = resolver.resolve_title(anchor)?;

    Ok(Some(RawPair {
        label: strip_label_colon(&label_raw),
        value,
        link: link.href,
        section_title_hint,
    }))
}
