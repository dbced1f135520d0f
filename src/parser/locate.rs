use std::sync::LazyLock;

use regex::Regex;
use scraper::Selector;
use tracing::debug;

use super::clean::{
    contains_action_text, filter_out_action_text, filter_out_help_text, is_action_element,
    is_help_element, is_help_question,
};
use super::selectors::{LINKS, VALUES};
use super::text::normalize_text;
use crate::dom::DomNode;

static DATE_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}-\d{1,2}-\d{1,2}|\d{1,2}:\d{2}").unwrap());
static LINK_FIELD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)figma|external|link").unwrap());
static TITLED: LazyLock<Selector> = LazyLock::new(|| Selector::parse("[title]").unwrap());

/// Hyperlink found in a field container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkTarget {
    pub href: String,
    pub text: String,
}

/// Best value-bearing element inside a field container.
pub fn find_value_element<N: DomNode>(container: &N) -> Option<N> {
    strict_candidate(container).or_else(|| best_scored_candidate(container))
}

/// First clean, non-interactive candidate in selector priority order.
fn strict_candidate<N: DomNode>(container: &N) -> Option<N> {
    for (pattern, selector) in VALUES.each() {
        for el in container.select(selector) {
            if !el.is_visible() || is_help_element(&el) || is_action_element(&el) {
                continue;
            }
            let cleaned = filter_out_help_text(&normalize_text(&el.text()));
            if !cleaned.is_empty() && !contains_action_text(&cleaned) {
                debug!(selector = pattern, "strict value candidate");
                return Some(el);
            }
        }
    }
    None
}

/// Highest scoring candidate when every strict candidate was rejected.
fn best_scored_candidate<N: DomNode>(container: &N) -> Option<N> {
    let mut best: Option<(i64, N)> = None;
    for (_, selector) in VALUES.each() {
        for el in container.select(selector) {
            if !el.is_visible() || is_help_element(&el) {
                continue;
            }
            let text = normalize_text(&el.text());
            let cleaned = filter_out_action_text(&text);
            if cleaned.is_empty() || is_help_question(&text) {
                continue;
            }
            let score = candidate_score(&text, &cleaned);
            let best_score = best.as_ref().map_or(-1, |(s, _)| *s);
            if score > best_score {
                best = Some((score, el));
            }
        }
    }
    best.map(|(_, el)| el)
}

/// Surviving length minus twice the length stripped as action noise.
pub fn candidate_score(raw: &str, cleaned: &str) -> i64 {
    let raw_len = raw.chars().count() as i64;
    let kept = cleaned.chars().count() as i64;
    kept - 2 * (raw_len - kept)
}

/// Display text of a value element, help and action chrome removed.
pub fn pick_best_text<N: DomNode>(el: &N) -> String {
    if is_help_element(el) {
        return String::new();
    }
    if let Some(title) = date_title(el) {
        return title;
    }
    let text = normalize_text(&el.text());
    filter_out_action_text(&filter_out_help_text(&text))
}

/// Dates and times rendered as abbreviations keep the real value in `title`.
fn date_title<N: DomNode>(el: &N) -> Option<String> {
    let is_date = |t: &&str| DATE_TIME_RE.is_match(t);
    el.attribute("title")
        .filter(is_date)
        .map(normalize_text)
        .or_else(|| {
            el.select(&TITLED)
                .into_iter()
                .filter(|d| d.is_visible() && !is_help_element(d))
                .find_map(|d| d.attribute("title").filter(is_date).map(normalize_text))
        })
}

/// Formatted URL anchor, else a titled anchor, else any anchor.
pub fn try_find_link<N: DomNode>(container: &N) -> LinkTarget {
    LINKS
        .each()
        .find_map(|(_, selector)| container.select_first(selector))
        .map(|a| LinkTarget {
            href: a.attribute("href").unwrap_or("").trim().to_string(),
            text: normalize_text(&a.text()),
        })
        .unwrap_or_default()
}

/// Fields whose link target is the value.
pub fn is_link_field(name: &str) -> bool {
    LINK_FIELD_RE.is_match(name)
}
