use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use super::text::normalize_text;
use crate::dom::DomNode;

// Each marker sits between a label and its case-insensitive repeat.
static QUESTION_HELP_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\?\s*Help\s+").unwrap());
static HELP_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)Help\s+").unwrap());
static ECHOED_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)Help\s+(.+?)([A-Z][^.]*\.?)(.*)$").unwrap());
static HELP_FRAGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Help\s+[^?]*\?\s*[^.]*\.").unwrap());
static TRAILING_EDIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*Edit\s+[^.]*$").unwrap());
static DANGLING_QUESTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^?]*\?\s*$").unwrap());
static HELP_CAPITAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Help\s+[A-Z]").unwrap());
static HELP_QUESTION_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^?]*\?\s*Help\s+[^?]*\?").unwrap());
static HELP_QUESTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Help\s+[^?]*\?").unwrap());

static ACTION_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(open|preview|edit|view|show|more|actions)\b").unwrap());
static OPEN_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)Open\s+").unwrap());
static LEADING_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^Open\s+").unwrap());
static LEADING_PREVIEW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s+Preview").unwrap());
static INNER_ACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s+(Open|Preview|Edit|View|Show|More|Actions)\s+").unwrap()
});
static TRAILING_ACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s+(Open|Preview|Edit|View|Show|More|Actions)$").unwrap()
});

const HELP_CLASS_MARKERS: &[&str] = &[
    "slds-assistive-text",
    "sr-only",
    "screen-reader-only",
    "helptext",
    "tooltip",
    "popover-trigger",
];
const ACTION_CLASS_MARKERS: &[&str] = &["button", "action", "link", "menu"];
const ACTION_WORDS: &[&str] = &["open", "preview", "edit", "view", "show", "more", "actions"];

/// Verdict of one help-text stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cleaned {
    /// The stage recovered usable text.
    Clean(String),
    /// The whole run is help chrome.
    Contaminated,
    /// The stage has no opinion; the next one decides.
    Unknown,
}

type Stage = fn(&str) -> Cleaned;

/// Help-text stages, most specific first.
const HELP_STAGES: &[(&str, Stage)] = &[
    ("mirrored_question", mirrored_question),
    ("repeated_label", repeated_label),
    ("echoed_label", echoed_label),
    ("help_fragments", strip_help_fragments),
    ("short_help_residue", short_help_residue),
];

/// Strip tooltip text the framework concatenated into a value's text run.
pub fn filter_out_help_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    for (name, stage) in HELP_STAGES {
        match stage(text) {
            Cleaned::Clean(cleaned) => return cleaned,
            Cleaned::Contaminated => {
                trace!(stage = name, text, "help text contamination");
                return String::new();
            }
            Cleaned::Unknown => {}
        }
    }
    text.trim().to_string()
}

/// `X?Help X?…`, label repeat compared case-insensitively.
pub fn mirrored_question(text: &str) -> Cleaned {
    match label_repeat(&QUESTION_HELP_MARKER_RE, text, |rest| rest.starts_with('?')) {
        Some(_) => Cleaned::Contaminated,
        None => Cleaned::Unknown,
    }
}

/// `XHelp X…` with a short label and nothing but more help after it.
pub fn repeated_label(text: &str) -> Cleaned {
    let Some((label, rest)) = label_repeat(&HELP_MARKER_RE, text, |_| true) else {
        return Cleaned::Unknown;
    };
    let (label, rest) = (label.trim(), rest.trim());
    if label.chars().count() < 50 && (rest.is_empty() || rest.starts_with('?')) {
        Cleaned::Contaminated
    } else {
        Cleaned::Unknown
    }
}

/// `XHelp X Sentence…` where both label captures agree.
pub fn echoed_label(text: &str) -> Cleaned {
    match ECHOED_LABEL_RE.captures(text) {
        Some(caps) if caps[1].trim() == caps[2].trim() => Cleaned::Contaminated,
        _ => Cleaned::Unknown,
    }
}

/// Remove `Help Label? Sentence.` fragments and a trailing `Edit Label`.
pub fn strip_help_fragments(text: &str) -> Cleaned {
    let without_help = HELP_FRAGMENT_RE.replace_all(text, "");
    let without_edit = TRAILING_EDIT_RE.replace_all(&without_help, "");
    let cleaned = without_edit.trim();
    if cleaned.chars().count() > 3 && !DANGLING_QUESTION_RE.is_match(cleaned) {
        Cleaned::Clean(cleaned.to_string())
    } else {
        Cleaned::Unknown
    }
}

/// Short text still carrying `Help Capitalized…` is all chrome.
pub fn short_help_residue(text: &str) -> Cleaned {
    if text.chars().count() < 200 && text.contains("Help") && HELP_CAPITAL_RE.is_match(text) {
        Cleaned::Contaminated
    } else {
        Cleaned::Unknown
    }
}

/// `Label? Help Label?` at the start of the run.
pub fn is_help_question(text: &str) -> bool {
    HELP_QUESTION_PREFIX_RE.is_match(text)
}

/// Any `Help Label?` residue in short text.
pub fn has_help_residue(text: &str) -> bool {
    HELP_QUESTION_RE.is_match(text) && text.chars().count() < 200
}

pub fn contains_action_text(text: &str) -> bool {
    !text.is_empty() && ACTION_WORD_RE.is_match(text)
}

/// Drop UI affordance words, collapsing `NameOpen Name Preview` to `Name`.
pub fn filter_out_action_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let collapsed = collapse_open_repeats(text, preview_after_repeat);
    let collapsed = collapse_open_repeats(&collapsed, further_open_repeats);
    let inner = INNER_ACTION_RE.replace_all(&collapsed, " ");
    let trailing = TRAILING_ACTION_RE.replace_all(&inner, "");
    normalize_text(&trailing)
}

/// Shortest leading label that reappears, ignoring case, right after a
/// `marker` match and whose remainder passes `accept`. Yields the label and
/// the text after its repeat.
fn label_repeat<'t>(
    marker: &Regex,
    text: &'t str,
    accept: impl Fn(&str) -> bool,
) -> Option<(&'t str, &'t str)> {
    marker.find_iter(text).find_map(|m| {
        let label = &text[..m.start()];
        if label.is_empty() || label.contains('\n') {
            return None;
        }
        let rest = strip_prefix_ignore_case(&text[m.end()..], label)?;
        accept(rest).then_some((label, rest))
    })
}

/// Replace every leftmost `X Open X…` run with `X`, comparing the repeat
/// case-insensitively. `tail` sees the text after the first repeat and returns
/// how much more of it the run swallows, or `None` to reject the match.
fn collapse_open_repeats(text: &str, tail: fn(&str, &str) -> Option<usize>) -> String {
    let markers: Vec<_> = OPEN_MARKER_RE.find_iter(text).collect();
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    'scan: while pos < text.len() {
        let from = pos;
        for start in text[from..].char_indices().map(move |(i, _)| from + i) {
            for m in markers.iter().filter(|m| m.start() > start) {
                let label = &text[start..m.start()];
                if label.contains('\n') {
                    break;
                }
                let Some(after) = strip_prefix_ignore_case(&text[m.end()..], label) else {
                    continue;
                };
                let Some(swallowed) = tail(after, label) else {
                    continue;
                };
                out.push_str(&text[from..start]);
                out.push_str(label);
                pos = text.len() - after.len() + swallowed;
                continue 'scan;
            }
        }
        break;
    }
    out.push_str(&text[pos..]);
    out
}

/// `X Open X Preview`: the repeat must be followed by `Preview`.
fn preview_after_repeat(after: &str, _label: &str) -> Option<usize> {
    LEADING_PREVIEW_RE.find(after).map(|m| m.end())
}

/// `X Open X [Preview] Open X [Preview]…`: any number of further repeats.
fn further_open_repeats(after: &str, label: &str) -> Option<usize> {
    let preview = |s: &str| LEADING_PREVIEW_RE.find(s).map_or(0, |m| m.end());
    let mut swallowed = preview(after);
    while let Some(open) = LEADING_OPEN_RE.find(&after[swallowed..]) {
        let Some(rest) = strip_prefix_ignore_case(&after[swallowed + open.end()..], label) else {
            break;
        };
        swallowed = after.len() - rest.len();
        swallowed += preview(&after[swallowed..]);
    }
    Some(swallowed)
}

fn strip_prefix_ignore_case<'t>(text: &'t str, prefix: &str) -> Option<&'t str> {
    let mut chars = text.chars();
    for p in prefix.chars() {
        let t = chars.next()?;
        if t != p && !t.to_lowercase().eq(p.to_lowercase()) {
            return None;
        }
    }
    Some(chars.as_str())
}

/// Tooltip and assistive-text nodes never hold values.
pub fn is_help_element<N: DomNode>(el: &N) -> bool {
    let class_name = el.class_name().to_lowercase();
    if HELP_CLASS_MARKERS.iter().any(|m| class_name.contains(m)) {
        return true;
    }
    let aria_label = el.attribute("aria-label").unwrap_or("");
    aria_label.to_lowercase().contains("help")
        || el.attribute("role") == Some("tooltip")
        || el.attribute("data-help-text").is_some_and(|h| !h.is_empty())
}

/// Buttons, anchors, menus and bare action words.
pub fn is_action_element<N: DomNode>(el: &N) -> bool {
    if matches!(el.tag_name(), "button" | "a") {
        return true;
    }
    let class_name = el.class_name();
    if ACTION_CLASS_MARKERS.iter().any(|m| class_name.contains(m)) {
        return true;
    }
    let text = normalize_text(&el.text()).to_lowercase();
    ACTION_WORDS.contains(&text.as_str())
}
