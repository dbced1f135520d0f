/// Collapse whitespace runs to one space and trim.
pub fn normalize_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Dictionary lookup form of a label: normalized, lowercased, trailing colon removed.
pub fn normalize_label(label: &str) -> String {
    normalize_text(label)
        .to_lowercase()
        .trim_end_matches(|c: char| c == ':' || c.is_whitespace())
        .to_string()
}

/// Label text with its trailing colon dropped, case preserved.
pub fn strip_label_colon(label: &str) -> String {
    let text = normalize_text(label);
    match text.strip_suffix(':') {
        Some(rest) => rest.trim_end().to_string(),
        None => text,
    }
}

/// Synthesize an identifier key: `"External Landing Page Link"` → `externalLandingPageLink`.
pub fn camelize(label: &str) -> String {
    let base = normalize_label(label);
    let mut parts = base
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|p| !p.is_empty());
    let Some(first) = parts.next() else {
        return String::new();
    };
    let mut key = first.to_ascii_lowercase();
    for part in parts {
        let mut chars = part.chars();
        if let Some(head) = chars.next() {
            key.push(head.to_ascii_uppercase());
            key.push_str(&chars.as_str().to_ascii_lowercase());
        }
    }
    key
}

/// Whether `text` is just the label again, ignoring case and punctuation.
pub fn is_field_label(text: &str, label: &str) -> bool {
    if text.is_empty() || label.is_empty() {
        return false;
    }
    let text = normalize_label(text);
    let label = normalize_label(label);
    if text == label {
        return true;
    }
    alnum_only(&text) == alnum_only(&label)
}

fn alnum_only(s: &str) -> String {
    let kept: String = s
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();
    kept.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_collapses() {
        assert_eq!(normalize_text("  Brief \n\t ID  "), "Brief ID");
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text("a\u{a0}b"), "a b");
    }

    #[test]
    fn normalize_label_strips_colon_and_case() {
        assert_eq!(normalize_label(" Start Date: "), "start date");
        assert_eq!(normalize_label("BRF ID"), "brf id");
        assert_eq!(normalize_label("Ratio: 1:2"), "ratio: 1:2");
    }

    #[test]
    fn normalize_label_idempotent() {
        for s in ["Start Date:", "a : :", "  Mixed   CASE::", "", ":", "Ratio: 1:2 :"] {
            let once = normalize_label(s);
            assert_eq!(normalize_label(&once), once, "input {s:?}");
        }
    }

    #[test]
    fn strip_label_colon_keeps_case() {
        assert_eq!(strip_label_colon("Start Date:"), "Start Date");
        assert_eq!(strip_label_colon("Budget"), "Budget");
    }

    #[test]
    fn camelize_examples() {
        assert_eq!(camelize("External Landing Page Link"), "externalLandingPageLink");
        assert_eq!(camelize(""), "");
        assert_eq!(camelize("% of Fee to Invoice Advertiser"), "ofFeeToInvoiceAdvertiser");
        assert_eq!(camelize("DD Team CC on Reporting:"), "ddTeamCcOnReporting");
        assert_eq!(camelize("???"), "");
        assert_eq!(camelize("Non-DoubleDash Bid"), "nonDoubledashBid");
    }

    #[test]
    fn field_label_echo() {
        assert!(is_field_label("Start Date", "Start Date:"));
        assert!(is_field_label("Start Date?", "Start Date"));
        assert!(!is_field_label("start-date", "Start Date"));
        assert!(!is_field_label("2024-01-05", "Start Date"));
        assert!(!is_field_label("", "Start Date"));
    }
}
