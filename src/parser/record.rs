use std::collections::BTreeMap;

use tracing::debug;

use super::dictionaries::{field_key, SECTION_SCHEMAS};
use super::locate::is_link_field;
use super::pairs::RawPair;
use super::sections::resolve_section_key;
use super::text::is_field_label;
use crate::error::ExtractError;

/// Field key → value; `None` when the page showed nothing usable.
pub type SectionFields = BTreeMap<String, Option<String>>;
/// Section key → fields.
pub type Record = BTreeMap<String, SectionFields>;
/// Flat field key → value map, sections ignored.
pub type Details = BTreeMap<String, Option<String>>;

/// Group raw pairs into canonical sections and fill in schema keys.
pub fn build_record(pairs: &[RawPair]) -> Record {
    let mut record = Record::new();
    for pair in pairs {
        let key = match usable_field_key(&pair.label) {
            Ok(key) => key,
            Err(e) => {
                debug!(error = %e, "pair dropped");
                continue;
            }
        };
        let section = resolve_section_key(&pair.section_title_hint, &key);
        let value = field_value(pair, &key);
        record.entry(section).or_default().insert(key, value);
    }
    enforce_section_schemas(record)
}

/// Same mapping as [`build_record`] without the section layer. Later pairs
/// overwrite earlier ones with the same key.
pub fn build_details(pairs: &[RawPair]) -> Details {
    let mut details = Details::new();
    for pair in pairs {
        match usable_field_key(&pair.label) {
            Ok(key) => {
                let value = field_value(pair, &key);
                details.insert(key, value);
            }
            Err(e) => debug!(error = %e, "pair dropped"),
        }
    }
    details
}

/// Every schema section is present with every schema key; observed keys
/// are never removed.
pub fn enforce_section_schemas(mut record: Record) -> Record {
    for (section, keys) in SECTION_SCHEMAS {
        let fields = record.entry(section.to_string()).or_default();
        for key in *keys {
            fields.entry(key.to_string()).or_insert(None);
        }
    }
    record
}

fn usable_field_key(label: &str) -> Result<String, ExtractError> {
    let key = field_key(label);
    if key.is_empty() {
        return Err(ExtractError::UnusableKey(label.to_string()));
    }
    Ok(key)
}

fn field_value(pair: &RawPair, key: &str) -> Option<String> {
    if is_link_field(key) && !pair.link.is_empty() {
        return Some(pair.link.clone());
    }
    let value = pair.value.trim();
    if value.is_empty() || is_field_label(value, &pair.label) {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(label: &str, value: &str, link: &str, hint: &str) -> RawPair {
        RawPair {
            label: label.into(),
            value: value.into(),
            link: link.into(),
            section_title_hint: hint.into(),
        }
    }

    #[test]
    fn groups_by_heading_and_default_section() {
        let record = build_record(&[
            pair("Stage", "Closed Won", "", "General (DRI: Submitter)"),
            pair("Start Date", "2024-01-05", "", ""),
            pair("Mystery", "42", "", ""),
            pair("Co-Funding Split", "50/50", "", "Funding"),
        ]);
        assert_eq!(record["general"]["stage"].as_deref(), Some("Closed Won"));
        assert_eq!(record["general"]["startDate"].as_deref(), Some("2024-01-05"));
        assert_eq!(record["other"]["mystery"].as_deref(), Some("42"));
        assert_eq!(record["funding"]["coFundingSplit"].as_deref(), Some("50/50"));
    }

    #[test]
    fn schema_keys_always_present() {
        let record = build_record(&[pair("Budget", "$5,000", "", "Budget and Payments")]);
        let budget = &record["budgetAndPayments"];
        assert_eq!(budget["budget"].as_deref(), Some("$5,000"));
        assert_eq!(budget["searchBid"], None);
        assert!(budget.contains_key("overallMaxNumberOfRedemptions"));

        let empty = build_record(&[]);
        assert_eq!(empty["budgetAndPayments"].len(), 14);
    }

    #[test]
    fn schema_keeps_extra_keys() {
        let record = build_record(&[pair("Payment Protocol", "Prepay", "", "Budget & Payments")]);
        assert_eq!(
            record["budgetAndPayments"]["paymentProtocol"].as_deref(),
            Some("Prepay")
        );
        let again = enforce_section_schemas(record.clone());
        assert_eq!(again, record);
    }

    #[test]
    fn link_fields_prefer_href() {
        let record = build_record(&[pair(
            "External Landing Page Link",
            "Landing page",
            "https://example.com/lp",
            "",
        )]);
        assert_eq!(
            record["general"]["externalLandingPageLink"].as_deref(),
            Some("https://example.com/lp")
        );
    }

    #[test]
    fn echoed_and_blank_values_are_null() {
        let record = build_record(&[
            pair("Budget Notes", "Budget Notes", "", "Budget and Payments"),
            pair("Bid", "   ", "", "Budget and Payments"),
        ]);
        assert_eq!(record["budgetAndPayments"]["budgetNotes"], None);
        assert_eq!(record["budgetAndPayments"]["bid"], None);
    }

    #[test]
    fn unusable_labels_are_skipped() {
        let record = build_record(&[pair("???", "x", "", "")]);
        assert!(!record.contains_key("other"));
        assert!(build_details(&[pair("!!", "x", "", "")]).is_empty());
    }

    #[test]
    fn details_last_write_wins() {
        let details = build_details(&[
            pair("BRF ID", "BRF-1", "", ""),
            pair("Brief ID", "BRF-2", "", "General"),
        ]);
        assert_eq!(details.len(), 1);
        assert_eq!(details["briefId"].as_deref(), Some("BRF-2"));
    }
}
