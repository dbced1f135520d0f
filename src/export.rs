use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::Serialize;
use tracing::info;

use crate::dom::Document;
use crate::parser::extract::brief_items::BriefItem;
use crate::parser::extract::chatter::ChatterEntry;
use crate::parser::{self, Details, Record};

static RECORD_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)/lightning/r/[^/]+/([^/]+)/view").unwrap());

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    pub record_id: String,
    pub source: Source,
    pub sections: Record,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Details>,
    pub chatter: Vec<ChatterEntry>,
    pub brief_items: Vec<BriefItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Source {
    pub url: String,
    pub timestamp: String,
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub include_details: bool,
    pub chatter_max: usize,
}

/// Record id from a Lightning record URL (`/lightning/r/<object>/<id>/view`).
pub fn record_id_from_url(url: &str) -> String {
    RECORD_URL_RE
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

pub fn build_payload<D: Document>(
    doc: &D,
    url: &str,
    options: &ExportOptions,
    now: DateTime<Utc>,
) -> ExportPayload {
    let extraction = parser::extract_page(doc);
    let related = parser::extract::extract_all(doc, options.chatter_max);
    ExportPayload {
        record_id: record_id_from_url(url),
        source: Source {
            url: url.to_string(),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        },
        sections: extraction.sections,
        details: options.include_details.then_some(extraction.details),
        chatter: related.chatter,
        brief_items: related.brief_items,
    }
}

/// `brf-<id>-<timestamp>.json`, with characters unsafe in file names replaced.
pub fn export_file_name(payload: &ExportPayload) -> String {
    let id = if payload.record_id.is_empty() {
        "unknown"
    } else {
        payload.record_id.as_str()
    };
    let stamp = payload.source.timestamp.replace([':', '.'], "-");
    format!("brf-{id}-{stamp}.json")
}

pub fn to_json(payload: &ExportPayload, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(payload)
    } else {
        serde_json::to_string(payload)
    };
    json.context("Failed to serialize export payload")
}

/// Write the payload into `dir`, creating it when missing. Never replaces an
/// existing file: a taken name gets a `-1`, `-2`, … suffix.
pub fn write_payload(payload: &ExportPayload, dir: &Path, pretty: bool) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    let json = to_json(payload, pretty)?;
    let (path, mut file) = create_unique(dir, &export_file_name(payload))?;
    file.write_all(json.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), record_id = %payload.record_id, "export written");
    Ok(path)
}

fn create_unique(dir: &Path, file_name: &str) -> Result<(PathBuf, File)> {
    let stem = file_name.strip_suffix(".json").unwrap_or(file_name);
    let mut attempt = 0u32;
    loop {
        let path = match attempt {
            0 => dir.join(file_name),
            n => dir.join(format!("{stem}-{n}.json")),
        };
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to create {}", path.display()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Snapshot;
    use chrono::TimeZone;

    const PAGE: &str = r#"<html><body>
        <section>
            <h3 class="slds-section__title">General</h3>
            <div class="slds-form-element">
                <span class="test-id__field-label">Stage</span>
                <span class="test-id__field-value">Draft</span>
            </div>
        </section>
    </body></html>"#;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 15).unwrap()
    }

    fn options(include_details: bool) -> ExportOptions {
        ExportOptions {
            include_details,
            chatter_max: 20,
        }
    }

    #[test]
    fn record_ids() {
        assert_eq!(
            record_id_from_url("https://acme.lightning.force.com/lightning/r/Brief__c/a0X5e000001AbCd/view"),
            "a0X5e000001AbCd"
        );
        assert_eq!(
            record_id_from_url("https://x/LIGHTNING/R/Opportunity/006ABC/VIEW?x=1"),
            "006ABC"
        );
        assert_eq!(record_id_from_url("https://x/lightning/o/Brief__c/list"), "");
    }

    #[test]
    fn payload_shape() {
        let snap = Snapshot::parse(PAGE);
        let payload = build_payload(
            &snap,
            "https://x/lightning/r/Brief__c/a0X1/view",
            &options(false),
            fixed_now(),
        );
        let json: serde_json::Value =
            serde_json::from_str(&to_json(&payload, false).unwrap()).unwrap();
        assert_eq!(json["recordId"], "a0X1");
        assert_eq!(json["source"]["timestamp"], "2024-03-01T09:30:15.000Z");
        assert_eq!(json["sections"]["general"]["stage"], "Draft");
        assert!(json["sections"]["budgetAndPayments"]["bid"].is_null());
        assert!(json.get("details").is_none());
        assert_eq!(json["chatter"], serde_json::json!([]));
        assert_eq!(json["briefItems"], serde_json::json!([]));
    }

    #[test]
    fn details_on_request() {
        let snap = Snapshot::parse(PAGE);
        let payload = build_payload(&snap, "", &options(true), fixed_now());
        assert_eq!(payload.details.unwrap()["stage"].as_deref(), Some("Draft"));
    }

    #[test]
    fn file_name_sanitized() {
        let snap = Snapshot::parse(PAGE);
        let payload = build_payload(&snap, "", &options(false), fixed_now());
        assert_eq!(export_file_name(&payload), "brf-unknown-2024-03-01T09-30-15-000Z.json");
    }

    #[test]
    fn writes_into_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/exports");
        let snap = Snapshot::parse(PAGE);
        let payload = build_payload(
            &snap,
            "https://x/lightning/r/Brief__c/a0X1/view",
            &options(false),
            fixed_now(),
        );
        let path = write_payload(&payload, &out, true).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "brf-a0X1-2024-03-01T09-30-15-000Z.json"
        );
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\n  \"recordId\": \"a0X1\""));
    }

    #[test]
    fn same_name_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let snap = Snapshot::parse(PAGE);
        let payload = build_payload(&snap, "", &options(false), fixed_now());

        let first = write_payload(&payload, dir.path(), false).unwrap();
        let second = write_payload(&payload, dir.path(), false).unwrap();
        assert_eq!(
            second.file_name().unwrap().to_str().unwrap(),
            "brf-unknown-2024-03-01T09-30-15-000Z-1.json"
        );
        assert_ne!(first, second);
    }

    #[test]
    fn parallel_urlless_exports_all_land() {
        use rayon::prelude::*;

        let dir = tempfile::tempdir().unwrap();
        let snap = Snapshot::parse(PAGE);
        let payload = build_payload(&snap, "", &options(false), fixed_now());

        let paths: Vec<PathBuf> = (0..40)
            .into_par_iter()
            .map(|_| write_payload(&payload, dir.path(), false).unwrap())
            .collect();
        assert_eq!(paths.len(), 40);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 40);
    }
}
