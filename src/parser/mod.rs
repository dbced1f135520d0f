pub mod clean;
pub mod dictionaries;
pub mod extract;
pub mod locate;
pub mod pairs;
pub mod record;
pub mod sections;
pub mod selectors;
pub mod text;

use tracing::{debug, error};

use crate::dom::Document;
use crate::error::ExtractError;
pub use pairs::RawPair;
pub use record::{Details, Record, SectionFields};
use sections::SectionResolver;

/// Everything one pass over a record page yields.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub sections: Record,
    pub details: Details,
}

/// Three-stage pipeline: labels → raw pairs → canonical record.
pub fn extract_page<D: Document>(doc: &D) -> Extraction {
    match extract_pairs(doc) {
        Ok(pairs) => {
            let sections = record::build_record(&pairs);
            let details = record::build_details(&pairs);
            debug!(sections = sections.len(), fields = details.len(), "record extracted");
            Extraction { sections, details }
        }
        Err(e) => {
            error!(error = %e, "record extraction failed");
            Extraction::default()
        }
    }
}

/// Sectioned record of the page; empty if the page could not be read.
pub fn extract_sections<D: Document>(doc: &D) -> Record {
    extract_page(doc).sections
}

/// Flat key → value view of the page; empty if the page could not be read.
pub fn extract_details<D: Document>(doc: &D) -> Details {
    extract_page(doc).details
}

/// Raw label/value pairs. The heading cache lives only for this call.
pub fn extract_pairs<D: Document>(doc: &D) -> Result<Vec<RawPair>, ExtractError> {
    let resolver = SectionResolver::new(doc);
    Ok(pairs::collect_pairs(doc, &resolver)?)
}
