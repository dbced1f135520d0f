pub mod brief_items;
pub mod chatter;

use crate::dom::Document;
use brief_items::BriefItem;
use chatter::ChatterEntry;

/// Related lists shown next to the record's fields.
#[derive(Debug, Clone, Default)]
pub struct RelatedData {
    pub chatter: Vec<ChatterEntry>,
    pub brief_items: Vec<BriefItem>,
}

pub fn extract_all<D: Document>(doc: &D, chatter_max: usize) -> RelatedData {
    RelatedData {
        chatter: chatter::extract(doc, chatter_max),
        brief_items: brief_items::extract(doc),
    }
}
