use std::sync::LazyLock;

use crate::dom::SelectorSet;

/// Elements whose text names a field.
pub static LABELS: LazyLock<SelectorSet> = LazyLock::new(|| {
    SelectorSet::new(&[
        ".test-id__field-label",
        ".slds-form-element__label",
        ".slds-item_label",
    ])
    .unwrap()
});

/// Value-bearing shapes, highest priority first.
pub static VALUES: LazyLock<SelectorSet> = LazyLock::new(|| {
    SelectorSet::new(&[
        ".test-id__field-value",
        ".slds-form-element__static",
        ".slds-truncate",
        "lightning-formatted-text",
        "lightning-formatted-number",
        "lightning-formatted-date-time",
        "lightning-formatted-url",
        "lightning-formatted-rich-text",
        "a[title]",
        "a",
        "span[title]",
    ])
    .unwrap()
});

pub static FIELD_CONTAINERS: LazyLock<SelectorSet> = LazyLock::new(|| {
    SelectorSet::new(&[
        "records-record-layout-item",
        ".slds-form-element",
        ".slds-form__row",
        ".record-layout-item",
        ".slds-grid",
    ])
    .unwrap()
});

/// Anchors, most specific first.
pub static LINKS: LazyLock<SelectorSet> = LazyLock::new(|| {
    SelectorSet::new(&["lightning-formatted-url a", "a[title]", "a"]).unwrap()
});

pub static SECTION_TITLES: LazyLock<SelectorSet> = LazyLock::new(|| {
    SelectorSet::new(&[
        ".slds-section__title",
        ".slds-section__title-action",
        ".slds-card__header",
        ".slds-card__header-title",
        ".slds-page-header__title",
        ".slds-text-heading_small",
        ".slds-text-heading_medium",
        ".slds-text-title",
        "[role='heading']",
        "h2",
        "h3",
        ".test-id__header-label",
        "span[title]",
    ])
    .unwrap()
});

pub static CARD_CONTAINERS: LazyLock<SelectorSet> = LazyLock::new(|| {
    SelectorSet::new(&[
        ".slds-card",
        ".forceRelatedListSingleContainer",
        ".relatedListContainer",
    ])
    .unwrap()
});

pub static CARD_HEADERS: LazyLock<SelectorSet> = LazyLock::new(|| {
    SelectorSet::new(&[".slds-card__header", ".header", ".slds-card__header-title"]).unwrap()
});

pub static CARD_HEADINGS: LazyLock<SelectorSet> = LazyLock::new(|| {
    SelectorSet::new(&["h2", "h3", "h4", ".slds-text-heading_small", ".slds-text-title"]).unwrap()
});

pub static FEED_CONTAINERS: LazyLock<SelectorSet> = LazyLock::new(|| {
    SelectorSet::new(&[".feedContainer", ".forceChatterFeed", ".chatterFeed", ".cuf-feed"]).unwrap()
});

pub static FEED_ITEMS: LazyLock<SelectorSet> = LazyLock::new(|| {
    SelectorSet::new(&[".feedItem", ".cuf-feedElement", ".cuf-feedItem", "article", ".feeditem"])
        .unwrap()
});

pub static FEED_AUTHORS: LazyLock<SelectorSet> = LazyLock::new(|| {
    SelectorSet::new(&[
        ".publisher-name",
        ".feedItemBody .byline a",
        ".actorName",
        "a.profileLink",
    ])
    .unwrap()
});

pub static FEED_TIMES: LazyLock<SelectorSet> = LazyLock::new(|| {
    SelectorSet::new(&["time", ".timestamp", "abbr[data-original-title]", ".feedDate"]).unwrap()
});

pub static FEED_BODIES: LazyLock<SelectorSet> = LazyLock::new(|| {
    SelectorSet::new(&[
        ".feedItemBody",
        ".feedBody",
        ".cuf-feedItemContent",
        ".feedBodyInner",
    ])
    .unwrap()
});

/// UI chrome stripped from feed bodies.
pub static FEED_CHROME: LazyLock<SelectorSet> = LazyLock::new(|| {
    SelectorSet::new(&[
        "button",
        ".slds-button",
        ".moreActions",
        ".feed-actions",
        ".footer",
        ".uiPopupTrigger",
        "script",
        "style",
    ])
    .unwrap()
});
