use std::collections::HashMap;
use std::sync::LazyLock;

use super::text::{camelize, normalize_label};

/// Reserved key for fields whose section could not be determined.
pub const UNCLASSIFIED: &str = "other";

const FIELD_LABELS: &[(&str, &str)] = &[
    ("Brief ID", "briefId"),
    ("BRF ID", "briefId"),
    ("Campaign Program", "campaignProgram"),
    ("Campaign Name", "campaignName"),
    ("Account", "account"),
    ("Opportunity Name", "opportunityName"),
    ("Opportunity Owner", "opportunityOwner"),
    ("Account Owner", "accountOwner"),
    ("Primary Vertical", "primaryVertical"),
    ("Configuration", "configuration"),
    ("Stage", "stage"),
    ("Start Date", "startDate"),
    ("End Date", "endDate"),
    ("Business ID List", "businessIdList"),
    ("Store ID List", "storeIdList"),
    ("Asset Review Status", "assetReviewStatus"),
    ("DD Team to Have CC\u{2019}d on Reporting", "ddTeamCcOnReporting"),
    ("DD Team to Have CC'd on Reporting", "ddTeamCcOnReporting"),
    ("DD Team CC on Reporting", "ddTeamCcOnReporting"),
    ("Ops Asset Folder", "opsAssetFolder"),
    ("External Landing Page Link", "externalLandingPageLink"),
    ("Figma Link", "figmaLink"),
    ("Business Campaign Name", "businessCampaignName"),
    // budget & payments
    ("Budget", "budget"),
    ("Budget Period", "budgetPeriod"),
    ("Budget Notes", "budgetNotes"),
    ("Bid", "bid"),
    ("DoubleDash Bid", "doubleDashBid"),
    ("Categories Bid", "categoriesBid"),
    ("Non-DoubleDash Bid", "nonDoubleDashBid"),
    ("Collections Bid", "collectionsBid"),
    ("Search Bid", "searchBid"),
    ("Minimum Cart Subtotal", "minimumCartSubtotal"),
    ("Overall Max Number of Redemptions", "overallMaxNumberOfRedemptions"),
];

const SECTION_TITLES: &[(&str, &str)] = &[
    ("general", "general"),
    ("general (dri: submitter)", "general"),
    ("general (dri: requester)", "general"),
    ("budget and payments", "budgetAndPayments"),
    ("budget & payments", "budgetAndPayments"),
    ("budget and payments (dri: submitter)", "budgetAndPayments"),
    ("discounts and fees", "discountsAndFees"),
    ("discounts & fees", "discountsAndFees"),
    ("funding", "funding"),
];

const GENERAL_FIELDS: &[&str] = &[
    "briefId",
    "campaignProgram",
    "campaignName",
    "account",
    "opportunityName",
    "opportunityOwner",
    "accountOwner",
    "primaryVertical",
    "configuration",
    "stage",
    "startDate",
    "endDate",
    "businessIdList",
    "storeIdList",
    "assetReviewStatus",
    "ddTeamCcOnReporting",
    "opsAssetFolder",
    "externalLandingPageLink",
    "figmaLink",
    "businessCampaignName",
    // slug variants
    "brief",
    "opportunity_id",
    "quote_line",
    "quote_line_id",
    "netsuite_id",
    "agency_netsuite_id",
    "signed_contract",
    "agency_contract",
    "estimated_total_investment",
    "additional_notes_from_sales",
    "link_to_assets",
    "engagement_manager",
    "assets_approved",
    "currency",
    "tier",
    "entity_type",
    "owner",
    "banner_type",
    "product",
    "status",
    "brief_item",
    "in_campaign_change",
];

const BUDGET_AND_PAYMENT_FIELDS: &[&str] = &[
    "payment_protocol",
    "pricing_type",
    "daily_budget_cap",
    "advertiser_budget",
    "minimum_banner_fee",
    "unit_price",
    "paymentProtocol",
    "pricingType",
    "dailyBudgetCap",
    "advertiserBudget",
    "minimumBannerFee",
    "unitPrice",
];

const DISCOUNT_AND_FEE_FIELDS: &[&str] = &[
    "budget",
    "of_fee_to_invoice_advertiser",
    "%_of_fee_to_invoice_advertiser",
    "ofFeeToInvoiceAdvertiser",
];

const FUNDING_FIELDS: &[&str] = &[
    "does_this_product_have_co_funding",
    "what_is_the_co_funding_split_type",
    "what_is_the_dd_co_funding_source",
    "dd_percent_contribution_to_ad_unit",
    "dd_percent_contribution_to_cx_discount",
    "doesThisProductHaveCoFunding",
    "whatIsTheCoFundingSplitType",
    "whatIsTheDdCoFundingSource",
    "ddPercentContributionToAdUnit",
    "ddPercentContributionToCxDiscount",
];

const BUDGET_AND_PAYMENTS_SCHEMA: &[&str] = &[
    "budget",
    "budgetPeriod",
    "dailyBudgetCap",
    "paymentProtocol",
    "pricingType",
    "budgetNotes",
    "bid",
    "doubleDashBid",
    "categoriesBid",
    "nonDoubleDashBid",
    "collectionsBid",
    "searchBid",
    "minimumCartSubtotal",
    "overallMaxNumberOfRedemptions",
];

static FIELD_LABEL_TO_KEY: LazyLock<HashMap<String, &'static str>> = LazyLock::new(|| {
    FIELD_LABELS
        .iter()
        .map(|(label, key)| (normalize_label(label), *key))
        .collect()
});

static SECTION_TITLE_TO_KEY: LazyLock<HashMap<String, &'static str>> = LazyLock::new(|| {
    SECTION_TITLES
        .iter()
        .map(|(title, key)| (normalize_label(title), *key))
        .collect()
});

static FIELD_KEY_TO_SECTION: LazyLock<HashMap<String, &'static str>> = LazyLock::new(|| {
    let groups: [(&[&str], &'static str); 4] = [
        (GENERAL_FIELDS, "general"),
        (BUDGET_AND_PAYMENT_FIELDS, "budgetAndPayments"),
        (DISCOUNT_AND_FEE_FIELDS, "discountsAndFees"),
        (FUNDING_FIELDS, "funding"),
    ];
    let mut map = HashMap::new();
    for (keys, section) in groups {
        for key in keys {
            map.insert(key.to_lowercase(), section);
        }
    }
    map
});

/// Sections whose keys are always emitted, observed or not.
pub const SECTION_SCHEMAS: &[(&str, &[&str])] =
    &[("budgetAndPayments", BUDGET_AND_PAYMENTS_SCHEMA)];

/// Dictionary tier of field key resolution.
pub fn lookup_field_key(label: &str) -> Option<&'static str> {
    FIELD_LABEL_TO_KEY.get(&normalize_label(label)).copied()
}

/// Dictionary hit, else synthesized key. May be empty for labels with no alphanumerics.
pub fn field_key(label: &str) -> String {
    lookup_field_key(label)
        .map(str::to_string)
        .unwrap_or_else(|| camelize(label))
}

/// Dictionary tier of section key resolution.
pub fn lookup_section_key(title: &str) -> Option<&'static str> {
    SECTION_TITLE_TO_KEY.get(&normalize_label(title)).copied()
}

/// Section a known field lands in when no heading says otherwise.
pub fn default_section_for(field_key: &str) -> Option<&'static str> {
    FIELD_KEY_TO_SECTION.get(&field_key.to_lowercase()).copied()
}
