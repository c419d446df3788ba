//! Selector strategy tables for amazon.com.br product pages.
//!
//! The page renders different DOM shapes depending on session, locale and
//! AB-test bucket, so every field carries an ordered fallback list: most
//! specific and most reliable first, each tier with its own wait budget
//! (generous for the likely tiers, short for the long shots, bounding the
//! worst-case total). Adding or reordering a tier is a data change here,
//! not a control-flow change in the chain runner.
//!
//! When parsing breaks in production, capture the HTML, adjust the tables,
//! and add a fixture.

use std::time::Duration;

/// One DOM-query approach for a text field, identified by priority tier.
#[derive(Debug)]
pub struct TextStrategy {
    pub id: &'static str,
    pub selector: &'static str,
    pub wait: Duration,
}

pub const TITLE_STRATEGIES: &[TextStrategy] = &[
    TextStrategy {
        id: "title-id",
        selector: "#productTitle",
        wait: Duration::from_secs(10),
    },
    TextStrategy {
        id: "title-span",
        selector: "#title span",
        wait: Duration::from_secs(5),
    },
    TextStrategy {
        id: "title-class",
        selector: "h1.a-size-large span, span.product-title-word-break",
        wait: Duration::from_secs(3),
    },
    TextStrategy {
        id: "title-aria",
        selector: "h1[aria-label*='produto' i], h1[aria-label*='product' i]",
        wait: Duration::from_secs(2),
    },
];

/// How a price tier queries the DOM.
#[derive(Debug)]
pub enum PriceQuery {
    /// In-page measurement: among the `.a-price` candidates under `scope`,
    /// the one with the largest rendered font size is the price the buyer
    /// actually sees; strikethrough and installment prices render smaller.
    Prominent { scope: &'static str },
    /// Screen-reader span holding the full localized price string.
    Offscreen { selector: &'static str },
    /// Visible whole/fraction split spans.
    Split {
        whole: &'static str,
        fraction: &'static str,
    },
}

#[derive(Debug)]
pub struct PriceStrategy {
    pub id: &'static str,
    pub query: PriceQuery,
    pub wait: Duration,
}

pub const PRICE_STRATEGIES: &[PriceStrategy] = &[
    PriceStrategy {
        id: "price-prominent",
        query: PriceQuery::Prominent {
            scope: "#corePrice_feature_div, #apex_desktop",
        },
        wait: Duration::from_secs(8),
    },
    PriceStrategy {
        id: "price-core-offscreen",
        query: PriceQuery::Offscreen {
            selector: "#corePrice_feature_div .a-price .a-offscreen",
        },
        wait: Duration::from_secs(5),
    },
    PriceStrategy {
        id: "price-core-split",
        query: PriceQuery::Split {
            whole: "#corePrice_feature_div .a-price-whole",
            fraction: "#corePrice_feature_div .a-price-fraction",
        },
        wait: Duration::from_secs(3),
    },
    PriceStrategy {
        id: "price-any-split",
        query: PriceQuery::Split {
            whole: ".a-price-whole",
            fraction: ".a-price-fraction",
        },
        wait: Duration::from_secs(2),
    },
    PriceStrategy {
        id: "price-any-offscreen",
        query: PriceQuery::Offscreen {
            selector: ".a-price .a-offscreen",
        },
        wait: Duration::from_secs(2),
    },
];

/// Where out-of-stock messaging shows up.
pub const AVAILABILITY_SELECTORS: &[&str] = &[
    "#availability span",
    "#availability",
    "#outOfStock .a-color-price",
    "#outOfStock",
];

/// Out-of-stock phrasing, Portuguese and English. Matched lowercase.
pub const UNAVAILABLE_PHRASES: &[&str] = &[
    "não disponível",
    "indisponível",
    "em falta",
    "fora de estoque",
    "currently unavailable",
    "temporarily out of stock",
];

/// Captcha / robot-check phrasing, Portuguese and English. Matched lowercase.
pub const BLOCK_PHRASES: &[&str] = &[
    "captcha",
    "robô",
    "robot",
    "digite os caracteres",
    "enter the characters",
    "verifique que você",
    "verify you",
];

/// Breadcrumb trail; the first link is the storefront "home" link, not a
/// category, and is skipped by the extractor.
pub const BREADCRUMB_LINKS: &str = "#wayfinding-breadcrumbs_feature_div ul li a";

/// Product-details tables that sometimes carry a category/department row.
pub const DETAILS_ROWS: &str =
    "#productDetails_detailBullets_sections1 tr, #productDetails_techSpec_section_1 tr";

pub const CATEGORY_META: &str = "meta[property='product:category']";
