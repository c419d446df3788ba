//! Best-effort category breadcrumb extraction, root to leaf.
//!
//! Categories are optional metadata: every path here returns `None` rather
//! than an error, and the orchestrator never fails an extraction over them.

use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

use super::strategies::{BREADCRUMB_LINKS, CATEGORY_META, DETAILS_ROWS};

static CATEGORY_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)categor|department|departamento").unwrap());

pub fn extract_categories(html: &str) -> Option<Vec<String>> {
    let doc = Html::parse_document(html);
    from_breadcrumbs(&doc)
        .or_else(|| from_details_table(&doc))
        .or_else(|| from_meta_tag(&doc))
}

/// The breadcrumb trail; its first link is the storefront home link, not a
/// category.
fn from_breadcrumbs(doc: &Html) -> Option<Vec<String>> {
    let selector = Selector::parse(BREADCRUMB_LINKS).ok()?;
    let categories: Vec<String> = doc
        .select(&selector)
        .skip(1)
        .map(collapse_text)
        .filter(|text| !text.is_empty())
        .collect();
    non_empty(categories)
}

fn from_details_table(doc: &Html) -> Option<Vec<String>> {
    let row_selector = Selector::parse(DETAILS_ROWS).ok()?;
    let label_selector = Selector::parse("th").ok()?;
    let value_selector = Selector::parse("td").ok()?;

    for row in doc.select(&row_selector) {
        let Some(label) = row.select(&label_selector).next() else {
            continue;
        };
        if !CATEGORY_LABEL.is_match(&collapse_text(label)) {
            continue;
        }
        let Some(value) = row.select(&value_selector).next() else {
            continue;
        };
        let categories = split_path(&collapse_text(value));
        if let Some(categories) = non_empty(categories) {
            return Some(categories);
        }
    }
    None
}

fn from_meta_tag(doc: &Html) -> Option<Vec<String>> {
    let selector = Selector::parse(CATEGORY_META).ok()?;
    let content = doc.select(&selector).next()?.value().attr("content")?;
    non_empty(split_path(content))
}

/// Category paths arrive delimited by colon, pipe or ">" depending on the
/// source.
fn split_path(raw: &str) -> Vec<String> {
    raw.split([':', '|', '>'])
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

fn collapse_text(element: scraper::ElementRef) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_empty(categories: Vec<String>) -> Option<Vec<String>> {
    if categories.is_empty() {
        None
    } else {
        Some(categories)
    }
}
