use crate::error::ScrapeError;
use serde::{Deserialize, Serialize};

/// Amazon Standard Identification Number, normalized to uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Asin(String);

impl Asin {
    /// Accepts exactly 10 alphanumeric characters, case-insensitive.
    pub fn parse(input: &str) -> Result<Self, ScrapeError> {
        let trimmed = input.trim();
        if trimmed.len() == 10 && trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            Ok(Asin(trimmed.to_ascii_uppercase()))
        } else {
            Err(ScrapeError::InvalidAsin(input.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Asin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One price observation, handed to the persistence layer as-is.
///
/// `available == false` always comes with `price == None`; the
/// constructors below are the only way this struct is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedProduct {
    pub asin: Asin,
    pub title: String,
    pub price: Option<f64>,
    pub available: bool,
    pub unavailable_reason: Option<String>,
    pub categories: Option<Vec<String>>,
}

impl ScrapedProduct {
    pub fn in_stock(asin: Asin, title: String, price: f64, categories: Option<Vec<String>>) -> Self {
        ScrapedProduct {
            asin,
            title,
            price: Some(price),
            available: true,
            unavailable_reason: None,
            categories,
        }
    }

    pub fn unavailable(
        asin: Asin,
        title: String,
        reason: Option<String>,
        categories: Option<Vec<String>>,
    ) -> Self {
        ScrapedProduct {
            asin,
            title,
            price: None,
            available: false,
            unavailable_reason: reason,
            categories,
        }
    }
}

/// Result of running one selector chain. "Not found" is a value, not an
/// error; only transport failures surface as `Err` from the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorOutcome {
    Found {
        value: String,
        strategy_id: &'static str,
    },
    NotFound,
}

/// Raw price material, in whichever of the two shapes the page rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceFragment {
    /// Screen-reader span with the full localized string, e.g. "R$ 1.234,56".
    Offscreen(String),
    /// Visually split spans; the whole part may carry thousands dots and a
    /// trailing decorative comma, e.g. ("1.498,", "33").
    Split {
        whole: String,
        fraction: Option<String>,
    },
}

/// Verdict when the happy-path selectors came up empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageState {
    /// Nothing special detected; the failure stays unexplained.
    Ok,
    /// Captcha / robot-check interstitial.
    Blocked,
    /// Product page loaded but the item cannot be bought.
    Unavailable(String),
}

/// Tally of one batch refresh run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// Extractions that produced a price.
    pub updated: u32,
    /// Extractions that found the product unavailable.
    pub skipped: u32,
    pub errors: Vec<BatchError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchError {
    pub asin: String,
    pub message: String,
}

/// Emitted after each batch item for progress reporting.
#[derive(Debug)]
pub struct BatchProgress<'a> {
    pub index: usize,
    pub total: usize,
    pub asin: &'a Asin,
    pub outcome: BatchItemOutcome,
}

#[derive(Debug, Clone)]
pub enum BatchItemOutcome {
    Updated { price: f64 },
    Skipped { reason: Option<String> },
    Failed { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asin_normalizes_to_uppercase() {
        let asin = Asin::parse("b08n5wrwnw").unwrap();
        assert_eq!(asin.as_str(), "B08N5WRWNW");
    }

    #[test]
    fn asin_rejects_bad_lengths_and_symbols() {
        assert!(Asin::parse("B08N5").is_err());
        assert!(Asin::parse("B08N5WRWNW1").is_err());
        assert!(Asin::parse("B08N5-RWNW").is_err());
        assert!(Asin::parse("").is_err());
    }

    #[test]
    fn asin_tolerates_surrounding_whitespace() {
        let asin = Asin::parse("  B08N5WRWNW\n").unwrap();
        assert_eq!(asin.as_str(), "B08N5WRWNW");
    }

    #[test]
    fn constructors_uphold_availability_invariant() {
        let asin = Asin::parse("B08N5WRWNW").unwrap();
        let live = ScrapedProduct::in_stock(asin.clone(), "Mouse".into(), 89.90, None);
        assert!(live.available && live.price.is_some());

        let gone = ScrapedProduct::unavailable(asin, "Mouse".into(), None, None);
        assert!(!gone.available && gone.price.is_none());
    }
}
