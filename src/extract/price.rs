//! Locale-aware price parsing for Brazilian-Portuguese formatting:
//! `.` separates thousands, `,` separates decimals.
//!
//! The page renders the price two ways depending on context, a single
//! screen-reader string ("R$ 1.234,56") or visually split whole/fraction
//! spans ("1.498," + "33"), and both must reconcile to the same number.

use crate::error::ScrapeError;
use crate::model::PriceFragment;
use regex::Regex;
use std::sync::LazyLock;

static NUMERIC_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d[\d.,]*").unwrap());

pub fn parse_fragment(fragment: &PriceFragment) -> Result<f64, ScrapeError> {
    let value = match fragment {
        PriceFragment::Offscreen(text) => parse_offscreen(text)?,
        PriceFragment::Split { whole, fraction } => parse_split(whole, fraction.as_deref())?,
    };

    if !value.is_finite() || value < 0.0 {
        return Err(ScrapeError::PriceFormat(format!("{:?}", fragment)));
    }

    // Clamp float noise; prices carry at most two decimal places.
    Ok((value * 100.0).round() / 100.0)
}

fn parse_offscreen(text: &str) -> Result<f64, ScrapeError> {
    let run = NUMERIC_RUN
        .find(text)
        .ok_or_else(|| ScrapeError::PriceFormat(text.to_string()))?;

    let normalized = run.as_str().replace('.', "").replace(',', ".");
    normalized
        .parse()
        .map_err(|_| ScrapeError::PriceFormat(text.to_string()))
}

fn parse_split(whole: &str, fraction: Option<&str>) -> Result<f64, ScrapeError> {
    let mut cleaned: String = whole
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();

    // The whole span often carries a trailing decorative comma ("1.498,").
    if cleaned.ends_with(',') {
        cleaned.pop();
    }
    let cleaned = cleaned.replace('.', "");

    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return Err(ScrapeError::PriceFormat(format!(
            "{}|{}",
            whole,
            fraction.unwrap_or("")
        )));
    }

    let fraction_digits: String = fraction
        .unwrap_or("00")
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    let fraction_digits = if fraction_digits.is_empty() {
        "00".to_string()
    } else {
        fraction_digits
    };

    format!("{}.{}", cleaned, fraction_digits)
        .parse()
        .map_err(|_| {
            ScrapeError::PriceFormat(format!("{}|{}", whole, fraction.unwrap_or("")))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offscreen(text: &str) -> PriceFragment {
        PriceFragment::Offscreen(text.to_string())
    }

    fn split(whole: &str, fraction: Option<&str>) -> PriceFragment {
        PriceFragment::Split {
            whole: whole.to_string(),
            fraction: fraction.map(|f| f.to_string()),
        }
    }

    #[test]
    fn offscreen_brazilian_format() {
        assert_eq!(parse_fragment(&offscreen("R$ 1.234,56")).unwrap(), 1234.56);
        assert_eq!(parse_fragment(&offscreen("R$ 89,90")).unwrap(), 89.90);
        assert_eq!(parse_fragment(&offscreen("R$ 42")).unwrap(), 42.0);
        assert_eq!(parse_fragment(&offscreen("R$ 12.345.678,90")).unwrap(), 12345678.90);
    }

    #[test]
    fn split_with_thousands_dots_and_trailing_comma() {
        assert_eq!(parse_fragment(&split("1.498,", Some("33"))).unwrap(), 1498.33);
        assert_eq!(parse_fragment(&split("1.234,", Some("56"))).unwrap(), 1234.56);
    }

    #[test]
    fn split_missing_fraction_defaults_to_zero_cents() {
        assert_eq!(parse_fragment(&split("42,", Some(""))).unwrap(), 42.00);
        assert_eq!(parse_fragment(&split("42,", None)).unwrap(), 42.00);
    }

    #[test]
    fn both_shapes_agree() {
        let from_offscreen = parse_fragment(&offscreen("R$ 1.234,56")).unwrap();
        let from_split = parse_fragment(&split("1.234,", Some("56"))).unwrap();
        assert_eq!(from_offscreen, from_split);
    }

    #[test]
    fn rejects_digit_free_fragments() {
        assert!(matches!(
            parse_fragment(&offscreen("Indisponível")),
            Err(ScrapeError::PriceFormat(_))
        ));
        assert!(matches!(
            parse_fragment(&split("R$ --", Some("??"))),
            Err(ScrapeError::PriceFormat(_))
        ));
        assert!(matches!(
            parse_fragment(&offscreen("")),
            Err(ScrapeError::PriceFormat(_))
        ));
    }

    #[test]
    fn rejects_interior_comma_in_whole_part() {
        assert!(parse_fragment(&split("1,498", Some("33"))).is_err());
    }

    #[test]
    fn whole_part_with_currency_noise_still_parses() {
        assert_eq!(parse_fragment(&split("R$ 199,", Some("99"))).unwrap(), 199.99);
    }
}
