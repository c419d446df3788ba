//! Page-state classification for failed extractions.
//!
//! "Amazon blocked us", "product legitimately out of stock" and "our
//! selectors are stale" need different reactions: stop retrying, record
//! the unavailability, or retry and flag selector maintenance. This runs
//! only after the happy-path selectors came up empty.

use crate::model::PageState;
use scraper::{Html, Selector};

use super::strategies::{AVAILABILITY_SELECTORS, BLOCK_PHRASES, UNAVAILABLE_PHRASES};

pub fn classify_page(body_text: &str, html: &str) -> PageState {
    let lowered = body_text.to_lowercase();
    if BLOCK_PHRASES.iter().any(|phrase| lowered.contains(phrase)) {
        return PageState::Blocked;
    }

    if let Some(reason) = availability_reason(html) {
        return PageState::Unavailable(reason);
    }

    PageState::Ok
}

/// Out-of-stock message from the known availability widgets, verbatim, to
/// be surfaced to the user as the unavailability reason.
pub fn availability_reason(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    for selector_str in AVAILABILITY_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        for element in doc.select(&selector) {
            let text: String = element
                .text()
                .collect::<Vec<_>>()
                .join(" ")
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            if text.is_empty() {
                continue;
            }
            let lowered = text.to_lowercase();
            if UNAVAILABLE_PHRASES
                .iter()
                .any(|phrase| lowered.contains(phrase))
            {
                return Some(text);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captcha_body_is_blocked() {
        let state = classify_page(
            "Enter the characters you see below. Sorry, we just need to \
             make sure you're not a robot.",
            "<html><body></body></html>",
        );
        assert_eq!(state, PageState::Blocked);
    }

    #[test]
    fn portuguese_captcha_is_blocked() {
        let state = classify_page(
            "Digite os caracteres que você vê abaixo",
            "<html><body></body></html>",
        );
        assert_eq!(state, PageState::Blocked);
    }

    #[test]
    fn out_of_stock_widget_is_unavailable_with_reason() {
        let html = r#"<html><body>
            <div id="availability"><span>Currently unavailable.</span></div>
        </body></html>"#;
        let state = classify_page("some product text", html);
        assert_eq!(
            state,
            PageState::Unavailable("Currently unavailable.".into())
        );
    }

    #[test]
    fn portuguese_out_of_stock_is_unavailable() {
        let html = r#"<html><body>
            <div id="availability"><span>Não disponível no momento.</span></div>
        </body></html>"#;
        assert!(matches!(
            classify_page("", html),
            PageState::Unavailable(reason) if reason.contains("Não disponível")
        ));
    }

    #[test]
    fn in_stock_availability_text_is_not_flagged() {
        let html = r#"<html><body>
            <div id="availability"><span>Em estoque.</span></div>
        </body></html>"#;
        assert_eq!(classify_page("Em estoque", html), PageState::Ok);
    }

    #[test]
    fn unremarkable_page_classifies_ok() {
        assert_eq!(
            classify_page("just a page", "<html><body><p>hi</p></body></html>"),
            PageState::Ok
        );
    }

    #[test]
    fn block_check_runs_before_availability() {
        // A captcha interstitial mentioning stock must still read as a block.
        let html = r#"<html><body>
            <div id="availability"><span>currently unavailable</span></div>
        </body></html>"#;
        let state = classify_page("type the captcha to continue", html);
        assert_eq!(state, PageState::Blocked);
    }
}
