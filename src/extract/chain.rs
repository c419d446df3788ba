//! Generic runner for the selector fallback tables.
//!
//! Iterates a field's strategies in priority order; the first tier that
//! yields visible non-empty text wins and short-circuits the rest.

use crate::browser::page::PageDriver;
use crate::error::ScrapeError;
use crate::model::{PriceFragment, SelectorOutcome};
use std::time::Duration;
use tokio::time::Instant;

use super::strategies::{
    PriceQuery, TextStrategy, PRICE_STRATEGIES, TITLE_STRATEGIES,
};

const PROMINENT_POLL: Duration = Duration::from_millis(400);

pub async fn resolve_title<P: PageDriver>(page: &P) -> Result<SelectorOutcome, ScrapeError> {
    resolve_text(page, TITLE_STRATEGIES).await
}

async fn resolve_text<P: PageDriver>(
    page: &P,
    strategies: &[TextStrategy],
) -> Result<SelectorOutcome, ScrapeError> {
    for strategy in strategies {
        match page.wait_for_text(strategy.selector, strategy.wait).await? {
            Some(value) => {
                tracing::debug!("Strategy {} matched: {:?}", strategy.id, value);
                return Ok(SelectorOutcome::Found {
                    value,
                    strategy_id: strategy.id,
                });
            }
            None => tracing::debug!("Strategy {} missed, falling through", strategy.id),
        }
    }
    Ok(SelectorOutcome::NotFound)
}

/// Runs the price tiers; each yields a raw fragment for the locale parser.
/// `Ok(None)` means every tier was exhausted; the caller decides whether
/// that is an unavailability or a failure.
pub async fn resolve_price<P: PageDriver>(
    page: &P,
) -> Result<Option<(PriceFragment, &'static str)>, ScrapeError> {
    for strategy in PRICE_STRATEGIES {
        let fragment = match &strategy.query {
            PriceQuery::Offscreen { selector } => page
                .wait_for_text(selector, strategy.wait)
                .await?
                .map(PriceFragment::Offscreen),
            PriceQuery::Split { whole, fraction } => {
                match page.wait_for_text(whole, strategy.wait).await? {
                    Some(whole_text) => {
                        // The fraction span renders together with the whole
                        // span; no extra wait, absence means ",00".
                        let fraction_text = page.find_text(fraction).await?;
                        Some(PriceFragment::Split {
                            whole: whole_text,
                            fraction: fraction_text,
                        })
                    }
                    None => None,
                }
            }
            PriceQuery::Prominent { scope } => {
                wait_for_prominent(page, scope, strategy.wait).await?
            }
        };

        if let Some(fragment) = fragment {
            tracing::debug!("Strategy {} produced {:?}", strategy.id, fragment);
            return Ok(Some((fragment, strategy.id)));
        }
        tracing::debug!("Strategy {} missed, falling through", strategy.id);
    }
    Ok(None)
}

/// Polls the in-page prominence measurement until it finds a candidate or
/// the tier's budget runs out.
async fn wait_for_prominent<P: PageDriver>(
    page: &P,
    scope: &str,
    wait: Duration,
) -> Result<Option<PriceFragment>, ScrapeError> {
    let script = prominent_price_script(scope);
    let deadline = Instant::now() + wait;
    loop {
        let value = page.evaluate_json(&script).await?;
        if let Some(fragment) = fragment_from_value(&value) {
            return Ok(Some(fragment));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        tokio::time::sleep(PROMINENT_POLL).await;
    }
}

/// Picks the `.a-price` with the largest computed font size under `scope`:
/// the displayed price renders bigger than strikethrough list prices and
/// alternate-payment offers. Ties keep document order. Best-effort
/// heuristic, not a guarantee.
fn prominent_price_script(scope: &str) -> String {
    let quoted = serde_json::Value::String(scope.to_string()).to_string();
    format!(
        r#"
        (function() {{
            var root = document.querySelector({quoted});
            if (!root) return null;
            var candidates = root.querySelectorAll('.a-price');
            var best = null;
            var bestSize = 0;
            for (var i = 0; i < candidates.length; i++) {{
                var el = candidates[i];
                var rect = el.getBoundingClientRect();
                if (rect.width <= 0 || rect.height <= 0) continue;
                var size = parseFloat(window.getComputedStyle(el).fontSize) || 0;
                if (size > bestSize) {{ bestSize = size; best = el; }}
            }}
            if (!best) return null;
            var off = best.querySelector('.a-offscreen');
            if (off) {{
                var text = (off.textContent || '').trim();
                if (text) return {{ kind: 'offscreen', text: text }};
            }}
            var whole = best.querySelector('.a-price-whole');
            if (!whole) return null;
            var frac = best.querySelector('.a-price-fraction');
            return {{
                kind: 'split',
                whole: (whole.textContent || '').trim(),
                fraction: frac ? (frac.textContent || '').trim() : null
            }};
        }})()
        "#
    )
}

fn fragment_from_value(value: &serde_json::Value) -> Option<PriceFragment> {
    match value.get("kind").and_then(|k| k.as_str()) {
        Some("offscreen") => value
            .get("text")
            .and_then(|t| t.as_str())
            .filter(|t| !t.is_empty())
            .map(|t| PriceFragment::Offscreen(t.to_string())),
        Some("split") => {
            let whole = value.get("whole").and_then(|w| w.as_str())?;
            if whole.is_empty() {
                return None;
            }
            let fraction = value
                .get("fraction")
                .and_then(|f| f.as_str())
                .filter(|f| !f.is_empty())
                .map(|f| f.to_string());
            Some(PriceFragment::Split {
                whole: whole.to_string(),
                fraction,
            })
        }
        _ => None,
    }
}
