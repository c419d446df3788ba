//! Drives one full extraction: navigate → settle → title → price or
//! availability → categories, with retry-with-delay on transient failures
//! and a guaranteed page close on every path.

use crate::browser::page::{PageDriver, PageProvider};
use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::model::{Asin, PageState, ScrapedProduct, SelectorOutcome};
use async_trait::async_trait;

use super::{categories, chain, classify, price};

/// The boundary the scheduling/persistence layer calls into. The batch
/// throttler is generic over this so it can be exercised without a browser.
#[async_trait]
pub trait ProductExtractor: Send + Sync {
    async fn extract(&self, asin: &Asin) -> Result<ScrapedProduct, ScrapeError>;
}

pub struct Extractor<P: PageProvider> {
    provider: P,
    config: ScraperConfig,
}

impl<P: PageProvider> Extractor<P> {
    pub fn new(provider: P, config: ScraperConfig) -> Self {
        Extractor { provider, config }
    }

    /// Either a fully populated observation or a typed error; never a
    /// partially filled silent success. Transient failures are retried
    /// `config.max_retries` times with a fixed delay; blocks and session
    /// launch failures propagate immediately.
    pub async fn extract_product(&self, asin: &Asin) -> Result<ScrapedProduct, ScrapeError> {
        self.extract_with_retries(asin, self.config.max_retries).await
    }

    /// Same as [`extract_product`](Self::extract_product) with an explicit
    /// retry budget: `max_retries = 2` means up to three total attempts.
    pub async fn extract_with_retries(
        &self,
        asin: &Asin,
        max_retries: u32,
    ) -> Result<ScrapedProduct, ScrapeError> {
        let total_attempts = max_retries + 1;
        let mut attempt = 1;
        loop {
            match self.attempt(asin).await {
                Ok(product) => return Ok(product),
                Err(e) if e.is_retryable() && attempt < total_attempts => {
                    tracing::warn!(
                        "Extraction attempt {}/{} for {} failed: {}; retrying in {:?}",
                        attempt,
                        total_attempts,
                        asin,
                        e,
                        self.config.retry_delay
                    );
                    attempt += 1;
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                Err(e) => {
                    tracing::warn!(
                        "Extraction for {} gave up on attempt {}/{}: {}",
                        asin,
                        attempt,
                        total_attempts,
                        e
                    );
                    return Err(e);
                }
            }
        }
    }

    /// One attempt on one fresh page. The page closes on every exit path
    /// so no handle leaks across retries.
    async fn attempt(&self, asin: &Asin) -> Result<ScrapedProduct, ScrapeError> {
        let page = self.provider.acquire_page().await?;
        let result = self.drive(&page, asin).await;
        if let Err(e) = page.close().await {
            tracing::debug!("Failed to close page for {}: {}", asin, e);
        }
        result
    }

    async fn drive(&self, page: &P::Page, asin: &Asin) -> Result<ScrapedProduct, ScrapeError> {
        let url = self.config.product_url(asin);
        page.navigate(&url, self.config.navigation_timeout).await?;

        // Price/title widgets hydrate after DOM-content-loaded.
        tokio::time::sleep(self.config.settle_delay).await;

        let title = match chain::resolve_title(page).await? {
            SelectorOutcome::Found { value, strategy_id } => {
                tracing::debug!("Title for {} via {}", asin, strategy_id);
                value.trim().to_string()
            }
            SelectorOutcome::NotFound => {
                return Err(self.explain_title_miss(page).await);
            }
        };
        if title.is_empty() {
            return Err(ScrapeError::Extraction("title not found".into()));
        }

        let price_outcome = chain::resolve_price(page).await?;

        // Categories work off the settled document snapshot; any failure
        // here is logged and swallowed, never fatal.
        let html = page.content().await.unwrap_or_default();
        debug_dump_html(&html, asin);
        let categories = categories::extract_categories(&html);
        if categories.is_none() {
            tracing::debug!("No category breadcrumb found for {}", asin);
        }

        match price_outcome {
            Some((fragment, strategy_id)) => {
                tracing::debug!("Price for {} via {}", asin, strategy_id);
                let value = price::parse_fragment(&fragment)?;
                tracing::info!("Extracted {}: R$ {:.2}", asin, value);
                Ok(ScrapedProduct::in_stock(
                    asin.clone(),
                    title,
                    value,
                    categories,
                ))
            }
            None => {
                let body = page.body_text().await.unwrap_or_default();
                match classify::classify_page(&body, &html) {
                    PageState::Unavailable(reason) => {
                        tracing::info!("{} is unavailable: {}", asin, reason);
                        Ok(ScrapedProduct::unavailable(
                            asin.clone(),
                            title,
                            Some(reason),
                            categories,
                        ))
                    }
                    PageState::Blocked => Err(ScrapeError::Blocked),
                    PageState::Ok => Err(ScrapeError::Extraction("price not found".into())),
                }
            }
        }
    }

    /// A missing title is either an anti-bot wall or stale selectors;
    /// only the block verdict changes the error type.
    async fn explain_title_miss(&self, page: &P::Page) -> ScrapeError {
        let body = page.body_text().await.unwrap_or_default();
        let html = page.content().await.unwrap_or_default();
        match classify::classify_page(&body, &html) {
            PageState::Blocked => ScrapeError::Blocked,
            _ => ScrapeError::Extraction("title not found".into()),
        }
    }
}

#[async_trait]
impl<P: PageProvider> ProductExtractor for Extractor<P> {
    async fn extract(&self, asin: &Asin) -> Result<ScrapedProduct, ScrapeError> {
        self.extract_product(asin).await
    }
}

/// Dump the page HTML to /tmp when debug logging is enabled, for selector
/// maintenance against the live markup.
fn debug_dump_html(html: &str, asin: &Asin) {
    if tracing::enabled!(tracing::Level::DEBUG) && !html.is_empty() {
        let dump_path = format!("/tmp/preco_{}.html", asin);
        let _ = std::fs::write(&dump_path, html);
        tracing::debug!("Dumped HTML to {}", dump_path);
    }
}
