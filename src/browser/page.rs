use crate::error::ScrapeError;
use async_trait::async_trait;
use chromiumoxide::Page;
use std::time::Duration;
use tokio::time::Instant;

const POLL_INTERVAL: Duration = Duration::from_millis(250);
const READY_STATE_WAIT: Duration = Duration::from_secs(10);

/// The DOM capability surface the extraction engine needs from a page.
///
/// The live implementation drives Chrome over CDP; tests substitute a
/// fixture-backed fake. Everything above this trait is backend-independent.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate and wait until the DOM is usable. DOM-content-loaded is the
    /// bar; waiting for network idle never terminates on ad-heavy pages.
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), ScrapeError>;

    /// Poll until `selector` is visible with non-empty text, up to `timeout`.
    /// `Ok(None)` means the strategy simply did not match; only transport
    /// failures are errors.
    async fn wait_for_text(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<String>, ScrapeError>;

    /// Single immediate probe, no waiting.
    async fn find_text(&self, selector: &str) -> Result<Option<String>, ScrapeError>;

    /// Run a JS expression in the page and return its JSON value.
    async fn evaluate_json(&self, script: &str) -> Result<serde_json::Value, ScrapeError>;

    /// Full current HTML document.
    async fn content(&self) -> Result<String, ScrapeError>;

    /// Visible body text, for page-state classification.
    async fn body_text(&self) -> Result<String, ScrapeError>;

    async fn close(&self) -> Result<(), ScrapeError>;
}

/// Something that can hand out fresh pages, one per extraction attempt.
#[async_trait]
pub trait PageProvider: Send + Sync {
    type Page: PageDriver;

    async fn acquire_page(&self) -> Result<Self::Page, ScrapeError>;
}

#[async_trait]
impl<P: PageProvider> PageProvider for std::sync::Arc<P> {
    type Page = P::Page;

    async fn acquire_page(&self) -> Result<Self::Page, ScrapeError> {
        P::acquire_page(self).await
    }
}

/// `PageDriver` over a chromiumoxide page.
pub struct CdpPage {
    page: Page,
}

impl CdpPage {
    pub fn new(page: Page) -> Self {
        CdpPage { page }
    }

    async fn probe_text(&self, selector: &str) -> Result<Option<String>, ScrapeError> {
        let script = visible_text_probe(selector);
        let value = self.evaluate_json(&script).await?;
        Ok(value.as_str().map(|s| s.to_string()).filter(|s| !s.is_empty()))
    }
}

#[async_trait]
impl PageDriver for CdpPage {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), ScrapeError> {
        tracing::info!("Navigating to: {}", url);

        tokio::time::timeout(timeout, self.page.goto(url))
            .await
            .map_err(|_| ScrapeError::Navigation(format!("Timed out loading {}", url)))?
            .map_err(|e| {
                ScrapeError::Navigation(format!("Failed to navigate to {}: {}", url, e))
            })?;

        // Wait for document.readyState to leave 'loading'; bounded so a page
        // stuck on trackers cannot hold us past the navigation budget.
        let deadline = Instant::now() + READY_STATE_WAIT;
        loop {
            let ready = self
                .page
                .evaluate("document.readyState")
                .await
                .ok()
                .and_then(|v| v.into_value::<String>().ok())
                .unwrap_or_default();
            if ready == "interactive" || ready == "complete" || Instant::now() >= deadline {
                break;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }

        Ok(())
    }

    async fn wait_for_text(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<String>, ScrapeError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(text) = self.probe_text(selector).await? {
                return Ok(Some(text));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn find_text(&self, selector: &str) -> Result<Option<String>, ScrapeError> {
        self.probe_text(selector).await
    }

    async fn evaluate_json(&self, script: &str) -> Result<serde_json::Value, ScrapeError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| ScrapeError::Navigation(format!("Script evaluation failed: {}", e)))?;
        Ok(result
            .into_value::<serde_json::Value>()
            .unwrap_or(serde_json::Value::Null))
    }

    async fn content(&self) -> Result<String, ScrapeError> {
        self.page
            .content()
            .await
            .map_err(|e| ScrapeError::Navigation(format!("Failed to get page content: {}", e)))
    }

    async fn body_text(&self) -> Result<String, ScrapeError> {
        let value = self
            .evaluate_json("document.body ? document.body.innerText : ''")
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn close(&self) -> Result<(), ScrapeError> {
        self.page
            .clone()
            .close()
            .await
            .map_err(|e| ScrapeError::Navigation(format!("Failed to close page: {}", e)))?;
        Ok(())
    }
}

/// JS probe returning the trimmed text of the first visible match, or null.
/// Screen-reader spans (1px, clipped) count as visible; `display: none` and
/// `visibility: hidden` do not.
fn visible_text_probe(selector: &str) -> String {
    let quoted = serde_json::Value::String(selector.to_string()).to_string();
    format!(
        r#"
        (function() {{
            var el = document.querySelector({quoted});
            if (!el) return null;
            var style = window.getComputedStyle(el);
            if (style.display === 'none' || style.visibility === 'hidden') return null;
            var rect = el.getBoundingClientRect();
            if (rect.width <= 0 || rect.height <= 0) return null;
            var text = (el.textContent || '').trim();
            return text.length ? text : null;
        }})()
        "#
    )
}
