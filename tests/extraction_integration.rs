//! End-to-end extraction tests over fixture pages.
//!
//! A `FixturePage` implements the page-driver trait against static HTML,
//! so the whole orchestrator pipeline (selector chains, price parsing,
//! classification, retry policy, page lifecycle) runs without a browser.

use async_trait::async_trait;
use preco_tracker::error::ScrapeError;
use preco_tracker::extract::chain;
use preco_tracker::model::{Asin, BatchProgress, ScrapedProduct, SelectorOutcome};
use preco_tracker::{BatchRunner, Extractor, PageDriver, PageProvider, ProductExtractor, ScraperConfig};
use scraper::{Html, Selector};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct FixturePage {
    html: String,
    body_text: String,
    navigation_error: Option<String>,
    closed: Arc<AtomicBool>,
}

impl FixturePage {
    fn new(html: &str) -> Self {
        let body_text = Html::parse_document(html)
            .root_element()
            .text()
            .collect::<Vec<_>>()
            .join(" ");
        FixturePage {
            html: html.to_string(),
            body_text,
            navigation_error: None,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    fn failing_navigation(message: &str) -> Self {
        let mut page = FixturePage::new("<html><body></body></html>");
        page.navigation_error = Some(message.to_string());
        page
    }

    fn closed_flag(&self) -> Arc<AtomicBool> {
        self.closed.clone()
    }

    fn select_text(&self, selector: &str) -> Option<String> {
        let doc = Html::parse_document(&self.html);
        let sel = Selector::parse(selector).ok()?;
        doc.select(&sel)
            .map(|el| {
                el.text()
                    .collect::<Vec<_>>()
                    .join(" ")
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .find(|text| !text.is_empty())
    }
}

#[async_trait]
impl PageDriver for FixturePage {
    async fn navigate(&self, _url: &str, _timeout: Duration) -> Result<(), ScrapeError> {
        match &self.navigation_error {
            Some(message) => Err(ScrapeError::Navigation(message.clone())),
            None => Ok(()),
        }
    }

    async fn wait_for_text(
        &self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<Option<String>, ScrapeError> {
        Ok(self.select_text(selector))
    }

    async fn find_text(&self, selector: &str) -> Result<Option<String>, ScrapeError> {
        Ok(self.select_text(selector))
    }

    async fn evaluate_json(&self, _script: &str) -> Result<serde_json::Value, ScrapeError> {
        // Fixtures have no layout engine; the prominence tier never matches
        // and the chain falls through to the selector tiers.
        Ok(serde_json::Value::Null)
    }

    async fn content(&self) -> Result<String, ScrapeError> {
        Ok(self.html.clone())
    }

    async fn body_text(&self) -> Result<String, ScrapeError> {
        Ok(self.body_text.clone())
    }

    async fn close(&self) -> Result<(), ScrapeError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out one scripted page per extraction attempt and counts acquisitions.
struct FixtureProvider {
    pages: Mutex<VecDeque<FixturePage>>,
    acquired: AtomicUsize,
}

impl FixtureProvider {
    fn new(pages: Vec<FixturePage>) -> Self {
        FixtureProvider {
            pages: Mutex::new(pages.into_iter().collect()),
            acquired: AtomicUsize::new(0),
        }
    }

    fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageProvider for FixtureProvider {
    type Page = FixturePage;

    async fn acquire_page(&self) -> Result<FixturePage, ScrapeError> {
        self.acquired.fetch_add(1, Ordering::SeqCst);
        self.pages
            .lock()
            .expect("fixture lock")
            .pop_front()
            .ok_or_else(|| ScrapeError::Session("fixture pages exhausted".into()))
    }
}

fn test_config() -> ScraperConfig {
    ScraperConfig {
        settle_delay: Duration::ZERO,
        retry_delay: Duration::ZERO,
        ..ScraperConfig::default()
    }
}

fn asin(text: &str) -> Asin {
    Asin::parse(text).expect("valid test asin")
}

const PRODUCT_PAGE: &str = r#"<html><body>
    <span id="productTitle"> Wireless Mouse </span>
    <div id="corePrice_feature_div">
        <span class="a-price"><span class="a-offscreen">R$ 89,90</span></span>
    </div>
    <div id="wayfinding-breadcrumbs_feature_div"><ul>
        <li><a href="/">Home</a></li>
        <li><a href="/c1">Electronics</a></li>
        <li><a href="/c2">Computers</a></li>
        <li><a href="/c3">Mice</a></li>
    </ul></div>
</body></html>"#;

const UNAVAILABLE_PAGE: &str = r#"<html><body>
    <span id="productTitle">Webcam HD</span>
    <div id="availability"><span>Currently unavailable.</span></div>
</body></html>"#;

const CAPTCHA_PAGE: &str = r#"<html><body>
    <p>Enter the characters you see below</p>
    <p>Sorry, we just need to make sure you're not a robot.</p>
</body></html>"#;

#[tokio::test(start_paused = true)]
async fn extracts_full_observation_from_product_page() {
    let provider = Arc::new(FixtureProvider::new(vec![FixturePage::new(PRODUCT_PAGE)]));
    let extractor = Extractor::new(provider.clone(), test_config());

    let product = extractor.extract_product(&asin("B08N5WRWNW")).await.unwrap();

    assert_eq!(product.asin.as_str(), "B08N5WRWNW");
    assert_eq!(product.title, "Wireless Mouse");
    assert_eq!(product.price, Some(89.90));
    assert!(product.available);
    assert_eq!(
        product.categories,
        Some(vec![
            "Electronics".to_string(),
            "Computers".to_string(),
            "Mice".to_string()
        ])
    );
    assert_eq!(provider.acquired(), 1);
}

#[tokio::test(start_paused = true)]
async fn unavailable_page_yields_null_price_with_reason() {
    let provider = Arc::new(FixtureProvider::new(vec![FixturePage::new(UNAVAILABLE_PAGE)]));
    let extractor = Extractor::new(provider, test_config());

    let product = extractor.extract_product(&asin("B000000001")).await.unwrap();

    assert!(!product.available);
    assert_eq!(product.price, None);
    assert_eq!(
        product.unavailable_reason.as_deref(),
        Some("Currently unavailable.")
    );
}

#[tokio::test(start_paused = true)]
async fn availability_invariant_holds_for_both_outcomes() {
    let provider = Arc::new(FixtureProvider::new(vec![
        FixturePage::new(PRODUCT_PAGE),
        FixturePage::new(UNAVAILABLE_PAGE),
    ]));
    let extractor = Extractor::new(provider, test_config());

    for code in ["B08N5WRWNW", "B000000001"] {
        let product = extractor.extract_product(&asin(code)).await.unwrap();
        assert_eq!(product.available, product.price.is_some());
    }
}

#[tokio::test(start_paused = true)]
async fn captcha_page_raises_blocked_without_retry() {
    // Three pages are stocked; a retrying orchestrator would consume more
    // than one.
    let provider = Arc::new(FixtureProvider::new(vec![
        FixturePage::new(CAPTCHA_PAGE),
        FixturePage::new(CAPTCHA_PAGE),
        FixturePage::new(CAPTCHA_PAGE),
    ]));
    let extractor = Extractor::new(provider.clone(), test_config());

    let result = extractor.extract_product(&asin("B000000002")).await;

    assert!(matches!(result, Err(ScrapeError::Blocked)));
    assert_eq!(provider.acquired(), 1);
}

#[tokio::test(start_paused = true)]
async fn transient_failures_retry_to_the_configured_bound() {
    let pages = vec![
        FixturePage::failing_navigation("timeout"),
        FixturePage::failing_navigation("timeout"),
        FixturePage::failing_navigation("timeout"),
    ];
    let closed_flags: Vec<_> = pages.iter().map(|p| p.closed_flag()).collect();
    let provider = Arc::new(FixtureProvider::new(pages));
    let extractor = Extractor::new(provider.clone(), test_config());

    let result = extractor.extract_product(&asin("B000000003")).await;

    // max_retries = 2 means exactly three attempts, then the error surfaces.
    assert!(matches!(result, Err(ScrapeError::Navigation(_))));
    assert_eq!(provider.acquired(), 3);

    // Every attempt's page was closed despite the failures.
    for flag in closed_flags {
        assert!(flag.load(Ordering::SeqCst));
    }
}

#[tokio::test]
async fn title_chain_falls_through_to_lower_tiers() {
    let page = FixturePage::new(
        r#"<html><body>
            <span class="product-title-word-break">Teclado Mecânico</span>
        </body></html>"#,
    );

    let outcome = chain::resolve_title(&page).await.unwrap();

    assert_eq!(
        outcome,
        SelectorOutcome::Found {
            value: "Teclado Mecânico".to_string(),
            strategy_id: "title-class",
        }
    );
}

#[tokio::test(start_paused = true)]
async fn split_price_spans_parse_like_offscreen_text() {
    let page_html = r#"<html><body>
        <span id="productTitle">Monitor 27"</span>
        <div id="corePrice_feature_div">
            <span class="a-price">
                <span class="a-price-whole">1.498,</span>
                <span class="a-price-fraction">33</span>
            </span>
        </div>
    </body></html>"#;
    let provider = Arc::new(FixtureProvider::new(vec![FixturePage::new(page_html)]));
    let extractor = Extractor::new(provider, test_config());

    let product = extractor.extract_product(&asin("B000000004")).await.unwrap();

    assert_eq!(product.price, Some(1498.33));
}

// ---- batch throttler ----

struct ScriptedExtractor;

#[async_trait]
impl ProductExtractor for ScriptedExtractor {
    async fn extract(&self, asin: &Asin) -> Result<ScrapedProduct, ScrapeError> {
        match asin.as_str() {
            "AAAAAAAAA1" => Ok(ScrapedProduct::in_stock(
                asin.clone(),
                "Mouse".into(),
                89.90,
                None,
            )),
            "BBBBBBBBB2" => Ok(ScrapedProduct::unavailable(
                asin.clone(),
                "Webcam".into(),
                Some("Não disponível".into()),
                None,
            )),
            _ => Err(ScrapeError::Extraction("price not found".into())),
        }
    }
}

#[tokio::test]
async fn batch_isolates_per_item_failures() {
    let runner = BatchRunner::new(ScriptedExtractor, Duration::ZERO);
    let asins = vec![asin("AAAAAAAAA1"), asin("BBBBBBBBB2"), asin("CCCCCCCCC3")];

    let mut seen = Vec::new();
    let mut on_progress = |progress: BatchProgress<'_>| {
        seen.push(progress.asin.to_string());
    };

    let report = runner.run(&asins, Some(&mut on_progress)).await.unwrap();

    assert_eq!(report.updated, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].asin, "CCCCCCCCC3");
    // Input order is preserved and every item was visited.
    assert_eq!(seen, vec!["AAAAAAAAA1", "BBBBBBBBB2", "CCCCCCCCC3"]);
}

/// Blocks inside `extract` until released, to hold a batch run open.
struct GatedExtractor {
    started: Arc<tokio::sync::Notify>,
    gate: Arc<tokio::sync::Notify>,
}

#[async_trait]
impl ProductExtractor for GatedExtractor {
    async fn extract(&self, asin: &Asin) -> Result<ScrapedProduct, ScrapeError> {
        self.started.notify_one();
        self.gate.notified().await;
        Ok(ScrapedProduct::in_stock(asin.clone(), "Produto".into(), 10.0, None))
    }
}

#[tokio::test]
async fn concurrent_batch_runs_are_single_flight() {
    let started = Arc::new(tokio::sync::Notify::new());
    let gate = Arc::new(tokio::sync::Notify::new());
    let runner = Arc::new(BatchRunner::new(
        GatedExtractor {
            started: started.clone(),
            gate: gate.clone(),
        },
        Duration::ZERO,
    ));

    let asins = vec![asin("AAAAAAAAA1")];
    let first = tokio::spawn({
        let runner = runner.clone();
        let asins = asins.clone();
        async move { runner.run(&asins, None).await }
    });

    // Wait until the first run is inside an extraction, then collide.
    started.notified().await;
    let second = runner.run(&asins, None).await;
    assert!(matches!(second, Err(ScrapeError::BatchInProgress)));

    gate.notify_one();
    let report = first.await.unwrap().unwrap();
    assert_eq!(report.updated, 1);
    assert!(!runner.is_running());
}
