use crate::browser::page::{CdpPage, PageProvider};
use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::handler::viewport::Viewport;
use futures::StreamExt;
use std::path::PathBuf;
use tokio::sync::Mutex;

/// Overrides the most common automation tells before any site JS runs.
/// Block detection stays the classifier's job; this only keeps ordinary
/// page loads from being served the degraded bot variant.
const STEALTH_INIT: &str = r#"
    Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
    Object.defineProperty(navigator, 'languages', { get: () => ['pt-BR', 'pt', 'en'] });
    Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
    window.chrome = { runtime: {} };
"#;

/// Owns the one browser process and browsing context shared by all
/// extractions. Launch is lazy and guarded: the inner mutex serializes
/// concurrent `ensure_session` calls so only one Chrome ever starts.
pub struct BrowserSession {
    config: ScraperConfig,
    inner: Mutex<Option<SessionInner>>,
}

struct SessionInner {
    browser: Browser,
    handler_task: tokio::task::JoinHandle<()>,
    user_data_dir: PathBuf,
}

impl BrowserSession {
    /// Does not launch anything; the browser starts on first use.
    pub fn new(config: ScraperConfig) -> Self {
        BrowserSession {
            config,
            inner: Mutex::new(None),
        }
    }

    /// Idempotent. Launches the browser and context if not yet running.
    pub async fn ensure_session(&self) -> Result<(), ScrapeError> {
        let mut guard = self.inner.lock().await;
        if guard.is_none() {
            *guard = Some(self.launch().await?);
        }
        Ok(())
    }

    /// Fresh page from the shared context, one per extraction attempt so
    /// DOM state never leaks between attempts.
    pub async fn new_page(&self) -> Result<CdpPage, ScrapeError> {
        let mut guard = self.inner.lock().await;
        if guard.is_none() {
            *guard = Some(self.launch().await?);
        }
        let Some(inner) = guard.as_ref() else {
            return Err(ScrapeError::Session("browser state lost after launch".into()));
        };

        let page = inner
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScrapeError::Session(format!("Failed to create page: {}", e)))?;

        let _ = page.evaluate(STEALTH_INIT).await;

        Ok(CdpPage::new(page))
    }

    /// Closes context and browser; safe when nothing is open. A later
    /// `ensure_session` relaunches from scratch.
    pub async fn shutdown(&self) -> Result<(), ScrapeError> {
        let mut guard = self.inner.lock().await;
        let Some(mut inner) = guard.take() else {
            return Ok(());
        };

        inner
            .browser
            .close()
            .await
            .map_err(|e| ScrapeError::Session(format!("Failed to close browser: {}", e)))?;
        inner.handler_task.abort();

        // Give Chrome subprocesses time to release file locks before the
        // profile directory goes away.
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
        remove_user_data_dir(&inner.user_data_dir).await;

        Ok(())
    }

    async fn launch(&self) -> Result<SessionInner, ScrapeError> {
        let chrome_path = crate::browser::resolve::resolve_chrome(
            self.config.browser_path.as_ref(),
            &self.config.data_dir,
        )
        .await?;

        // Unique profile dir per launch avoids SingletonLock conflicts with
        // other instances or stale locks from a crash.
        let user_data_dir = std::env::temp_dir().join(format!(
            "preco-tracker-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis()
        ));
        std::fs::create_dir_all(&user_data_dir).map_err(|e| {
            ScrapeError::Session(format!(
                "Failed to create user data dir {}: {}",
                user_data_dir.display(),
                e
            ))
        })?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .user_data_dir(user_data_dir.clone())
            .arg("--disable-blink-features=AutomationControlled")
            .arg(format!("--user-agent={}", self.config.user_agent))
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-default-apps")
            .arg("--disable-extensions")
            .arg("--disable-popup-blocking")
            .arg("--disable-translate")
            .arg("--disable-background-timer-throttling")
            .arg("--disable-renderer-backgrounding")
            .arg("--disable-backgrounding-occluded-windows")
            .arg(format!(
                "--window-size={},{}",
                self.config.viewport_width, self.config.viewport_height
            ))
            .viewport(Some(Viewport {
                width: self.config.viewport_width,
                height: self.config.viewport_height,
                device_scale_factor: None,
                emulating_mobile: false,
                is_landscape: false,
                has_touch: false,
            }));

        if !self.config.debug {
            builder = builder.arg("--headless=new");
        }

        let browser_config = builder
            .build()
            .map_err(|e| ScrapeError::Session(e.to_string()))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ScrapeError::Session(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                tracing::trace!("Browser event: {:?}", event);
            }
        });

        tracing::info!("Browser session launched");

        Ok(SessionInner {
            browser,
            handler_task,
            user_data_dir,
        })
    }
}

#[async_trait]
impl PageProvider for BrowserSession {
    type Page = CdpPage;

    async fn acquire_page(&self) -> Result<CdpPage, ScrapeError> {
        self.new_page().await
    }
}

async fn remove_user_data_dir(dir: &PathBuf) {
    if !dir.exists() {
        return;
    }
    for attempt in 1..=3 {
        match std::fs::remove_dir_all(dir) {
            Ok(_) => break,
            Err(e) if attempt < 3 => {
                tracing::debug!(
                    "Cleanup attempt {}/3 for {}: {}, retrying...",
                    attempt,
                    dir.display(),
                    e
                );
                tokio::time::sleep(std::time::Duration::from_millis(500)).await;
            }
            Err(_) => {
                tracing::debug!(
                    "Could not clean up temp dir {}, will be cleaned by OS",
                    dir.display()
                );
            }
        }
    }
}
