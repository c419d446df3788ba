use crate::error::ScrapeError;
use crate::model::Asin;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://www.amazon.com.br";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Tuning knobs for the extraction engine. Everything has a sensible
/// default; `load` layers CLI flags, environment and the config file on
/// top the same way the rest of the tool family does.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Marketplace root. Hard-wired to amazon.com.br by default but kept
    /// configurable for other locales.
    pub base_url: String,
    pub user_agent: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Upper bound on page navigation. DOM-content-loaded is enough; the
    /// page never reaches network-idle because of ad/tracker traffic.
    pub navigation_timeout: Duration,
    /// Wait after navigation for client-side price/title widgets.
    pub settle_delay: Duration,
    /// Retries after the first failed attempt.
    pub max_retries: u32,
    pub retry_delay: Duration,
    /// Pause between batch items to stay under the rate limiter's radar.
    pub batch_delay: Duration,
    pub browser_path: Option<PathBuf>,
    pub data_dir: PathBuf,
    pub debug: bool,
}

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    defaults: ConfigDefaults,
}

#[derive(Debug, Deserialize, Default)]
struct ConfigDefaults {
    base_url: Option<String>,
    browser_path: Option<String>,
    batch_delay_ms: Option<u64>,
    settle_delay_ms: Option<u64>,
    max_retries: Option<u32>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        ScraperConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            viewport_width: 1920,
            viewport_height: 1080,
            navigation_timeout: Duration::from_secs(60),
            settle_delay: Duration::from_secs(5),
            max_retries: 2,
            retry_delay: Duration::from_secs(3),
            batch_delay: Duration::from_secs(2),
            browser_path: None,
            data_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from(".local/share"))
                .join("preco-tracker"),
            debug: false,
        }
    }
}

impl ScraperConfig {
    /// Priority: CLI flags → env vars → config file → defaults.
    pub fn load(
        base_url: Option<String>,
        batch_delay_ms: Option<u64>,
        max_retries: Option<u32>,
        debug: bool,
    ) -> Result<Self, ScrapeError> {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("preco-tracker");
        let file_config = load_config_file(&config_dir);

        let base_url_env = std::env::var("PRECO_BASE_URL").ok();
        let browser_path_env = std::env::var("PRECO_BROWSER_PATH").ok();

        let mut config = ScraperConfig::default();

        config.base_url = base_url
            .or(base_url_env)
            .or(file_config.defaults.base_url)
            .unwrap_or(config.base_url);
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        validate_base_url(&config.base_url)?;

        config.browser_path = browser_path_env
            .or(file_config.defaults.browser_path)
            .map(PathBuf::from);

        if let Some(ms) = batch_delay_ms.or(file_config.defaults.batch_delay_ms) {
            config.batch_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = file_config.defaults.settle_delay_ms {
            config.settle_delay = Duration::from_millis(ms);
        }
        if let Some(n) = max_retries.or(file_config.defaults.max_retries) {
            config.max_retries = n;
        }
        config.debug = debug;

        Ok(config)
    }

    /// Canonical product page URL for an ASIN.
    pub fn product_url(&self, asin: &Asin) -> String {
        format!("{}/dp/{}", self.base_url, asin)
    }
}

fn validate_base_url(base_url: &str) -> Result<(), ScrapeError> {
    let parsed = url::Url::parse(base_url)
        .map_err(|e| ScrapeError::Navigation(format!("Invalid base URL '{}': {}", base_url, e)))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ScrapeError::Navigation(format!(
            "Invalid base URL '{}': expected http(s)",
            base_url
        )));
    }
    Ok(())
}

fn load_config_file(config_dir: &std::path::Path) -> ConfigFile {
    let config_path = config_dir.join("config.toml");
    if config_path.exists() {
        match std::fs::read_to_string(&config_path) {
            Ok(content) => toml::from_str(&content).unwrap_or_default(),
            Err(_) => ConfigFile::default(),
        }
    } else {
        ConfigFile::default()
    }
}
