use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Failed to launch browser: {0}")]
    Session(String),

    #[error("Browser navigation failed: {0}")]
    Navigation(String),

    #[error("Page blocked by anti-bot verification")]
    Blocked,

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Unparseable price fragment: {0}")]
    PriceFormat(String),

    #[error("Invalid ASIN: {0}")]
    InvalidAsin(String),

    #[error("A batch refresh is already running")]
    BatchInProgress,

    #[error("Chrome download failed: {0}")]
    ChromeDownload(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScrapeError {
    /// Whether a fresh page attempt may succeed where this one failed.
    /// Blocks are excluded: hammering an anti-bot wall only entrenches it.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ScrapeError::Navigation(_) | ScrapeError::Extraction(_) | ScrapeError::PriceFormat(_)
        )
    }
}
