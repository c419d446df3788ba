//! Price-extraction engine for amazon.com.br product pages.
//!
//! Drives a headless browser against a live product page and turns an
//! unstable, adversarial DOM into a structured price observation or a
//! classified failure. The pipeline per ASIN: navigate, let client-side
//! widgets settle, run the title selector chain, run the price chain (or
//! detect unavailability), collect the category breadcrumb, assemble a
//! [`model::ScrapedProduct`]. What to do with the observation (price
//! history, alerting, persistence) is the caller's business.
//!
//! ```no_run
//! use preco_tracker::{BrowserSession, Extractor, ScraperConfig};
//! use preco_tracker::model::Asin;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), preco_tracker::ScrapeError> {
//! let config = ScraperConfig::default();
//! let session = Arc::new(BrowserSession::new(config.clone()));
//! let extractor = Extractor::new(session.clone(), config);
//!
//! let asin = Asin::parse("B08N5WRWNW")?;
//! let observation = extractor.extract_product(&asin).await?;
//! println!("{}: {:?}", observation.title, observation.price);
//!
//! session.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod browser;
pub mod config;
pub mod error;
pub mod extract;
pub mod model;

pub use browser::page::{PageDriver, PageProvider};
pub use browser::session::BrowserSession;
pub use config::ScraperConfig;
pub use error::ScrapeError;
pub use extract::batch::BatchRunner;
pub use extract::orchestrator::{Extractor, ProductExtractor};
pub use model::{Asin, BatchReport, ScrapedProduct};
