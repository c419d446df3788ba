//! Sequential batch refresh over many ASINs.
//!
//! One extraction at a time, in input order, with a fixed pause between
//! items: bursts of parallel requests from one browsing session are what
//! trip the retailer's rate limiter. A single-flight guard rejects a
//! second overlapping run instead of letting two batches interleave on
//! the shared browser context.

use crate::error::ScrapeError;
use crate::model::{Asin, BatchError, BatchItemOutcome, BatchProgress, BatchReport};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::orchestrator::ProductExtractor;

pub struct BatchRunner<E: ProductExtractor> {
    extractor: E,
    delay: Duration,
    running: AtomicBool,
}

impl<E: ProductExtractor> BatchRunner<E> {
    pub fn new(extractor: E, delay: Duration) -> Self {
        BatchRunner {
            extractor,
            delay,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Refreshes every ASIN, isolating failures per item: one bad product
    /// is tallied in the report and the batch moves on. A concurrent call
    /// while a run is active fails fast with `BatchInProgress`.
    pub async fn run(
        &self,
        asins: &[Asin],
        mut on_progress: Option<&mut (dyn FnMut(BatchProgress<'_>) + Send)>,
    ) -> Result<BatchReport, ScrapeError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!("Batch refresh already running, rejecting overlapping run");
            return Err(ScrapeError::BatchInProgress);
        }
        let _guard = RunningGuard(&self.running);

        tracing::info!("Starting batch refresh of {} products", asins.len());
        let mut report = BatchReport::default();

        for (index, asin) in asins.iter().enumerate() {
            let outcome = match self.extractor.extract(asin).await {
                Ok(product) if product.available => {
                    report.updated += 1;
                    BatchItemOutcome::Updated {
                        price: product.price.unwrap_or(0.0),
                    }
                }
                Ok(product) => {
                    report.skipped += 1;
                    BatchItemOutcome::Skipped {
                        reason: product.unavailable_reason,
                    }
                }
                Err(e) => {
                    tracing::warn!("Batch item {} failed: {}", asin, e);
                    report.errors.push(BatchError {
                        asin: asin.to_string(),
                        message: e.to_string(),
                    });
                    BatchItemOutcome::Failed {
                        message: e.to_string(),
                    }
                }
            };

            if let Some(callback) = on_progress.as_deref_mut() {
                callback(BatchProgress {
                    index,
                    total: asins.len(),
                    asin,
                    outcome,
                });
            }

            if index + 1 < asins.len() {
                tokio::time::sleep(self.delay).await;
            }
        }

        tracing::info!(
            "Batch refresh done: {} updated, {} skipped, {} errors",
            report.updated,
            report.skipped,
            report.errors.len()
        );
        Ok(report)
    }
}

/// Clears the single-flight flag on every exit path, including panics.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
