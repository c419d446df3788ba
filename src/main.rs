mod cli;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use preco_tracker::model::{Asin, BatchItemOutcome, BatchProgress};
use preco_tracker::{BatchRunner, BrowserSession, Extractor, ScraperConfig};
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        "preco_tracker=debug"
    } else {
        "preco_tracker=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config = ScraperConfig::load(cli.base_url.clone(), cli.delay, cli.max_retries, cli.debug)?;

    ctrlc::set_handler(|| {
        eprintln!("\nInterrupted. Cleaning up...");
        std::process::exit(130);
    })
    .context("Failed to set Ctrl+C handler")?;

    let session = Arc::new(BrowserSession::new(config.clone()));
    let extractor = Extractor::new(session.clone(), config.clone());

    let result = match cli.command {
        Commands::Extract { asin } => cmd_extract(&extractor, &asin, cli.json).await,
        Commands::Batch { file } => cmd_batch(extractor, &config, &file, cli.json).await,
    };

    if let Err(e) = session.shutdown().await {
        tracing::warn!("Failed to close browser: {}", e);
    }

    result
}

async fn cmd_extract(
    extractor: &Extractor<Arc<BrowserSession>>,
    asin: &str,
    json: bool,
) -> Result<()> {
    let asin = Asin::parse(asin)?;

    let product = extractor
        .extract_product(&asin)
        .await
        .with_context(|| format!("Failed to extract product {}", asin))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&product)?);
    } else {
        print!("{}", output::format_product(&product));
    }
    Ok(())
}

async fn cmd_batch(
    extractor: Extractor<Arc<BrowserSession>>,
    config: &ScraperConfig,
    file: &Path,
    json: bool,
) -> Result<()> {
    let asins = read_asin_list(file)?;
    if asins.is_empty() {
        anyhow::bail!("No ASINs found in {}", file.display());
    }

    let runner = BatchRunner::new(extractor, config.batch_delay);

    let mut on_progress = |progress: BatchProgress<'_>| {
        let position = format!("[{}/{}]", progress.index + 1, progress.total);
        match &progress.outcome {
            BatchItemOutcome::Updated { price } => {
                eprintln!("{} {} R$ {:.2}", position, progress.asin, price);
            }
            BatchItemOutcome::Skipped { reason } => {
                eprintln!(
                    "{} {} skipped ({})",
                    position,
                    progress.asin,
                    reason.as_deref().unwrap_or("unavailable")
                );
            }
            BatchItemOutcome::Failed { message } => {
                eprintln!("{} {} failed: {}", position, progress.asin, message);
            }
        }
    };

    let report = runner
        .run(&asins, Some(&mut on_progress))
        .await
        .context("Batch refresh failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", output::format_report(&report));
    }
    Ok(())
}

fn read_asin_list(file: &Path) -> Result<Vec<Asin>> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let mut asins = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        asins.push(Asin::parse(line).with_context(|| format!("Bad ASIN in list: {}", line))?);
    }
    Ok(asins)
}
