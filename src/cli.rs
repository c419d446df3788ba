use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "preco-tracker",
    version,
    about = "Track amazon.com.br product prices from the command line"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Marketplace base URL (default: https://www.amazon.com.br)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Delay between batch items in milliseconds (default: 2000)
    #[arg(long, global = true)]
    pub delay: Option<u64>,

    /// Retries after a failed extraction attempt (default: 2)
    #[arg(long, global = true)]
    pub max_retries: Option<u32>,

    /// Run the browser in headed mode for troubleshooting
    #[arg(long, global = true)]
    pub debug: bool,

    /// Print results as JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract the current price observation for one product
    Extract {
        /// 10-character product ASIN (e.g. B08N5WRWNW)
        asin: String,
    },

    /// Refresh every ASIN listed in a file, one per line
    Batch {
        /// Path to the ASIN list; blank lines and '#' comments are skipped
        file: PathBuf,
    },
}
