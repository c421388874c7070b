//! # Pair Scan CLI
//!
//! Runs one fresh-pairs scan and prints the result as JSON to stdout.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin scan_pairs -- \
//!     --chain ethereum \
//!     --factory 0x5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f \
//!     --window-minutes 30
//! ```
//!
//! RPC endpoints resolve from `RPC_URL_<CHAIN>` / `RPC_URL` environment
//! variables, then `Config.toml`, then the built-in public defaults.

use anyhow::{Context, Result};
use clap::Parser;
use ethers::types::Address;
use fresh_markets_watch::{scan_new_pairs, ScanOutcome, ScanRequest, Settings};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "scan_pairs", about = "List new AMM pairs created in the last N minutes")]
struct Args {
    /// Target blockchain (e.g. "ethereum", "polygon")
    #[arg(long)]
    chain: String,

    /// AMM factory contract to monitor; repeat for multiple factories
    #[arg(long = "factory", required = true)]
    factories: Vec<Address>,

    /// Trailing time window to scan, in minutes
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    window_minutes: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let settings = Settings::new().context("failed to load configuration")?;

    let request = ScanRequest {
        chain: args.chain,
        factories: args.factories,
        window_minutes: args.window_minutes,
    };

    let outcome = scan_new_pairs(&settings, &request).await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    match outcome {
        ScanOutcome::Ok(_) => Ok(()),
        ScanOutcome::Err(failure) => anyhow::bail!("scan failed: {}", failure.error),
    }
}
