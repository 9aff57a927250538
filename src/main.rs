//! Render Cache - maintenance tool for a cache directory
//!
//! Opens the store configured through environment variables and runs one
//! command against it:
//! - `report` (default): print the hit report as JSON
//! - `reconcile`: rebuild the size ledger from the stored entries
//! - `clear`: delete every entry and the ledger

use std::env;

use anyhow::{bail, Context};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use render_cache::{CacheStore, Config};

fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "render_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let command = env::args().nth(1).unwrap_or_else(|| "report".to_string());

    let config = Config::from_env();
    let store = CacheStore::open(&config).context("set RENDER_CACHE_DIR to the cache directory")?;

    match command.as_str() {
        "report" => {
            let report = store.hit_report()?;
            let stats = store.stats()?;
            info!(
                "{} entries, {} bytes, {} total hits",
                stats.total_entries,
                stats.total_size,
                report.total_hits()
            );
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        "reconcile" => {
            let ledger = store.reconcile()?;
            info!(
                "Ledger rebuilt: {} bytes across {} entries",
                ledger.total_size, ledger.total_entries
            );
        }
        "clear" => {
            let removed = store.clear()?;
            info!("Removed {} entries", removed);
        }
        other => bail!("unknown command '{}', expected report, reconcile or clear", other),
    }

    Ok(())
}
