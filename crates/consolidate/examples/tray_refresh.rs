//! Example: consolidate noisy tray property updates into menu refreshes.
//!
//! Run with: RUST_LOG=tray_consolidate=trace cargo run -p tray-consolidate --example tray_refresh

use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use tray_consolidate::{consolidate_fn, ConsolidateConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tray_consolidate=debug")),
        )
        .init();

    println!("=== Tray Refresh Example ===");

    let started = Instant::now();
    let config = ConsolidateConfig::new(Duration::from_millis(100), Duration::from_millis(500));
    let (notifier, stop) = consolidate_fn(config, move || {
        println!("[{:>5}ms] refreshing tray menu", started.elapsed().as_millis());
    })?;

    println!("Phase 1: three short bunches of property changes");
    for _ in 0..3 {
        for _ in 0..5 {
            notifier.notify();
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tokio::time::sleep(Duration::from_millis(300)).await;
    }

    println!("Phase 2: a continuous stream (one change every 20ms for 1.2s)");
    let producer = {
        let notifier = notifier.clone();
        tokio::spawn(async move {
            for _ in 0..60 {
                notifier.notify();
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
    };
    producer.await?;
    tokio::time::sleep(Duration::from_millis(300)).await;

    stop.stop();
    stop.stopped().await;

    let snapshot = stop.stats().snapshot();
    println!("\nStats: {}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
