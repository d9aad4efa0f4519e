//! Erawan WMS - headless dashboard
//!
//! Opens the file-backed warehouse named by the configuration and prints the
//! storeroom dashboard, today's figures and the low-stock list as JSON.

use chrono::Utc;
use erawan_engine::{telemetry, Config, FileStore, Inventory, TrendRange};

fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let json_logs = std::env::var("ERAWAN_LOG_JSON").is_ok_and(|v| v == "1" || v == "true");
    telemetry::init(json_logs);

    let config = Config::load()?;
    tracing::info!("Starting Erawan WMS dashboard");
    tracing::info!("Environment: {}", config.environment);

    let store = FileStore::open(&config.storage.data_dir)?;
    tracing::info!("Data directory: {}", store.dir().display());
    let inventory = Inventory::open(store, &config)?;

    let today = Utc::now().date_naive();
    let low_stock: Vec<_> = inventory
        .inventory_overview()
        .into_iter()
        .filter(|row| row.low_stock)
        .collect();

    let report = serde_json::json!({
        "storerooms": inventory.storeroom_dashboard(),
        "today": inventory.daily_summary(today),
        "trend": inventory.trend(TrendRange::Week, today),
        "lowStock": low_stock,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
