use anyhow::Result;
use dotenvy::dotenv;
use inventory_dashboard::http;
use inventory_dashboard::store::json::{JsonItemStore, JsonLookupStore};
use inventory_dashboard::ItemEngine;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file, if present
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let data_dir =
        PathBuf::from(std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string()));
    std::fs::create_dir_all(&data_dir)?;

    let items = JsonItemStore::new(
        data_dir.join("items.json"),
        data_dir.join("deleted-items.json"),
    );
    let lookups = JsonLookupStore::new(
        data_dir.join("types.json"),
        data_dir.join("categories.json"),
    );
    let engine = Arc::new(ItemEngine::new(items, lookups));

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:5000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(%bind_addr, data_dir = %data_dir.display(), "inventory dashboard API listening");

    axum::serve(listener, http::router(engine)).await?;

    Ok(())
}
