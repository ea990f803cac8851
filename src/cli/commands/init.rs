//! `agentloop init` — initialize the store at `store_url`, running embedded
//! migrations (spec §6).

use anyhow::{Context, Result};

use crate::adapters::sqlite::initialize_database;

pub async fn handle_init(store_url: &str, json: bool) -> Result<()> {
    let pool = initialize_database(store_url).await.context("failed to initialize store")?;
    pool.close().await;

    if json {
        println!(r#"{{"status":"initialized","store_url":"{store_url}"}}"#);
    } else {
        println!("Initialized store at {store_url}");
    }
    Ok(())
}
