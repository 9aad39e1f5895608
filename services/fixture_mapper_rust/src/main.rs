mod config;
mod io;

use crate::config::{AliasSource, Config};
use anyhow::{Context, Result};
use chrono::Utc;
use dotenv::dotenv;
use fixture_linker_core::db::{create_pool, DbPoolConfig};
use fixture_linker_core::{
    AliasStore, FixtureLinker, JsonFileAliasStore, LinkerConfig, MemoryAliasStore, PgAliasStore,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

async fn build_store(source: &AliasSource) -> Result<Arc<dyn AliasStore>> {
    match source {
        AliasSource::Postgres(url) => {
            let pool_config = DbPoolConfig::from_env_with_defaults(DbPoolConfig::default());
            let pool = create_pool(url, &pool_config)
                .await
                .context("Failed to connect to alias database")?;
            let store = PgAliasStore::new(pool);
            store
                .ensure_schema()
                .await
                .context("Failed to prepare alias tables")?;
            info!("Alias store: postgres");
            Ok(Arc::new(store))
        }
        AliasSource::JsonFile(path) => {
            let store = JsonFileAliasStore::new(path);
            store
                .seed_if_missing()
                .await
                .with_context(|| format!("Failed to seed alias file {}", path.display()))?;
            info!("Alias store: {}", path.display());
            Ok(Arc::new(store))
        }
        AliasSource::Seed => {
            info!("Alias store: built-in seed table");
            Ok(Arc::new(MemoryAliasStore::with_seed()))
        }
    }
}

async fn run_once(linker: &FixtureLinker, config: &Config) -> Result<()> {
    let crown = io::read_crown(&config.crown_fixtures_path).await?;
    let api = io::read_api(&config.api_fixtures_path).await?;

    let document = linker.link(crown, api, Utc::now()).await?;
    io::write_document(&config.mapping_output_path, &document).await?;

    info!(
        "Mapping written to {}: {}/{} Crown fixtures matched against {} API fixtures",
        config.mapping_output_path.display(),
        document.matched_count,
        document.crown_count,
        document.api_count
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    info!("Starting fixture mapper...");

    let config = Config::from_env()?;
    let linker_config = LinkerConfig::from_env().context("Invalid linker configuration")?;
    info!(
        "Threshold {:.2}, weights {:?}, alias TTL {}s",
        linker_config.matcher.acceptance_threshold,
        linker_config.matcher.weights,
        linker_config.resolver.cache_ttl.as_secs()
    );

    let store = build_store(&config.alias_source).await?;
    let linker = FixtureLinker::new(&linker_config, store)?;

    let Some(interval) = config.interval else {
        return run_once(&linker, &config).await;
    };

    info!("Mapping loop started (interval: {}s)", interval.as_secs());
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = run_once(&linker, &config).await {
                    error!("Mapping pass failed: {:#}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }
    Ok(())
}
