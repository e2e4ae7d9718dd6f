//! One-shot conditional fetch of a league endpoint
//!
//! Usage: `fetch-snapshot [tours|league-table|schedule|results|achievements] [--force]`

use anyhow::{bail, Result};
use league::application::init_logging_with_level;
use league::{CacheStore, EtagFetcher, EventBus, FetchOutcome, LeagueApi};
use league_sync::bin_common::{load_sync_config, parse_args};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let config = load_sync_config()?;
    init_logging_with_level(&config.log_level);

    let args = parse_args();
    let force = args.iter().any(|a| a == "--force");
    let target = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .map(String::as_str)
        .unwrap_or("tours");

    let store = Arc::new(match &config.cache_file {
        Some(path) => CacheStore::load(path)?,
        None => CacheStore::in_memory(),
    });
    let fetcher = EtagFetcher::new(reqwest::Client::new(), Arc::clone(&store), EventBus::new());
    let api = LeagueApi::new(Arc::new(config), fetcher);

    let outcome: FetchOutcome = match target {
        "tours" => api.tours(force).await?,
        "league-table" => api.league_table(force).await?,
        "schedule" => api.schedule(force).await?,
        "results" => api.results(force).await?,
        "achievements" => api.achievements(force).await?,
        other => bail!("unknown endpoint '{}'", other),
    };

    info!(
        "{}: from_cache={} updated={} stale={} etag={:?}",
        target, outcome.from_cache, outcome.updated, outcome.stale, outcome.etag
    );
    println!("{}", serde_json::to_string_pretty(&outcome.data)?);

    store.save()?;
    Ok(())
}

