//! # Content Cache Entry Point
//!
//! Builds the cache, spawns the scheduled refresh and runs until Ctrl-C.
//! Request-serving code embeds [`content_cache::ContentCache`] directly; this
//! binary keeps the cache warm and reports its state.

use clap::Parser;
use content_cache::{
    CacheConfig, ContentCache, HttpContentSource, RefreshScheduler, RefreshService,
};
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = CacheConfig::parse();
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    info!("Content service: {}", config.content_base_endpoint);
    info!(
        "Polling interval: {}s, request timeout: {}s, keep stale: {}",
        config.polling_interval_secs, config.request_timeout_secs, config.keep_stale
    );

    let cache = Arc::new(ContentCache::new());
    let source = Arc::new(HttpContentSource::new(
        &config.content_base_endpoint,
        config.request_timeout(),
    )?);
    let service = Arc::new(
        RefreshService::new(Arc::clone(&cache), source)
            .with_loader(config.content_loader()?)
            .with_keep_stale(config.keep_stale),
    );
    let scheduler = Arc::new(RefreshScheduler::new(service, config.scheduler_config()));

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let refresh = tokio::spawn(Arc::clone(&scheduler).run_until(async move {
        let _ = stop_rx.await;
    }));

    // Report the first load without blocking shutdown on it
    let startup_wait = config.request_timeout() + Duration::from_secs(1);
    if cache.wait_ready_timeout(startup_wait).await {
        let stats = cache.stats();
        info!(
            "Content ready: {} rules, {} rule/error key entries",
            stats.rules, stats.rules_with_content
        );
    } else {
        warn!(
            "No content loaded after {}s, readers will wait for the first successful refresh",
            startup_wait.as_secs()
        );
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    let _ = stop_tx.send(());
    refresh.await?;

    let stats = cache.stats();
    info!(
        "Shut down: {} lookups ({:.1}% hits), last refresh at {:?}",
        stats.hits + stats.misses,
        stats.hit_ratio() * 100.0,
        scheduler.last_refresh()
    );
    Ok(())
}
