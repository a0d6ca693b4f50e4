//! Scheduled content refresh - background task for periodic reloading.
//!
//! The scheduler alternates between two states:
//!
//! 1. **Fetching**: one [`RefreshService::refresh`] cycle. The first one starts
//!    immediately so readers blocked on the readiness gate are released as
//!    soon as possible.
//! 2. **Idle**: waiting for the next tick of the refresh interval.
//!
//! A failed fetch is logged and the scheduler goes back to idle; the cache
//! keeps serving the last successful content. With periodic refresh enabled
//! the loop has no terminal state of its own and [`RefreshScheduler::run_until`]
//! stops it on an external signal. Disabled, it ends after the first successful load.

use parking_lot::RwLock;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

use super::service::RefreshService;
use log::info;

/// Configuration for the scheduled refresh service.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval between refresh operations
    pub refresh_interval: Duration,
    /// Whether periodic refresh is enabled. When disabled the scheduler stops
    /// after the first successful load, retrying on the interval until then.
    pub enabled: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(60),
            enabled: true,
        }
    }
}

/// Scheduler for periodic content refresh.
///
/// Runs as a background task spawned during startup.
pub struct RefreshScheduler {
    service: Arc<RefreshService>,
    config: SchedulerConfig,
    /// Timestamp of the last successful refresh
    last_refresh_at: Arc<RwLock<Option<u64>>>,
}

impl RefreshScheduler {
    /// Creates a new refresh scheduler.
    ///
    /// # Example
    /// ```rust,no_run
    /// use std::sync::Arc;
    /// use std::time::Duration;
    /// use content_cache::{ContentCache, HttpContentSource, RefreshScheduler, RefreshService, SchedulerConfig};
    ///
    /// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
    /// let cache = Arc::new(ContentCache::new());
    /// let source = Arc::new(HttpContentSource::new("http://localhost:8082/api/v1/", Duration::from_secs(30))?);
    /// let service = Arc::new(RefreshService::new(cache.clone(), source));
    /// let scheduler = Arc::new(RefreshScheduler::new(service, SchedulerConfig::default()));
    /// let handle = scheduler.spawn();
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(service: Arc<RefreshService>, config: SchedulerConfig) -> Self {
        Self {
            service,
            config,
            last_refresh_at: Arc::new(RwLock::new(None)),
        }
    }

    /// Milliseconds since UNIX epoch of the last successful refresh, if any.
    pub fn last_refresh(&self) -> Option<u64> {
        *self.last_refresh_at.read()
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Spawn the scheduler as a background tokio task running for the process lifetime.
    pub fn spawn(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.start().await;
        })
    }

    /// Run with no shutdown signal. Only returns when periodic refresh is disabled.
    pub async fn start(self: Arc<Self>) {
        self.run_until(std::future::pending::<()>()).await;
    }

    /// Run until `shutdown` completes.
    ///
    /// Shutdown is observed while idle. An in-flight fetch is allowed to
    /// finish since it carries its own timeout.
    pub async fn run_until<F>(self: Arc<Self>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        if self.config.enabled {
            info!(
                "Starting scheduled refresh with {}-second interval",
                self.config.refresh_interval.as_secs()
            );
        } else {
            info!("Scheduled refresh is disabled, loading content once");
        }

        let mut ticker = interval(self.config.refresh_interval);
        // A slow fetch must not cause a burst of catch-up refreshes
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            // First tick completes immediately
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Scheduled refresh stopped");
                    return;
                }
                _ = ticker.tick() => {}
            }
            if self.do_refresh().await && !self.config.enabled {
                info!("Initial content loaded, scheduled refresh stays off");
                return;
            }
        }
    }

    /// Execute one refresh cycle, recording the time on success.
    async fn do_refresh(&self) -> bool {
        match self.service.refresh_logged().await {
            Some(stats) => {
                *self.last_refresh_at.write() = Some(stats.timestamp);
                true
            }
            None => false,
        }
    }
}
