//! Tests for the periodic refresh loop.
//!
//! Run on tokio's paused clock, so interval ticks are driven by virtual time.

use async_trait::async_trait;
use content_cache::{
    ContentCache, ContentDirectory, ContentSource, FetchError, RefreshScheduler, RefreshService,
    SchedulerConfig,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

const INTERVAL: Duration = Duration::from_secs(60);

/// Fails the first `failures` fetches, then serves a one-rule directory.
struct FlakySource {
    failures: usize,
    calls: AtomicUsize,
}

impl FlakySource {
    fn new(failures: usize) -> Arc<Self> {
        Arc::new(Self {
            failures,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentSource for FlakySource {
    async fn fetch(&self) -> Result<ContentDirectory, FetchError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(FetchError::Unavailable(format!("attempt {} failed", call)));
        }

        serde_json::from_value(json!({
            "config": {"impact": {"Low": 1}},
            "rules": {
                "rule1": {
                    "summary": format!("fetch {}", call),
                    "plugin": {"python_module": "ccx.rule1"},
                    "error_keys": {
                        "EK1": {"metadata": {
                            "impact": "Low",
                            "status": "active",
                            "publish_date": "2020-04-08T00:42:00Z"
                        }}
                    }
                }
            }
        }))
        .map_err(FetchError::Decode)
    }
}

fn scheduler(
    source: Arc<FlakySource>,
    enabled: bool,
) -> (Arc<ContentCache>, Arc<RefreshScheduler>) {
    let cache = Arc::new(ContentCache::new());
    let service = Arc::new(RefreshService::new(Arc::clone(&cache), source));
    let config = SchedulerConfig {
        refresh_interval: INTERVAL,
        enabled,
    };
    (cache, Arc::new(RefreshScheduler::new(service, config)))
}

#[tokio::test(start_paused = true)]
async fn test_first_fetch_is_immediate_then_periodic() {
    let source = FlakySource::new(0);
    let (cache, scheduler) = scheduler(source.clone(), true);
    let handle = Arc::clone(&scheduler).spawn();

    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(source.calls(), 1);
    assert!(cache.is_ready());
    assert!(scheduler.last_refresh().is_some());

    tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;
    assert_eq!(source.calls(), 2);

    tokio::time::sleep(INTERVAL).await;
    assert_eq!(source.calls(), 3);

    let content = cache.get_rule_content(&"ccx.rule1".into()).await.unwrap();
    assert_eq!(content.summary, "fetch 2");

    handle.abort();
}

#[tokio::test(start_paused = true)]
async fn test_loop_survives_fetch_failures() {
    let source = FlakySource::new(2);
    let (cache, scheduler) = scheduler(source.clone(), true);
    let handle = Arc::clone(&scheduler).spawn();

    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(source.calls(), 1);
    assert!(!cache.is_ready());
    assert!(scheduler.last_refresh().is_none());

    tokio::time::sleep(INTERVAL).await;
    assert_eq!(source.calls(), 2);
    assert!(!cache.is_ready());

    // Reader parked on the gate is released by the third cycle
    let reader = {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move { cache.get_rule_content(&"ccx.rule1".into()).await })
    };

    tokio::time::sleep(INTERVAL).await;
    assert_eq!(source.calls(), 3);
    assert!(cache.is_ready());
    assert_eq!(reader.await.unwrap().unwrap().summary, "fetch 2");

    handle.abort();
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_loop() {
    let source = FlakySource::new(0);
    let (_cache, scheduler) = scheduler(source.clone(), true);

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(Arc::clone(&scheduler).run_until(async move {
        let _ = stop_rx.await;
    }));

    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(source.calls(), 1);

    stop_tx.send(()).unwrap();
    handle.await.unwrap();

    tokio::time::sleep(INTERVAL * 3).await;
    assert_eq!(source.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_disabled_scheduler_loads_once() {
    let source = FlakySource::new(0);
    let (cache, scheduler) = scheduler(source.clone(), false);

    Arc::clone(&scheduler).start().await;
    assert_eq!(source.calls(), 1);
    assert!(cache.is_ready());

    tokio::time::sleep(INTERVAL * 2).await;
    assert_eq!(source.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_disabled_scheduler_retries_until_first_load() {
    let source = FlakySource::new(1);
    let (cache, scheduler) = scheduler(source.clone(), false);

    Arc::clone(&scheduler).start().await;
    assert_eq!(source.calls(), 2);
    assert!(cache.wait_ready_timeout(Duration::from_secs(1)).await);
    assert!(scheduler.last_refresh().is_some());

    let content = cache.get_rule_content(&"ccx.rule1".into()).await.unwrap();
    assert_eq!(content.summary, "fetch 1");

    tokio::time::sleep(INTERVAL * 2).await;
    assert_eq!(source.calls(), 2);
}
