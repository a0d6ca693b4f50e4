//! On-demand content refresh.
//!
//! Runs one fetch → expand → upsert cycle against the shared cache. The
//! scheduler calls this on every tick; callers may also trigger it directly.
//! Cycles are serialized, so a manual refresh queues behind a scheduled one.

use log::{error, info, warn};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::cache::ContentCache;
use crate::error::FetchError;
use crate::loader::ContentLoader;
use crate::source::ContentSource;
use crate::types::{now_ms, RuleErrorKey, RuleId};

/// Statistics from a refresh operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshStats {
    /// Number of rules written to the by-rule index
    pub rules_refreshed: usize,
    /// Number of (rule, error key) entries written
    pub entries_refreshed: usize,
    /// Number of malformed entries dropped
    pub entries_skipped: usize,
    /// Number of keys removed because the new directory no longer has them
    pub stale_purged: usize,
    /// Duration of refresh operation in milliseconds
    pub duration_ms: u64,
    /// Timestamp of refresh
    pub timestamp: u64,
}

/// Content refresh service.
pub struct RefreshService {
    cache: Arc<ContentCache>,
    source: Arc<dyn ContentSource>,
    loader: ContentLoader,
    keep_stale: bool,
    /// Held for a whole cycle; purge relies on no other cycle writing meanwhile
    cycle: Mutex<()>,
}

impl RefreshService {
    /// Create a refresh service that purges stale keys after each successful cycle.
    pub fn new(cache: Arc<ContentCache>, source: Arc<dyn ContentSource>) -> Self {
        Self {
            cache,
            source,
            loader: ContentLoader::default(),
            keep_stale: false,
            cycle: Mutex::new(()),
        }
    }

    pub fn with_loader(mut self, loader: ContentLoader) -> Self {
        self.loader = loader;
        self
    }

    /// Keep keys from earlier cycles that a newer directory no longer lists.
    pub fn with_keep_stale(mut self, keep_stale: bool) -> Self {
        self.keep_stale = keep_stale;
        self
    }

    pub fn cache(&self) -> &Arc<ContentCache> {
        &self.cache
    }

    /// Run one refresh cycle.
    ///
    /// **Algorithm**:
    /// - Fetch the full content directory; on error return it untouched
    /// - Expand it, logging and dropping malformed entries
    /// - Upsert every entry, one key at a time
    /// - Remove keys this cycle did not produce (unless keeping stale keys)
    /// - Open the readiness gate
    ///
    /// Concurrent calls run one after another.
    ///
    /// # Returns
    /// Stats about the refresh, or the fetch error. The store is not modified
    /// when fetching fails.
    pub async fn refresh(&self) -> Result<RefreshStats, FetchError> {
        let _cycle = self.cycle.lock().await;
        let start = Instant::now();

        let directory = self.source.fetch().await?;
        let expanded = self.loader.expand(directory);

        for err in &expanded.errors {
            warn!("Skipping malformed rule content: {}", err);
        }

        let store = self.cache.store();
        let rules_refreshed = expanded.rule_contents.len();
        let entries_refreshed = expanded.rules_with_content.len();

        let mut seen_rules = HashSet::with_capacity(rules_refreshed);
        for (rule_id, content) in expanded.rule_contents {
            seen_rules.insert(rule_id.clone());
            store.set_rule_content(rule_id, content);
        }

        let mut seen_entries = HashSet::with_capacity(entries_refreshed);
        for entry in expanded.rules_with_content {
            seen_entries.insert(entry.key());
            store.set_rule_with_content(entry.module.clone(), entry.error_key.clone(), entry);
        }

        let stale_purged = if self.keep_stale {
            0
        } else {
            self.purge_stale(&seen_rules, &seen_entries)
        };

        if self.cache.gate().open() {
            info!("Rule content loaded for the first time, readers unblocked");
        }

        let duration_ms = start.elapsed().as_millis() as u64;

        Ok(RefreshStats {
            rules_refreshed,
            entries_refreshed,
            entries_skipped: expanded.errors.len(),
            stale_purged,
            duration_ms,
            timestamp: now_ms(),
        })
    }

    /// Refresh and log the outcome instead of returning it.
    ///
    /// Returns the stats on success so callers can track the last refresh.
    pub async fn refresh_logged(&self) -> Option<RefreshStats> {
        match self.refresh().await {
            Ok(stats) => {
                info!(
                    "Content refresh completed: {} rules, {} entries ({} skipped, {} purged) in {}ms",
                    stats.rules_refreshed,
                    stats.entries_refreshed,
                    stats.entries_skipped,
                    stats.stale_purged,
                    stats.duration_ms
                );
                Some(stats)
            }
            Err(e) => {
                error!("Error retrieving static content: {}", e);
                None
            }
        }
    }

    fn purge_stale(&self, rules: &HashSet<RuleId>, entries: &HashSet<RuleErrorKey>) -> usize {
        let store = self.cache.store();
        let mut purged = 0;

        for key in store.rule_error_keys() {
            if !entries.contains(&key) && store.remove_rule_with_content(&key) {
                purged += 1;
            }
        }
        for rule_id in store.rule_ids() {
            if !rules.contains(&rule_id) && store.remove_rule_content(&rule_id) {
                purged += 1;
            }
        }

        purged
    }
}
