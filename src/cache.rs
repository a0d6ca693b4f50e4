//! Query layer over the keyed store and readiness gate.
//!
//! One `ContentCache` is built at startup and shared by `Arc` between the
//! refresh driver (writer) and request handlers (readers).
//!
//! # Read semantics
//! - Before the first successful refresh every lookup suspends the caller.
//! - Afterwards lookups never wait on the gate; a missing entry is a
//!   [`CacheError::NotFound`] carrying the requested id.
//! - Refresh failures are invisible to readers except as staleness.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{CacheError, CacheResult};
use crate::gate::ReadinessGate;
use crate::storage::{KeyedStore, StoreStats};
use crate::types::{ErrorKey, RuleContent, RuleId, RuleWithContent};

#[derive(Debug, Default)]
pub struct ContentCache {
    store: KeyedStore,
    gate: ReadinessGate,
}

impl ContentCache {
    /// Create an empty cache with a closed gate.
    pub fn new() -> Self {
        Self::default()
    }

    // ============================================================================================
    // ACCESSORS
    // ============================================================================================

    pub fn store(&self) -> &KeyedStore {
        &self.store
    }

    pub fn gate(&self) -> &ReadinessGate {
        &self.gate
    }

    pub fn is_ready(&self) -> bool {
        self.gate.is_ready()
    }

    /// Wait up to `timeout` for the first load. Returns whether content is available.
    pub async fn wait_ready_timeout(&self, timeout: Duration) -> bool {
        self.gate.wait_timeout(timeout).await
    }

    pub fn stats(&self) -> StoreStats {
        self.store.stats()
    }

    // ============================================================================================
    // ASYNC LOOKUPS
    // ============================================================================================

    /// Content for `rule_id`, waiting for the first load if necessary.
    pub async fn get_rule_content(&self, rule_id: &RuleId) -> CacheResult<Arc<RuleContent>> {
        self.gate.wait().await;
        self.lookup_rule_content(rule_id)
    }

    /// Content for `(rule_id, error_key)`, waiting for the first load if necessary.
    pub async fn get_rule_with_error_key_content(
        &self,
        rule_id: &RuleId,
        error_key: &ErrorKey,
    ) -> CacheResult<Arc<RuleWithContent>> {
        self.gate.wait().await;
        self.lookup_rule_with_content(rule_id, error_key)
    }

    /// Ids of every stored rule, sorted.
    pub async fn rule_ids(&self) -> Vec<RuleId> {
        self.gate.wait().await;
        self.store.rule_ids()
    }

    /// Every stored rule's content, ordered by rule id.
    pub async fn all_rule_contents(&self) -> Vec<Arc<RuleContent>> {
        self.gate.wait().await;
        self.store.all_rule_contents()
    }

    // ============================================================================================
    // BLOCKING LOOKUPS (for plain threads)
    // ============================================================================================

    pub fn get_rule_content_blocking(&self, rule_id: &RuleId) -> CacheResult<Arc<RuleContent>> {
        self.gate.wait_blocking();
        self.lookup_rule_content(rule_id)
    }

    pub fn get_rule_with_error_key_content_blocking(
        &self,
        rule_id: &RuleId,
        error_key: &ErrorKey,
    ) -> CacheResult<Arc<RuleWithContent>> {
        self.gate.wait_blocking();
        self.lookup_rule_with_content(rule_id, error_key)
    }

    fn lookup_rule_content(&self, rule_id: &RuleId) -> CacheResult<Arc<RuleContent>> {
        self.store
            .get_rule_content(rule_id)
            .ok_or_else(|| CacheError::rule_not_found(rule_id))
    }

    fn lookup_rule_with_content(
        &self,
        rule_id: &RuleId,
        error_key: &ErrorKey,
    ) -> CacheResult<Arc<RuleWithContent>> {
        self.store
            .get_rule_with_content(rule_id, error_key)
            .ok_or_else(|| CacheError::error_key_not_found(rule_id, error_key))
    }
}
