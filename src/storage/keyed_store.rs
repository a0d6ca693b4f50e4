//! Thread-safe keyed store over rule content.
//!
//! Each index sits behind its own `RwLock`. Readers take a read lock for a
//! single point lookup and clone the `Arc` out, so a value is always observed
//! whole. Writers hold the write lock for one insert or removal only.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::types::StoreStats;
use crate::types::{ErrorKey, RuleContent, RuleErrorKey, RuleId, RuleWithContent};

/// Key:value storage for processed rules.
#[derive(Debug, Default)]
pub struct KeyedStore {
    rules: RwLock<HashMap<RuleId, Arc<RuleContent>>>,
    rules_with_content: RwLock<HashMap<RuleErrorKey, Arc<RuleWithContent>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl KeyedStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // ============================================================================================
    // WRITES
    // ============================================================================================

    /// Upsert rule-level content. Overwrites silently.
    pub fn set_rule_content(&self, rule_id: RuleId, content: impl Into<Arc<RuleContent>>) {
        self.rules.write().insert(rule_id, content.into());
    }

    /// Upsert resolved content for one (rule, error key) pair. Overwrites silently.
    pub fn set_rule_with_content(
        &self,
        rule_id: RuleId,
        error_key: ErrorKey,
        value: impl Into<Arc<RuleWithContent>>,
    ) {
        self.rules_with_content
            .write()
            .insert(RuleErrorKey::new(rule_id, error_key), value.into());
    }

    /// Remove a rule from the by-rule index. Returns whether it was present.
    pub fn remove_rule_content(&self, rule_id: &RuleId) -> bool {
        self.rules.write().remove(rule_id).is_some()
    }

    /// Remove one (rule, error key) entry. Returns whether it was present.
    pub fn remove_rule_with_content(&self, key: &RuleErrorKey) -> bool {
        self.rules_with_content.write().remove(key).is_some()
    }

    // ============================================================================================
    // READS
    // ============================================================================================

    /// Look up rule-level content.
    pub fn get_rule_content(&self, rule_id: &RuleId) -> Option<Arc<RuleContent>> {
        let found = self.rules.read().get(rule_id).cloned();
        self.record(found.is_some());
        found
    }

    /// Look up resolved content for a (rule, error key) pair.
    pub fn get_rule_with_content(
        &self,
        rule_id: &RuleId,
        error_key: &ErrorKey,
    ) -> Option<Arc<RuleWithContent>> {
        // HashMap lookup needs an owned composite key
        let key = RuleErrorKey::new(rule_id.clone(), error_key.clone());
        let found = self.rules_with_content.read().get(&key).cloned();
        self.record(found.is_some());
        found
    }

    /// All rule ids currently stored, sorted.
    pub fn rule_ids(&self) -> Vec<RuleId> {
        let mut ids: Vec<RuleId> = self.rules.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// All composite keys currently stored, sorted.
    pub fn rule_error_keys(&self) -> Vec<RuleErrorKey> {
        let mut keys: Vec<RuleErrorKey> = self.rules_with_content.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// All rule-level content, ordered by rule id.
    pub fn all_rule_contents(&self) -> Vec<Arc<RuleContent>> {
        let rules = self.rules.read();
        let mut entries: Vec<(&RuleId, &Arc<RuleContent>)> = rules.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.into_iter().map(|(_, c)| Arc::clone(c)).collect()
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            rules: self.rules.read().len(),
            rules_with_content: self.rules_with_content.read().len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    #[inline]
    fn record(&self, hit: bool) {
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }
}
