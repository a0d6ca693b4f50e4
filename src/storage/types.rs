//! Storage statistics.

/// Snapshot of store usage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of entries in the by-rule index
    pub rules: usize,
    /// Number of entries in the by-(rule, error key) index
    pub rules_with_content: usize,
    /// Lookups that found an entry (both indices)
    pub hits: u64,
    /// Lookups that found nothing (both indices)
    pub misses: u64,
}

impl StoreStats {
    /// Fraction of lookups that hit, or 0.0 before any lookup.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
