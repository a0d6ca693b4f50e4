//! In-memory storage for rule content.
//!
//! Two independent indices over immutable entries:
//! - **By rule**: `RuleId → RuleContent`
//! - **By rule and error key**: `(RuleId, ErrorKey) → RuleWithContent`
//!
//! Writes are point upserts/removals; a refresh cycle is applied key by key.

pub mod keyed_store;
pub mod types;

pub use keyed_store::KeyedStore;
pub use types::StoreStats;
