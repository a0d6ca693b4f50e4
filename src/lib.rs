//! # Rule Content Cache
//!
//! Read-mostly, periodically refreshed in-memory cache of rule content.
//!
//! # Overview
//!
//! - [`ContentCache`] answers lookups by rule id and by (rule id, error key).
//!   Lookups made before the first successful load suspend until it lands.
//! - [`RefreshService`] runs one fetch → expand → upsert cycle.
//! - [`RefreshScheduler`] drives the service on a fixed interval, starting
//!   immediately and surviving upstream failures.
//! - [`ContentSource`] abstracts the upstream fetch; [`HttpContentSource`]
//!   talks to the content service.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use content_cache::{
//!     ContentCache, HttpContentSource, RefreshScheduler, RefreshService, SchedulerConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cache = Arc::new(ContentCache::new());
//!     let source = Arc::new(HttpContentSource::new(
//!         "http://localhost:8082/api/v1/",
//!         Duration::from_secs(30),
//!     )?);
//!     let service = Arc::new(RefreshService::new(cache.clone(), source));
//!     Arc::new(RefreshScheduler::new(service, SchedulerConfig::default())).spawn();
//!
//!     // Waits for the first successful load
//!     let content = cache.get_rule_content(&"ccx.rule1".into()).await?;
//!     println!("{}", content.summary);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod gate;
pub mod loader;
pub mod refresh;
pub mod source;
pub mod storage;
pub mod types;

pub use cache::ContentCache;
pub use config::CacheConfig;
pub use error::{CacheError, CacheResult, ConfigError, FetchError, LoadError};
pub use gate::ReadinessGate;
pub use loader::{ContentLoader, ExpandedContent};
pub use refresh::{RefreshScheduler, RefreshService, RefreshStats, SchedulerConfig};
pub use source::{ContentSource, HttpContentSource};
pub use storage::{KeyedStore, StoreStats};
pub use types::{
    ContentDirectory, ErrorKey, ErrorKeyMetadata, GlobalRuleConfig, RuleContent, RuleErrorKey,
    RuleErrorKeyContent, RuleId, RulePluginInfo, RuleWithContent,
};
