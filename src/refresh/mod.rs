//! Content refresh - reload the cache from the content service.
//!
//! Provides two refresh mechanisms:
//! 1. **On-demand refresh** (RefreshService): one fetch-and-index cycle
//! 2. **Scheduled refresh** (RefreshScheduler): periodic background task driving the service

pub mod scheduler;
pub mod service;

pub use scheduler::{RefreshScheduler, SchedulerConfig};
pub use service::{RefreshService, RefreshStats};
