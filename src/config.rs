//! Cache configuration and validation
//!
//! Every option can be given on the command line or through the environment.

use clap::Parser;
use regex::Regex;
use std::time::Duration;

use crate::error::ConfigError;
use crate::loader::{ContentLoader, DEFAULT_INTERNAL_RULES_PATTERN};
use crate::refresh::SchedulerConfig;

/// Configuration for the content cache
#[derive(Parser, Debug, Clone)]
#[command(name = "content-cache", about = "Periodically refreshed rule content cache")]
pub struct CacheConfig {
    /// Base endpoint of the content service
    #[arg(
        long,
        env = "CONTENT_BASE_ENDPOINT",
        default_value = "http://localhost:8082/api/v1/"
    )]
    pub content_base_endpoint: String,

    /// Seconds between content refreshes
    #[arg(long, env = "CONTENT_POLLING_INTERVAL_SECS", default_value = "60")]
    pub polling_interval_secs: u64,

    /// Timeout for one content request, in seconds
    #[arg(long, env = "CONTENT_REQUEST_TIMEOUT_SECS", default_value = "30")]
    pub request_timeout_secs: u64,

    /// Keep rules that a newer content directory no longer lists
    #[arg(long, env = "CONTENT_KEEP_STALE", default_value = "false")]
    pub keep_stale: bool,

    /// Rule modules matching this pattern are flagged internal
    #[arg(
        long,
        env = "CONTENT_INTERNAL_RULES_PATTERN",
        default_value = DEFAULT_INTERNAL_RULES_PATTERN
    )]
    pub internal_rules_pattern: String,

    /// Stop refreshing once content has loaded successfully
    #[arg(long, env = "CONTENT_DISABLE_REFRESH", default_value = "false")]
    pub disable_refresh: bool,
}

impl CacheConfig {
    /// Validate the configuration at startup
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = self.content_base_endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::InvalidEndpoint(
                self.content_base_endpoint.clone(),
            ));
        }
        if self.polling_interval_secs == 0 {
            return Err(ConfigError::ZeroDuration("polling_interval_secs"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroDuration("request_timeout_secs"));
        }
        Regex::new(&self.internal_rules_pattern)?;
        Ok(())
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.polling_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            refresh_interval: self.polling_interval(),
            enabled: !self.disable_refresh,
        }
    }

    /// Loader flagging rules that match the configured internal pattern.
    pub fn content_loader(&self) -> Result<ContentLoader, ConfigError> {
        Ok(ContentLoader::new(Regex::new(&self.internal_rules_pattern)?))
    }
}
