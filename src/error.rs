//! Error types for the content cache

use crate::types::{ErrorKey, RuleId};
use thiserror::Error;

/// Errors raised while fetching the content directory.
///
/// All of these are recoverable: the refresh cycle is skipped and the
/// cache keeps serving whatever it already holds.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed (connection refused, timeout, body read)
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Content service answered with a non-success status
    #[error("HTTP error: {0}")]
    HttpStatus(reqwest::StatusCode),

    /// Response body is not a valid content directory
    #[error("Failed to decode content directory: {0}")]
    Decode(#[from] serde_json::Error),

    /// Source could not provide content for another reason
    #[error("Content unavailable: {0}")]
    Unavailable(String),
}

/// A single malformed entry found while expanding a content directory.
///
/// The entry is dropped and the rest of the directory still loads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("rule '{rule_name}' has no python module, skipping the whole rule")]
    MissingRuleId { rule_name: String },

    #[error("{rule_id}/{error_key}: impact \"{impact}\" doesn't have integer representation")]
    UnknownImpact {
        rule_id: RuleId,
        error_key: ErrorKey,
        impact: String,
    },

    #[error("{rule_id}/{error_key}: invalid status \"{status}\"")]
    InvalidStatus {
        rule_id: RuleId,
        error_key: ErrorKey,
        status: String,
    },

    #[error("{rule_id}/{error_key}: invalid publish date \"{value}\": {source}")]
    InvalidPublishDate {
        rule_id: RuleId,
        error_key: ErrorKey,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Errors surfaced to callers of the query layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// Requested rule or (rule, error key) has no entry
    #[error("Item with ID {item_id} was not found in the storage")]
    NotFound { item_id: String },
}

impl CacheError {
    pub fn rule_not_found(rule_id: &RuleId) -> Self {
        CacheError::NotFound {
            item_id: rule_id.to_string(),
        }
    }

    pub fn error_key_not_found(rule_id: &RuleId, error_key: &ErrorKey) -> Self {
        CacheError::NotFound {
            item_id: format!("{}/{}", rule_id, error_key),
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("content base endpoint must be an http(s) URL, got \"{0}\"")]
    InvalidEndpoint(String),

    #[error("{0} must be > 0")]
    ZeroDuration(&'static str),

    #[error("invalid internal rules pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

pub type CacheResult<T> = Result<T, CacheError>;
