//! Core data model for rule content.
//!
//! Wire names follow the content service's JSON encoding of the bulk
//! content directory. Everything here is immutable once built; the store
//! shares values behind `Arc` and replaces them wholesale on refresh.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since UNIX epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ================================================================================================
// IDENTIFIERS
// ================================================================================================

/// Identifier of a rule definition (the rule plugin's python module).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(String);

impl RuleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RuleId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RuleId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identifier of one error variant of a rule.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorKey(String);

impl ErrorKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ErrorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ErrorKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for ErrorKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Composite lookup key for the per-error-key index.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleErrorKey {
    pub rule_id: RuleId,
    pub error_key: ErrorKey,
}

impl RuleErrorKey {
    pub fn new(rule_id: RuleId, error_key: ErrorKey) -> Self {
        Self { rule_id, error_key }
    }
}

impl fmt::Display for RuleErrorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.rule_id, self.error_key)
    }
}

// ================================================================================================
// CONTENT DIRECTORY (UPSTREAM PAYLOAD)
// ================================================================================================

/// Plugin information attached to a rule.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulePluginInfo {
    pub name: String,
    pub node_id: String,
    pub product_code: String,
    pub python_module: String,
}

/// Metadata of a single error key.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorKeyMetadata {
    pub condition: String,
    pub description: String,
    /// Impact name, resolved through [`GlobalRuleConfig::impact`]
    pub impact: String,
    pub likelihood: i32,
    pub publish_date: String,
    pub status: String,
    pub tags: Vec<String>,
}

/// Content specific to one error key of a rule.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleErrorKeyContent {
    pub generic: String,
    pub summary: String,
    pub reason: String,
    pub resolution: String,
    pub more_info: String,
    pub metadata: ErrorKeyMetadata,
    pub has_reason: bool,
}

/// Static content of a rule, independent of error key.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleContent {
    pub summary: String,
    pub reason: String,
    pub resolution: String,
    pub more_info: String,
    pub plugin: RulePluginInfo,
    pub error_keys: HashMap<String, RuleErrorKeyContent>,
    pub has_reason: bool,
}

/// Configuration shared by every rule in a directory.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalRuleConfig {
    /// Impact name to numeric weight
    pub impact: HashMap<String, i32>,
}

/// Bulk payload returned by the content service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentDirectory {
    pub config: GlobalRuleConfig,
    pub rules: HashMap<String, RuleContent>,
}

// ================================================================================================
// RESOLVED CONTENT
// ================================================================================================

/// Fully resolved, ready-to-serve content for one (rule, error key) pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleWithContent {
    pub module: RuleId,
    pub name: String,
    pub summary: String,
    pub reason: String,
    pub resolution: String,
    pub more_info: String,
    pub error_key: ErrorKey,
    pub condition: String,
    pub description: String,
    pub impact: i32,
    pub likelihood: i32,
    pub total_risk: i32,
    pub publish_date: DateTime<Utc>,
    pub active: bool,
    pub internal: bool,
    pub generic: String,
    pub tags: Vec<String>,
}

impl RuleWithContent {
    pub fn key(&self) -> RuleErrorKey {
        RuleErrorKey::new(self.module.clone(), self.error_key.clone())
    }
}
