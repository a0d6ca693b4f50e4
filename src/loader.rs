//! Expansion of a content directory into indexable entries.
//!
//! Pure transformation: no I/O, no store access. Malformed (rule, error key)
//! entries are dropped and reported as [`LoadError`]s; everything else in
//! the directory still loads.

use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::LoadError;
use crate::types::{
    ContentDirectory, ErrorKey, GlobalRuleConfig, RuleContent, RuleErrorKeyContent, RuleId,
    RuleWithContent,
};

/// Default pattern matching internal-only rule modules.
pub const DEFAULT_INTERNAL_RULES_PATTERN: &str = r"^ccx_rules_ocp\.internal\.";

static DEFAULT_INTERNAL_RULES: Lazy<Regex> =
    Lazy::new(|| Regex::new(DEFAULT_INTERNAL_RULES_PATTERN).expect("valid regex"));

/// Fallback publish date layout used by older rule content.
const LEGACY_PUBLISH_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Result of expanding one content directory.
#[derive(Debug, Default)]
pub struct ExpandedContent {
    pub rule_contents: Vec<(RuleId, RuleContent)>,
    pub rules_with_content: Vec<RuleWithContent>,
    pub errors: Vec<LoadError>,
}

/// Turns a [`ContentDirectory`] into by-rule and by-(rule, error key) entries.
#[derive(Debug, Clone)]
pub struct ContentLoader {
    internal_rules: Regex,
}

impl Default for ContentLoader {
    fn default() -> Self {
        Self::new(DEFAULT_INTERNAL_RULES.clone())
    }
}

impl ContentLoader {
    pub fn new(internal_rules: Regex) -> Self {
        Self { internal_rules }
    }

    pub fn is_rule_internal(&self, rule_id: &RuleId) -> bool {
        self.internal_rules.is_match(rule_id.as_str())
    }

    /// Expand the whole directory.
    pub fn expand(&self, directory: ContentDirectory) -> ExpandedContent {
        let ContentDirectory { config, rules } = directory;
        let mut expanded = ExpandedContent::default();

        for (rule_name, rule) in rules {
            if rule.plugin.python_module.is_empty() {
                expanded.errors.push(LoadError::MissingRuleId { rule_name });
                continue;
            }
            let rule_id = RuleId::new(rule.plugin.python_module.clone());

            for (error_key, properties) in &rule.error_keys {
                let error_key = ErrorKey::new(error_key.clone());
                match self.resolve(&config, &rule_id, &rule, error_key, properties) {
                    Ok(entry) => expanded.rules_with_content.push(entry),
                    Err(e) => expanded.errors.push(e),
                }
            }

            expanded.rule_contents.push((rule_id, rule));
        }

        expanded
    }

    fn resolve(
        &self,
        config: &GlobalRuleConfig,
        rule_id: &RuleId,
        rule: &RuleContent,
        error_key: ErrorKey,
        properties: &RuleErrorKeyContent,
    ) -> Result<RuleWithContent, LoadError> {
        let metadata = &properties.metadata;

        let impact = match config.impact.get(&metadata.impact) {
            Some(impact) => *impact,
            None => {
                return Err(LoadError::UnknownImpact {
                    rule_id: rule_id.clone(),
                    error_key,
                    impact: metadata.impact.clone(),
                })
            }
        };

        let active = match parse_status(&metadata.status) {
            Some(active) => active,
            None => {
                return Err(LoadError::InvalidStatus {
                    rule_id: rule_id.clone(),
                    error_key,
                    status: metadata.status.clone(),
                })
            }
        };

        let publish_date = match parse_publish_date(&metadata.publish_date) {
            Ok(date) => date,
            Err(source) => {
                return Err(LoadError::InvalidPublishDate {
                    rule_id: rule_id.clone(),
                    error_key,
                    value: metadata.publish_date.clone(),
                    source,
                })
            }
        };

        Ok(RuleWithContent {
            module: rule_id.clone(),
            name: rule.plugin.name.clone(),
            summary: prefer(&properties.summary, &rule.summary),
            reason: prefer(&properties.reason, &rule.reason),
            resolution: prefer(&properties.resolution, &rule.resolution),
            more_info: prefer(&properties.more_info, &rule.more_info),
            error_key,
            condition: metadata.condition.clone(),
            description: metadata.description.clone(),
            impact,
            likelihood: metadata.likelihood,
            total_risk: total_risk(impact, metadata.likelihood),
            publish_date,
            active,
            internal: self.is_rule_internal(rule_id),
            generic: properties.generic.clone(),
            tags: metadata.tags.clone(),
        })
    }
}

/// Error-key-level text wins over rule-level text when present.
fn prefer(specific: &str, general: &str) -> String {
    if specific.is_empty() {
        general.to_string()
    } else {
        specific.to_string()
    }
}

pub fn total_risk(impact: i32, likelihood: i32) -> i32 {
    (impact + likelihood) / 2
}

/// `Some(true)` for "active", `Some(false)` for "inactive", `None` otherwise.
pub fn parse_status(status: &str) -> Option<bool> {
    match status.trim().to_lowercase().as_str() {
        "active" => Some(true),
        "inactive" => Some(false),
        _ => None,
    }
}

/// Parse RFC 3339, falling back to `YYYY-MM-DD HH:MM:SS` in UTC.
pub fn parse_publish_date(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let value = value.trim();
    match DateTime::parse_from_rfc3339(value) {
        Ok(date) => Ok(date.with_timezone(&Utc)),
        Err(_) => NaiveDateTime::parse_from_str(value, LEGACY_PUBLISH_DATE_FORMAT)
            .map(|naive| naive.and_utc()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ErrorKeyMetadata, RulePluginInfo};
    use chrono::TimeZone;
    use std::collections::HashMap;

    fn error_key(impact: &str, status: &str, publish_date: &str) -> RuleErrorKeyContent {
        RuleErrorKeyContent {
            generic: "generic".to_string(),
            metadata: ErrorKeyMetadata {
                description: "description".to_string(),
                impact: impact.to_string(),
                likelihood: 3,
                publish_date: publish_date.to_string(),
                status: status.to_string(),
                tags: vec!["security".to_string()],
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn rule(module: &str, error_keys: Vec<(&str, RuleErrorKeyContent)>) -> RuleContent {
        RuleContent {
            summary: "rule summary".to_string(),
            reason: "rule reason".to_string(),
            resolution: "rule resolution".to_string(),
            more_info: "rule more info".to_string(),
            plugin: RulePluginInfo {
                name: "Rule name".to_string(),
                python_module: module.to_string(),
                ..Default::default()
            },
            error_keys: error_keys
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            has_reason: true,
        }
    }

    fn directory(rules: Vec<RuleContent>) -> ContentDirectory {
        ContentDirectory {
            config: GlobalRuleConfig {
                impact: HashMap::from([("Low".to_string(), 1), ("High".to_string(), 3)]),
            },
            rules: rules
                .into_iter()
                .enumerate()
                .map(|(i, r)| (format!("rule{}", i), r))
                .collect(),
        }
    }

    #[test]
    fn test_expand_resolves_fields() {
        let dir = directory(vec![rule(
            "ccx.rule1",
            vec![("EK1", error_key("High", "active", "2020-04-08T00:42:00Z"))],
        )]);

        let expanded = ContentLoader::default().expand(dir);
        assert!(expanded.errors.is_empty());
        assert_eq!(expanded.rule_contents.len(), 1);
        assert_eq!(expanded.rules_with_content.len(), 1);

        let entry = &expanded.rules_with_content[0];
        assert_eq!(entry.module, RuleId::new("ccx.rule1"));
        assert_eq!(entry.error_key, ErrorKey::new("EK1"));
        assert_eq!(entry.name, "Rule name");
        assert_eq!(entry.summary, "rule summary");
        assert_eq!(entry.impact, 3);
        assert_eq!(entry.likelihood, 3);
        assert_eq!(entry.total_risk, 3);
        assert!(entry.active);
        assert!(!entry.internal);
        assert_eq!(entry.tags, vec!["security".to_string()]);
        assert_eq!(
            entry.publish_date,
            Utc.with_ymd_and_hms(2020, 4, 8, 0, 42, 0).unwrap()
        );
    }

    #[test]
    fn test_error_key_text_overrides_rule_text() {
        let mut ek = error_key("Low", "active", "2020-04-08T00:42:00Z");
        ek.summary = "specific summary".to_string();
        let dir = directory(vec![rule("ccx.rule1", vec![("EK1", ek)])]);

        let expanded = ContentLoader::default().expand(dir);
        let entry = &expanded.rules_with_content[0];
        assert_eq!(entry.summary, "specific summary");
        assert_eq!(entry.reason, "rule reason");
    }

    #[test]
    fn test_legacy_publish_date_format_loads() {
        let dir = directory(vec![rule(
            "ccx.rule4",
            vec![("EK4", error_key("Low", "active", "2020-02-03 08:25:00"))],
        )]);

        let expanded = ContentLoader::default().expand(dir);
        assert!(expanded.errors.is_empty());
        assert_eq!(
            expanded.rules_with_content[0].publish_date,
            Utc.with_ymd_and_hms(2020, 2, 3, 8, 25, 0).unwrap()
        );
    }

    #[test]
    fn test_bad_entry_dropped_rest_kept() {
        let dir = directory(vec![rule(
            "ccx.rule1",
            vec![
                ("GOOD", error_key("Low", "active", "2020-04-08T00:42:00Z")),
                ("BAD_DATE", error_key("Low", "active", "not a date")),
                ("BAD_IMPACT", error_key("Gigantic", "active", "2020-04-08T00:42:00Z")),
                ("BAD_STATUS", error_key("Low", "retired", "2020-04-08T00:42:00Z")),
            ],
        )]);

        let expanded = ContentLoader::default().expand(dir);
        assert_eq!(expanded.rules_with_content.len(), 1);
        assert_eq!(expanded.rules_with_content[0].error_key, ErrorKey::new("GOOD"));
        // Rule-level content survives bad error keys
        assert_eq!(expanded.rule_contents.len(), 1);
        assert_eq!(expanded.errors.len(), 3);

        assert!(expanded
            .errors
            .iter()
            .any(|e| matches!(e, LoadError::InvalidPublishDate { value, .. } if value == "not a date")));
        assert!(expanded
            .errors
            .iter()
            .any(|e| matches!(e, LoadError::UnknownImpact { impact, .. } if impact == "Gigantic")));
        assert!(expanded
            .errors
            .iter()
            .any(|e| matches!(e, LoadError::InvalidStatus { status, .. } if status == "retired")));
    }

    #[test]
    fn test_rule_without_module_skipped() {
        let dir = directory(vec![
            rule("", vec![("EK1", error_key("Low", "active", "2020-04-08T00:42:00Z"))]),
            rule("ccx.rule2", vec![]),
        ]);

        let expanded = ContentLoader::default().expand(dir);
        assert_eq!(expanded.rule_contents.len(), 1);
        assert_eq!(expanded.rule_contents[0].0, RuleId::new("ccx.rule2"));
        assert!(expanded.rules_with_content.is_empty());
        assert!(matches!(
            expanded.errors.as_slice(),
            [LoadError::MissingRuleId { .. }]
        ));
    }

    #[test]
    fn test_internal_rule_flag() {
        let dir = directory(vec![rule(
            "ccx_rules_ocp.internal.rules.secret",
            vec![("EK1", error_key("Low", "inactive", "2020-04-08T00:42:00Z"))],
        )]);

        let expanded = ContentLoader::default().expand(dir);
        let entry = &expanded.rules_with_content[0];
        assert!(entry.internal);
        assert!(!entry.active);
    }

    #[test]
    fn test_default_loader_matches_internal_modules() {
        let loader = ContentLoader::default();
        assert!(loader.is_rule_internal(&"ccx_rules_ocp.internal.rules.secret".into()));
        assert!(!loader.is_rule_internal(&"ccx_rules_ocp.external.rules.node".into()));
        assert!(!loader.is_rule_internal(&"x.ccx_rules_ocp.internal.rule".into()));
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status(" Active "), Some(true));
        assert_eq!(parse_status("INACTIVE"), Some(false));
        assert_eq!(parse_status(""), None);
    }

    #[test]
    fn test_total_risk() {
        assert_eq!(total_risk(4, 2), 3);
        assert_eq!(total_risk(1, 2), 1);
    }
}
