//! Teardown configuration loading from JSON

use crate::wait::WaitConfig;
use anyhow::{Context, Result};
use infra_teardown_common::ResourceKind;
use infra_teardown_common::defaults::{
    default_distribution_deploy_timeout_secs, default_distribution_poll_interval_secs,
    default_dry_run,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// One resource to tear down
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, garde::Validate)]
#[serde(deny_unknown_fields)]
pub struct ResourceSpec {
    #[garde(skip)]
    pub kind: ResourceKind,

    /// Name, ARN or ID, depending on the kind
    #[garde(length(min = 1))]
    pub id: String,

    /// Event bus for EventBridge rules (default: "default")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[garde(length(min = 1))]
    pub event_bus_name: Option<String>,
}

impl ResourceSpec {
    pub fn new(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            event_bus_name: None,
        }
    }

    pub fn with_event_bus(mut self, event_bus_name: impl Into<String>) -> Self {
        self.event_bus_name = Some(event_bus_name.into());
        self
    }
}

/// Polling settings for CloudFront deployments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, garde::Validate)]
#[serde(deny_unknown_fields)]
pub struct DistributionWait {
    /// Seconds between status checks (default: 30)
    #[serde(default = "default_distribution_poll_interval_secs")]
    #[garde(range(min = 1))]
    pub poll_interval_secs: u64,

    /// Seconds before giving up on a deployment (default: 1800)
    #[serde(default = "default_distribution_deploy_timeout_secs")]
    #[garde(range(min = 1))]
    pub timeout_secs: u64,
}

impl Default for DistributionWait {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_distribution_poll_interval_secs(),
            timeout_secs: default_distribution_deploy_timeout_secs(),
        }
    }
}

impl DistributionWait {
    pub fn to_wait_config(&self) -> WaitConfig {
        WaitConfig::fixed(
            Duration::from_secs(self.poll_interval_secs),
            Duration::from_secs(self.timeout_secs),
        )
    }
}

/// A declared set of resources to delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, garde::Validate)]
#[serde(deny_unknown_fields)]
pub struct TeardownConfig {
    /// AWS region; the provider chain decides when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[garde(length(min = 1))]
    pub region: Option<String>,

    /// Log what would be deleted without deleting (default: true)
    #[serde(default = "default_dry_run")]
    #[garde(skip)]
    pub dry_run: bool,

    #[serde(default)]
    #[garde(dive)]
    pub distribution_wait: DistributionWait,

    #[serde(default)]
    #[garde(dive)]
    pub resources: Vec<ResourceSpec>,
}

impl TeardownConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(content).context("Failed to parse teardown config")?;
        config.check()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_json_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    fn check(&self) -> Result<()> {
        use garde::Validate;
        self.validate()
            .map_err(|report| anyhow::anyhow!("Teardown config failed validation: {report}"))?;

        let wait = &self.distribution_wait;
        if wait.poll_interval_secs > wait.timeout_secs {
            anyhow::bail!(
                "Teardown config failed validation: distribution_wait.poll_interval_secs ({}) exceeds timeout_secs ({})",
                wait.poll_interval_secs,
                wait.timeout_secs
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = TeardownConfig::from_json_str(r#"{"resources": []}"#).unwrap();
        assert!(config.dry_run);
        assert_eq!(config.region, None);
        assert_eq!(config.distribution_wait, DistributionWait::default());

        let wait = config.distribution_wait.to_wait_config();
        assert_eq!(wait.initial_delay, Duration::from_secs(30));
        assert_eq!(wait.timeout, Duration::from_secs(1800));
    }

    #[test]
    fn load_full_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{
                "region": "us-east-2",
                "dry_run": false,
                "distribution_wait": {{ "poll_interval_secs": 5, "timeout_secs": 60 }},
                "resources": [
                    {{ "kind": "s3_bucket", "id": "site-assets" }},
                    {{ "kind": "eventbridge_rule", "id": "nightly", "event_bus_name": "ops" }},
                    {{ "kind": "iam_policy", "id": "arn:aws:iam::123456789012:policy/app" }}
                ]
            }}"#
        )
        .unwrap();

        let config = TeardownConfig::load(file.path()).unwrap();
        assert_eq!(config.region.as_deref(), Some("us-east-2"));
        assert!(!config.dry_run);
        assert_eq!(config.distribution_wait.poll_interval_secs, 5);
        assert_eq!(config.resources.len(), 3);
        assert_eq!(
            config.resources[1],
            ResourceSpec::new(ResourceKind::EventBridgeRule, "nightly").with_event_bus("ops")
        );
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = TeardownConfig::from_json_str(
            r#"{"resources": [{"kind": "lambda_function", "id": "f"}]}"#,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("parse"));
    }

    #[test]
    fn unknown_field_is_rejected() {
        assert!(TeardownConfig::from_json_str(r#"{"resources": [], "force": true}"#).is_err());
    }

    #[test]
    fn empty_id_fails_validation() {
        let err = TeardownConfig::from_json_str(r#"{"resources": [{"kind": "iam_user", "id": ""}]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("validation"));
    }

    #[test]
    fn zero_poll_interval_fails_validation() {
        let json = r#"{"distribution_wait": {"poll_interval_secs": 0}, "resources": []}"#;
        assert!(TeardownConfig::from_json_str(json).is_err());
    }

    #[test]
    fn poll_interval_longer_than_timeout_fails_validation() {
        let json = r#"{"distribution_wait": {"poll_interval_secs": 3600, "timeout_secs": 60}, "resources": []}"#;
        let err = TeardownConfig::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("poll_interval_secs"));

        let json = r#"{"distribution_wait": {"poll_interval_secs": 60, "timeout_secs": 60}, "resources": []}"#;
        assert!(TeardownConfig::from_json_str(json).is_ok());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = TeardownConfig::load(Path::new("/nonexistent/teardown.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/teardown.json"));
    }

    #[test]
    fn serializes_kinds_by_config_name() {
        let config = TeardownConfig {
            region: None,
            dry_run: true,
            distribution_wait: DistributionWait::default(),
            resources: vec![ResourceSpec::new(ResourceKind::CloudFrontDistribution, "E1")],
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains(r#""kind":"cloudfront_distribution""#));
        assert!(!json.contains("event_bus_name"));
    }
}
