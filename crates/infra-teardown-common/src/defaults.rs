//! Default values shared by the resource wrappers and teardown configuration

/// Seconds between status polls while a CloudFront distribution deploys
pub const DISTRIBUTION_POLL_INTERVAL_SECS: u64 = 30;

/// Maximum seconds to wait for a CloudFront distribution to reach `Deployed` (30 minutes)
pub const DISTRIBUTION_DEPLOY_TIMEOUT_SECS: u64 = 1800;

/// S3 `DeleteObjects` accepts at most this many keys per call
pub const S3_MAX_KEYS_PER_DELETE: usize = 1000;

/// EventBridge bus used when a rule does not name one
pub const DEFAULT_EVENT_BUS: &str = "default";

/// Marker present in the ARN of every AWS-managed IAM policy
pub const AWS_MANAGED_POLICY_MARKER: &str = ":iam::aws:policy/";

// Serde default functions for struct field defaults

/// Returns the default distribution poll interval
pub fn default_distribution_poll_interval_secs() -> u64 {
    DISTRIBUTION_POLL_INTERVAL_SECS
}

/// Returns the default distribution deploy timeout
pub fn default_distribution_deploy_timeout_secs() -> u64 {
    DISTRIBUTION_DEPLOY_TIMEOUT_SECS
}

/// Returns the default event bus name
pub fn default_event_bus() -> String {
    DEFAULT_EVENT_BUS.to_string()
}

/// Teardown runs are dry runs unless explicitly disabled
pub fn default_dry_run() -> bool {
    true
}
