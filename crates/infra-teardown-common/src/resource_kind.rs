//! AWS resource types and cleanup ordering
//!
//! Provides consistent cleanup priority for every teardown. Resources must be
//! cleaned in dependency order so that AWS does not reject a delete because
//! something still references the target.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Types of AWS resources that infra-teardown can delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// CloudFront distribution (may use an S3 bucket as its origin)
    #[serde(rename = "cloudfront_distribution")]
    CloudFrontDistribution,
    /// EventBridge rule on a named bus
    #[serde(rename = "eventbridge_rule")]
    EventBridgeRule,
    /// IAM instance profile
    IamInstanceProfile,
    /// IAM user
    IamUser,
    /// IAM group
    IamGroup,
    /// IAM role
    IamRole,
    /// Customer-managed IAM policy
    IamPolicy,
    /// S3 bucket, including every object version
    S3Bucket,
}

impl ResourceKind {
    /// All kinds, in cleanup order.
    pub const ALL: [ResourceKind; 8] = [
        ResourceKind::CloudFrontDistribution,
        ResourceKind::EventBridgeRule,
        ResourceKind::IamInstanceProfile,
        ResourceKind::IamUser,
        ResourceKind::IamGroup,
        ResourceKind::IamRole,
        ResourceKind::IamPolicy,
        ResourceKind::S3Bucket,
    ];

    /// Get cleanup priority (lower number = cleanup first)
    ///
    /// - 0: CloudFront distributions (they front S3 origins and take the longest)
    /// - 1: EventBridge rules
    /// - 2: IAM instance profiles
    /// - 3: IAM users
    /// - 4: IAM groups
    /// - 5: IAM roles
    /// - 6: IAM policies (after the entities they attach to, so few detaches remain)
    /// - 7: S3 buckets (may still be a distribution origin or log target until then)
    pub fn cleanup_priority(self) -> u8 {
        match self {
            ResourceKind::CloudFrontDistribution => 0,
            ResourceKind::EventBridgeRule => 1,
            ResourceKind::IamInstanceProfile => 2,
            ResourceKind::IamUser => 3,
            ResourceKind::IamGroup => 4,
            ResourceKind::IamRole => 5,
            ResourceKind::IamPolicy => 6,
            ResourceKind::S3Bucket => 7,
        }
    }

    /// Stable identifier used in logs and configuration files
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::CloudFrontDistribution => "cloudfront_distribution",
            ResourceKind::EventBridgeRule => "eventbridge_rule",
            ResourceKind::IamInstanceProfile => "iam_instance_profile",
            ResourceKind::IamUser => "iam_user",
            ResourceKind::IamGroup => "iam_group",
            ResourceKind::IamRole => "iam_role",
            ResourceKind::IamPolicy => "iam_policy",
            ResourceKind::S3Bucket => "s3_bucket",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
