//! infra-teardown-aws - Dependency-aware AWS resource teardown
//!
//! Each supported resource type is wrapped in a type implementing
//! [`AwsResource`]: an existence check plus an idempotent `delete` that
//! first removes whatever AWS would otherwise refuse to delete around.
//!
//! ## Modules
//!
//! - [`iam`]: Users, groups, roles, managed policies and instance profiles
//! - [`s3`]: Buckets, purged of every object version before deletion
//! - [`cloudfront`]: Distributions (disable, wait for `Deployed`, delete)
//! - [`eventbridge`]: Rules, deleted after their targets
//! - [`cleanup`]: Ordered teardown of a declared resource set
//! - [`api`]: Service traits and their SDK-backed clients
//!
//! The library emits `tracing` events and never installs a subscriber.
//!
//! ```ignore
//! let aws = AwsContext::new("us-east-1").await;
//! let iam = Arc::new(IamClient::from_context(&aws));
//! IamRole::new(iam, "build-agent").delete().await?;
//! ```

pub mod api;
pub mod cleanup;
pub mod cloudfront;
pub mod config;
pub mod context;
pub mod error;
pub mod eventbridge;
pub mod iam;
pub mod resource;
pub mod s3;
pub mod wait;

#[cfg(test)]
mod test_support;

// Core types
pub use context::AwsContext;
pub use error::{AwsError, Result, classify_aws_error};
pub use resource::AwsResource;

// Service clients
pub use api::{CloudFrontClient, EventBridgeClient, IamClient, S3Client};

// Resource wrappers
pub use cloudfront::CloudFrontDistribution;
pub use eventbridge::EventBridgeRule;
pub use iam::{IamGroup, IamInstanceProfile, IamPolicy, IamRole, IamUser};
pub use s3::S3Bucket;

// Teardown
pub use cleanup::{CleanupResult, Teardown, TeardownReport};
pub use config::{DistributionWait, ResourceSpec, TeardownConfig};
pub use wait::{WaitConfig, wait_for_resource};

pub use infra_teardown_common::ResourceKind;
