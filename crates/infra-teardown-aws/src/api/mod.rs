//! Service API seams
//!
//! Each wrapped AWS service is reached through a small trait listing exactly
//! the calls the teardown protocols need. The `*Client` types implement the
//! traits over the real SDK clients; tests substitute the generated mocks.

pub mod cloudfront;
pub mod eventbridge;
pub mod iam;
pub mod s3;

pub use cloudfront::{CloudFrontApi, CloudFrontClient, DistributionConfigSnapshot};
pub use eventbridge::{EventBridgeApi, EventBridgeClient, RemoveTargetsFailure, TargetPage};
pub use iam::{IamApi, IamClient, PolicyEntities, PolicyVersionInfo};
pub use s3::{DeleteFailure, ObjectVersion, ObjectVersionPage, S3Api, S3Client};

#[cfg(test)]
pub use cloudfront::MockCloudFrontApi;
#[cfg(test)]
pub use eventbridge::MockEventBridgeApi;
#[cfg(test)]
pub use iam::MockIamApi;
#[cfg(test)]
pub use s3::MockS3Api;
