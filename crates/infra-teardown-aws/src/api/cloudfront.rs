//! CloudFront API surface used by the distribution wrapper

use crate::context::AwsContext;
use crate::error::{AwsError, Result};
use aws_sdk_cloudfront::Client;
use aws_sdk_cloudfront::types::DistributionConfig;

/// CloudFront client for disabling and deleting distributions
pub struct CloudFrontClient {
    client: Client,
}

impl CloudFrontClient {
    /// Create a CloudFront client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.cloudfront_client(),
        }
    }

    /// Wrap an existing SDK client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

/// A distribution config together with the ETag it was read at
#[derive(Debug, Clone)]
pub struct DistributionConfigSnapshot {
    pub etag: String,
    pub config: DistributionConfig,
}

/// Trait for CloudFront operations that can be mocked in tests.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait CloudFrontApi: Send + Sync {
    /// Current deployment status (`InProgress` or `Deployed`)
    async fn get_distribution_status(&self, distribution_id: &str) -> Result<String>;

    async fn get_distribution_config(
        &self,
        distribution_id: &str,
    ) -> Result<DistributionConfigSnapshot>;

    async fn update_distribution(
        &self,
        distribution_id: &str,
        config: DistributionConfig,
        if_match: &str,
    ) -> Result<()>;

    async fn delete_distribution(&self, distribution_id: &str, if_match: &str) -> Result<()>;
}

impl CloudFrontApi for CloudFrontClient {
    async fn get_distribution_status(&self, distribution_id: &str) -> Result<String> {
        let output = self
            .client
            .get_distribution()
            .id(distribution_id)
            .send()
            .await?;
        let distribution = output.distribution().ok_or(AwsError::MissingField {
            operation: "GetDistribution",
            field: "Distribution",
        })?;
        Ok(distribution.status().to_string())
    }

    async fn get_distribution_config(
        &self,
        distribution_id: &str,
    ) -> Result<DistributionConfigSnapshot> {
        let output = self
            .client
            .get_distribution_config()
            .id(distribution_id)
            .send()
            .await?;
        let etag = output.e_tag.ok_or(AwsError::MissingField {
            operation: "GetDistributionConfig",
            field: "ETag",
        })?;
        let config = output.distribution_config.ok_or(AwsError::MissingField {
            operation: "GetDistributionConfig",
            field: "DistributionConfig",
        })?;
        Ok(DistributionConfigSnapshot { etag, config })
    }

    async fn update_distribution(
        &self,
        distribution_id: &str,
        config: DistributionConfig,
        if_match: &str,
    ) -> Result<()> {
        self.client
            .update_distribution()
            .id(distribution_id)
            .if_match(if_match)
            .distribution_config(config)
            .send()
            .await?;
        Ok(())
    }

    async fn delete_distribution(&self, distribution_id: &str, if_match: &str) -> Result<()> {
        self.client
            .delete_distribution()
            .id(distribution_id)
            .if_match(if_match)
            .send()
            .await?;
        Ok(())
    }
}
