//! CloudFront distribution teardown
//!
//! CloudFront only deletes disabled distributions, and disabling is itself
//! an asynchronous deployment. Every config change is guarded by the ETag
//! returned with the config (`IfMatch`), and the ETag changes once the
//! deployment completes, so it is re-read before the final delete.

use crate::api::CloudFrontApi;
use crate::error::Result;
use crate::resource::{AwsResource, exists_from, finish_delete};
use crate::wait::{WaitConfig, wait_for_resource};
use infra_teardown_common::ResourceKind;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Distribution status once all edge locations have the current config
pub const STATUS_DEPLOYED: &str = "Deployed";

/// A CloudFront distribution
pub struct CloudFrontDistribution<C> {
    client: Arc<C>,
    distribution_id: String,
    wait: WaitConfig,
    cancel: Option<CancellationToken>,
}

impl<C> std::fmt::Debug for CloudFrontDistribution<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudFrontDistribution")
            .field("distribution_id", &self.distribution_id)
            .field("wait", &self.wait)
            .finish()
    }
}

impl<C: CloudFrontApi> CloudFrontDistribution<C> {
    pub fn new(client: Arc<C>, distribution_id: impl Into<String>) -> Self {
        Self {
            client,
            distribution_id: distribution_id.into(),
            wait: WaitConfig::cloudfront_deploy(),
            cancel: None,
        }
    }

    /// Override how long and how often to poll for `Deployed`
    pub fn with_wait_config(mut self, wait: WaitConfig) -> Self {
        self.wait = wait;
        self
    }

    /// Abort the deployment wait when `cancel` fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn distribution_id(&self) -> &str {
        &self.distribution_id
    }

    /// Current deployment status
    pub async fn status(&self) -> Result<String> {
        self.client
            .get_distribution_status(&self.distribution_id)
            .await
    }

    pub async fn enable(&self) -> Result<()> {
        self.set_enabled(true).await
    }

    pub async fn disable(&self) -> Result<()> {
        self.set_enabled(false).await
    }

    /// Flip the `Enabled` flag, skipping the update when it already matches.
    pub async fn set_enabled(&self, enabled: bool) -> Result<()> {
        let snapshot = self
            .client
            .get_distribution_config(&self.distribution_id)
            .await?;

        if snapshot.config.enabled == enabled {
            info!(distribution_id = %self.distribution_id, enabled, "Distribution already in requested state");
            return Ok(());
        }

        let mut config = snapshot.config;
        config.enabled = enabled;
        self.client
            .update_distribution(&self.distribution_id, config, &snapshot.etag)
            .await?;
        info!(distribution_id = %self.distribution_id, enabled, "Updated distribution");
        Ok(())
    }

    /// Poll until the distribution reports `Deployed`.
    pub async fn wait_until_deployed(&self) -> Result<()> {
        let resource = format!("CloudFront distribution {}", self.distribution_id);
        wait_for_resource(
            &self.wait,
            self.cancel.as_ref(),
            || async {
                let status = self.status().await?;
                debug!(distribution_id = %self.distribution_id, status = %status, "Polled distribution status");
                Ok(status == STATUS_DEPLOYED)
            },
            &resource,
        )
        .await
    }

    async fn teardown(&self) -> Result<()> {
        self.disable().await?;
        self.wait_until_deployed().await?;

        let fresh = self
            .client
            .get_distribution_config(&self.distribution_id)
            .await?;
        self.client
            .delete_distribution(&self.distribution_id, &fresh.etag)
            .await?;
        info!(distribution_id = %self.distribution_id, "Deleted CloudFront distribution");
        Ok(())
    }
}

impl<C: CloudFrontApi> AwsResource for CloudFrontDistribution<C> {
    fn kind(&self) -> ResourceKind {
        ResourceKind::CloudFrontDistribution
    }

    fn resource_id(&self) -> &str {
        &self.distribution_id
    }

    async fn exists(&self) -> Result<bool> {
        exists_from(self.status().await.map(|_| ()))
    }

    /// Disable, wait for the change to deploy, then delete with a fresh ETag.
    async fn delete(&self) -> Result<()> {
        finish_delete(self.teardown().await, self.kind(), &self.distribution_id)
    }
}
