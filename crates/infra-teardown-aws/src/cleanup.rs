//! Declarative teardown
//!
//! Deletes a declared set of resources in dependency order (see
//! [`ResourceKind::cleanup_priority`]), continuing past individual failures
//! and reporting what happened to each kind.

use crate::api::{
    CloudFrontApi, CloudFrontClient, EventBridgeApi, EventBridgeClient, IamApi, IamClient, S3Api,
    S3Client,
};
use crate::cloudfront::CloudFrontDistribution;
use crate::config::{ResourceSpec, TeardownConfig};
use crate::context::AwsContext;
use crate::eventbridge::EventBridgeRule;
use crate::iam::{IamGroup, IamInstanceProfile, IamPolicy, IamRole, IamUser};
use crate::resource::AwsResource;
use crate::s3::S3Bucket;
use crate::wait::WaitConfig;
use infra_teardown_common::ResourceKind;
use infra_teardown_common::defaults::DEFAULT_EVENT_BUS;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Outcome of deleting a single resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupResult {
    /// Resource was successfully deleted
    Deleted,
    /// Resource was already deleted (not found)
    AlreadyDeleted,
    /// Cleanup failed with error
    Failed,
    /// Resource was skipped (dry run, or an AWS-managed policy)
    Skipped,
}

/// Report of a teardown run
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeardownReport {
    pub total_found: usize,
    pub by_kind: BTreeMap<ResourceKind, usize>,
    pub deleted: usize,
    pub already_deleted: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl TeardownReport {
    fn record(&mut self, result: CleanupResult) {
        match result {
            CleanupResult::Deleted => self.deleted += 1,
            CleanupResult::AlreadyDeleted => self.already_deleted += 1,
            CleanupResult::Failed => self.failed += 1,
            CleanupResult::Skipped => self.skipped += 1,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Teardown executor over the four wrapped services
pub struct Teardown<I, S, F, E> {
    iam: Arc<I>,
    s3: Arc<S>,
    cloudfront: Arc<F>,
    events: Arc<E>,
    wait: WaitConfig,
    cancel: Option<CancellationToken>,
}

impl Teardown<IamClient, S3Client, CloudFrontClient, EventBridgeClient> {
    /// Build an executor whose clients all come from one AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self::new(
            Arc::new(IamClient::from_context(ctx)),
            Arc::new(S3Client::from_context(ctx)),
            Arc::new(CloudFrontClient::from_context(ctx)),
            Arc::new(EventBridgeClient::from_context(ctx)),
        )
    }
}

impl<I, S, F, E> Teardown<I, S, F, E>
where
    I: IamApi,
    S: S3Api,
    F: CloudFrontApi,
    E: EventBridgeApi,
{
    pub fn new(iam: Arc<I>, s3: Arc<S>, cloudfront: Arc<F>, events: Arc<E>) -> Self {
        Self {
            iam,
            s3,
            cloudfront,
            events,
            wait: WaitConfig::cloudfront_deploy(),
            cancel: None,
        }
    }

    /// Deployment polling used by [`Teardown::delete_resource`]
    pub fn with_wait_config(mut self, wait: WaitConfig) -> Self {
        self.wait = wait;
        self
    }

    /// Abort CloudFront deployment waits when `cancel` fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Delete every configured resource in cleanup priority order.
    ///
    /// Failures are logged and counted; the run always continues with the
    /// next resource.
    pub async fn run(&self, config: &TeardownConfig) -> TeardownReport {
        let mut report = TeardownReport {
            total_found: config.resources.len(),
            ..Default::default()
        };

        info!(
            count = config.resources.len(),
            dry_run = config.dry_run,
            region = ?config.region,
            "Starting teardown"
        );

        let mut ordered: Vec<&ResourceSpec> = config.resources.iter().collect();
        ordered.sort_by_key(|spec| spec.kind.cleanup_priority());

        let wait = config.distribution_wait.to_wait_config();
        for spec in ordered {
            *report.by_kind.entry(spec.kind).or_default() += 1;

            let result = if config.dry_run {
                info!(kind = %spec.kind, id = %spec.id, "[DRY RUN] Would delete");
                CleanupResult::Skipped
            } else {
                self.delete_with(spec, &wait).await
            };
            report.record(result);
        }

        info!(
            deleted = report.deleted,
            already_deleted = report.already_deleted,
            failed = report.failed,
            skipped = report.skipped,
            "Teardown complete"
        );
        report
    }

    /// Delete a single resource and handle "not found" gracefully.
    pub async fn delete_resource(&self, spec: &ResourceSpec) -> CleanupResult {
        self.delete_with(spec, &self.wait).await
    }

    async fn delete_with(&self, spec: &ResourceSpec, wait: &WaitConfig) -> CleanupResult {
        let id = spec.id.clone();
        match spec.kind {
            ResourceKind::CloudFrontDistribution => {
                let mut distribution =
                    CloudFrontDistribution::new(Arc::clone(&self.cloudfront), id)
                        .with_wait_config(wait.clone());
                if let Some(cancel) = &self.cancel {
                    distribution = distribution.with_cancellation(cancel.clone());
                }
                probe_and_delete(&distribution).await
            }
            ResourceKind::EventBridgeRule => {
                let bus = spec.event_bus_name.as_deref().unwrap_or(DEFAULT_EVENT_BUS);
                probe_and_delete(&EventBridgeRule::on_bus(Arc::clone(&self.events), id, bus)).await
            }
            ResourceKind::IamInstanceProfile => {
                probe_and_delete(&IamInstanceProfile::new(Arc::clone(&self.iam), id)).await
            }
            ResourceKind::IamUser => probe_and_delete(&IamUser::new(Arc::clone(&self.iam), id)).await,
            ResourceKind::IamGroup => {
                probe_and_delete(&IamGroup::new(Arc::clone(&self.iam), id)).await
            }
            ResourceKind::IamRole => probe_and_delete(&IamRole::new(Arc::clone(&self.iam), id)).await,
            ResourceKind::IamPolicy => {
                let policy = IamPolicy::new(Arc::clone(&self.iam), id);
                if policy.is_aws_managed() {
                    info!(
                        kind = %spec.kind,
                        id = %spec.id,
                        "AWS-managed policy cannot be deleted, skipping"
                    );
                    return CleanupResult::Skipped;
                }
                probe_and_delete(&policy).await
            }
            ResourceKind::S3Bucket => probe_and_delete(&S3Bucket::new(Arc::clone(&self.s3), id)).await,
        }
    }
}

async fn probe_and_delete<R: AwsResource>(resource: &R) -> CleanupResult {
    let kind = resource.kind();
    let id = resource.resource_id();

    match resource.exists().await {
        Ok(false) => {
            info!(kind = %kind, id = %id, "Already deleted");
            return CleanupResult::AlreadyDeleted;
        }
        Ok(true) => {}
        Err(e) => {
            warn!(kind = %kind, id = %id, error = %e, suggestion = ?e.suggestion(), "Existence check failed");
            return CleanupResult::Failed;
        }
    }

    match resource.delete().await {
        Ok(()) => {
            info!(kind = %kind, id = %id, "Deleted");
            CleanupResult::Deleted
        }
        Err(e) => {
            warn!(kind = %kind, id = %id, error = %e, suggestion = ?e.suggestion(), "Cleanup failed");
            CleanupResult::Failed
        }
    }
}
