//! Resource waiting with exponential backoff and cancellation support.
//!
//! Teardown protocols sometimes have to wait for AWS to finish an
//! asynchronous transition (a CloudFront distribution redeploying after it
//! was disabled). This module polls a check until it reports ready, backing
//! off between attempts.

use crate::error::{AwsError, Result};
use backon::{BackoffBuilder, ExponentialBuilder};
use infra_teardown_common::defaults::{
    DISTRIBUTION_DEPLOY_TIMEOUT_SECS, DISTRIBUTION_POLL_INTERVAL_SECS,
};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Configuration for resource waiting with exponential backoff.
#[derive(Debug, Clone, PartialEq)]
pub struct WaitConfig {
    /// Initial delay between checks
    pub initial_delay: Duration,
    /// Maximum delay between checks (cap for exponential growth)
    pub max_delay: Duration,
    /// Maximum total time to wait before timeout
    pub timeout: Duration,
    /// Whether to add random jitter to each delay
    pub jitter: bool,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            timeout: Duration::from_secs(60),
            jitter: true,
        }
    }
}

impl WaitConfig {
    /// Fixed-interval polling, as used for CloudFront deployments.
    pub fn fixed(interval: Duration, timeout: Duration) -> Self {
        Self {
            initial_delay: interval,
            max_delay: interval,
            timeout,
            jitter: false,
        }
    }

    /// Poll every 30 seconds for up to 30 minutes.
    pub fn cloudfront_deploy() -> Self {
        Self::fixed(
            Duration::from_secs(DISTRIBUTION_POLL_INTERVAL_SECS),
            Duration::from_secs(DISTRIBUTION_DEPLOY_TIMEOUT_SECS),
        )
    }
}

/// Wait for a resource to become ready with exponential backoff.
///
/// `check` returns `Ok(true)` when ready and `Ok(false)` to retry. An error
/// from `check` aborts the wait and is returned unchanged.
///
/// # Errors
/// * [`AwsError::Timeout`] once `config.timeout` has elapsed; the last sleep is
///   cut short so the wait never runs past it
/// * [`AwsError::Cancelled`] when `cancel` fires
pub async fn wait_for_resource<F, Fut>(
    config: &WaitConfig,
    cancel: Option<&CancellationToken>,
    check: F,
    resource_name: &str,
) -> Result<()>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let start = Instant::now();
    let mut attempts = 0u32;

    let mut builder = ExponentialBuilder::default()
        .with_min_delay(config.initial_delay)
        .with_max_delay(config.max_delay)
        .with_factor(2.0)
        .without_max_times();
    if config.jitter {
        builder = builder.with_jitter();
    }
    let mut delays = builder.build();

    let cancelled = || AwsError::Cancelled {
        resource: resource_name.to_string(),
    };

    loop {
        attempts += 1;

        if cancel.is_some_and(|token| token.is_cancelled()) {
            return Err(cancelled());
        }

        if start.elapsed() >= config.timeout {
            return Err(AwsError::Timeout {
                resource: resource_name.to_string(),
                waited: start.elapsed(),
            });
        }

        match check().await {
            Ok(true) => {
                debug!(resource = %resource_name, attempts, "Resource ready");
                return Ok(());
            }
            Ok(false) => {
                // Never sleep past the deadline
                let remaining = config.timeout.saturating_sub(start.elapsed());
                let delay = delays.next().unwrap_or(config.max_delay).min(remaining);
                debug!(
                    resource = %resource_name,
                    attempt = attempts,
                    delay_ms = delay.as_millis(),
                    "Resource not ready, retrying"
                );

                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = async {
                        match cancel {
                            Some(token) => token.cancelled().await,
                            None => std::future::pending::<()>().await,
                        }
                    } => {
                        return Err(cancelled());
                    }
                }
            }
            Err(e) => {
                warn!(resource = %resource_name, error = %e, "Resource check failed");
                return Err(e);
            }
        }
    }
}
