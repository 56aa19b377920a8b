//! Common interface implemented by every resource wrapper

use crate::error::Result;
use infra_teardown_common::ResourceKind;
use tracing::info;

/// An AWS resource that can be probed and torn down.
///
/// `delete` is idempotent: deleting a resource that is already gone logs at
/// `info` and returns `Ok(())`.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on the API traits are sufficient
pub trait AwsResource {
    fn kind(&self) -> ResourceKind;

    /// Name, ARN or ID identifying the resource within its service
    fn resource_id(&self) -> &str;

    /// `Ok(false)` when AWS reports the resource as not found; other errors propagate
    async fn exists(&self) -> Result<bool>;

    async fn delete(&self) -> Result<()>;
}

/// Map the outcome of a describe/get call onto an existence answer.
pub(crate) fn exists_from(result: Result<()>) -> Result<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

/// Treat a not-found error anywhere in a teardown sequence as "already gone".
pub(crate) fn finish_delete(result: Result<()>, kind: ResourceKind, id: &str) -> Result<()> {
    match result {
        Err(e) if e.is_not_found() => {
            info!(kind = %kind, id = %id, "Resource does not exist, nothing to delete");
            Ok(())
        }
        other => other,
    }
}
