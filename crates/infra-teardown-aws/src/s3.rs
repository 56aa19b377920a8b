//! S3 bucket teardown
//!
//! A bucket can only be deleted once it holds no object versions and no
//! delete markers. `delete` pages through `ListObjectVersions` and removes
//! each page with quiet `DeleteObjects` calls before deleting the bucket.

use crate::api::{ObjectVersion, S3Api};
use crate::error::Result;
use crate::resource::{AwsResource, exists_from, finish_delete};
use infra_teardown_common::ResourceKind;
use infra_teardown_common::defaults::S3_MAX_KEYS_PER_DELETE;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Split object versions into `DeleteObjects`-sized batches.
///
/// Every batch is non-empty and holds at most [`S3_MAX_KEYS_PER_DELETE`]
/// entries; concatenating the batches yields the input.
pub fn delete_batches(versions: &[ObjectVersion]) -> impl Iterator<Item = &[ObjectVersion]> {
    versions.chunks(S3_MAX_KEYS_PER_DELETE)
}

/// An S3 bucket
pub struct S3Bucket<C> {
    client: Arc<C>,
    bucket_name: String,
}

impl<C> std::fmt::Debug for S3Bucket<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Bucket")
            .field("bucket_name", &self.bucket_name)
            .finish()
    }
}

impl<C: S3Api> S3Bucket<C> {
    pub fn new(client: Arc<C>, bucket_name: impl Into<String>) -> Self {
        Self {
            client,
            bucket_name: bucket_name.into(),
        }
    }

    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    /// Delete every object version and delete marker, returning how many
    /// were submitted for deletion.
    pub async fn purge_versions(&self) -> Result<usize> {
        let mut submitted = 0usize;
        let mut key_marker: Option<String> = None;
        let mut version_id_marker: Option<String> = None;

        loop {
            let page = self
                .client
                .list_object_versions(&self.bucket_name, key_marker.take(), version_id_marker.take())
                .await?;

            for batch in delete_batches(&page.versions) {
                let failures = self
                    .client
                    .delete_objects(&self.bucket_name, batch.to_vec())
                    .await?;
                for failure in &failures {
                    warn!(
                        bucket = %self.bucket_name,
                        key = %failure.key,
                        code = ?failure.code,
                        message = ?failure.message,
                        "Failed to delete object version"
                    );
                }
                submitted += batch.len();
                debug!(bucket = %self.bucket_name, batch = batch.len(), failed = failures.len(), "Deleted object batch");
            }

            if !page.is_truncated {
                break;
            }
            key_marker = page.next_key_marker;
            version_id_marker = page.next_version_id_marker;
            if key_marker.is_none() && version_id_marker.is_none() {
                warn!(bucket = %self.bucket_name, "Truncated listing without markers, stopping");
                break;
            }
        }

        Ok(submitted)
    }

    async fn teardown(&self) -> Result<()> {
        let deleted = self.purge_versions().await?;
        self.client.delete_bucket(&self.bucket_name).await?;
        info!(bucket = %self.bucket_name, versions_deleted = deleted, "Deleted S3 bucket");
        Ok(())
    }
}

impl<C: S3Api> AwsResource for S3Bucket<C> {
    fn kind(&self) -> ResourceKind {
        ResourceKind::S3Bucket
    }

    fn resource_id(&self) -> &str {
        &self.bucket_name
    }

    async fn exists(&self) -> Result<bool> {
        exists_from(self.client.head_bucket(&self.bucket_name).await)
    }

    async fn delete(&self) -> Result<()> {
        finish_delete(self.teardown().await, self.kind(), &self.bucket_name)
    }
}
