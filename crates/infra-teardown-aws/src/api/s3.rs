//! S3 API surface used by the bucket wrapper

use crate::context::AwsContext;
use crate::error::{AwsError, Result};
use aws_sdk_s3::Client;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};

/// S3 client for emptying and deleting buckets
pub struct S3Client {
    client: Client,
}

impl S3Client {
    /// Create an S3 client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.s3_client(),
        }
    }

    /// Wrap an existing SDK client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

/// A single object version or delete marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectVersion {
    pub key: String,
    /// `None` for objects in buckets that never had versioning enabled
    pub version_id: Option<String>,
}

impl ObjectVersion {
    pub fn new(key: impl Into<String>, version_id: Option<String>) -> Self {
        Self {
            key: key.into(),
            version_id,
        }
    }
}

/// One page of `ListObjectVersions`, versions and delete markers combined
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectVersionPage {
    pub versions: Vec<ObjectVersion>,
    pub is_truncated: bool,
    pub next_key_marker: Option<String>,
    pub next_version_id_marker: Option<String>,
}

/// A key `DeleteObjects` reported as not deleted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteFailure {
    pub key: String,
    pub code: Option<String>,
    pub message: Option<String>,
}

/// Trait for S3 operations that can be mocked in tests.
///
/// Note: Markers use `Option<String>` instead of `Option<&str>` to work
/// around mockall lifetime limitations.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait S3Api: Send + Sync {
    async fn head_bucket(&self, bucket: &str) -> Result<()>;

    /// Fetch one page of object versions starting after the given markers
    async fn list_object_versions(
        &self,
        bucket: &str,
        key_marker: Option<String>,
        version_id_marker: Option<String>,
    ) -> Result<ObjectVersionPage>;

    /// Quietly delete up to 1000 object versions, returning per-key failures
    async fn delete_objects(
        &self,
        bucket: &str,
        objects: Vec<ObjectVersion>,
    ) -> Result<Vec<DeleteFailure>>;

    async fn delete_bucket(&self, bucket: &str) -> Result<()>;
}

fn build_error(e: impl std::fmt::Display) -> AwsError {
    AwsError::Sdk {
        code: None,
        message: format!("Failed to build DeleteObjects request: {e}"),
    }
}

impl S3Api for S3Client {
    async fn head_bucket(&self, bucket: &str) -> Result<()> {
        self.client.head_bucket().bucket(bucket).send().await?;
        Ok(())
    }

    async fn list_object_versions(
        &self,
        bucket: &str,
        key_marker: Option<String>,
        version_id_marker: Option<String>,
    ) -> Result<ObjectVersionPage> {
        let output = self
            .client
            .list_object_versions()
            .bucket(bucket)
            .set_key_marker(key_marker)
            .set_version_id_marker(version_id_marker)
            .send()
            .await?;

        let versions = output
            .versions()
            .iter()
            .filter_map(|v| {
                v.key()
                    .map(|key| ObjectVersion::new(key, v.version_id().map(str::to_string)))
            });
        let markers = output
            .delete_markers()
            .iter()
            .filter_map(|m| {
                m.key()
                    .map(|key| ObjectVersion::new(key, m.version_id().map(str::to_string)))
            });

        Ok(ObjectVersionPage {
            versions: versions.chain(markers).collect(),
            is_truncated: output.is_truncated().unwrap_or(false),
            next_key_marker: output.next_key_marker().map(str::to_string),
            next_version_id_marker: output.next_version_id_marker().map(str::to_string),
        })
    }

    async fn delete_objects(
        &self,
        bucket: &str,
        objects: Vec<ObjectVersion>,
    ) -> Result<Vec<DeleteFailure>> {
        let identifiers = objects
            .into_iter()
            .map(|o| {
                ObjectIdentifier::builder()
                    .key(o.key)
                    .set_version_id(o.version_id)
                    .build()
                    .map_err(build_error)
            })
            .collect::<Result<Vec<_>>>()?;

        let delete = Delete::builder()
            .set_objects(Some(identifiers))
            .quiet(true)
            .build()
            .map_err(build_error)?;

        let output = self
            .client
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await?;

        Ok(output
            .errors()
            .iter()
            .map(|e| DeleteFailure {
                key: e.key().unwrap_or_default().to_string(),
                code: e.code().map(str::to_string),
                message: e.message().map(str::to_string),
            })
            .collect())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        self.client.delete_bucket().bucket(bucket).send().await?;
        Ok(())
    }
}
