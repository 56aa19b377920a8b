//! AWS error classification and handling
//!
//! Every SDK call made by the service adapters is converted into [`AwsError`]
//! through the error code exposed by `ProvideErrorMetadata`, never by string
//! matching on a Debug representation. Resource wrappers then branch on the
//! variant, most often [`AwsError::is_not_found`] to keep deletes idempotent.

use aws_sdk_iam::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use std::time::Duration;
use thiserror::Error;

/// Result type used throughout the resource wrappers
pub type Result<T, E = AwsError> = std::result::Result<T, E>;

/// AWS error categories for teardown logic
#[derive(Debug, Error)]
pub enum AwsError {
    /// Resource was not found (safe to skip in cleanup)
    #[error("Resource not found ({code}): {message}")]
    NotFound { code: String, message: String },

    /// Rate limit exceeded (retryable with backoff)
    #[error("Rate limit exceeded")]
    Throttled,

    /// Resource still has dependents (attached policies, objects, enabled distribution)
    #[error("Resource has dependent objects ({code}): {message}")]
    DependencyViolation { code: String, message: String },

    /// The supplied ETag no longer matches (someone else modified the resource)
    #[error("Precondition failed ({code}): {message}")]
    PreconditionFailed { code: String, message: String },

    /// Polling for a resource state gave up
    #[error("Timed out waiting for {resource} after {waited:?}")]
    Timeout { resource: String, waited: Duration },

    /// Polling for a resource state was cancelled by the caller
    #[error("Wait for {resource} cancelled")]
    Cancelled { resource: String },

    /// A response was missing a field the teardown protocol depends on
    #[error("{operation} response is missing {field}")]
    MissingField {
        operation: &'static str,
        field: &'static str,
    },

    /// Generic AWS SDK error with code and message
    #[error("AWS error: {message}")]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl AwsError {
    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::NotFound { .. })
    }

    /// Check if this is a retryable error
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AwsError::Throttled
                | AwsError::DependencyViolation { .. }
                | AwsError::PreconditionFailed { .. }
        )
    }

    /// The AWS error code, when the service returned one
    pub fn code(&self) -> Option<&str> {
        match self {
            AwsError::NotFound { code, .. }
            | AwsError::DependencyViolation { code, .. }
            | AwsError::PreconditionFailed { code, .. } => Some(code),
            AwsError::Sdk { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Get a user-friendly suggestion for resolving this error, if available.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            AwsError::Throttled => suggestion_for_code("Throttling"),
            AwsError::Timeout { .. } => Some(
                "The resource is still transitioning. Re-run the teardown later; deletes are idempotent."
                    .to_string(),
            ),
            _ => self.code().and_then(suggestion_for_code),
        }
    }
}

/// Known AWS error codes for "not found" conditions, across all wrapped services
const NOT_FOUND_CODES: &[&str] = &[
    // IAM
    "NoSuchEntity",
    // S3 (HeadBucket has no body, so the SDK reports the bare status)
    "NoSuchBucket",
    "NotFound",
    "404",
    // CloudFront
    "NoSuchDistribution",
    // EventBridge
    "ResourceNotFoundException",
];

/// Known AWS error codes for throttling/rate limiting
const THROTTLING_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "RequestLimitExceeded",
    "TooManyRequestsException",
    "SlowDown",
];

/// Known AWS error codes for "still referenced" conditions
const DEPENDENCY_CODES: &[&str] = &[
    "DependencyViolation",
    "DeleteConflict",
    "BucketNotEmpty",
    "DistributionNotDisabled",
    "ResourceInUseException",
];

/// Known AWS error codes for optimistic-concurrency failures
const PRECONDITION_CODES: &[&str] = &["PreconditionFailed", "InvalidIfMatchVersion"];

/// Classify an AWS SDK error using the error code.
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> AwsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => AwsError::NotFound {
            code: c.to_string(),
            message,
        },
        Some(c) if THROTTLING_CODES.contains(&c) => AwsError::Throttled,
        Some(c) if DEPENDENCY_CODES.contains(&c) => AwsError::DependencyViolation {
            code: c.to_string(),
            message,
        },
        Some(c) if PRECONDITION_CODES.contains(&c) => AwsError::PreconditionFailed {
            code: c.to_string(),
            message,
        },
        _ => AwsError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

impl<E, R> From<SdkError<E, R>> for AwsError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    fn from(err: SdkError<E, R>) -> Self {
        match err.message() {
            Some(message) => classify_aws_error(err.code(), Some(message)),
            // Dispatch failures and timeouts carry no service metadata
            None => {
                let context = DisplayErrorContext(&err).to_string();
                classify_aws_error(err.code(), Some(&context))
            }
        }
    }
}

/// Error code to user-friendly suggestion mapping
const SUGGESTIONS: &[(&str, &str)] = &[
    (
        "AccessDenied",
        "The caller lacks permission for this teardown step. Check the IAM policy of the credentials in use.",
    ),
    (
        "DeleteConflict",
        "The IAM entity still has attachments. Delete it through its wrapper so dependents are removed first.",
    ),
    (
        "BucketNotEmpty",
        "Some object versions could not be removed. Check for Object Lock or legal holds.",
    ),
    (
        "DistributionNotDisabled",
        "Disable the distribution and wait for it to reach Deployed before deleting.",
    ),
    (
        "PreconditionFailed",
        "The resource changed concurrently. Retry; the ETag is re-fetched on each attempt.",
    ),
    (
        "InvalidIfMatchVersion",
        "The resource changed concurrently. Retry; the ETag is re-fetched on each attempt.",
    ),
    (
        "Throttling",
        "AWS API rate limit hit. Retry the teardown; completed steps are skipped.",
    ),
    (
        "ThrottlingException",
        "AWS API rate limit hit. Retry the teardown; completed steps are skipped.",
    ),
    (
        "TooManyRequestsException",
        "AWS API rate limit hit. Retry the teardown; completed steps are skipped.",
    ),
];

/// Get a user-friendly suggestion for a known error code.
fn suggestion_for_code(code: &str) -> Option<String> {
    SUGGESTIONS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, s)| (*s).to_string())
}
