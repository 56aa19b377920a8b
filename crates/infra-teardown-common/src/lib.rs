//! infra-teardown-common - Shared types and constants
//!
//! This crate holds the pieces of infra-teardown that do not need the AWS
//! SDK, so configuration tooling can depend on it without pulling in clients.
//!
//! ## Modules
//!
//! - [`defaults`]: Timing and batch-size defaults for teardown operations
//! - [`resource_kind`]: Supported resource types and their cleanup ordering

pub mod defaults;
pub mod resource_kind;

pub use resource_kind::ResourceKind;
