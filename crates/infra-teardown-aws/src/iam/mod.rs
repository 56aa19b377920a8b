//! IAM resource graph
//!
//! Users, groups, roles, managed policies and instance profiles reference
//! each other, and IAM refuses to delete an entity that still has
//! attachments (`DeleteConflict`). Each wrapper's `delete` first dismantles
//! the references it owns, delegating to the wrapper of the entity on the
//! other side so that every call uses the same client.

mod group;
mod instance_profile;
mod policy;
mod role;
mod user;

pub use group::IamGroup;
pub use instance_profile::IamInstanceProfile;
pub use policy::{AttachedEntities, IamPolicy};
pub use role::IamRole;
pub use user::IamUser;
