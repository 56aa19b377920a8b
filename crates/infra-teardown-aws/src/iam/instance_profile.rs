use super::IamRole;
use crate::api::IamApi;
use crate::error::Result;
use crate::resource::{AwsResource, exists_from, finish_delete};
use infra_teardown_common::ResourceKind;
use std::sync::Arc;
use tracing::{debug, info};

/// An IAM instance profile. A profile holds at most one role.
pub struct IamInstanceProfile<C> {
    client: Arc<C>,
    profile_name: String,
}

impl<C> Clone for IamInstanceProfile<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            profile_name: self.profile_name.clone(),
        }
    }
}

impl<C> std::fmt::Debug for IamInstanceProfile<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IamInstanceProfile")
            .field("profile_name", &self.profile_name)
            .finish()
    }
}

impl<C: IamApi> IamInstanceProfile<C> {
    pub fn new(client: Arc<C>, profile_name: impl Into<String>) -> Self {
        Self {
            client,
            profile_name: profile_name.into(),
        }
    }

    pub fn profile_name(&self) -> &str {
        &self.profile_name
    }

    /// The role held by the profile, if any
    pub async fn role(&self) -> Result<Option<IamRole<C>>> {
        let roles = self.client.get_instance_profile(&self.profile_name).await?;
        Ok(roles
            .into_iter()
            .next()
            .map(|name| IamRole::new(Arc::clone(&self.client), name)))
    }

    /// Detach the role from the profile. A role that disappears between the
    /// lookup and the removal is not an error.
    pub async fn remove_role(&self) -> Result<()> {
        let Some(role) = self.role().await? else {
            return Ok(());
        };

        match self
            .client
            .remove_role_from_instance_profile(&self.profile_name, role.role_name())
            .await
        {
            Ok(()) => {
                debug!(profile_name = %self.profile_name, role_name = %role.role_name(), "Removed role from instance profile");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                debug!(profile_name = %self.profile_name, role_name = %role.role_name(), error = %e, "Role already removed from instance profile");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn teardown(&self) -> Result<()> {
        self.remove_role().await?;
        self.client
            .delete_instance_profile(&self.profile_name)
            .await?;
        info!(profile_name = %self.profile_name, "Deleted instance profile");
        Ok(())
    }
}

impl<C: IamApi> AwsResource for IamInstanceProfile<C> {
    fn kind(&self) -> ResourceKind {
        ResourceKind::IamInstanceProfile
    }

    fn resource_id(&self) -> &str {
        &self.profile_name
    }

    async fn exists(&self) -> Result<bool> {
        exists_from(
            self.client
                .get_instance_profile(&self.profile_name)
                .await
                .map(|_| ()),
        )
    }

    async fn delete(&self) -> Result<()> {
        finish_delete(self.teardown().await, self.kind(), &self.profile_name)
    }
}
