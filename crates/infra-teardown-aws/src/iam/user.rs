use super::{IamGroup, IamPolicy};
use crate::api::IamApi;
use crate::error::Result;
use crate::resource::{AwsResource, exists_from, finish_delete};
use infra_teardown_common::ResourceKind;
use std::sync::Arc;
use tracing::{debug, info};

/// An IAM user
pub struct IamUser<C> {
    client: Arc<C>,
    user_name: String,
}

impl<C> Clone for IamUser<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            user_name: self.user_name.clone(),
        }
    }
}

impl<C> std::fmt::Debug for IamUser<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IamUser")
            .field("user_name", &self.user_name)
            .finish()
    }
}

impl<C: IamApi> IamUser<C> {
    pub fn new(client: Arc<C>, user_name: impl Into<String>) -> Self {
        Self {
            client,
            user_name: user_name.into(),
        }
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// Groups the user belongs to
    pub async fn groups(&self) -> Result<Vec<IamGroup<C>>> {
        let names = self.client.list_groups_for_user(&self.user_name).await?;
        Ok(names
            .into_iter()
            .map(|name| IamGroup::new(Arc::clone(&self.client), name))
            .collect())
    }

    /// Managed policies attached to the user
    pub async fn managed_policies(&self) -> Result<Vec<IamPolicy<C>>> {
        let arns = self
            .client
            .list_attached_user_policies(&self.user_name)
            .await?;
        Ok(arns
            .into_iter()
            .map(|arn| IamPolicy::new(Arc::clone(&self.client), arn))
            .collect())
    }

    pub async fn detach_policy(&self, policy: &IamPolicy<C>) -> Result<()> {
        self.client
            .detach_user_policy(&self.user_name, policy.policy_arn())
            .await?;
        debug!(user_name = %self.user_name, policy_arn = %policy.policy_arn(), "Detached policy from user");
        Ok(())
    }

    async fn teardown(&self) -> Result<()> {
        let policies = self.managed_policies().await?;
        info!(user_name = %self.user_name, count = policies.len(), "Detaching managed policies from user");
        for policy in policies {
            self.detach_policy(&policy).await?;
        }

        let inline = self.client.list_user_policies(&self.user_name).await?;
        info!(user_name = %self.user_name, count = inline.len(), "Deleting inline user policies");
        for policy_name in inline {
            self.client
                .delete_user_policy(&self.user_name, &policy_name)
                .await?;
            debug!(user_name = %self.user_name, policy_name = %policy_name, "Deleted inline user policy");
        }

        let groups = self.groups().await?;
        info!(user_name = %self.user_name, count = groups.len(), "Removing user from groups");
        for group in groups {
            group.remove_user(self).await?;
        }

        let keys = self.client.list_access_keys(&self.user_name).await?;
        info!(user_name = %self.user_name, count = keys.len(), "Deleting access keys");
        for key_id in keys {
            self.client
                .delete_access_key(&self.user_name, &key_id)
                .await?;
            debug!(user_name = %self.user_name, access_key_id = %key_id, "Deleted access key");
        }

        self.client.delete_user(&self.user_name).await?;
        info!(user_name = %self.user_name, "Deleted IAM user");
        Ok(())
    }
}

impl<C: IamApi> AwsResource for IamUser<C> {
    fn kind(&self) -> ResourceKind {
        ResourceKind::IamUser
    }

    fn resource_id(&self) -> &str {
        &self.user_name
    }

    async fn exists(&self) -> Result<bool> {
        exists_from(self.client.get_user(&self.user_name).await)
    }

    /// Detach managed policies, delete inline policies, leave every group,
    /// delete access keys, then delete the user.
    async fn delete(&self) -> Result<()> {
        finish_delete(self.teardown().await, self.kind(), &self.user_name)
    }
}
