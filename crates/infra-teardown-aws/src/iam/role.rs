use super::{IamInstanceProfile, IamPolicy};
use crate::api::IamApi;
use crate::error::Result;
use crate::resource::{AwsResource, exists_from, finish_delete};
use infra_teardown_common::ResourceKind;
use std::sync::Arc;
use tracing::{debug, info};

/// An IAM role
pub struct IamRole<C> {
    client: Arc<C>,
    role_name: String,
}

impl<C> Clone for IamRole<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            role_name: self.role_name.clone(),
        }
    }
}

impl<C> std::fmt::Debug for IamRole<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IamRole")
            .field("role_name", &self.role_name)
            .finish()
    }
}

impl<C: IamApi> IamRole<C> {
    pub fn new(client: Arc<C>, role_name: impl Into<String>) -> Self {
        Self {
            client,
            role_name: role_name.into(),
        }
    }

    pub fn role_name(&self) -> &str {
        &self.role_name
    }

    /// Managed policies attached to the role
    pub async fn managed_policies(&self) -> Result<Vec<IamPolicy<C>>> {
        let arns = self
            .client
            .list_attached_role_policies(&self.role_name)
            .await?;
        Ok(arns
            .into_iter()
            .map(|arn| IamPolicy::new(Arc::clone(&self.client), arn))
            .collect())
    }

    pub async fn detach_policy(&self, policy: &IamPolicy<C>) -> Result<()> {
        self.client
            .detach_role_policy(&self.role_name, policy.policy_arn())
            .await?;
        debug!(role_name = %self.role_name, policy_arn = %policy.policy_arn(), "Detached policy from role");
        Ok(())
    }

    /// Instance profiles holding this role
    pub async fn instance_profiles(&self) -> Result<Vec<IamInstanceProfile<C>>> {
        let names = self
            .client
            .list_instance_profiles_for_role(&self.role_name)
            .await?;
        Ok(names
            .into_iter()
            .map(|name| IamInstanceProfile::new(Arc::clone(&self.client), name))
            .collect())
    }

    async fn teardown(&self) -> Result<()> {
        let policies = self.managed_policies().await?;
        info!(role_name = %self.role_name, count = policies.len(), "Detaching managed policies from role");
        for policy in policies {
            self.detach_policy(&policy).await?;
        }

        let inline = self.client.list_role_policies(&self.role_name).await?;
        info!(role_name = %self.role_name, count = inline.len(), "Deleting inline role policies");
        for policy_name in inline {
            self.client
                .delete_role_policy(&self.role_name, &policy_name)
                .await?;
            debug!(role_name = %self.role_name, policy_name = %policy_name, "Deleted inline role policy");
        }

        let profiles = self.instance_profiles().await?;
        info!(role_name = %self.role_name, count = profiles.len(), "Removing role from instance profiles");
        for profile in profiles {
            profile.remove_role().await?;
        }

        self.client.delete_role(&self.role_name).await?;
        info!(role_name = %self.role_name, "Deleted IAM role");
        Ok(())
    }
}

impl<C: IamApi> AwsResource for IamRole<C> {
    fn kind(&self) -> ResourceKind {
        ResourceKind::IamRole
    }

    fn resource_id(&self) -> &str {
        &self.role_name
    }

    async fn exists(&self) -> Result<bool> {
        exists_from(self.client.get_role(&self.role_name).await)
    }

    /// Detach managed policies, delete inline policies, pull the role out of
    /// its instance profiles, then delete the role.
    async fn delete(&self) -> Result<()> {
        finish_delete(self.teardown().await, self.kind(), &self.role_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockIamApi;
    use crate::error::AwsError;
    use crate::test_support::{aws_error, no_such_entity};
    use mockall::Sequence;

    const POLICY: &str = "arn:aws:iam::aws:policy/AmazonSSMManagedInstanceCore";

    #[tokio::test]
    async fn exists_reflects_get_role() {
        let mut mock = MockIamApi::new();
        mock.expect_get_role().returning(|_| Ok(()));

        assert!(IamRole::new(Arc::new(mock), "agent").exists().await.unwrap());
    }

    #[tokio::test]
    async fn delete_removes_dependents_in_order() {
        let mut mock = MockIamApi::new();
        let mut seq = Sequence::new();

        mock.expect_list_attached_role_policies()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![POLICY.to_string()]));
        mock.expect_detach_role_policy()
            .withf(|role, arn| role == "agent" && arn == POLICY)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        mock.expect_list_role_policies()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec!["agent-policy".to_string()]));
        mock.expect_delete_role_policy()
            .withf(|role, name| role == "agent" && name == "agent-policy")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        mock.expect_list_instance_profiles_for_role()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec!["agent-profile".to_string()]));
        mock.expect_get_instance_profile()
            .withf(|profile| profile == "agent-profile")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec!["agent".to_string()]));
        mock.expect_remove_role_from_instance_profile()
            .withf(|profile, role| profile == "agent-profile" && role == "agent")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        mock.expect_delete_role()
            .withf(|role| role == "agent")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        IamRole::new(Arc::new(mock), "agent").delete().await.unwrap();
    }

    #[tokio::test]
    async fn delete_of_missing_role_is_noop() {
        let mut mock = MockIamApi::new();
        mock.expect_list_attached_role_policies()
            .returning(|_| Err(no_such_entity()));
        mock.expect_delete_role().never();

        IamRole::new(Arc::new(mock), "agent").delete().await.unwrap();
    }

    #[tokio::test]
    async fn conflict_on_final_delete_propagates() {
        let mut mock = MockIamApi::new();
        mock.expect_list_attached_role_policies()
            .returning(|_| Ok(vec![]));
        mock.expect_list_role_policies().returning(|_| Ok(vec![]));
        mock.expect_list_instance_profiles_for_role()
            .returning(|_| Ok(vec![]));
        mock.expect_delete_role()
            .returning(|_| Err(aws_error("DeleteConflict")));

        let err = IamRole::new(Arc::new(mock), "agent")
            .delete()
            .await
            .unwrap_err();
        assert!(matches!(err, AwsError::DependencyViolation { .. }));
    }

    #[tokio::test]
    async fn delete_logs_dependent_counts() {
        let mut mock = MockIamApi::new();
        mock.expect_list_attached_role_policies()
            .returning(|_| Ok(vec![]));
        mock.expect_list_role_policies()
            .returning(|_| Ok(vec!["inline".to_string()]));
        mock.expect_delete_role_policy().returning(|_, _| Ok(()));
        mock.expect_list_instance_profiles_for_role()
            .returning(|_| Ok(vec!["agent-profile".to_string()]));
        mock.expect_get_instance_profile()
            .returning(|_| Ok(vec!["agent".to_string()]));
        mock.expect_remove_role_from_instance_profile()
            .returning(|_, _| Ok(()));
        mock.expect_delete_role().returning(|_| Ok(()));

        let (_guard, logs) = crate::test_support::capture_logs();
        IamRole::new(Arc::new(mock), "agent").delete().await.unwrap();

        let line = |message: &str| logs.line(message).unwrap_or_default();
        assert!(line("Detaching managed policies from role").contains("count=0"));
        assert!(line("Deleting inline role policies").contains("count=1"));
        assert!(line("Removing role from instance profiles").contains("count=1"));
    }
}
