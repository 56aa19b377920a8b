use super::{IamPolicy, IamUser};
use crate::api::IamApi;
use crate::error::Result;
use crate::resource::{AwsResource, exists_from, finish_delete};
use infra_teardown_common::ResourceKind;
use std::sync::Arc;
use tracing::{debug, info};

/// An IAM group
pub struct IamGroup<C> {
    client: Arc<C>,
    group_name: String,
}

impl<C> Clone for IamGroup<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            group_name: self.group_name.clone(),
        }
    }
}

impl<C> std::fmt::Debug for IamGroup<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IamGroup")
            .field("group_name", &self.group_name)
            .finish()
    }
}

impl<C: IamApi> IamGroup<C> {
    pub fn new(client: Arc<C>, group_name: impl Into<String>) -> Self {
        Self {
            client,
            group_name: group_name.into(),
        }
    }

    pub fn group_name(&self) -> &str {
        &self.group_name
    }

    /// Members of the group
    pub async fn users(&self) -> Result<Vec<IamUser<C>>> {
        let names = self.client.list_group_users(&self.group_name).await?;
        Ok(names
            .into_iter()
            .map(|name| IamUser::new(Arc::clone(&self.client), name))
            .collect())
    }

    pub async fn remove_user(&self, user: &IamUser<C>) -> Result<()> {
        self.client
            .remove_user_from_group(&self.group_name, user.user_name())
            .await?;
        debug!(group_name = %self.group_name, user_name = %user.user_name(), "Removed user from group");
        Ok(())
    }

    /// Managed policies attached to the group
    pub async fn managed_policies(&self) -> Result<Vec<IamPolicy<C>>> {
        let arns = self
            .client
            .list_attached_group_policies(&self.group_name)
            .await?;
        Ok(arns
            .into_iter()
            .map(|arn| IamPolicy::new(Arc::clone(&self.client), arn))
            .collect())
    }

    pub async fn detach_policy(&self, policy: &IamPolicy<C>) -> Result<()> {
        self.client
            .detach_group_policy(&self.group_name, policy.policy_arn())
            .await?;
        debug!(group_name = %self.group_name, policy_arn = %policy.policy_arn(), "Detached policy from group");
        Ok(())
    }

    async fn teardown(&self) -> Result<()> {
        let policies = self.managed_policies().await?;
        info!(group_name = %self.group_name, count = policies.len(), "Detaching managed policies from group");
        for policy in policies {
            self.detach_policy(&policy).await?;
        }

        let inline = self.client.list_group_policies(&self.group_name).await?;
        info!(group_name = %self.group_name, count = inline.len(), "Deleting inline group policies");
        for policy_name in inline {
            self.client
                .delete_group_policy(&self.group_name, &policy_name)
                .await?;
            debug!(group_name = %self.group_name, policy_name = %policy_name, "Deleted inline group policy");
        }

        let users = self.users().await?;
        info!(group_name = %self.group_name, count = users.len(), "Removing users from group");
        for user in users {
            self.remove_user(&user).await?;
        }

        self.client.delete_group(&self.group_name).await?;
        info!(group_name = %self.group_name, "Deleted IAM group");
        Ok(())
    }
}

impl<C: IamApi> AwsResource for IamGroup<C> {
    fn kind(&self) -> ResourceKind {
        ResourceKind::IamGroup
    }

    fn resource_id(&self) -> &str {
        &self.group_name
    }

    async fn exists(&self) -> Result<bool> {
        exists_from(self.client.get_group(&self.group_name).await)
    }

    async fn delete(&self) -> Result<()> {
        finish_delete(self.teardown().await, self.kind(), &self.group_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockIamApi;
    use crate::test_support::no_such_entity;
    use mockall::Sequence;

    const POLICY: &str = "arn:aws:iam::123456789012:policy/readers";

    #[tokio::test]
    async fn exists_reflects_get_group() {
        let mut mock = MockIamApi::new();
        mock.expect_get_group().returning(|_| Err(no_such_entity()));

        assert!(!IamGroup::new(Arc::new(mock), "gone").exists().await.unwrap());
    }

    #[tokio::test]
    async fn users_are_built_from_every_page() {
        let mut mock = MockIamApi::new();
        mock.expect_list_group_users()
            .withf(|group| group == "devs")
            .returning(|_| Ok(vec!["alice".to_string(), "bob".to_string()]));

        let users = IamGroup::new(Arc::new(mock), "devs").users().await.unwrap();
        let names: Vec<_> = users.iter().map(|u| u.user_name()).collect();
        assert_eq!(names, ["alice", "bob"]);
    }

    #[tokio::test]
    async fn delete_removes_dependents_in_order() {
        let mut mock = MockIamApi::new();
        let mut seq = Sequence::new();

        mock.expect_list_attached_group_policies()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![POLICY.to_string()]));
        mock.expect_detach_group_policy()
            .withf(|group, arn| group == "devs" && arn == POLICY)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        mock.expect_list_group_policies()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec!["inline".to_string()]));
        mock.expect_delete_group_policy()
            .withf(|group, name| group == "devs" && name == "inline")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        mock.expect_list_group_users()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec!["alice".to_string()]));
        mock.expect_remove_user_from_group()
            .withf(|group, user| group == "devs" && user == "alice")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        mock.expect_delete_group()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        IamGroup::new(Arc::new(mock), "devs").delete().await.unwrap();
    }

    #[tokio::test]
    async fn delete_ends_quietly_when_group_vanishes_midway() {
        let mut mock = MockIamApi::new();
        mock.expect_list_attached_group_policies()
            .returning(|_| Ok(vec![]));
        mock.expect_list_group_policies().returning(|_| Ok(vec![]));
        mock.expect_list_group_users()
            .returning(|_| Err(no_such_entity()));
        mock.expect_delete_group().never();

        IamGroup::new(Arc::new(mock), "devs").delete().await.unwrap();
    }

    #[tokio::test]
    async fn delete_logs_dependent_counts() {
        let mut mock = MockIamApi::new();
        mock.expect_list_attached_group_policies()
            .returning(|_| Ok(vec![POLICY.to_string()]));
        mock.expect_detach_group_policy().returning(|_, _| Ok(()));
        mock.expect_list_group_policies()
            .returning(|_| Ok(vec!["a".to_string(), "b".to_string()]));
        mock.expect_delete_group_policy().times(2).returning(|_, _| Ok(()));
        mock.expect_list_group_users().returning(|_| Ok(vec![]));
        mock.expect_delete_group().returning(|_| Ok(()));

        let (_guard, logs) = crate::test_support::capture_logs();
        IamGroup::new(Arc::new(mock), "readers").delete().await.unwrap();

        let line = |message: &str| logs.line(message).unwrap_or_default();
        assert!(line("Detaching managed policies from group").contains("count=1"));
        assert!(line("Deleting inline group policies").contains("count=2"));
        assert!(line("Removing users from group").contains("count=0"));
    }
}
