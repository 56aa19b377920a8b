use super::{IamGroup, IamRole, IamUser};
use crate::api::IamApi;
use crate::error::Result;
use crate::resource::{AwsResource, exists_from, finish_delete};
use infra_teardown_common::ResourceKind;
use infra_teardown_common::defaults::AWS_MANAGED_POLICY_MARKER;
use std::sync::Arc;
use tracing::{debug, info};

/// A managed IAM policy, identified by ARN
pub struct IamPolicy<C> {
    client: Arc<C>,
    policy_arn: String,
}

impl<C> Clone for IamPolicy<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            policy_arn: self.policy_arn.clone(),
        }
    }
}

impl<C> std::fmt::Debug for IamPolicy<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IamPolicy")
            .field("policy_arn", &self.policy_arn)
            .finish()
    }
}

/// Roles, users and groups a policy is attached to
pub struct AttachedEntities<C> {
    pub roles: Vec<IamRole<C>>,
    pub users: Vec<IamUser<C>>,
    pub groups: Vec<IamGroup<C>>,
}

impl<C> AttachedEntities<C> {
    pub fn len(&self) -> usize {
        self.roles.len() + self.users.len() + self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<C: IamApi> IamPolicy<C> {
    pub fn new(client: Arc<C>, policy_arn: impl Into<String>) -> Self {
        Self {
            client,
            policy_arn: policy_arn.into(),
        }
    }

    pub fn policy_arn(&self) -> &str {
        &self.policy_arn
    }

    /// Policies owned by AWS (`arn:aws:iam::aws:policy/...`) can be detached
    /// but never deleted.
    pub fn is_aws_managed(&self) -> bool {
        self.policy_arn.contains(AWS_MANAGED_POLICY_MARKER)
    }

    /// Every entity the policy is currently attached to.
    ///
    /// Always a fresh `ListEntitiesForPolicy` pass; call it again after
    /// detaching anything.
    pub async fn attached_entities(&self) -> Result<AttachedEntities<C>> {
        let entities = self.client.list_entities_for_policy(&self.policy_arn).await?;
        let client = &self.client;
        Ok(AttachedEntities {
            roles: entities
                .roles
                .into_iter()
                .map(|name| IamRole::new(Arc::clone(client), name))
                .collect(),
            users: entities
                .users
                .into_iter()
                .map(|name| IamUser::new(Arc::clone(client), name))
                .collect(),
            groups: entities
                .groups
                .into_iter()
                .map(|name| IamGroup::new(Arc::clone(client), name))
                .collect(),
        })
    }

    async fn teardown(&self) -> Result<()> {
        let attached = self.attached_entities().await?;
        for role in &attached.roles {
            role.detach_policy(self).await?;
        }
        for user in &attached.users {
            user.detach_policy(self).await?;
        }
        for group in &attached.groups {
            group.detach_policy(self).await?;
        }

        for version in self.client.list_policy_versions(&self.policy_arn).await? {
            if version.is_default {
                continue;
            }
            self.client
                .delete_policy_version(&self.policy_arn, &version.version_id)
                .await?;
            debug!(policy_arn = %self.policy_arn, version_id = %version.version_id, "Deleted policy version");
        }

        self.client.delete_policy(&self.policy_arn).await?;
        info!(
            policy_arn = %self.policy_arn,
            detached = attached.len(),
            "Deleted IAM policy"
        );
        Ok(())
    }
}

impl<C: IamApi> AwsResource for IamPolicy<C> {
    fn kind(&self) -> ResourceKind {
        ResourceKind::IamPolicy
    }

    fn resource_id(&self) -> &str {
        &self.policy_arn
    }

    async fn exists(&self) -> Result<bool> {
        exists_from(self.client.get_policy(&self.policy_arn).await)
    }

    /// Detach the policy everywhere, delete its non-default versions, then
    /// delete it. AWS-managed policies are left alone.
    async fn delete(&self) -> Result<()> {
        if self.is_aws_managed() {
            info!(policy_arn = %self.policy_arn, "Skipping AWS-managed policy");
            return Ok(());
        }
        finish_delete(self.teardown().await, self.kind(), &self.policy_arn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockIamApi, PolicyEntities, PolicyVersionInfo};
    use crate::test_support::{access_denied, no_such_entity};
    use mockall::Sequence;

    const ARN: &str = "arn:aws:iam::123456789012:policy/app";
    const MANAGED: &str = "arn:aws:iam::aws:policy/ReadOnlyAccess";

    fn policy(mock: MockIamApi, arn: &str) -> IamPolicy<MockIamApi> {
        IamPolicy::new(Arc::new(mock), arn)
    }

    #[test]
    fn aws_managed_detection() {
        assert!(policy(MockIamApi::new(), MANAGED).is_aws_managed());
        assert!(!policy(MockIamApi::new(), ARN).is_aws_managed());
    }

    #[tokio::test]
    async fn aws_managed_policy_is_never_touched() {
        let mut mock = MockIamApi::new();
        mock.expect_list_entities_for_policy().never();
        mock.expect_delete_policy().never();

        policy(mock, MANAGED).delete().await.unwrap();
    }

    #[tokio::test]
    async fn exists_reflects_get_policy() {
        let mut mock = MockIamApi::new();
        mock.expect_get_policy().returning(|_| Err(no_such_entity()));

        assert!(!policy(mock, ARN).exists().await.unwrap());
    }

    #[tokio::test]
    async fn delete_detaches_then_prunes_versions() {
        let mut mock = MockIamApi::new();
        let mut seq = Sequence::new();

        mock.expect_list_entities_for_policy()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(PolicyEntities {
                    roles: vec!["agent".to_string()],
                    users: vec!["alice".to_string()],
                    groups: vec!["devs".to_string()],
                })
            });
        mock.expect_detach_role_policy()
            .withf(|role, arn| role == "agent" && arn == ARN)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        mock.expect_detach_user_policy()
            .withf(|user, arn| user == "alice" && arn == ARN)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        mock.expect_detach_group_policy()
            .withf(|group, arn| group == "devs" && arn == ARN)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        mock.expect_list_policy_versions()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(vec![
                    PolicyVersionInfo {
                        version_id: "v1".to_string(),
                        is_default: false,
                    },
                    PolicyVersionInfo {
                        version_id: "v2".to_string(),
                        is_default: true,
                    },
                    PolicyVersionInfo {
                        version_id: "v3".to_string(),
                        is_default: false,
                    },
                ])
            });
        mock.expect_delete_policy_version()
            .withf(|_, version| version == "v1")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        mock.expect_delete_policy_version()
            .withf(|_, version| version == "v3")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        mock.expect_delete_policy()
            .withf(|arn| arn == ARN)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        policy(mock, ARN).delete().await.unwrap();
    }

    #[tokio::test]
    async fn default_version_is_never_deleted_directly() {
        let mut mock = MockIamApi::new();
        mock.expect_list_entities_for_policy()
            .returning(|_| Ok(PolicyEntities::default()));
        mock.expect_list_policy_versions().returning(|_| {
            Ok(vec![PolicyVersionInfo {
                version_id: "v1".to_string(),
                is_default: true,
            }])
        });
        mock.expect_delete_policy_version().never();
        mock.expect_delete_policy().times(1).returning(|_| Ok(()));

        policy(mock, ARN).delete().await.unwrap();
    }

    #[tokio::test]
    async fn missing_policy_is_noop() {
        let mut mock = MockIamApi::new();
        mock.expect_list_entities_for_policy()
            .returning(|_| Err(no_such_entity()));
        mock.expect_delete_policy().never();

        policy(mock, ARN).delete().await.unwrap();
    }

    #[tokio::test]
    async fn failed_detach_aborts_delete() {
        let mut mock = MockIamApi::new();
        mock.expect_list_entities_for_policy().returning(|_| {
            Ok(PolicyEntities {
                roles: vec!["agent".to_string()],
                ..Default::default()
            })
        });
        mock.expect_detach_role_policy()
            .returning(|_, _| Err(access_denied()));
        mock.expect_delete_policy().never();

        let err = policy(mock, ARN).delete().await.unwrap_err();
        assert_eq!(err.code(), Some("AccessDenied"));
    }

    #[tokio::test]
    async fn attached_entities_counts_all_kinds() {
        let mut mock = MockIamApi::new();
        mock.expect_list_entities_for_policy().returning(|_| {
            Ok(PolicyEntities {
                roles: vec!["r1".to_string(), "r2".to_string()],
                users: vec![],
                groups: vec!["g1".to_string()],
            })
        });

        let attached = policy(mock, ARN).attached_entities().await.unwrap();
        assert_eq!(attached.len(), 3);
        assert_eq!(attached.roles[1].role_name(), "r2");
        assert_eq!(attached.groups[0].group_name(), "g1");
    }
}
