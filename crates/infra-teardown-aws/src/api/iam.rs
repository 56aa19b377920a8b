//! IAM API surface used by the IAM resource wrappers

use crate::context::AwsContext;
use crate::error::{AwsError, Result};
use aws_sdk_iam::Client;

/// IAM client for querying and dismantling the IAM resource graph
pub struct IamClient {
    client: Client,
}

impl IamClient {
    /// Create an IAM client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.iam_client(),
        }
    }

    /// Wrap an existing SDK client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

/// Entities a managed policy is attached to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyEntities {
    pub roles: Vec<String>,
    pub users: Vec<String>,
    pub groups: Vec<String>,
}

impl PolicyEntities {
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty() && self.users.is_empty() && self.groups.is_empty()
    }
}

/// One version of a managed policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyVersionInfo {
    pub version_id: String,
    pub is_default: bool,
}

/// Trait for IAM operations that can be mocked in tests.
///
/// List operations return every page. Names and ARNs are passed as `&str`;
/// results come back as owned strings so wrappers can build nested resources.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait IamApi: Send + Sync {
    // Users
    async fn get_user(&self, user_name: &str) -> Result<()>;
    async fn list_groups_for_user(&self, user_name: &str) -> Result<Vec<String>>;
    async fn list_attached_user_policies(&self, user_name: &str) -> Result<Vec<String>>;
    async fn detach_user_policy(&self, user_name: &str, policy_arn: &str) -> Result<()>;
    async fn list_user_policies(&self, user_name: &str) -> Result<Vec<String>>;
    async fn delete_user_policy(&self, user_name: &str, policy_name: &str) -> Result<()>;
    async fn list_access_keys(&self, user_name: &str) -> Result<Vec<String>>;
    async fn delete_access_key(&self, user_name: &str, access_key_id: &str) -> Result<()>;
    async fn delete_user(&self, user_name: &str) -> Result<()>;

    // Groups
    async fn get_group(&self, group_name: &str) -> Result<()>;
    /// Members of the group, across every `GetGroup` page
    async fn list_group_users(&self, group_name: &str) -> Result<Vec<String>>;
    async fn list_attached_group_policies(&self, group_name: &str) -> Result<Vec<String>>;
    async fn detach_group_policy(&self, group_name: &str, policy_arn: &str) -> Result<()>;
    async fn list_group_policies(&self, group_name: &str) -> Result<Vec<String>>;
    async fn delete_group_policy(&self, group_name: &str, policy_name: &str) -> Result<()>;
    async fn remove_user_from_group(&self, group_name: &str, user_name: &str) -> Result<()>;
    async fn delete_group(&self, group_name: &str) -> Result<()>;

    // Roles
    async fn get_role(&self, role_name: &str) -> Result<()>;
    async fn list_attached_role_policies(&self, role_name: &str) -> Result<Vec<String>>;
    async fn detach_role_policy(&self, role_name: &str, policy_arn: &str) -> Result<()>;
    async fn list_role_policies(&self, role_name: &str) -> Result<Vec<String>>;
    async fn delete_role_policy(&self, role_name: &str, policy_name: &str) -> Result<()>;
    async fn list_instance_profiles_for_role(&self, role_name: &str) -> Result<Vec<String>>;
    async fn delete_role(&self, role_name: &str) -> Result<()>;

    // Managed policies
    async fn get_policy(&self, policy_arn: &str) -> Result<()>;
    async fn list_entities_for_policy(&self, policy_arn: &str) -> Result<PolicyEntities>;
    async fn list_policy_versions(&self, policy_arn: &str) -> Result<Vec<PolicyVersionInfo>>;
    async fn delete_policy_version(&self, policy_arn: &str, version_id: &str) -> Result<()>;
    async fn delete_policy(&self, policy_arn: &str) -> Result<()>;

    // Instance profiles
    /// Names of the roles held by the profile (at most one)
    async fn get_instance_profile(&self, profile_name: &str) -> Result<Vec<String>>;
    async fn remove_role_from_instance_profile(
        &self,
        profile_name: &str,
        role_name: &str,
    ) -> Result<()>;
    async fn delete_instance_profile(&self, profile_name: &str) -> Result<()>;
}

impl IamApi for IamClient {
    async fn get_user(&self, user_name: &str) -> Result<()> {
        self.client.get_user().user_name(user_name).send().await?;
        Ok(())
    }

    async fn list_groups_for_user(&self, user_name: &str) -> Result<Vec<String>> {
        let mut pages = self
            .client
            .list_groups_for_user()
            .user_name(user_name)
            .into_paginator()
            .send();
        let mut names = Vec::new();
        while let Some(page) = pages.next().await {
            names.extend(page?.groups().iter().map(|g| g.group_name().to_string()));
        }
        Ok(names)
    }

    async fn list_attached_user_policies(&self, user_name: &str) -> Result<Vec<String>> {
        let mut pages = self
            .client
            .list_attached_user_policies()
            .user_name(user_name)
            .into_paginator()
            .send();
        let mut arns = Vec::new();
        while let Some(page) = pages.next().await {
            arns.extend(
                page?
                    .attached_policies()
                    .iter()
                    .filter_map(|p| p.policy_arn().map(str::to_string)),
            );
        }
        Ok(arns)
    }

    async fn detach_user_policy(&self, user_name: &str, policy_arn: &str) -> Result<()> {
        self.client
            .detach_user_policy()
            .user_name(user_name)
            .policy_arn(policy_arn)
            .send()
            .await?;
        Ok(())
    }

    async fn list_user_policies(&self, user_name: &str) -> Result<Vec<String>> {
        let mut pages = self
            .client
            .list_user_policies()
            .user_name(user_name)
            .into_paginator()
            .send();
        let mut names = Vec::new();
        while let Some(page) = pages.next().await {
            names.extend(page?.policy_names().iter().cloned());
        }
        Ok(names)
    }

    async fn delete_user_policy(&self, user_name: &str, policy_name: &str) -> Result<()> {
        self.client
            .delete_user_policy()
            .user_name(user_name)
            .policy_name(policy_name)
            .send()
            .await?;
        Ok(())
    }

    async fn list_access_keys(&self, user_name: &str) -> Result<Vec<String>> {
        let mut pages = self
            .client
            .list_access_keys()
            .user_name(user_name)
            .into_paginator()
            .send();
        let mut ids = Vec::new();
        while let Some(page) = pages.next().await {
            ids.extend(
                page?
                    .access_key_metadata()
                    .iter()
                    .filter_map(|k| k.access_key_id().map(str::to_string)),
            );
        }
        Ok(ids)
    }

    async fn delete_access_key(&self, user_name: &str, access_key_id: &str) -> Result<()> {
        self.client
            .delete_access_key()
            .user_name(user_name)
            .access_key_id(access_key_id)
            .send()
            .await?;
        Ok(())
    }

    async fn delete_user(&self, user_name: &str) -> Result<()> {
        self.client.delete_user().user_name(user_name).send().await?;
        Ok(())
    }

    async fn get_group(&self, group_name: &str) -> Result<()> {
        self.client.get_group().group_name(group_name).send().await?;
        Ok(())
    }

    async fn list_group_users(&self, group_name: &str) -> Result<Vec<String>> {
        let mut pages = self
            .client
            .get_group()
            .group_name(group_name)
            .into_paginator()
            .send();
        let mut names = Vec::new();
        while let Some(page) = pages.next().await {
            names.extend(page?.users().iter().map(|u| u.user_name().to_string()));
        }
        Ok(names)
    }

    async fn list_attached_group_policies(&self, group_name: &str) -> Result<Vec<String>> {
        let mut pages = self
            .client
            .list_attached_group_policies()
            .group_name(group_name)
            .into_paginator()
            .send();
        let mut arns = Vec::new();
        while let Some(page) = pages.next().await {
            arns.extend(
                page?
                    .attached_policies()
                    .iter()
                    .filter_map(|p| p.policy_arn().map(str::to_string)),
            );
        }
        Ok(arns)
    }

    async fn detach_group_policy(&self, group_name: &str, policy_arn: &str) -> Result<()> {
        self.client
            .detach_group_policy()
            .group_name(group_name)
            .policy_arn(policy_arn)
            .send()
            .await?;
        Ok(())
    }

    async fn list_group_policies(&self, group_name: &str) -> Result<Vec<String>> {
        let mut pages = self
            .client
            .list_group_policies()
            .group_name(group_name)
            .into_paginator()
            .send();
        let mut names = Vec::new();
        while let Some(page) = pages.next().await {
            names.extend(page?.policy_names().iter().cloned());
        }
        Ok(names)
    }

    async fn delete_group_policy(&self, group_name: &str, policy_name: &str) -> Result<()> {
        self.client
            .delete_group_policy()
            .group_name(group_name)
            .policy_name(policy_name)
            .send()
            .await?;
        Ok(())
    }

    async fn remove_user_from_group(&self, group_name: &str, user_name: &str) -> Result<()> {
        self.client
            .remove_user_from_group()
            .group_name(group_name)
            .user_name(user_name)
            .send()
            .await?;
        Ok(())
    }

    async fn delete_group(&self, group_name: &str) -> Result<()> {
        self.client
            .delete_group()
            .group_name(group_name)
            .send()
            .await?;
        Ok(())
    }

    async fn get_role(&self, role_name: &str) -> Result<()> {
        self.client.get_role().role_name(role_name).send().await?;
        Ok(())
    }

    async fn list_attached_role_policies(&self, role_name: &str) -> Result<Vec<String>> {
        let mut pages = self
            .client
            .list_attached_role_policies()
            .role_name(role_name)
            .into_paginator()
            .send();
        let mut arns = Vec::new();
        while let Some(page) = pages.next().await {
            arns.extend(
                page?
                    .attached_policies()
                    .iter()
                    .filter_map(|p| p.policy_arn().map(str::to_string)),
            );
        }
        Ok(arns)
    }

    async fn detach_role_policy(&self, role_name: &str, policy_arn: &str) -> Result<()> {
        self.client
            .detach_role_policy()
            .role_name(role_name)
            .policy_arn(policy_arn)
            .send()
            .await?;
        Ok(())
    }

    async fn list_role_policies(&self, role_name: &str) -> Result<Vec<String>> {
        let mut pages = self
            .client
            .list_role_policies()
            .role_name(role_name)
            .into_paginator()
            .send();
        let mut names = Vec::new();
        while let Some(page) = pages.next().await {
            names.extend(page?.policy_names().iter().cloned());
        }
        Ok(names)
    }

    async fn delete_role_policy(&self, role_name: &str, policy_name: &str) -> Result<()> {
        self.client
            .delete_role_policy()
            .role_name(role_name)
            .policy_name(policy_name)
            .send()
            .await?;
        Ok(())
    }

    async fn list_instance_profiles_for_role(&self, role_name: &str) -> Result<Vec<String>> {
        let mut pages = self
            .client
            .list_instance_profiles_for_role()
            .role_name(role_name)
            .into_paginator()
            .send();
        let mut names = Vec::new();
        while let Some(page) = pages.next().await {
            names.extend(
                page?
                    .instance_profiles()
                    .iter()
                    .map(|p| p.instance_profile_name().to_string()),
            );
        }
        Ok(names)
    }

    async fn delete_role(&self, role_name: &str) -> Result<()> {
        self.client.delete_role().role_name(role_name).send().await?;
        Ok(())
    }

    async fn get_policy(&self, policy_arn: &str) -> Result<()> {
        self.client.get_policy().policy_arn(policy_arn).send().await?;
        Ok(())
    }

    async fn list_entities_for_policy(&self, policy_arn: &str) -> Result<PolicyEntities> {
        let mut pages = self
            .client
            .list_entities_for_policy()
            .policy_arn(policy_arn)
            .into_paginator()
            .send();
        let mut entities = PolicyEntities::default();
        while let Some(page) = pages.next().await {
            let page = page?;
            entities.roles.extend(
                page.policy_roles()
                    .iter()
                    .filter_map(|r| r.role_name().map(str::to_string)),
            );
            entities.users.extend(
                page.policy_users()
                    .iter()
                    .filter_map(|u| u.user_name().map(str::to_string)),
            );
            entities.groups.extend(
                page.policy_groups()
                    .iter()
                    .filter_map(|g| g.group_name().map(str::to_string)),
            );
        }
        Ok(entities)
    }

    async fn list_policy_versions(&self, policy_arn: &str) -> Result<Vec<PolicyVersionInfo>> {
        let mut versions = Vec::new();
        let mut marker: Option<String> = None;
        loop {
            let output = self
                .client
                .list_policy_versions()
                .policy_arn(policy_arn)
                .set_marker(marker.take())
                .send()
                .await?;

            for version in output.versions() {
                let version_id = version.version_id().ok_or(AwsError::MissingField {
                    operation: "ListPolicyVersions",
                    field: "VersionId",
                })?;
                versions.push(PolicyVersionInfo {
                    version_id: version_id.to_string(),
                    is_default: version.is_default_version(),
                });
            }

            match output.marker() {
                Some(next) if output.is_truncated() => marker = Some(next.to_string()),
                _ => break,
            }
        }
        Ok(versions)
    }

    async fn delete_policy_version(&self, policy_arn: &str, version_id: &str) -> Result<()> {
        self.client
            .delete_policy_version()
            .policy_arn(policy_arn)
            .version_id(version_id)
            .send()
            .await?;
        Ok(())
    }

    async fn delete_policy(&self, policy_arn: &str) -> Result<()> {
        self.client
            .delete_policy()
            .policy_arn(policy_arn)
            .send()
            .await?;
        Ok(())
    }

    async fn get_instance_profile(&self, profile_name: &str) -> Result<Vec<String>> {
        let output = self
            .client
            .get_instance_profile()
            .instance_profile_name(profile_name)
            .send()
            .await?;
        let profile = output.instance_profile().ok_or(AwsError::MissingField {
            operation: "GetInstanceProfile",
            field: "InstanceProfile",
        })?;
        Ok(profile
            .roles()
            .iter()
            .map(|r| r.role_name().to_string())
            .collect())
    }

    async fn remove_role_from_instance_profile(
        &self,
        profile_name: &str,
        role_name: &str,
    ) -> Result<()> {
        self.client
            .remove_role_from_instance_profile()
            .instance_profile_name(profile_name)
            .role_name(role_name)
            .send()
            .await?;
        Ok(())
    }

    async fn delete_instance_profile(&self, profile_name: &str) -> Result<()> {
        self.client
            .delete_instance_profile()
            .instance_profile_name(profile_name)
            .send()
            .await?;
        Ok(())
    }
}
