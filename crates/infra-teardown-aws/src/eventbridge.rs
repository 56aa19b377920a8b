//! EventBridge rule teardown

use crate::api::EventBridgeApi;
use crate::error::{AwsError, Result};
use crate::resource::{AwsResource, exists_from, finish_delete};
use infra_teardown_common::ResourceKind;
use infra_teardown_common::defaults::DEFAULT_EVENT_BUS;
use std::sync::Arc;
use tracing::{debug, info};

/// An EventBridge rule on a specific event bus
pub struct EventBridgeRule<C> {
    client: Arc<C>,
    rule_name: String,
    event_bus_name: String,
}

impl<C> std::fmt::Debug for EventBridgeRule<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBridgeRule")
            .field("rule_name", &self.rule_name)
            .field("event_bus_name", &self.event_bus_name)
            .finish()
    }
}

impl<C: EventBridgeApi> EventBridgeRule<C> {
    /// A rule on the `default` bus
    pub fn new(client: Arc<C>, rule_name: impl Into<String>) -> Self {
        Self::on_bus(client, rule_name, DEFAULT_EVENT_BUS)
    }

    pub fn on_bus(
        client: Arc<C>,
        rule_name: impl Into<String>,
        event_bus_name: impl Into<String>,
    ) -> Self {
        Self {
            client,
            rule_name: rule_name.into(),
            event_bus_name: event_bus_name.into(),
        }
    }

    pub fn rule_name(&self) -> &str {
        &self.rule_name
    }

    pub fn event_bus_name(&self) -> &str {
        &self.event_bus_name
    }

    /// Detach every target, one `ListTargetsByRule` page at a time.
    ///
    /// Returns the number of targets removed.
    pub async fn remove_all_targets(&self) -> Result<usize> {
        let mut removed = 0usize;
        let mut next_token: Option<String> = None;

        loop {
            let page = self
                .client
                .list_targets_by_rule(&self.rule_name, &self.event_bus_name, next_token.take())
                .await?;

            if !page.target_ids.is_empty() {
                let count = page.target_ids.len();
                let failures = self
                    .client
                    .remove_targets(&self.rule_name, &self.event_bus_name, page.target_ids)
                    .await?;
                if let Some(first) = failures.first() {
                    return Err(AwsError::DependencyViolation {
                        code: first
                            .error_code
                            .clone()
                            .unwrap_or_else(|| "FailedEntry".to_string()),
                        message: format!(
                            "{} of {} targets of rule {} were not removed (first: {:?}: {})",
                            failures.len(),
                            count,
                            self.rule_name,
                            first.target_id,
                            first.error_message.as_deref().unwrap_or("no message"),
                        ),
                    });
                }
                removed += count;
                debug!(rule_name = %self.rule_name, count, "Removed rule targets");
            }

            match page.next_token {
                Some(token) => next_token = Some(token),
                None => break,
            }
        }

        Ok(removed)
    }

    async fn teardown(&self) -> Result<()> {
        let removed = self.remove_all_targets().await?;
        self.client
            .delete_rule(&self.rule_name, &self.event_bus_name)
            .await?;
        info!(
            rule_name = %self.rule_name,
            event_bus_name = %self.event_bus_name,
            targets_removed = removed,
            "Deleted EventBridge rule"
        );
        Ok(())
    }
}

impl<C: EventBridgeApi> AwsResource for EventBridgeRule<C> {
    fn kind(&self) -> ResourceKind {
        ResourceKind::EventBridgeRule
    }

    fn resource_id(&self) -> &str {
        &self.rule_name
    }

    async fn exists(&self) -> Result<bool> {
        exists_from(
            self.client
                .describe_rule(&self.rule_name, &self.event_bus_name)
                .await,
        )
    }

    async fn delete(&self) -> Result<()> {
        finish_delete(self.teardown().await, self.kind(), &self.rule_name)
    }
}
