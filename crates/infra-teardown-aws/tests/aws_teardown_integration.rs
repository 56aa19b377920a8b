//! End-to-end teardown tests - actually call AWS APIs
//!
//! These tests are marked `#[ignore]` and only run with:
//! ```text
//! AWS_PROFILE=your_profile cargo test --test aws_teardown_integration -- --ignored
//! ```


use aws_test_helpers::*;
use infra_teardown_aws::{
    AwsResource, CleanupResult, EventBridgeClient, EventBridgeRule, ResourceKind, ResourceSpec,
    Teardown, TeardownConfig,
};
use std::sync::Arc;

/// Declared resources that never existed all come back as already deleted.
#[tokio::test]
#[ignore = "requires AWS credentials"]
async fn test_teardown_of_missing_resources() {
    let ctx = test_context().await;
    let run_id = test_run_id();
    let name = format!("infra-teardown-missing-{run_id}");

    let config = TeardownConfig::from_json_str(&format!(
        r#"{{
            "dry_run": false,
            "resources": [
                {{ "kind": "s3_bucket", "id": "{name}" }},
                {{ "kind": "iam_role", "id": "{name}" }},
                {{ "kind": "iam_instance_profile", "id": "{name}" }},
                {{ "kind": "eventbridge_rule", "id": "{name}" }},
                {{ "kind": "cloudfront_distribution", "id": "E000000MISSING" }}
            ]
        }}"#
    ))
    .unwrap();

    let report = Teardown::from_context(&ctx).run(&config).await;
    assert_eq!(report.total_found, 5);
    assert_eq!(report.already_deleted, 5, "report: {report:?}");
    assert!(report.is_success());
}

/// A rule with a target is detached and deleted.
#[tokio::test]
#[ignore = "requires AWS credentials"]
async fn test_delete_rule_with_target() {
    let ctx = test_context().await;
    let sdk = ctx.eventbridge_client();
    let rule_name = format!("infra-teardown-{}", test_run_id());

    sdk.put_rule()
        .name(&rule_name)
        .schedule_expression("rate(1 day)")
        .send()
        .await
        .expect("AWS credentials required - set AWS_PROFILE or AWS_ACCESS_KEY_ID");

    let rule = EventBridgeRule::new(Arc::new(EventBridgeClient::from_context(&ctx)), rule_name.as_str());
    assert!(rule.exists().await.unwrap());

    let teardown = Teardown::from_context(&ctx);
    let result = teardown
        .delete_resource(&ResourceSpec::new(ResourceKind::EventBridgeRule, rule_name.as_str()))
        .await;
    assert_eq!(result, CleanupResult::Deleted);
    assert!(!rule.exists().await.unwrap());
}

/// Run ids embed the current Unix time so leftovers can be aged out.
#[test]
fn test_run_id_is_current_timestamp() {
    let before = chrono::Utc::now().timestamp();
    let run_id = test_run_id();
    let after = chrono::Utc::now().timestamp();

    let secs: i64 = run_id
        .strip_prefix("test-")
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| panic!("unexpected run id {run_id}"));
    assert!((before..=after).contains(&secs));
}
