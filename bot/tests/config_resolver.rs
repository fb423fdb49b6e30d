//! Config resolution through the platform client

mod common;

use std::sync::Arc;

use deploybot::config::resolve_config;
use deploybot::errors::BotError;
use serde_json::json;

use common::{context, FakeGithub};

#[tokio::test]
async fn test_resolves_legacy_config_from_default_branch() {
    let yaml = "
prod:
  auto_deploy_on: refs/heads/main
  deployments:
    - task: deploy:migrate
      environment: production
      payload:
        region: eu-west-1
staging:
  environment: staging
";
    let github = Arc::new(FakeGithub::new().with_config(yaml));
    let config = resolve_config(&context(github), None).await.unwrap();

    assert_eq!(config.names().collect::<Vec<_>>(), vec!["prod", "staging"]);
    let prod = config.get("prod").unwrap();
    assert_eq!(prod.name, "prod");
    assert_eq!(prod.task, "deploy:migrate");
    assert_eq!(prod.payload, json!({"region": "eu-west-1"}));
    assert!(prod.deploys_on("refs/heads/main"));

    let staging = config.get("staging").unwrap();
    assert_eq!(staging.task, "deploy");
    assert!(staging.auto_deploy_on.is_none());
}

#[tokio::test]
async fn test_missing_file_is_config_not_found() {
    let github = Arc::new(FakeGithub::new());
    let err = resolve_config(&context(github), Some("refs/heads/feature"))
        .await
        .unwrap_err();
    assert!(err.is_config_not_found());
}

#[tokio::test]
async fn test_invalid_config_names_the_property() {
    let github = Arc::new(FakeGithub::new().with_config("prod:\n  auto_merge: sometimes\n"));
    let err = resolve_config(&context(github), None).await.unwrap_err();
    match err {
        BotError::ConfigInvalid { property, .. } => assert_eq!(property, "prod.auto_merge"),
        other => panic!("unexpected error: {other}"),
    }
}
