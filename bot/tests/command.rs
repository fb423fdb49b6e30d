//! `/deploy` comment tests

mod common;

use std::sync::Arc;

use deploybot::app::state::AppState;
use deploybot::deploy::command::{handle_deploy_comment, CommandOutcome};
use deploybot::events::dispatch::{dispatch, Dispatched};
use serde_json::json;
use webhook_events::WebhookEvent;

use common::{context, repository_json, FakeGithub, MAIN_SHA};

const CONFIG: &str = "
review:
  environment: 'review-{{ pr }}'
  transient_environment: true
";

fn fake() -> FakeGithub {
    FakeGithub::new()
        .with_config(CONFIG)
        .with_branch("feature-x", MAIN_SHA)
        .with_pull_request(7, "feature-x", MAIN_SHA)
        .with_permission("maintainer", "write")
        .with_permission("visitor", "read")
}

#[tokio::test]
async fn test_writer_deploys_pull_request_head() {
    let github = Arc::new(fake());
    let outcome = handle_deploy_comment(&context(github.clone()), 7, "maintainer", "/deploy review").await;
    assert!(matches!(outcome, CommandOutcome::Deployed(_)));

    let created = github.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].git_ref, "feature-x");
    assert_eq!(created[0].environment, "review-7");
    assert!(github.comments().is_empty());
}

#[tokio::test]
async fn test_reader_is_ignored() {
    let github = Arc::new(fake());
    let outcome = handle_deploy_comment(&context(github.clone()), 7, "visitor", "/deploy review").await;
    assert!(matches!(outcome, CommandOutcome::PermissionDenied));
    assert!(github.create_attempts().is_empty());
    assert!(github.comments().is_empty());
}

#[tokio::test]
async fn test_failure_is_commented_back() {
    let github = Arc::new(fake());
    let outcome = handle_deploy_comment(&context(github.clone()), 7, "maintainer", "/deploy nope").await;
    assert!(matches!(outcome, CommandOutcome::Failed(_)));

    let comments = github.comments();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].0, 7);
    assert!(comments[0].1.contains("nope"));
}

#[tokio::test]
async fn test_dispatch_routes_pull_request_comments_only() {
    let github = Arc::new(fake());
    let state = AppState::new(github.clone());

    let on_issue = json!({
        "action": "created",
        "issue": {"number": 7},
        "comment": {"id": 1, "body": "/deploy review", "user": {"login": "maintainer"}},
        "repository": repository_json()
    });
    let event = WebhookEvent::parse("issue_comment", on_issue.to_string().as_bytes()).unwrap();
    assert!(matches!(dispatch(&state, "d1", event).await, Dispatched::Ignored(_)));

    let on_pull_request = json!({
        "action": "created",
        "issue": {"number": 7, "pull_request": {"url": "https://api.github.com/repos/octocat/hello-world/pulls/7"}},
        "comment": {"id": 2, "body": "/deploy review", "user": {"login": "maintainer"}},
        "repository": repository_json()
    });
    let event = WebhookEvent::parse("issue_comment", on_pull_request.to_string().as_bytes()).unwrap();
    let dispatched = dispatch(&state, "d2", event).await;
    assert!(matches!(
        dispatched,
        Dispatched::Command(CommandOutcome::Deployed(_))
    ));
    assert_eq!(github.created().len(), 1);
}
