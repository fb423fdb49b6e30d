//! Webhook payload models

use serde::{Deserialize, Serialize};

/// Repository owner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Owner {
    pub login: String,
}

/// Repository the event belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub owner: Owner,
    #[serde(default)]
    pub default_branch: Option<String>,
}

/// User who triggered the event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub login: String,
}

/// `push` event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushEvent {
    #[serde(rename = "ref")]
    pub git_ref: String,
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub deleted: bool,
    pub repository: Repository,
}

/// Branch listed on a `status` event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusBranch {
    pub name: String,
}

/// `status` event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEvent {
    pub sha: String,
    pub state: String,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub branches: Vec<StatusBranch>,
    pub repository: Repository,
}

/// Check suite embedded in a check run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckSuite {
    #[serde(default)]
    pub head_branch: Option<String>,
    #[serde(default)]
    pub head_sha: Option<String>,
}

/// Check run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRun {
    pub status: String,
    #[serde(default)]
    pub conclusion: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub check_suite: CheckSuite,
}

/// `check_run` event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRunEvent {
    pub action: String,
    pub check_run: CheckRun,
    pub repository: Repository,
}

/// Marker present on issues that are pull requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuePullRequest {
    #[serde(default)]
    pub url: Option<String>,
}

/// Issue (or pull request) a comment was left on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    #[serde(default)]
    pub pull_request: Option<IssuePullRequest>,
}

/// Comment body and author
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub body: String,
    pub user: User,
}

/// `issue_comment` event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueCommentEvent {
    pub action: String,
    pub issue: Issue,
    pub comment: Comment,
    pub repository: Repository,
}

/// Head of a pull request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestHead {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub sha: String,
}

/// Pull request as embedded in `pull_request` events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub head: PullRequestHead,
    #[serde(default)]
    pub merged: Option<bool>,
}

/// `pull_request` event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestEvent {
    pub action: String,
    pub number: u64,
    pub pull_request: PullRequest,
    pub repository: Repository,
}

/// A parsed webhook delivery
#[derive(Debug, Clone)]
pub enum WebhookEvent {
    Push(PushEvent),
    Status(StatusEvent),
    CheckRun(CheckRunEvent),
    IssueComment(IssueCommentEvent),
    PullRequest(PullRequestEvent),
    /// Any event this service does not act on
    Other(String),
}

impl WebhookEvent {
    /// Parse a delivery body according to its `X-GitHub-Event` name
    pub fn parse(event_name: &str, body: &[u8]) -> Result<Self, serde_json::Error> {
        let event = match event_name {
            "push" => WebhookEvent::Push(serde_json::from_slice(body)?),
            "status" => WebhookEvent::Status(serde_json::from_slice(body)?),
            "check_run" => WebhookEvent::CheckRun(serde_json::from_slice(body)?),
            "issue_comment" => WebhookEvent::IssueComment(serde_json::from_slice(body)?),
            "pull_request" => WebhookEvent::PullRequest(serde_json::from_slice(body)?),
            other => WebhookEvent::Other(other.to_string()),
        };
        Ok(event)
    }

    /// Event name as sent in `X-GitHub-Event`
    pub fn name(&self) -> &str {
        match self {
            WebhookEvent::Push(_) => "push",
            WebhookEvent::Status(_) => "status",
            WebhookEvent::CheckRun(_) => "check_run",
            WebhookEvent::IssueComment(_) => "issue_comment",
            WebhookEvent::PullRequest(_) => "pull_request",
            WebhookEvent::Other(name) => name,
        }
    }

    /// Repository the event belongs to, if it is one we act on
    pub fn repository(&self) -> Option<&Repository> {
        match self {
            WebhookEvent::Push(e) => Some(&e.repository),
            WebhookEvent::Status(e) => Some(&e.repository),
            WebhookEvent::CheckRun(e) => Some(&e.repository),
            WebhookEvent::IssueComment(e) => Some(&e.repository),
            WebhookEvent::PullRequest(e) => Some(&e.repository),
            WebhookEvent::Other(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_push_event() {
        let body = br#"{
            "ref": "refs/heads/main",
            "after": "abcdef1234567",
            "repository": {"id": 7, "name": "app", "owner": {"login": "acme"}}
        }"#;
        match WebhookEvent::parse("push", body).unwrap() {
            WebhookEvent::Push(push) => {
                assert_eq!(push.git_ref, "refs/heads/main");
                assert!(!push.deleted);
                assert_eq!(push.repository.owner.login, "acme");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_parse_unknown_event() {
        let event = WebhookEvent::parse("ping", b"not json").unwrap();
        assert_eq!(event.name(), "ping");
        assert!(event.repository().is_none());
    }

    #[test]
    fn test_parse_malformed_known_event() {
        assert!(WebhookEvent::parse("status", b"{}").is_err());
    }
}
