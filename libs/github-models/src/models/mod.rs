//! API models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A deployment as returned by the deployments API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    pub id: u64,
    pub sha: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
    #[serde(default)]
    pub task: String,
    #[serde(default)]
    pub payload: serde_json::Value,
    pub environment: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub transient_environment: bool,
    #[serde(default)]
    pub production_environment: bool,
    pub created_at: DateTime<Utc>,
}

/// Deployment creation request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateDeploymentRequest {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub task: String,
    pub auto_merge: bool,
    pub payload: serde_json::Value,
    pub environment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub transient_environment: bool,
    pub production_environment: bool,
    pub required_contexts: Vec<String>,
}

/// Body of a `202 Accepted` deployment response (the default branch was merged
/// into the requested ref instead of creating a deployment)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedDeploymentResponse {
    pub message: String,
}

/// Deployment status state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentState {
    Error,
    Failure,
    Inactive,
    InProgress,
    Queued,
    Pending,
    Success,
}

/// Deployment status creation request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDeploymentStatusRequest {
    pub state: DeploymentState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Deployment status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentStatus {
    pub id: u64,
    pub state: DeploymentState,
}

/// A commit, with every field the API returned kept in `extra`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Git reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitRef {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub object: GitObject,
}

/// Object a git reference points to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitObject {
    pub sha: String,
    #[serde(rename = "type")]
    pub object_type: String,
}

/// Repository file content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentFile {
    pub path: String,
    pub sha: String,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Head or base of a pull request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestBranch {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub sha: String,
}

/// Pull request, with the remaining fields kept in `extra`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub head: PullRequestBranch,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Issue comment creation request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateIssueCommentRequest {
    pub body: String,
}

/// Issue comment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueComment {
    pub id: u64,
    pub body: String,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// Collaborator permission level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollaboratorPermission {
    pub permission: String,
}

impl CollaboratorPermission {
    /// Whether the level allows pushing to the repository
    pub fn can_write(&self) -> bool {
        matches!(self.permission.as_str(), "admin" | "maintain" | "write")
    }
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(default)]
    pub documentation_url: Option<String>,
}
