//! GitHub platform access
//!
//! The core only talks to the hosting platform through [`GithubApi`], so every
//! component can be exercised against an in-memory implementation.

pub mod client;
pub mod deployments;
pub mod issues;
pub mod repos;

use std::fmt;

use async_trait::async_trait;
use github_models::{
    CollaboratorPermission, Commit, CreateDeploymentRequest, Deployment, DeploymentState,
    DeploymentStatus, GitRef, IssueComment, PullRequest,
};

use crate::errors::BotError;

/// Repository coordinates
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub id: u64,
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(id: u64, owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Deployment listing filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentFilter {
    pub sha: Option<String>,
    pub git_ref: Option<String>,
}

impl DeploymentFilter {
    pub fn by_sha(sha: impl Into<String>) -> Self {
        Self {
            sha: Some(sha.into()),
            git_ref: None,
        }
    }

    pub fn by_ref(git_ref: impl Into<String>) -> Self {
        Self {
            sha: None,
            git_ref: Some(git_ref.into()),
        }
    }

    /// Whether a deployment passes this filter
    pub fn matches(&self, deployment: &Deployment) -> bool {
        self.sha.as_ref().is_none_or(|sha| &deployment.sha == sha)
            && self
                .git_ref
                .as_ref()
                .is_none_or(|git_ref| &deployment.git_ref == git_ref)
    }
}

/// Result of a deployment creation request
#[derive(Debug, Clone)]
pub enum DeployOutcome {
    /// A deployment record was created
    Created(Deployment),

    /// The platform merged the default branch into the ref instead (HTTP 202)
    AutoMerged { message: String },
}

impl DeployOutcome {
    pub fn deployment(&self) -> Option<&Deployment> {
        match self {
            DeployOutcome::Created(deployment) => Some(deployment),
            DeployOutcome::AutoMerged { .. } => None,
        }
    }
}

/// Operations the deployment core requires from the hosting platform
#[async_trait]
pub trait GithubApi: Send + Sync {
    /// Get a file's text at a ref (`None` ref means the default branch).
    /// Returns `Ok(None)` when the file does not exist.
    async fn get_file_content(
        &self,
        repo: &RepoRef,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Option<String>, BotError>;

    /// Get a commit. Returns `Ok(None)` when the sha is unknown.
    async fn get_commit(&self, repo: &RepoRef, sha: &str) -> Result<Option<Commit>, BotError>;

    /// Resolve a ref such as `refs/heads/main`
    async fn get_ref(&self, repo: &RepoRef, git_ref: &str) -> Result<GitRef, BotError>;

    async fn list_deployments(
        &self,
        repo: &RepoRef,
        filter: &DeploymentFilter,
    ) -> Result<Vec<Deployment>, BotError>;

    /// Create a deployment. A 409 response is reported as
    /// [`BotError::DeployConflict`].
    async fn create_deployment(
        &self,
        repo: &RepoRef,
        request: &CreateDeploymentRequest,
    ) -> Result<DeployOutcome, BotError>;

    async fn create_deployment_status(
        &self,
        repo: &RepoRef,
        deployment_id: u64,
        state: DeploymentState,
    ) -> Result<DeploymentStatus, BotError>;

    async fn get_pull_request(&self, repo: &RepoRef, number: u64)
        -> Result<PullRequest, BotError>;

    async fn create_issue_comment(
        &self,
        repo: &RepoRef,
        number: u64,
        body: &str,
    ) -> Result<IssueComment, BotError>;

    async fn get_collaborator_permission(
        &self,
        repo: &RepoRef,
        username: &str,
    ) -> Result<CollaboratorPermission, BotError>;
}

#[async_trait]
impl GithubApi for client::GithubClient {
    async fn get_file_content(
        &self,
        repo: &RepoRef,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Option<String>, BotError> {
        client::GithubClient::get_file_content(self, repo, path, git_ref).await
    }

    async fn get_commit(&self, repo: &RepoRef, sha: &str) -> Result<Option<Commit>, BotError> {
        client::GithubClient::get_commit(self, repo, sha).await
    }

    async fn get_ref(&self, repo: &RepoRef, git_ref: &str) -> Result<GitRef, BotError> {
        client::GithubClient::get_ref(self, repo, git_ref).await
    }

    async fn list_deployments(
        &self,
        repo: &RepoRef,
        filter: &DeploymentFilter,
    ) -> Result<Vec<Deployment>, BotError> {
        client::GithubClient::list_deployments(self, repo, filter).await
    }

    async fn create_deployment(
        &self,
        repo: &RepoRef,
        request: &CreateDeploymentRequest,
    ) -> Result<DeployOutcome, BotError> {
        client::GithubClient::create_deployment(self, repo, request).await
    }

    async fn create_deployment_status(
        &self,
        repo: &RepoRef,
        deployment_id: u64,
        state: DeploymentState,
    ) -> Result<DeploymentStatus, BotError> {
        client::GithubClient::create_deployment_status(self, repo, deployment_id, state).await
    }

    async fn get_pull_request(
        &self,
        repo: &RepoRef,
        number: u64,
    ) -> Result<PullRequest, BotError> {
        client::GithubClient::get_pull_request(self, repo, number).await
    }

    async fn create_issue_comment(
        &self,
        repo: &RepoRef,
        number: u64,
        body: &str,
    ) -> Result<IssueComment, BotError> {
        client::GithubClient::create_issue_comment(self, repo, number, body).await
    }

    async fn get_collaborator_permission(
        &self,
        repo: &RepoRef,
        username: &str,
    ) -> Result<CollaboratorPermission, BotError> {
        client::GithubClient::get_collaborator_permission(self, repo, username).await
    }
}
