//! In-memory GitHub used by the integration tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};

use deploybot::context::EventContext;
use deploybot::errors::BotError;
use deploybot::github::{DeployOutcome, DeploymentFilter, GithubApi, RepoRef};
use deploybot::template::TemplateRenderer;
use deploybot::utils::strip_refs_prefix;
use github_models::{
    CollaboratorPermission, Commit, CreateDeploymentRequest, Deployment, DeploymentState,
    DeploymentStatus, GitObject, GitRef, IssueComment, PullRequest,
};

pub const REPO_ID: u64 = 1296269;
pub const MAIN_SHA: &str = "6dcb09b5b57875f334f61aebed695e2e4193db5e";

/// How `create_deployment` should answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateBehavior {
    Create,
    Conflict,
    AutoMerge,
    ServerError,
}

#[derive(Default)]
pub struct FakeState {
    /// (path, ref without `refs/`) -> contents; `None` ref is the default branch
    pub files: HashMap<(String, Option<String>), String>,
    pub commits: HashMap<String, Value>,
    /// ref without `refs/` -> sha
    pub refs: HashMap<String, String>,
    pub deployments: Vec<Deployment>,
    /// Every create_deployment request, including rejected ones
    pub create_attempts: Vec<CreateDeploymentRequest>,
    pub statuses: Vec<(u64, DeploymentState)>,
    pub failing_status_ids: HashSet<u64>,
    /// Environments whose create_deployment calls fail with a 500
    pub failing_environments: HashSet<String>,
    pub comments: Vec<(u64, String)>,
    pub permissions: HashMap<String, String>,
    pub pull_requests: HashMap<u64, Value>,
}

pub struct FakeGithub {
    pub state: Mutex<FakeState>,
    behavior: Mutex<CreateBehavior>,
    create_delay: Duration,
    next_id: Mutex<u64>,
}

impl FakeGithub {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
            behavior: Mutex::new(CreateBehavior::Create),
            create_delay: Duration::ZERO,
            next_id: Mutex::new(1000),
        }
    }

    /// Sleep inside create_deployment to widen race windows
    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = delay;
        self
    }

    pub fn set_behavior(&self, behavior: CreateBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn with_config(self, yaml: &str) -> Self {
        self.state.lock().unwrap().files.insert(
            (deploybot::config::CONFIG_PATH.to_string(), None),
            yaml.to_string(),
        );
        self
    }

    pub fn with_branch(self, branch: &str, sha: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.refs.insert(format!("heads/{branch}"), sha.to_string());
            state.commits.insert(
                sha.to_string(),
                json!({"sha": sha, "commit": {"message": format!("Tip of {branch}")}}),
            );
        }
        self
    }

    pub fn with_permission(self, user: &str, permission: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .permissions
            .insert(user.to_string(), permission.to_string());
        self
    }

    pub fn with_pull_request(self, number: u64, head_ref: &str, head_sha: &str) -> Self {
        self.state.lock().unwrap().pull_requests.insert(
            number,
            json!({
                "number": number,
                "title": "Add feature",
                "head": {"ref": head_ref, "sha": head_sha}
            }),
        );
        self
    }

    pub fn with_deployment(self, deployment: Deployment) -> Self {
        self.state.lock().unwrap().deployments.push(deployment);
        self
    }

    pub fn created(&self) -> Vec<Deployment> {
        let state = self.state.lock().unwrap();
        state.deployments.iter().filter(|d| d.id >= 1000).cloned().collect()
    }

    pub fn create_attempts(&self) -> Vec<CreateDeploymentRequest> {
        self.state.lock().unwrap().create_attempts.clone()
    }

    pub fn statuses(&self) -> Vec<(u64, DeploymentState)> {
        self.state.lock().unwrap().statuses.clone()
    }

    pub fn comments(&self) -> Vec<(u64, String)> {
        self.state.lock().unwrap().comments.clone()
    }
}

pub fn repo() -> RepoRef {
    RepoRef::new(REPO_ID, "octocat", "hello-world")
}

pub fn context(github: Arc<FakeGithub>) -> EventContext {
    EventContext::new(repo(), github, Arc::new(TemplateRenderer::new()), "test-delivery")
}

pub fn timestamp(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap()
}

pub fn deployment(id: u64, environment: &str, git_ref: &str, transient: bool) -> Deployment {
    Deployment {
        id,
        sha: MAIN_SHA.to_string(),
        git_ref: git_ref.to_string(),
        task: "deploy".to_string(),
        payload: json!({}),
        environment: environment.to_string(),
        description: None,
        transient_environment: transient,
        production_environment: false,
        created_at: timestamp(id as u32),
    }
}

pub fn repository_json() -> Value {
    json!({
        "id": REPO_ID,
        "name": "hello-world",
        "full_name": "octocat/hello-world",
        "owner": {"login": "octocat"},
        "default_branch": "main"
    })
}

#[async_trait]
impl GithubApi for FakeGithub {
    async fn get_file_content(
        &self,
        _repo: &RepoRef,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Option<String>, BotError> {
        let state = self.state.lock().unwrap();
        let at_ref = git_ref
            .map(|r| (path.to_string(), Some(strip_refs_prefix(r).to_string())))
            .and_then(|key| state.files.get(&key));
        Ok(at_ref
            .or_else(|| state.files.get(&(path.to_string(), None)))
            .cloned())
    }

    async fn get_commit(&self, _repo: &RepoRef, sha: &str) -> Result<Option<Commit>, BotError> {
        let state = self.state.lock().unwrap();
        match state.commits.get(sha) {
            Some(commit) => Ok(Some(serde_json::from_value(commit.clone())?)),
            None => Ok(None),
        }
    }

    async fn get_ref(&self, _repo: &RepoRef, git_ref: &str) -> Result<GitRef, BotError> {
        let short = strip_refs_prefix(git_ref);
        let state = self.state.lock().unwrap();
        let sha = state.refs.get(short).ok_or_else(|| BotError::PlatformError {
            status: 404,
            message: "Not Found".to_string(),
        })?;
        Ok(GitRef {
            git_ref: format!("refs/{short}"),
            object: GitObject {
                sha: sha.clone(),
                object_type: "commit".to_string(),
            },
        })
    }

    async fn list_deployments(
        &self,
        _repo: &RepoRef,
        filter: &DeploymentFilter,
    ) -> Result<Vec<Deployment>, BotError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .deployments
            .iter()
            .filter(|deployment| filter.matches(deployment))
            .cloned()
            .collect())
    }

    async fn create_deployment(
        &self,
        _repo: &RepoRef,
        request: &CreateDeploymentRequest,
    ) -> Result<DeployOutcome, BotError> {
        if !self.create_delay.is_zero() {
            tokio::time::sleep(self.create_delay).await;
        }
        let behavior = *self.behavior.lock().unwrap();
        let mut state = self.state.lock().unwrap();
        state.create_attempts.push(request.clone());

        match behavior {
            CreateBehavior::Conflict => {
                return Err(BotError::DeployConflict(
                    "Conflict: Commit status checks failed for main.".to_string(),
                ))
            }
            CreateBehavior::ServerError => {
                return Err(BotError::PlatformError {
                    status: 500,
                    message: "Server Error".to_string(),
                })
            }
            CreateBehavior::AutoMerge => {
                return Ok(DeployOutcome::AutoMerged {
                    message: "Auto-merged main into topic on deployment.".to_string(),
                })
            }
            CreateBehavior::Create => {}
        }
        if state.failing_environments.contains(&request.environment) {
            return Err(BotError::PlatformError {
                status: 500,
                message: "Server Error".to_string(),
            });
        }

        let sha = state
            .refs
            .get(strip_refs_prefix(&request.git_ref))
            .cloned()
            .unwrap_or_else(|| request.git_ref.clone());
        let mut next_id = self.next_id.lock().unwrap();
        let id = *next_id;
        *next_id += 1;

        let deployment = Deployment {
            id,
            sha,
            git_ref: request.git_ref.clone(),
            task: request.task.clone(),
            payload: request.payload.clone(),
            environment: request.environment.clone(),
            description: request.description.clone(),
            transient_environment: request.transient_environment,
            production_environment: request.production_environment,
            created_at: Utc::now(),
        };
        state.deployments.push(deployment.clone());
        Ok(DeployOutcome::Created(deployment))
    }

    async fn create_deployment_status(
        &self,
        _repo: &RepoRef,
        deployment_id: u64,
        deployment_state: DeploymentState,
    ) -> Result<DeploymentStatus, BotError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_status_ids.contains(&deployment_id) {
            return Err(BotError::PlatformError {
                status: 502,
                message: "Bad Gateway".to_string(),
            });
        }
        state.statuses.push((deployment_id, deployment_state));
        Ok(DeploymentStatus {
            id: state.statuses.len() as u64,
            state: deployment_state,
        })
    }

    async fn get_pull_request(
        &self,
        _repo: &RepoRef,
        number: u64,
    ) -> Result<PullRequest, BotError> {
        let state = self.state.lock().unwrap();
        let pull_request = state
            .pull_requests
            .get(&number)
            .ok_or_else(|| BotError::PlatformError {
                status: 404,
                message: "Not Found".to_string(),
            })?;
        Ok(serde_json::from_value(pull_request.clone())?)
    }

    async fn create_issue_comment(
        &self,
        _repo: &RepoRef,
        number: u64,
        body: &str,
    ) -> Result<IssueComment, BotError> {
        let mut state = self.state.lock().unwrap();
        state.comments.push((number, body.to_string()));
        Ok(IssueComment {
            id: state.comments.len() as u64,
            body: body.to_string(),
            html_url: None,
        })
    }

    async fn get_collaborator_permission(
        &self,
        _repo: &RepoRef,
        username: &str,
    ) -> Result<CollaboratorPermission, BotError> {
        let state = self.state.lock().unwrap();
        Ok(CollaboratorPermission {
            permission: state
                .permissions
                .get(username)
                .cloned()
                .unwrap_or_else(|| "none".to_string()),
        })
    }
}
