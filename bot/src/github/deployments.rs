//! Deployment API client

use reqwest::{header, StatusCode};
use tracing::debug;

use github_models::{
    CreateDeploymentRequest, CreateDeploymentStatusRequest, Deployment, DeploymentState,
    DeploymentStatus, MergedDeploymentResponse,
};

use crate::errors::BotError;
use crate::github::client::{error_message, GithubClient, DEPLOYMENT_PREVIEWS};
use crate::github::{DeployOutcome, DeploymentFilter, RepoRef};

const PAGE_SIZE: usize = 100;

impl GithubClient {
    /// List every deployment matching the filter, following pagination
    pub async fn list_deployments(
        &self,
        repo: &RepoRef,
        filter: &DeploymentFilter,
    ) -> Result<Vec<Deployment>, BotError> {
        let mut page = 1_u32;
        let mut rows = Vec::new();
        loop {
            let page_value = page.to_string();
            let per_page = PAGE_SIZE.to_string();
            let mut request = self
                .get(self.repo_url(repo, ["deployments"])?)
                .header(header::ACCEPT, DEPLOYMENT_PREVIEWS)
                .query(&[("per_page", per_page.as_str()), ("page", page_value.as_str())]);
            if let Some(sha) = &filter.sha {
                request = request.query(&[("sha", sha.as_str())]);
            }
            if let Some(git_ref) = &filter.git_ref {
                request = request.query(&[("ref", git_ref.as_str())]);
            }

            let chunk: Vec<Deployment> = self.send_json("list deployments", request).await?;
            let chunk_len = chunk.len();
            rows.extend(chunk);
            if chunk_len < PAGE_SIZE {
                break;
            }
            page = page.saturating_add(1);
        }
        debug!("Listed {} deployments in {}", rows.len(), repo);
        Ok(rows)
    }

    /// Create a deployment
    pub async fn create_deployment(
        &self,
        repo: &RepoRef,
        body: &CreateDeploymentRequest,
    ) -> Result<DeployOutcome, BotError> {
        let response = self
            .post(self.repo_url(repo, ["deployments"])?)
            .header(header::ACCEPT, DEPLOYMENT_PREVIEWS)
            .json(body)
            .send()
            .await?;

        match response.status() {
            StatusCode::ACCEPTED => {
                let merged: MergedDeploymentResponse = response.json().await?;
                Ok(DeployOutcome::AutoMerged {
                    message: merged.message,
                })
            }
            StatusCode::CONFLICT => Err(BotError::DeployConflict(error_message(response).await)),
            status if status.is_success() => Ok(DeployOutcome::Created(response.json().await?)),
            status => Err(BotError::PlatformError {
                status: status.as_u16(),
                message: error_message(response).await,
            }),
        }
    }

    /// Attach a status to a deployment
    pub async fn create_deployment_status(
        &self,
        repo: &RepoRef,
        deployment_id: u64,
        state: DeploymentState,
    ) -> Result<DeploymentStatus, BotError> {
        let request = self
            .post(self.repo_url(
                repo,
                ["deployments", deployment_id.to_string().as_str(), "statuses"],
            )?)
            .header(header::ACCEPT, DEPLOYMENT_PREVIEWS)
            .json(&CreateDeploymentStatusRequest {
                state,
                description: None,
            });
        self.send_json("create deployment status", request).await
    }
}
