//! Pull request, comment and permission endpoints

use github_models::{CollaboratorPermission, CreateIssueCommentRequest, IssueComment, PullRequest};

use crate::errors::BotError;
use crate::github::client::GithubClient;
use crate::github::RepoRef;

impl GithubClient {
    pub async fn get_pull_request(
        &self,
        repo: &RepoRef,
        number: u64,
    ) -> Result<PullRequest, BotError> {
        let number = number.to_string();
        let request = self.get(self.repo_url(repo, ["pulls", number.as_str()])?);
        self.send_json("get pull request", request).await
    }

    pub async fn create_issue_comment(
        &self,
        repo: &RepoRef,
        number: u64,
        body: &str,
    ) -> Result<IssueComment, BotError> {
        let request = self
            .post(self.repo_url(repo, ["issues", number.to_string().as_str(), "comments"])?)
            .json(&CreateIssueCommentRequest {
                body: body.to_string(),
            });
        self.send_json("create issue comment", request).await
    }

    pub async fn get_collaborator_permission(
        &self,
        repo: &RepoRef,
        username: &str,
    ) -> Result<CollaboratorPermission, BotError> {
        let request = self.get(self.repo_url(repo, ["collaborators", username, "permission"])?);
        self.send_json("get collaborator permission", request).await
    }
}
