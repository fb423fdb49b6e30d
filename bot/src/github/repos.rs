//! Repository content, commit and ref endpoints

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::StatusCode;
use tracing::debug;

use github_models::{Commit, ContentFile, GitRef};

use crate::errors::BotError;
use crate::github::client::{has_status, GithubClient};
use crate::github::RepoRef;
use crate::utils::strip_refs_prefix;

impl GithubClient {
    /// Fetch a file's decoded text, `None` when it does not exist
    pub async fn get_file_content(
        &self,
        repo: &RepoRef,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Option<String>, BotError> {
        let url = self.repo_url(repo, std::iter::once("contents").chain(path.split('/')))?;
        let mut request = self.get(url);
        if let Some(git_ref) = git_ref {
            request = request.query(&[("ref", git_ref)]);
        }

        let file: ContentFile = match self.send_json("get content", request).await {
            Ok(file) => file,
            Err(e) if has_status(&e, &[StatusCode::NOT_FOUND]) => {
                debug!("{} not found in {}", path, repo);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        decode_content(&file).map(Some)
    }

    /// Fetch a commit, `None` when the sha is unknown
    pub async fn get_commit(&self, repo: &RepoRef, sha: &str) -> Result<Option<Commit>, BotError> {
        let request = self.get(self.repo_url(repo, ["commits", sha])?);
        match self.send_json("get commit", request).await {
            Ok(commit) => Ok(Some(commit)),
            Err(e) if has_status(&e, &[StatusCode::NOT_FOUND, StatusCode::UNPROCESSABLE_ENTITY]) => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Resolve a ref such as `refs/heads/main` to the object it points to
    pub async fn get_ref(&self, repo: &RepoRef, git_ref: &str) -> Result<GitRef, BotError> {
        let short = strip_refs_prefix(git_ref);
        let url = self.repo_url(repo, ["git", "ref"].into_iter().chain(short.split('/')))?;
        let request = self.get(url);
        self.send_json("get ref", request).await
    }
}

/// Decode the body of a contents API response
pub fn decode_content(file: &ContentFile) -> Result<String, BotError> {
    let raw = file.content.as_deref().unwrap_or_default();
    match file.encoding.as_deref() {
        Some("base64") => {
            let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
            let bytes = STANDARD.decode(compact).map_err(|e| BotError::PlatformError {
                status: StatusCode::OK.as_u16(),
                message: format!("undecodable content for {}: {}", file.path, e),
            })?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        _ => Ok(raw.to_string()),
    }
}
