//! Deployment creation for a single target

use serde_json::{json, Value};
use tracing::{error, info, warn};

use github_models::{Commit, CreateDeploymentRequest, PullRequest};

use crate::config::resolve_config;
use crate::context::EventContext;
use crate::errors::BotError;
use crate::github::DeployOutcome;

const SHORT_SHA_LEN: usize = 7;

/// A rendered deployment request, ready to submit
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedDeployment {
    pub target: String,
    pub sha: String,
    pub request: CreateDeploymentRequest,
}

/// Deploy `target` at `sha` on the branch `git_ref`.
///
/// The deployment is always created against the ref rather than the bare sha
/// so it can later be found by branch. Conflicts (pending required checks)
/// are logged at info and returned; the next `status` or `check_run` event
/// retries the whole flow.
pub async fn deploy_commit(
    ctx: &EventContext,
    target: &str,
    git_ref: &str,
    sha: &str,
    pull_request: Option<&PullRequest>,
) -> Result<DeployOutcome, BotError> {
    let prepared = match prepare(ctx, target, git_ref, sha, pull_request).await {
        Ok(prepared) => prepared,
        Err(e) => {
            error!("[{}] Unable to prepare {} deployment of {}: {}", ctx.delivery, target, ctx.repo, e);
            return Err(e);
        }
    };
    submit(ctx, &prepared).await
}

/// Fetch the commit, resolve the target at `git_ref` and render its fields
pub async fn prepare(
    ctx: &EventContext,
    target_name: &str,
    git_ref: &str,
    sha: &str,
    pull_request: Option<&PullRequest>,
) -> Result<PreparedDeployment, BotError> {
    let commit = ctx
        .github
        .get_commit(&ctx.repo, sha)
        .await?
        .ok_or_else(|| BotError::CommitNotFound(sha.to_string()))?;

    let params = deploy_params(target_name, git_ref, &commit, pull_request)?;

    let config = resolve_config(ctx, Some(git_ref)).await?;
    let target = config
        .get(target_name)
        .ok_or_else(|| BotError::TargetNotFound(target_name.to_string()))?;

    let environment = ctx.renderer.render_str(&target.environment, &params)?;
    let description = target
        .description
        .as_deref()
        .map(|description| ctx.renderer.render_str(description, &params))
        .transpose()?;
    let payload = with_target(ctx.renderer.render_value(&target.payload, &params)?, target_name);

    Ok(PreparedDeployment {
        target: target_name.to_string(),
        sha: commit.sha,
        request: CreateDeploymentRequest {
            git_ref: git_ref.to_string(),
            task: target.task.clone(),
            auto_merge: target.auto_merge,
            payload,
            environment,
            description,
            transient_environment: target.transient_environment,
            production_environment: target.production_environment,
            required_contexts: target.required_contexts.clone(),
        },
    })
}

/// Submit a prepared deployment and classify the response
pub async fn submit(
    ctx: &EventContext,
    prepared: &PreparedDeployment,
) -> Result<DeployOutcome, BotError> {
    let request = &prepared.request;
    info!(
        "[{}] Deploying {} ({}) of {} to {}",
        ctx.delivery, prepared.target, request.git_ref, ctx.repo, request.environment
    );

    match ctx.github.create_deployment(&ctx.repo, request).await {
        Ok(DeployOutcome::Created(deployment)) => {
            info!(
                "[{}] Created deployment {} of {} to {}",
                ctx.delivery, deployment.id, prepared.target, deployment.environment
            );
            Ok(DeployOutcome::Created(deployment))
        }
        // TODO: decide how auto_merge targets should react once the platform
        // has merged the default branch into the ref
        Ok(DeployOutcome::AutoMerged { message }) => {
            warn!(
                "[{}] Deployment of {} to {} was not created, ref was auto-merged: {}",
                ctx.delivery, prepared.target, request.environment, message
            );
            Ok(DeployOutcome::AutoMerged { message })
        }
        Err(e) if e.is_conflict() => {
            info!(
                "[{}] Deployment of {} to {} is waiting on required checks: {}",
                ctx.delivery, prepared.target, request.environment, e
            );
            Err(e)
        }
        Err(e) => {
            error!(
                "[{}] Failed to create deployment of {} to {}: {}",
                ctx.delivery, prepared.target, request.environment, e
            );
            Err(e)
        }
    }
}

/// Template parameters available to environment, description and payload
pub fn deploy_params(
    target: &str,
    git_ref: &str,
    commit: &Commit,
    pull_request: Option<&PullRequest>,
) -> Result<Value, BotError> {
    let mut params = json!({
        "ref": git_ref,
        "target": target,
        "sha": commit.sha,
        "short_sha": commit.sha.chars().take(SHORT_SHA_LEN).collect::<String>(),
        "commit": serde_json::to_value(commit)?,
    });
    if let (Some(pull_request), Some(map)) = (pull_request, params.as_object_mut()) {
        map.insert("pr".to_string(), json!(pull_request.number));
        map.insert("pull_request".to_string(), serde_json::to_value(pull_request)?);
    }
    Ok(params)
}

/// Record the target name in the payload. A non-mapping payload is replaced.
fn with_target(payload: Value, target: &str) -> Value {
    match payload {
        Value::Object(mut map) => {
            map.insert("target".to_string(), Value::String(target.to_string()));
            Value::Object(map)
        }
        _ => json!({ "target": target }),
    }
}
