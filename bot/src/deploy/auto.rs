//! Automatic deploys on pushes and passing checks

use futures::future::join_all;
use tracing::{debug, error, info};

use crate::config::{resolve_config, Target};
use crate::context::EventContext;
use crate::deploy::committer::{prepare, submit};
use crate::deploy::lock::{KeyedLock, LockKey};
use crate::errors::BotError;
use crate::github::{DeployOutcome, DeploymentFilter};

/// What happened to one auto-deploy target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetOutcome {
    Deployed,
    AutoMerged,
    AlreadyDeployed,
    Failed(String),
}

/// Result of one scan, per target name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub outcomes: Vec<(String, TargetOutcome)>,
}

impl ScanReport {
    pub fn count(&self, wanted: fn(&TargetOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, outcome)| wanted(outcome)).count()
    }

    pub fn deployed(&self) -> usize {
        self.count(|o| matches!(o, TargetOutcome::Deployed))
    }

    pub fn already_deployed(&self) -> usize {
        self.count(|o| matches!(o, TargetOutcome::AlreadyDeployed))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, TargetOutcome::Failed(_)))
    }
}

/// Run [`auto_deploy`] under the single-flight lock for this repository and ref
pub async fn auto_deploy_locked(ctx: &EventContext, lock: &KeyedLock, git_ref: &str) -> ScanReport {
    let key = LockKey::auto_deploy(ctx.repo.id, git_ref);
    lock.lock(&key, || auto_deploy(ctx, git_ref)).await
}

/// Deploy every target whose `auto_deploy_on` matches `git_ref`, unless the
/// commit the ref points to is already deployed to the target's environment.
///
/// The config always comes from the default branch. Failures are logged per
/// target and never stop the other targets.
pub async fn auto_deploy(ctx: &EventContext, git_ref: &str) -> ScanReport {
    let config = match resolve_config(ctx, None).await {
        Ok(config) => config,
        Err(e) if e.is_config_not_found() => {
            info!("[{}] No deploy config in {}, skipping auto-deploy: {}", ctx.delivery, ctx.repo, e);
            return ScanReport::default();
        }
        Err(e) => {
            error!("[{}] Unable to load deploy config for {}: {}", ctx.delivery, ctx.repo, e);
            return ScanReport::default();
        }
    };

    let targets: Vec<&Target> = config.auto_deploy_targets(git_ref).collect();
    if targets.is_empty() {
        debug!("[{}] No target auto-deploys on {} in {}", ctx.delivery, git_ref, ctx.repo);
        return ScanReport::default();
    }

    let results = join_all(targets.iter().map(|target| async move {
        let outcome = match evaluate_target(ctx, target, git_ref).await {
            Ok(outcome) => outcome,
            Err(e) => {
                if e.is_conflict() {
                    info!("[{}] Auto-deploy of {} deferred: {}", ctx.delivery, target.name, e);
                } else {
                    error!("[{}] Auto-deploy of {} failed: {}", ctx.delivery, target.name, e);
                }
                TargetOutcome::Failed(e.to_string())
            }
        };
        (target.name.clone(), outcome)
    }))
    .await;

    let report = ScanReport { outcomes: results };
    info!(
        "[{}] Auto-deploy on {} in {}: {} deployed, {} already deployed, {} failed",
        ctx.delivery,
        git_ref,
        ctx.repo,
        report.deployed(),
        report.already_deployed(),
        report.failed()
    );
    report
}

async fn evaluate_target(
    ctx: &EventContext,
    target: &Target,
    git_ref: &str,
) -> Result<TargetOutcome, BotError> {
    let sha = ctx.github.get_ref(&ctx.repo, git_ref).await?.object.sha;
    let prepared = prepare(ctx, &target.name, git_ref, &sha, None).await?;

    let existing = ctx
        .github
        .list_deployments(&ctx.repo, &DeploymentFilter::by_sha(&sha))
        .await?;
    if existing
        .iter()
        .any(|deployment| deployment.environment == prepared.request.environment)
    {
        info!(
            "[{}] {} is already deployed to {}, skipping {}",
            ctx.delivery, sha, prepared.request.environment, target.name
        );
        return Ok(TargetOutcome::AlreadyDeployed);
    }

    match submit(ctx, &prepared).await? {
        DeployOutcome::Created(_) => Ok(TargetOutcome::Deployed),
        DeployOutcome::AutoMerged { .. } => Ok(TargetOutcome::AutoMerged),
    }
}
