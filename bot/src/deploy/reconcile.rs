//! Teardown of transient environments when a pull request closes

use std::collections::HashSet;

use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, error, info};

use github_models::{CreateDeploymentRequest, Deployment, DeploymentState};

use crate::context::EventContext;
use crate::errors::BotError;
use crate::github::{DeployOutcome, DeploymentFilter};

/// Task name of the deployments that tear an environment down
pub const REMOVE_TASK: &str = "remove";

/// Summary of one reconciliation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Deployments marked inactive
    pub marked_inactive: Vec<u64>,
    pub mark_failures: usize,
    /// Environments a removal was created for
    pub removed: Vec<String>,
    pub removal_failures: usize,
}

/// Mark every transient deployment of the closed branch inactive and issue one
/// removal per environment, based on that environment's newest deployment.
///
/// Removals target `head_sha` because the branch may be gone after a merge.
/// Errors are logged per deployment and never abort the rest.
pub async fn reconcile_closed_pull_request(
    ctx: &EventContext,
    head_ref: &str,
    head_sha: &str,
) -> Result<ReconcileReport, BotError> {
    let mut deployments = ctx
        .github
        .list_deployments(&ctx.repo, &DeploymentFilter::by_ref(head_ref))
        .await?;
    newest_first(&mut deployments);

    let transient: Vec<&Deployment> = deployments
        .iter()
        .filter(|deployment| deployment.transient_environment)
        .collect();
    debug!(
        "[{}] {} of {} deployments on {} are transient",
        ctx.delivery,
        transient.len(),
        deployments.len(),
        head_ref
    );

    let mut report = ReconcileReport::default();

    let marks = join_all(transient.iter().map(|deployment| async move {
        let result = ctx
            .github
            .create_deployment_status(&ctx.repo, deployment.id, DeploymentState::Inactive)
            .await;
        if let Err(e) = &result {
            error!(
                "[{}] Unable to mark deployment {} inactive: {}",
                ctx.delivery, deployment.id, e
            );
        }
        (deployment.id, result.is_ok())
    }))
    .await;
    for (id, ok) in marks {
        if ok {
            report.marked_inactive.push(id);
        } else {
            report.mark_failures += 1;
        }
    }

    let representatives = newest_per_environment(&transient);
    let removals = join_all(representatives.iter().map(|deployment| async move {
        let request = removal_request(deployment, head_sha);
        let result = ctx.github.create_deployment(&ctx.repo, &request).await;
        match &result {
            Ok(DeployOutcome::Created(created)) => info!(
                "[{}] Created removal deployment {} for {}",
                ctx.delivery, created.id, deployment.environment
            ),
            Ok(DeployOutcome::AutoMerged { message }) => info!(
                "[{}] Removal for {} was not created: {}",
                ctx.delivery, deployment.environment, message
            ),
            Err(e) => error!(
                "[{}] Unable to create removal for {}: {}",
                ctx.delivery, deployment.environment, e
            ),
        }
        (deployment.environment.clone(), result.is_ok())
    }))
    .await;
    for (environment, ok) in removals {
        if ok {
            report.removed.push(environment);
        } else {
            report.removal_failures += 1;
        }
    }

    info!(
        "[{}] Reconciled {} in {}: {} marked inactive, {} environments removed",
        ctx.delivery,
        head_ref,
        ctx.repo,
        report.marked_inactive.len(),
        report.removed.len()
    );
    Ok(report)
}

/// Sort newest first, by creation time then id
fn newest_first(deployments: &mut [Deployment]) {
    deployments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

/// The first deployment seen for each environment, in input order
fn newest_per_environment<'a>(deployments: &[&'a Deployment]) -> Vec<&'a Deployment> {
    let mut seen = HashSet::new();
    let mut picked = Vec::new();
    for &deployment in deployments {
        if seen.insert(deployment.environment.as_str()) {
            picked.push(deployment);
        }
    }
    picked
}

/// Removal for an environment, copying the representative's payload verbatim
pub fn removal_request(deployment: &Deployment, head_sha: &str) -> CreateDeploymentRequest {
    CreateDeploymentRequest {
        git_ref: head_sha.to_string(),
        task: REMOVE_TASK.to_string(),
        auto_merge: false,
        payload: match &deployment.payload {
            Value::Null => Value::Object(serde_json::Map::new()),
            payload => payload.clone(),
        },
        environment: deployment.environment.clone(),
        description: deployment.description.clone(),
        transient_environment: deployment.transient_environment,
        production_environment: deployment.production_environment,
        required_contexts: Vec::new(),
    }
}
