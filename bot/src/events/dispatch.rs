//! Routing of parsed webhook events to the deploy components

use futures::future::join_all;
use tracing::{debug, error, info};

use webhook_events::{
    CheckRunEvent, IssueCommentEvent, PullRequestEvent, PushEvent, Repository, StatusEvent,
    WebhookEvent,
};

use crate::app::state::AppState;
use crate::context::EventContext;
use crate::deploy::auto::{auto_deploy_locked, ScanReport};
use crate::deploy::command::{handle_deploy_comment, is_deploy_command, CommandOutcome};
use crate::deploy::reconcile::{reconcile_closed_pull_request, ReconcileReport};
use crate::github::RepoRef;

/// What a delivery was turned into
#[derive(Debug)]
pub enum Dispatched {
    AutoDeploy(Vec<ScanReport>),
    Command(CommandOutcome),
    Reconciled(ReconcileReport),
    ReconcileFailed(String),
    Ignored(&'static str),
}

/// Handle one webhook delivery
pub async fn dispatch(state: &AppState, delivery: &str, event: WebhookEvent) -> Dispatched {
    state.activity_tracker.touch();

    let Some(repository) = event.repository() else {
        debug!("[{}] Ignoring {} event", delivery, event.name());
        return Dispatched::Ignored("unsupported event");
    };
    let ctx = event_context(state, delivery, repository);

    match event {
        WebhookEvent::Push(push) => on_push(state, &ctx, push).await,
        WebhookEvent::Status(status) => on_status(state, &ctx, status).await,
        WebhookEvent::CheckRun(check_run) => on_check_run(state, &ctx, check_run).await,
        WebhookEvent::IssueComment(comment) => on_issue_comment(&ctx, comment).await,
        WebhookEvent::PullRequest(pull_request) => on_pull_request(&ctx, pull_request).await,
        WebhookEvent::Other(_) => Dispatched::Ignored("unsupported event"),
    }
}

fn event_context(state: &AppState, delivery: &str, repository: &Repository) -> EventContext {
    EventContext::new(
        RepoRef::new(repository.id, &repository.owner.login, &repository.name),
        state.github.clone(),
        state.renderer.clone(),
        delivery,
    )
}

async fn auto_deploy_refs(state: &AppState, ctx: &EventContext, refs: &[String]) -> Dispatched {
    let reports = join_all(
        refs.iter()
            .map(|git_ref| auto_deploy_locked(ctx, &state.deploy_lock, git_ref)),
    )
    .await;
    Dispatched::AutoDeploy(reports)
}

async fn on_push(state: &AppState, ctx: &EventContext, push: PushEvent) -> Dispatched {
    if push.deleted {
        return Dispatched::Ignored("branch deleted");
    }
    info!("[{}] Push to {} in {}", ctx.delivery, push.git_ref, ctx.repo);
    auto_deploy_refs(state, ctx, &[push.git_ref]).await
}

async fn on_status(state: &AppState, ctx: &EventContext, status: StatusEvent) -> Dispatched {
    if status.state != "success" {
        return Dispatched::Ignored("status is not success");
    }
    let refs: Vec<String> = status
        .branches
        .iter()
        .map(|branch| branch_ref(&branch.name))
        .collect();
    info!(
        "[{}] Status success for {} on {} branches in {}",
        ctx.delivery,
        status.sha,
        refs.len(),
        ctx.repo
    );
    auto_deploy_refs(state, ctx, &refs).await
}

async fn on_check_run(state: &AppState, ctx: &EventContext, event: CheckRunEvent) -> Dispatched {
    if event.check_run.status != "completed" {
        return Dispatched::Ignored("check run not completed");
    }
    let Some(branch) = event.check_run.check_suite.head_branch.as_deref() else {
        return Dispatched::Ignored("check run has no head branch");
    };
    info!("[{}] Check run completed on {} in {}", ctx.delivery, branch, ctx.repo);
    auto_deploy_refs(state, ctx, &[branch_ref(branch)]).await
}

async fn on_issue_comment(ctx: &EventContext, event: IssueCommentEvent) -> Dispatched {
    if event.action != "created" {
        return Dispatched::Ignored("comment not created");
    }
    if event.issue.pull_request.is_none() {
        return Dispatched::Ignored("comment is not on a pull request");
    }
    if !is_deploy_command(&event.comment.body) {
        return Dispatched::Ignored("comment is not a command");
    }
    info!(
        "[{}] {} commented on #{} in {}: {}",
        ctx.delivery,
        event.comment.user.login,
        event.issue.number,
        ctx.repo,
        event.comment.body.trim()
    );
    let outcome = handle_deploy_comment(
        ctx,
        event.issue.number,
        &event.comment.user.login,
        &event.comment.body,
    )
    .await;
    Dispatched::Command(outcome)
}

async fn on_pull_request(ctx: &EventContext, event: PullRequestEvent) -> Dispatched {
    if event.action != "closed" {
        return Dispatched::Ignored("pull request not closed");
    }
    let head = &event.pull_request.head;
    info!(
        "[{}] Pull request #{} closed in {}, reconciling {}",
        ctx.delivery, event.number, ctx.repo, head.git_ref
    );
    match reconcile_closed_pull_request(ctx, &head.git_ref, &head.sha).await {
        Ok(report) => Dispatched::Reconciled(report),
        Err(e) => {
            error!(
                "[{}] Unable to reconcile #{} in {}: {}",
                ctx.delivery, event.number, ctx.repo, e
            );
            Dispatched::ReconcileFailed(e.to_string())
        }
    }
}

fn branch_ref(branch: &str) -> String {
    if branch.starts_with("refs/") {
        branch.to_string()
    } else {
        format!("refs/heads/{}", branch)
    }
}
