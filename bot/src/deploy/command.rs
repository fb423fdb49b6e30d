//! `/deploy <target>` pull request comments

use tracing::{error, info};

use crate::context::EventContext;
use crate::deploy::committer::deploy_commit;
use crate::errors::BotError;
use crate::github::DeployOutcome;

/// Comment prefix that triggers a manual deploy
pub const DEPLOY_COMMAND: &str = "/deploy";

/// A parsed `/deploy` command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployCommand {
    /// Second whitespace-separated token, empty when missing
    pub target: String,
}

/// Whether a comment body is addressed to this service
pub fn is_deploy_command(body: &str) -> bool {
    body.trim_start().starts_with(DEPLOY_COMMAND)
}

/// Parse `/deploy <target>`. Returns `None` when the first token is not the
/// command. A missing target yields an empty name, which no config contains.
pub fn parse_deploy_command(body: &str) -> Option<DeployCommand> {
    let mut tokens = body.split_whitespace();
    if tokens.next()? != DEPLOY_COMMAND {
        return None;
    }
    Some(DeployCommand {
        target: tokens.next().unwrap_or_default().to_string(),
    })
}

/// What a comment led to
#[derive(Debug, Clone)]
pub enum CommandOutcome {
    Ignored,
    PermissionDenied,
    Deployed(DeployOutcome),
    /// The error was reported back on the pull request
    Failed(String),
}

/// Handle a `/deploy` comment left by `author` on pull request `number`.
/// Failures are posted back as a comment instead of being returned.
pub async fn handle_deploy_comment(
    ctx: &EventContext,
    number: u64,
    author: &str,
    body: &str,
) -> CommandOutcome {
    let Some(command) = parse_deploy_command(body) else {
        return CommandOutcome::Ignored;
    };

    match run_command(ctx, number, author, &command).await {
        Ok(Some(outcome)) => CommandOutcome::Deployed(outcome),
        Ok(None) => CommandOutcome::PermissionDenied,
        Err(e) => {
            let message = e.to_string();
            info!(
                "[{}] /deploy {} on #{} failed, reporting back: {}",
                ctx.delivery, command.target, number, message
            );
            if let Err(comment_err) = ctx
                .github
                .create_issue_comment(&ctx.repo, number, &message)
                .await
            {
                error!(
                    "[{}] Unable to comment on #{} in {}: {}",
                    ctx.delivery, number, ctx.repo, comment_err
                );
            }
            CommandOutcome::Failed(message)
        }
    }
}

async fn run_command(
    ctx: &EventContext,
    number: u64,
    author: &str,
    command: &DeployCommand,
) -> Result<Option<DeployOutcome>, BotError> {
    let permission = ctx
        .github
        .get_collaborator_permission(&ctx.repo, author)
        .await?;
    if !permission.can_write() {
        info!(
            "[{}] {} has {} access to {}, ignoring /deploy",
            ctx.delivery, author, permission.permission, ctx.repo
        );
        return Ok(None);
    }

    let pull_request = ctx.github.get_pull_request(&ctx.repo, number).await?;
    let outcome = deploy_commit(
        ctx,
        &command.target,
        &pull_request.head.git_ref,
        &pull_request.head.sha,
        Some(&pull_request),
    )
    .await?;
    Ok(Some(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_deploy_command() {
        assert_eq!(
            parse_deploy_command("/deploy staging"),
            Some(DeployCommand {
                target: "staging".to_string()
            })
        );
        assert_eq!(
            parse_deploy_command("  /deploy   review  please\n"),
            Some(DeployCommand {
                target: "review".to_string()
            })
        );
    }

    #[test]
    fn test_parse_missing_target() {
        assert_eq!(
            parse_deploy_command("/deploy"),
            Some(DeployCommand {
                target: String::new()
            })
        );
    }

    #[test]
    fn test_parse_other_comments() {
        assert_eq!(parse_deploy_command("LGTM"), None);
        assert_eq!(parse_deploy_command(""), None);
        assert_eq!(parse_deploy_command("/deployment staging"), None);
        assert_eq!(parse_deploy_command("please /deploy staging"), None);
    }

    #[test]
    fn test_is_deploy_command() {
        assert!(is_deploy_command("/deploy prod"));
        assert!(is_deploy_command("\n/deploy"));
        assert!(!is_deploy_command("deploy prod"));
    }
}
