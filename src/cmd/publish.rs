//! Publish stage: commit-and-push, then the pull request it unlocks.

use anyhow::Result;
use console::style;

use codeagent::client::RemoteClient;
use codeagent::coordinator::PipelineCoordinator;

use super::stage_error;

#[allow(clippy::too_many_arguments)]
pub async fn cmd_publish<C: RemoteClient>(
    coordinator: &PipelineCoordinator<C>,
    repo_url: &str,
    source_branch: &str,
    dest_branch: &str,
    message: &str,
    open_pr: bool,
    pr_title: &str,
    pr_body: &str,
) -> Result<()> {
    coordinator.connect(repo_url).await.map_err(stage_error)?;

    let push_message = coordinator
        .commit_and_push(message, source_branch, dest_branch)
        .await
        .map_err(stage_error)?;
    println!("{} {push_message}", style("Push:").bold().green());

    if open_pr {
        let outcome = coordinator
            .create_pull_request(source_branch, dest_branch, pr_title, pr_body)
            .await
            .map_err(stage_error)?;
        println!("{} {}", style("PR:").bold().green(), outcome.display_message());
    }

    Ok(())
}
