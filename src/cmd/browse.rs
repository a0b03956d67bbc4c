//! Browse and analyze stages: branch listing, file inventory, and per-file
//! content + AI analysis.

use anyhow::Result;
use console::style;

use codeagent::client::RemoteClient;
use codeagent::coordinator::PipelineCoordinator;

use super::stage_error;

pub async fn cmd_branches<C: RemoteClient>(
    coordinator: &PipelineCoordinator<C>,
    repo_url: &str,
) -> Result<()> {
    let branches = coordinator.connect(repo_url).await.map_err(stage_error)?;

    let session = coordinator.store().snapshot();
    println!(
        "{} {}/{}",
        style("Repository:").bold(),
        session.owner,
        session.repo
    );
    for branch in branches {
        println!("  {branch}");
    }
    Ok(())
}

pub async fn cmd_files<C: RemoteClient>(
    coordinator: &PipelineCoordinator<C>,
    repo_url: &str,
    branch: &str,
) -> Result<()> {
    coordinator.connect(repo_url).await.map_err(stage_error)?;
    let files = coordinator.checkout(branch).await.map_err(stage_error)?;

    println!(
        "{} {} file(s) on {}",
        style("Inventory:").bold(),
        files.len(),
        branch
    );
    for file in files {
        println!("  {file}");
    }
    Ok(())
}

pub async fn cmd_analyze<C: RemoteClient>(
    coordinator: &PipelineCoordinator<C>,
    repo_url: &str,
    branch: &str,
    file: &str,
) -> Result<()> {
    coordinator.connect(repo_url).await.map_err(stage_error)?;
    coordinator.checkout(branch).await.map_err(stage_error)?;
    let artifact = coordinator.select_file(file).await.map_err(stage_error)?;

    println!("{} {file}", style("File:").bold().blue());
    if let Some(content) = &artifact.original_content {
        println!("{content}");
    }
    println!();
    println!("{}", style("AI analysis").bold().magenta());
    if let Some(analysis) = &artifact.analysis {
        println!("{analysis}");
    } else {
        println!("No analysis available.");
    }
    Ok(())
}
