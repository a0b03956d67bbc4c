//! Refactor stage: the full-repository run, plus the dependency-validation
//! and README stages that are gated on its success.

use anyhow::Result;
use console::style;

use codeagent::client::RemoteClient;
use codeagent::coordinator::PipelineCoordinator;
use codeagent::session::PythonVersion;

use super::stage_error;

#[allow(clippy::too_many_arguments)]
pub async fn cmd_refactor<C: RemoteClient>(
    coordinator: &PipelineCoordinator<C>,
    repo_url: &str,
    branch: &str,
    python_version: PythonVersion,
    show_diffs: bool,
    validate_deps: bool,
    readme: bool,
) -> Result<()> {
    coordinator.connect(repo_url).await.map_err(stage_error)?;
    coordinator.checkout(branch).await.map_err(stage_error)?;
    coordinator.store().set_python_version(python_version);

    println!(
        "Refactoring {} for Python {}...",
        style(repo_url).cyan(),
        python_version
    );
    let run = coordinator.run_refactor().await.map_err(stage_error)?;

    println!("{}", style("Refactoring completed successfully").green());
    println!("Output directory: {}", style(&run.output_dir).yellow());
    println!("{}", style("Refactored files:").bold());
    for entry in &run.logs {
        println!("  {entry}");
    }

    if show_diffs {
        let session = coordinator.store().snapshot();
        let mut refactored: Vec<&String> = session
            .artifacts
            .iter()
            .filter(|(_, a)| a.refactored_content.is_some())
            .map(|(path, _)| path)
            .collect();
        refactored.sort();
        for path in refactored {
            // Diffs need the original too; fetch it on demand.
            coordinator.select_file(path).await.map_err(stage_error)?;
            let diff = coordinator.ensure_diff(path).await.map_err(stage_error)?;
            println!();
            println!("{} {path}", style("Diff:").bold().yellow());
            println!("{diff}");
        }
    }

    if validate_deps {
        let report = coordinator
            .validate_dependencies()
            .await
            .map_err(stage_error)?;
        println!();
        println!("{} {}", style("Dependencies:").bold(), report.message);
        if !report.installed_packages.is_empty() {
            println!("{}", report.installed_packages);
        }
    }

    if readme {
        let outcome = coordinator.generate_readme().await.map_err(stage_error)?;
        println!();
        println!("{} {}", style("README:").bold(), outcome.message);
    }

    Ok(())
}
