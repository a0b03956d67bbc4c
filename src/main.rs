use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use codeagent::client::HttpRemoteClient;
use codeagent::config::Config;
use codeagent::coordinator::PipelineCoordinator;
use codeagent::session::{PythonVersion, SessionStore};

mod cmd;

#[derive(Parser)]
#[command(name = "codeagent")]
#[command(version, about = "AI-assisted repository refactoring orchestrator")]
pub struct Cli {
    /// Base URL of the code-agent service. Overrides CODEAGENT_API_BASE_URL.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the branches of a repository
    Branches {
        /// Repository URL, e.g. https://github.com/owner/repo
        #[arg(long)]
        repo_url: String,
    },
    /// List the files on a branch
    Files {
        #[arg(long)]
        repo_url: String,
        #[arg(long)]
        branch: String,
    },
    /// Fetch a file and show its AI analysis
    Analyze {
        #[arg(long)]
        repo_url: String,
        #[arg(long)]
        branch: String,
        /// Path of the file within the repository
        #[arg(long)]
        file: String,
    },
    /// Refactor the whole repository, optionally validating dependencies
    /// and generating a README afterwards
    Refactor {
        #[arg(long)]
        repo_url: String,
        #[arg(long)]
        branch: String,
        /// Target Python version (3.7 through 3.12)
        #[arg(long, default_value = "3.12")]
        python_version: PythonVersion,
        /// Show per-file diffs for refactored files
        #[arg(long)]
        diffs: bool,
        /// Validate the refactored tree's dependencies after the run
        #[arg(long)]
        validate_deps: bool,
        /// Generate a README for the refactored tree after the run
        #[arg(long)]
        readme: bool,
    },
    /// Commit the refactored tree, push it, and optionally open a PR
    Publish {
        #[arg(long)]
        repo_url: String,
        /// Branch to push the refactored tree to
        #[arg(long)]
        source_branch: String,
        /// Branch the pull request targets
        #[arg(long, default_value = "main")]
        dest_branch: String,
        /// Commit message
        #[arg(long)]
        message: String,
        /// Open a pull request after a successful push
        #[arg(long)]
        pr: bool,
        #[arg(long, default_value = "CodeAgent Auto PR")]
        pr_title: String,
        #[arg(long, default_value = "This PR includes automatic refactored code updates.")]
        pr_body: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(base_url) = &cli.base_url {
        config = Config::new(base_url.clone(), config.request_timeout);
    }

    let client = HttpRemoteClient::new(config)?;
    let coordinator = PipelineCoordinator::new(client, std::sync::Arc::new(SessionStore::new()));

    match &cli.command {
        Commands::Branches { repo_url } => cmd::cmd_branches(&coordinator, repo_url).await?,
        Commands::Files { repo_url, branch } => {
            cmd::cmd_files(&coordinator, repo_url, branch).await?;
        }
        Commands::Analyze {
            repo_url,
            branch,
            file,
        } => cmd::cmd_analyze(&coordinator, repo_url, branch, file).await?,
        Commands::Refactor {
            repo_url,
            branch,
            python_version,
            diffs,
            validate_deps,
            readme,
        } => {
            cmd::cmd_refactor(
                &coordinator,
                repo_url,
                branch,
                *python_version,
                *diffs,
                *validate_deps,
                *readme,
            )
            .await?;
        }
        Commands::Publish {
            repo_url,
            source_branch,
            dest_branch,
            message,
            pr,
            pr_title,
            pr_body,
        } => {
            cmd::cmd_publish(
                &coordinator,
                repo_url,
                source_branch,
                dest_branch,
                message,
                *pr,
                pr_title,
                pr_body,
            )
            .await?;
        }
    }

    Ok(())
}
