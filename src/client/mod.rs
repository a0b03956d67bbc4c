//! Remote operation client: one typed call per operation against the
//! code-agent service.
//!
//! The trait is the seam between the pipeline coordinator and the network.
//! Implementations carry no retry policy (that belongs to the coordinator)
//! and never touch shared session state.

mod http;
mod types;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::errors::RemoteError;

pub use http::HttpRemoteClient;
pub use types::{
    CommitPushRequest, DependencyReport, OwnerRepo, PrOutcome, PullRequestRequest,
    ReadmeOutcome, RefactorOutcome, RefactorRequest,
};

/// One method per remote operation. Every call is a suspension point and
/// produces either a typed payload or a `RemoteError`.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Resolve a repository URL into its owner/repo pair.
    async fn resolve_owner_repo(&self, repo_url: &str) -> Result<OwnerRepo, RemoteError>;

    /// List branch names for a repository.
    async fn list_branches(&self, owner: &str, repo: &str) -> Result<Vec<String>, RemoteError>;

    /// List all file paths on a branch.
    async fn list_files(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<Vec<String>, RemoteError>;

    /// Fetch the raw content of one file at a ref.
    async fn read_file(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        path: &str,
    ) -> Result<String, RemoteError>;

    /// AI analysis of a single file.
    async fn analyze(&self, path: &str, content: &str) -> Result<String, RemoteError>;

    /// Long-running whole-repository refactor. An `Ok` return means the run
    /// completed and every requested path appears in the logs; a run that
    /// processed only some files surfaces as `PartialFailure`.
    async fn refactor_all(&self, request: &RefactorRequest)
    -> Result<RefactorOutcome, RemoteError>;

    /// Refactored tree from the most recent completed run, keyed by path.
    async fn fetch_refactored_tree(&self) -> Result<HashMap<String, String>, RemoteError>;

    /// Unified diff between original and refactored content.
    async fn diff(&self, original: &str, refactored: &str) -> Result<String, RemoteError>;

    /// Build the target environment and report installed packages.
    async fn update_dependencies(
        &self,
        output_dir: &str,
        python_version: &str,
    ) -> Result<DependencyReport, RemoteError>;

    /// Generate a README for the refactored tree.
    async fn generate_readme(
        &self,
        output_dir: &str,
        python_version: &str,
    ) -> Result<ReadmeOutcome, RemoteError>;

    /// Commit the refactored tree and push it to `source_branch`. Returns the
    /// service's status message.
    async fn commit_and_push(&self, request: &CommitPushRequest) -> Result<String, RemoteError>;

    /// Open a pull request from `head_branch` into `base_branch`.
    async fn create_pull_request(
        &self,
        request: &PullRequestRequest,
    ) -> Result<PrOutcome, RemoteError>;
}
