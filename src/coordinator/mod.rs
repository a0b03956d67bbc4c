//! Pipeline coordinator: sequences the session's dependent remote operations,
//! enforces preconditions, and caches results in the session store.
//!
//! Every operation here is an idempotent "ensure computed": it checks the
//! store for already-satisfied preconditions, issues only the missing remote
//! calls, and writes results back through the store's atomic update methods.
//! No operation retries automatically; a failed step leaves state as it was
//! before the attempt, except the per-file fetch/analyze pair, which is
//! explicitly reset so re-selection starts from scratch.

use std::sync::Arc;

use tracing::{info, warn};

use crate::client::{
    CommitPushRequest, DependencyReport, PrOutcome, PullRequestRequest, ReadmeOutcome,
    RefactorRequest, RemoteClient,
};
use crate::errors::CoordinatorError;
use crate::session::{
    ArtifactPatch, DEFAULT_OUTPUT_DIR, FileArtifact, PipelineRun, RunStatus, SessionStore,
};

/// Placeholder shown for a file whose content fetch failed.
pub const FETCH_ERROR_PLACEHOLDER: &str = "Error loading file content.";
/// Placeholder shown for a file whose analysis failed.
pub const ANALYSIS_ERROR_PLACEHOLDER: &str = "Error loading AI analysis.";

pub struct PipelineCoordinator<C: RemoteClient> {
    client: C,
    store: Arc<SessionStore>,
}

impl<C: RemoteClient> PipelineCoordinator<C> {
    pub fn new(client: C, store: Arc<SessionStore>) -> Self {
        Self { client, store }
    }

    /// The session store backing this coordinator. Stage views read
    /// snapshots through it and adjust presentation-level fields
    /// (e.g. the target Python version) directly.
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Resolve a repository URL and load its branch list.
    ///
    /// Does not pick a branch; `checkout` completes the identity.
    pub async fn connect(&self, repo_url: &str) -> Result<Vec<String>, CoordinatorError> {
        let resolved = self.client.resolve_owner_repo(repo_url).await?;
        let branches = self
            .client
            .list_branches(&resolved.owner, &resolved.repo)
            .await?;

        self.store.set_repo_url(repo_url);
        self.store.set_repository(&resolved.owner, &resolved.repo);
        self.store.set_branches(branches.clone());
        info!(owner = %resolved.owner, repo = %resolved.repo, branches = branches.len(), "connected");
        Ok(branches)
    }

    /// Set the session branch and load the file inventory for it.
    ///
    /// Completing the identity clears all artifacts and pipeline state from
    /// any previous branch.
    pub async fn checkout(&self, branch: &str) -> Result<Vec<String>, CoordinatorError> {
        let session = self.store.snapshot();
        if session.owner.is_empty() || session.repo.is_empty() {
            return Err(CoordinatorError::precondition(
                "No repository connected; resolve a repository URL first",
            ));
        }
        if branch.is_empty() {
            return Err(CoordinatorError::precondition("Branch name is empty"));
        }

        self.store.set_identity(&session.owner, &session.repo, branch);
        let files = self
            .client
            .list_files(&session.owner, &session.repo, branch)
            .await?;
        self.store.set_file_inventory(files.clone());
        info!(branch, files = files.len(), "checked out");
        Ok(files)
    }

    /// Ensure the original content and analysis for `path` are cached,
    /// fetching and analyzing only what is missing. Fetch strictly precedes
    /// analyze. On failure of either step, the artifact's fetch/analyze
    /// slice is reset to an error placeholder and the error propagates.
    pub async fn select_file(&self, path: &str) -> Result<FileArtifact, CoordinatorError> {
        let session = self.store.snapshot();
        if !session.has_identity() {
            return Err(CoordinatorError::precondition(
                "Owner, repository, and branch must all be set before file operations",
            ));
        }
        if path.ends_with('/') {
            return Err(CoordinatorError::precondition(format!(
                "'{path}' is a directory entry and carries no content"
            )));
        }
        if !session.files.iter().any(|f| f.as_str() == path) {
            return Err(CoordinatorError::precondition(format!(
                "'{path}' is not in the current file inventory"
            )));
        }

        let cached = session.artifacts.get(path);

        let content = match cached.and_then(|a| a.original_content.clone()) {
            Some(content) => content,
            None => {
                let fetched = self
                    .client
                    .read_file(&session.owner, &session.repo, &session.branch, path)
                    .await;
                match fetched {
                    Ok(content) => {
                        self.store
                            .upsert_artifact(path, ArtifactPatch::original(content.clone()));
                        content
                    }
                    Err(e) => {
                        warn!(path, error = %e, "file fetch failed");
                        self.store.set_artifact_error(path, FETCH_ERROR_PLACEHOLDER);
                        return Err(e.into());
                    }
                }
            }
        };

        let has_analysis = self
            .store
            .snapshot()
            .artifacts
            .get(path)
            .is_some_and(|a| a.analysis.is_some());
        if !has_analysis {
            match self.client.analyze(path, &content).await {
                Ok(analysis) => {
                    self.store
                        .upsert_artifact(path, ArtifactPatch::analysis(analysis));
                }
                Err(e) => {
                    warn!(path, error = %e, "file analysis failed");
                    self.store
                        .set_artifact_error(path, ANALYSIS_ERROR_PLACEHOLDER);
                    return Err(e.into());
                }
            }
        }

        Ok(self
            .store
            .snapshot()
            .artifacts
            .get(path)
            .cloned()
            .unwrap_or_default())
    }

    /// Ensure the diff for `path` is computed and cached. The computation
    /// runs at most once per (original, refactored) pair; a change to either
    /// input invalidates the cache and forces recomputation here.
    pub async fn ensure_diff(&self, path: &str) -> Result<String, CoordinatorError> {
        let artifact = self
            .store
            .snapshot()
            .artifacts
            .get(path)
            .cloned()
            .unwrap_or_default();

        if let Some(diff) = artifact.diff {
            return Ok(diff);
        }

        let (Some(original), Some(refactored)) =
            (artifact.original_content, artifact.refactored_content)
        else {
            return Err(CoordinatorError::precondition(format!(
                "Diff for '{path}' requires both original and refactored content"
            )));
        };

        let diff = self.client.diff(&original, &refactored).await?;
        // The store drops the result if either content side changed while the
        // computation was in flight; the next call recomputes from the new
        // contents.
        self.store.set_diff(path, &original, &refactored, diff.clone());
        Ok(diff)
    }

    /// Run the full-repository refactor over every content-bearing path in
    /// the inventory, then populate the artifacts' refactored content from
    /// the resulting tree.
    ///
    /// A run already in flight is rejected rather than raced. On remote
    /// failure the run is marked failed and no artifacts are touched.
    pub async fn run_refactor(&self) -> Result<PipelineRun, CoordinatorError> {
        let session = self.store.snapshot();
        if !session.has_identity() {
            return Err(CoordinatorError::precondition(
                "Owner, repository, and branch must all be set before refactoring",
            ));
        }
        let files = session.content_paths();
        if files.is_empty() {
            return Err(CoordinatorError::precondition(
                "File inventory is empty; nothing to refactor",
            ));
        }
        if session.run.status == RunStatus::Running {
            return Err(CoordinatorError::precondition(
                "A refactor run is already in flight",
            ));
        }

        self.store.record_pipeline_run(PipelineRun {
            status: RunStatus::Running,
            ..PipelineRun::default()
        });

        let request = RefactorRequest {
            owner: session.owner.clone(),
            repo: session.repo.clone(),
            branch: session.branch.clone(),
            files,
            python_version: session.python_version.as_str().to_string(),
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
        };

        let outcome = match self.client.refactor_all(&request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "refactor run failed");
                self.store.record_pipeline_run(PipelineRun {
                    status: RunStatus::Failed,
                    ..PipelineRun::default()
                });
                return Err(e.into());
            }
        };

        let run = PipelineRun {
            status: RunStatus::Succeeded,
            output_dir: outcome
                .output_dir
                .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string()),
            logs: outcome.logs,
        };
        self.store.record_pipeline_run(run.clone());
        info!(files = run.logs.len(), output_dir = %run.output_dir, "refactor run succeeded");

        // The run record never carries file content; pull the tree and store
        // it per path. Diffs against stale refactored content are cleared by
        // the upserts.
        let tree = self.client.fetch_refactored_tree().await?;
        for (path, content) in tree {
            self.store
                .upsert_artifact(&path, ArtifactPatch::refactored(content));
        }

        Ok(run)
    }

    /// Build the refactored tree's environment and record the installed
    /// packages. Requires a successful refactor run.
    pub async fn validate_dependencies(&self) -> Result<DependencyReport, CoordinatorError> {
        let session = self.store.snapshot();
        self.require_successful_run(&session.run, "Dependency validation")?;

        let report = self
            .client
            .update_dependencies(&session.run.output_dir, session.python_version.as_str())
            .await?;
        self.store
            .set_installed_packages(report.installed_packages.clone());
        info!("dependency validation succeeded");
        Ok(report)
    }

    /// Generate a README for the refactored tree. Requires a successful
    /// refactor run.
    pub async fn generate_readme(&self) -> Result<ReadmeOutcome, CoordinatorError> {
        let session = self.store.snapshot();
        self.require_successful_run(&session.run, "README generation")?;

        let outcome = self
            .client
            .generate_readme(&session.run.output_dir, session.python_version.as_str())
            .await?;
        info!("readme generation succeeded");
        Ok(outcome)
    }

    /// Commit the refactored tree and push it to `source_branch`. A
    /// successful push unlocks pull requests for that branch.
    pub async fn commit_and_push(
        &self,
        commit_message: &str,
        source_branch: &str,
        base_branch: &str,
    ) -> Result<String, CoordinatorError> {
        let session = self.store.snapshot();
        if session.owner.is_empty() || session.repo.is_empty() {
            return Err(CoordinatorError::precondition(
                "No repository connected; resolve a repository URL first",
            ));
        }
        if source_branch.is_empty() || commit_message.is_empty() {
            return Err(CoordinatorError::precondition(
                "Source branch and commit message are required",
            ));
        }

        let request = CommitPushRequest {
            owner: session.owner.clone(),
            repo: session.repo.clone(),
            commit_message: commit_message.to_string(),
            branch: source_branch.to_string(),
            base_branch: base_branch.to_string(),
        };
        let message = self.client.commit_and_push(&request).await?;
        self.store
            .record_push(source_branch, commit_message, &message);
        info!(branch = source_branch, "commit and push succeeded");
        Ok(message)
    }

    /// Open a pull request from `source_branch` into `dest_branch`.
    /// Rejected locally, before any remote call, unless `source_branch` had
    /// a successful push in this session.
    pub async fn create_pull_request(
        &self,
        source_branch: &str,
        dest_branch: &str,
        title: &str,
        body: &str,
    ) -> Result<PrOutcome, CoordinatorError> {
        if !self.store.has_pushed(source_branch) {
            return Err(CoordinatorError::precondition(format!(
                "Branch '{source_branch}' has no successful push in this session"
            )));
        }

        let session = self.store.snapshot();
        let request = PullRequestRequest {
            owner: session.owner.clone(),
            repo: session.repo.clone(),
            head_branch: source_branch.to_string(),
            base_branch: dest_branch.to_string(),
            title: title.to_string(),
            body: body.to_string(),
        };
        let outcome = self.client.create_pull_request(&request).await?;
        self.store.record_pull_request(
            source_branch,
            dest_branch,
            title,
            body,
            &outcome.display_message(),
        );
        info!(head = source_branch, base = dest_branch, "pull request created");
        Ok(outcome)
    }

    fn require_successful_run(
        &self,
        run: &PipelineRun,
        what: &str,
    ) -> Result<(), CoordinatorError> {
        match run.status {
            RunStatus::Succeeded => Ok(()),
            RunStatus::NotRun => Err(CoordinatorError::precondition(format!(
                "{what} requires a completed refactor run; none has been started"
            ))),
            RunStatus::Running => Err(CoordinatorError::precondition(format!(
                "{what} requires the refactor run to finish first"
            ))),
            RunStatus::Failed => Err(CoordinatorError::precondition(format!(
                "{what} requires a successful refactor run; the last run failed"
            ))),
        }
    }
}
