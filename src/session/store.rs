use std::sync::{PoisonError, RwLock};

use tracing::debug;

use super::types::{ArtifactPatch, PipelineRun, PublishState, PythonVersion, Session};

/// The single mutable source of truth for one repository session.
///
/// Every update method is atomic with respect to readers: a snapshot taken
/// between two updates never observes a partially-written artifact. Updates
/// for different paths commute; updates for the same path are serialized by
/// the write lock, so a late read-modify-write cannot clobber fields written
/// by an earlier one.
#[derive(Debug, Default)]
pub struct SessionStore {
    inner: RwLock<Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Owned, immutable snapshot of the current session.
    pub fn snapshot(&self) -> Session {
        self.read(|s| s.clone())
    }

    /// Replace the session identity and drop all state derived from the
    /// previous one: inventory, artifacts, and pipeline run. Stale data from
    /// a prior repository must never leak across an identity change.
    pub fn set_identity(
        &self,
        owner: impl Into<String>,
        repo: impl Into<String>,
        branch: impl Into<String>,
    ) {
        self.write(|s| {
            s.owner = owner.into();
            s.repo = repo.into();
            s.branch = branch.into();
            s.files.clear();
            s.artifacts.clear();
            s.run = PipelineRun::default();
            debug!(owner = %s.owner, repo = %s.repo, branch = %s.branch, "session identity set");
        });
    }

    pub fn set_repo_url(&self, url: impl Into<String>) {
        self.write(|s| s.repo_url = url.into());
    }

    /// Record the resolved owner/repo pair before a branch is chosen. A new
    /// pair invalidates everything branch-scoped, including the branch list.
    pub fn set_repository(&self, owner: impl Into<String>, repo: impl Into<String>) {
        self.write(|s| {
            let owner = owner.into();
            let repo = repo.into();
            if owner != s.owner || repo != s.repo {
                s.branch.clear();
                s.branches.clear();
                s.files.clear();
                s.artifacts.clear();
                s.run = PipelineRun::default();
            }
            s.owner = owner;
            s.repo = repo;
        });
    }

    pub fn set_branches(&self, branches: Vec<String>) {
        self.write(|s| s.branches = branches);
    }

    pub fn set_python_version(&self, version: PythonVersion) {
        self.write(|s| s.python_version = version);
    }

    /// Wholesale replacement; the inventory is never incrementally patched.
    pub fn set_file_inventory(&self, paths: Vec<String>) {
        self.write(|s| s.files = paths);
    }

    /// Merge the patch into the artifact at `path`. If either content side
    /// changes, the stored diff for that path is cleared in the same update.
    /// Writing any content also clears a previous fetch-error placeholder.
    pub fn upsert_artifact(&self, path: &str, patch: ArtifactPatch) {
        self.write(|s| {
            let artifact = s.artifacts.entry(path.to_string()).or_default();
            let invalidates_diff =
                patch.original_content.is_some() || patch.refactored_content.is_some();
            if let Some(content) = patch.original_content {
                artifact.original_content = Some(content);
                artifact.error = None;
            }
            if let Some(analysis) = patch.analysis {
                artifact.analysis = Some(analysis);
                artifact.error = None;
            }
            if let Some(content) = patch.refactored_content {
                artifact.refactored_content = Some(content);
                artifact.error = None;
            }
            if invalidates_diff {
                artifact.diff = None;
            }
        });
    }

    /// Record a failed fetch/analyze attempt. The fetch/analyze slice of the
    /// artifact is dropped entirely (no partial caching, so re-selection
    /// retries from scratch); refactored content belongs to the refactor
    /// stage and survives.
    pub fn set_artifact_error(&self, path: &str, message: impl Into<String>) {
        self.write(|s| {
            let artifact = s.artifacts.entry(path.to_string()).or_default();
            artifact.original_content = None;
            artifact.analysis = None;
            artifact.diff = None;
            artifact.error = Some(message.into());
        });
    }

    /// Cache a computed diff, keyed by the contents it was derived from.
    /// A no-op if either content side changed while the computation was in
    /// flight (or the artifact vanished entirely): the concurrent write
    /// already invalidated this result, and storing it would resurrect a
    /// stale diff.
    pub fn set_diff(&self, path: &str, original: &str, refactored: &str, diff: impl Into<String>) {
        self.write(|s| {
            if let Some(artifact) = s.artifacts.get_mut(path)
                && artifact.original_content.as_deref() == Some(original)
                && artifact.refactored_content.as_deref() == Some(refactored)
            {
                artifact.diff = Some(diff.into());
            }
        });
    }

    /// Replace the pipeline-run record. Does not touch artifacts; callers
    /// fetch and store the refactored tree separately.
    pub fn record_pipeline_run(&self, run: PipelineRun) {
        self.write(|s| s.run = run);
    }

    /// Replaced, not merged, on every validation run.
    pub fn set_installed_packages(&self, packages: impl Into<String>) {
        self.write(|s| s.installed_packages = Some(packages.into()));
    }

    /// Record a successful commit-and-push, unlocking pull requests for
    /// `source_branch`.
    pub fn record_push(&self, source_branch: &str, commit_message: &str, message: &str) {
        self.write(|s| {
            s.publish.source_branch = source_branch.to_string();
            s.publish.commit_message = commit_message.to_string();
            s.publish.last_push_message = Some(message.to_string());
            s.publish.pushed_branches.insert(source_branch.to_string());
        });
    }

    /// Record the outcome of a pull-request creation.
    pub fn record_pull_request(
        &self,
        source: &str,
        dest: &str,
        title: &str,
        body: &str,
        message: &str,
    ) {
        self.write(|s| {
            s.publish.source_branch = source.to_string();
            s.publish.dest_branch = dest.to_string();
            s.publish.pr_title = title.to_string();
            s.publish.pr_body = body.to_string();
            s.publish.last_pr_message = Some(message.to_string());
        });
    }

    pub fn has_pushed(&self, branch: &str) -> bool {
        self.read(|s| s.publish.pushed_branches.contains(branch))
    }

    pub fn publish_state(&self) -> PublishState {
        self.read(|s| s.publish.clone())
    }

    fn read<R>(&self, f: impl FnOnce(&Session) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn write<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}
