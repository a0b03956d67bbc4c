use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

/// Session-scoped location where the refactored tree is materialized by the
/// remote service.
pub const DEFAULT_OUTPUT_DIR: &str = "temp_refactored_repo";

/// Target Python version for refactoring and dependency validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PythonVersion {
    V3_7,
    V3_8,
    V3_9,
    V3_10,
    V3_11,
    #[default]
    V3_12,
}

impl PythonVersion {
    pub const ALL: [PythonVersion; 6] = [
        Self::V3_7,
        Self::V3_8,
        Self::V3_9,
        Self::V3_10,
        Self::V3_11,
        Self::V3_12,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V3_7 => "3.7",
            Self::V3_8 => "3.8",
            Self::V3_9 => "3.9",
            Self::V3_10 => "3.10",
            Self::V3_11 => "3.11",
            Self::V3_12 => "3.12",
        }
    }
}

impl fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PythonVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| format!("Unsupported Python version '{s}' (expected one of 3.7-3.12)"))
    }
}

/// Per-file bundle of everything the session has learned about one path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileArtifact {
    /// Lazily fetched on first selection, cached for the session lifetime.
    pub original_content: Option<String>,
    /// Result of the analyze operation; requires `original_content`.
    pub analysis: Option<String>,
    /// Populated only by a full-repository refactor run.
    pub refactored_content: Option<String>,
    /// Derived value; cleared whenever either content side changes.
    pub diff: Option<String>,
    /// Placeholder recorded when a fetch/analyze attempt failed. Cleared on
    /// the next attempt so re-selection retries from scratch.
    pub error: Option<String>,
}

/// Partial update merged into a `FileArtifact` by the store.
#[derive(Debug, Clone, Default)]
pub struct ArtifactPatch {
    pub original_content: Option<String>,
    pub analysis: Option<String>,
    pub refactored_content: Option<String>,
}

impl ArtifactPatch {
    pub fn original(content: impl Into<String>) -> Self {
        Self {
            original_content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn analysis(analysis: impl Into<String>) -> Self {
        Self {
            analysis: Some(analysis.into()),
            ..Self::default()
        }
    }

    pub fn refactored(content: impl Into<String>) -> Self {
        Self {
            refactored_content: Some(content.into()),
            ..Self::default()
        }
    }
}

/// Outcome of the most recent full-repository refactor invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunStatus {
    #[default]
    NotRun,
    Running,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineRun {
    pub status: RunStatus,
    pub output_dir: String,
    /// Processed file paths, in processing order.
    pub logs: Vec<String>,
}

impl Default for PipelineRun {
    fn default() -> Self {
        Self {
            status: RunStatus::default(),
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            logs: Vec::new(),
        }
    }
}

/// Commit / pull-request state for the publish flow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishState {
    pub source_branch: String,
    pub commit_message: String,
    pub dest_branch: String,
    pub pr_title: String,
    pub pr_body: String,
    pub last_push_message: Option<String>,
    pub last_pr_message: Option<String>,
    /// Branches that had a successful commit-and-push this session. A pull
    /// request is only permitted for a branch present here.
    pub pushed_branches: BTreeSet<String>,
}

/// Canonical snapshot of one repository session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub repo_url: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub branches: Vec<String>,
    pub python_version: PythonVersion,
    /// File inventory for the current identity. Entries ending in `/` are
    /// containers and excluded from content-bearing operations.
    pub files: Vec<String>,
    pub artifacts: HashMap<String, FileArtifact>,
    pub run: PipelineRun,
    pub publish: PublishState,
    pub installed_packages: Option<String>,
}

impl Session {
    /// File-level operations are undefined until owner, repo, and branch are
    /// all set.
    pub fn has_identity(&self) -> bool {
        !self.owner.is_empty() && !self.repo.is_empty() && !self.branch.is_empty()
    }

    /// Inventory entries that can carry content (containers excluded).
    pub fn content_paths(&self) -> Vec<String> {
        self.files
            .iter()
            .filter(|p| !is_container(p))
            .cloned()
            .collect()
    }
}

/// Inventory entries ending in a path separator denote containers.
pub(crate) fn is_container(path: &str) -> bool {
    path.ends_with('/')
}
