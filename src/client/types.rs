//! Wire types for the code-agent service. Field names mirror the service's
//! JSON bodies exactly.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Owner/repo pair resolved from a repository URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerRepo {
    pub owner: String,
    pub repo: String,
}

/// Body of the full-repository refactor request.
#[derive(Debug, Clone, Serialize)]
pub struct RefactorRequest {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub files: Vec<String>,
    pub python_version: String,
    pub output_dir: String,
}

/// Response of the full-repository refactor request.
#[derive(Debug, Clone, Deserialize)]
pub struct RefactorOutcome {
    pub success: bool,
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub logs: Vec<String>,
}

/// Response wrapper of the refactored-tree endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct RefactoredTreeResponse {
    pub files: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct FileAnalysisRequest<'a> {
    pub file_path: &'a str,
    pub code_content: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CodeDiffRequest<'a> {
    pub old_code: &'a str,
    pub refactored_code: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct DependencyRequest<'a> {
    pub root_dir: &'a str,
    pub python_version: &'a str,
}

/// Result of the dependency-validation operation.
#[derive(Debug, Clone, Deserialize)]
pub struct DependencyReport {
    pub message: String,
    #[serde(default)]
    pub installed_packages: String,
}

/// Result of README generation.
#[derive(Debug, Clone, Deserialize)]
pub struct ReadmeOutcome {
    pub message: String,
}

/// Body of the commit-and-push request.
#[derive(Debug, Clone, Serialize)]
pub struct CommitPushRequest {
    pub owner: String,
    pub repo: String,
    pub commit_message: String,
    pub branch: String,
    pub base_branch: String,
}

/// Body of the pull-request creation request.
#[derive(Debug, Clone, Serialize)]
pub struct PullRequestRequest {
    pub owner: String,
    pub repo: String,
    pub head_branch: String,
    pub base_branch: String,
    pub title: String,
    pub body: String,
}

/// Result of pull-request creation.
#[derive(Debug, Clone, Deserialize)]
pub struct PrOutcome {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl PrOutcome {
    /// Human-readable summary for stage views.
    pub fn display_message(&self) -> String {
        match (&self.url, &self.message) {
            (Some(url), _) if self.success => format!("PR created: {url}"),
            (_, Some(message)) => message.clone(),
            (Some(url), None) => url.clone(),
            (None, None) => "Pull request request returned no message".to_string(),
        }
    }
}
