//! Integration tests for the session workflow orchestrator.
//!
//! The end-to-end scenario drives every stage in order against a scripted
//! remote client; the CLI tests exercise the binary surface.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use codeagent::client::{
    CommitPushRequest, DependencyReport, OwnerRepo, PrOutcome, PullRequestRequest, ReadmeOutcome,
    RefactorOutcome, RefactorRequest, RemoteClient,
};
use codeagent::coordinator::PipelineCoordinator;
use codeagent::errors::RemoteError;
use codeagent::session::{RunStatus, SessionStore};

/// Remote client scripted to the canonical walkthrough: repository `x/y`,
/// two Python files, one of which the refactor run changes.
struct WalkthroughRemote {
    diff_calls: Arc<AtomicUsize>,
    pr_calls: Arc<AtomicUsize>,
}

impl WalkthroughRemote {
    fn new() -> Self {
        Self {
            diff_calls: Arc::new(AtomicUsize::new(0)),
            pr_calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl RemoteClient for WalkthroughRemote {
    async fn resolve_owner_repo(&self, repo_url: &str) -> Result<OwnerRepo, RemoteError> {
        if !repo_url.contains("github.com") {
            return Err(RemoteError::InvalidReference(
                "URL must be from github.com".into(),
            ));
        }
        Ok(OwnerRepo {
            owner: "x".into(),
            repo: "y".into(),
        })
    }

    async fn list_branches(&self, _owner: &str, _repo: &str) -> Result<Vec<String>, RemoteError> {
        Ok(vec!["main".into(), "feat".into()])
    }

    async fn list_files(
        &self,
        _owner: &str,
        _repo: &str,
        _branch: &str,
    ) -> Result<Vec<String>, RemoteError> {
        Ok(vec!["a.py".into(), "b.py".into()])
    }

    async fn read_file(
        &self,
        _owner: &str,
        _repo: &str,
        _branch: &str,
        path: &str,
    ) -> Result<String, RemoteError> {
        match path {
            "a.py" => Ok("print(1)".into()),
            "b.py" => Ok("print(2)".into()),
            other => Err(RemoteError::NotFound(other.to_string())),
        }
    }

    async fn analyze(&self, path: &str, _content: &str) -> Result<String, RemoteError> {
        match path {
            "a.py" => Ok("uses print statement".into()),
            _ => Ok("no findings".into()),
        }
    }

    async fn refactor_all(
        &self,
        request: &RefactorRequest,
    ) -> Result<RefactorOutcome, RemoteError> {
        assert_eq!(request.python_version, "3.12");
        assert_eq!(request.output_dir, "temp_refactored_repo");
        Ok(RefactorOutcome {
            success: true,
            output_dir: Some("temp_refactored_repo".into()),
            logs: request.files.clone(),
        })
    }

    async fn fetch_refactored_tree(&self) -> Result<HashMap<String, String>, RemoteError> {
        Ok(HashMap::from([(
            "a.py".to_string(),
            "print(1)  # ok".to_string(),
        )]))
    }

    async fn diff(&self, original: &str, refactored: &str) -> Result<String, RemoteError> {
        self.diff_calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!(
            "--- Original\n+++ Refactored\n-{original}\n+{refactored}"
        ))
    }

    async fn update_dependencies(
        &self,
        output_dir: &str,
        python_version: &str,
    ) -> Result<DependencyReport, RemoteError> {
        assert_eq!(output_dir, "temp_refactored_repo");
        assert_eq!(python_version, "3.12");
        Ok(DependencyReport {
            message: "Environment setup and installation successful.".into(),
            installed_packages: "requests==2.31.0\nflask==3.0.0".into(),
        })
    }

    async fn generate_readme(
        &self,
        _output_dir: &str,
        _python_version: &str,
    ) -> Result<ReadmeOutcome, RemoteError> {
        Ok(ReadmeOutcome {
            message: "README.md written".into(),
        })
    }

    async fn commit_and_push(&self, request: &CommitPushRequest) -> Result<String, RemoteError> {
        assert_eq!(request.branch, "feat");
        Ok("Committed all file successfully".into())
    }

    async fn create_pull_request(
        &self,
        request: &PullRequestRequest,
    ) -> Result<PrOutcome, RemoteError> {
        self.pr_calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(request.head_branch, "feat");
        assert_eq!(request.base_branch, "main");
        Ok(PrOutcome {
            success: true,
            url: Some("https://github.com/x/y/pull/7".into()),
            message: None,
        })
    }
}

#[tokio::test]
async fn end_to_end_session_walkthrough() {
    let remote = WalkthroughRemote::new();
    let diff_calls = remote.diff_calls.clone();
    let store = Arc::new(SessionStore::new());
    let coordinator = PipelineCoordinator::new(remote, store.clone());

    // Connect and check out a branch.
    let branches = coordinator
        .connect("https://github.com/x/y")
        .await
        .unwrap();
    assert_eq!(branches, vec!["main", "feat"]);
    let files = coordinator.checkout("main").await.unwrap();
    assert_eq!(files, vec!["a.py", "b.py"]);

    let session = store.snapshot();
    assert_eq!(
        (session.owner.as_str(), session.repo.as_str(), session.branch.as_str()),
        ("x", "y", "main")
    );

    // Browse + analyze.
    let artifact = coordinator.select_file("a.py").await.unwrap();
    assert_eq!(artifact.original_content.as_deref(), Some("print(1)"));
    assert_eq!(artifact.analysis.as_deref(), Some("uses print statement"));

    // Full-repository refactor.
    let run = coordinator.run_refactor().await.unwrap();
    assert_eq!(run.status, RunStatus::Succeeded);
    assert_eq!(run.output_dir, "temp_refactored_repo");
    assert_eq!(run.logs, vec!["a.py", "b.py"]);
    assert_eq!(
        store.snapshot().artifacts["a.py"]
            .refactored_content
            .as_deref(),
        Some("print(1)  # ok")
    );

    // Diff derives from both contents and is non-empty.
    let diff = coordinator.ensure_diff("a.py").await.unwrap();
    assert!(!diff.is_empty());
    assert!(diff.contains("print(1)"));
    assert!(diff.contains("print(1)  # ok"));

    // A second read is served from the cache.
    coordinator.ensure_diff("a.py").await.unwrap();
    assert_eq!(diff_calls.load(Ordering::SeqCst), 1);

    // Dependency validation is unlocked by the successful run.
    let report = coordinator.validate_dependencies().await.unwrap();
    assert!(report.installed_packages.contains("requests==2.31.0"));
    assert_eq!(
        store.snapshot().installed_packages.as_deref(),
        Some("requests==2.31.0\nflask==3.0.0")
    );

    // README generation shares the gate.
    let readme = coordinator.generate_readme().await.unwrap();
    assert_eq!(readme.message, "README.md written");

    // Publish: push unlocks the PR for that branch.
    let push = coordinator
        .commit_and_push("refactor cleanup", "feat", "main")
        .await
        .unwrap();
    assert_eq!(push, "Committed all file successfully");

    let pr = coordinator
        .create_pull_request("feat", "main", "Auto PR", "refactored updates")
        .await
        .unwrap();
    assert!(pr.success);
    assert_eq!(
        pr.display_message(),
        "PR created: https://github.com/x/y/pull/7"
    );
    assert_eq!(
        store.snapshot().publish.last_pr_message.as_deref(),
        Some("PR created: https://github.com/x/y/pull/7")
    );
}

#[tokio::test]
async fn pull_request_before_push_never_reaches_the_client() {
    let remote = WalkthroughRemote::new();
    let pr_calls = remote.pr_calls.clone();
    let store = Arc::new(SessionStore::new());
    let coordinator = PipelineCoordinator::new(remote, store);
    coordinator
        .connect("https://github.com/x/y")
        .await
        .unwrap();

    let err = coordinator
        .create_pull_request("feat", "main", "t", "b")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "PreconditionFailure");
    assert_eq!(pr_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn identity_change_resets_session_regardless_of_size() {
    let store = Arc::new(SessionStore::new());
    let coordinator = PipelineCoordinator::new(WalkthroughRemote::new(), store.clone());
    coordinator
        .connect("https://github.com/x/y")
        .await
        .unwrap();
    coordinator.checkout("main").await.unwrap();
    coordinator.select_file("a.py").await.unwrap();
    coordinator.run_refactor().await.unwrap();

    store.set_identity("other", "repo", "dev");

    let session = store.snapshot();
    assert!(session.files.is_empty());
    assert!(session.artifacts.is_empty());
    assert_eq!(session.run.status, RunStatus::NotRun);
}

// =============================================================================
// CLI surface
// =============================================================================

mod cli {
    use assert_cmd::Command;
    use predicates::prelude::*;

    fn codeagent() -> Command {
        Command::cargo_bin("codeagent").unwrap()
    }

    #[test]
    fn test_help() {
        codeagent()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("refactoring orchestrator"));
    }

    #[test]
    fn test_version() {
        codeagent().arg("--version").assert().success();
    }

    #[test]
    fn test_subcommands_are_listed() {
        codeagent()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("branches"))
            .stdout(predicate::str::contains("refactor"))
            .stdout(predicate::str::contains("publish"));
    }

    #[test]
    fn test_unreachable_service_is_an_upstream_failure() {
        // Nothing listens on port 1; the transport failure must surface as
        // the UpstreamFailure taxonomy kind, not a raw panic.
        codeagent()
            .args([
                "--base-url",
                "http://127.0.0.1:1",
                "branches",
                "--repo-url",
                "https://github.com/x/y",
            ])
            .assert()
            .failure()
            .stderr(predicate::str::contains("UpstreamFailure"));
    }

    #[test]
    fn test_refactor_rejects_unsupported_python_version() {
        codeagent()
            .args([
                "refactor",
                "--repo-url",
                "https://github.com/x/y",
                "--branch",
                "main",
                "--python-version",
                "2.7",
            ])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unsupported Python version"));
    }
}
