use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::errors::RemoteError;

use super::RemoteClient;
use super::types::{
    CodeDiffRequest, CommitPushRequest, DependencyReport, DependencyRequest, FileAnalysisRequest,
    OwnerRepo, PrOutcome, PullRequestRequest, ReadmeOutcome, RefactorOutcome, RefactorRequest,
    RefactoredTreeResponse,
};

/// `RemoteClient` implementation over the code-agent HTTP service.
///
/// All requests and responses are JSON. Transport failures (connection,
/// timeout, body decode) are normalized into `UpstreamFailure`; non-2xx
/// statuses are classified by `classify_status`.
pub struct HttpRemoteClient {
    http: reqwest::Client,
    config: Config,
}

impl HttpRemoteClient {
    pub fn new(config: Config) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                RemoteError::UpstreamFailure(format!("Failed to build HTTP client: {e}"))
            })?;
        Ok(Self { http, config })
    }

    fn url(&self, endpoint: &str) -> String {
        self.config.endpoint(endpoint)
    }

    /// Pass 2xx responses through; turn anything else into a classified
    /// error, preferring the service's `detail` field for the message.
    async fn check(
        resp: reqwest::Response,
        what: &str,
    ) -> Result<reqwest::Response, RemoteError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        let detail =
            extract_detail(&body).unwrap_or_else(|| format!("{what} returned HTTP {status}"));
        Err(classify_status(status, detail))
    }
}

fn transport(what: &str, err: reqwest::Error) -> RemoteError {
    RemoteError::UpstreamFailure(format!("{what}: {err}"))
}

fn classify_status(status: StatusCode, detail: String) -> RemoteError {
    match status {
        StatusCode::BAD_REQUEST => RemoteError::InvalidReference(detail),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::Unauthorized(detail),
        StatusCode::NOT_FOUND => RemoteError::NotFound(detail),
        StatusCode::CONFLICT => RemoteError::Conflict(detail),
        _ => RemoteError::UpstreamFailure(detail),
    }
}

/// The service wraps failure messages as `{"detail": "..."}`. Fall back to
/// the raw body when it is not JSON.
fn extract_detail(body: &str) -> Option<String> {
    if let Ok(value) = serde_json::from_str::<Value>(body)
        && let Some(detail) = value.get("detail").and_then(Value::as_str)
    {
        return Some(detail.to_string());
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// A refactor response must account for every requested path. Reported
/// failure carries the last log line as the reason; a shorter log on success
/// signals files the run never reached.
fn vet_refactor_outcome(
    outcome: RefactorOutcome,
    requested: usize,
) -> Result<RefactorOutcome, RemoteError> {
    if !outcome.success {
        let reason = outcome
            .logs
            .last()
            .cloned()
            .unwrap_or_else(|| "refactor run reported failure".to_string());
        return Err(RemoteError::UpstreamFailure(reason));
    }
    if outcome.logs.len() < requested {
        return Err(RemoteError::PartialFailure {
            processed: outcome.logs.len(),
            requested,
        });
    }
    Ok(outcome)
}

/// The commit-push endpoint returns either a bare string or
/// `{"message": "..."}` depending on the code path.
fn push_message(value: Value) -> Result<String, RemoteError> {
    match value {
        Value::String(message) => Ok(message),
        Value::Object(ref map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                RemoteError::UpstreamFailure(
                    "commit-push response carried no message field".to_string(),
                )
            }),
        other => Err(RemoteError::UpstreamFailure(format!(
            "Unexpected commit-push response: {other}"
        ))),
    }
}

#[async_trait]
impl RemoteClient for HttpRemoteClient {
    async fn resolve_owner_repo(&self, repo_url: &str) -> Result<OwnerRepo, RemoteError> {
        debug!(repo_url, "resolving owner/repo");
        let resp = self
            .http
            .get(self.url("extract-owner-repo"))
            .query(&[("repo_url", repo_url)])
            .send()
            .await
            .map_err(|e| transport("extract-owner-repo", e))?;
        Self::check(resp, "extract-owner-repo")
            .await?
            .json()
            .await
            .map_err(|e| transport("extract-owner-repo response", e))
    }

    async fn list_branches(&self, owner: &str, repo: &str) -> Result<Vec<String>, RemoteError> {
        debug!(owner, repo, "listing branches");
        let resp = self
            .http
            .get(self.url("extract-branch"))
            .query(&[("owner", owner), ("repo", repo)])
            .send()
            .await
            .map_err(|e| transport("extract-branch", e))?;
        Self::check(resp, "extract-branch")
            .await?
            .json()
            .await
            .map_err(|e| transport("extract-branch response", e))
    }

    async fn list_files(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<Vec<String>, RemoteError> {
        debug!(owner, repo, branch, "listing files");
        let resp = self
            .http
            .get(self.url("extract-files"))
            .query(&[("owner", owner), ("repo", repo), ("branch", branch)])
            .send()
            .await
            .map_err(|e| transport("extract-files", e))?;
        Self::check(resp, "extract-files")
            .await?
            .json()
            .await
            .map_err(|e| transport("extract-files response", e))
    }

    async fn read_file(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        path: &str,
    ) -> Result<String, RemoteError> {
        debug!(owner, repo, branch, path, "reading file content");
        let resp = self
            .http
            .get(self.url("get-github-file-content"))
            .query(&[
                ("owner", owner),
                ("repo", repo),
                ("file_path", path),
                ("branch", branch),
            ])
            .send()
            .await
            .map_err(|e| transport("get-github-file-content", e))?;
        Self::check(resp, "get-github-file-content")
            .await?
            .json()
            .await
            .map_err(|e| transport("get-github-file-content response", e))
    }

    async fn analyze(&self, path: &str, content: &str) -> Result<String, RemoteError> {
        debug!(path, "requesting file analysis");
        let resp = self
            .http
            .post(self.url("get-file-analysis"))
            .json(&FileAnalysisRequest {
                file_path: path,
                code_content: content,
            })
            .send()
            .await
            .map_err(|e| transport("get-file-analysis", e))?;
        Self::check(resp, "get-file-analysis")
            .await?
            .json()
            .await
            .map_err(|e| transport("get-file-analysis response", e))
    }

    async fn refactor_all(
        &self,
        request: &RefactorRequest,
    ) -> Result<RefactorOutcome, RemoteError> {
        debug!(
            owner = request.owner,
            repo = request.repo,
            files = request.files.len(),
            "starting full-repository refactor"
        );
        let resp = self
            .http
            .post(self.url("refactor-python-files"))
            .json(request)
            .send()
            .await
            .map_err(|e| transport("refactor-python-files", e))?;
        let outcome: RefactorOutcome = Self::check(resp, "refactor-python-files")
            .await?
            .json()
            .await
            .map_err(|e| transport("refactor-python-files response", e))?;
        vet_refactor_outcome(outcome, request.files.len())
    }

    async fn fetch_refactored_tree(&self) -> Result<HashMap<String, String>, RemoteError> {
        debug!("fetching refactored tree");
        let resp = self
            .http
            .get(self.url("get-refactored-content"))
            .send()
            .await
            .map_err(|e| transport("get-refactored-content", e))?;
        let tree: RefactoredTreeResponse = Self::check(resp, "get-refactored-content")
            .await?
            .json()
            .await
            .map_err(|e| transport("get-refactored-content response", e))?;
        Ok(tree.files)
    }

    async fn diff(&self, original: &str, refactored: &str) -> Result<String, RemoteError> {
        let resp = self
            .http
            .post(self.url("get-code-diff"))
            .json(&CodeDiffRequest {
                old_code: original,
                refactored_code: refactored,
            })
            .send()
            .await
            .map_err(|e| transport("get-code-diff", e))?;
        Self::check(resp, "get-code-diff")
            .await?
            .json()
            .await
            .map_err(|e| transport("get-code-diff response", e))
    }

    async fn update_dependencies(
        &self,
        output_dir: &str,
        python_version: &str,
    ) -> Result<DependencyReport, RemoteError> {
        debug!(output_dir, python_version, "updating dependencies");
        let resp = self
            .http
            .post(self.url("update-dependencies"))
            .json(&DependencyRequest {
                root_dir: output_dir,
                python_version,
            })
            .send()
            .await
            .map_err(|e| transport("update-dependencies", e))?;
        // Any service-side rejection here means the target environment could
        // not be built; keep auth failures distinguishable.
        let resp = match Self::check(resp, "update-dependencies").await {
            Ok(resp) => resp,
            Err(RemoteError::Unauthorized(detail)) => {
                return Err(RemoteError::Unauthorized(detail));
            }
            Err(
                RemoteError::InvalidReference(detail)
                | RemoteError::NotFound(detail)
                | RemoteError::UpstreamFailure(detail),
            ) => return Err(RemoteError::DependencyResolution(detail)),
            Err(other) => return Err(other),
        };
        resp.json()
            .await
            .map_err(|e| transport("update-dependencies response", e))
    }

    async fn generate_readme(
        &self,
        output_dir: &str,
        python_version: &str,
    ) -> Result<ReadmeOutcome, RemoteError> {
        debug!(output_dir, python_version, "generating readme");
        let resp = self
            .http
            .get(self.url("generate-readme"))
            .query(&[("root_dir", output_dir), ("python_version", python_version)])
            .send()
            .await
            .map_err(|e| transport("generate-readme", e))?;
        Self::check(resp, "generate-readme")
            .await?
            .json()
            .await
            .map_err(|e| transport("generate-readme response", e))
    }

    async fn commit_and_push(&self, request: &CommitPushRequest) -> Result<String, RemoteError> {
        debug!(
            owner = request.owner,
            repo = request.repo,
            branch = request.branch,
            "committing and pushing"
        );
        let resp = self
            .http
            .post(self.url("commit-push"))
            .json(request)
            .send()
            .await
            .map_err(|e| transport("commit-push", e))?;
        let value: Value = Self::check(resp, "commit-push")
            .await?
            .json()
            .await
            .map_err(|e| transport("commit-push response", e))?;
        push_message(value)
    }

    async fn create_pull_request(
        &self,
        request: &PullRequestRequest,
    ) -> Result<PrOutcome, RemoteError> {
        debug!(
            head = request.head_branch,
            base = request.base_branch,
            "creating pull request"
        );
        let resp = self
            .http
            .post(self.url("git-pr"))
            .json(request)
            .send()
            .await
            .map_err(|e| transport("git-pr", e))?;
        Self::check(resp, "git-pr")
            .await?
            .json()
            .await
            .map_err(|e| transport("git-pr response", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status_maps_taxonomy() {
        let cases = [
            (StatusCode::BAD_REQUEST, "InvalidReference"),
            (StatusCode::UNAUTHORIZED, "Unauthorized"),
            (StatusCode::FORBIDDEN, "Unauthorized"),
            (StatusCode::NOT_FOUND, "NotFound"),
            (StatusCode::CONFLICT, "ConflictError"),
            (StatusCode::INTERNAL_SERVER_ERROR, "UpstreamFailure"),
            (StatusCode::BAD_GATEWAY, "UpstreamFailure"),
        ];
        for (status, kind) in cases {
            assert_eq!(classify_status(status, "detail".into()).kind(), kind);
        }
    }

    #[test]
    fn test_extract_detail_prefers_json_field() {
        let body = r#"{"detail": "Repository 'x/y' not found (404)."}"#;
        assert_eq!(
            extract_detail(body).as_deref(),
            Some("Repository 'x/y' not found (404).")
        );
    }

    #[test]
    fn test_extract_detail_falls_back_to_body() {
        assert_eq!(extract_detail("plain error").as_deref(), Some("plain error"));
        assert_eq!(extract_detail("  \n").as_deref(), None);
    }

    fn outcome(success: bool, logs: &[&str]) -> RefactorOutcome {
        RefactorOutcome {
            success,
            output_dir: Some("temp_refactored_repo".into()),
            logs: logs.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_vet_refactor_outcome_short_log_is_partial_failure() {
        let err = vet_refactor_outcome(outcome(true, &["a.py"]), 3).unwrap_err();
        assert!(matches!(
            err,
            RemoteError::PartialFailure {
                processed: 1,
                requested: 3,
            }
        ));
    }

    #[test]
    fn test_vet_refactor_outcome_failure_carries_last_log() {
        let err =
            vet_refactor_outcome(outcome(false, &["[✓] Refactored: a.py", "[✗] b.py"]), 2)
                .unwrap_err();
        assert!(matches!(err, RemoteError::UpstreamFailure(ref reason) if reason == "[✗] b.py"));
    }

    #[test]
    fn test_vet_refactor_outcome_full_log_passes() {
        let vetted = vet_refactor_outcome(outcome(true, &["a.py", "b.py"]), 2).unwrap();
        assert_eq!(vetted.logs.len(), 2);
    }

    #[test]
    fn test_push_message_from_string() {
        let value = serde_json::json!("Committed all file successfully");
        assert_eq!(
            push_message(value).unwrap(),
            "Committed all file successfully"
        );
    }

    #[test]
    fn test_push_message_from_object() {
        let value = serde_json::json!({"message": "done"});
        assert_eq!(push_message(value).unwrap(), "done");
    }

    #[test]
    fn test_push_message_rejects_other_shapes() {
        assert!(push_message(serde_json::json!(42)).is_err());
        assert!(push_message(serde_json::json!({"status": "ok"})).is_err());
    }
}
