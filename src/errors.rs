//! Typed error hierarchy for the session orchestrator.
//!
//! Two top-level enums cover the two layers:
//! - `RemoteError` — failures produced by the remote operation client
//! - `CoordinatorError` — everything a stage view can observe: remote
//!   failures passed through unmodified, plus locally-detected ordering
//!   violations that never reach the network

use thiserror::Error;

/// Failures from the remote code-agent service or the transport beneath it.
///
/// Every transport-level problem (connection refused, timeout, malformed
/// body) is normalized into `UpstreamFailure`; the remaining variants map
/// 1:1 onto service-level failure conditions.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Invalid repository reference: {0}")]
    InvalidReference(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Upstream service failure: {0}")]
    UpstreamFailure(String),

    #[error("Refactor partially completed: {processed} of {requested} files processed")]
    PartialFailure { processed: usize, requested: usize },

    #[error("Dependency resolution failed: {0}")]
    DependencyResolution(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl RemoteError {
    /// Stable taxonomy name, surfaced to stage views alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidReference(_) => "InvalidReference",
            Self::NotFound(_) => "NotFound",
            Self::Unauthorized(_) => "Unauthorized",
            Self::UpstreamFailure(_) => "UpstreamFailure",
            Self::PartialFailure { .. } => "PartialFailure",
            Self::DependencyResolution(_) => "DependencyResolutionError",
            Self::Conflict(_) => "ConflictError",
        }
    }
}

/// Failures the pipeline coordinator reports to stage views.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// An ordering violation detected before any remote call was issued
    /// (e.g. opening a pull request for a branch that was never pushed).
    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl CoordinatorError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Precondition(_) => "PreconditionFailure",
            Self::Remote(e) => e.kind(),
        }
    }

    pub(crate) fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_kinds_match_taxonomy() {
        let cases: Vec<(RemoteError, &str)> = vec![
            (
                RemoteError::InvalidReference("bad url".into()),
                "InvalidReference",
            ),
            (RemoteError::NotFound("owner/repo".into()), "NotFound"),
            (RemoteError::Unauthorized("401".into()), "Unauthorized"),
            (
                RemoteError::UpstreamFailure("timeout".into()),
                "UpstreamFailure",
            ),
            (
                RemoteError::PartialFailure {
                    processed: 1,
                    requested: 3,
                },
                "PartialFailure",
            ),
            (
                RemoteError::DependencyResolution("pip failed".into()),
                "DependencyResolutionError",
            ),
            (RemoteError::Conflict("PR exists".into()), "ConflictError"),
        ];
        for (err, kind) in cases {
            assert_eq!(err.kind(), kind);
        }
    }

    #[test]
    fn partial_failure_message_carries_counts() {
        let err = RemoteError::PartialFailure {
            processed: 2,
            requested: 5,
        };
        let msg = err.to_string();
        assert!(msg.contains('2'));
        assert!(msg.contains('5'));
    }

    #[test]
    fn coordinator_precondition_kind() {
        let err = CoordinatorError::precondition("no successful push for branch 'feat'");
        assert_eq!(err.kind(), "PreconditionFailure");
        assert!(err.to_string().contains("feat"));
    }

    #[test]
    fn coordinator_error_passes_remote_kind_through() {
        let err: CoordinatorError = RemoteError::NotFound("a.py".into()).into();
        assert_eq!(err.kind(), "NotFound");
        assert!(matches!(
            err,
            CoordinatorError::Remote(RemoteError::NotFound(_))
        ));
    }

    #[test]
    fn all_error_types_implement_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&RemoteError::Conflict("x".into()));
        assert_std_error(&CoordinatorError::precondition("x"));
    }
}
