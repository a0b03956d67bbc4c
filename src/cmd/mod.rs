//! CLI command implementations — the stage views of the orchestrator.
//!
//! Each submodule owns one stage capability:
//!
//! | Module     | Commands handled                                   |
//! |------------|-----------------------------------------------------|
//! | `browse`   | `Branches`, `Files`, `Analyze`                     |
//! | `refactor` | `Refactor` (plus dependency validation and README) |
//! | `publish`  | `Publish`                                          |
//!
//! Commands hold no session state of their own: they drive the pipeline
//! coordinator and render from store snapshots.

pub mod browse;
pub mod publish;
pub mod refactor;

pub use browse::{cmd_analyze, cmd_branches, cmd_files};
pub use publish::cmd_publish;
pub use refactor::cmd_refactor;

use codeagent::errors::CoordinatorError;

/// Surface a coordinator failure as its taxonomy kind plus a short message.
pub(crate) fn stage_error(err: CoordinatorError) -> anyhow::Error {
    anyhow::anyhow!("[{}] {}", err.kind(), err)
}
