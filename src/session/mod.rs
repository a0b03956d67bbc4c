//! Session state for one engagement with a single repository/branch.
//!
//! `SessionStore` is the only shared mutable resource in the orchestrator:
//! stage views and the pipeline coordinator read consistent snapshots from it
//! and mutate it exclusively through its update methods.

mod store;
mod types;

pub use store::SessionStore;
pub use types::{
    ArtifactPatch, DEFAULT_OUTPUT_DIR, FileArtifact, PipelineRun, PublishState, PythonVersion,
    RunStatus, Session,
};
