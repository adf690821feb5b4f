//! Port traits for the two outbound APIs.
//!
//! Infrastructure crates implement these; the orchestration layer receives
//! them as `Arc<dyn _>` so tests can substitute the in-memory doubles in
//! [`crate::fakes`].

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::{CiError, CommitSha, ContentError, JobDescriptor, JobName, WorkflowPath};

/// Read access to repository files at a given commit.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Returns the decoded text of `path` in `owner/repo` at `reference`.
    ///
    /// # Errors
    ///
    /// [`ContentError::NotFound`] if the file does not exist at that commit;
    /// other variants for transport, status, and decoding failures.
    async fn fetch_file(
        &self,
        owner: &str,
        repo: &str,
        path: &WorkflowPath,
        reference: &CommitSha,
    ) -> Result<String, ContentError>;
}

/// Job management on the CI engine.
#[async_trait]
pub trait CiEngine: Send + Sync {
    /// Looks up a job by name.
    ///
    /// # Errors
    ///
    /// [`CiError::NotFound`] if no job has that name.
    async fn get_job(&self, name: &JobName) -> Result<JobDescriptor, CiError>;

    /// Creates a job from a definition document.
    async fn create_job(&self, name: &JobName, definition: &str) -> Result<(), CiError>;

    /// Replaces an existing job's definition document.
    async fn update_job(&self, name: &JobName, definition: &str) -> Result<(), CiError>;

    /// Enqueues one build of a job with the given parameters.
    async fn enqueue_build(
        &self,
        name: &JobName,
        parameters: &BTreeMap<String, String>,
    ) -> Result<(), CiError>;
}
