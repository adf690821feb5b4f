//! Error types for the push-to-build flow.
//!
//! [`PushError`] is the closed set of ways one push event can fail. Each
//! variant wraps the port-level error that caused it: [`ContentError`] from
//! the source-control content API, [`CiError`] from the CI engine.
//!
//! A job that does not exist yet is not an error for the flow: the CI port
//! reports it as [`CiError::NotFound`] and the provisioner takes the create
//! path.

use thiserror::Error;

use crate::{JobName, JobProvisioning, WorkflowPath};

// ---------------------------------------------------------------------------
// Port errors
// ---------------------------------------------------------------------------

/// Failures of the source-control content API.
#[derive(Debug, Error)]
pub enum ContentError {
    /// The file does not exist at the requested ref.
    #[error("'{path}' not found at {reference}")]
    NotFound { path: String, reference: String },

    /// The request could not be sent or the response could not be read.
    #[error("Content request failed: {0}")]
    Request(String),

    /// The API answered with a non-success status.
    #[error("Content API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response was not a single file in a supported encoding.
    #[error("Unexpected content response: {0}")]
    UnexpectedResponse(String),

    /// The file content could not be decoded to UTF-8 text.
    #[error("Content could not be decoded: {0}")]
    Decode(String),
}

/// Failures of the CI engine API.
#[derive(Debug, Error)]
pub enum CiError {
    /// The job does not exist.
    #[error("Job '{0}' not found")]
    NotFound(JobName),

    /// The request could not be sent or the response could not be read.
    #[error("CI request failed: {0}")]
    Request(String),

    /// The engine answered with a non-success status.
    #[error("CI engine returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// A CSRF crumb was required but could not be obtained.
    #[error("CSRF crumb unavailable: {0}")]
    Crumb(String),
}

impl CiError {
    /// Returns `true` for [`CiError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

// ---------------------------------------------------------------------------
// Flow errors
// ---------------------------------------------------------------------------

/// Why processing of one push event was aborted.
///
/// None of these are retried; the caller logs them and moves on.
#[derive(Debug, Error)]
pub enum PushError {
    /// The workflow file could not be retrieved.
    #[error("Failed to fetch trigger configuration '{path}': {source}")]
    ConfigFetch {
        path: WorkflowPath,
        #[source]
        source: ContentError,
    },

    /// The workflow file is not valid YAML.
    #[error("Failed to parse trigger configuration '{path}': {source}")]
    ConfigParse {
        path: WorkflowPath,
        #[source]
        source: serde_yaml::Error,
    },

    /// Looking up the job failed for a reason other than not-found.
    #[error("Failed to look up job '{job}': {source}")]
    JobLookup {
        job: JobName,
        #[source]
        source: CiError,
    },

    /// Creating or updating the job failed.
    #[error("Failed to {action} job '{job}': {source}")]
    JobProvision {
        job: JobName,
        action: JobProvisioning,
        #[source]
        source: CiError,
    },

    /// The build could not be enqueued.
    #[error("Failed to enqueue build for job '{job}': {source}")]
    BuildEnqueue {
        job: JobName,
        #[source]
        source: CiError,
    },
}

impl PushError {
    /// Stable label for the failure kind, for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigFetch { .. } => "config_fetch",
            Self::ConfigParse { .. } => "config_parse",
            Self::JobLookup { .. } => "job_lookup",
            Self::JobProvision { .. } => "job_provision",
            Self::BuildEnqueue { .. } => "build_enqueue",
        }
    }
}
