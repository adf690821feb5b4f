//! Results of processing one push event.

use serde::{Deserialize, Serialize};

use crate::JobName;

/// Why a push did not produce a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The pushed ref is not a branch (e.g. a tag).
    NotABranch,
    /// The push deleted the branch.
    BranchDeleted,
    /// The workflow does not react to pushes.
    NoPushRule,
    /// The branch is not in the workflow's branch list.
    BranchNotListed,
    /// No changed file matched the workflow's path patterns.
    NoMatchingPath,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::NotABranch => "ref is not a branch",
            Self::BranchDeleted => "branch was deleted",
            Self::NoPushRule => "workflow has no push trigger",
            Self::BranchNotListed => "branch not in push.branches",
            Self::NoMatchingPath => "no changed file matches push.paths",
        };
        f.write_str(text)
    }
}

/// What `ensure_job` did to make the job exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobProvisioning {
    /// No job existed; one was created.
    Created,
    /// The job existed; its definition was overwritten.
    Updated,
}

impl std::fmt::Display for JobProvisioning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => f.write_str("create"),
            Self::Updated => f.write_str("update"),
        }
    }
}

/// Successful result of handling a push event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PushOutcome {
    /// The job was provisioned and a build enqueued.
    Triggered {
        job: JobName,
        provisioning: JobProvisioning,
    },
    /// No build was produced.
    Skipped { reason: SkipReason },
}
