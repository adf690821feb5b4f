//! The inbound push event.
//!
//! Only the fields the trigger flow reads are modelled; everything else in
//! GitHub's payload is ignored on deserialisation. Path arrays missing from a
//! commit deserialise as empty.

use serde::{Deserialize, Serialize};

use crate::{BranchName, CommitSha};

/// A GitHub `push` webhook payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushEvent {
    /// Fully qualified ref that was pushed (e.g. `"refs/heads/main"`).
    #[serde(rename = "ref")]
    pub reference: String,

    /// SHA of the ref before the push.
    #[serde(default)]
    pub before: String,

    /// SHA of the ref after the push.
    pub after: String,

    /// `true` when the push deleted the ref.
    #[serde(default)]
    pub deleted: bool,

    /// The repository that received the push.
    pub repository: Repository,

    /// Pushed commits, oldest first.
    #[serde(default)]
    pub commits: Vec<Commit>,
}

/// Repository block of a push payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub owner: RepositoryOwner,
}

/// Owner block of a push payload's repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryOwner {
    pub login: String,
}

/// Commit summary included in a push payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub added: Vec<String>,
    #[serde(default)]
    pub modified: Vec<String>,
    #[serde(default)]
    pub removed: Vec<String>,
}

impl PushEvent {
    /// Login of the repository owner.
    pub fn owner(&self) -> &str {
        &self.repository.owner.login
    }

    /// Name of the repository, without the owner.
    pub fn repo(&self) -> &str {
        &self.repository.name
    }

    /// The pushed branch, or `None` if the ref is not a branch.
    pub fn branch(&self) -> Option<BranchName> {
        BranchName::from_ref(&self.reference)
    }

    /// The commit the ref points at after the push.
    pub fn head_sha(&self) -> Option<CommitSha> {
        CommitSha::new(self.after.as_str())
    }

    /// Every path added, modified, or removed by any pushed commit.
    ///
    /// Order follows the commits; a path touched by several commits appears
    /// once per commit.
    pub fn changed_files(&self) -> impl Iterator<Item = &str> {
        self.commits.iter().flat_map(|commit| {
            commit
                .added
                .iter()
                .chain(&commit.modified)
                .chain(&commit.removed)
                .map(String::as_str)
        })
    }

    /// Message of the first pushed commit, or `""` when there are none.
    pub fn first_commit_message(&self) -> &str {
        self.commits
            .first()
            .map(|c| c.message.as_str())
            .unwrap_or_default()
    }
}
