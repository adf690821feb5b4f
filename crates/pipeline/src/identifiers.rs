//! Newtype domain identifiers.
//!
//! Every domain concept that has an identity is represented as a distinct newtype
//! wrapping a primitive. This prevents accidentally interchanging, for example,
//! a [`BranchName`] with a [`CommitSha`] even though both are strings under the
//! hood.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Git names
// ---------------------------------------------------------------------------

/// Prefix GitHub puts in front of branch names in a push event's `ref`.
const BRANCH_REF_PREFIX: &str = "refs/heads/";

string_id! {
    /// A Git branch name (e.g. `"main"`, `"feature/login"`), without the
    /// `refs/heads/` prefix.
    BranchName
}

impl BranchName {
    /// Extracts the branch name from a fully qualified ref.
    ///
    /// Returns `None` for refs outside `refs/heads/` (tags, notes) and for the
    /// bare prefix.
    pub fn from_ref(reference: &str) -> Option<Self> {
        reference
            .strip_prefix(BRANCH_REF_PREFIX)
            .and_then(Self::new)
    }
}

string_id! {
    /// A Git commit SHA (40-character lowercase hex string).
    CommitSha
}

impl CommitSha {
    /// Returns `true` if this is the all-zero SHA GitHub sends for the missing
    /// side of a branch creation or deletion.
    pub fn is_null(&self) -> bool {
        self.0.bytes().all(|b| b == b'0')
    }
}

string_id! {
    /// A file path relative to the repository root.
    ///
    /// Used to locate the workflow file that holds the trigger configuration.
    WorkflowPath
}

// ---------------------------------------------------------------------------
// CI names
// ---------------------------------------------------------------------------

string_id! {
    /// The name of a CI job as the engine knows it.
    ///
    /// Produced only by [`crate::JobIdentity`]; the engine uses it as the
    /// job's primary key.
    JobName
}

impl JobName {
    /// Wraps an already derived job key. Callers guarantee it is non-empty.
    pub(crate) fn from_key(key: String) -> Self {
        Self(key)
    }
}

string_id! {
    /// The name of the shared-library step every generated pipeline invokes.
    EntryPoint
}

impl Default for EntryPoint {
    fn default() -> Self {
        Self("githubActionsEntryPoint".to_string())
    }
}

// ---------------------------------------------------------------------------
// Delivery identifiers
// ---------------------------------------------------------------------------

string_id! {
    /// Identifies one webhook delivery.
    ///
    /// Taken from the `X-GitHub-Delivery` header; generated locally when the
    /// header is absent so every event can still be correlated in the logs.
    DeliveryId
}

impl DeliveryId {
    /// Generates a fresh random delivery identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}
