//! Core domain for pushbridge.
//!
//! This crate contains every domain concept used to turn a GitHub push into a
//! CI build: the push event, the workflow's trigger configuration, the
//! trigger-match evaluator, job identity and rendering, and the error
//! taxonomy. Infrastructure crates implement the port traits defined here;
//! they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`BranchName`, `CommitSha`, `JobName`, etc.) |
//! | [`event`] | The inbound push payload |
//! | [`trigger`] | Trigger configuration parsed from a workflow file |
//! | [`matcher`] | Path-filter patterns |
//! | [`evaluator`] | `should_trigger` / `evaluate` |
//! | [`job`] | Job identity, descriptor, and build parameters |
//! | [`template`] | Pipeline text and job document rendering |
//! | [`outcome`] | Per-event outcomes and skip reasons |
//! | [`errors`] | Port errors and the per-event error taxonomy |
//! | [`ports`] | `ContentSource` and `CiEngine` traits |
//! | [`fakes`] | In-memory port implementations for tests |

pub mod errors;
pub mod evaluator;
pub mod event;
pub mod fakes;
pub mod identifiers;
pub mod job;
pub mod matcher;
pub mod outcome;
pub mod ports;
pub mod template;
pub mod trigger;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{CiError, ContentError, PushError};
pub use evaluator::{evaluate, should_trigger, TriggerDecision};
pub use event::{Commit, PushEvent, Repository, RepositoryOwner};
pub use identifiers::{BranchName, CommitSha, DeliveryId, EntryPoint, JobName, WorkflowPath};
pub use job::{BuildParameters, JobDescriptor, JobIdentity};
pub use matcher::PathPattern;
pub use outcome::{JobProvisioning, PushOutcome, SkipReason};
pub use ports::{CiEngine, ContentSource};
pub use template::JobTemplate;
pub use trigger::{BranchFilter, PushRule, TriggerConfig};
