//! pushbridge push-event orchestration.
//!
//! [`PushHandler`] drives one push event through the flow: fetch the workflow
//! file, evaluate its push rule, and on a match let [`JobProvisioner`] ensure
//! the CI job and enqueue a build.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** This crate sequences calls between the business
//! logic in [`pipeline`] and the port traits ([`pipeline::ContentSource`],
//! [`pipeline::CiEngine`]). It contains no domain rules of its own and no
//! transport code.

mod handler;
mod provisioner;

pub use handler::{PushHandler, DEFAULT_WORKFLOW_PATH};
pub use provisioner::JobProvisioner;
