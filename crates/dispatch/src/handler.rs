//! The per-event push flow.

use std::sync::Arc;

use pipeline::{
    evaluate, CommitSha, ContentSource, JobTemplate, PushError, PushEvent, PushOutcome,
    SkipReason, TriggerConfig, TriggerDecision, WorkflowPath,
};
use tracing::{debug, info, warn};

use crate::JobProvisioner;

/// Workflow file consulted when none is configured.
pub const DEFAULT_WORKFLOW_PATH: &str = ".github/workflows/main.yml";

/// Handles push events end to end.
///
/// Holds no per-event state; one instance is shared by every concurrent
/// event.
#[derive(Clone)]
pub struct PushHandler {
    content: Arc<dyn ContentSource>,
    provisioner: JobProvisioner,
    workflow_path: WorkflowPath,
}

impl PushHandler {
    pub fn new(
        content: Arc<dyn ContentSource>,
        provisioner: JobProvisioner,
        workflow_path: WorkflowPath,
    ) -> Self {
        Self {
            content,
            provisioner,
            workflow_path,
        }
    }

    /// Convenience constructor wiring a [`JobProvisioner`] from its parts.
    pub fn from_parts(
        content: Arc<dyn ContentSource>,
        ci: Arc<dyn pipeline::CiEngine>,
        template: JobTemplate,
        workflow_path: WorkflowPath,
    ) -> Self {
        Self::new(content, JobProvisioner::new(ci, template), workflow_path)
    }

    pub fn workflow_path(&self) -> &WorkflowPath {
        &self.workflow_path
    }

    /// Processes one push event.
    ///
    /// Steps run strictly in sequence: fetch the workflow at the pushed
    /// commit, parse it, evaluate the push rule, then ensure the job and
    /// enqueue a build. Tag pushes and branch deletions are skipped before any
    /// I/O.
    ///
    /// # Errors
    ///
    /// Any [`PushError`]; the first failing step aborts the event.
    pub async fn handle(&self, event: &PushEvent) -> Result<PushOutcome, PushError> {
        let owner = event.owner();
        let repo = event.repo();

        let Some(branch) = event.branch() else {
            debug!(reference = %event.reference, "Ignoring push to non-branch ref");
            return Ok(skipped(SkipReason::NotABranch));
        };
        let head = match event.head_sha() {
            Some(sha) if !event.deleted && !sha.is_null() => sha,
            _ => {
                debug!(branch = %branch, "Ignoring branch deletion");
                return Ok(skipped(SkipReason::BranchDeleted));
            }
        };

        let config = self.load_trigger_config(owner, repo, &head).await?;

        match evaluate(&config, branch.as_str(), event) {
            TriggerDecision::Skip(reason) => {
                info!(
                    owner,
                    repo,
                    branch = %branch,
                    %reason,
                    "Skipping build - trigger conditions not met"
                );
                Ok(skipped(reason))
            }
            TriggerDecision::Matched {
                branch_filter_ignored,
            } => {
                if branch_filter_ignored {
                    warn!(
                        owner,
                        repo,
                        path = %self.workflow_path,
                        "push.branches uses an unsupported form and was not evaluated"
                    );
                }
                let provisioning = self
                    .provisioner
                    .ensure_job(owner, repo, branch.as_str())
                    .await?;
                let job = self
                    .provisioner
                    .trigger_build(owner, repo, branch.as_str(), event)
                    .await?;
                Ok(PushOutcome::Triggered { job, provisioning })
            }
        }
    }

    /// Fetches and parses the workflow file at `reference`.
    ///
    /// # Errors
    ///
    /// [`PushError::ConfigFetch`] or [`PushError::ConfigParse`].
    pub async fn load_trigger_config(
        &self,
        owner: &str,
        repo: &str,
        reference: &CommitSha,
    ) -> Result<TriggerConfig, PushError> {
        let text = self
            .content
            .fetch_file(owner, repo, &self.workflow_path, reference)
            .await
            .map_err(|source| PushError::ConfigFetch {
                path: self.workflow_path.clone(),
                source,
            })?;

        TriggerConfig::from_workflow_yaml(&text).map_err(|source| PushError::ConfigParse {
            path: self.workflow_path.clone(),
            source,
        })
    }
}

fn skipped(reason: SkipReason) -> PushOutcome {
    PushOutcome::Skipped { reason }
}
