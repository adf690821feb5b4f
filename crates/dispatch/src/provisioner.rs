//! Job provisioning and build triggering.

use std::sync::Arc;

use pipeline::{
    BuildParameters, CiEngine, JobIdentity, JobName, JobProvisioning, JobTemplate, PushError,
    PushEvent,
};
use tracing::{debug, info};

/// Ensures CI jobs exist and enqueues builds on them.
#[derive(Clone)]
pub struct JobProvisioner {
    ci: Arc<dyn CiEngine>,
    template: JobTemplate,
}

impl JobProvisioner {
    pub fn new(ci: Arc<dyn CiEngine>, template: JobTemplate) -> Self {
        Self { ci, template }
    }

    /// Makes sure the job for `owner/repo@branch` exists with a freshly
    /// rendered definition.
    ///
    /// An existing job is overwritten in full; a missing one is created.
    ///
    /// # Errors
    ///
    /// [`PushError::JobLookup`] if the lookup fails for any reason other than
    /// not-found; [`PushError::JobProvision`] if the create or update fails.
    pub async fn ensure_job(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<JobProvisioning, PushError> {
        let identity = JobIdentity::new(owner, repo, branch);
        let name = identity.name();
        let definition = self.template.job_config_xml(&identity);

        let action = match self.ci.get_job(name).await {
            Ok(existing) => {
                debug!(job = %name, url = ?existing.url, "Job exists");
                JobProvisioning::Updated
            }
            Err(err) if err.is_not_found() => JobProvisioning::Created,
            Err(source) => {
                return Err(PushError::JobLookup {
                    job: name.clone(),
                    source,
                })
            }
        };

        let result = match action {
            JobProvisioning::Updated => self.ci.update_job(name, &definition).await,
            JobProvisioning::Created => self.ci.create_job(name, &definition).await,
        };
        result.map_err(|source| PushError::JobProvision {
            job: name.clone(),
            action,
            source,
        })?;

        match action {
            JobProvisioning::Created => info!(job = %name, "Created CI job"),
            JobProvisioning::Updated => info!(job = %name, "Updated CI job"),
        }
        Ok(action)
    }

    /// Enqueues a build of the job for `owner/repo@branch`, parameterised with
    /// the push's head commit.
    ///
    /// # Errors
    ///
    /// [`PushError::BuildEnqueue`] if the engine rejects the request.
    pub async fn trigger_build(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        event: &PushEvent,
    ) -> Result<JobName, PushError> {
        let identity = JobIdentity::new(owner, repo, branch);
        let name = identity.name().clone();
        let script = self.template.pipeline_script(&identity);
        let parameters = BuildParameters::for_push(&identity, event, script).into_map();

        self.ci
            .enqueue_build(&name, &parameters)
            .await
            .map_err(|source| PushError::BuildEnqueue {
                job: name.clone(),
                source,
            })?;

        info!(job = %name, commit = %event.after, "Triggered build");
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline::fakes::{CiCall, MemoryCiEngine};
    use serde_json::json;

    fn provisioner(ci: &Arc<MemoryCiEngine>) -> JobProvisioner {
        JobProvisioner::new(ci.clone(), JobTemplate::default())
    }

    fn job(name: &str) -> JobName {
        JobName::new(name).unwrap()
    }

    #[tokio::test]
    async fn ensure_job_creates_once_then_updates() {
        let ci = Arc::new(MemoryCiEngine::new());
        let p = provisioner(&ci);

        assert_eq!(
            p.ensure_job("acme", "site", "main").await.unwrap(),
            JobProvisioning::Created
        );
        assert_eq!(
            p.ensure_job("acme", "site", "main").await.unwrap(),
            JobProvisioning::Updated
        );
        assert_eq!(
            p.ensure_job("acme", "site", "main").await.unwrap(),
            JobProvisioning::Updated
        );

        let creates = ci
            .calls()
            .iter()
            .filter(|c| matches!(c, CiCall::CreateJob(_)))
            .count();
        assert_eq!(creates, 1);
        assert_eq!(
            ci.calls()[..4],
            [
                CiCall::GetJob(job("acme_site_main")),
                CiCall::CreateJob(job("acme_site_main")),
                CiCall::GetJob(job("acme_site_main")),
                CiCall::UpdateJob(job("acme_site_main")),
            ]
        );
    }

    #[tokio::test]
    async fn update_overwrites_existing_definition() {
        let ci = Arc::new(MemoryCiEngine::new().with_job("acme_site_main", "<stale/>"));
        let p = provisioner(&ci);

        p.ensure_job("acme", "site", "main").await.unwrap();

        let definition = ci.definition("acme_site_main").unwrap();
        assert!(definition.starts_with("<?xml"));
        assert!(definition.contains("githubActionsEntryPoint("));
    }

    #[tokio::test]
    async fn lookup_failure_is_fatal_and_creates_nothing() {
        let ci = Arc::new(MemoryCiEngine::new().failing_lookups());
        let p = provisioner(&ci);

        let err = p.ensure_job("acme", "site", "main").await.unwrap_err();

        assert!(matches!(err, PushError::JobLookup { .. }));
        assert_eq!(ci.calls(), vec![CiCall::GetJob(job("acme_site_main"))]);
    }

    #[tokio::test]
    async fn trigger_build_sends_push_parameters() {
        let ci = Arc::new(MemoryCiEngine::new().with_job("acme_site_main", "<x/>"));
        let p = provisioner(&ci);
        let event: PushEvent = serde_json::from_value(json!({
            "ref": "refs/heads/main",
            "after": "deadbeef",
            "repository": { "name": "site", "owner": { "login": "acme" } },
            "commits": []
        }))
        .unwrap();

        let name = p.trigger_build("acme", "site", "main", &event).await.unwrap();

        assert_eq!(name.as_str(), "acme_site_main");
        let Some(CiCall::EnqueueBuild(_, params)) = ci.calls().pop() else {
            panic!("expected an enqueue call");
        };
        assert_eq!(params["COMMIT_SHA"], "deadbeef");
        assert_eq!(params["COMMIT_MESSAGE"], "");
        assert!(params["JENKINSFILE"].contains("pipeline {"));
    }

    #[tokio::test]
    async fn enqueue_failure_is_reported() {
        let ci = Arc::new(
            MemoryCiEngine::new()
                .with_job("acme_site_main", "<x/>")
                .failing_builds(),
        );
        let p = provisioner(&ci);
        let event: PushEvent = serde_json::from_value(json!({
            "ref": "refs/heads/main",
            "after": "deadbeef",
            "repository": { "name": "site", "owner": { "login": "acme" } }
        }))
        .unwrap();

        let err = p
            .trigger_build("acme", "site", "main", &event)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "build_enqueue");
    }
}
