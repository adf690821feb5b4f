//! In-memory fakes for the port traits (testing only)
//!
//! Provides `MemoryContentSource` and `MemoryCiEngine`, which satisfy the
//! trait contracts without any network access and record every call so tests
//! can assert on the exact sequence the flow produced.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::ports::{CiEngine, ContentSource};
use crate::{CiError, CommitSha, ContentError, JobDescriptor, JobName, WorkflowPath};

// ---------------------------------------------------------------------------
// MemoryContentSource
// ---------------------------------------------------------------------------

/// Repository files keyed by `owner/repo/path`, served at any ref.
#[derive(Debug, Default)]
pub struct MemoryContentSource {
    files: Mutex<HashMap<String, String>>,
    requests: Mutex<Vec<(String, CommitSha)>>,
    fail_with_status: Option<u16>,
}

impl MemoryContentSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A source whose every request fails with `status`.
    pub fn failing(status: u16) -> Self {
        Self {
            fail_with_status: Some(status),
            ..Self::default()
        }
    }

    /// Stores `content` as the file at `owner/repo/path`.
    pub fn with_file(self, owner: &str, repo: &str, path: &str, content: &str) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(format!("{owner}/{repo}/{path}"), content.to_owned());
        self
    }

    /// Every `(owner/repo/path, ref)` requested so far.
    pub fn requests(&self) -> Vec<(String, CommitSha)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentSource for MemoryContentSource {
    async fn fetch_file(
        &self,
        owner: &str,
        repo: &str,
        path: &WorkflowPath,
        reference: &CommitSha,
    ) -> Result<String, ContentError> {
        let key = format!("{owner}/{repo}/{path}");
        self.requests
            .lock()
            .unwrap()
            .push((key.clone(), reference.clone()));

        if let Some(status) = self.fail_with_status {
            return Err(ContentError::Status {
                status,
                body: "simulated failure".to_owned(),
            });
        }

        self.files
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or_else(|| ContentError::NotFound {
                path: path.to_string(),
                reference: reference.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// MemoryCiEngine
// ---------------------------------------------------------------------------

/// One recorded call against [`MemoryCiEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CiCall {
    GetJob(JobName),
    CreateJob(JobName),
    UpdateJob(JobName),
    EnqueueBuild(JobName, BTreeMap<String, String>),
}

/// In-memory CI engine backed by a `BTreeMap<job name, definition>`.
#[derive(Debug, Default)]
pub struct MemoryCiEngine {
    jobs: Mutex<BTreeMap<String, String>>,
    calls: Mutex<Vec<CiCall>>,
    fail_lookups: bool,
    fail_builds: bool,
}

impl MemoryCiEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `get_job` fails with HTTP 500.
    pub fn failing_lookups(mut self) -> Self {
        self.fail_lookups = true;
        self
    }

    /// Every `enqueue_build` fails with HTTP 500.
    pub fn failing_builds(mut self) -> Self {
        self.fail_builds = true;
        self
    }

    /// Pre-populates a job.
    pub fn with_job(self, name: &str, definition: &str) -> Self {
        self.jobs
            .lock()
            .unwrap()
            .insert(name.to_owned(), definition.to_owned());
        self
    }

    /// Current definition of `name`, if the job exists.
    pub fn definition(&self, name: &str) -> Option<String> {
        self.jobs.lock().unwrap().get(name).cloned()
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<CiCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: CiCall) {
        self.calls.lock().unwrap().push(call);
    }
}

fn simulated_failure() -> CiError {
    CiError::Status {
        status: 500,
        body: "simulated failure".to_owned(),
    }
}

#[async_trait]
impl CiEngine for MemoryCiEngine {
    async fn get_job(&self, name: &JobName) -> Result<JobDescriptor, CiError> {
        self.record(CiCall::GetJob(name.clone()));
        if self.fail_lookups {
            return Err(simulated_failure());
        }
        if self.jobs.lock().unwrap().contains_key(name.as_str()) {
            Ok(JobDescriptor {
                name: name.to_string(),
                url: None,
                buildable: Some(true),
            })
        } else {
            Err(CiError::NotFound(name.clone()))
        }
    }

    async fn create_job(&self, name: &JobName, definition: &str) -> Result<(), CiError> {
        self.record(CiCall::CreateJob(name.clone()));
        let mut jobs = self.jobs.lock().unwrap();
        if jobs.contains_key(name.as_str()) {
            return Err(CiError::Status {
                status: 400,
                body: format!("A job already exists with the name '{name}'"),
            });
        }
        jobs.insert(name.to_string(), definition.to_owned());
        Ok(())
    }

    async fn update_job(&self, name: &JobName, definition: &str) -> Result<(), CiError> {
        self.record(CiCall::UpdateJob(name.clone()));
        let mut jobs = self.jobs.lock().unwrap();
        match jobs.get_mut(name.as_str()) {
            Some(existing) => {
                *existing = definition.to_owned();
                Ok(())
            }
            None => Err(CiError::NotFound(name.clone())),
        }
    }

    async fn enqueue_build(
        &self,
        name: &JobName,
        parameters: &BTreeMap<String, String>,
    ) -> Result<(), CiError> {
        self.record(CiCall::EnqueueBuild(name.clone(), parameters.clone()));
        if self.fail_builds {
            return Err(simulated_failure());
        }
        if !self.jobs.lock().unwrap().contains_key(name.as_str()) {
            return Err(CiError::NotFound(name.clone()));
        }
        Ok(())
    }
}
