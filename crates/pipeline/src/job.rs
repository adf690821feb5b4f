//! CI job identity and build parameters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{JobName, PushEvent};

// ---------------------------------------------------------------------------
// Parameter names shared by the job definition and the build request
// ---------------------------------------------------------------------------

pub const PARAM_REPO_OWNER: &str = "REPO_OWNER";
pub const PARAM_REPO_NAME: &str = "REPO_NAME";
pub const PARAM_BRANCH_NAME: &str = "BRANCH_NAME";
pub const PARAM_COMMIT_SHA: &str = "COMMIT_SHA";
pub const PARAM_COMMIT_MESSAGE: &str = "COMMIT_MESSAGE";
pub const PARAM_JENKINSFILE: &str = "JENKINSFILE";

/// Characters Jenkins refuses in item names.
const UNSAFE_NAME_CHARS: &[char] = &[
    '/', '\\', '?', '*', '%', '!', '@', '#', '$', '^', '&', '|', '<', '>', '[', ']', ':', ';',
];

// ---------------------------------------------------------------------------
// JobIdentity
// ---------------------------------------------------------------------------

/// The job that serves one (owner, repository, branch) triple.
///
/// The job name is `{owner}_{repo}_{branch}` with Jenkins-unsafe characters
/// replaced by `_`. Trailing dots are replaced too, since Jenkins rejects
/// item names ending in `.`. The mapping is not injective: `feature/x` and
/// `feature_x` share a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobIdentity {
    owner: String,
    repo: String,
    branch: String,
    name: JobName,
}

impl JobIdentity {
    /// Derives the identity for a branch of a repository.
    pub fn new(owner: &str, repo: &str, branch: &str) -> Self {
        let mut key: String = format!("{owner}_{repo}_{branch}")
            .chars()
            .map(|c| if UNSAFE_NAME_CHARS.contains(&c) { '_' } else { c })
            .collect();
        let kept = key.trim_end_matches('.').len();
        let dots = key.len() - kept;
        key.truncate(kept);
        key.extend(std::iter::repeat('_').take(dots));
        Self {
            owner: owner.to_owned(),
            repo: repo.to_owned(),
            branch: branch.to_owned(),
            name: JobName::from_key(key),
        }
    }

    /// The CI job name.
    pub fn name(&self) -> &JobName {
        &self.name
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }
}

impl std::fmt::Display for JobIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

// ---------------------------------------------------------------------------
// JobDescriptor
// ---------------------------------------------------------------------------

/// What the CI engine reports about an existing job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub buildable: Option<bool>,
}

// ---------------------------------------------------------------------------
// BuildParameters
// ---------------------------------------------------------------------------

/// Values passed to one build of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildParameters {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub commit_sha: String,
    /// Message of the first pushed commit; empty when the push had none.
    pub commit_message: String,
    /// Rendered pipeline text.
    pub jenkinsfile: String,
}

impl BuildParameters {
    /// Collects the parameters for a push to `identity`'s branch.
    pub fn for_push(identity: &JobIdentity, event: &PushEvent, jenkinsfile: String) -> Self {
        Self {
            owner: identity.owner().to_owned(),
            repo: identity.repo().to_owned(),
            branch: identity.branch().to_owned(),
            commit_sha: event.after.clone(),
            commit_message: event.first_commit_message().to_owned(),
            jenkinsfile,
        }
    }

    /// The parameter map submitted to the CI engine, keyed by parameter name.
    pub fn into_map(self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (PARAM_REPO_OWNER.to_string(), self.owner),
            (PARAM_REPO_NAME.to_string(), self.repo),
            (PARAM_BRANCH_NAME.to_string(), self.branch),
            (PARAM_COMMIT_SHA.to_string(), self.commit_sha),
            (PARAM_COMMIT_MESSAGE.to_string(), self.commit_message),
            (PARAM_JENKINSFILE.to_string(), self.jenkinsfile),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identity_is_underscore_joined() {
        let id = JobIdentity::new("acme", "site", "main");
        assert_eq!(id.name().as_str(), "acme_site_main");
        assert_eq!(id, JobIdentity::new("acme", "site", "main"));
    }

    #[test]
    fn unsafe_characters_are_substituted() {
        let id = JobIdentity::new("acme", "site", "feature/login#2");
        assert_eq!(id.name().as_str(), "acme_site_feature_login_2");
        assert_eq!(id.branch(), "feature/login#2");
    }

    #[test]
    fn trailing_dots_are_substituted() {
        assert_eq!(
            JobIdentity::new("acme", "site", "v1.").name().as_str(),
            "acme_site_v1_"
        );
        assert_eq!(
            JobIdentity::new("acme", "site", "..").name().as_str(),
            "acme_site___"
        );
        assert_eq!(
            JobIdentity::new("acme", "site", "v1.2").name().as_str(),
            "acme_site_v1.2"
        );
    }

    #[test]
    fn substituted_names_alias() {
        assert_eq!(
            JobIdentity::new("acme", "site", "feature/x").name(),
            JobIdentity::new("acme", "site", "feature_x").name()
        );
    }

    #[test]
    fn build_parameters_from_push() {
        let event: PushEvent = serde_json::from_value(json!({
            "ref": "refs/heads/main",
            "after": "abc123",
            "repository": { "name": "site", "owner": { "login": "acme" } },
            "commits": [
                { "message": "first" },
                { "message": "second" }
            ]
        }))
        .unwrap();
        let id = JobIdentity::new("acme", "site", "main");

        let map = BuildParameters::for_push(&id, &event, "pipeline {}".into()).into_map();

        assert_eq!(map["REPO_OWNER"], "acme");
        assert_eq!(map["REPO_NAME"], "site");
        assert_eq!(map["BRANCH_NAME"], "main");
        assert_eq!(map["COMMIT_SHA"], "abc123");
        assert_eq!(map["COMMIT_MESSAGE"], "first");
        assert_eq!(map["JENKINSFILE"], "pipeline {}");
        assert_eq!(map.len(), 6);
    }

    #[test]
    fn job_descriptor_reads_jenkins_json() {
        let descriptor: JobDescriptor = serde_json::from_value(json!({
            "_class": "org.jenkinsci.plugins.workflow.job.WorkflowJob",
            "name": "acme_site_main",
            "url": "https://ci.example.com/job/acme_site_main/",
            "buildable": true,
            "nextBuildNumber": 7
        }))
        .unwrap();
        assert_eq!(descriptor.name, "acme_site_main");
        assert_eq!(descriptor.buildable, Some(true));
    }
}
