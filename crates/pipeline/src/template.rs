//! Job-definition rendering.
//!
//! Every generated job has the same shape: six string parameters and a
//! declarative pipeline whose single stage hands the push coordinates to a
//! shared-library entry point. The pipeline text is embedded in the job's
//! `flow-definition` XML as escaped character data.

use std::fmt::Write as _;

use crate::job::{
    PARAM_BRANCH_NAME, PARAM_COMMIT_MESSAGE, PARAM_COMMIT_SHA, PARAM_JENKINSFILE,
    PARAM_REPO_NAME, PARAM_REPO_OWNER,
};
use crate::{EntryPoint, JobIdentity};

/// Parameter declarations of the job document: name, description, trim.
const JOB_PARAMETERS: [(&str, &str, bool); 6] = [
    (PARAM_REPO_OWNER, "Repository owner", true),
    (PARAM_REPO_NAME, "Repository name", true),
    (PARAM_BRANCH_NAME, "Branch name", true),
    (PARAM_COMMIT_SHA, "Commit SHA", true),
    (PARAM_COMMIT_MESSAGE, "Commit message", true),
    (PARAM_JENKINSFILE, "Jenkinsfile content", false),
];

/// Renders pipeline text and job documents for a fixed entry point.
#[derive(Debug, Clone, Default)]
pub struct JobTemplate {
    entry_point: EntryPoint,
}

impl JobTemplate {
    pub fn new(entry_point: EntryPoint) -> Self {
        Self { entry_point }
    }

    pub fn entry_point(&self) -> &EntryPoint {
        &self.entry_point
    }

    /// Renders the declarative pipeline for `identity`.
    ///
    /// Owner, repository, and branch become the defaults of the first three
    /// parameters; SHA and message are supplied per build.
    pub fn pipeline_script(&self, identity: &JobIdentity) -> String {
        let owner = groovy_quote(identity.owner());
        let repo = groovy_quote(identity.repo());
        let branch = groovy_quote(identity.branch());
        let entry_point = self.entry_point.as_str();

        format!(
            r#"
pipeline {{
  agent any

  parameters {{
    string(name: '{PARAM_REPO_OWNER}', defaultValue: '{owner}')
    string(name: '{PARAM_REPO_NAME}', defaultValue: '{repo}')
    string(name: '{PARAM_BRANCH_NAME}', defaultValue: '{branch}')
    string(name: '{PARAM_COMMIT_SHA}', defaultValue: '')
    string(name: '{PARAM_COMMIT_MESSAGE}', defaultValue: '')
  }}

  stages {{
    stage('Process') {{
      steps {{
        {entry_point}(
          repoOwner: params.{PARAM_REPO_OWNER},
          repoName: params.{PARAM_REPO_NAME},
          branch: params.{PARAM_BRANCH_NAME},
          commitSha: params.{PARAM_COMMIT_SHA}
        )
      }}
    }}
  }}
}}"#
        )
    }

    /// Renders the complete job document for `identity`.
    pub fn job_config_xml(&self, identity: &JobIdentity) -> String {
        render_job_config(&self.pipeline_script(identity))
    }
}

/// Wraps `script` in a Jenkins `flow-definition` document.
pub fn render_job_config(script: &str) -> String {
    let mut parameters = String::new();
    for (name, description, trim) in JOB_PARAMETERS {
        // Writing to a String cannot fail.
        let _ = write!(
            parameters,
            r#"
        <hudson.model.StringParameterDefinition>
          <name>{name}</name>
          <description>{description}</description>
          <defaultValue></defaultValue>
          <trim>{trim}</trim>
        </hudson.model.StringParameterDefinition>"#
        );
    }
    let script = escape_xml_text(script);

    format!(
        r#"<?xml version='1.1' encoding='UTF-8'?>
<flow-definition plugin="workflow-job@2.40">
  <description></description>
  <keepDependencies>false</keepDependencies>
  <properties>
    <org.jenkinsci.plugins.workflow.job.properties.PipelineTriggersJobProperty>
      <triggers/>
    </org.jenkinsci.plugins.workflow.job.properties.PipelineTriggersJobProperty>
    <hudson.model.ParametersDefinitionProperty>
      <parameterDefinitions>{parameters}
      </parameterDefinitions>
    </hudson.model.ParametersDefinitionProperty>
  </properties>
  <definition class="org.jenkinsci.plugins.workflow.cps.CpsFlowDefinition" plugin="workflow-cps@2.90">
    <script>{script}</script>
    <sandbox>true</sandbox>
  </definition>
  <triggers/>
  <disabled>false</disabled>
</flow-definition>"#
    )
}

/// Escapes XML character data: `&` first, then `<`, then `>`.
pub fn escape_xml_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escapes a value for a single-quoted Groovy string literal.
fn groovy_quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn escapes_in_fixed_order_without_double_escaping() {
        assert_eq!(
            escape_xml_text("a < b && c > d"),
            "a &lt; b &amp;&amp; c &gt; d"
        );
        assert_eq!(escape_xml_text("&lt;"), "&amp;lt;");
        assert_eq!(escape_xml_text("<&>"), "&lt;&amp;&gt;");
    }

    #[test]
    fn pipeline_script_embeds_coordinates_and_entry_point() {
        let template = JobTemplate::default();
        let script = template.pipeline_script(&JobIdentity::new("acme", "site", "main"));

        assert!(script.contains("string(name: 'REPO_OWNER', defaultValue: 'acme')"));
        assert!(script.contains("string(name: 'REPO_NAME', defaultValue: 'site')"));
        assert!(script.contains("string(name: 'BRANCH_NAME', defaultValue: 'main')"));
        assert!(script.contains("string(name: 'COMMIT_SHA', defaultValue: '')"));
        assert!(script.contains("githubActionsEntryPoint("));
        assert!(script.contains("commitSha: params.COMMIT_SHA"));
        assert!(!script.contains("JENKINSFILE"));
    }

    #[test]
    fn pipeline_script_quotes_hostile_branch_names() {
        let template = JobTemplate::new(EntryPoint::new("sharedEntry").unwrap());
        assert_eq!(template.entry_point().as_str(), "sharedEntry");
        let script = template.pipeline_script(&JobIdentity::new("acme", "site", r"it's\x"));
        assert!(script.contains(r"defaultValue: 'it\'s\\x'"));
        assert!(script.contains("sharedEntry("));
    }

    #[test]
    fn job_document_declares_parameters_and_escaped_script() {
        let xml = render_job_config("if (a < b && c > d) {}");

        assert!(xml.starts_with("<?xml version='1.1' encoding='UTF-8'?>"));
        assert_eq!(
            xml.matches("<hudson.model.StringParameterDefinition>").count(),
            6
        );
        for name in [
            "REPO_OWNER",
            "REPO_NAME",
            "BRANCH_NAME",
            "COMMIT_SHA",
            "COMMIT_MESSAGE",
            "JENKINSFILE",
        ] {
            assert!(xml.contains(&format!("<name>{name}</name>")), "{name}");
        }
        assert!(xml.contains("<script>if (a &lt; b &amp;&amp; c &gt; d) {}</script>"));
        assert!(xml.contains("<sandbox>true</sandbox>"));
        assert!(xml.contains("<trim>false</trim>"));
        assert!(xml.contains("<triggers/>\n  <disabled>false</disabled>"));
    }

    #[test]
    fn rendered_job_document_has_no_raw_angle_brackets_in_script() {
        let template = JobTemplate::default();
        let xml = template.job_config_xml(&JobIdentity::new("acme", "site", "a<b>&c"));
        let start = xml.find("<script>").unwrap() + "<script>".len();
        let end = xml.find("</script>").unwrap();
        let body = &xml[start..end];
        assert!(!body.contains('<'));
        assert!(!body.contains('>'));
        assert!(body.contains("a&lt;b&gt;&amp;c"));
    }
}
