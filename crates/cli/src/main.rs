//! pushbridge entry point.
//!
//! This binary is the composition root. It:
//!
//! 1. Parses configuration from flags and environment variables.
//! 2. Installs the tracing subscriber (human or JSON lines, optional OTLP).
//! 3. Builds the GitHub and Jenkins clients and injects them into a
//!    [`dispatch::PushHandler`].
//! 4. Serves the webhook listener until Ctrl-C.

mod telemetry;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use clap::Parser;
use dispatch::{PushHandler, DEFAULT_WORKFLOW_PATH};
use github::{GithubConfig, GithubContentClient, DEFAULT_API_BASE};
use jenkins::{JenkinsClient, JenkinsConfig};
use listener::{WebhookSecret, WebhookState};
use pipeline::{EntryPoint, JobTemplate, WorkflowPath};
use tracing::{info, warn};

/// Creates and triggers Jenkins pipeline jobs for GitHub pushes.
#[derive(Parser)]
#[command(name = "pushbridge", version = env!("CARGO_PKG_VERSION"))]
struct Config {
    /// Address the webhook listener binds.
    #[arg(long, env = "PUSHBRIDGE_LISTEN_ADDR", default_value = "0.0.0.0:3000")]
    listen_addr: SocketAddr,

    /// Secret configured on the GitHub webhook. Unset disables signature
    /// checks.
    #[arg(long, env = "GITHUB_WEBHOOK_SECRET", hide_env_values = true)]
    webhook_secret: Option<String>,

    /// Token for the GitHub contents API.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_BASE)]
    github_api_url: String,

    /// Workflow file whose `on.push` section decides whether to build.
    #[arg(long, env = "PUSHBRIDGE_WORKFLOW_PATH", default_value = DEFAULT_WORKFLOW_PATH)]
    workflow_path: String,

    /// Jenkins controller root URL.
    #[arg(long, env = "JENKINS_URL")]
    jenkins_url: String,

    #[arg(long, env = "JENKINS_USER")]
    jenkins_user: Option<String>,

    #[arg(long, env = "JENKINS_TOKEN", hide_env_values = true)]
    jenkins_token: Option<String>,

    /// Request a CSRF crumb before each POST to Jenkins.
    #[arg(long, env = "JENKINS_CRUMB")]
    jenkins_crumb: bool,

    /// Shared-library step invoked by generated pipelines.
    #[arg(long, env = "PUSHBRIDGE_ENTRY_POINT")]
    entry_point: Option<String>,

    /// Timeout for each GitHub and Jenkins request.
    #[arg(long, env = "PUSHBRIDGE_HTTP_TIMEOUT_SECS", default_value_t = 30)]
    http_timeout_secs: u64,

    /// Emit newline-delimited JSON logs.
    #[arg(long, env = "PUSHBRIDGE_JSON_LOGS")]
    json_logs: bool,

    /// OTLP/gRPC collector endpoint for trace export.
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    otlp_endpoint: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    let telemetry = telemetry::init(config.json_logs, config.otlp_endpoint.as_deref())?;

    let result = run(config).await;
    if let Err(err) = &result {
        tracing::error!(error = %format!("{err:#}"), "pushbridge exited with an error");
    }

    telemetry.shutdown();
    result
}

async fn run(config: Config) -> anyhow::Result<()> {
    let timeout = Duration::from_secs(config.http_timeout_secs);

    let github = GithubContentClient::new(GithubConfig {
        api_base: config.github_api_url,
        token: config.github_token,
        timeout,
        ..GithubConfig::default()
    })
    .context("building GitHub client")?;

    let jenkins = JenkinsClient::new(JenkinsConfig {
        user: config.jenkins_user,
        api_token: config.jenkins_token,
        use_crumb: config.jenkins_crumb,
        timeout,
        ..JenkinsConfig::new(config.jenkins_url)
    })
    .context("building Jenkins client")?;

    let template = match config.entry_point {
        Some(entry_point) => JobTemplate::new(
            EntryPoint::new(entry_point).ok_or_else(|| anyhow!("--entry-point must not be empty"))?,
        ),
        None => JobTemplate::default(),
    };
    let workflow_path = WorkflowPath::new(config.workflow_path)
        .ok_or_else(|| anyhow!("--workflow-path must not be empty"))?;

    let handler = PushHandler::from_parts(
        Arc::new(github),
        Arc::new(jenkins),
        template,
        workflow_path,
    );

    let secret = config.webhook_secret.and_then(WebhookSecret::new);
    if secret.is_none() {
        warn!("No webhook secret configured; deliveries are not authenticated");
    }

    info!(
        workflow = %handler.workflow_path(),
        "Starting pushbridge"
    );
    let state = WebhookState::new(Arc::new(handler), secret);
    listener::serve(config.listen_addr, state, shutdown_signal()).await?;

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Failed to listen for Ctrl-C; running until killed");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_well_formed() {
        Config::command().debug_assert();
    }

    #[test]
    fn defaults_apply() {
        let config = Config::try_parse_from([
            "pushbridge",
            "--jenkins-url",
            "https://jenkins.example.com",
        ])
        .unwrap();
        assert_eq!(config.workflow_path, ".github/workflows/main.yml");
        assert_eq!(config.http_timeout_secs, 30);
        assert!(!config.jenkins_crumb);
    }
}
