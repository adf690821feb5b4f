//! HTTP server receiving GitHub webhook deliveries.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use dispatch::PushHandler;
use pipeline::{DeliveryId, PushError, PushEvent, PushOutcome};
use thiserror::Error;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::WebhookSecret;

const EVENT_HEADER: &str = "x-github-event";
const DELIVERY_HEADER: &str = "x-github-delivery";
const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Errors running the webhook server.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Webhook server failed: {0}")]
    Serve(#[source] std::io::Error),
}

/// Shared state of the webhook routes.
#[derive(Clone)]
pub struct WebhookState {
    handler: Arc<PushHandler>,
    secret: Option<WebhookSecret>,
}

impl WebhookState {
    /// `secret` of `None` disables signature verification.
    pub fn new(handler: Arc<PushHandler>, secret: Option<WebhookSecret>) -> Self {
        Self { handler, secret }
    }
}

/// Builds the router:
///
/// - `POST /webhook` - GitHub deliveries
/// - `GET  /health` - liveness probe
pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route("/webhook", post(receive_webhook))
        .route("/health", get(health))
        .with_state(state)
}

/// Binds `addr` and serves webhooks until `shutdown` resolves.
pub async fn serve(
    addr: SocketAddr,
    state: WebhookState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ListenerError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ListenerError::Bind { addr, source })?;
    info!(%addr, "Listening for GitHub webhooks");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ListenerError::Serve)
}

async fn health() -> &'static str {
    "ok"
}

/// Accepts one delivery.
///
/// Push events are handed to a spawned task and acknowledged with `202`
/// before processing starts; the task logs the outcome. Pings get `200`,
/// other events `204`.
pub async fn receive_webhook(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let delivery = header(&headers, DELIVERY_HEADER)
        .and_then(DeliveryId::new)
        .unwrap_or_else(DeliveryId::generate);

    if let Some(secret) = &state.secret {
        if let Err(err) = secret.verify(&body, header(&headers, SIGNATURE_HEADER)) {
            warn!(%delivery, error = %err, "Rejected webhook delivery");
            return StatusCode::UNAUTHORIZED;
        }
    }

    match header(&headers, EVENT_HEADER) {
        Some("ping") => {
            info!(%delivery, "Received ping");
            StatusCode::OK
        }
        Some("push") => match serde_json::from_slice::<PushEvent>(&body) {
            Ok(event) => {
                tokio::spawn(process_push(state.handler.clone(), delivery, event));
                StatusCode::ACCEPTED
            }
            Err(err) => {
                warn!(%delivery, error = %err, "Malformed push payload");
                StatusCode::BAD_REQUEST
            }
        },
        other => {
            debug!(%delivery, event = ?other, "Ignoring event");
            StatusCode::NO_CONTENT
        }
    }
}

/// Runs one push event through `handler` and logs the result.
///
/// The result is returned for callers that await it directly; the webhook
/// route drops it.
pub async fn process_push(
    handler: Arc<PushHandler>,
    delivery: DeliveryId,
    event: PushEvent,
) -> Result<PushOutcome, PushError> {
    let span = info_span!(
        "push",
        %delivery,
        owner = event.owner(),
        repo = event.repo(),
        reference = %event.reference,
    );

    async move {
        match handler.handle(&event).await {
            Ok(outcome) => {
                match &outcome {
                    PushOutcome::Triggered { job, provisioning } => {
                        info!(job = %job, %provisioning, "Successfully processed push event")
                    }
                    PushOutcome::Skipped { reason } => {
                        info!(%reason, "Push event produced no build")
                    }
                }
                Ok(outcome)
            }
            Err(err) => {
                error!(kind = err.kind(), error = %err, "Error processing push event");
                Err(err)
            }
        }
    }
    .instrument(span)
    .await
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::sign;
    use axum::http::HeaderValue;
    use pipeline::fakes::{MemoryCiEngine, MemoryContentSource};
    use pipeline::{JobTemplate, WorkflowPath};
    use serde_json::json;

    const SECRET: &str = "s3cret";

    fn handler(ci: &Arc<MemoryCiEngine>) -> Arc<PushHandler> {
        let content = MemoryContentSource::new().with_file(
            "acme",
            "site",
            ".github/workflows/main.yml",
            "on:\n  push:\n    branches: [main]\n",
        );
        Arc::new(PushHandler::from_parts(
            Arc::new(content),
            ci.clone(),
            JobTemplate::default(),
            WorkflowPath::new(".github/workflows/main.yml").unwrap(),
        ))
    }

    fn state(ci: &Arc<MemoryCiEngine>) -> WebhookState {
        WebhookState::new(handler(ci), WebhookSecret::new(SECRET))
    }

    fn push_body() -> Bytes {
        Bytes::from(
            serde_json::to_vec(&json!({
                "ref": "refs/heads/main",
                "after": "5f2c3e0e8a9b4d1c7f6e5d4c3b2a1908f7e6d5c4",
                "repository": { "name": "site", "owner": { "login": "acme" } },
                "commits": [{ "message": "Ship it", "modified": ["src/app.js"] }]
            }))
            .unwrap(),
        )
    }

    fn headers(event: &str, body: &[u8], secret: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(EVENT_HEADER, HeaderValue::from_str(event).unwrap());
        headers.insert(
            DELIVERY_HEADER,
            HeaderValue::from_static("72d3162e-cc78-11e3-81ab-4c9367dc0958"),
        );
        headers.insert(
            SIGNATURE_HEADER,
            HeaderValue::from_str(&sign(secret, body)).unwrap(),
        );
        headers
    }

    #[tokio::test]
    async fn push_is_accepted() {
        let ci = Arc::new(MemoryCiEngine::new());
        let body = push_body();
        let status =
            receive_webhook(State(state(&ci)), headers("push", &body, SECRET), body).await;
        assert_eq!(status, StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn bad_signature_is_unauthorized() {
        let ci = Arc::new(MemoryCiEngine::new());
        let body = push_body();
        let status =
            receive_webhook(State(state(&ci)), headers("push", &body, "wrong"), body).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(ci.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_signature_is_unauthorized_when_secret_configured() {
        let ci = Arc::new(MemoryCiEngine::new());
        let body = push_body();
        let mut headers = headers("push", &body, SECRET);
        headers.remove(SIGNATURE_HEADER);
        let status = receive_webhook(State(state(&ci)), headers, body).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unsigned_delivery_accepted_without_secret() {
        let ci = Arc::new(MemoryCiEngine::new());
        let body = Bytes::from_static(br#"{"zen":"Design for failure."}"#);
        let mut headers = headers("ping", &body, SECRET);
        headers.remove(SIGNATURE_HEADER);
        let state = WebhookState::new(handler(&ci), None);
        assert_eq!(
            receive_webhook(State(state), headers, body).await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn other_events_are_ignored() {
        let ci = Arc::new(MemoryCiEngine::new());
        let body = Bytes::from_static(b"{}");
        let status =
            receive_webhook(State(state(&ci)), headers("issues", &body, SECRET), body).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn malformed_push_is_bad_request() {
        let ci = Arc::new(MemoryCiEngine::new());
        let body = Bytes::from_static(br#"{"ref": 7}"#);
        let status =
            receive_webhook(State(state(&ci)), headers("push", &body, SECRET), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn process_push_runs_the_flow() {
        let ci = Arc::new(MemoryCiEngine::new());
        let event: PushEvent = serde_json::from_slice(&push_body()).unwrap();

        let outcome = process_push(handler(&ci), DeliveryId::generate(), event)
            .await
            .unwrap();

        assert!(matches!(outcome, PushOutcome::Triggered { .. }));
        assert!(ci.definition("acme_site_main").is_some());
    }

    #[tokio::test]
    async fn process_push_returns_errors_instead_of_panicking() {
        let ci = Arc::new(MemoryCiEngine::new().failing_lookups());
        let event: PushEvent = serde_json::from_slice(&push_body()).unwrap();

        let err = process_push(handler(&ci), DeliveryId::generate(), event)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "job_lookup");
    }
}
