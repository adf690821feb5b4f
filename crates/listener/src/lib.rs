//! pushbridge trigger event source.
//!
//! Binds an HTTP server (axum) and receives GitHub webhook deliveries
//! directly (or via smee.io in development). Every delivery's
//! `X-Hub-Signature-256` is validated against the configured secret before
//! the payload is looked at.
//!
//! Push deliveries are acknowledged immediately and processed on their own
//! tokio task by [`dispatch::PushHandler`]. A failing event is logged by that
//! task and affects nothing else.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Transport details and payload deserialisation live
//! here. The [`dispatch`] and [`pipeline`] crates see only [`pipeline::PushEvent`].

mod server;
mod signature;

pub use server::{process_push, receive_webhook, router, serve, ListenerError, WebhookState};
pub use signature::{SignatureError, WebhookSecret};
