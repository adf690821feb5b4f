//! pushbridge GitHub infrastructure adapter.
//!
//! Implements [`pipeline::ContentSource`] over the GitHub REST contents API
//! (`GET /repos/{owner}/{repo}/contents/{path}?ref={sha}`).
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules.
//! URL construction, authentication, status mapping, and base64 decoding are
//! handled here; the [`pipeline`] crate never sees them.

mod client;

pub use client::{GithubConfig, GithubContentClient, GithubError, DEFAULT_API_BASE};
