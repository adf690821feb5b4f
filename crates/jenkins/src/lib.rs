//! pushbridge Jenkins infrastructure adapter.
//!
//! Implements [`pipeline::CiEngine`] over the Jenkins remote-access API:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | get-job | `GET job/{name}/api/json` (`404` → [`pipeline::CiError::NotFound`]) |
//! | create-job | `POST createItem?name={name}` with the XML document |
//! | update-job | `POST job/{name}/config.xml` with the XML document |
//! | enqueue-build | `POST job/{name}/buildWithParameters`, form-encoded |
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Authentication (basic auth with an API token), CSRF
//! crumbs, URL encoding, and status mapping live here. The [`pipeline`] crate
//! sees only [`pipeline::CiEngine`].

mod client;

pub use client::{JenkinsClient, JenkinsConfig, JenkinsError};
