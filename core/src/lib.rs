//! Synchronous client library for the CircleCI v1 REST API.
//!
//! # Overview
//! Builds authenticated requests, executes them as blocking HTTP round
//! trips, decodes the JSON responses into typed models, and downloads build
//! artifacts to local storage. One network round trip per operation, no
//! background work, no shared mutable state.
//!
//! # Design
//! - `Client` holds only immutable configuration (base URL, token, user
//!   agent) and a shared HTTP agent, so concurrent use from multiple
//!   threads is safe.
//! - Each endpoint operation is split into `build_*` (produces an
//!   `HttpRequest`) and `parse_*` (consumes an `HttpResponse`), with an
//!   executing method composing the two. Request construction and decoding
//!   are testable without a network.
//! - Every request carries the token as a `token` query parameter,
//!   regardless of caller-supplied parameters.

pub mod client;
mod download;
pub mod error;
pub mod http;
pub mod types;

pub use client::{Client, DEFAULT_BASE_URL};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use types::{
    Action, Artifact, Branch, Build, DetailedBuild, PreviousBuild, Project, Step,
};
