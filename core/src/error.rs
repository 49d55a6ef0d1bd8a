//! Error types for the CircleCI API client.
//!
//! # Design
//! `NotFound` gets a dedicated variant because callers frequently distinguish
//! "the build does not exist" from "the server returned an unexpected
//! status." All other non-2xx responses land in `Http` with the raw status
//! code and body for debugging. `BranchNotFound` and `NoSuccessfulBuild` are
//! detected locally, before any request is made.

use std::fmt;

/// Errors returned by `Client` operations.
#[derive(Debug)]
pub enum ApiError {
    /// A relative endpoint path or artifact URL could not be resolved into
    /// a valid URL.
    MalformedUrl(String),

    /// The HTTP round trip itself failed (connection refused, DNS, TLS).
    Transport(String),

    /// The server returned 404 — the requested build does not exist.
    NotFound,

    /// The server returned a non-2xx status other than 404.
    Http { status: u16, body: String },

    /// The named branch is not present in the project's branch mapping.
    BranchNotFound(String),

    /// The branch exists but has never had a successful build, so there is
    /// no build to fetch artifacts for.
    NoSuccessfulBuild(String),

    /// The response body could not be deserialized into the expected type.
    Deserialization(String),

    /// The local artifact file could not be created or written.
    Filesystem(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::MalformedUrl(msg) => write!(f, "malformed URL: {msg}"),
            ApiError::Transport(msg) => write!(f, "transport failure: {msg}"),
            ApiError::NotFound => write!(f, "build not found"),
            ApiError::Http { status, body } => write!(f, "HTTP {status}: {body}"),
            ApiError::BranchNotFound(branch) => {
                write!(f, "branch not found: {branch}")
            }
            ApiError::NoSuccessfulBuild(branch) => {
                write!(f, "branch {branch} has no successful build")
            }
            ApiError::Deserialization(msg) => {
                write!(f, "deserialization failed: {msg}")
            }
            ApiError::Filesystem(msg) => write!(f, "filesystem error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}
