//! Domain models for the CircleCI v1 API.
//!
//! # Design
//! These types mirror the service's JSON schema field-for-field using the
//! wire names (`pushed_at`, `build_num`, `vcs_revision`, ...). Fields the
//! service omits or nulls before a build reaches the relevant phase are
//! explicit `Option`s rather than zero values, so "not present" never
//! collides with "present but zero". Plain `String` fields default to empty
//! when the key is missing, matching the service's habit of dropping fields
//! from summary payloads.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A project followed by (or visible to) the authenticated user.
///
/// Branch names are unique within a project by construction of the
/// `branches` mapping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    #[serde(default)]
    pub vcs_url: String,
    #[serde(default)]
    pub followed: bool,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub reponame: String,
    #[serde(default)]
    pub branches: HashMap<String, Branch>,
}

/// Per-branch build history as embedded in a [`Project`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Branch {
    #[serde(default)]
    pub pusher_logins: Vec<String>,
    pub last_non_success: Option<Build>,
    pub last_success: Option<Build>,
    #[serde(default)]
    pub recent_builds: Vec<Build>,
    #[serde(default)]
    pub running_builds: Vec<Build>,
}

/// Minimal build summary as embedded in a [`Branch`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Build {
    pub pushed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub vcs_revision: String,
    #[serde(default)]
    pub build_num: u32,
    #[serde(default)]
    pub outcome: String,
}

/// Full build record returned by the recent-builds and build-details
/// endpoints.
///
/// `queued_at`, `start_time` and `stop_time` are `None` until the build
/// reaches the corresponding lifecycle phase. `previous` and `retry_of`
/// back-reference the build this one retries, when it is a retry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetailedBuild {
    #[serde(default)]
    pub vcs_url: String,
    #[serde(default)]
    pub build_url: String,
    #[serde(default)]
    pub build_num: u32,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub vcs_revision: String,
    #[serde(default)]
    pub committer_name: String,
    #[serde(default)]
    pub committer_email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub why: String,
    pub dont_build: Option<String>,
    pub queued_at: Option<DateTime<Utc>>,
    pub start_time: Option<DateTime<Utc>>,
    pub stop_time: Option<DateTime<Utc>>,
    pub build_time_millis: Option<u64>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub reponame: String,
    #[serde(default)]
    pub lifecycle: String,
    #[serde(default)]
    pub outcome: String,
    #[serde(default)]
    pub status: String,
    pub retry_of: Option<u32>,
    pub previous: Option<PreviousBuild>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Back-reference to the build a retry was started from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreviousBuild {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub build_num: u32,
}

/// A named phase of a build.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Step {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// A single executed command within a [`Step`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Action {
    #[serde(default)]
    pub bash_command: String,
    #[serde(default)]
    pub run_time_millis: u64,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub command: String,
    /// `None` while the action is still running.
    pub exit_code: Option<i32>,
    #[serde(rename = "type", default)]
    pub action_type: String,
    /// Order of this action within its step.
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub status: String,
}

/// A stored build output retained by the service for download.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Artifact {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub pretty_path: String,
    /// Index of the parallel-execution node that produced the file.
    #[serde(default)]
    pub node_index: u32,
    #[serde(default)]
    pub url: String,
}
