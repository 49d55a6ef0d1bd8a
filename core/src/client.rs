//! Request construction, response decoding and the endpoint operations.
//!
//! # Design
//! `Client` holds immutable configuration (base URL, token, user agent) plus
//! a shared `ureq::Agent`, and carries no mutable state between calls. Each
//! endpoint operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`;
//! the executing method of the same name composes the two around a single
//! blocking round trip. The split keeps request construction and decoding
//! fully testable without a network.

use std::fmt;

use log::debug;
use url::Url;

use crate::error::ApiError;
use crate::http::{self, HttpMethod, HttpRequest, HttpResponse};
use crate::types::{Artifact, DetailedBuild, Project};

/// Base URL of the public CircleCI v1 API. Point a client at a CircleCI
/// Enterprise deployment with [`Client::with_base_url`]; the URL must end
/// with a trailing slash so relative resolution is unambiguous.
pub const DEFAULT_BASE_URL: &str = "https://circleci.com/api/v1/";

const USER_AGENT: &str = concat!("circleci-client/", env!("CARGO_PKG_VERSION"));

/// Service-side cap on the `limit` parameter of the recent-builds
/// endpoints; larger values are silently reduced.
const MAX_LIMIT: u32 = 100;

/// Synchronous client for the CircleCI v1 API.
///
/// Immutable after construction, so sharing one client across threads is
/// safe. Every request it builds carries the configured token as a `token`
/// query parameter.
#[derive(Clone)]
pub struct Client {
    token: String,
    base_url: Url,
    user_agent: String,
    pub(crate) agent: ureq::Agent,
}

impl Client {
    /// Create a client for the public CircleCI API. Tokens can be created
    /// under the account's API settings.
    pub fn new(token: &str) -> Self {
        let base_url = Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid");
        Self {
            token: token.to_string(),
            base_url,
            user_agent: USER_AGENT.to_string(),
            agent: http::agent(),
        }
    }

    /// Create a client against a custom deployment. `base_url` must be an
    /// absolute URL ending with a trailing slash.
    pub fn with_base_url(token: &str, base_url: &str) -> Result<Self, ApiError> {
        let parsed = Url::parse(base_url).map_err(|e| ApiError::MalformedUrl(e.to_string()))?;
        if !parsed.path().ends_with('/') {
            return Err(ApiError::MalformedUrl(format!(
                "base URL must end with a trailing slash: {base_url}"
            )));
        }
        Ok(Self {
            token: token.to_string(),
            base_url: parsed,
            user_agent: USER_AGENT.to_string(),
            agent: http::agent(),
        })
    }

    /// Build a request descriptor for `path` resolved against the base URL.
    ///
    /// `path` is normally a relative endpoint path without a leading slash;
    /// an absolute URL replaces the base entirely, which is how artifact
    /// downloads reuse the authenticated request path. `params` are merged
    /// into the query string, and the `token` parameter is always set last
    /// from the client configuration, overwriting any caller-supplied value.
    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<HttpRequest, ApiError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| ApiError::MalformedUrl(e.to_string()))?;

        let mut query: Vec<(String, String)> = url
            .query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        for (key, value) in params {
            match query.iter_mut().find(|(existing, _)| existing.as_str() == *key) {
                Some(pair) => pair.1 = (*value).to_string(),
                None => query.push(((*key).to_string(), (*value).to_string())),
            }
        }
        query.retain(|(key, _)| key != "token");
        query.push(("token".to_string(), self.token.clone()));
        url.query_pairs_mut().clear().extend_pairs(&query);

        Ok(HttpRequest {
            method,
            url: url.to_string(),
            headers: vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("User-Agent".to_string(), self.user_agent.clone()),
            ],
        })
    }

    // --- list projects ---

    pub fn build_projects(&self) -> Result<HttpRequest, ApiError> {
        self.build_request(HttpMethod::Get, "projects", &[])
    }

    pub fn parse_projects(&self, response: HttpResponse) -> Result<Vec<Project>, ApiError> {
        decode(response)
    }

    /// List the projects followed by the authenticated user.
    pub fn projects(&self) -> Result<Vec<Project>, ApiError> {
        debug!("GET projects");
        let req = self.build_projects()?;
        self.parse_projects(http::execute(&self.agent, &req)?)
    }

    // --- recent builds ---

    /// Build the recent-builds request. With `username` and `project` both
    /// non-empty the request targets that project, additionally scoped to
    /// `branch` when it is non-empty; otherwise it targets the global
    /// recent-builds feed across followed projects. `limit` is capped at
    /// 100 to match the service; `offset` passes through unchanged.
    pub fn build_recent_builds(
        &self,
        username: &str,
        project: &str,
        branch: &str,
        limit: u32,
        offset: u32,
    ) -> Result<HttpRequest, ApiError> {
        let endpoint = if !username.is_empty() && !project.is_empty() {
            if !branch.is_empty() {
                format!("project/{username}/{project}/tree/{branch}")
            } else {
                format!("project/{username}/{project}")
            }
        } else {
            "recent-builds".to_string()
        };

        let limit = limit.min(MAX_LIMIT).to_string();
        let offset = offset.to_string();
        self.build_request(
            HttpMethod::Get,
            &endpoint,
            &[("limit", limit.as_str()), ("offset", offset.as_str())],
        )
    }

    pub fn parse_recent_builds(
        &self,
        response: HttpResponse,
    ) -> Result<Vec<DetailedBuild>, ApiError> {
        decode(response)
    }

    /// List recent builds, most recent first as returned by the service.
    pub fn recent_builds(
        &self,
        username: &str,
        project: &str,
        branch: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<DetailedBuild>, ApiError> {
        debug!("GET recent builds for {username}/{project} branch {branch:?}");
        let req = self.build_recent_builds(username, project, branch, limit, offset)?;
        self.parse_recent_builds(http::execute(&self.agent, &req)?)
    }

    // --- build details ---

    pub fn build_build_details(
        &self,
        username: &str,
        project: &str,
        build_num: u32,
    ) -> Result<HttpRequest, ApiError> {
        let endpoint = format!("project/{username}/{project}/{build_num}");
        self.build_request(HttpMethod::Get, &endpoint, &[])
    }

    pub fn parse_build_details(&self, response: HttpResponse) -> Result<DetailedBuild, ApiError> {
        decode(response)
    }

    /// Fetch the full record of one build, including its steps and actions.
    /// Fails with [`ApiError::NotFound`] when the build does not exist.
    pub fn build_details(
        &self,
        username: &str,
        project: &str,
        build_num: u32,
    ) -> Result<DetailedBuild, ApiError> {
        debug!("GET build {username}/{project}#{build_num}");
        let req = self.build_build_details(username, project, build_num)?;
        self.parse_build_details(http::execute(&self.agent, &req)?)
    }

    // --- artifacts ---

    /// Build the artifacts request for the last successful build on
    /// `branch_name`. The branch lookup happens locally: an unknown branch
    /// fails with [`ApiError::BranchNotFound`] before any request is made,
    /// and a branch with no successful build fails with
    /// [`ApiError::NoSuccessfulBuild`].
    pub fn build_artifacts(
        &self,
        project: &Project,
        branch_name: &str,
    ) -> Result<HttpRequest, ApiError> {
        let branch = project
            .branches
            .get(branch_name)
            .ok_or_else(|| ApiError::BranchNotFound(branch_name.to_string()))?;
        let build = branch
            .last_success
            .as_ref()
            .ok_or_else(|| ApiError::NoSuccessfulBuild(branch_name.to_string()))?;
        let endpoint = format!(
            "project/{}/{}/{}/artifacts",
            project.username, project.reponame, build.build_num
        );
        self.build_request(HttpMethod::Get, &endpoint, &[])
    }

    pub fn parse_artifacts(&self, response: HttpResponse) -> Result<Vec<Artifact>, ApiError> {
        decode(response)
    }

    /// List the artifacts of the most recent successful build on
    /// `branch_name`.
    pub fn artifacts(
        &self,
        project: &Project,
        branch_name: &str,
    ) -> Result<Vec<Artifact>, ApiError> {
        debug!(
            "GET artifacts for {}/{} branch {branch_name}",
            project.username, project.reponame
        );
        let req = self.build_artifacts(project, branch_name)?;
        self.parse_artifacts(http::execute(&self.agent, &req)?)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .field("user_agent", &self.user_agent)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Map non-2xx statuses to the appropriate `ApiError`, then deserialize.
fn decode<T: serde::de::DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    if !(200..300).contains(&response.status) {
        if response.status == 404 {
            return Err(ApiError::NotFound);
        }
        return Err(ApiError::Http {
            status: response.status,
            body: response.body,
        });
    }
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}
