//! HTTP transport types and the blocking executor.
//!
//! # Design
//! `HttpRequest` and `HttpResponse` describe requests and responses as plain
//! data. `Client::build_request` produces `HttpRequest` values without
//! touching the network, so request construction stays deterministic and
//! testable; `execute` runs a descriptor on a shared `ureq::Agent` and hands
//! the body back as a string for the `parse_*` methods. The agent is built
//! with `http_status_as_error(false)` so 4xx/5xx responses come back as data
//! rather than `Err`, leaving status interpretation to the client.

use crate::error::ApiError;

/// HTTP method for a request.
///
/// The CircleCI v1 API is read-only from this client's perspective; `Post`
/// exists so callers can hit the retry/cancel endpoints through
/// `Client::build_request` if they need to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// An HTTP request described as plain data.
///
/// Built by `Client::build_request`. The `url` is fully resolved and already
/// carries the `token` query parameter.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// An HTTP response described as plain data, ready for decoding.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Build the agent every `Client` holds. Status codes are never turned into
/// transport errors; the parse layer decides what a 404 means.
pub(crate) fn agent() -> ureq::Agent {
    ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent()
}

/// Execute a request descriptor, returning the raw response.
///
/// Streaming consumers (the artifact downloader) use [`send`] directly to
/// get at the body reader instead of buffering the whole body here.
pub(crate) fn execute(agent: &ureq::Agent, req: &HttpRequest) -> Result<HttpResponse, ApiError> {
    let mut response = send(agent, req)?;
    let status = response.status().as_u16();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    Ok(HttpResponse { status, body })
}

/// Execute a request descriptor and return the live ureq response without
/// consuming the body.
pub(crate) fn send(
    agent: &ureq::Agent,
    req: &HttpRequest,
) -> Result<ureq::http::Response<ureq::Body>, ApiError> {
    let result = match req.method {
        HttpMethod::Get => {
            let mut call = agent.get(&req.url);
            for (key, value) in &req.headers {
                call = call.header(key.as_str(), value.as_str());
            }
            call.call()
        }
        HttpMethod::Post => {
            let mut call = agent.post(&req.url);
            for (key, value) in &req.headers {
                call = call.header(key.as_str(), value.as_str());
            }
            call.send_empty()
        }
    };
    result.map_err(|e| ApiError::Transport(e.to_string()))
}
