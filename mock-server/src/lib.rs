//! In-process CircleCI v1 API stub used by the client's integration tests.
//!
//! Serves a fixed project (`jsmith/widget`) with a handful of builds and
//! one stored artifact, wired under `/api/v1` the way the real service lays
//! its endpoints out. Every route rejects requests that do not carry a
//! non-empty `token` query parameter with 401, which is how the tests prove
//! the client authenticates every request. Artifact links point back at
//! this server's `/storage` routes, so downloads can be exercised
//! end-to-end.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// External base URL embedded into artifact links.
type BaseUrl = Arc<String>;

const USERNAME: &str = "jsmith";
const REPONAME: &str = "widget";

/// Bytes served for the fixture artifact.
pub const ARTIFACT_BODY: &str = "artifact payload\n";

/// Build the router. `external_base` is the URL this server is reachable
/// at from the outside (e.g. `http://127.0.0.1:PORT`); it is baked into
/// the artifact URLs the artifacts endpoint returns.
pub fn app(external_base: String) -> Router {
    let base: BaseUrl = Arc::new(external_base.trim_end_matches('/').to_string());
    let api = Router::new()
        .route("/projects", get(projects))
        .route("/recent-builds", get(recent_builds))
        .route("/project/{username}/{reponame}", get(project_builds))
        .route(
            "/project/{username}/{reponame}/tree/{branch}",
            get(branch_builds),
        )
        .route(
            "/project/{username}/{reponame}/{build_num}",
            get(build_details),
        )
        .route(
            "/project/{username}/{reponame}/{build_num}/artifacts",
            get(artifacts),
        );
    Router::new()
        .nest("/api/v1", api)
        .route("/storage/{build_num}/{*path}", get(artifact_file))
        .with_state(base)
}

pub async fn run(listener: TcpListener, external_base: String) -> Result<(), std::io::Error> {
    axum::serve(listener, app(external_base)).await
}

fn require_token(query: &HashMap<String, String>) -> Result<(), StatusCode> {
    match query.get("token") {
        Some(token) if !token.is_empty() => Ok(()),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

// --- fixtures ---

fn build_summary(build_num: u32, outcome: &str) -> Value {
    json!({
        "pushed_at": "2024-05-14T09:58:00Z",
        "vcs_revision": format!("{build_num:040x}"),
        "build_num": build_num,
        "outcome": outcome,
    })
}

fn detailed_build(build_num: u32, branch: &str, outcome: &str) -> Value {
    let mut build = json!({
        "vcs_url": format!("https://github.com/{USERNAME}/{REPONAME}"),
        "build_url": format!("https://circleci.com/gh/{USERNAME}/{REPONAME}/{build_num}"),
        "build_num": build_num,
        "branch": branch,
        "vcs_revision": format!("{build_num:040x}"),
        "committer_name": "J. Smith",
        "committer_email": "jsmith@example.com",
        "subject": format!("Commit for build {build_num}"),
        "body": "",
        "why": "github",
        "queued_at": "2024-05-14T10:00:00Z",
        "start_time": "2024-05-14T10:00:05Z",
        "stop_time": "2024-05-14T10:03:05Z",
        "build_time_millis": 180000,
        "username": USERNAME,
        "reponame": REPONAME,
        "lifecycle": "finished",
        "outcome": outcome,
        "status": outcome,
        "steps": [{
            "name": "cargo test",
            "actions": [{
                "bash_command": "cargo test --all",
                "run_time_millis": 170000,
                "start_time": "2024-05-14T10:00:10Z",
                "end_time": "2024-05-14T10:03:00Z",
                "name": "cargo test",
                "command": "cargo test --all",
                "exit_code": if outcome == "success" { 0 } else { 1 },
                "type": "test",
                "index": 0,
                "status": outcome,
            }],
        }],
    });
    if build_num == 42 {
        // Build 42 is a retry of the failed 41.
        build["retry_of"] = json!(41);
        build["previous"] = json!({"status": "failed", "build_num": 41});
    }
    build
}

/// Most recent first, like the real service.
fn all_builds() -> Vec<Value> {
    vec![
        detailed_build(42, "master", "success"),
        detailed_build(41, "master", "failed"),
        detailed_build(40, "feature-x", "success"),
    ]
}

fn project_fixture() -> Value {
    json!({
        "vcs_url": format!("https://github.com/{USERNAME}/{REPONAME}"),
        "followed": true,
        "username": USERNAME,
        "reponame": REPONAME,
        "branches": {
            "master": {
                "pusher_logins": ["jsmith"],
                "last_non_success": build_summary(41, "failed"),
                "last_success": build_summary(42, "success"),
                "recent_builds": [build_summary(42, "success"), build_summary(41, "failed")],
                "running_builds": [],
            },
            "wip": {
                "pusher_logins": ["jsmith"],
                "last_non_success": null,
                "last_success": null,
                "recent_builds": [],
                "running_builds": [build_summary(43, "")],
            },
        },
    })
}

fn limited(builds: Vec<Value>, query: &HashMap<String, String>) -> Vec<Value> {
    let limit = query
        .get("limit")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(30);
    let offset = query
        .get("offset")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);
    builds.into_iter().skip(offset).take(limit).collect()
}

// --- handlers ---

async fn projects(
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    require_token(&query)?;
    Ok(Json(json!([project_fixture()])))
}

async fn recent_builds(
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    require_token(&query)?;
    Ok(Json(Value::Array(limited(all_builds(), &query))))
}

async fn project_builds(
    Path((username, reponame)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    require_token(&query)?;
    if username != USERNAME || reponame != REPONAME {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(Value::Array(limited(all_builds(), &query))))
}

async fn branch_builds(
    Path((username, reponame, branch)): Path<(String, String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    require_token(&query)?;
    if username != USERNAME || reponame != REPONAME {
        return Err(StatusCode::NOT_FOUND);
    }
    let builds = all_builds()
        .into_iter()
        .filter(|build| build["branch"] == branch.as_str())
        .collect();
    Ok(Json(Value::Array(limited(builds, &query))))
}

async fn build_details(
    Path((username, reponame, build_num)): Path<(String, String, u32)>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    require_token(&query)?;
    if username != USERNAME || reponame != REPONAME {
        return Err(StatusCode::NOT_FOUND);
    }
    all_builds()
        .into_iter()
        .find(|build| build["build_num"] == build_num)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn artifacts(
    State(base): State<BaseUrl>,
    Path((username, reponame, build_num)): Path<(String, String, u32)>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    require_token(&query)?;
    if username != USERNAME || reponame != REPONAME {
        return Err(StatusCode::NOT_FOUND);
    }
    if build_num != 42 {
        return Ok(Json(json!([])));
    }
    Ok(Json(json!([{
        "path": "/tmp/out.log",
        "pretty_path": "$CIRCLE_ARTIFACTS/out.log",
        "node_index": 0,
        "url": format!("{base}/storage/42/tmp/out.log?branch=master"),
    }])))
}

async fn artifact_file(
    Path((build_num, path)): Path<(u32, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<&'static str, StatusCode> {
    require_token(&query)?;
    if build_num == 42 && path == "tmp/out.log" {
        Ok(ARTIFACT_BODY)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}
