use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::app;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

async fn get(uri: &str) -> axum::response::Response {
    app("http://mock".to_string())
        .oneshot(Request::builder().uri(uri).body(String::new()).unwrap())
        .await
        .unwrap()
}

// --- auth ---

#[tokio::test]
async fn request_without_token_is_unauthorized() {
    let resp = get("/api/v1/projects").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn empty_token_is_unauthorized() {
    let resp = get("/api/v1/projects?token=").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- projects ---

#[tokio::test]
async fn projects_returns_the_fixture_project() {
    let resp = get("/api/v1/projects?token=t").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let projects: serde_json::Value = body_json(resp).await;
    assert_eq!(projects.as_array().unwrap().len(), 1);
    assert_eq!(projects[0]["reponame"], "widget");
    assert_eq!(projects[0]["branches"]["master"]["last_success"]["build_num"], 42);
    assert!(projects[0]["branches"]["wip"]["last_success"].is_null());
}

// --- recent builds ---

#[tokio::test]
async fn recent_builds_are_most_recent_first() {
    let resp = get("/api/v1/recent-builds?token=t").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let builds: serde_json::Value = body_json(resp).await;
    assert_eq!(builds[0]["build_num"], 42);
    assert_eq!(builds.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn recent_builds_honors_limit_and_offset() {
    let resp = get("/api/v1/recent-builds?token=t&limit=1&offset=1").await;
    let builds: serde_json::Value = body_json(resp).await;
    assert_eq!(builds.as_array().unwrap().len(), 1);
    assert_eq!(builds[0]["build_num"], 41);
}

#[tokio::test]
async fn tree_route_filters_by_branch() {
    let resp = get("/api/v1/project/jsmith/widget/tree/feature-x?token=t").await;
    let builds: serde_json::Value = body_json(resp).await;
    assert_eq!(builds.as_array().unwrap().len(), 1);
    assert_eq!(builds[0]["branch"], "feature-x");
}

#[tokio::test]
async fn unknown_project_is_404() {
    let resp = get("/api/v1/project/nobody/nothing?token=t").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- build details ---

#[tokio::test]
async fn build_details_returns_the_build() {
    let resp = get("/api/v1/project/jsmith/widget/42?token=t").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let build: serde_json::Value = body_json(resp).await;
    assert_eq!(build["build_num"], 42);
    assert_eq!(build["retry_of"], 41);
    assert_eq!(build["steps"][0]["actions"][0]["type"], "test");
}

#[tokio::test]
async fn missing_build_is_404() {
    let resp = get("/api/v1/project/jsmith/widget/99?token=t").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- artifacts ---

#[tokio::test]
async fn artifacts_link_back_to_the_storage_route() {
    let resp = get("/api/v1/project/jsmith/widget/42/artifacts?token=t").await;
    let artifacts: serde_json::Value = body_json(resp).await;
    assert_eq!(artifacts.as_array().unwrap().len(), 1);
    let url = artifacts[0]["url"].as_str().unwrap();
    assert!(url.starts_with("http://mock/storage/42/tmp/out.log"));
}

#[tokio::test]
async fn artifact_file_serves_the_fixture_bytes() {
    let resp = get("/storage/42/tmp/out.log?token=t").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body_bytes(resp).await;
    assert_eq!(bytes.as_ref(), mock_server::ARTIFACT_BODY.as_bytes());
}

#[tokio::test]
async fn unknown_artifact_path_is_404() {
    let resp = get("/storage/42/tmp/missing.log?token=t").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
