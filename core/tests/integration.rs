//! End-to-end test against the live mock server.
//!
//! Starts the mock CircleCI API on a random port, then exercises every
//! client operation over real HTTP: project listing, the three
//! recent-builds endpoint shapes, build details (including 404), artifact
//! listing keyed off the branch mapping, and an artifact download to a
//! local directory.

use std::fs;

use circleci_client::{ApiError, Client};

fn start_mock_server() -> std::net::SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener, format!("http://{addr}")).await
        })
        .unwrap();
    });

    addr
}

#[test]
fn full_api_lifecycle() {
    let addr = start_mock_server();
    let client = Client::with_base_url("test-token", &format!("http://{addr}/api/v1/")).unwrap();

    // Projects, with the branch mapping decoded.
    let projects = client.projects().unwrap();
    assert_eq!(projects.len(), 1);
    let project = &projects[0];
    assert_eq!(project.username, "jsmith");
    assert_eq!(project.reponame, "widget");
    let master = &project.branches["master"];
    assert_eq!(master.last_success.as_ref().unwrap().build_num, 42);
    assert!(project.branches["wip"].last_success.is_none());

    // Global recent-builds feed, limit respected by the server.
    let builds = client.recent_builds("", "", "", 2, 0).unwrap();
    assert_eq!(builds.len(), 2);
    assert_eq!(builds[0].build_num, 42);
    assert_eq!(builds[0].steps.len(), 1);

    // Project feed with an offset.
    let builds = client.recent_builds("jsmith", "widget", "", 30, 1).unwrap();
    assert_eq!(builds[0].build_num, 41);

    // Branch-scoped feed.
    let builds = client
        .recent_builds("jsmith", "widget", "feature-x", 30, 0)
        .unwrap();
    assert_eq!(builds.len(), 1);
    assert_eq!(builds[0].branch, "feature-x");

    // Build details, including the retry back-reference.
    let build = client.build_details("jsmith", "widget", 42).unwrap();
    assert_eq!(build.retry_of, Some(41));
    assert_eq!(build.previous.as_ref().unwrap().build_num, 41);
    assert!(build.start_time.is_some());
    assert_eq!(build.steps[0].actions[0].exit_code, Some(0));

    // A build the server does not know is NotFound.
    let err = client.build_details("jsmith", "widget", 99).unwrap_err();
    assert!(matches!(err, ApiError::NotFound));

    // Artifacts for the last successful build on master.
    let artifacts = client.artifacts(project, "master").unwrap();
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].node_index, 0);
    assert!(artifacts[0].url.contains("/storage/42/tmp/out.log"));

    // Branch lookups fail locally.
    let err = client.artifacts(project, "release").unwrap_err();
    assert!(matches!(err, ApiError::BranchNotFound(_)));
    let err = client.artifacts(project, "wip").unwrap_err();
    assert!(matches!(err, ApiError::NoSuccessfulBuild(_)));

    // Download the artifact; the query string must not leak into the name.
    let target_dir = std::env::temp_dir().join(format!("circleci-client-it-{}", std::process::id()));
    fs::create_dir_all(&target_dir).unwrap();
    let path = client.download_artifact(&artifacts[0], &target_dir).unwrap();
    assert_eq!(path.file_name().and_then(|name| name.to_str()), Some("out.log"));
    assert_eq!(fs::read_to_string(&path).unwrap(), mock_server::ARTIFACT_BODY);

    // A download into a missing directory surfaces a filesystem error.
    let missing_dir = target_dir.join("does-not-exist");
    let err = client
        .download_artifact(&artifacts[0], &missing_dir)
        .unwrap_err();
    assert!(matches!(err, ApiError::Filesystem(_)));

    fs::remove_dir_all(&target_dir).unwrap();
}
