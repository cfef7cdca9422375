//! Fetcher tests against a mocked Linear endpoint.

use burnsync_config::BurnsyncConfig;
use burnsync_domain::SyncError;
use burnsync_linear::LinearClient;
use serde_json::json;
use tokio::runtime::Runtime;
use wiremock::matchers::{body_string_contains, header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn start_server() -> (Runtime, MockServer) {
    let runtime = Runtime::new().expect("runtime");
    let server = runtime.block_on(MockServer::start());
    (runtime, server)
}

fn client_for(server: &MockServer, page_size: usize) -> LinearClient {
    let config = BurnsyncConfig {
        api_url: server.uri(),
        api_token: Some("lin_api_test".to_string()),
        page_size,
        ..BurnsyncConfig::default()
    };
    LinearClient::from_config(&config).expect("client")
}

fn node(identifier: &str, title: &str, completed_at: Option<&str>) -> serde_json::Value {
    json!({
        "id": format!("uuid-{identifier}"),
        "identifier": identifier,
        "title": title,
        "state": {"name": "In Progress", "type": "started"},
        "createdAt": "2024-01-01T10:00:00.000Z",
        "completedAt": completed_at
    })
}

fn page(nodes: Vec<serde_json::Value>, next_cursor: Option<&str>) -> serde_json::Value {
    json!({
        "data": {
            "project": {
                "id": "857fa6e14378",
                "name": "Square",
                "issues": {
                    "nodes": nodes,
                    "pageInfo": {
                        "hasNextPage": next_cursor.is_some(),
                        "endCursor": next_cursor
                    }
                }
            }
        }
    })
}

#[test]
fn fetches_single_page_with_raw_token_header() {
    let (runtime, server) = start_server();
    runtime.block_on(
        Mock::given(method("POST"))
            .and(header("authorization", "lin_api_test"))
            .and(body_string_contains("\"projectId\":\"857fa6e14378\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(
                vec![
                    node("SQ-1", "ghissue one", None),
                    node("SQ-2", "other", Some("2024-01-02T10:00:00.000Z")),
                ],
                None,
            )))
            .expect(1)
            .mount(&server),
    );

    let project = client_for(&server, 50)
        .fetch_project("857fa6e14378")
        .expect("project");

    assert_eq!(project.name, "Square");
    assert_eq!(project.issues.len(), 2);
    assert!(project.issues[0].is_open());
    assert!(!project.issues[1].is_open());
    runtime.block_on(server.verify());
}

#[test]
fn follows_pagination_cursors() {
    let (runtime, server) = start_server();
    runtime.block_on(async {
        Mock::given(method("POST"))
            .and(body_string_contains("\"after\":null"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(page(vec![node("SQ-1", "ghissue a", None)], Some("cursor-1"))),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains("\"after\":\"cursor-1\""))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(page(vec![node("SQ-2", "ghissue b", None)], None)),
            )
            .expect(1)
            .mount(&server)
            .await;
    });

    let project = client_for(&server, 1)
        .fetch_project("857fa6e14378")
        .expect("project");

    let identifiers = project
        .issues
        .iter()
        .map(|issue| issue.identifier.as_str())
        .collect::<Vec<_>>();
    assert_eq!(identifiers, vec!["SQ-1", "SQ-2"]);
    runtime.block_on(server.verify());
}

#[test]
fn error_envelope_is_an_upstream_error_with_raw_payload() {
    let (runtime, server) = start_server();
    runtime.block_on(
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "data": null,
                "errors": [{"message": "Entity not found", "extensions": {"code": "INVALID_INPUT"}}]
            })))
            .mount(&server),
    );

    let error = client_for(&server, 50)
        .fetch_project("missing")
        .expect_err("error envelope");

    let message = error.to_string();
    assert!(message.contains("Linear API error"));
    assert!(message.contains("Entity not found"));
    assert!(message.contains("INVALID_INPUT"));
    assert_eq!(
        error.downcast_ref::<SyncError>().expect("sync error").kind(),
        "upstream"
    );
}

#[test]
fn null_project_is_an_upstream_error() {
    let (runtime, server) = start_server();
    runtime.block_on(
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"project": null}})))
            .mount(&server),
    );

    let error = client_for(&server, 50)
        .fetch_project("deadbeef")
        .expect_err("missing project");
    assert!(error.to_string().contains("project deadbeef not found"));
}

#[test]
fn non_json_failure_reports_status_and_body() {
    let (runtime, server) = start_server();
    runtime.block_on(
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server),
    );

    let error = client_for(&server, 50)
        .fetch_project("857fa6e14378")
        .expect_err("gateway failure");
    let message = error.to_string();
    assert!(message.contains("502"));
    assert!(message.contains("bad gateway"));
}

#[test]
fn missing_token_fails_client_construction() {
    let config = BurnsyncConfig {
        api_token: None,
        ..BurnsyncConfig::default()
    };
    let error = LinearClient::from_config(&config)
        .err()
        .expect("missing token");
    assert_eq!(
        error.downcast_ref::<SyncError>().expect("sync error").kind(),
        "configuration"
    );
}
