#![allow(clippy::unwrap_used)]
// Integration tests for `ApiClient` using wiremock.

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lighthouse_api::models::{BackupFormat, BulkRowStatus, HistoryQuery, Settings};
use lighthouse_api::{ApiClient, Error};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&format!("{}/api", server.uri())).unwrap();
    let client = ApiClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

fn secret(value: &str) -> secrecy::SecretString {
    value.to_string().into()
}

// ── Container tests ─────────────────────────────────────────────────

#[tokio::test]
async fn test_list_containers() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/containers"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "abc123def4567890",
            "short_id": "abc123def456",
            "name": "web",
            "image": "nginx:latest",
            "status": "Up 2 hours",
            "state": "running",
            "created": "2024-05-01T10:00:00Z",
            "excluded": false,
            "update_status": { "update_available": true, "latest_id": "sha256:beef" }
        }])))
        .mount(&server)
        .await;

    let containers = client.list_containers().await.unwrap();
    assert_eq!(containers.len(), 1);
    assert_eq!(containers[0].name, "web");
    assert_eq!(containers[0].state, "running");
    let cached = containers[0].update_status.as_ref().unwrap();
    assert!(cached.update_available);
}

#[tokio::test]
async fn test_null_container_list_is_empty() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/containers"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&server)
        .await;

    assert!(client.list_containers().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_wrong_shaped_container_list_is_empty() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/containers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "unexpected": true })))
        .mount(&server)
        .await;

    assert!(client.list_containers().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_check_update_skipped() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/containers/c1/check-update"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "update_available": false,
            "skipped": true,
            "reason": "Container excluded from updates"
        })))
        .mount(&server)
        .await;

    let result = client.check_update("c1").await.unwrap();
    assert!(result.skipped);
    assert_eq!(result.reason.as_deref(), Some("Container excluded from updates"));
}

#[tokio::test]
async fn test_update_rejected_carries_detail() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/containers/c1/update"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "detail": "Updates are disabled for this container"
        })))
        .mount(&server)
        .await;

    let err = client.update_container("c1").await.unwrap_err();
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Updates are disabled for this container");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_update_success_with_empty_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/containers/c1/update"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let result = client.update_container("c1").await.unwrap();
    assert!(!result.success);
    assert!(result.message.is_none());
}

#[tokio::test]
async fn test_set_exclusion_sends_flag() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/containers/c2/exclusion"))
        .and(body_json(json!({ "excluded": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "c2",
            "name": "db",
            "excluded": true,
            "excluded_containers": ["db"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ack = client.set_exclusion("c2", true).await.unwrap().unwrap();
    assert!(ack.excluded);
    assert_eq!(ack.excluded_containers, vec!["db".to_string()]);
}

#[tokio::test]
async fn test_update_all_rows() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/containers/update-all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                { "id": "c1", "name": "web", "status": "updated", "message": "Successfully updated web" },
                { "id": "c2", "name": "db", "status": "skipped", "reason": "Excluded" },
                { "id": "c3", "name": "cache", "status": "up_to_date" },
                { "id": "c4", "name": "proxy", "status": "error", "message": "pull failed" }
            ],
            "summary": { "updated": 1, "up_to_date": 1, "skipped": 1, "errors": 1, "total": 4 }
        })))
        .mount(&server)
        .await;

    let bulk = client.update_all().await.unwrap();
    assert_eq!(bulk.summary.total, 4);
    let statuses: Vec<BulkRowStatus> = bulk.results.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![
            BulkRowStatus::Updated,
            BulkRowStatus::Skipped,
            BulkRowStatus::UpToDate,
            BulkRowStatus::Error,
        ]
    );
}

// ── Error mapping tests ─────────────────────────────────────────────

#[tokio::test]
async fn test_error_without_body_uses_status_text() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/schedule"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client.get_schedule().await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert_eq!(err.message(), "Service Unavailable");
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_connection_refused_is_transport() {
    let base_url = Url::parse("http://127.0.0.1:9/api").unwrap();
    let client = ApiClient::with_client(reqwest::Client::new(), base_url);

    let err = client.list_containers().await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "got: {err:?}");
}

// ── Settings tests ──────────────────────────────────────────────────

#[tokio::test]
async fn test_save_settings_returns_echo() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "check_interval_minutes": 30,
            "auto_update_enabled": true,
            "excluded_containers": []
        })))
        .mount(&server)
        .await;

    let submitted = Settings {
        check_interval_minutes: 30,
        ..Settings::default()
    };
    let echo = client.save_settings(&submitted).await.unwrap().unwrap();
    assert!(echo.auto_update_enabled);
    assert_eq!(echo.check_interval_minutes, 30);
}

#[tokio::test]
async fn test_validate_registry_failure() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/registries/validate"))
        .and(body_json(json!({
            "provider": "ghcr",
            "username": "octo",
            "token": "nope"
        })))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "detail": "Registry authentication failed: denied"
        })))
        .mount(&server)
        .await;

    let err = client
        .validate_registry("ghcr", "octo", &secret("nope"))
        .await
        .unwrap_err();
    assert_eq!(err.message(), "Registry authentication failed: denied");
}

#[tokio::test]
async fn test_export_uses_content_disposition() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/settings/export"))
        .and(body_json(json!({ "password": "pw", "format": "yaml" })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(
                    "content-disposition",
                    "attachment; filename=\"backup-1.yaml\"",
                )
                .set_body_bytes(b"ciphertext".to_vec()),
        )
        .mount(&server)
        .await;

    let download = client
        .export_settings(&secret("pw"), BackupFormat::Yaml)
        .await
        .unwrap();
    assert_eq!(download.filename.as_deref(), Some("backup-1.yaml"));
    assert_eq!(&download.bytes[..], b"ciphertext");
}

#[tokio::test]
async fn test_export_generates_filename() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/settings/export"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"blob".to_vec()))
        .mount(&server)
        .await;

    let download = client
        .export_settings(&secret("pw"), BackupFormat::Json)
        .await
        .unwrap();
    let name = download.filename.unwrap();
    assert!(name.starts_with("lighthouse-settings-backup-"), "{name}");
    assert!(name.ends_with(".json"), "{name}");
}

#[tokio::test]
async fn test_import_returns_settings() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/settings/import"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "settings": { "check_interval_minutes": 5 }
        })))
        .mount(&server)
        .await;

    let settings = client
        .import_settings(&secret("pw"), "blob")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(settings.check_interval_minutes, 5);
}

// ── History tests ───────────────────────────────────────────────────

#[tokio::test]
async fn test_history_query_params() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/history"))
        .and(query_param("action", "update"))
        .and(query_param("limit", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "h1",
            "timestamp": "2024-05-01T10:00:00Z",
            "action": "update",
            "status": "success",
            "container": "web",
            "trigger": "manual",
            "details": { "new_id": "sha256:abc" }
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let query = HistoryQuery {
        action: Some("update".into()),
        status: None,
        limit: Some(20),
    };
    let entries = client.list_history(&query).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].container.as_deref(), Some("web"));
}

#[tokio::test]
async fn test_clear_history() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "cleared": true })))
        .expect(1)
        .mount(&server)
        .await;

    client.clear_history().await.unwrap();
}
