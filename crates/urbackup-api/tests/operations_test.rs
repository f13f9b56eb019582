#![allow(clippy::unwrap_used)]
// Status, usage, and settings operations against a mocked server.

use serde_json::json;
use urbackup_api::Error;
use wiremock::matchers::{body_string_contains, method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::{mount_anonymous_login, on_server};

// ── Status ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_status() {
    let server = MockServer::start().await;
    mount_anonymous_login(&server).await;

    Mock::given(method("POST"))
        .and(query_param("a", "status"))
        .and(body_string_contains("ses=anon1234"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": [
                {
                    "id": 1,
                    "name": "web01",
                    "groupname": "prod",
                    "online": true,
                    "ip": "10.0.0.11",
                    "lastbackup": 1_723_640_400,
                    "lastbackup_image": "-",
                    "file_ok": true,
                    "image_ok": false,
                    "client_version_string": "2.5.25",
                    "status": 0
                },
                {
                    "id": 2,
                    "name": "db01",
                    "online": false,
                    "lastbackup": "-",
                    "lastseen": 1_723_636_800
                }
            ],
            "server_identity": "#Ix8fja0Pw3qkDEvwaJgL5k#"
        })))
        .mount(&server)
        .await;

    let status = on_server(&server, |mut s| s.get_status()).await.unwrap();

    assert_eq!(status.len(), 2);
    assert_eq!(status[0].name, "web01");
    assert_eq!(status[0].groupname.as_deref(), Some("prod"));
    assert_eq!(
        status[0].lastbackup.as_ref().and_then(|t| t.timestamp()),
        Some(1_723_640_400)
    );
    // "-" marks a backup that never ran.
    assert_eq!(
        status[1].lastbackup.as_ref().and_then(|t| t.timestamp()),
        None
    );
    assert_eq!(status[1].online, Some(false));
}

#[tokio::test]
async fn test_get_client_status_first_match_wins() {
    let server = MockServer::start().await;
    mount_anonymous_login(&server).await;

    Mock::given(method("POST"))
        .and(query_param("a", "status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": [
                { "id": 2, "name": "web01" },
                { "id": 7, "name": "web01" }
            ]
        })))
        .mount(&server)
        .await;

    let client = on_server(&server, |mut s| s.get_client_status("web01"))
        .await
        .unwrap();

    assert_eq!(client.id, 2);
}

#[tokio::test]
async fn test_get_client_status_unknown_name() {
    let server = MockServer::start().await;
    mount_anonymous_login(&server).await;

    Mock::given(method("POST"))
        .and(query_param("a", "status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": [{ "id": 1, "name": "web01" }]
        })))
        .mount(&server)
        .await;

    let result = on_server(&server, |mut s| s.get_client_status("tape-robot")).await;

    match result {
        Err(e) => {
            assert!(e.is_not_found());
            assert!(matches!(e, Error::ClientNotFound(ref name) if name == "tape-robot"));
        }
        Ok(client) => panic!("unexpected match: {client:?}"),
    }
}

#[tokio::test]
async fn test_get_server_identity() {
    let server = MockServer::start().await;
    mount_anonymous_login(&server).await;

    Mock::given(method("POST"))
        .and(query_param("a", "status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": [],
            "server_identity": "#Ix8fja0Pw3qkDEvwaJgL5k#"
        })))
        .mount(&server)
        .await;

    let identity = on_server(&server, |mut s| s.get_server_identity())
        .await
        .unwrap();

    assert_eq!(identity, "#Ix8fja0Pw3qkDEvwaJgL5k#");
}

#[tokio::test]
async fn test_get_usage() {
    let server = MockServer::start().await;
    mount_anonymous_login(&server).await;

    Mock::given(method("POST"))
        .and(query_param("a", "usage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "usage": [
                { "name": "web01", "files": 107_374_182_400_i64, "images": 0, "used": 107_374_182_400_i64 },
                { "name": "db01", "files": 53_687_091_200_i64, "images": 21_474_836_480_i64, "used": 75_161_927_680_i64 }
            ]
        })))
        .mount(&server)
        .await;

    let usage = on_server(&server, |mut s| s.get_usage()).await.unwrap();

    assert_eq!(usage.len(), 2);
    assert_eq!(usage[0].name, "web01");
    assert_eq!(usage[1].images, Some(21_474_836_480));
}

#[tokio::test]
async fn test_missing_status_key_is_an_error() {
    let server = MockServer::start().await;
    mount_anonymous_login(&server).await;

    // Permission-stripped accounts get an answer without the status list.
    Mock::given(method("POST"))
        .and(query_param("a", "status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "server_identity": "#I#" })))
        .mount(&server)
        .await;

    let result = on_server(&server, |mut s| s.get_status()).await;

    assert!(
        matches!(
            result,
            Err(Error::UnexpectedShape {
                action: "status",
                field: "status",
            })
        ),
        "expected UnexpectedShape, got: {result:?}"
    );
}

// ── Settings ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_global_settings() {
    let server = MockServer::start().await;
    mount_anonymous_login(&server).await;

    Mock::given(method("POST"))
        .and(query_param("a", "settings"))
        .and(body_string_contains("sa=general"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "settings": {
                "backupfolder": "backups",
                "max_file_incr": 100,
                "no_images": false
            }
        })))
        .mount(&server)
        .await;

    let settings = on_server(&server, |mut s| s.get_global_settings())
        .await
        .unwrap();

    assert_eq!(
        settings.get("backupfolder").and_then(|v| v.as_str()),
        Some("backups")
    );
    assert_eq!(settings.get("max_file_incr").and_then(|v| v.as_i64()), Some(100));
}

#[tokio::test]
async fn test_set_global_setting_resubmits_merged_map() {
    let server = MockServer::start().await;
    mount_anonymous_login(&server).await;

    // Save mock first: its body marker contains the fetch marker as a
    // substring, so the more specific matcher has to win.
    Mock::given(method("POST"))
        .and(query_param("a", "settings"))
        .and(body_string_contains("sa=general_save"))
        .and(body_string_contains("backupfolder=backups2"))
        .and(body_string_contains("max_file_incr=100"))
        .and(body_string_contains("no_images=false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "saved_ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(query_param("a", "settings"))
        .and(body_string_contains("sa=general"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "settings": {
                "backupfolder": "backups",
                "max_file_incr": 100,
                "no_images": false
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    on_server(&server, |mut s| s.set_global_setting("backupfolder", "backups2"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_set_global_setting_save_rejected() {
    let server = MockServer::start().await;
    mount_anonymous_login(&server).await;

    Mock::given(method("POST"))
        .and(query_param("a", "settings"))
        .and(body_string_contains("sa=general_save"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "saved_part": true })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(query_param("a", "settings"))
        .and(body_string_contains("sa=general"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "settings": { "backupfolder": "backups" }
        })))
        .mount(&server)
        .await;

    let result = on_server(&server, |mut s| s.set_global_setting("backupfolder", "new")).await;

    assert!(
        matches!(
            result,
            Err(Error::UnexpectedShape {
                action: "settings",
                field: "saved_ok",
            })
        ),
        "expected UnexpectedShape on save, got: {result:?}"
    );
}

#[tokio::test]
async fn test_get_client_settings_and_authkey() {
    let server = MockServer::start().await;
    mount_anonymous_login(&server).await;

    Mock::given(method("POST"))
        .and(query_param("a", "status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": [{ "id": 5, "name": "web01" }]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(query_param("a", "settings"))
        .and(body_string_contains("sa=clientsettings"))
        .and(body_string_contains("t_clientid=5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "settings": {
                "internet_authkey": "k9authkey",
                "backup_window_incr_file": "1-7/0-24"
            }
        })))
        .mount(&server)
        .await;

    let authkey = on_server(&server, |mut s| s.get_client_authkey("web01"))
        .await
        .unwrap();

    assert_eq!(authkey, "k9authkey");
}

#[tokio::test]
async fn test_change_client_setting() {
    let server = MockServer::start().await;
    mount_anonymous_login(&server).await;

    Mock::given(method("POST"))
        .and(query_param("a", "status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": [{ "id": 5, "name": "web01" }]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(query_param("a", "settings"))
        .and(body_string_contains("sa=clientsettings_save"))
        .and(body_string_contains("overwrite=true"))
        .and(body_string_contains("t_clientid=5"))
        .and(body_string_contains("backup_window_incr_file=1-5%2F20-8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "saved_ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(query_param("a", "settings"))
        .and(body_string_contains("sa=clientsettings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "settings": { "backup_window_incr_file": "1-7/0-24" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    on_server(&server, |mut s| {
        s.change_client_setting("web01", "backup_window_incr_file", "1-5/20-8")
    })
    .await
    .unwrap();
}

// ── Retry behavior ──────────────────────────────────────────────────

#[tokio::test]
async fn test_call_retries_until_server_recovers() {
    let server = MockServer::start().await;
    mount_anonymous_login(&server).await;

    // 49 times unavailable, then back up: the fiftieth attempt lands.
    Mock::given(method("POST"))
        .and(query_param("a", "status"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(49)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(query_param("a", "status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": [{ "id": 1, "name": "web01" }]
        })))
        .mount(&server)
        .await;

    let status = on_server(&server, |mut s| s.get_status()).await.unwrap();

    assert_eq!(status.len(), 1);
}

#[tokio::test]
async fn test_call_fails_after_retry_ceiling() {
    let server = MockServer::start().await;
    mount_anonymous_login(&server).await;

    Mock::given(method("POST"))
        .and(query_param("a", "status"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = on_server(&server, |mut s| s.get_status()).await;

    let err = result.unwrap_err();
    assert!(err.is_transient());
    match err {
        Error::CallFailed {
            action,
            attempts,
            status,
        } => {
            assert_eq!(action, "status");
            assert_eq!(attempts, 50);
            assert_eq!(status, 503);
        }
        other => panic!("expected CallFailed, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_answer_is_a_decode_error() {
    let server = MockServer::start().await;
    mount_anonymous_login(&server).await;

    // A proxy or misconfigured server answering 200 with HTML.
    Mock::given(method("POST"))
        .and(query_param("a", "status"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&server)
        .await;

    let result = on_server(&server, |mut s| s.get_status()).await;

    match result {
        Err(Error::Decode { action, body, .. }) => {
            assert_eq!(action, "status");
            assert_eq!(body, "<html>proxy error</html>");
        }
        other => panic!("expected Decode, got: {other:?}"),
    }
}
