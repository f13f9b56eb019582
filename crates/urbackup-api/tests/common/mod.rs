// Shared helpers for the wiremock-based integration tests.
//
// The library is blocking and wiremock is async: client interactions run
// on a blocking thread via `spawn_blocking` while the mock server lives
// on the test runtime.

use serde_json::json;
use urbackup_api::{ServerConfig, UrbackupServer};
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Run `f` with a fresh client pointed at `server`, on a thread where
/// blocking I/O is allowed.
pub async fn on_server<F, T>(server: &MockServer, f: F) -> T
where
    F: FnOnce(UrbackupServer) -> T + Send + 'static,
    T: Send + 'static,
{
    let config = ServerConfig::new(server.uri(), "admin", "secret123");
    tokio::task::spawn_blocking(move || {
        let client = UrbackupServer::new(config).unwrap();
        f(client)
    })
    .await
    .unwrap()
}

/// Mount an anonymous-login success so operations get past the handshake.
/// The session id is fixed so tests can assert it rides on later calls.
pub async fn mount_anonymous_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(query_param("a", "login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "session": "anon1234",
        })))
        .mount(server)
        .await;
}
