#![allow(clippy::unwrap_used)]
// Integration tests for `SessionManager` against a wiremock service.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use mastertherm_api::MasterthermClient;
use mastertherm_core::{CoreError, Credentials, SessionManager, SessionState};

// ── Helpers ─────────────────────────────────────────────────────────

const LOGIN: &str = "/plugins/mastertherm_login/client_login.php";
const DATA: &str = "/mt/PassiveVizualizationServlet";

fn credentials() -> Credentials {
    Credentials {
        username: "user@example.com".into(),
        password: "password".to_string().into(),
    }
}

fn session_for(server: &MockServer, timeout: Duration) -> SessionManager {
    let http = reqwest::Client::builder().timeout(timeout).build().unwrap();
    let client = MasterthermClient::with_client(http, Url::parse(&server.uri()).unwrap());
    SessionManager::new(client, credentials())
}

fn login_ok(cookie: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("set-cookie", format!("{cookie}; path=/").as_str())
        .set_body_json(json!({
            "returncode": 0,
            "modules": [{ "id": "42", "module_name": "Heat Pump A" }]
        }))
}

fn data_ok() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "error": { "errorId": 0 },
        "data": { "cfg": { "001": { "D_3": "1" } } }
    }))
}

fn session_expired() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "error": { "errorId": 9, "errorMessage": "session expired" }
    }))
}

async fn fetch(session: &SessionManager) -> Result<u64, CoreError> {
    let client = session.client().clone();
    session
        .call(move |token, message_id| {
            let client = client.clone();
            async move {
                client
                    .fetch_snapshot(&token, message_id, "42")
                    .await
                    .map(|_| message_id)
            }
        })
        .await
}

fn data_bodies(requests: &[Request]) -> Vec<String> {
    requests
        .iter()
        .filter(|r| r.url.path() == DATA)
        .map(|r| String::from_utf8_lossy(&r.body).into_owned())
        .collect()
}

// ── Login ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_records_token_and_modules() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(login_ok("PHPSESSID=first"))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(&server, Duration::from_secs(5));
    let token = session.ensure_session().await.unwrap();

    assert_eq!(token.expose(), "PHPSESSID=first");
    assert!(session.is_authenticated());
    assert_eq!(session.devices().len(), 1);
    assert_eq!(session.devices()[0].id, "42");
    assert_eq!(session.devices()[0].name, "Heat Pump A");
}

#[tokio::test]
async fn test_rejected_login_stores_no_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "returncode": 1,
            "message": "bad credentials"
        })))
        .mount(&server)
        .await;

    let session = session_for(&server, Duration::from_secs(5));
    let err = session.ensure_session().await.unwrap_err();

    assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
    assert!(session.state().token().is_none());
    assert!(matches!(*session.state(), SessionState::Failed { .. }));
}

#[tokio::test]
async fn test_ensure_session_retries_after_failed_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "returncode": 1,
            "message": "bad credentials"
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(login_ok("PHPSESSID=second"))
        .mount(&server)
        .await;

    let session = session_for(&server, Duration::from_secs(5));
    assert!(session.ensure_session().await.is_err());

    let token = session.ensure_session().await.unwrap();
    assert_eq!(token.expose(), "PHPSESSID=second");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_callers_share_one_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(login_ok("PHPSESSID=shared").set_delay(Duration::from_millis(200)))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(&server, Duration::from_secs(5));
    let (a, b) = tokio::join!(session.ensure_session(), session.ensure_session());

    assert_eq!(a.unwrap(), b.unwrap());
}

#[tokio::test]
async fn test_transport_failure_during_refresh_keeps_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(login_ok("PHPSESSID=keep"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(login_ok("PHPSESSID=late").set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let session = session_for(&server, Duration::from_millis(250));
    session.login().await.unwrap();

    let err = session.login().await.unwrap_err();
    assert!(matches!(err, CoreError::Timeout { .. }), "got {err:?}");

    let state = session.state();
    assert_eq!(state.token().map(|t| t.expose().to_owned()).as_deref(), Some("PHPSESSID=keep"));
}

// ── Authenticated calls ─────────────────────────────────────────────

#[tokio::test]
async fn test_message_ids_strictly_increase() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(login_ok("PHPSESSID=abc"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(DATA))
        .respond_with(data_ok())
        .expect(3)
        .mount(&server)
        .await;

    let session = session_for(&server, Duration::from_secs(5));
    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(fetch(&session).await.unwrap());
    }

    assert_eq!(ids, vec![1, 2, 3]);
    let bodies = data_bodies(&server.received_requests().await.unwrap());
    assert!(bodies[0].contains("messageId=1&"));
    assert!(bodies[2].contains("messageId=3&"));
}

#[tokio::test]
async fn test_expired_session_relogs_in_and_retries_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(login_ok("PHPSESSID=abc"))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(DATA))
        .respond_with(session_expired())
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(DATA))
        .and(body_string_contains("messageId=2"))
        .respond_with(data_ok())
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(&server, Duration::from_secs(5));
    let message_id = fetch(&session).await.unwrap();

    assert_eq!(message_id, 2);
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn test_persistent_expiry_gives_up_after_one_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(login_ok("PHPSESSID=abc"))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(DATA))
        .respond_with(session_expired())
        .expect(2)
        .mount(&server)
        .await;

    let session = session_for(&server, Duration::from_secs(5));
    let err = fetch(&session).await.unwrap_err();

    assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
}

#[tokio::test]
async fn test_vendor_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(login_ok("PHPSESSID=abc"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(DATA))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": { "errorId": 5, "errorMessage": "busy" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(&server, Duration::from_secs(5));
    let err = fetch(&session).await.unwrap_err();

    assert!(matches!(err, CoreError::Protocol { error_id: 5, .. }));
    assert!(session.is_authenticated());
}
