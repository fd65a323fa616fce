#![allow(clippy::unwrap_used)]
// Integration tests for `MasterthermClient` using wiremock.

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mastertherm_api::{Error, MasterthermClient, SessionToken, WriteRequest};

// ── Helpers ─────────────────────────────────────────────────────────

const LOGIN: &str = "/plugins/mastertherm_login/client_login.php";
const DATA: &str = "/mt/PassiveVizualizationServlet";
const WRITE: &str = "/mt/ActiveVizualizationServlet";

async fn setup() -> (MockServer, MasterthermClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = MasterthermClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

fn token() -> SessionToken {
    SessionToken::new("PHPSESSID=abc123")
}

fn secret(s: &str) -> secrecy::SecretString {
    s.to_string().into()
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_login_success_captures_cookie_and_modules() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .and(body_string_contains("login=login"))
        .and(body_string_contains("uname=user%40example.com"))
        // sha1("password")
        .and(body_string_contains(
            "upwd=5baa61e4c9b93f3f0682250b6cf8331b7ee68fd8",
        ))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "PHPSESSID=abc123; path=/")
                .set_body_json(json!({
                    "returncode": 0,
                    "message": "ok",
                    "modules": [{ "id": "42", "module_name": "Heat Pump A" }]
                })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client
        .login("user@example.com", &secret("password"))
        .await
        .unwrap();

    assert_eq!(outcome.token.expose(), "PHPSESSID=abc123");
    assert_eq!(outcome.modules.len(), 1);
    assert_eq!(outcome.modules[0].id, "42");
    assert_eq!(outcome.modules[0].name.as_deref(), Some("Heat Pump A"));
}

#[tokio::test]
async fn test_login_nonzero_returncode_is_authentication_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "returncode": 1,
            "message": "bad credentials"
        })))
        .mount(&server)
        .await;

    let result = client.login("user", &secret("wrong")).await;

    match result {
        Err(Error::Authentication { message }) => assert_eq!(message, "bad credentials"),
        other => panic!("expected Authentication error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_login_without_cookie_is_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "returncode": "0",
            "modules": []
        })))
        .mount(&server)
        .await;

    let result = client.login("user", &secret("pw")).await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_login_server_error_is_not_a_verdict() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let result = client.login("user", &secret("pw")).await;
    assert!(
        matches!(result, Err(Error::Http { status: 503, .. })),
        "expected Http error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_login_garbage_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = client.login("user", &secret("pw")).await;
    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}

// ── Snapshot tests ──────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_snapshot_sends_cookie_and_form() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(DATA))
        .and(header("cookie", "PHPSESSID=abc123"))
        .and(body_string_contains("messageId=7"))
        .and(body_string_contains("moduleId=42"))
        .and(body_string_contains("fullRange=true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "timestamp": "1700000000",
            "data": { "varfile_mt1_config1": { "001": { "A_3": "4.5", "D_3": "1" } } },
            "error": { "errorId": 0, "errorMessage": "" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resp = client.fetch_snapshot(&token(), 7, "42").await.unwrap();

    assert_eq!(resp.timestamp.as_deref(), Some("1700000000"));
    assert_eq!(
        resp.data["varfile_mt1_config1"]["001"]["A_3"],
        json!("4.5")
    );
}

#[tokio::test]
async fn test_fetch_snapshot_vendor_error_is_protocol_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(DATA))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": { "errorId": 5, "errorMessage": "busy" }
        })))
        .mount(&server)
        .await;

    let result = client.fetch_snapshot(&token(), 1, "42").await;

    match result {
        Err(Error::Protocol { error_id, message }) => {
            assert_eq!(error_id, 5);
            assert_eq!(message, "busy");
        }
        other => panic!("expected Protocol error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_snapshot_error_nine_is_session_expired() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(DATA))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": { "errorId": "9", "errorMessage": "User not logged in" }
        })))
        .mount(&server)
        .await;

    let result = client.fetch_snapshot(&token(), 1, "42").await;
    assert!(
        matches!(result, Err(Error::SessionExpired)),
        "expected SessionExpired, got: {result:?}"
    );
}

#[tokio::test]
async fn test_http_401_is_session_expired() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(DATA))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client.fetch_snapshot(&token(), 1, "42").await.unwrap_err();
    assert!(err.is_auth_expired(), "got {err:?}");
}

// ── Write tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_write_point_form_fields() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(WRITE))
        .and(header("cookie", "PHPSESSID=abc123"))
        .and(body_string_contains("messageId=3"))
        .and(body_string_contains("moduleId=42"))
        .and(body_string_contains("deviceId=1"))
        .and(body_string_contains("configFile=varfile_mt1_config1"))
        .and(body_string_contains("errorResponse=true"))
        .and(body_string_contains("variableId=A_191"))
        .and(body_string_contains("variableValue=22"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": { "errorId": 0 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    client
        .write_point(
            &token(),
            3,
            &WriteRequest {
                module_id: "42",
                config_file: "varfile_mt1_config1",
                variable_id: "A_191",
                variable_value: "22",
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_write_point_vendor_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(WRITE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": { "errorId": 3, "errorMessage": "" }
        })))
        .mount(&server)
        .await;

    let err = client
        .write_point(
            &token(),
            1,
            &WriteRequest {
                module_id: "42",
                config_file: "varfile_mt1_config1",
                variable_id: "D_3",
                variable_value: "1",
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Protocol { error_id: 3, .. }));
    assert_eq!(err.to_string(), "MasterTherm error 3: errorId=3");
}
