//! Integration tests for the command API against a mock HTTP server.

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tinyphone_tokio::{ClientError, CommandClient, DialRequest, LoginRequest, Settings};

async fn client_for(server: &MockServer) -> CommandClient {
    CommandClient::new(&Settings::new(server.uri())).expect("build client")
}

#[tokio::test]
async fn version_decodes_structured_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"message": "Tinyphone", "version": "1.0.0"})),
        )
        .mount(&server)
        .await;

    let version = client_for(&server)
        .await
        .version()
        .await
        .unwrap();
    assert_eq!(version.message, "Tinyphone");
    assert_eq!(version.version, "1.0.0");
}

#[tokio::test]
async fn version_degrades_to_plain_text_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello tinyphone"))
        .mount(&server)
        .await;

    let version = client_for(&server)
        .await
        .version()
        .await
        .unwrap();
    assert_eq!(version.message, "hello tinyphone");
    assert_eq!(version.version, "Unknown");
}

#[tokio::test]
async fn version_unwraps_bare_json_string() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#""tinyphone 1.0""#))
        .mount(&server)
        .await;

    let version = client_for(&server)
        .await
        .version()
        .await
        .unwrap();
    assert_eq!(version.message, "tinyphone 1.0");
}

#[tokio::test]
async fn version_propagates_unexpected_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .await
        .version()
        .await
        .unwrap_err();
    match err {
        ClientError::UnexpectedStatus { status, body } => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected UnexpectedStatus, got {:?}", other),
    }
}

#[tokio::test]
async fn login_posts_json_and_reports_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_json(json!({
            "username": "alice",
            "password": "secret",
            "domain": "example.com"
        })))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let outcome = client_for(&server)
        .await
        .login(&LoginRequest {
            username: "alice".into(),
            password: "secret".into(),
            domain: "example.com".into(),
            ..LoginRequest::default()
        })
        .await
        .unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.message, "Login successful");
    assert_eq!(outcome.error, None);
}

#[tokio::test]
async fn login_failure_carries_server_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(403).set_body_string("bad credentials"))
        .mount(&server)
        .await;

    let outcome = client_for(&server)
        .await
        .login(&LoginRequest::default())
        .await
        .unwrap();
    assert!(!outcome.success);
    assert_eq!(outcome.message, "Login failed");
    assert_eq!(outcome.error.as_deref(), Some("bad credentials"));
}

#[tokio::test]
async fn accounts_decodes_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accounts": [
                {"account_name": "work", "username": "alice", "domain": "example.com", "status": "Registered"}
            ]
        })))
        .mount(&server)
        .await;

    let accounts = client_for(&server)
        .await
        .accounts()
        .await
        .unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].account_name, "work");
    assert_eq!(accounts[0].status, "Registered");
}

#[tokio::test]
async fn accounts_null_body_is_an_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&server)
        .await;

    let accounts = client_for(&server)
        .await
        .accounts()
        .await
        .unwrap();
    assert!(accounts.is_empty());
}

#[tokio::test]
async fn accounts_undecodable_body_is_an_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>surprise</html>"))
        .mount(&server)
        .await;

    let accounts = client_for(&server)
        .await
        .accounts()
        .await
        .unwrap();
    assert!(accounts.is_empty());
}

#[tokio::test]
async fn calls_decodes_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/calls"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "calls": [{
                "call_id": "42",
                "direction": "outbound",
                "remote_uri": "sip:bob@example.com",
                "local_uri": "sip:alice@example.com",
                "state": "CONFIRMED",
                "duration": 12
            }]
        })))
        .mount(&server)
        .await;

    let calls = client_for(&server)
        .await
        .calls()
        .await
        .unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].call_id, "42");
    assert_eq!(calls[0].duration, 12);
}

#[tokio::test]
async fn dial_posts_request_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/dial"))
        .and(body_json(json!({"uri": "sip:echo@example.com", "account": "work"})))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let outcome = client_for(&server)
        .await
        .dial(&DialRequest {
            uri: "sip:echo@example.com".into(),
            account: "work".into(),
        })
        .await
        .unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.message, "Dial sip:echo@example.com successful");
}

#[tokio::test]
async fn hold_uses_put_and_unhold_uses_delete() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/calls/3/hold"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/calls/3/hold"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    assert!(client
        .hold(3)
        .await
        .unwrap()
        .success);
    assert!(client
        .unhold(3)
        .await
        .unwrap()
        .success);
}

#[tokio::test]
async fn devices_falls_back_on_unparseable_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let report = client_for(&server)
        .await
        .devices()
        .await
        .unwrap();
    assert_eq!(report.message, "Failed to parse devices response");
    assert!(report.devices.is_empty());
}

#[tokio::test]
async fn devices_decodes_full_report() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "ok",
            "count": 1,
            "devices": [{"id": 0, "name": "default", "driver": "ALSA", "inputCount": 2, "outputCount": 2}]
        })))
        .mount(&server)
        .await;

    let report = client_for(&server)
        .await
        .devices()
        .await
        .unwrap();
    assert_eq!(report.count, 1);
    assert_eq!(report.devices[0].name, "default");
}

#[tokio::test]
async fn hangup_targets_the_call_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/calls/9/hangup"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let outcome = client_for(&server)
        .await
        .hangup(9)
        .await
        .unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.message, "Hangup call 9 successful");
}

#[tokio::test]
async fn config_empty_body_degrades_to_unknown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/config"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .mount(&server)
        .await;

    let report = client_for(&server)
        .await
        .config()
        .await
        .unwrap();
    assert_eq!(report.version, "Unknown");
}
