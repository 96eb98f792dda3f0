//! UberNet session provider against a wiremock server.

use papatch::ubernet::{UberNet, UberNetError};
use papatch_sync::{Session, SessionProvider, SyncError, open_catalog};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer) -> UberNet {
    UberNet::new(reqwest::Client::new(), server.uri(), "pilot", "hunter2")
}

fn stream_json(name: &str) -> serde_json::Value {
    json!({
        "StreamName": name,
        "DownloadUrl": "https://cdn.example.com",
        "TitleFolder": "PA",
        "ManifestName": "manifest.json.gz",
        "AuthSuffix": "?sig=abc"
    })
}

#[tokio::test]
async fn login_posts_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/GC/Authenticate"))
        .and(header("content-type", "application/json;charset=utf-8"))
        .and(body_json(json!({
            "TitleId": 4,
            "AuthMethod": "UberCredentials",
            "UberName": "pilot",
            "Password": "hunter2"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"SessionTicket": "ticket-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let session = provider(&server).login().await.unwrap();

    assert_eq!(session.ticket(), "ticket-1");
}

#[tokio::test]
async fn login_rejections() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Error": "nope"})))
        .mount(&server)
        .await;
    assert!(matches!(provider(&server).login().await, Err(UberNetError::MissingTicket)));

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    assert!(matches!(provider(&server).login().await, Err(UberNetError::Status(s)) if s.as_u16() == 401));
}

#[tokio::test]
async fn streams_sends_ticket_and_decodes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Launcher/ListStreams"))
        .and(query_param("Platform", "Linux"))
        .and(header("X-Authorization", "ticket-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"Streams": [stream_json("stable"), stream_json("pte")]})),
        )
        .mount(&server)
        .await;

    let catalog = provider(&server).streams(Session::new("ticket-1")).await.unwrap();

    assert_eq!(catalog.names().collect::<Vec<_>>(), ["stable", "pte"]);
    let stable = catalog.get("stable").unwrap();
    assert_eq!(stable.auth_suffix, "?sig=abc");
    assert_eq!(
        stable.manifest_url(),
        "https://cdn.example.com/PA/manifest.json.gz?sig=abc"
    );
}

#[tokio::test]
async fn catalog_failures_are_classified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"SessionTicket": "t"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = open_catalog(&provider(&server)).await.unwrap_err();
    assert!(matches!(err, SyncError::StreamListUnavailable(_)), "{err:?}");

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    let err = open_catalog(&provider(&server)).await.unwrap_err();
    assert!(matches!(err, SyncError::AuthFailed(_)), "{err:?}");
}
