use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

use common::offerfeed_cmd;

/// login writes both tokens; config show reports them
#[test]
fn login_then_config_show() {
    let home = tempfile::tempdir().unwrap();
    let creds = home.path().join("creds.json");

    offerfeed_cmd(home.path())
        .args(["login", "--access-token", "a1", "--refresh-token", "r1"])
        .arg("--credentials")
        .arg(&creds)
        .assert()
        .success()
        .stdout(predicate::str::contains("Credentials saved"));

    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&creds).unwrap()).unwrap();
    assert_eq!(stored, json!({"accessToken": "a1", "refreshToken": "r1"}));

    offerfeed_cmd(home.path())
        .args(["config", "show", "--json", "--base-url", "https://api.example.com/"])
        .arg("--credentials")
        .arg(&creds)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"baseUrl\": \"https://api.example.com\""))
        .stdout(predicate::str::contains("\"hasAccessToken\": true"))
        .stdout(predicate::str::contains("\"hasRefreshToken\": true"));
}

/// logout removes the credentials file
#[test]
fn logout_removes_credentials() {
    let home = tempfile::tempdir().unwrap();
    let creds = home.path().join("creds.json");
    std::fs::write(&creds, r#"{"accessToken":"a1"}"#).unwrap();

    offerfeed_cmd(home.path())
        .arg("logout")
        .env("OFFERFEED_CREDENTIALS", &creds)
        .assert()
        .success();
    assert!(!creds.exists());

    // Logging out twice is fine.
    offerfeed_cmd(home.path())
        .arg("logout")
        .env("OFFERFEED_CREDENTIALS", &creds)
        .assert()
        .success();
}

/// Without any base URL source the command fails with a hint
#[test]
fn missing_base_url_fails() {
    let home = tempfile::tempdir().unwrap();
    offerfeed_cmd(home.path())
        .args(["get", "/posts"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No API base URL configured"));
}

/// Config file in ./config is discovered and `${VAR}` references expanded
#[test]
fn config_file_with_env_expansion() {
    let home = tempfile::tempdir().unwrap();
    std::fs::create_dir(home.path().join("config")).unwrap();
    std::fs::write(
        home.path().join("config/offerfeed.json"),
        r#"{"baseUrl": "${FEED_HOST}/api"}"#,
    )
    .unwrap();

    offerfeed_cmd(home.path())
        .args(["config", "show"])
        .env("FEED_HOST", "https://feed.example.com")
        .assert()
        .success()
        .stdout(predicate::str::contains("https://feed.example.com/api"))
        .stdout(predicate::str::contains("offerfeed.json"));
}

/// The env var overrides the config file
#[test]
fn env_base_url_overrides_file() {
    let home = tempfile::tempdir().unwrap();
    std::fs::create_dir(home.path().join("config")).unwrap();
    std::fs::write(
        home.path().join("config/offerfeed.json"),
        r#"{"baseUrl": "https://file.example.com"}"#,
    )
    .unwrap();

    offerfeed_cmd(home.path())
        .args(["config", "show"])
        .env("API_ENDPOINT", "https://env.example.com")
        .assert()
        .success()
        .stdout(predicate::str::contains("https://env.example.com"));
}

/// Invalid `--body` is rejected before any request is made
#[test]
fn post_invalid_body_fails() {
    let home = tempfile::tempdir().unwrap();
    offerfeed_cmd(home.path())
        .args(["post", "/offers", "--body", "{not json"])
        .args(["--base-url", "http://127.0.0.1:9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Request body is not valid JSON"));
}

/// Absolute URLs are not accepted as paths
#[test]
fn get_rejects_absolute_url() {
    let home = tempfile::tempdir().unwrap();
    offerfeed_cmd(home.path())
        .args(["get", "https://elsewhere.example.com/x"])
        .args(["--base-url", "http://127.0.0.1:9"])
        .assert()
        .failure();
}

/// get prints the payload and sends the stored token
#[tokio::test(flavor = "multi_thread")]
async fn get_prints_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .and(query_param("page", "2"))
        .and(query_param("tag", "art"))
        .and(header("Authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 42}])))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let creds = home.path().join("creds.json");
    std::fs::write(&creds, r#"{"accessToken":"a1"}"#).unwrap();

    offerfeed_cmd(home.path())
        .args(["get", "posts", "page=2", "tag:art", "--raw"])
        .args(["--base-url", &server.uri()])
        .arg("--credentials")
        .arg(&creds)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"[{"id":42}]"#));
}

/// A backend failure exits non-zero with the backend's message
#[tokio::test(flavor = "multi_thread")]
async fn post_reports_backend_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/offers"))
        .and(body_json(json!({"postId": 1, "price": "2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": {"message": "Auction closed", "code": "CLOSED"}
        })))
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    offerfeed_cmd(home.path())
        .args(["post", "/offers", "--body", r#"{"postId":1,"price":"2"}"#])
        .args(["--base-url", &server.uri()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Auction closed"));

    offerfeed_cmd(home.path())
        .args(["post", "/offers", "--body", r#"{"postId":1,"price":"2"}"#, "--json"])
        .args(["--base-url", &server.uri()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"code\": \"rejected\""))
        .stdout(predicate::str::contains("\"errorCode\": \"CLOSED\""));
}

/// feed lists each post with its top offer
#[tokio::test(flavor = "multi_thread")]
async fn feed_lists_top_offers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [
            {
                "post": {"title": "Sunset"},
                "offers": [
                    {"id": 1, "price": "0.5"},
                    {"id": 2, "price": "2", "buyer": {"username": "lee"}}
                ]
            },
            {"post": {"title": "Bike"}}
        ]})))
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    offerfeed_cmd(home.path())
        .args(["feed", "--usd-per-eth", "1500"])
        .args(["--base-url", &server.uri()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sunset | 2 ETH ($3000.00) by @lee"))
        .stdout(predicate::str::contains("Bike | no offers"));
}

/// refresh stores the new access token
#[tokio::test(flavor = "multi_thread")]
async fn refresh_command_updates_credentials() {
    let server = MockServer::start().await;
    common::http_mock::mount_refresh_success(&server, "r1", "a2", 1).await;

    let home = tempfile::tempdir().unwrap();
    let creds = home.path().join("creds.json");
    std::fs::write(&creds, r#"{"accessToken":"a1","refreshToken":"r1"}"#).unwrap();

    offerfeed_cmd(home.path())
        .arg("refresh")
        .args(["--base-url", &server.uri()])
        .arg("--credentials")
        .arg(&creds)
        .assert()
        .success()
        .stdout(predicate::str::contains("Access token refreshed"));

    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&creds).unwrap()).unwrap();
    assert_eq!(stored["accessToken"], "a2");
    assert_eq!(stored["refreshToken"], "r1");
}

/// refresh without a refresh token fails
#[test]
fn refresh_without_tokens_fails() {
    let home = tempfile::tempdir().unwrap();
    offerfeed_cmd(home.path())
        .arg("refresh")
        .args(["--base-url", "http://127.0.0.1:9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Token refresh failed"));
}
