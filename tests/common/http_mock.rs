use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mount a `/refresh-access` endpoint that trades `refresh_token` for `new_access`.
#[allow(dead_code)]
pub async fn mount_refresh_success(
    server: &MockServer,
    refresh_token: &str,
    new_access: &str,
    expected_calls: u64,
) {
    Mock::given(method("POST"))
        .and(path("/refresh-access"))
        .and(body_json(json!({ "refreshToken": refresh_token })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "accessToken": new_access }
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// Mount a `/refresh-access` endpoint that rejects every refresh token.
#[allow(dead_code)]
pub async fn mount_refresh_rejected(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/refresh-access"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "message": "Error: jwt expired", "code": "TOKEN_EXPIRED" }
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// Mount `GET <route>` answering 401 for `Bearer <stale>` and `body` for `Bearer <fresh>`.
#[allow(dead_code)]
pub async fn mount_token_gated_get(
    server: &MockServer,
    route: &str,
    stale: &str,
    fresh: &str,
    body: serde_json::Value,
) {
    Mock::given(method("GET"))
        .and(path(route))
        .and(header("Authorization", format!("Bearer {stale}").as_str()))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "message": "jwt expired", "code": "TOKEN_EXPIRED" }
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(route))
        .and(header("Authorization", format!("Bearer {fresh}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}
