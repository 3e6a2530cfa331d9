use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::credentials::CredentialStore;
use crate::error::ApiError;
use crate::normalize::{has_error_marker, normalize, NormalizedResult};
use crate::query::object_to_get_params;
use crate::refresh::{is_valid_token, RefreshCoordinator, RefreshOutcome};

/// Headers sent on every request.
pub const CORS_HEADERS: [(&str, &str); 4] = [
    ("x-trigger", "CORS"),
    ("access-control-allow-origin", "*"),
    (
        "access-control-allow-methods",
        "GET, POST, PATCH, PUT, DELETE, OPTIONS",
    ),
    (
        "access-control-allow-headers",
        "Origin, Content-Type, X-Auth-Token, Authorization",
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// One backend call. Immutable; kept only long enough for a single retry.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: Option<Value>,
    pub body: Option<Value>,
}

impl Request {
    pub fn get(path: impl Into<String>, query: Option<Value>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            query,
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Option<Value>) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            query: None,
            body,
        }
    }
}

/// Result of a single round trip, before any refresh handling.
enum Attempt {
    Done(NormalizedResult),
    Unauthorized(ApiError),
}

/// HTTP access layer for the feed backend.
///
/// Attaches the stored bearer token, normalizes responses, and on a 401
/// refreshes the access token and re-issues the request once.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialStore>,
    refresher: Arc<RefreshCoordinator>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(
        config: &ClientConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, ApiError> {
        let mut header_map = HeaderMap::new();
        header_map.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("application/json"),
        );
        for (name, value) in CORS_HEADERS {
            header_map.insert(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }

        let http = reqwest::Client::builder()
            .default_headers(header_map)
            .build()?;

        let refresher = Arc::new(RefreshCoordinator::new(
            http.clone(),
            &config.base_url,
            Arc::clone(&credentials),
        ));

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            credentials,
            refresher,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    pub fn refresher(&self) -> &RefreshCoordinator {
        &self.refresher
    }

    /// `GET <base><path>[?params]`. `null` params are dropped.
    pub async fn get(
        &self,
        path: &str,
        params: Option<&Value>,
    ) -> Result<NormalizedResult, ApiError> {
        self.execute(&Request::get(path, params.cloned())).await
    }

    /// `POST <base><path>` with a JSON body.
    pub async fn post(
        &self,
        path: &str,
        body: Option<&Value>,
    ) -> Result<NormalizedResult, ApiError> {
        self.execute(&Request::post(path, body.cloned())).await
    }

    /// [`get`](Self::get), deserializing a success payload into `T`.
    pub async fn get_as<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Option<&Value>,
    ) -> Result<T, ApiError> {
        decode(self.get(path, params).await?)
    }

    /// [`post`](Self::post), deserializing a success payload into `T`.
    pub async fn post_as<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, ApiError> {
        decode(self.post(path, body).await?)
    }

    /// Exchange the refresh token for a new access token.
    pub async fn refresh_access(&self) -> RefreshOutcome {
        self.refresher.refresh().await
    }

    /// Perform `request`, refreshing credentials and retrying once on a 401.
    pub async fn execute(&self, request: &Request) -> Result<NormalizedResult, ApiError> {
        let token = self.credentials.access_token();
        let err = match self.send(request, token.as_deref()).await? {
            Attempt::Done(result) => return Ok(result),
            Attempt::Unauthorized(err) => err,
        };

        if !self.refresher.refresh_after(token.as_deref()).await.success {
            tracing::debug!("Refresh failed; giving up on {}", request.path);
            return Err(err);
        }

        tracing::debug!("Retrying {} with refreshed credentials", request.path);
        let token = self.credentials.access_token();
        match self.send(request, token.as_deref()).await? {
            Attempt::Done(result) => Ok(result),
            Attempt::Unauthorized(err) => Err(err),
        }
    }

    pub fn url_for(&self, request: &Request) -> String {
        let query = request
            .query
            .as_ref()
            .map(object_to_get_params)
            .unwrap_or_default();
        format!("{}{}{}", self.base_url, request.path, query)
    }

    async fn send(&self, request: &Request, token: Option<&str>) -> Result<Attempt, ApiError> {
        let url = self.url_for(request);
        let mut builder = match request.method {
            Method::Get => self.http.get(&url),
            Method::Post => {
                let empty = Value::Object(Default::default());
                self.http.post(&url).json(request.body.as_ref().unwrap_or(&empty))
            }
        };
        if let Some(token) = token.filter(|t| is_valid_token(t)) {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        tracing::debug!("{:?} {url}", request.method);
        let response = builder.send().await.map_err(|e| {
            tracing::debug!("Request to {url} failed: {e}");
            ApiError::Transport(e)
        })?;

        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::UNAUTHORIZED {
            tracing::debug!("{url} answered 401");
            return Ok(Attempt::Unauthorized(ApiError::Unauthorized { body }));
        }

        let payload = parse_body(&body);
        if status.is_success() || has_error_marker(&payload) {
            return Ok(Attempt::Done(normalize(payload)));
        }

        tracing::debug!("{url} answered {status}");
        Err(ApiError::Status { status, body })
    }
}

/// Empty bodies read as `null`; non-JSON bodies as a JSON string.
fn parse_body(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

fn decode<T: DeserializeOwned>(result: NormalizedResult) -> Result<T, ApiError> {
    let data = result.into_data()?;
    serde_json::from_value(data).map_err(|e| ApiError::Decode(e.to_string()))
}
