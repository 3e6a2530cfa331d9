//! Access-token refresh.
//!
//! A 401 means the access token was rejected. The coordinator trades the
//! stored refresh token for a new access token at `POST /refresh-access`.
//! Refreshes are serialized, and callers that failed with the same stale
//! token while an attempt was in flight share it instead of each calling the
//! endpoint. A finished attempt is never replayed to a later 401.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::credentials::CredentialStore;
use crate::normalize::{normalize, NormalizedResult};

/// Path of the refresh endpoint, relative to the base URL.
pub const REFRESH_PATH: &str = "/refresh-access";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub success: bool,
}

impl RefreshOutcome {
    const SUCCEEDED: Self = Self { success: true };
    const FAILED: Self = Self { success: false };
}

/// The credentials a refresh attempt was made for, and how it went.
#[derive(Debug)]
struct Attempt {
    stale_access: Option<String>,
    refresh_token: String,
    outcome: RefreshOutcome,
    /// Value of the completion counter once this attempt finished.
    epoch: u64,
}

pub struct RefreshCoordinator {
    http: reqwest::Client,
    refresh_url: String,
    credentials: Arc<dyn CredentialStore>,
    last_attempt: Mutex<Option<Attempt>>,
    completed: AtomicU64,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("refresh_url", &self.refresh_url)
            .finish_non_exhaustive()
    }
}

impl RefreshCoordinator {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            http,
            refresh_url: format!("{}{REFRESH_PATH}", base_url.trim_end_matches('/')),
            credentials,
            last_attempt: Mutex::new(None),
            completed: AtomicU64::new(0),
        }
    }

    /// Unconditionally exchange the refresh token for a new access token.
    pub async fn refresh(&self) -> RefreshOutcome {
        let mut last = self.last_attempt.lock().await;
        let Some(refresh_token) = self.stored_refresh_token() else {
            return RefreshOutcome::FAILED;
        };
        let stale_access = self.credentials.access_token();
        let outcome = self.exchange(&refresh_token).await;
        *last = Some(self.finish(stale_access, refresh_token, outcome));
        outcome
    }

    /// Refresh after a request authenticated with `stale_access` got a 401.
    ///
    /// If an attempt for the same stale token finished while this caller
    /// waited for the lock, its outcome is reused. If the store already holds
    /// a different access token, the caller should simply retry with it.
    /// Otherwise the endpoint is called again, even if an earlier attempt for
    /// these credentials failed.
    pub async fn refresh_after(&self, stale_access: Option<&str>) -> RefreshOutcome {
        let seen = self.completed.load(Ordering::Acquire);
        let mut last = self.last_attempt.lock().await;

        let Some(refresh_token) = self.stored_refresh_token() else {
            tracing::debug!("No refresh token stored; not attempting refresh");
            return RefreshOutcome::FAILED;
        };

        if let Some(prev) = last.as_ref().filter(|prev| prev.epoch > seen) {
            if prev.stale_access.as_deref() == stale_access && prev.refresh_token == refresh_token {
                tracing::debug!("Reusing concurrent refresh outcome: {:?}", prev.outcome);
                return prev.outcome;
            }
        }

        let current = self.credentials.access_token();
        if current.as_deref() != stale_access && current.as_deref().is_some_and(is_valid_token) {
            tracing::debug!("Access token changed since request was sent; retrying with it");
            return RefreshOutcome::SUCCEEDED;
        }

        let outcome = self.exchange(&refresh_token).await;
        *last = Some(self.finish(stale_access.map(str::to_string), refresh_token, outcome));
        outcome
    }

    fn finish(
        &self,
        stale_access: Option<String>,
        refresh_token: String,
        outcome: RefreshOutcome,
    ) -> Attempt {
        let epoch = self.completed.fetch_add(1, Ordering::AcqRel) + 1;
        Attempt {
            stale_access,
            refresh_token,
            outcome,
            epoch,
        }
    }

    fn stored_refresh_token(&self) -> Option<String> {
        self.credentials
            .refresh_token()
            .filter(|t| is_valid_token(t))
    }

    async fn exchange(&self, refresh_token: &str) -> RefreshOutcome {
        tracing::debug!("POST {}", self.refresh_url);
        let response = match self
            .http
            .post(&self.refresh_url)
            .json(&json!({ "refreshToken": refresh_token }))
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!("Token refresh request failed: {e}");
                return RefreshOutcome::FAILED;
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Failed to read token refresh response: {e}");
                return RefreshOutcome::FAILED;
            }
        };
        let Ok(payload) = serde_json::from_str::<Value>(&body) else {
            tracing::warn!("Token refresh returned status {status} with a non-JSON body");
            return RefreshOutcome::FAILED;
        };
        if !status.is_success() && !crate::normalize::has_error_marker(&payload) {
            tracing::warn!("Token refresh failed with status {status}: {body}");
            return RefreshOutcome::FAILED;
        }

        let data = match normalize(payload) {
            NormalizedResult::Success { data } => data,
            NormalizedResult::Failure(failure) => {
                tracing::warn!("Token refresh rejected: {}", failure.message);
                return RefreshOutcome::FAILED;
            }
        };

        let Some(access_token) = extract_access_token(&data) else {
            tracing::warn!("Token refresh response carried no access token");
            return RefreshOutcome::FAILED;
        };

        match self.credentials.save_access_token(access_token) {
            Ok(()) => {
                tracing::debug!("Access token refreshed");
                RefreshOutcome::SUCCEEDED
            }
            Err(e) => {
                tracing::warn!("Failed to persist refreshed access token: {e}");
                RefreshOutcome::FAILED
            }
        }
    }
}

/// Pull `accessToken` from a refresh payload, either top-level or under `data`.
/// An explicit `"success": false` counts as no token.
fn extract_access_token(payload: &Value) -> Option<&str> {
    if payload.get("success").and_then(Value::as_bool) == Some(false) {
        return None;
    }
    payload
        .get("accessToken")
        .or_else(|| payload.get("data").and_then(|d| d.get("accessToken")))
        .and_then(Value::as_str)
        .filter(|t| is_valid_token(t))
}

/// Non-empty, non-whitespace token text.
pub(crate) fn is_valid_token(token: &str) -> bool {
    !token.trim().is_empty()
}
