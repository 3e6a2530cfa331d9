use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// On-disk configuration (`offerfeed.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_path: Option<String>,
}

/// Resolved settings an [`ApiClient`](crate::client::ApiClient) is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub credentials_path: Option<PathBuf>,
}

impl ClientConfig {
    /// Validate `base_url` and trim any trailing `/`.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let url = reqwest::Url::parse(base_url).map_err(|e| config_error(format!(
            "Invalid base URL '{base_url}': {e}"
        )))?;
        match url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(config_error(format!(
                    "Unsupported URL scheme '{scheme}' in '{base_url}'"
                )))
            }
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials_path: None,
        })
    }

    pub fn with_credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_path = Some(path.into());
        self
    }
}

fn config_error(detail: String) -> ApiError {
    ApiError::ConfigError {
        path: PathBuf::from("<base-url>"),
        detail,
    }
}
