//! Access/refresh token storage.
//!
//! The client reads tokens through [`CredentialStore`] on every request, so
//! a refresh performed by one request is visible to the next one.

use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token: Some(refresh_token.into()),
        }
    }
}

pub trait CredentialStore: Send + Sync {
    fn access_token(&self) -> Option<String>;
    fn refresh_token(&self) -> Option<String>;
    fn save_access_token(&self, token: &str) -> Result<(), ApiError>;
    fn save_credentials(&self, credentials: &Credentials) -> Result<(), ApiError>;
    fn clear(&self) -> Result<(), ApiError>;
}

impl std::fmt::Debug for dyn CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore").finish_non_exhaustive()
    }
}

/// Process-local store; tokens are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<Credentials>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            inner: RwLock::new(credentials),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Credentials> {
        self.inner.read().unwrap_or_else(|poisoned| {
            tracing::warn!("Credential lock poisoned; using last stored tokens");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, Credentials> {
        self.inner.write().unwrap_or_else(|poisoned| {
            tracing::warn!("Credential lock poisoned; overwriting last stored tokens");
            poisoned.into_inner()
        })
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn access_token(&self) -> Option<String> {
        self.read().access_token.clone()
    }

    fn refresh_token(&self) -> Option<String> {
        self.read().refresh_token.clone()
    }

    fn save_access_token(&self, token: &str) -> Result<(), ApiError> {
        self.write().access_token = Some(token.to_string());
        Ok(())
    }

    fn save_credentials(&self, credentials: &Credentials) -> Result<(), ApiError> {
        *self.write() = credentials.clone();
        Ok(())
    }

    fn clear(&self) -> Result<(), ApiError> {
        *self.write() = Credentials::default();
        Ok(())
    }
}

/// Default location of the persisted credentials file.
pub fn default_credentials_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".offerfeed")
        .join("credentials.json")
}

/// JSON-file store. Every read goes to disk, so separate processes sharing
/// the file see each other's refreshes.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn new_default() -> Self {
        Self::new(default_credentials_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored credentials. A missing or unreadable file reads as empty.
    pub fn load(&self) -> Credentials {
        let Ok(data) = std::fs::read_to_string(&self.path) else {
            return Credentials::default();
        };
        match serde_json::from_str(&data) {
            Ok(creds) => creds,
            Err(e) => {
                tracing::warn!("Ignoring unreadable credentials at {}: {e}", self.path.display());
                Credentials::default()
            }
        }
    }

    fn store(&self, credentials: &Credentials) -> Result<(), ApiError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(credentials)
            .map_err(|e| ApiError::Credentials(format!("Failed to serialize credentials: {e}")))?;
        std::fs::write(&self.path, data)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn access_token(&self) -> Option<String> {
        self.load().access_token
    }

    fn refresh_token(&self) -> Option<String> {
        self.load().refresh_token
    }

    fn save_access_token(&self, token: &str) -> Result<(), ApiError> {
        let mut creds = self.load();
        creds.access_token = Some(token.to_string());
        self.store(&creds)
    }

    fn save_credentials(&self, credentials: &Credentials) -> Result<(), ApiError> {
        self.store(credentials)
    }

    fn clear(&self) -> Result<(), ApiError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
