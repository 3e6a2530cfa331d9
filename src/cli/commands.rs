use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use crate::args::{parse_args, parse_body, parse_path};
use crate::client::ApiClient;
use crate::config::{load_config, resolve_config, ClientConfig};
use crate::credentials::{default_credentials_path, CredentialStore, Credentials, FileCredentialStore};
use crate::error::ApiError;
use crate::feed::parse_feed;

use super::output::{print_feed, print_result, OutputMode};

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub config: Option<String>,
    pub base_url: Option<String>,
    pub credentials: Option<PathBuf>,
}

impl GlobalOptions {
    pub fn client_config(&self) -> Result<ClientConfig, ApiError> {
        resolve_config(self.config.as_deref(), self.base_url.as_deref())
    }

    /// Credentials file: `--credentials`, then `credentialsPath` from the
    /// config file, then `~/.offerfeed/credentials.json`.
    pub fn credentials_path(&self) -> Result<PathBuf, ApiError> {
        if let Some(path) = &self.credentials {
            return Ok(path.clone());
        }
        let (_, file) = load_config(self.config.as_deref())?;
        Ok(file
            .credentials_path
            .map(PathBuf::from)
            .unwrap_or_else(default_credentials_path))
    }

    pub fn store(&self) -> Result<Arc<FileCredentialStore>, ApiError> {
        Ok(Arc::new(FileCredentialStore::new(self.credentials_path()?)))
    }

    pub fn client(&self) -> Result<ApiClient, ApiError> {
        let config = self.client_config()?;
        let store: Arc<dyn CredentialStore> = self.store()?;
        ApiClient::new(&config, store)
    }
}

pub async fn run_get(
    opts: &GlobalOptions,
    path: &str,
    params: &[String],
    mode: OutputMode,
) -> Result<(), ApiError> {
    let path = parse_path(path)?;
    let params = parse_args(params)?;
    let client = opts.client()?;
    print_result(client.get(&path, Some(&params)).await?, mode)
}

pub async fn run_post(
    opts: &GlobalOptions,
    path: &str,
    body: Option<&str>,
    mode: OutputMode,
) -> Result<(), ApiError> {
    let path = parse_path(path)?;
    let body = body.map(parse_body).transpose()?;
    let client = opts.client()?;
    print_result(client.post(&path, body.as_ref()).await?, mode)
}

pub async fn run_feed(
    opts: &GlobalOptions,
    path: &str,
    params: &[String],
    usd_per_eth: Option<f64>,
    mode: OutputMode,
) -> Result<(), ApiError> {
    let path = parse_path(path)?;
    let params = parse_args(params)?;
    let client = opts.client()?;
    let data = client.get(&path, Some(&params)).await?.into_data()?;
    let items = parse_feed(data)?;
    print_feed(&items, usd_per_eth, mode, std::io::stdout().is_terminal());
    Ok(())
}

pub async fn run_refresh(opts: &GlobalOptions) -> Result<(), ApiError> {
    let client = opts.client()?;
    if client.refresh_access().await.success {
        println!("Access token refreshed");
        Ok(())
    } else {
        Err(ApiError::Credentials(
            "Token refresh failed. Run `offerfeed login` with fresh tokens".into(),
        ))
    }
}

pub fn run_login(
    opts: &GlobalOptions,
    access_token: &str,
    refresh_token: Option<&str>,
) -> Result<(), ApiError> {
    let store = opts.store()?;
    let credentials = Credentials {
        access_token: Some(access_token.to_string()),
        refresh_token: refresh_token
            .map(str::to_string)
            .or_else(|| store.refresh_token()),
    };
    store.save_credentials(&credentials)?;
    println!("Credentials saved to {}", store.path().display());
    Ok(())
}

pub fn run_logout(opts: &GlobalOptions) -> Result<(), ApiError> {
    let store = opts.store()?;
    store.clear()?;
    println!("Credentials removed from {}", store.path().display());
    Ok(())
}

pub fn run_config_show(opts: &GlobalOptions, mode: OutputMode) -> Result<(), ApiError> {
    let (source, _) = load_config(opts.config.as_deref())?;
    let config = opts.client_config()?;
    let credentials = opts.credentials_path()?;
    let store = FileCredentialStore::new(&credentials);

    if mode == OutputMode::Json {
        let json = serde_json::json!({
            "configFile": source.as_ref().map(|p| p.display().to_string()),
            "baseUrl": config.base_url,
            "credentialsPath": credentials.display().to_string(),
            "hasAccessToken": store.access_token().is_some(),
            "hasRefreshToken": store.refresh_token().is_some(),
        });
        println!("{}", serde_json::to_string_pretty(&json).unwrap_or_default());
        return Ok(());
    }

    match source {
        Some(path) => println!("Config file:    {}", path.display()),
        None => println!("Config file:    (none)"),
    }
    println!("Base URL:       {}", config.base_url);
    println!("Credentials:    {}", credentials.display());
    println!(
        "Access token:   {}",
        if store.access_token().is_some() { "present" } else { "absent" }
    );
    println!(
        "Refresh token:  {}",
        if store.refresh_token().is_some() { "present" } else { "absent" }
    );
    Ok(())
}
