use std::path::{Path, PathBuf};

use crate::error::ApiError;

use super::env::expand_config_file;
use super::types::{ClientConfig, ConfigFile};

/// Environment variables consulted for the base URL, highest precedence first.
pub const BASE_URL_ENV_VARS: [&str; 2] = ["OFFERFEED_API_ENDPOINT", "API_ENDPOINT"];

/// Find the config file to use, if any.
///
/// Precedence:
/// 1. `--config` CLI flag
/// 2. `OFFERFEED_CONFIG` env var
/// 3. `./config/offerfeed.json` (project-level)
/// 4. `~/.offerfeed/offerfeed.json` (home-level)
pub fn discover_config_file(cli_config: Option<&str>) -> Option<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(path) = cli_config {
        candidates.push(PathBuf::from(path));
    }
    if let Ok(env_path) = std::env::var("OFFERFEED_CONFIG") {
        candidates.push(PathBuf::from(env_path));
    }
    candidates.push(PathBuf::from("./config/offerfeed.json"));
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".offerfeed").join("offerfeed.json"));
    }

    candidates.into_iter().find(|p| p.exists())
}

/// Load a single config file and expand environment references in it.
pub fn load_config_file(path: &Path) -> Result<ConfigFile, ApiError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApiError::ConfigError {
        path: path.to_path_buf(),
        detail: format!("Cannot read file: {e}"),
    })?;

    let mut config =
        serde_json::from_str::<ConfigFile>(&content).map_err(|e| ApiError::ConfigError {
            path: path.to_path_buf(),
            detail: format!("Invalid JSON: {e}"),
        })?;
    expand_config_file(&mut config)?;
    Ok(config)
}

/// Load the discovered config file, or an empty one when none exists.
///
/// An explicit `--config` path that does not exist is an error rather than
/// silently falling through to lower-precedence locations.
pub fn load_config(cli_config: Option<&str>) -> Result<(Option<PathBuf>, ConfigFile), ApiError> {
    if let Some(path) = cli_config {
        let path = PathBuf::from(path);
        if !path.exists() {
            return Err(ApiError::ConfigError {
                path,
                detail: "File does not exist".into(),
            });
        }
    }
    match discover_config_file(cli_config) {
        Some(path) => {
            let file = load_config_file(&path)?;
            Ok((Some(path), file))
        }
        None => Ok((None, ConfigFile::default())),
    }
}

/// Resolve the client configuration from CLI flags, environment and config file.
pub fn resolve_config(
    cli_config: Option<&str>,
    cli_base_url: Option<&str>,
) -> Result<ClientConfig, ApiError> {
    let (path, file) = load_config(cli_config)?;
    resolve_with(path.as_deref(), file, cli_base_url, |name| std::env::var(name).ok())
}

/// Base URL precedence: CLI flag, then [`BASE_URL_ENV_VARS`], then the file.
pub fn resolve_with<F>(
    source: Option<&Path>,
    file: ConfigFile,
    cli_base_url: Option<&str>,
    lookup: F,
) -> Result<ClientConfig, ApiError>
where
    F: Fn(&str) -> Option<String>,
{
    let from_env = || {
        BASE_URL_ENV_VARS
            .iter()
            .find_map(|name| lookup(*name).filter(|v| !v.trim().is_empty()))
    };

    let base_url = cli_base_url
        .map(str::to_string)
        .or_else(from_env)
        .or(file.base_url)
        .ok_or_else(|| ApiError::ConfigError {
            path: source.map_or_else(|| PathBuf::from("<none>"), Path::to_path_buf),
            detail: format!(
                "No API base URL configured. Pass --base-url, set {}, or add \"baseUrl\" to offerfeed.json",
                BASE_URL_ENV_VARS[0]
            ),
        })?;

    let mut config = ClientConfig::new(&base_url)?;
    if let Some(path) = file.credentials_path {
        config = config.with_credentials_path(path);
    }
    Ok(config)
}
