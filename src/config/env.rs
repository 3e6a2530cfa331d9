use crate::error::ApiError;

use super::types::ConfigFile;

/// Expand environment variable references in a string.
///
/// Supported syntaxes:
/// - `${VAR}` - replaced with env var value; error if unset
/// - `${VAR:-fallback}` - replaced with env var value, or fallback if unset or empty
/// - `$env:VAR` - same as `${VAR}`
pub fn expand_env_vars(input: &str) -> Result<String, ApiError> {
    expand_with(input, |name| std::env::var(name).ok())
}

/// [`expand_env_vars`] with an explicit variable lookup.
pub fn expand_with<F>(input: &str, lookup: F) -> Result<String, ApiError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        result.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(braced) = after.strip_prefix('{') {
            let close = braced.find('}').ok_or_else(|| {
                env_error(&format!("Unclosed variable reference: ${{{braced}"))
            })?;
            let expr = &braced[..close];
            match expr.split_once(":-") {
                Some((name, fallback)) => match lookup(name) {
                    Some(val) if !val.is_empty() => result.push_str(&val),
                    _ => result.push_str(fallback),
                },
                None => result.push_str(&required(expr, &lookup)?),
            }
            rest = &braced[close + 1..];
        } else if let Some(named) = after.strip_prefix("env:") {
            let len = named
                .find(|c: char| !(c.is_alphanumeric() || c == '_'))
                .unwrap_or(named.len());
            if len == 0 {
                return Err(env_error("Empty variable name in $env: reference"));
            }
            result.push_str(&required(&named[..len], &lookup)?);
            rest = &named[len..];
        } else {
            result.push('$');
            rest = after;
        }
    }

    result.push_str(rest);
    Ok(result)
}

fn required<F>(name: &str, lookup: &F) -> Result<String, ApiError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).ok_or_else(|| env_error(&format!("Environment variable '{name}' is not set")))
}

/// Expand environment variables in every string field of a config file.
pub fn expand_config_file(config: &mut ConfigFile) -> Result<(), ApiError> {
    if let Some(ref mut url) = config.base_url {
        *url = expand_env_vars(url)?;
    }
    if let Some(ref mut path) = config.credentials_path {
        *path = expand_env_vars(path)?;
    }
    Ok(())
}

fn env_error(detail: &str) -> ApiError {
    ApiError::ConfigError {
        path: std::path::PathBuf::from("<env>"),
        detail: detail.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn expand_dollar_brace_var() {
        let result = expand_with("prefix-${HOST}-suffix", vars(&[("HOST", "hello")])).unwrap();
        assert_eq!(result, "prefix-hello-suffix");
    }

    #[test]
    fn expand_dollar_brace_unset_errors() {
        let err = expand_with("${MISSING_XYZ}", vars(&[])).unwrap_err();
        assert!(err.to_string().contains("MISSING_XYZ"));
        assert!(err.to_string().contains("not set"));
    }

    #[test]
    fn expand_fallback_when_unset_or_empty() {
        assert_eq!(
            expand_with("${PORT:-4000}", vars(&[])).unwrap(),
            "4000"
        );
        assert_eq!(
            expand_with("${PORT:-4000}", vars(&[("PORT", "")])).unwrap(),
            "4000"
        );
        assert_eq!(
            expand_with("${PORT:-4000}", vars(&[("PORT", "8080")])).unwrap(),
            "8080"
        );
    }

    #[test]
    fn expand_env_colon_var() {
        let result = expand_with("https://$env:API_HOST/v1", vars(&[("API_HOST", "api.example.com")]))
            .unwrap();
        assert_eq!(result, "https://api.example.com/v1");
    }

    #[test]
    fn expand_env_colon_empty_name_errors() {
        let err = expand_with("$env:/x", vars(&[])).unwrap_err();
        assert!(err.to_string().contains("Empty variable name"));
    }

    #[test]
    fn unclosed_brace_errors() {
        let err = expand_with("${OPEN", vars(&[])).unwrap_err();
        assert!(err.to_string().contains("Unclosed"));
    }

    #[test]
    fn lone_dollar_passes_through() {
        assert_eq!(expand_with("cost: $5", vars(&[])).unwrap(), "cost: $5");
        assert_eq!(expand_with("trailing$", vars(&[])).unwrap(), "trailing$");
    }

    #[test]
    fn multiple_expansions() {
        let result = expand_with("${A}/${B}", vars(&[("A", "aaa"), ("B", "bbb")])).unwrap();
        assert_eq!(result, "aaa/bbb");
    }

    #[test]
    fn expand_config_file_expands_fields() {
        std::env::set_var("OFFERFEED_TEST_CF_HOST", "api.example.com");
        let mut cfg = ConfigFile {
            base_url: Some("https://${OFFERFEED_TEST_CF_HOST}".into()),
            credentials_path: Some("${OFFERFEED_TEST_CF_UNSET:-/tmp/creds.json}".into()),
        };
        expand_config_file(&mut cfg).unwrap();
        assert_eq!(cfg.base_url.as_deref(), Some("https://api.example.com"));
        assert_eq!(cfg.credentials_path.as_deref(), Some("/tmp/creds.json"));
        std::env::remove_var("OFFERFEED_TEST_CF_HOST");
    }
}
