use serde_json::{json, Map, Value};

use crate::error::ApiError;

/// Normalize an API path given on the command line to start with `/`.
pub fn parse_path(input: &str) -> Result<String, ApiError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(arg_error("API path must not be empty"));
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return Err(arg_error(&format!(
            "Expected a path relative to the base URL, got '{trimmed}'"
        )));
    }
    if trimmed.starts_with('/') {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("/{trimmed}"))
    }
}

/// Parse CLI arguments into a JSON object.
///
/// Supports `key=value` and `key:value` formats. Values are auto-coerced:
/// - Quoted strings have quotes stripped
/// - `true`/`false` become booleans, `null` becomes null
/// - Valid numbers become JSON numbers
/// - Everything else stays a string
pub fn parse_args(args: &[String]) -> Result<Value, ApiError> {
    if args.is_empty() {
        return Ok(json!({}));
    }

    let mut map = Map::new();
    for arg in args {
        let pos = match (arg.find('='), arg.find(':')) {
            (Some(eq), Some(colon)) => eq.min(colon),
            (Some(p), None) | (None, Some(p)) => p,
            (None, None) => {
                return Err(arg_error(&format!(
                    "Cannot parse argument '{arg}': expected 'key=value' or 'key:value'"
                )))
            }
        };
        let (key, raw_value) = (&arg[..pos], &arg[pos + 1..]);

        if key.is_empty() {
            return Err(arg_error(&format!("Empty key in argument '{arg}'")));
        }

        map.insert(key.to_string(), coerce_value(raw_value));
    }

    Ok(Value::Object(map))
}

/// Parse a `--body` argument. It must be a JSON document.
pub fn parse_body(raw: &str) -> Result<Value, ApiError> {
    serde_json::from_str(raw)
        .map_err(|e| arg_error(&format!("Request body is not valid JSON: {e}")))
}

/// Coerce a raw string value into a JSON value.
fn coerce_value(raw: &str) -> Value {
    if ((raw.starts_with('"') && raw.ends_with('"'))
        || (raw.starts_with('\'') && raw.ends_with('\'')))
        && raw.len() >= 2
    {
        return Value::String(raw[1..raw.len() - 1].to_string());
    }

    if raw.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if raw == "null" {
        return Value::Null;
    }

    if let Ok(n) = raw.parse::<i64>() {
        return json!(n);
    }
    // Reject "inf"/"NaN", which f64 parsing accepts but JSON cannot hold.
    if let Ok(f) = raw.parse::<f64>() {
        if f.is_finite() {
            return json!(f);
        }
    }

    Value::String(raw.to_string())
}

fn arg_error(detail: &str) -> ApiError {
    ApiError::ConfigError {
        path: std::path::PathBuf::from("<args>"),
        detail: detail.to_string(),
    }
}
