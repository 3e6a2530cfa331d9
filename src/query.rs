use serde_json::Value;

/// Build a `?key=value&...` query string from a JSON object.
///
/// Keys keep insertion order, `null` values are skipped, and both keys and
/// values are percent-encoded. Returns an empty string when nothing remains,
/// including for non-object input.
pub fn object_to_get_params(params: &Value) -> String {
    let Some(map) = params.as_object() else {
        return String::new();
    };

    let pairs: Vec<String> = map
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(&scalar_text(value))
            )
        })
        .collect();

    if pairs.is_empty() {
        String::new()
    } else {
        format!("?{}", pairs.join("&"))
    }
}

/// Text form of a query value: strings unquoted, arrays comma-joined.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(scalar_text).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}
