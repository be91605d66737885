use serde_json::Value;

/// JSON keys whose values must never leave the process
const SENSITIVE_KEYS: &[&str] = &["token", "apiKey", "api_key", "authorization", "secret"];

/// Replace every credential-bearing field in a config document with `***`
///
/// Walks the JSON tree; a field is masked when its key matches one of the
/// sensitive names case-insensitively. Non-string values under sensitive
/// keys are masked too.
pub fn redact_config(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let redacted = map
                .iter()
                .map(|(key, val)| {
                    if is_sensitive(key) {
                        (key.clone(), Value::String("***".to_owned()))
                    } else {
                        (key.clone(), redact_config(val))
                    }
                })
                .collect();
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_config).collect()),
        other => other.clone(),
    }
}

fn is_sensitive(key: &str) -> bool {
    SENSITIVE_KEYS.iter().any(|s| key.eq_ignore_ascii_case(s))
}
