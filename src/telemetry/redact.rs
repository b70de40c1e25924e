use serde_json::Value;

pub const REDACTED: &str = "[REDACTED]";

/// Substrings that mark a context key as sensitive, matched against the lowercased key.
pub const SENSITIVE_KEY_PATTERNS: [&str; 9] = [
    "password",
    "token",
    "secret",
    "apikey",
    "api_key",
    "authorization",
    "auth",
    "key",
    "credential",
];

/// Matches the `auth` pattern but only ever holds `apikey` / `jwt` / `none`.
const EXEMPT_KEY: &str = "authMethod";

pub fn is_sensitive_key(key: &str) -> bool {
    if key == EXEMPT_KEY {
        return false;
    }
    let lower = key.to_lowercase();
    SENSITIVE_KEY_PATTERNS
        .iter()
        .any(|pattern| lower.contains(pattern))
}

/// Returns a copy of `context` with every sensitive field replaced by `[REDACTED]`.
/// Nested objects are sanitized too; arrays are walked for objects.
pub fn sanitize_context(context: &Value) -> Value {
    match context {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    let value = if is_sensitive_key(key) {
                        Value::String(REDACTED.to_string())
                    } else {
                        sanitize_context(value)
                    };
                    (key.clone(), value)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(sanitize_context).collect()),
        other => other.clone(),
    }
}
