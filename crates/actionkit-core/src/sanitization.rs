//! Masking of credentials before parameters reach a log line

use serde_json::{Map, Value as JsonValue};

const SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "passwd",
    "token",
    "jwt",
    "secret",
    "apikey",
    "api_key",
    "authorization",
    "credential",
    "credentials",
];

const SENSITIVE_SUFFIXES: &[&str] = &["_token", "_secret", "_password", "_key", "token", "secret"];

pub const REDACTED: &str = "***REDACTED***";

/// Whether a parameter name looks like it carries a credential
pub fn is_sensitive_field(field_name: &str) -> bool {
    let lower = field_name.to_ascii_lowercase();
    SENSITIVE_FIELDS.contains(&lower.as_str())
        || SENSITIVE_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
}

/// Copy of `value` with every sensitive scalar replaced by [`REDACTED`]
pub fn redact(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(map) => JsonValue::Object(
            map.iter()
                .map(|(key, val)| {
                    let val = match val {
                        JsonValue::Object(_) | JsonValue::Array(_) => redact(val),
                        JsonValue::Null => JsonValue::Null,
                        _ if is_sensitive_field(key) => JsonValue::String(REDACTED.to_string()),
                        _ => val.clone(),
                    };
                    (key.clone(), val)
                })
                .collect::<Map<_, _>>(),
        ),
        JsonValue::Array(items) => JsonValue::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_sensitive_field() {
        assert!(is_sensitive_field("password"));
        assert!(is_sensitive_field("JWT"));
        assert!(is_sensitive_field("refresh_token"));
        assert!(is_sensitive_field("accessToken"));
        assert!(!is_sensitive_field("projectId"));
        assert!(!is_sensitive_field("name"));
    }

    #[test]
    fn test_redact_nested() {
        let params = json!({
            "name": "Apollo",
            "invite": {"email": "a@b.c", "api_key": "k-123"},
            "members": [{"password": "hunter2", "id": 1}]
        });

        let redacted = redact(&params);

        assert_eq!(redacted["name"], "Apollo");
        assert_eq!(redacted["invite"]["api_key"], REDACTED);
        assert_eq!(redacted["invite"]["email"], "a@b.c");
        assert_eq!(redacted["members"][0]["password"], REDACTED);
        assert_eq!(redacted["members"][0]["id"], 1);
    }
}
