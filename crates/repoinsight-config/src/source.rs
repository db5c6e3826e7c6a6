//! Environment variable readers
//!
//! Small helpers shared by all configuration sections. Values come from
//! the process environment; absent keys fall back to the safe defaults
//! defined in `lib.rs`.

use crate::error::{ConfigError, ConfigResult};

/// Read a string, falling back to the default when unset or empty.
pub fn env_string(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => default.to_string(),
    }
}

/// Read an optional string; empty values count as unset.
pub fn env_opt(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

/// Read and parse a value, falling back to the default when unset.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` when the variable is present but
/// does not parse as `T`.
pub fn env_parse<T>(key: &str, default: T) -> ConfigResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::invalid_value(key, e.to_string())),
        _ => Ok(default),
    }
}

/// Read a list, accepting either a comma-separated string or a JSON
/// array (`a,b,c` or `["a","b","c"]`).
pub fn env_list(key: &str, default: &[&str]) -> Vec<String> {
    let raw = match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => return default.iter().map(|s| (*s).to_string()).collect(),
    };

    parse_list(&raw)
}

/// Parse the comma-or-JSON list format.
pub fn parse_list(raw: &str) -> Vec<String> {
    let trimmed = raw.trim().trim_matches(|c| c == '\'' || c == '"');

    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        if let Ok(serde_json::Value::Array(items)) = serde_json::from_str(trimmed) {
            return items
                .into_iter()
                .filter_map(|v| v.as_str().map(|s| s.trim().to_string()))
                .filter(|s| !s.is_empty())
                .collect();
        }
    }

    trimmed
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_list() {
        assert_eq!(parse_list(".py, .rs ,.md"), vec![".py", ".rs", ".md"]);
    }

    #[test]
    fn parses_json_array_list() {
        assert_eq!(parse_list(r#"[".py", ".rs"]"#), vec![".py", ".rs"]);
    }

    #[test]
    fn quoted_json_array_still_parses() {
        assert_eq!(parse_list(r#"'[".py"]'"#), vec![".py"]);
    }

    #[test]
    fn empty_entries_are_dropped() {
        assert_eq!(parse_list("a,,b,"), vec!["a", "b"]);
    }
}
