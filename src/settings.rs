use std::{env, time::Duration};

/// Trimmed value of `key`, `None` when unset or blank.
pub fn text(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// `None` when unset, so callers can keep a default that is `true`.
pub fn flag(key: &str) -> Option<bool> {
    text(key).map(|value| parse_flag(&value))
}

pub fn number(key: &str) -> Option<u64> {
    text(key).and_then(|value| value.parse().ok())
}

pub fn millis(key: &str) -> Option<Duration> {
    number(key).map(Duration::from_millis)
}

pub fn secs(key: &str) -> Option<Duration> {
    number(key).map(Duration::from_secs)
}

/// Comma-separated names. Empty when unset or when every entry is blank.
pub fn list(key: &str) -> Vec<String> {
    text(key).map(|value| parse_list(&value)).unwrap_or_default()
}

pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
