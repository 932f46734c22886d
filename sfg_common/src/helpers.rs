use std::env;

/// Interprets `1/true/yes/on` and `0/false/no/off` (any case, surrounding whitespace ignored). Anything else, including
/// a missing value, yields `default`.
pub fn parse_boolean_flag(value: Option<&str>, default: bool) -> bool {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

/// Reads a boolean flag from the environment variable `name`.
pub fn env_flag(name: &str, default: bool) -> bool {
    parse_boolean_flag(env::var(name).ok().as_deref(), default)
}
