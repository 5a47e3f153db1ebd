use std::{env, str::FromStr};

/// Parsed env var, or `default` when unset or unparseable.
pub fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}

/// Boolean env var accepting 1/0, true/false, yes/no, y/n, on/off.
pub fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|raw| parse_flag(&raw))
        .unwrap_or(default)
}

pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags() {
        assert_eq!(parse_flag(" On "), Some(true));
        assert_eq!(parse_flag("Y"), Some(true));
        assert_eq!(parse_flag("no"), Some(false));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn missing_var_uses_default() {
        assert_eq!(env_or("QUORUM_TEST_SURELY_UNSET_VAR", 42u32), 42);
        assert!(env_flag("QUORUM_TEST_SURELY_UNSET_FLAG", true));
    }
}
