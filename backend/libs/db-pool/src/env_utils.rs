//! Environment variable parsing helpers shared by the server and the CLI tools.

use std::str::FromStr;

/// Parse an environment variable, falling back to `default` when missing or invalid.
pub fn parse_env_with_default<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Read a string variable; empty values count as unset.
pub fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Interpret `true`, `1` and `t` (any case) as true.
pub fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "t")
}

/// Boolean environment variable using [`parse_flag`] semantics.
pub fn parse_env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| parse_flag(&v))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[serial_test::serial]
    fn test_parse_env_with_default() {
        let result: u32 = parse_env_with_default("NONEXISTENT_VAR_XYZ", 42);
        assert_eq!(result, 42);

        std::env::set_var("TEST_PORT", " 8080 ");
        let result: u16 = parse_env_with_default("TEST_PORT", 3000);
        assert_eq!(result, 8080);
        std::env::remove_var("TEST_PORT");
    }

    #[test]
    #[serial_test::serial]
    fn test_env_non_empty() {
        std::env::set_var("TEST_BLANK", "   ");
        assert_eq!(env_non_empty("TEST_BLANK"), None);
        std::env::set_var("TEST_BLANK", " value ");
        assert_eq!(env_non_empty("TEST_BLANK").as_deref(), Some("value"));
        std::env::remove_var("TEST_BLANK");
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("T"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag("yes"));
        assert!(!parse_flag(""));
    }

    #[test]
    #[serial_test::serial]
    fn test_parse_env_bool_default() {
        std::env::remove_var("TEST_FLAG_XYZ");
        assert!(parse_env_bool("TEST_FLAG_XYZ", true));
        std::env::set_var("TEST_FLAG_XYZ", "0");
        assert!(!parse_env_bool("TEST_FLAG_XYZ", true));
        std::env::remove_var("TEST_FLAG_XYZ");
    }
}
