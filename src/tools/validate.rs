//! Input validation helpers shared across the tool surfaces. All of these
//! are pure and return either a bool or a ready-to-use error message so the
//! operations can bail out before touching the network.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::DateTime;
use chrono_tz::Tz;
use regex::Regex;

// RFC 5322 addr-spec, including quoted local parts and IP-literal domains.
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^(?:[a-z0-9!#$%&'*+/=?^_`{|}~-]+",
        r"(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*",
        r#"|"(?:[\x01-\x08\x0b\x0c\x0e-\x1f\x21\x23-\x5b\x5d-\x7f]"#,
        r#"|\\[\x01-\x09\x0b\x0c\x0e-\x7f])*")"#,
        r"@(?:(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+",
        r"[a-z0-9](?:[a-z0-9-]*[a-z0-9])?",
        r"|\[(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}",
        r"(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?|[a-z0-9-]*[a-z0-9]:",
        r"(?:[\x01-\x08\x0b\x0c\x0e-\x1f\x21-\x5a\x53-\x7f]",
        r"|\\[\x01-\x09\x0b\x0c\x0e-\x7f])+)\])$",
    ))
    .expect("email regex compiles")
});

static RFC3339_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+-]\d{2}:\d{2})$")
        .expect("timestamp regex compiles")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Shape check only. Calendar offsets like `25:99` still fail later when
/// chrono parses the value.
pub fn validate_rfc3339_timestamp(value: &str) -> bool {
    RFC3339_REGEX.is_match(value)
}

/// Strictly before. Returns false when either timestamp fails to parse.
pub fn is_start_before_end(start: &str, end: &str) -> bool {
    match (
        DateTime::parse_from_rfc3339(start),
        DateTime::parse_from_rfc3339(end),
    ) {
        (Ok(start), Ok(end)) => start < end,
        _ => false,
    }
}

pub fn is_valid_timezone(tz: &str) -> bool {
    Tz::from_str(tz).is_ok()
}

/// Range check for numeric arguments. Returns a ready error message on
/// violation.
pub fn check_range(name: &str, value: i64, min: i64, max: i64) -> Option<String> {
    if value < min || value > max {
        return Some(format!(
            "Invalid {} value: {}. Must be between {} and {}.",
            name, value, min, max
        ));
    }
    None
}

/// Membership check for enum-ish string arguments.
pub fn check_enum(name: &str, value: &str, allowed: &[&str]) -> Option<String> {
    if !allowed.contains(&value) {
        return Some(format!(
            "Invalid {} value: {}. Must be one of: {}.",
            name,
            value,
            allowed.join(", ")
        ));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_email_shapes() {
        for email in [
            "user@example.com",
            "first.last@sub.example.co.uk",
            "user+tag@example.com",
            "USER@EXAMPLE.COM",
            "\"quoted local\"@example.com",
            "user@[192.168.1.1]",
        ] {
            assert!(is_valid_email(email), "should accept {}", email);
        }
    }

    #[test]
    fn rejects_malformed_emails() {
        for email in [
            "",
            "plainaddress",
            "@example.com",
            "user@",
            "user@@example.com",
            "user@example",
            "user name@example.com",
            "user@-example.com",
        ] {
            assert!(!is_valid_email(email), "should reject {}", email);
        }
    }

    #[test]
    fn rfc3339_shape_checks() {
        assert!(validate_rfc3339_timestamp("2023-10-01T12:00:00Z"));
        assert!(validate_rfc3339_timestamp("2023-10-01T12:00:00.123Z"));
        assert!(validate_rfc3339_timestamp("2023-10-01T12:00:00+05:30"));
        assert!(validate_rfc3339_timestamp("2023-10-01T12:00:00-08:00"));

        assert!(!validate_rfc3339_timestamp("2023-10-01"));
        assert!(!validate_rfc3339_timestamp("2023-10-01 12:00:00Z"));
        assert!(!validate_rfc3339_timestamp("2023-10-01T12:00Z"));
        assert!(!validate_rfc3339_timestamp("not a timestamp"));
    }

    #[test]
    fn start_before_end_is_strict() {
        assert!(is_start_before_end(
            "2023-10-01T12:00:00Z",
            "2023-10-01T13:00:00Z"
        ));
        // Equal timestamps are not before.
        assert!(!is_start_before_end(
            "2023-10-01T12:00:00Z",
            "2023-10-01T12:00:00Z"
        ));
        assert!(!is_start_before_end(
            "2023-10-01T13:00:00Z",
            "2023-10-01T12:00:00Z"
        ));
        // Offsets are normalized before comparing.
        assert!(is_start_before_end(
            "2023-10-01T12:00:00+05:30",
            "2023-10-01T12:00:00Z"
        ));
        assert!(!is_start_before_end("garbage", "2023-10-01T12:00:00Z"));
    }

    #[test]
    fn timezone_names_come_from_the_iana_db() {
        assert!(is_valid_timezone("UTC"));
        assert!(is_valid_timezone("Asia/Kolkata"));
        assert!(is_valid_timezone("America/New_York"));
        assert!(!is_valid_timezone("Mars/Olympus_Mons"));
        assert!(!is_valid_timezone(""));
    }

    #[test]
    fn range_and_enum_checks_format_messages() {
        assert_eq!(check_range("max_results", 50, 1, 100), None);
        assert_eq!(
            check_range("max_results", 0, 1, 100),
            Some("Invalid max_results value: 0. Must be between 1 and 100.".to_string())
        );
        assert_eq!(check_enum("status", "completed", &["needsAction", "completed"]), None);
        assert_eq!(
            check_enum("status", "done", &["needsAction", "completed"]),
            Some("Invalid status value: done. Must be one of: needsAction, completed.".to_string())
        );
    }
}
