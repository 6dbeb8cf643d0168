//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use chrono::{DateTime, Utc};

/// Format a timestamp for display
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Truncate text to a maximum length with ellipsis
pub fn truncate_text(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_length.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Lowercase and trim an email so lookups are case-insensitive
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate email format
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}

/// Validate phone number format (basic validation)
pub fn is_valid_phone(phone: &str) -> bool {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    phone.chars().all(|c| c.is_ascii_digit() || c == '+' || c == '-' || c == ' ')
        && digits >= 10
        && digits <= 15
}

/// Validate an Indian postal code (six digits, first non-zero)
pub fn is_valid_pincode(pincode: &str) -> bool {
    pincode.len() == 6
        && pincode.chars().all(|c| c.is_ascii_digit())
        && !pincode.starts_with('0')
}

/// Full display name from optional name parts
pub fn display_name(first: &str, middle: Option<&str>, last: &str) -> String {
    [Some(first), middle, Some(last)]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("asha@example.org"));
        assert!(!is_valid_email("asha.example.org"));
        assert!(!is_valid_email("asha@example"));
        assert!(!is_valid_email("@example.org"));
        assert!(!is_valid_email("as ha@example.org"));
    }

    #[test]
    fn test_phone_validation() {
        assert!(is_valid_phone("+91 98765 43210"));
        assert!(is_valid_phone("9876543210"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("98765abc10"));
    }

    #[test]
    fn test_pincode_validation() {
        assert!(is_valid_pincode("560001"));
        assert!(!is_valid_pincode("060001"));
        assert!(!is_valid_pincode("56001"));
    }

    #[test]
    fn test_display_name_and_truncate() {
        assert_eq!(display_name("Asha", None, "Rao"), "Asha Rao");
        assert_eq!(display_name("Asha", Some("K"), "Rao"), "Asha K Rao");
        assert_eq!(display_name("Asha", Some(" "), "Rao"), "Asha Rao");
        assert_eq!(truncate_text("Boarding school", 8), "Board...");
        assert_eq!(normalize_email(" Asha@Example.ORG "), "asha@example.org");
    }
}
