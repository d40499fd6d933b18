//! Error classification by message content.
//!
//! Categories are checked in a fixed order and the first match wins, so a
//! "database connection timeout" is a network error.

use std::fmt;

use serde::Serialize;

/// Broad failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Network,
    Database,
    Permission,
    Validation,
    Unknown,
}

impl ErrorCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Database => "database",
            Self::Permission => "permission",
            Self::Validation => "validation",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        })
    }
}

/// Result of [`categorize_error`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorClassification {
    pub category: ErrorCategory,
    pub is_retryable: bool,
    pub severity: Severity,
    /// The original message, unmodified.
    pub message: String,
}

impl ErrorClassification {
    /// Message suitable for showing to an end user.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self.category {
            ErrorCategory::Network => {
                "Connection problem. Check your internet connection and try again."
            }
            ErrorCategory::Database => {
                "We could not reach our data service. Please try again in a moment."
            }
            ErrorCategory::Permission => "You do not have permission to perform this action.",
            ErrorCategory::Validation => "Some of the information provided is invalid.",
            ErrorCategory::Unknown => "Something went wrong. Please try again.",
        }
    }
}

struct Rule {
    category: ErrorCategory,
    is_retryable: bool,
    severity: Severity,
    needles: &'static [&'static str],
}

const RULES: &[Rule] = &[
    Rule {
        category: ErrorCategory::Network,
        is_retryable: true,
        severity: Severity::Medium,
        needles: &[
            "network",
            "fetch",
            "timeout",
            "timed out",
            "connection",
            "econnreset",
            "econnrefused",
            "socket",
            "offline",
        ],
    },
    Rule {
        category: ErrorCategory::Database,
        is_retryable: true,
        severity: Severity::High,
        needles: &[
            "database",
            "sql",
            "query",
            "relation",
            "constraint",
            "duplicate key",
            "postgres",
        ],
    },
    Rule {
        category: ErrorCategory::Permission,
        is_retryable: false,
        severity: Severity::High,
        needles: &[
            "permission",
            "unauthorized",
            "forbidden",
            "denied",
            "not allowed",
            "jwt",
            "401",
            "403",
        ],
    },
    Rule {
        category: ErrorCategory::Validation,
        is_retryable: false,
        severity: Severity::Low,
        needles: &["validation", "invalid", "required", "must be", "malformed"],
    },
];

/// Classify an error by case-insensitive substring match on its message.
pub fn categorize_error(error: impl fmt::Display) -> ErrorClassification {
    let message = error.to_string();
    let lowered = message.to_lowercase();

    let matched = RULES
        .iter()
        .find(|rule| rule.needles.iter().any(|needle| lowered.contains(needle)));

    match matched {
        Some(rule) => ErrorClassification {
            category: rule.category,
            is_retryable: rule.is_retryable,
            severity: rule.severity,
            message,
        },
        None => ErrorClassification {
            category: ErrorCategory::Unknown,
            is_retryable: false,
            severity: Severity::Medium,
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_timeout_is_retryable_network() {
        let result = categorize_error("fetch failed: timeout");
        assert_eq!(result.category, ErrorCategory::Network);
        assert!(result.is_retryable);
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(
            categorize_error("ECONNRESET").category,
            ErrorCategory::Network
        );
        assert_eq!(
            categorize_error("Permission Denied").category,
            ErrorCategory::Permission
        );
    }

    #[test]
    fn network_wins_over_database() {
        let result = categorize_error("database connection lost");
        assert_eq!(result.category, ErrorCategory::Network);
    }

    #[test]
    fn database_errors() {
        let result = categorize_error("duplicate key value violates unique constraint");
        assert_eq!(result.category, ErrorCategory::Database);
        assert!(result.is_retryable);
        assert_eq!(result.severity, Severity::High);
    }

    #[test]
    fn permission_errors_are_not_retryable() {
        let result = categorize_error("403 Forbidden");
        assert_eq!(result.category, ErrorCategory::Permission);
        assert!(!result.is_retryable);
    }

    #[test]
    fn validation_errors_are_low_severity() {
        let result = categorize_error("field email is required");
        assert_eq!(result.category, ErrorCategory::Validation);
        assert_eq!(result.severity, Severity::Low);
    }

    #[test]
    fn unmatched_is_unknown() {
        let result = categorize_error("kaboom");
        assert_eq!(result.category, ErrorCategory::Unknown);
        assert!(!result.is_retryable);
        assert_eq!(result.message, "kaboom");
    }

    #[test]
    fn works_with_error_types() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "socket closed");
        assert_eq!(categorize_error(&io).category, ErrorCategory::Network);
    }

    #[test]
    fn user_messages_differ_per_category() {
        let network = categorize_error("network down").user_message();
        let unknown = categorize_error("???").user_message();
        assert_ne!(network, unknown);
    }
}
