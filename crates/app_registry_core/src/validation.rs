//! Shared naming rule for app, cluster and namespace identifiers.
//!
//! # Responsibility
//! - Provide one context-free predicate reused by every entity kind that
//!   carries a platform identifier.
//! - Provide the human-readable format description used in error messages.
//!
//! # Invariants
//! - Validation is pure and never panics.
//! - Empty and blank strings are never valid.

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum identifier length, counted in characters.
pub const MAX_CLUSTER_NAMESPACE_LEN: usize = 128;

/// Description of the valid identifier format.
pub const INVALID_CLUSTER_NAMESPACE_MESSAGE: &str =
    "only letters, digits and the symbols - _ . are allowed, with 1 to 128 characters";

static CLUSTER_NAMESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-zA-Z_.-]+$").expect("valid cluster namespace regex"));

/// Returns whether `candidate` satisfies the shared identifier naming rule.
pub fn is_valid_cluster_namespace(candidate: &str) -> bool {
    // ASCII-only class, so byte length equals char count on a match.
    candidate.len() <= MAX_CLUSTER_NAMESPACE_LEN && CLUSTER_NAMESPACE_RE.is_match(candidate)
}

/// Builds the message returned when an identifier fails the naming rule.
pub fn invalid_identifier_message(kind: &str, value: &str) -> String {
    format!("invalid {kind} `{value}`: {INVALID_CLUSTER_NAMESPACE_MESSAGE}")
}

#[cfg(test)]
mod tests {
    use super::{
        invalid_identifier_message, is_valid_cluster_namespace, INVALID_CLUSTER_NAMESPACE_MESSAGE,
        MAX_CLUSTER_NAMESPACE_LEN,
    };

    #[test]
    fn accepts_allowed_characters() {
        for value in ["ordertest", "Order-Test_1.0", "a", "0", "...", "__-__", "SampleApp"] {
            assert!(is_valid_cluster_namespace(value), "{value} should be valid");
        }
    }

    #[test]
    fn rejects_characters_outside_the_class() {
        for value in [
            "order test",
            "order/test",
            "order:test",
            "ordér",
            "app\n",
            "app#1",
            "应用",
            "a+b",
        ] {
            assert!(!is_valid_cluster_namespace(value), "{value:?} should be invalid");
        }
    }

    #[test]
    fn rejects_empty_and_blank() {
        assert!(!is_valid_cluster_namespace(""));
        assert!(!is_valid_cluster_namespace("   "));
        assert!(!is_valid_cluster_namespace("\t"));
    }

    #[test]
    fn enforces_length_bound() {
        let at_limit = "a".repeat(MAX_CLUSTER_NAMESPACE_LEN);
        let over_limit = "a".repeat(MAX_CLUSTER_NAMESPACE_LEN + 1);
        assert!(is_valid_cluster_namespace(&at_limit));
        assert!(!is_valid_cluster_namespace(&over_limit));
    }

    #[test]
    fn message_names_value_and_format() {
        let message = invalid_identifier_message("app id", "bad id");
        assert!(message.contains("bad id"));
        assert!(message.contains(INVALID_CLUSTER_NAMESPACE_MESSAGE));
    }
}
