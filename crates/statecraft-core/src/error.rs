#![forbid(unsafe_code)]

//! Configuration errors and failure-message normalization.

use std::fmt::Display;
use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Rejected configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("retry base delay must be greater than zero")]
    ZeroBaseDelay,

    #[error("retry max delay ({max_delay:?}) is shorter than the base delay ({base_delay:?})")]
    MaxDelayBelowBase {
        base_delay: Duration,
        max_delay: Duration,
    },

    #[error("debounce window must be greater than zero")]
    ZeroDebounce,
}

/// Generic wrapper prefixes that add nothing to a failure description.
const WRAPPER_PREFIXES: &[&str] = &["Exception:", "Error:", "error:"];

/// Message used when a failure renders as empty text.
pub const UNKNOWN_FAILURE: &str = "unknown error";

/// Plain-text description of a producer failure.
///
/// Takes the `Display` text, trims it and strips a single generic wrapper
/// prefix such as `"Error:"`.
#[must_use]
pub fn describe_failure<E: Display + ?Sized>(err: &E) -> String {
    let text = err.to_string();
    let trimmed = text.trim();
    let stripped = WRAPPER_PREFIXES
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .map_or(trimmed, str::trim_start);
    if stripped.is_empty() {
        UNKNOWN_FAILURE.to_string()
    } else {
        stripped.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_message_is_kept() {
        assert_eq!(describe_failure("boom"), "boom");
    }

    #[test]
    fn wrapper_prefix_is_stripped_once() {
        assert_eq!(describe_failure("Exception: boom"), "boom");
        assert_eq!(describe_failure("Error: Error: nested"), "Error: nested");
        assert_eq!(describe_failure("error: lower"), "lower");
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(describe_failure("  Error:   spaced \n"), "spaced");
    }

    #[test]
    fn empty_text_becomes_unknown() {
        assert_eq!(describe_failure(""), UNKNOWN_FAILURE);
        assert_eq!(describe_failure("Exception: "), UNKNOWN_FAILURE);
    }

    #[test]
    fn io_errors_render_their_description() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing file");
        assert_eq!(describe_failure(&err), "missing file");
    }

    #[test]
    fn config_error_messages() {
        assert_eq!(
            ConfigError::ZeroBaseDelay.to_string(),
            "retry base delay must be greater than zero"
        );
        let err = ConfigError::MaxDelayBelowBase {
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(5),
        };
        assert!(err.to_string().contains("10ms"));
    }
}
