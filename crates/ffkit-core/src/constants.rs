//! Package-level constants.

use std::time::Duration;

/// Current version of the bridge (sourced from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name reported in startup logs.
pub const LIBRARY_NAME: &str = "ffkit";

/// Default wait applied to "all logs"/"all statistics" queries when the
/// caller does not supply a positive timeout.
pub const DEFAULT_TIMEOUT_FOR_ASYNCHRONOUS_MESSAGES_IN_TRANSMIT: Duration =
    Duration::from_millis(5000);

/// Default number of sessions kept in the toolkit history.
pub const DEFAULT_SESSION_HISTORY_SIZE: usize = 10;

/// Default number of asynchronous executions that run at once.
pub const DEFAULT_ASYNC_CONCURRENCY_LIMIT: usize = 10;

/// Session history sizes must stay strictly below this value.
pub const SESSION_HISTORY_HARD_LIMIT: usize = 1000;

/// Resolve a caller-supplied wait timeout.
///
/// Only strictly positive values are honoured; anything else falls back to
/// [`DEFAULT_TIMEOUT_FOR_ASYNCHRONOUS_MESSAGES_IN_TRANSMIT`].
pub fn effective_wait_timeout(requested_ms: Option<i64>) -> Duration {
    match requested_ms {
        Some(ms) if ms > 0 => Duration::from_millis(ms.unsigned_abs()),
        _ => DEFAULT_TIMEOUT_FOR_ASYNCHRONOUS_MESSAGES_IN_TRANSMIT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_semver() {
        let parts: Vec<&str> = VERSION.split('.').collect();
        assert_eq!(parts.len(), 3, "VERSION must be semver (MAJOR.MINOR.PATCH)");
        for part in parts {
            let _: u32 = part.parse().expect("each semver segment must be a number");
        }
    }

    #[test]
    fn positive_timeout_is_honoured() {
        assert_eq!(effective_wait_timeout(Some(250)), Duration::from_millis(250));
    }

    #[test]
    fn zero_and_negative_timeouts_fall_back() {
        assert_eq!(
            effective_wait_timeout(Some(0)),
            DEFAULT_TIMEOUT_FOR_ASYNCHRONOUS_MESSAGES_IN_TRANSMIT
        );
        assert_eq!(
            effective_wait_timeout(Some(-10)),
            DEFAULT_TIMEOUT_FOR_ASYNCHRONOUS_MESSAGES_IN_TRANSMIT
        );
        assert_eq!(
            effective_wait_timeout(None),
            DEFAULT_TIMEOUT_FOR_ASYNCHRONOUS_MESSAGES_IN_TRANSMIT
        );
    }

    #[test]
    fn history_default_is_below_hard_limit() {
        assert!(DEFAULT_SESSION_HISTORY_SIZE < SESSION_HISTORY_HARD_LIMIT);
    }
}
