use thiserror::Error;

/// Errors that can occur when configuring or driving a benchmark [`Suite`][crate::Suite].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The suite was configured in a way that cannot be measured, or a configuration change
    /// was attempted while the suite was running.
    #[error("invalid suite configuration: {problem}")]
    Configuration {
        /// A human-readable description of the problem.
        problem: String,
    },

    /// A workload function, a setup or teardown hook or an event handler panicked while the
    /// suite was starting or executing a scheduled step. The suite has moved to the failed
    /// state.
    #[error("'{subject}' panicked: {message}")]
    Panicked {
        /// What the suite was working on when the panic occurred: the name of the workload
        /// being measured, `calibration` during calibration, or `suite` when starting or
        /// completing the suite.
        subject: String,

        /// The panic message, if the payload was a string.
        message: String,
    },

    /// A step was requested from a suite that is not running.
    #[error("the suite is not running; call start() before stepping it")]
    NotRunning,
}

/// A specialized `Result` type for suite operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Debug);

    #[test]
    fn configuration_error_mentions_problem() {
        let error = Error::Configuration {
            problem: "interval must be positive".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "invalid suite configuration: interval must be positive"
        );
    }

    #[test]
    fn panic_mentions_subject_and_message() {
        let error = Error::Panicked {
            subject: "Test 2".to_string(),
            message: "boom".to_string(),
        };

        let text = error.to_string();
        assert!(text.contains("Test 2"));
        assert!(text.contains("boom"));
    }
}
