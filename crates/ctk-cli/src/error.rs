//! CLI error types.

use std::path::PathBuf;

use thiserror::Error;

/// CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// The toolkit could not set up or evaluate a test.
    #[error(transparent)]
    Environment(#[from] ctk_core::Error),

    /// A capture file is not valid capture JSON.
    #[error("invalid capture {path}: {source}")]
    Capture {
        /// File that failed to parse.
        path: PathBuf,
        /// Parse failure.
        source: serde_json::Error,
    },

    /// At least one test recorded violations or could not run.
    #[error("{failed} of {total} tests failed")]
    TestsFailed {
        /// Tests that failed or errored.
        failed: usize,
        /// Tests run.
        total: usize,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ctk_spi::SpiError> for CliError {
    fn from(err: ctk_spi::SpiError) -> Self {
        Self::Environment(err.into())
    }
}

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spi_errors_become_environment_errors() {
        let err = CliError::from(ctk_spi::SpiError::ResponderNotFound("acme".into()));
        assert!(matches!(
            err,
            CliError::Environment(ctk_core::Error::UnknownResponder(ref name)) if name == "acme"
        ));
        assert_eq!(err.to_string(), "unknown IdP responder: acme");
    }

    #[test]
    fn failed_tests_summary() {
        let err = CliError::TestsFailed { failed: 2, total: 5 };
        assert_eq!(err.to_string(), "2 of 5 tests failed");
    }
}
