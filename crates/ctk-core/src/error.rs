//! Environment errors.
//!
//! Anything in here means the toolkit could not evaluate a response at all.
//! Rule failures by the IdP under test are reported through compliance
//! violations instead.

use thiserror::Error;

/// Result type alias using the toolkit environment error.
pub type Result<T> = std::result::Result<T, Error>;

/// Environment error: fatal to the current test, never a spec violation.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded or is incomplete.
    #[error("configuration error: {0}")]
    Config(String),

    /// IdP metadata is missing or unusable.
    #[error("IdP metadata error: {0}")]
    Metadata(String),

    /// The captured message declares an encoding the toolkit does not support.
    #[error("unsupported message encoding: {0}")]
    UnsupportedEncoding(String),

    /// No IdP responder is registered under the configured name.
    #[error("unknown IdP responder: {0}")]
    UnknownResponder(String),

    /// A captured exchange could not be read or interpreted.
    #[error("capture error: {0}")]
    Capture(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns whether the error stems from the toolkit's own setup rather
    /// than from the captured exchange.
    #[must_use]
    pub const fn is_setup_error(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::Metadata(_) | Self::UnknownResponder(_) | Self::Io(_)
        )
    }
}
