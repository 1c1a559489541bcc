//! SPI error types.

use thiserror::Error;

/// Result type for SPI operations.
pub type SpiResult<T> = Result<T, SpiError>;

/// Error type for SPI operations.
#[derive(Debug, Error)]
pub enum SpiError {
    /// No responder is registered under the name.
    #[error("responder not found: {0}")]
    ResponderNotFound(String),

    /// The captured exchange cannot be turned into a raw response.
    #[error("unusable capture: {0}")]
    Capture(String),

    /// The IdP metadata document is unusable.
    #[error("invalid IdP metadata: {0}")]
    Metadata(String),

    /// Reading a metadata file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<SpiError> for ctk_core::Error {
    fn from(err: SpiError) -> Self {
        match err {
            SpiError::ResponderNotFound(name) => Self::UnknownResponder(name),
            SpiError::Capture(msg) => Self::Capture(msg),
            SpiError::Metadata(msg) => Self::Metadata(msg),
            SpiError::Io(e) => Self::Io(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_to_environment_errors() {
        let err: ctk_core::Error = SpiError::ResponderNotFound("shibboleth".into()).into();
        assert!(matches!(err, ctk_core::Error::UnknownResponder(ref n) if n == "shibboleth"));
        assert!(err.is_setup_error());

        let err: ctk_core::Error = SpiError::Metadata("no entityID".into()).into();
        assert!(matches!(err, ctk_core::Error::Metadata(_)));
    }
}
