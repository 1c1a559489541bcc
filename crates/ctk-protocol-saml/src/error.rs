//! SAML decoding errors.
//!
//! Three families live here: [`DecodeError`] for a payload that could not be
//! turned into a document, [`XmlError`] for the document model parser and
//! [`SignatureError`] for failures of the signature verification contract.

use std::fmt;

use ctk_compliance::{SpecCode, Violation};
use thiserror::Error;

use crate::constants::Binding;

/// Result type for decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Result type for XML parsing.
pub type XmlResult<T> = Result<T, XmlError>;

/// Result type for signature verification.
pub type SignatureResult<T> = Result<T, SignatureError>;

/// What went wrong while decoding a bound payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeErrorKind {
    /// Neither `SAMLResponse` nor `SAMLRequest` was present.
    MissingPayload,
    /// The payload is not valid base64.
    Malformed,
    /// Valid base64, but not a complete raw DEFLATE stream.
    InflateFailed,
    /// The payload consists of nothing but whitespace.
    WhitespaceDetected,
    /// `SAMLEncoding` names an encoding other than DEFLATE.
    UnsupportedEncoding,
    /// The decoded bytes are not well-formed UTF-8 XML.
    MalformedXml,
}

impl DecodeErrorKind {
    /// Clauses a failure of this kind breaches on `binding`.
    #[must_use]
    pub fn spec_codes(self, binding: Binding) -> Vec<SpecCode> {
        match (self, binding) {
            (Self::MissingPayload, Binding::Redirect) => vec![SpecCode::Bindings_3_4_4_b],
            (Self::MissingPayload, Binding::Post) => vec![SpecCode::Bindings_3_5_4_b],
            (Self::Malformed, Binding::Redirect) => vec![SpecCode::Bindings_3_4_4_1_c],
            (Self::Malformed, Binding::Post) => vec![SpecCode::Bindings_3_5_4_a],
            (Self::InflateFailed, _) => {
                vec![SpecCode::Bindings_3_4_4_1_b, SpecCode::Bindings_3_4_4_1_a]
            }
            (Self::WhitespaceDetected, _) => vec![SpecCode::Bindings_3_4_4_1_b],
            (Self::MalformedXml, _) => vec![SpecCode::Schema],
            (Self::UnsupportedEncoding, _) => Vec::new(),
        }
    }
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MissingPayload => "missing payload",
            Self::Malformed => "malformed base64",
            Self::InflateFailed => "inflate failed",
            Self::WhitespaceDetected => "whitespace detected",
            Self::UnsupportedEncoding => "unsupported encoding",
            Self::MalformedXml => "malformed XML",
        };
        f.write_str(name)
    }
}

/// Terminal failure to decode a captured response.
#[derive(Debug, Clone, Error)]
#[error("{binding} decode failed ({kind}): {detail}")]
pub struct DecodeError {
    kind: DecodeErrorKind,
    binding: Binding,
    detail: String,
}

impl DecodeError {
    /// Creates a decode error.
    #[must_use]
    pub fn new(kind: DecodeErrorKind, binding: Binding, detail: impl Into<String>) -> Self {
        Self {
            kind,
            binding,
            detail: detail.into(),
        }
    }

    /// Failure category.
    #[must_use]
    pub const fn kind(&self) -> DecodeErrorKind {
        self.kind
    }

    /// Binding the payload arrived on.
    #[must_use]
    pub const fn binding(&self) -> Binding {
        self.binding
    }

    /// Human readable detail.
    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// Clauses this failure breaches. Empty for environment errors.
    #[must_use]
    pub fn spec_codes(&self) -> Vec<SpecCode> {
        self.kind.spec_codes(self.binding)
    }

    /// Returns true if the failure lies with the test environment rather
    /// than with the identity provider.
    #[must_use]
    pub const fn is_environment_error(&self) -> bool {
        matches!(self.kind, DecodeErrorKind::UnsupportedEncoding)
    }

    /// Converts the failure into a recordable violation.
    ///
    /// Returns `None` for environment errors, which are never recorded.
    #[must_use]
    pub fn to_violation(&self) -> Option<Violation> {
        let mut codes = self.spec_codes().into_iter();
        let first = codes.next()?;
        let violation = codes.fold(Violation::new(first, self.message()), Violation::also);
        Some(violation.with_cause(self.clone()))
    }

    fn message(&self) -> String {
        let payload = match self.binding {
            Binding::Redirect => "redirect",
            Binding::Post => "POST",
        };
        match self.kind {
            DecodeErrorKind::MissingPayload => {
                format!("No SAMLResponse or SAMLRequest found in the {payload} response.")
            }
            DecodeErrorKind::Malformed => {
                format!("Could not base64 decode the {payload} SAML message.")
            }
            DecodeErrorKind::InflateFailed => "Could not inflate the SAML message.".to_string(),
            DecodeErrorKind::WhitespaceDetected => {
                "There were linefeeds or whitespace in the SAML message.".to_string()
            }
            DecodeErrorKind::MalformedXml => {
                "The decoded SAML message is not well-formed XML.".to_string()
            }
            DecodeErrorKind::UnsupportedEncoding => {
                "Only the DEFLATE SAMLEncoding is supported.".to_string()
            }
        }
    }
}

/// XML document model errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XmlError {
    /// The underlying reader rejected the input.
    #[error("XML parsing error: {0}")]
    Parse(String),

    /// An element or attribute used an undeclared namespace prefix.
    #[error("undeclared namespace prefix: {0}")]
    UnknownPrefix(String),

    /// Start and end tags do not balance.
    #[error("unbalanced element: {0}")]
    Unbalanced(String),

    /// More than one root element, or text outside the root.
    #[error("content outside the root element: {0}")]
    OutsideRoot(String),

    /// The input holds no element at all.
    #[error("document has no root element")]
    Empty,
}

impl From<quick_xml::Error> for XmlError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for XmlError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<std::str::Utf8Error> for XmlError {
    fn from(err: std::str::Utf8Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Failures of the signature verification contract.
///
/// A signature that simply does not verify is `Ok(false)`, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// The algorithm URI is not one the verifier knows.
    #[error("unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The key material could not be used.
    #[error("invalid key material: {0}")]
    InvalidKey(String),

    /// The signature value could not be decoded.
    #[error("invalid signature encoding: {0}")]
    Encoding(String),
}

impl From<base64::DecodeError> for SignatureError {
    fn from(err: base64::DecodeError) -> Self {
        Self::Encoding(err.to_string())
    }
}
