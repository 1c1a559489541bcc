//! HTTP-POST Binding implementation.
//!
//! The payload form control holds the base64 encoding of the XML message.
//! Nothing else is applied, so the value must decode as-is.

use base64::Engine;

use crate::constants::Binding;
use crate::error::{DecodeError, DecodeErrorKind, DecodeResult};

/// Decodes the value of a POST payload form control.
///
/// # Errors
///
/// `MissingPayload` for an empty value, `Malformed` if the value is not
/// standard base64. Embedded line breaks are not tolerated.
pub fn decode_post(payload: &str) -> DecodeResult<Vec<u8>> {
    if payload.is_empty() {
        return Err(DecodeError::new(
            DecodeErrorKind::MissingPayload,
            Binding::Post,
            "payload form control is empty",
        ));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| DecodeError::new(DecodeErrorKind::Malformed, Binding::Post, e.to_string()))
}

/// Encodes `xml` as a POST payload form control value.
#[must_use]
pub fn encode_post(xml: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(xml)
}
