//! HTTP-Redirect Binding implementation.
//!
//! The payload query parameter is raw DEFLATE, base64 encoded, then URL
//! encoded. A signed redirect carries `SigAlg` and `Signature` parameters
//! whose signature covers the raw query string, not the XML.

use std::io::Write;

use base64::Engine;
use ctk_compliance::{SpecCode, Violation};
use flate2::write::DeflateEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};

use super::{MessageKind, RawFields};
use crate::constants::{params, Binding, DEFLATE_ENCODING};
use crate::error::{DecodeError, DecodeErrorKind, DecodeResult, SignatureError};
use crate::signature::{SignatureAlgorithm, SignatureCheck};
use crate::uri::is_absolute_uri;

const INFLATE_CHUNK: usize = 4096;

/// Inflated redirect payload plus the non-terminal problems met on the way.
#[derive(Debug)]
pub struct RedirectPayload {
    /// Inflated message bytes.
    pub bytes: Vec<u8>,
    /// Non-terminal findings, e.g. stray whitespace in the payload.
    pub findings: Vec<Violation>,
}

/// Rejects a `SAMLEncoding` this toolkit cannot decode.
///
/// A value that is not an absolute URI is left for the binding rules.
///
/// # Errors
///
/// `UnsupportedEncoding` if `SAMLEncoding` names an encoding other than DEFLATE.
pub fn check_encoding(fields: &RawFields) -> DecodeResult<()> {
    let Some(encoding) = fields.get(params::SAML_ENCODING) else {
        return Ok(());
    };
    let encoding = percent_decode(encoding)?;
    if encoding != DEFLATE_ENCODING && is_absolute_uri(&encoding) {
        return Err(DecodeError::new(
            DecodeErrorKind::UnsupportedEncoding,
            Binding::Redirect,
            encoding,
        ));
    }
    Ok(())
}

/// Decodes the redirect payload `payload` found in `fields`.
///
/// # Errors
///
/// - `UnsupportedEncoding` if `SAMLEncoding` names another encoding URI
/// - `WhitespaceDetected` if the payload is nothing but whitespace
/// - `Malformed` if percent or base64 decoding fails
/// - `InflateFailed` if the bytes are not a complete raw DEFLATE stream
pub fn decode_redirect(fields: &RawFields, payload: &str) -> DecodeResult<RedirectPayload> {
    check_encoding(fields)?;

    let decoded = percent_decode(payload)?;
    if decoded.trim().is_empty() {
        return Err(DecodeError::new(
            DecodeErrorKind::WhitespaceDetected,
            Binding::Redirect,
            "payload is blank",
        ));
    }

    let mut findings = Vec::new();
    let compact: String = if decoded.chars().any(char::is_whitespace) {
        findings.push(Violation::new(
            SpecCode::Bindings_3_4_4_1_b,
            "There were linefeeds or whitespace in the SAML message.",
        ));
        decoded.chars().filter(|c| !c.is_whitespace()).collect()
    } else {
        decoded
    };

    let deflated = base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| DecodeError::new(DecodeErrorKind::Malformed, Binding::Redirect, e.to_string()))?;

    let bytes = inflate_raw(&deflated)
        .map_err(|e| DecodeError::new(DecodeErrorKind::InflateFailed, Binding::Redirect, e))?;

    Ok(RedirectPayload { bytes, findings })
}

fn percent_decode(value: &str) -> DecodeResult<String> {
    urlencoding::decode(value)
        .map(|v| v.into_owned())
        .map_err(|e| DecodeError::new(DecodeErrorKind::Malformed, Binding::Redirect, e.to_string()))
}

/// Inflates a raw DEFLATE stream, with no zlib or gzip header.
///
/// The stream must reach its final block; a truncated stream is an error
/// even if some output was produced.
fn inflate_raw(data: &[u8]) -> Result<Vec<u8>, String> {
    let mut inflater = Decompress::new(false);
    let mut out = Vec::with_capacity(data.len().saturating_mul(4).max(INFLATE_CHUNK));

    loop {
        if out.len() == out.capacity() {
            out.reserve(INFLATE_CHUNK);
        }
        let before_in = inflater.total_in();
        let before_out = inflater.total_out();
        let start = usize::try_from(before_in).map_or(data.len(), |n| n.min(data.len()));

        let status = inflater
            .decompress_vec(&data[start..], &mut out, FlushDecompress::None)
            .map_err(|e| e.to_string())?;
        if status == Status::StreamEnd {
            return Ok(out);
        }

        let progressed = inflater.total_in() != before_in || inflater.total_out() != before_out;
        if !progressed && out.len() < out.capacity() {
            return Err("raw DEFLATE stream is truncated".to_string());
        }
    }
}

/// Compresses `data` with raw DEFLATE.
///
/// # Errors
///
/// Propagates encoder I/O errors.
pub fn deflate_raw(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Builds a redirect query string (without `?`) carrying `xml`.
///
/// # Errors
///
/// Propagates encoder I/O errors.
pub fn encode_redirect(
    xml: &str,
    kind: MessageKind,
    relay_state: Option<&str>,
) -> std::io::Result<String> {
    let compressed = deflate_raw(xml.as_bytes())?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(&compressed);

    let mut query = format!("{}={}", kind.form_param(), urlencoding::encode(&encoded));
    if let Some(rs) = relay_state {
        query.push_str(&format!("&{}={}", params::RELAY_STATE, urlencoding::encode(rs)));
    }
    Ok(query)
}

/// The octets a redirect signature covers:
/// `SAMLResponse=<raw>[&RelayState=<raw>]&SigAlg=<raw>`.
///
/// Values are taken exactly as received. Returns `None` without a `SigAlg`.
#[must_use]
pub fn signed_query(fields: &RawFields, kind: MessageKind) -> Option<String> {
    let payload = fields.get(kind.form_param())?;
    let sig_alg = fields.get(params::SIG_ALG)?;

    let mut query = format!("{}={payload}", kind.form_param());
    if let Some(relay_state) = fields.get(params::RELAY_STATE) {
        query.push_str(&format!("&{}={relay_state}", params::RELAY_STATE));
    }
    query.push_str(&format!("&{}={sig_alg}", params::SIG_ALG));
    Some(query)
}

/// Checks the query-string signature. Returns the finding, if any.
pub(super) fn verify_query_signature(
    fields: &RawFields,
    kind: MessageKind,
    check: SignatureCheck<'_>,
) -> Option<Violation> {
    let Some(raw_alg) = fields.get(params::SIG_ALG) else {
        return Some(Violation::new(
            SpecCode::Bindings_3_4_4_1_e,
            "Signature Algorithm not found.",
        ));
    };
    let algorithm = match urlencoding::decode(raw_alg) {
        Ok(alg) if is_absolute_uri(&alg) && SignatureAlgorithm::from_uri(&alg).is_some() => {
            alg.into_owned()
        }
        _ => {
            return Some(Violation::new(
                SpecCode::Bindings_3_4_4_1_e,
                format!("The Signature algorithm named {raw_alg} is unknown."),
            ));
        }
    };

    let Some(raw_signature) = fields.get(params::SIGNATURE) else {
        return Some(Violation::new(SpecCode::Bindings_3_4_4_1_g, "Signature not found."));
    };
    let signature = match urlencoding::decode(raw_signature) {
        Ok(sig) if sig.chars().any(char::is_whitespace) => {
            return Some(Violation::new(
                SpecCode::Bindings_3_4_4_1_g,
                "Whitespace was found in the Signature.",
            ));
        }
        Ok(sig) => sig,
        Err(e) => {
            return Some(
                Violation::new(SpecCode::Bindings_3_4_4_1_g, "Signature could not be URL decoded.")
                    .with_cause(e),
            );
        }
    };
    let signature = match base64::engine::general_purpose::STANDARD.decode(signature.as_bytes()) {
        Ok(bytes) => bytes,
        Err(e) => {
            return Some(
                Violation::new(SpecCode::Bindings_3_4_4_1_g, "Signature is not base64 encoded.")
                    .with_cause(SignatureError::from(e)),
            );
        }
    };

    let signed = signed_query(fields, kind)?;
    match check
        .verifier
        .verify(signed.as_bytes(), &algorithm, &signature, check.key)
    {
        Ok(true) => None,
        Ok(false) => Some(
            Violation::new(SpecCode::General_a, "Invalid signature.")
                .also(SpecCode::Bindings_3_4_4_1_f),
        ),
        Err(err @ SignatureError::InvalidKey(_)) => Some(
            Violation::new(SpecCode::Bindings_3_1_2_1_a, "The certificate was invalid.")
                .with_cause(err),
        ),
        Err(err @ SignatureError::UnsupportedAlgorithm(_)) => Some(
            Violation::new(
                SpecCode::Bindings_3_4_4_1_e,
                format!("The Signature algorithm named {raw_alg} is unknown."),
            )
            .with_cause(err),
        ),
        Err(err @ SignatureError::Encoding(_)) => Some(
            Violation::new(SpecCode::Bindings_3_4_4_1_g, "Invalid signature value.")
                .with_cause(err),
        ),
    }
}
