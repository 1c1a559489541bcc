//! SAML bindings implementation.
//!
//! A captured IdP response enters as a [`RawResponse`] and leaves as a
//! [`CanonicalMessage`], or as a terminal [`DecodeError`]:
//!
//! - **HTTP-POST Binding** - the payload form control is plain base64
//! - **HTTP-Redirect Binding** - the payload query parameter is URL-encoded,
//!   base64-encoded raw DEFLATE, optionally signed over the query string
//!
//! # Usage
//!
//! ```rust,ignore
//! use ctk_protocol_saml::bindings::{Decoder, RawFields, RawResponse};
//! use ctk_protocol_saml::Binding;
//!
//! let raw = RawResponse::new(Binding::Redirect, 302, RawFields::from_query(query), true);
//! let message = Decoder::new()
//!     .with_signature_check(&verifier, &certificate)
//!     .decode(raw)?;
//! ```

mod post;
mod redirect;

pub use post::{decode_post, encode_post};
pub use redirect::{
    check_encoding, decode_redirect, deflate_raw, encode_redirect, signed_query, RedirectPayload,
};

use ctk_compliance::Violation;
use tracing::{debug, warn};

use crate::constants::{params, Binding};
use crate::error::{DecodeError, DecodeErrorKind, DecodeResult};
use crate::signature::{SignatureCheck, SignatureVerifier};
use crate::xml::{self, Document};

/// Which payload field carried the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// `SAMLRequest`, e.g. an IdP initiated logout request.
    Request,
    /// `SAMLResponse`.
    Response,
}

impl MessageKind {
    /// Returns the form parameter name for this message type.
    #[must_use]
    pub const fn form_param(&self) -> &'static str {
        match self {
            Self::Request => params::SAML_REQUEST,
            Self::Response => params::SAML_RESPONSE,
        }
    }
}

/// Ordered `(name, value)` pairs exactly as received.
///
/// Redirect values are still percent-encoded; POST values are the form
/// control values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFields(Vec<(String, String)>);

impl RawFields {
    /// Creates an empty field list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Splits a query string into fields without decoding anything.
    ///
    /// A leading `?` is ignored, as are empty segments. A segment without
    /// `=` becomes a field with an empty value.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        query
            .trim_start_matches('?')
            .split('&')
            .filter(|segment| !segment.is_empty())
            .map(|segment| match segment.split_once('=') {
                Some((name, value)) => (name.to_string(), value.to_string()),
                None => (segment.to_string(), String::new()),
            })
            .collect()
    }

    /// Appends a field.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// Builder form of [`RawFields::push`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    /// First value of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if `name` is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Fields in received order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no field was received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for RawFields {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A captured IdP response before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// Binding the response arrived on.
    pub binding: Binding,
    /// HTTP status of the captured response.
    pub http_status: u16,
    /// Payload and companion fields.
    pub fields: RawFields,
    /// Whether the test sent a RelayState with its request.
    pub relay_state_given: bool,
}

impl RawResponse {
    /// Creates a raw response.
    #[must_use]
    pub const fn new(
        binding: Binding,
        http_status: u16,
        fields: RawFields,
        relay_state_given: bool,
    ) -> Self {
        Self {
            binding,
            http_status,
            fields,
            relay_state_given,
        }
    }

    /// The payload field and the kind of message it carries.
    ///
    /// `SAMLResponse` wins when both are present.
    #[must_use]
    pub fn payload(&self) -> Option<(MessageKind, &str)> {
        self.fields
            .get(params::SAML_RESPONSE)
            .map(|v| (MessageKind::Response, v))
            .or_else(|| {
                self.fields
                    .get(params::SAML_REQUEST)
                    .map(|v| (MessageKind::Request, v))
            })
    }
}

/// A successfully decoded captured response.
///
/// Only [`Decoder::decode`] constructs one, so holding a `CanonicalMessage`
/// means decoding succeeded.
#[derive(Debug, Clone)]
pub struct CanonicalMessage {
    raw: RawResponse,
    kind: MessageKind,
    xml: String,
    document: Document,
    findings: Vec<Violation>,
}

impl CanonicalMessage {
    /// Binding the response arrived on.
    #[must_use]
    pub const fn binding(&self) -> Binding {
        self.raw.binding
    }

    /// HTTP status of the captured response.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.raw.http_status
    }

    /// Fields exactly as received.
    #[must_use]
    pub const fn raw_fields(&self) -> &RawFields {
        &self.raw.fields
    }

    /// Whether the test sent a RelayState with its request.
    #[must_use]
    pub const fn relay_state_given(&self) -> bool {
        self.raw.relay_state_given
    }

    /// Which payload field carried the message.
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Decoded XML text.
    #[must_use]
    pub fn xml(&self) -> &str {
        &self.xml
    }

    /// Parsed document.
    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// Non-terminal violations found while decoding.
    #[must_use]
    pub fn findings(&self) -> &[Violation] {
        &self.findings
    }

    /// Returns true if the redirect query carried a `Signature` parameter.
    #[must_use]
    pub fn has_query_signature(&self) -> bool {
        self.raw.binding == Binding::Redirect && self.raw.fields.contains(params::SIGNATURE)
    }
}

/// Turns raw responses into canonical messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct Decoder<'a> {
    signature: Option<SignatureCheck<'a>>,
}

impl<'a> Decoder<'a> {
    /// A decoder that skips redirect signature verification.
    #[must_use]
    pub const fn new() -> Self {
        Self { signature: None }
    }

    /// Verifies redirect query signatures with `verifier` against `key`.
    #[must_use]
    pub fn with_signature_check(mut self, verifier: &'a dyn SignatureVerifier, key: &'a [u8]) -> Self {
        self.signature = Some(SignatureCheck { verifier, key });
        self
    }

    /// Decodes `raw`.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] when no document could be produced. Problems
    /// that still allow a document, such as a bad redirect signature, are
    /// returned as [`CanonicalMessage::findings`] instead.
    pub fn decode(&self, raw: RawResponse) -> DecodeResult<CanonicalMessage> {
        let binding = raw.binding;
        let result = self.decode_inner(raw);
        if let Err(err) = &result {
            warn!(%binding, kind = %err.kind(), detail = err.detail(), "decode failed");
        }
        result
    }

    fn decode_inner(&self, raw: RawResponse) -> DecodeResult<CanonicalMessage> {
        let binding = raw.binding;
        if binding == Binding::Redirect {
            redirect::check_encoding(&raw.fields)?;
        }
        let (kind, payload) = raw.payload().ok_or_else(|| {
            DecodeError::new(
                DecodeErrorKind::MissingPayload,
                binding,
                "no SAMLResponse or SAMLRequest field",
            )
        })?;

        let mut findings = Vec::new();
        let bytes = match binding {
            Binding::Post => decode_post(payload)?,
            Binding::Redirect => {
                let decoded = decode_redirect(&raw.fields, payload)?;
                findings.extend(decoded.findings);
                decoded.bytes
            }
        };

        let xml = String::from_utf8(bytes).map_err(|e| {
            DecodeError::new(DecodeErrorKind::MalformedXml, binding, e.to_string())
        })?;
        let document = xml::parse(&xml).map_err(|e| {
            DecodeError::new(DecodeErrorKind::MalformedXml, binding, e.to_string())
        })?;
        debug!(%binding, ?kind, xml = %xml, "decoded SAML message");

        if binding == Binding::Redirect {
            if let Some(finding) = self.check_query_signature(&raw.fields, kind) {
                findings.push(finding);
            }
        }

        Ok(CanonicalMessage {
            raw,
            kind,
            xml,
            document,
            findings,
        })
    }

    fn check_query_signature(&self, fields: &RawFields, kind: MessageKind) -> Option<Violation> {
        if !fields.contains(params::SIG_ALG) && !fields.contains(params::SIGNATURE) {
            return None;
        }
        match self.signature {
            Some(check) => redirect::verify_query_signature(fields, kind, check),
            None => {
                warn!("redirect response is signed but no signing key is configured; skipping");
                None
            }
        }
    }
}

/// Decodes `raw` without signature verification.
///
/// # Errors
///
/// See [`Decoder::decode`].
pub fn decode(raw: RawResponse) -> DecodeResult<CanonicalMessage> {
    Decoder::new().decode(raw)
}
