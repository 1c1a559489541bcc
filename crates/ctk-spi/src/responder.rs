//! Per-IdP responders.
//!
//! IdPs differ in how they hand a SAML message back to the browser: some
//! redirect straight to the ACS, some render an auto-submitting form, some
//! wrap the form in their own page. An [`IdpResponder`] knows one IdP's
//! habits and extracts the protocol fields from a captured HTTP exchange.

use ctk_protocol_saml::{Binding, RawFields, RawResponse};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SpiResult;

/// A captured HTTP response from the IdP.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpCapture {
    /// HTTP status code.
    pub status: u16,
    /// `Location` header, for redirects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Response body, for POST forms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Turns a captured exchange into a raw response.
pub trait IdpResponder: Send + Sync {
    /// Name the responder is selected by.
    fn name(&self) -> &'static str;

    /// Extracts the protocol fields of `capture`.
    ///
    /// Missing fields are not an error here: an empty field list decodes to
    /// a missing-payload violation, which is the finding the IdP deserves.
    ///
    /// # Errors
    ///
    /// Returns an error only if the capture cannot be interpreted at all.
    fn extract(
        &self,
        binding: Binding,
        capture: &HttpCapture,
        relay_state_given: bool,
    ) -> SpiResult<RawResponse>;
}

/// Responder for IdPs that follow the bindings literally.
///
/// - Redirect: the query of the `Location` header, split without decoding
/// - POST: the `<input name=… value=…>` controls of the response form
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericResponder;

impl GenericResponder {
    /// Registry name.
    pub const NAME: &'static str = "generic";
}

impl IdpResponder for GenericResponder {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn extract(
        &self,
        binding: Binding,
        capture: &HttpCapture,
        relay_state_given: bool,
    ) -> SpiResult<RawResponse> {
        let fields = match binding {
            Binding::Redirect => capture
                .location
                .as_deref()
                .map(location_query)
                .map(RawFields::from_query)
                .unwrap_or_default(),
            Binding::Post => capture
                .body
                .as_deref()
                .map(form_inputs)
                .unwrap_or_default(),
        };
        debug!(%binding, status = capture.status, fields = fields.len(), "extracted raw response");
        Ok(RawResponse::new(binding, capture.status, fields, relay_state_given))
    }
}

/// Query part of a URL, without the fragment.
fn location_query(location: &str) -> &str {
    let without_fragment = location.split_once('#').map_or(location, |(head, _)| head);
    without_fragment
        .split_once('?')
        .map_or("", |(_, query)| query)
}

/// Collects `name`/`value` pairs of every `<input>` element in `html`.
///
/// Values are HTML-unescaped; an entity that cannot be unescaped leaves the
/// value as written.
fn form_inputs(html: &str) -> RawFields {
    let lower = html.to_ascii_lowercase();
    let mut fields = RawFields::new();
    let mut cursor = 0;

    while let Some(offset) = lower[cursor..].find("<input") {
        let start = cursor + offset + "<input".len();
        let end = lower[start..].find('>').map_or(html.len(), |e| start + e);
        let tag = &html[start..end];
        cursor = end;

        let Some(name) = tag_attribute(tag, "name") else {
            continue;
        };
        let raw = tag_attribute(tag, "value").unwrap_or_default();
        let value = match quick_xml::escape::unescape(&raw) {
            Ok(unescaped) => unescaped.into_owned(),
            Err(_) => raw.clone(),
        };
        fields.push(name, value);
    }
    fields
}

/// Value of attribute `name` inside the text of a start tag.
fn tag_attribute(tag: &str, name: &str) -> Option<String> {
    let bytes = tag.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
            i += 1;
        }
        let key_start = i;
        while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'=' {
            i += 1;
        }
        let key = &tag[key_start..i];
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] != b'=' {
            if key.eq_ignore_ascii_case(name) {
                return Some(String::new());
            }
            continue;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let value = match bytes.get(i) {
            Some(&quote @ (b'"' | b'\'')) => {
                let value_start = i + 1;
                let value_end = tag[value_start..]
                    .find(char::from(quote))
                    .map_or(tag.len(), |e| value_start + e);
                i = (value_end + 1).min(bytes.len());
                &tag[value_start..value_end]
            }
            _ => {
                let value_start = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                &tag[value_start..i]
            }
        };
        if key.eq_ignore_ascii_case(name) {
            return Some(value.to_string());
        }
    }
    None
}
