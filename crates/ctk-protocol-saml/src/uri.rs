//! URI reference checks shared by decoders and rules.

use url::Url;

/// Returns true if `value` is a non-blank absolute URI reference.
///
/// Both hierarchical URLs (`https://idp.example.com/sso`) and opaque URNs
/// (`urn:oasis:names:tc:SAML:2.0:status:Success`) are absolute.
#[must_use]
pub fn is_absolute_uri(value: &str) -> bool {
    if value.trim().is_empty() || value.chars().any(char::is_whitespace) {
        return false;
    }
    Url::parse(value).is_ok()
}
