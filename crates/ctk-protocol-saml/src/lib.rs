//! SAML 2.0 wire handling for the conformance toolkit.
//!
//! This crate turns what an identity provider put on the wire into a
//! document the rule checkers can inspect:
//!
//! - **Binding decoding** - HTTP-Redirect (URL-encoded, base64, raw DEFLATE)
//!   and HTTP-POST (base64) payloads, with terminal [`DecodeError`]s
//! - **Redirect signatures** - the signed query octets and the
//!   [`SignatureVerifier`] contract the decoder delegates to
//! - **XML document model** - a namespace-aware tree built with `quick-xml`
//!
//! # Architecture
//!
//! - [`constants`] - namespace, binding and format URIs
//! - [`bindings`] - raw responses, canonical messages and the decoder
//! - [`signature`] - signature algorithms and verifiers
//! - [`xml`] - document model
//! - [`error`] - error types
//!
//! # SAML Specifications
//!
//! - [SAML 2.0 Core](https://docs.oasis-open.org/security/saml/v2.0/saml-core-2.0-os.pdf)
//! - [SAML 2.0 Bindings](https://docs.oasis-open.org/security/saml/v2.0/saml-bindings-2.0-os.pdf)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bindings;
pub mod constants;
pub mod error;
pub mod signature;
pub mod uri;
pub mod xml;

pub use bindings::{
    decode, CanonicalMessage, Decoder, MessageKind, RawFields, RawResponse,
};
pub use constants::{Binding, NameIdFormat};
pub use error::{DecodeError, DecodeErrorKind, SignatureError, XmlError};
pub use signature::{SignatureAlgorithm, SignatureVerifier, X509SignatureVerifier};
pub use xml::{Document, Element};
