//! # ctk-spi
//!
//! Interfaces between the conformance toolkit and the IdP under test.
//!
//! ## Design
//!
//! - [`IdpMetadataProvider`] - what the rules need to know about the IdP,
//!   implemented by [`IdpMetadata`] from a SAML metadata document
//! - [`IdpResponder`] - per-IdP extraction of protocol fields from a
//!   captured HTTP exchange, implemented by [`GenericResponder`]
//! - [`ResponderRegistry`] - compile-time registered responders selected
//!   by configured name

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod error;
pub mod metadata;
pub mod registry;
pub mod responder;

pub use error::{SpiError, SpiResult};
pub use metadata::{IdpMetadata, IdpMetadataProvider};
pub use registry::ResponderRegistry;
pub use responder::{GenericResponder, HttpCapture, IdpResponder};
