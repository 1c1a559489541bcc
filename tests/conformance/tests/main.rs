//! SAML IdP Conformance Scenarios
//!
//! End-to-end tests that feed captured IdP exchanges through the responder,
//! the binding decoder and every rule group, then inspect the report.
//!
//! ## Scenarios
//!
//! - Web Browser SSO over the POST binding
//! - Web Browser SSO over the Redirect binding
//! - Single Logout
//! - Report aggregation under concurrent tests
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p saml-conformance-tests
//! cargo test -p saml-conformance-tests sso_redirect
//! ```

mod harness;
mod logout;
mod report;
mod sso_post;
mod sso_redirect;
