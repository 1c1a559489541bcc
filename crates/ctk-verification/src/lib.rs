//! # ctk-verification
//!
//! Checks a decoded IdP response against the SAML 2.0 rules and records
//! every failure in a [`Report`](ctk_compliance::Report).
//!
//! ## Design
//!
//! - [`rules`] - groups of pure checkers; a checker either reports an
//!   independent failure and carries on, or returns the failure, which
//!   skips the rest of its group
//! - [`VerificationEngine`] - decodes a captured response and runs the
//!   groups in a fixed order: core, protocol, profile, binding
//! - [`RequestContext`] - what the test sent to the IdP
//!
//! ## Example
//!
//! ```ignore
//! use ctk_compliance::Report;
//! use ctk_verification::{RequestContext, VerificationEngine};
//!
//! let report = Report::new();
//! let mut engine = VerificationEngine::new(&report, &metadata);
//! let ctx = RequestContext::new(request_id, "https://sp.example.com/acs");
//! let violations = engine.run(raw_response, &ctx)?;
//! ```

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod context;
pub mod engine;
pub mod rules;

pub use context::RequestContext;
pub use engine::{EngineState, VerificationEngine};
pub use rules::{CheckContext, Findings, Rule, RuleGroup};
