//! # ctk-compliance
//!
//! Everything the conformance toolkit knows about *what* a failure is and
//! where it is recorded:
//!
//! - [`SpecCode`] - one normative clause of the SAML 2.0 documents, with a
//!   compiled-in human description
//! - [`Section`] - the hierarchical key violations are aggregated under
//! - [`Violation`] - a single detected rule failure
//! - [`Report`] - the process-wide aggregate, first violation per section wins
//!
//! # SAML Specifications
//!
//! - [SAML 2.0 Core](https://docs.oasis-open.org/security/saml/v2.0/saml-core-2.0-os.pdf)
//! - [SAML 2.0 Bindings](https://docs.oasis-open.org/security/saml/v2.0/saml-bindings-2.0-os.pdf)
//! - [SAML 2.0 Profiles](https://docs.oasis-open.org/security/saml/v2.0/saml-profiles-2.0-os.pdf)

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

mod messages;
pub mod report;
pub mod section;
pub mod spec_code;
pub mod violation;

pub use report::{ExportOptions, Report, ReportSnapshot, SectionStatus};
pub use section::{Document, Section};
pub use spec_code::SpecCode;
pub use violation::Violation;
