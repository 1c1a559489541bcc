//! Rule checkers.
//!
//! A checker inspects the decoded document together with the request it
//! answers. Failures that do not invalidate later checks are pushed to
//! [`Findings`]; returning `Err` means the remaining checkers of the same
//! [`RuleGroup`] would only restate the problem, so the group stops there.
//!
//! Groups never read each other's results. Each one is a pure function of
//! its [`CheckContext`].

pub mod binding;
mod common;
pub mod core;
pub mod profile;
pub mod protocol;

use std::fmt;

use ctk_compliance::{Document as SpecDocument, Section, Violation};
use ctk_protocol_saml::constants::XMLDSIG_NS;
use ctk_protocol_saml::{Binding, CanonicalMessage, Document, Element};
use ctk_spi::IdpMetadataProvider;
use tracing::debug;

use crate::context::RequestContext;

/// Result of a checker: `Err` skips the rest of its group.
pub type CheckResult = Result<(), Violation>;

/// Signature of every checker.
pub type Check = fn(&CheckContext<'_>, &mut Findings) -> CheckResult;

/// Everything a checker may look at.
#[derive(Clone, Copy)]
pub struct CheckContext<'a> {
    /// Parsed document under test.
    pub document: &'a Document,
    /// Decoded message the document came from.
    pub message: &'a CanonicalMessage,
    /// Request the message answers.
    pub request: &'a RequestContext,
    /// IdP under test.
    pub metadata: &'a dyn IdpMetadataProvider,
}

impl<'a> CheckContext<'a> {
    /// Bundles a message with its request and the IdP metadata.
    #[must_use]
    pub fn new(
        message: &'a CanonicalMessage,
        request: &'a RequestContext,
        metadata: &'a dyn IdpMetadataProvider,
    ) -> Self {
        Self {
            document: message.document(),
            message,
            request,
            metadata,
        }
    }

    /// Document element.
    #[must_use]
    pub const fn root(&self) -> &'a Element {
        self.document.root()
    }

    /// Returns true if the message carries an enveloped XML signature or a
    /// redirect query signature.
    #[must_use]
    pub fn is_signed(&self) -> bool {
        self.root().child(XMLDSIG_NS, "Signature").is_some() || self.message.has_query_signature()
    }

    /// Whether a RelayState was sent with the request.
    #[must_use]
    pub fn relay_state_given(&self) -> bool {
        self.request.relay_state_given || self.message.relay_state_given()
    }
}

impl fmt::Debug for CheckContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckContext")
            .field("root", &self.root().qualified_name())
            .field("binding", &self.message.binding())
            .field("request", self.request)
            .field("idp", &self.metadata.entity_id())
            .finish()
    }
}

/// Non-aborting failures collected while a group runs.
#[derive(Debug, Default)]
pub struct Findings {
    violations: Vec<Violation>,
}

impl Findings {
    /// Creates an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            violations: Vec::new(),
        }
    }

    /// Records a failure and lets the group continue.
    pub fn report(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Number of recorded failures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Recorded failures, in order.
    #[must_use]
    pub fn into_vec(self) -> Vec<Violation> {
        self.violations
    }
}

/// A named checker.
#[derive(Clone, Copy)]
pub struct Rule {
    /// Name used in logs.
    pub name: &'static str,
    /// The checker.
    pub check: Check,
}

impl Rule {
    /// Creates a rule.
    #[must_use]
    pub const fn new(name: &'static str, check: Check) -> Self {
        Self { name, check }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Rule").field(&self.name).finish()
    }
}

/// An ordered list of rules covering a set of sections.
#[derive(Debug, Clone)]
pub struct RuleGroup {
    /// Group name used in logs.
    pub name: &'static str,
    /// Sections exercised whenever the group runs.
    pub sections: Vec<Section>,
    /// Rules in evaluation order.
    pub rules: Vec<Rule>,
}

impl RuleGroup {
    /// Creates a group.
    #[must_use]
    pub fn new(name: &'static str, sections: Vec<Section>, rules: Vec<Rule>) -> Self {
        Self {
            name,
            sections,
            rules,
        }
    }

    /// Runs the rules in order until one returns a violation.
    ///
    /// Reported findings come first, followed by the returned violation.
    #[must_use]
    pub fn run(&self, ctx: &CheckContext<'_>) -> Vec<Violation> {
        let mut findings = Findings::new();
        for rule in &self.rules {
            if let Err(violation) = (rule.check)(ctx, &mut findings) {
                debug!(
                    group = self.name,
                    rule = rule.name,
                    "rule failed, skipping the rest of the group"
                );
                findings.report(violation);
                break;
            }
        }
        findings.into_vec()
    }
}

/// Every group, in the order the engine runs them.
#[must_use]
pub fn groups(binding: Binding) -> Vec<RuleGroup> {
    vec![
        core::group(),
        protocol::group(),
        profile::group(),
        binding::group(binding),
    ]
}

fn sections(document: SpecDocument, paths: &[[u16; 2]]) -> Vec<Section> {
    paths
        .iter()
        .map(|path| Section::new(document, path))
        .collect()
}
