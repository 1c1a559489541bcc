//! The verification engine.
//!
//! Drives one captured response through decoding and every rule group:
//!
//! ```text
//! Pending -> Decoding -> Checking(0) -> ... -> Checking(n) -> Done
//!                \__ decode failure ___________________________/
//! ```
//!
//! A decode failure is terminal. A violation thrown inside a group only
//! ends that group; the engine always moves on to the next one.

use std::fmt;

use ctk_compliance::{Report, Violation};
use ctk_core::{Error, Result};
use ctk_protocol_saml::error::DecodeResult;
use ctk_protocol_saml::{Binding, CanonicalMessage, Decoder, RawResponse, SignatureVerifier};
use ctk_spi::IdpMetadataProvider;
use tracing::{debug, info};

use crate::context::RequestContext;
use crate::rules::{self, CheckContext};

/// Where the engine is in handling a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    /// Nothing handled yet.
    #[default]
    Pending,
    /// Turning the raw response into a canonical message.
    Decoding,
    /// Running the rule group at this index.
    Checking(usize),
    /// Finished, with or without violations.
    Done,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Decoding => f.write_str("decoding"),
            Self::Checking(group) => write!(f, "checking({group})"),
            Self::Done => f.write_str("done"),
        }
    }
}

/// Decodes captured responses and checks them, recording every violation
/// in a [`Report`].
pub struct VerificationEngine<'a> {
    report: &'a Report,
    metadata: &'a dyn IdpMetadataProvider,
    verifier: Option<&'a dyn SignatureVerifier>,
    lenient: bool,
    state: EngineState,
}

impl<'a> VerificationEngine<'a> {
    /// Creates an engine recording into `report` for the IdP described by
    /// `metadata`.
    #[must_use]
    pub fn new(report: &'a Report, metadata: &'a dyn IdpMetadataProvider) -> Self {
        Self {
            report,
            metadata,
            verifier: None,
            lenient: false,
            state: EngineState::Pending,
        }
    }

    /// Verifies redirect query signatures with `verifier`, using the
    /// metadata signing certificate as key.
    #[must_use]
    pub fn with_signature_verifier(mut self, verifier: &'a dyn SignatureVerifier) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Skips responses with an HTTP error status (400-599) in [`run`](Self::run).
    #[must_use]
    pub const fn lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> EngineState {
        self.state
    }

    fn transition(&mut self, next: EngineState) {
        debug!(from = %self.state, to = %next, "engine state");
        self.state = next;
    }

    /// Decodes `raw`.
    ///
    /// Redirect query signatures are verified when both a verifier and a
    /// metadata signing certificate are available. A failure leaves the
    /// engine in [`EngineState::Done`].
    ///
    /// # Errors
    ///
    /// Returns the decoder's [`DecodeError`](ctk_protocol_saml::DecodeError)
    /// when no document could be produced.
    pub fn decode(&mut self, raw: RawResponse) -> DecodeResult<CanonicalMessage> {
        self.transition(EngineState::Decoding);
        let decoder = match (self.verifier, self.metadata.signing_certificate()) {
            (Some(verifier), Some(key)) => Decoder::new().with_signature_check(verifier, key),
            _ => Decoder::new(),
        };
        let result = decoder.decode(raw);
        if result.is_err() {
            self.transition(EngineState::Done);
        }
        result
    }

    /// Runs every rule group against `message` and records the results.
    ///
    /// Findings made while decoding are recorded first. Returns every
    /// violation emitted, in recording order.
    pub fn verify(&mut self, message: &CanonicalMessage, ctx: &RequestContext) -> Vec<Violation> {
        let mut emitted: Vec<Violation> = Vec::new();
        for finding in message.findings() {
            emitted.push(self.emit(finding.clone()));
        }

        let check = CheckContext::new(message, ctx, self.metadata);
        for (index, group) in rules::groups(message.binding()).iter().enumerate() {
            self.transition(EngineState::Checking(index));
            for section in &group.sections {
                self.report.start(section.clone());
            }
            let violations = group.run(&check);
            debug!(group = group.name, count = violations.len(), "group finished");
            for violation in violations {
                emitted.push(self.emit(violation));
            }
        }

        self.transition(EngineState::Done);
        emitted
    }

    /// Decodes `raw` and verifies the result.
    ///
    /// A decode failure is recorded as a single violation and no group runs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedEncoding`] when the redirect payload uses
    /// an encoding the decoder cannot handle. Nothing is recorded then.
    pub fn run(&mut self, raw: RawResponse, ctx: &RequestContext) -> Result<Vec<Violation>> {
        if self.lenient && (400..600).contains(&raw.http_status) {
            info!(status = raw.http_status, "lenient mode, skipping error response");
            self.transition(EngineState::Done);
            return Ok(Vec::new());
        }

        let binding = raw.binding;
        match self.decode(raw) {
            Ok(message) => Ok(self.verify(&message, ctx)),
            Err(err) if err.is_environment_error() => {
                Err(Error::UnsupportedEncoding(err.detail().to_string()))
            }
            Err(err) => {
                self.start_binding(binding);
                Ok(err
                    .to_violation()
                    .map(|violation| self.emit(violation))
                    .into_iter()
                    .collect())
            }
        }
    }

    fn start_binding(&self, binding: Binding) {
        for section in rules::binding::group(binding).sections {
            self.report.start(section);
        }
    }

    fn emit(&self, violation: Violation) -> Violation {
        self.report.record(violation.clone());
        violation
    }
}

impl fmt::Debug for VerificationEngine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationEngine")
            .field("idp", &self.metadata.entity_id())
            .field("verifies_signatures", &self.verifier.is_some())
            .field("lenient", &self.lenient)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use ctk_compliance::{Section, SectionStatus, SpecCode};
    use ctk_protocol_saml::bindings::{encode_post, encode_redirect, MessageKind};
    use ctk_protocol_saml::error::SignatureResult;
    use ctk_protocol_saml::RawFields;

    use super::*;
    use crate::rules::test_support::*;

    struct RejectingVerifier;

    impl SignatureVerifier for RejectingVerifier {
        fn verify(&self, _: &[u8], _: &str, _: &[u8], _: &[u8]) -> SignatureResult<bool> {
            Ok(false)
        }
    }

    fn section(name: &str) -> Section {
        Section::parse(name).unwrap()
    }

    fn post_raw(xml: &str, status: u16) -> RawResponse {
        RawResponse::new(
            Binding::Post,
            status,
            RawFields::new().with("SAMLResponse", encode_post(xml)),
            false,
        )
    }

    fn redirect_raw(xml: &str, extra: &str) -> RawResponse {
        let mut query = encode_redirect(xml, MessageKind::Response, None).unwrap();
        query.push_str(extra);
        RawResponse::new(Binding::Redirect, 302, RawFields::from_query(&query), false)
    }

    fn signed_response() -> String {
        let signature = r##"<ds:Signature xmlns:ds="http://www.w3.org/2000/09/xmldsig#"><ds:SignedInfo><ds:Reference URI="#_assertion"/></ds:SignedInfo></ds:Signature>"##;
        response(
            &format!(r#" Destination="{ACS}""#),
            &assertion(
                "_assertion",
                &format!("{signature}{}{}{}", bearer_subject(), audience(), authn_statement()),
            ),
        )
    }

    #[test]
    fn compliant_post_records_nothing() {
        let report = Report::new();
        let metadata = metadata();
        let mut engine = VerificationEngine::new(&report, &metadata);
        assert_eq!(engine.state(), EngineState::Pending);

        let violations = engine.run(post_raw(&signed_response(), 200), &request()).unwrap();
        assert!(violations.is_empty(), "{violations:?}");
        assert_eq!(engine.state(), EngineState::Done);
        assert_eq!(report.section_count(), 0);
        assert_eq!(report.status(&section("Profiles.4.1")), SectionStatus::Successful);
        assert_eq!(report.status(&section("Bindings.3.5")), SectionStatus::Successful);
        assert_eq!(report.status(&section("Bindings.3.4")), SectionStatus::Skipped);
    }

    #[test]
    fn response_without_assertion_fails_sso_profile() {
        let report = Report::new();
        let metadata = metadata();
        let mut engine = VerificationEngine::new(&report, &metadata);

        engine.run(post_raw(&response("", ""), 200), &request()).unwrap();
        let recorded = report.violation_for(&section("Profiles.4.1")).unwrap();
        assert!(recorded.has_code(SpecCode::Profiles_4_1_4_2_b));
        assert!(!report.section_messages(&section("Profiles.4.1")).is_empty());
    }

    #[test]
    fn long_redirect_relay_state_fails_redirect_binding() {
        let report = Report::new();
        let metadata = metadata();
        let mut engine = VerificationEngine::new(&report, &metadata);
        let relay_state = format!("&RelayState={}", "r".repeat(81));

        engine
            .run(redirect_raw(&signed_response(), &relay_state), &request())
            .unwrap();
        let recorded = report.violation_for(&section("Bindings.3.4")).unwrap();
        assert!(recorded.has_code(SpecCode::Bindings_3_4_3_a));
    }

    #[test]
    fn in_response_to_mismatch_fails_status_response() {
        let report = Report::new();
        let metadata = metadata();
        let mut engine = VerificationEngine::new(&report, &metadata);
        let ctx = RequestContext::new("_another_request", ACS).with_sp_entity_id(SP);

        let violations = engine.run(post_raw(&signed_response(), 200), &ctx).unwrap();
        assert!(violations.iter().any(|v| v.has_code(SpecCode::Core_3_2_2_b)));
        let recorded = report.violation_for(&section("Core.3.2")).unwrap();
        assert!(recorded.has_code(SpecCode::Core_3_2_2_b));
        assert!(report.test_has_violations());
    }

    #[test]
    fn decode_failure_records_binding_violation_only() {
        let report = Report::new();
        let metadata = metadata();
        let mut engine = VerificationEngine::new(&report, &metadata);
        let raw = RawResponse::new(
            Binding::Post,
            200,
            RawFields::new().with("SAMLResponse", "not*base64"),
            false,
        );

        let violations = engine.run(raw, &request()).unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].codes(), [SpecCode::Bindings_3_5_4_a]);
        assert_eq!(report.section_count(), 1);
        assert_eq!(engine.state(), EngineState::Done);
        assert_eq!(report.status(&section("Core")), SectionStatus::Skipped);
    }

    #[test]
    fn unsupported_encoding_is_an_environment_error() {
        let report = Report::new();
        let metadata = metadata();
        let mut engine = VerificationEngine::new(&report, &metadata);
        let raw = redirect_raw(&signed_response(), "&SAMLEncoding=urn%3Aexample%3Agzip");

        let err = engine.run(raw, &request()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedEncoding(ref e) if e == "urn:example:gzip"));
        assert_eq!(report.section_count(), 0);
        assert!(!report.test_has_violations());
    }

    #[test]
    fn lenient_mode_skips_error_statuses() {
        let report = Report::new();
        let metadata = metadata();

        let mut lenient = VerificationEngine::new(&report, &metadata).lenient(true);
        assert!(lenient.run(post_raw(&signed_response(), 500), &request()).unwrap().is_empty());
        assert_eq!(report.section_count(), 0);

        let mut strict = VerificationEngine::new(&report, &metadata);
        let violations = strict.run(post_raw(&signed_response(), 500), &request()).unwrap();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].has_code(SpecCode::Bindings_3_5_6_a));
    }

    #[test]
    fn decoder_findings_are_recorded_first() {
        let report = Report::new();
        let metadata = metadata().with_signing_certificate(vec![1, 2, 3]);
        let verifier = RejectingVerifier;
        let mut engine =
            VerificationEngine::new(&report, &metadata).with_signature_verifier(&verifier);
        let raw = redirect_raw(
            &good_response(),
            "&SigAlg=http%3A%2F%2Fwww.w3.org%2F2001%2F04%2Fxmldsig-more%23rsa-sha256&Signature=Ym9ndXM%3D",
        );

        let violations = engine.run(raw, &request()).unwrap();
        assert_eq!(
            violations[0].codes(),
            [SpecCode::General_a, SpecCode::Bindings_3_4_4_1_f]
        );
        assert!(violations.len() > 1);
    }

    #[test]
    fn signature_check_is_skipped_without_a_certificate() {
        let report = Report::new();
        let metadata = metadata();
        let verifier = RejectingVerifier;
        let mut engine =
            VerificationEngine::new(&report, &metadata).with_signature_verifier(&verifier);
        let raw = redirect_raw(
            &good_response(),
            "&SigAlg=http%3A%2F%2Fwww.w3.org%2F2001%2F04%2Fxmldsig-more%23rsa-sha256&Signature=Ym9ndXM%3D",
        );

        let violations = engine.run(raw, &request()).unwrap();
        assert!(!violations.iter().any(|v| v.has_code(SpecCode::General_a)));
    }
}
