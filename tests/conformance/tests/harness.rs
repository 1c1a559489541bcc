//! Test harness for SAML conformance scenarios.
//!
//! Builds captured IdP exchanges the way a browser would have seen them and
//! runs them through the generic responder and the verification engine.

use std::sync::Arc;

use ctk_compliance::{Report, SpecCode, Violation};
use ctk_protocol_saml::bindings::{encode_post, encode_redirect};
use ctk_protocol_saml::{Binding, MessageKind};
use ctk_spi::{HttpCapture, IdpMetadata, IdpResponder, ResponderRegistry};
use ctk_verification::{RequestContext, VerificationEngine};

/// Entity ID of the IdP under test.
pub const IDP: &str = "https://idp.example.com/metadata";
/// Entity ID of the test service provider.
pub const SP: &str = "https://sp.example.com";
/// Assertion consumer service of the test service provider.
pub const ACS: &str = "https://sp.example.com/acs";
/// ID of the request the IdP answers.
pub const REQUEST_ID: &str = "_request";
/// RelayState sent with requests that carry one.
pub const RELAY_STATE: &str = "relay+State";

/// Runs captures against an isolated report.
pub struct TestHarness {
    /// Report the scenario records into.
    pub report: Report,
    /// Metadata of the IdP under test.
    pub metadata: IdpMetadata,
    responder: Arc<dyn IdpResponder>,
}

impl TestHarness {
    /// Harness for an IdP with SSO endpoints on both bindings.
    pub fn new() -> anyhow::Result<Self> {
        Self::with_metadata(
            IdpMetadata::new(IDP)
                .with_sso(Binding::Post, "https://idp.example.com/sso/post")
                .with_sso(Binding::Redirect, "https://idp.example.com/sso/redirect"),
        )
    }

    /// Harness for an IdP described by `metadata`.
    pub fn with_metadata(metadata: IdpMetadata) -> anyhow::Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("ctk_verification=debug,ctk_spi=debug")
            .with_test_writer()
            .try_init();

        let responder = ResponderRegistry::with_builtin().resolve(None)?;
        Ok(Self {
            report: Report::new(),
            metadata,
            responder,
        })
    }

    /// Runs one test: extracts, decodes and verifies `capture`.
    pub fn run(
        &self,
        binding: Binding,
        capture: &HttpCapture,
        ctx: &RequestContext,
    ) -> anyhow::Result<Vec<Violation>> {
        self.report.reset_current_test();
        let raw = self
            .responder
            .extract(binding, capture, ctx.relay_state_given)?;
        let mut engine = VerificationEngine::new(&self.report, &self.metadata);
        Ok(engine.run(raw, ctx)?)
    }
}

/// Request context for a request sent without RelayState.
pub fn request() -> RequestContext {
    RequestContext::new(REQUEST_ID, ACS).with_sp_entity_id(SP)
}

/// Request context for a request that carried [`RELAY_STATE`].
pub fn request_with_relay_state() -> RequestContext {
    request()
        .with_expected_relay_state(RELAY_STATE)
        .with_relay_state()
}

/// Every code of `violations`, in order.
pub fn codes(violations: &[Violation]) -> Vec<SpecCode> {
    violations
        .iter()
        .flat_map(|v| v.codes().iter().copied())
        .collect()
}

/// Auto-submitting form an IdP returns on the POST binding.
pub fn post_capture(xml: &str, kind: MessageKind, relay_state: Option<&str>) -> HttpCapture {
    let mut inputs = format!(
        r#"<input type="hidden" name="{}" value="{}"/>"#,
        kind.form_param(),
        encode_post(xml)
    );
    if let Some(relay_state) = relay_state {
        inputs.push_str(&format!(
            r#"<input type="hidden" name="RelayState" value="{}"/>"#,
            quick_xml::escape::escape(relay_state)
        ));
    }
    HttpCapture {
        status: 200,
        location: None,
        body: Some(format!(
            r#"<html><body onload="document.forms[0].submit()"><form method="post" action="{ACS}">{inputs}<input type="submit" value="Continue"/></form></body></html>"#
        )),
    }
}

/// Redirect an IdP returns on the Redirect binding.
///
/// `extra` is appended verbatim to the query, e.g. `&SigAlg=...`.
pub fn redirect_capture(
    xml: &str,
    kind: MessageKind,
    relay_state: Option<&str>,
    extra: &str,
) -> anyhow::Result<HttpCapture> {
    let query = encode_redirect(xml, kind, relay_state)?;
    Ok(HttpCapture {
        status: 302,
        location: Some(format!("{ACS}?{query}{extra}")),
        body: None,
    })
}

/// Query parameters of a (not actually verified) query string signature.
pub fn query_signature() -> String {
    format!(
        "&SigAlg={}&Signature={}",
        urlencoding::encode("http://www.w3.org/2001/04/xmldsig-more#rsa-sha256"),
        urlencoding::encode("c2lnbmF0dXJl")
    )
}

/// Enveloped signature referencing the element with ID `id`.
pub fn signature(id: &str) -> String {
    format!(
        r##"<ds:Signature xmlns:ds="http://www.w3.org/2000/09/xmldsig#"><ds:SignedInfo><ds:Reference URI="#{id}"/></ds:SignedInfo></ds:Signature>"##
    )
}

/// Assertion with ID `id` and the given children after its Issuer.
pub fn assertion(id: &str, body: &str) -> String {
    format!(
        r#"<saml:Assertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="{id}" Version="2.0" IssueInstant="2024-05-01T10:00:00Z"><saml:Issuer>{IDP}</saml:Issuer>{body}</saml:Assertion>"#
    )
}

/// Signed bearer assertion with an audience restriction and an
/// authentication statement.
pub fn signed_assertion(id: &str) -> String {
    let subject = format!(
        r#"<saml:Subject><saml:NameID Format="urn:oasis:names:tc:SAML:2.0:nameid-format:transient">_t1</saml:NameID><saml:SubjectConfirmation Method="urn:oasis:names:tc:SAML:2.0:cm:bearer"><saml:SubjectConfirmationData Recipient="{ACS}" NotOnOrAfter="2024-05-01T10:05:00Z" InResponseTo="{REQUEST_ID}"/></saml:SubjectConfirmation></saml:Subject>"#
    );
    let conditions = format!(
        r#"<saml:Conditions NotBefore="2024-05-01T09:59:00Z" NotOnOrAfter="2024-05-01T10:05:00Z"><saml:AudienceRestriction><saml:Audience>{SP}</saml:Audience></saml:AudienceRestriction></saml:Conditions>"#
    );
    let statement = r#"<saml:AuthnStatement AuthnInstant="2024-05-01T10:00:00Z" SessionIndex="_s1"><saml:AuthnContext><saml:AuthnContextClassRef>urn:oasis:names:tc:SAML:2.0:ac:classes:Password</saml:AuthnContextClassRef></saml:AuthnContext></saml:AuthnStatement>"#;
    assertion(id, &format!("{}{subject}{conditions}{statement}", signature(id)))
}

/// Successful `<Response>` answering [`REQUEST_ID`].
pub fn response(attrs: &str, body: &str) -> String {
    format!(
        r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="_response" Version="2.0" IssueInstant="2024-05-01T10:00:00Z" InResponseTo="{REQUEST_ID}"{attrs}><saml:Issuer>{IDP}</saml:Issuer><samlp:Status><samlp:StatusCode Value="urn:oasis:names:tc:SAML:2.0:status:Success"/></samlp:Status>{body}</samlp:Response>"#
    )
}

/// Compliant response carrying one signed assertion.
pub fn signed_response() -> String {
    response(
        &format!(r#" Destination="{ACS}""#),
        &signed_assertion("_assertion"),
    )
}

/// IdP initiated `<LogoutRequest>`.
pub fn logout_request(attrs: &str, body: &str) -> String {
    format!(
        r#"<samlp:LogoutRequest xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="_logout" Version="2.0" IssueInstant="2024-05-01T10:00:00Z"{attrs}><saml:Issuer>{IDP}</saml:Issuer>{body}</samlp:LogoutRequest>"#
    )
}

/// `<LogoutResponse>` answering [`REQUEST_ID`].
pub fn logout_response(attrs: &str, body: &str) -> String {
    format!(
        r#"<samlp:LogoutResponse xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="_logout" Version="2.0" IssueInstant="2024-05-01T10:00:00Z" InResponseTo="{REQUEST_ID}"{attrs}><saml:Issuer>{IDP}</saml:Issuer>{body}<samlp:Status><samlp:StatusCode Value="urn:oasis:names:tc:SAML:2.0:status:Success"/></samlp:Status></samlp:LogoutResponse>"#
    )
}
