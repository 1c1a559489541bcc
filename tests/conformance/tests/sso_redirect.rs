//! Web Browser SSO and HTTP Redirect binding rules.
//!
//! Reference: SAML Bindings 3.4, SAML Profiles 4.1.2.

use ctk_compliance::{Section, SectionStatus, SpecCode};
use ctk_protocol_saml::{Binding, MessageKind};

use crate::harness::{
    codes, logout_request, query_signature, redirect_capture, request,
    request_with_relay_state, signature, signed_response, TestHarness, ACS, RELAY_STATE,
};

fn section(name: &str) -> Section {
    Section::parse(name).unwrap()
}

fn signed_logout_request() -> String {
    logout_request(
        &format!(r#" Destination="{ACS}""#),
        "<saml:NameID>_t1</saml:NameID>",
    )
}

/// sso-redirect-1: a <Response> may not travel on the Redirect binding.
#[test]
fn response_on_redirect_fails_profile() -> anyhow::Result<()> {
    let harness = TestHarness::new()?;
    let capture = redirect_capture(&signed_response(), MessageKind::Response, None, "")?;

    let violations = harness.run(Binding::Redirect, &capture, &request())?;
    assert!(codes(&violations).contains(&SpecCode::Profiles_4_1_2_a));
    assert_eq!(harness.report.status(&section("Profiles.4.1")), SectionStatus::Failed);
    Ok(())
}

/// sso-redirect-2: RelayState may not exceed 80 bytes.
#[test]
fn long_relay_state_fails_binding() -> anyhow::Result<()> {
    let harness = TestHarness::new()?;
    let relay_state = "r".repeat(81);
    let capture = redirect_capture(
        &signed_logout_request(),
        MessageKind::Request,
        Some(&relay_state),
        &query_signature(),
    )?;

    let violations = harness.run(Binding::Redirect, &capture, &request())?;
    assert_eq!(codes(&violations), [SpecCode::Bindings_3_4_3_a]);
    let recorded = harness
        .report
        .violation_for(&section("Bindings.3.4"))
        .expect("violation stored under Bindings.3.4");
    assert!(recorded.message().contains("81 bytes"));
    assert_eq!(harness.report.status(&section("Bindings.3.4")), SectionStatus::Failed);
    assert_eq!(harness.report.status(&section("Bindings.3.5")), SectionStatus::Skipped);
    Ok(())
}

/// sso-redirect-2b: the RelayState limit holds even when the redirect
/// itself is wrong.
#[test]
fn long_relay_state_is_reported_alongside_bad_status() -> anyhow::Result<()> {
    let harness = TestHarness::new()?;
    let relay_state = "r".repeat(81);
    let mut capture = redirect_capture(
        &signed_logout_request(),
        MessageKind::Request,
        Some(&relay_state),
        &query_signature(),
    )?;
    capture.status = 200;

    let violations = harness.run(Binding::Redirect, &capture, &request())?;
    assert_eq!(
        codes(&violations),
        [SpecCode::Bindings_3_4_6_a, SpecCode::Bindings_3_4_3_a]
    );
    assert_eq!(harness.report.current_test_violations().len(), 2);
    Ok(())
}

/// sso-redirect-3: a signed request with the RelayState echoed back passes.
#[test]
fn compliant_signed_request_passes() -> anyhow::Result<()> {
    let harness = TestHarness::new()?;
    let capture = redirect_capture(
        &signed_logout_request(),
        MessageKind::Request,
        Some(RELAY_STATE),
        &query_signature(),
    )?;

    let violations = harness.run(Binding::Redirect, &capture, &request_with_relay_state())?;
    assert!(violations.is_empty(), "{violations:?}");
    assert_eq!(harness.report.section_count(), 0);
    Ok(())
}

/// sso-redirect-4: RelayState must be URL encoded in the query.
#[test]
fn unencoded_relay_state_fails_deflate_encoding() -> anyhow::Result<()> {
    let harness = TestHarness::new()?;
    let extra = format!("&RelayState={RELAY_STATE}{}", query_signature());
    let capture =
        redirect_capture(&signed_logout_request(), MessageKind::Request, None, &extra)?;

    let violations = harness.run(Binding::Redirect, &capture, &request_with_relay_state())?;
    assert_eq!(codes(&violations), [SpecCode::Bindings_3_4_4_1_d]);
    Ok(())
}

/// sso-redirect-5: the redirect itself must be a 302 or 303.
#[test]
fn non_redirect_status_fails_binding() -> anyhow::Result<()> {
    let harness = TestHarness::new()?;
    let mut capture = redirect_capture(
        &signed_logout_request(),
        MessageKind::Request,
        None,
        &query_signature(),
    )?;
    capture.status = 200;

    let violations = harness.run(Binding::Redirect, &capture, &request())?;
    assert_eq!(codes(&violations), [SpecCode::Bindings_3_4_6_a]);
    Ok(())
}

/// sso-redirect-6: signatures travel in the query, not in the message.
#[test]
fn enveloped_signature_fails_binding() -> anyhow::Result<()> {
    let harness = TestHarness::new()?;
    let xml = logout_request(
        &format!(r#" Destination="{ACS}""#),
        &format!("{}<saml:NameID>_t1</saml:NameID>", signature("_logout")),
    );
    let capture = redirect_capture(&xml, MessageKind::Request, None, "")?;

    let violations = harness.run(Binding::Redirect, &capture, &request())?;
    assert!(codes(&violations).contains(&SpecCode::Bindings_3_4_4_1_a));
    Ok(())
}

/// sso-redirect-7: an encoding the toolkit cannot decode is not the IdP's
/// fault and records nothing.
#[test]
fn unsupported_encoding_is_an_environment_error() -> anyhow::Result<()> {
    let harness = TestHarness::new()?;
    let capture = redirect_capture(
        &signed_logout_request(),
        MessageKind::Request,
        None,
        "&SAMLEncoding=urn%3Aexample%3Agzip",
    )?;

    let err = harness
        .run(Binding::Redirect, &capture, &request())
        .expect_err("unsupported encoding must abort the test");
    assert!(matches!(
        err.downcast_ref::<ctk_core::Error>(),
        Some(ctk_core::Error::UnsupportedEncoding(encoding)) if encoding == "urn:example:gzip"
    ));
    assert_eq!(harness.report.section_count(), 0);
    assert!(!harness.report.test_has_violations());
    Ok(())
}
