//! Web Browser SSO over the HTTP POST binding.
//!
//! Reference: SAML Profiles 4.1, SAML Bindings 3.5.

use ctk_compliance::{Section, SectionStatus, SpecCode};
use ctk_protocol_saml::{Binding, MessageKind};
use ctk_spi::HttpCapture;
use ctk_verification::RequestContext;

use crate::harness::{
    codes, post_capture, request, request_with_relay_state, signature, signed_response,
    TestHarness, ACS, RELAY_STATE, REQUEST_ID, SP,
};

fn section(name: &str) -> Section {
    Section::parse(name).unwrap()
}

/// sso-post-1: a signed response with one compliant assertion passes.
#[test]
fn compliant_response_passes() -> anyhow::Result<()> {
    let harness = TestHarness::new()?;
    let capture = post_capture(&signed_response(), MessageKind::Response, None);

    let violations = harness.run(Binding::Post, &capture, &request())?;
    assert!(violations.is_empty(), "{violations:?}");
    assert!(!harness.report.test_has_violations());
    assert_eq!(harness.report.status(&section("Profiles.4.1")), SectionStatus::Successful);
    assert_eq!(harness.report.status(&section("Bindings.3.5")), SectionStatus::Successful);
    assert_eq!(harness.report.status(&section("Bindings.3.4")), SectionStatus::Skipped);
    Ok(())
}

/// sso-post-2: a successful response must carry an assertion.
#[test]
fn response_without_assertion_fails_profile() -> anyhow::Result<()> {
    let harness = TestHarness::new()?;
    let capture = post_capture("<Response/>", MessageKind::Response, None);

    let violations = harness.run(Binding::Post, &capture, &request())?;
    assert!(codes(&violations).contains(&SpecCode::Profiles_4_1_4_2_b));

    let recorded = harness
        .report
        .violation_for(&section("Profiles.4.1"))
        .expect("violation stored under Profiles.4.1");
    assert!(recorded.has_code(SpecCode::Profiles_4_1_4_2_b));
    assert_eq!(harness.report.status(&section("Profiles.4.1")), SectionStatus::Failed);
    assert!(harness.report.export().contains("No Assertions found."));
    Ok(())
}

/// sso-post-3: InResponseTo must name the request being answered.
#[test]
fn in_response_to_mismatch_fails_core() -> anyhow::Result<()> {
    let harness = TestHarness::new()?;
    let capture = post_capture(&signed_response(), MessageKind::Response, None);
    let ctx = RequestContext::new("_some_other_request", ACS).with_sp_entity_id(SP);

    let violations = harness.run(Binding::Post, &capture, &ctx)?;
    assert!(codes(&violations).contains(&SpecCode::Core_3_2_2_b));
    let recorded = harness
        .report
        .violation_for(&section("Core.3.2"))
        .expect("violation stored under Core.3.2");
    assert!(recorded.message().contains("_some_other_request"));
    assert!(harness.report.test_has_violations());
    Ok(())
}

/// sso-post-3b: a response that drops InResponseTo does not answer the request.
#[test]
fn missing_in_response_to_fails_core() -> anyhow::Result<()> {
    let harness = TestHarness::new()?;
    let xml = signed_response().replacen(&format!(r#" InResponseTo="{REQUEST_ID}""#), "", 1);
    let capture = post_capture(&xml, MessageKind::Response, None);

    let violations = harness.run(Binding::Post, &capture, &request())?;
    assert_eq!(codes(&violations), [SpecCode::Core_3_2_2_b]);
    assert_eq!(harness.report.status(&section("Core.3.2")), SectionStatus::Failed);
    Ok(())
}

/// sso-post-4: POST responses need a signature on the response or on
/// every assertion.
#[test]
fn unsigned_response_fails_post_profile() -> anyhow::Result<()> {
    let harness = TestHarness::new()?;
    let unsigned = signed_response().replace(&signature("_assertion"), "");
    let capture = post_capture(&unsigned, MessageKind::Response, None);

    let violations = harness.run(Binding::Post, &capture, &request())?;
    assert_eq!(codes(&violations), [SpecCode::Profiles_4_1_4_5_a]);
    Ok(())
}

/// sso-post-5: RelayState must come back unchanged.
#[test]
fn relay_state_is_returned() -> anyhow::Result<()> {
    let harness = TestHarness::new()?;

    let missing = post_capture(&signed_response(), MessageKind::Response, None);
    let violations = harness.run(Binding::Post, &missing, &request_with_relay_state())?;
    assert_eq!(codes(&violations), [SpecCode::Bindings_3_5_3_b]);

    let returned = post_capture(&signed_response(), MessageKind::Response, Some(RELAY_STATE));
    let violations = harness.run(Binding::Post, &returned, &request_with_relay_state())?;
    assert!(violations.is_empty(), "{violations:?}");
    Ok(())
}

/// sso-post-6: an error page is not a SAML error response.
#[test]
fn http_error_status_fails_binding() -> anyhow::Result<()> {
    let harness = TestHarness::new()?;
    let mut capture = post_capture(&signed_response(), MessageKind::Response, None);
    capture.status = 500;

    let violations = harness.run(Binding::Post, &capture, &request())?;
    assert!(codes(&violations).contains(&SpecCode::Bindings_3_5_6_a));
    Ok(())
}

/// sso-post-7: an undecodable payload ends the test with one violation.
#[test]
fn malformed_payload_stops_verification() -> anyhow::Result<()> {
    let harness = TestHarness::new()?;
    let capture = HttpCapture {
        status: 200,
        location: None,
        body: Some(r#"<form><input name="SAMLResponse" value="not*base64"/></form>"#.to_string()),
    };

    let violations = harness.run(Binding::Post, &capture, &request())?;
    assert_eq!(codes(&violations), [SpecCode::Bindings_3_5_4_a]);
    assert_eq!(harness.report.section_count(), 1);
    assert_eq!(harness.report.status(&section("Core")), SectionStatus::Skipped);
    Ok(())
}
