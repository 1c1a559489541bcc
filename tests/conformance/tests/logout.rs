//! Single Logout.
//!
//! Reference: SAML Core 3.7, SAML Profiles 4.4.

use ctk_compliance::SpecCode;
use ctk_protocol_saml::{Binding, MessageKind};
use ctk_spi::IdpMetadata;

use crate::harness::{
    codes, logout_request, logout_response, post_capture, request, signature, TestHarness,
    ACS, IDP,
};

fn destination() -> String {
    format!(r#" Destination="{ACS}""#)
}

fn signed_body(body: &str) -> String {
    format!("{}{body}", signature("_logout"))
}

fn slo_harness() -> anyhow::Result<TestHarness> {
    TestHarness::with_metadata(
        IdpMetadata::new(IDP)
            .with_sso(Binding::Post, "https://idp.example.com/sso/post")
            .with_single_logout(Binding::Post, "https://idp.example.com/slo"),
    )
}

/// slo-1: a signed logout request naming the principal passes.
#[test]
fn signed_logout_request_passes() -> anyhow::Result<()> {
    let harness = slo_harness()?;
    let xml = logout_request(&destination(), &signed_body("<saml:NameID>_t1</saml:NameID>"));
    let capture = post_capture(&xml, MessageKind::Request, None);

    let violations = harness.run(Binding::Post, &capture, &request())?;
    assert!(violations.is_empty(), "{violations:?}");
    Ok(())
}

/// slo-2: logout requests must be signed.
#[test]
fn unsigned_logout_request_fails_profile() -> anyhow::Result<()> {
    let harness = slo_harness()?;
    let xml = logout_request(&destination(), "<saml:NameID>_t1</saml:NameID>");
    let capture = post_capture(&xml, MessageKind::Request, None);

    let violations = harness.run(Binding::Post, &capture, &request())?;
    assert_eq!(codes(&violations), [SpecCode::Profiles_4_4_4_1_b]);
    Ok(())
}

/// slo-3: the logout reason is a URI.
#[test]
fn logout_reason_must_be_a_uri() -> anyhow::Result<()> {
    let harness = slo_harness()?;
    let attrs = format!(r#"{} Reason="user left""#, destination());
    let xml = logout_request(&attrs, &signed_body("<saml:NameID>_t1</saml:NameID>"));
    let capture = post_capture(&xml, MessageKind::Request, None);

    let violations = harness.run(Binding::Post, &capture, &request())?;
    assert!(codes(&violations).contains(&SpecCode::Core_3_7_1_a));
    Ok(())
}

/// slo-4: the principal must be identified.
#[test]
fn logout_request_needs_an_identifier() -> anyhow::Result<()> {
    let harness = slo_harness()?;
    let xml = logout_request(&destination(), &signed_body(""));
    let capture = post_capture(&xml, MessageKind::Request, None);

    let violations = harness.run(Binding::Post, &capture, &request())?;
    assert!(codes(&violations).contains(&SpecCode::Core_3_7_1_b));
    Ok(())
}

/// slo-5: logout responses must be signed.
#[test]
fn unsigned_logout_response_fails_profile() -> anyhow::Result<()> {
    let harness = slo_harness()?;
    let unsigned = logout_response(&destination(), "");
    let capture = post_capture(&unsigned, MessageKind::Response, None);
    let violations = harness.run(Binding::Post, &capture, &request())?;
    assert!(codes(&violations).contains(&SpecCode::Profiles_4_4_4_2_b));

    let signed = logout_response(&destination(), &signature("_logout"));
    let capture = post_capture(&signed, MessageKind::Response, None);
    let violations = harness.run(Binding::Post, &capture, &request())?;
    assert!(!codes(&violations).contains(&SpecCode::Profiles_4_4_4_2_b));
    Ok(())
}
