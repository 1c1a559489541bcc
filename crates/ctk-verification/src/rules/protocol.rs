//! Protocol rules from SAML Core: status responses, the authentication
//! request protocol and the single logout protocol.

use ctk_compliance::{Document, SpecCode, Violation};
use ctk_protocol_saml::constants::{status_codes, SAMLP_NS, SAML_NS, SAML_VERSION};
use ctk_protocol_saml::Element;

use super::common::{
    assertions, is_success, top_status_code, verify_date_time, verify_string, verify_uri,
};
use super::{sections, CheckContext, CheckResult, Findings, Rule, RuleGroup};

/// The protocol group.
#[must_use]
pub fn group() -> RuleGroup {
    RuleGroup::new(
        "protocol",
        sections(Document::Core, &[[3, 2], [3, 4], [3, 7]]),
        vec![
            Rule::new("status_response", status_response),
            Rule::new("status_code", status_code),
            Rule::new("authn_response", authn_response),
            Rule::new("logout_request", logout_request),
        ],
    )
}

/// Returns true for any protocol message derived from StatusResponseType.
fn is_status_response(root: &Element) -> bool {
    root.namespace.as_deref() == Some(SAMLP_NS) && root.name.ends_with("Response")
}

/// 3.2.2 Complex Type StatusResponseType
fn status_response(ctx: &CheckContext<'_>, findings: &mut Findings) -> CheckResult {
    let root = ctx.root();
    if !is_status_response(root) {
        return Ok(());
    }

    if root.attr("ID").is_none() {
        return Err(Violation::new(
            SpecCode::Core_3_2_2_a,
            format!("The <{}> element has no ID attribute.", root.name),
        )
        .with_context(root.to_xml()));
    }

    let in_response_to = root.attr("InResponseTo");
    if in_response_to != Some(ctx.request.request_id.as_str()) {
        findings.report(Violation::mismatch(
            SpecCode::Core_3_2_2_b,
            "InResponseTo",
            in_response_to,
            &ctx.request.request_id,
        ));
    }

    let version = root.attr("Version");
    if version != Some(SAML_VERSION) {
        findings.report(Violation::mismatch(
            SpecCode::Core_3_2_2_c,
            "Version",
            version,
            SAML_VERSION,
        ));
    }

    match root.attr("IssueInstant") {
        Some(issue_instant) => {
            verify_date_time(Some(issue_instant), Some(SpecCode::Core_3_2_2_d), findings);
        }
        None => findings.report(Violation::invalid(SpecCode::Core_3_2_2_d, "IssueInstant", None)),
    }

    if let Some(destination) = root.attr("Destination") {
        verify_uri(Some(destination), Some(SpecCode::Core_3_2_2_e), findings);
        if destination != ctx.request.acs_url {
            findings.report(Violation::mismatch(
                SpecCode::Core_3_2_2_e,
                "Destination",
                Some(destination),
                &ctx.request.acs_url,
            ));
        }
    }
    Ok(())
}

/// 3.2.2.1 Element `<Status>`, 3.2.2.2 Element `<StatusCode>`
fn status_code(ctx: &CheckContext<'_>, findings: &mut Findings) -> CheckResult {
    let root = ctx.root();
    if !is_status_response(root) {
        return Ok(());
    }

    let Some(status) = root.child(SAMLP_NS, "Status") else {
        return Err(Violation::new(
            SpecCode::Core_3_2_2_2_a,
            format!("The <{}> element has no <Status>.", root.name),
        )
        .with_context(root.to_xml()));
    };

    let top = top_status_code(root);
    if !top.is_some_and(|code| status_codes::TOP_LEVEL.iter().any(|known| *known == code)) {
        findings.report(
            Violation::new(
                SpecCode::Core_3_2_2_2_a,
                format!(
                    "The first <StatusCode> of [{}] is not a top level SAML status code.",
                    top.unwrap_or_default()
                ),
            )
            .with_context(status.to_xml()),
        );
    }

    for code in status.descendants_named(SAMLP_NS, "StatusCode") {
        verify_uri(code.attr("Value"), None, findings);
    }
    for message in status.children_named(SAMLP_NS, "StatusMessage") {
        verify_string(Some(message.text().as_str()), None, findings);
    }
    Ok(())
}

/// 3.4.1.4 Processing Rules
fn authn_response(ctx: &CheckContext<'_>, _findings: &mut Findings) -> CheckResult {
    let root = ctx.root();
    if !root.is(SAMLP_NS, "Response") || !is_success(root) {
        return Ok(());
    }

    let assertions = assertions(root);
    if assertions.is_empty() && root.child(SAML_NS, "EncryptedAssertion").is_none() {
        return Err(Violation::new(
            SpecCode::Core_3_4_1_4_a,
            "Did not find Response elements with one or more Assertion elements.",
        )
        .with_context(root.to_xml()));
    }

    if let Some(assertion) = root
        .descendants_named(SAML_NS, "Assertion")
        .into_iter()
        .find(|a| a.child(SAML_NS, "Subject").is_none())
    {
        return Err(Violation::new(
            SpecCode::Core_3_4_1_4_c,
            "One of the Assertions contained no Subject.",
        )
        .with_context(assertion.to_xml()));
    }

    if !assertions.is_empty()
        && assertions
            .iter()
            .all(|a| a.child(SAML_NS, "AuthnStatement").is_none())
    {
        return Err(Violation::new(
            SpecCode::Core_3_4_a,
            "AuthnStatement not found in any of the Assertions.",
        )
        .also(SpecCode::Core_3_4_1_4_d)
        .with_context(root.to_xml()));
    }

    if let Some(sp) = ctx.request.sp_entity_id.as_deref() {
        let unrestricted = assertions.iter().find(|assertion| {
            !assertion
                .descendants_named(SAML_NS, "AudienceRestriction")
                .iter()
                .flat_map(|restriction| restriction.children_named(SAML_NS, "Audience"))
                .any(|audience| audience.text() == sp)
        });
        if let Some(assertion) = unrestricted {
            return Err(Violation::new(
                SpecCode::Core_3_4_1_4_e,
                "Assertion found without an AudienceRestriction referencing the requester.",
            )
            .with_context(assertion.to_xml()));
        }
    }
    Ok(())
}

/// 3.7.1 Element `<LogoutRequest>`
fn logout_request(ctx: &CheckContext<'_>, findings: &mut Findings) -> CheckResult {
    let root = ctx.root();
    if !root.is(SAMLP_NS, "LogoutRequest") {
        return Ok(());
    }

    if let Some(reason) = root.attr("Reason") {
        verify_uri(Some(reason), Some(SpecCode::Core_3_7_1_a), findings);
    }

    let identified = ["BaseID", "NameID", "EncryptedID"]
        .iter()
        .any(|name| root.child(SAML_NS, name).is_some());
    if !identified {
        return Err(Violation::new(
            SpecCode::Core_3_7_1_b,
            "No <BaseID>, <NameID> or <EncryptedID> element was found in the <LogoutRequest>.",
        )
        .with_context(root.to_xml()));
    }
    Ok(())
}
