//! Profile rules: Web Browser SSO (Profiles 4.1) and Single Logout
//! (Profiles 4.4).

use ctk_compliance::{Document, SpecCode, Violation};
use ctk_protocol_saml::constants::{
    confirmation_methods, status_codes, SAMLP_NS, SAML_NS, XMLDSIG_NS,
};
use ctk_protocol_saml::{Binding, Element};

use super::common::{assertions, top_status_code, verify_issuer};
use super::{sections, CheckContext, CheckResult, Findings, Rule, RuleGroup};

/// The profile group.
#[must_use]
pub fn group() -> RuleGroup {
    RuleGroup::new(
        "profile",
        sections(Document::Profiles, &[[4, 1], [4, 4]]),
        vec![
            Rule::new("response_binding", response_binding),
            Rule::new("response_issuers", response_issuers),
            Rule::new("error_response", error_response),
            Rule::new("bearer_confirmation", bearer_confirmation),
            Rule::new("bearer_statements", bearer_statements),
            Rule::new("audience_restriction", audience_restriction),
            Rule::new("post_signature", post_signature),
            Rule::new("logout_request", logout_request),
            Rule::new("logout_response", logout_response),
        ],
    )
}

/// A `<Response>` by local name, so an unqualified root is still checked.
fn is_response(root: &Element) -> bool {
    root.name == "Response"
}

/// Returns true if the top-level status code is present and not Success.
fn has_error_status(root: &Element) -> bool {
    top_status_code(root).is_some_and(|code| code != status_codes::SUCCESS)
}

/// A `<Response>` that is not an explicit error. A missing `<Status>` is
/// treated as success here and left to the protocol rules.
fn is_successful_response(root: &Element) -> bool {
    is_response(root) && !has_error_status(root)
}

fn has_signature(element: &Element) -> bool {
    element.child(XMLDSIG_NS, "Signature").is_some()
}

/// Direct assertions holding at least one bearer subject confirmation.
fn bearer_assertions(root: &Element) -> Vec<&Element> {
    assertions(root)
        .into_iter()
        .filter(|assertion| !bearer_confirmations(assertion).is_empty())
        .collect()
}

fn bearer_confirmations(assertion: &Element) -> Vec<&Element> {
    assertion
        .child(SAML_NS, "Subject")
        .map(|subject| {
            subject
                .children_named(SAML_NS, "SubjectConfirmation")
                .filter(|c| c.attr("Method") == Some(confirmation_methods::BEARER))
                .collect()
        })
        .unwrap_or_default()
}

/// 4.1.2 Profile Overview
fn response_binding(ctx: &CheckContext<'_>, _findings: &mut Findings) -> CheckResult {
    if is_response(ctx.root()) && ctx.message.binding() == Binding::Redirect {
        return Err(Violation::new(
            SpecCode::Profiles_4_1_2_a,
            "The <Response> cannot be sent using Redirect Binding.",
        ));
    }
    Ok(())
}

/// 4.1.4.2 `<Response>` Usage: issuers
fn response_issuers(ctx: &CheckContext<'_>, _findings: &mut Findings) -> CheckResult {
    let root = ctx.root();
    if !is_successful_response(root) {
        return Ok(());
    }

    if ctx.is_signed() {
        verify_issuer(root, SpecCode::Profiles_4_1_4_2_a, ctx.metadata)?;
    }

    let assertions = assertions(root);
    if assertions.is_empty() {
        return Err(Violation::new(SpecCode::Profiles_4_1_4_2_b, "No Assertions found.")
            .with_context(root.to_xml()));
    }
    for assertion in assertions {
        verify_issuer(assertion, SpecCode::Profiles_4_1_4_2_c, ctx.metadata)?;
    }
    Ok(())
}

/// 4.1.4.2 `<Response>` Usage: an error response carries no assertion.
fn error_response(ctx: &CheckContext<'_>, _findings: &mut Findings) -> CheckResult {
    let root = ctx.root();
    if !is_response(root) || !has_error_status(root) {
        return Ok(());
    }
    if let Some(assertion) = root.descendants_named(SAML_NS, "Assertion").first() {
        return Err(Violation::new(
            SpecCode::Profiles_4_1_4_2_j,
            "An Assertion was found in a Response whose status is not Success.",
        )
        .with_context(assertion.to_xml()));
    }
    Ok(())
}

/// 4.1.4.2 `<Response>` Usage: bearer `<SubjectConfirmation>`
fn bearer_confirmation(ctx: &CheckContext<'_>, _findings: &mut Findings) -> CheckResult {
    let root = ctx.root();
    if !is_successful_response(root) {
        return Ok(());
    }

    let bearers = bearer_assertions(root);
    if bearers.is_empty() {
        return Err(Violation::new(
            SpecCode::Profiles_4_1_4_2_e,
            "No bearer SubjectConfirmation elements were found.",
        )
        .with_context(root.to_xml()));
    }

    let request = ctx.request;
    let confirmed = bearers
        .iter()
        .flat_map(|assertion| bearer_confirmations(assertion))
        .flat_map(|confirmation| confirmation.children_named(SAML_NS, "SubjectConfirmationData"))
        .any(|data| {
            data.attr("Recipient") == Some(request.acs_url.as_str())
                && data.attr("NotOnOrAfter").is_some()
                && data.attr("NotBefore").is_none()
                && data.attr("InResponseTo") == Some(request.request_id.as_str())
        });
    if !confirmed {
        return Err(Violation::new(
            SpecCode::Profiles_4_1_4_2_f,
            format!(
                "No bearer SubjectConfirmationData with Recipient [{}], InResponseTo [{}], \
                 a NotOnOrAfter and no NotBefore was found.",
                request.acs_url, request.request_id
            ),
        )
        .with_context(root.to_xml()));
    }
    Ok(())
}

/// 4.1.4.2 `<Response>` Usage: `<AuthnStatement>` and `SessionIndex`
fn bearer_statements(ctx: &CheckContext<'_>, _findings: &mut Findings) -> CheckResult {
    let root = ctx.root();
    if !is_successful_response(root) {
        return Ok(());
    }

    let statements: Vec<&Element> = bearer_assertions(root)
        .into_iter()
        .flat_map(|assertion| assertion.children_named(SAML_NS, "AuthnStatement"))
        .collect();
    if statements.is_empty() {
        return Err(Violation::new(
            SpecCode::Profiles_4_1_4_2_g,
            "None of the bearer Assertions contain an <AuthnStatement>.",
        )
        .with_context(root.to_xml()));
    }

    if ctx.metadata.supports_single_logout() {
        if let Some(statement) = statements.iter().find(|s| s.attr("SessionIndex").is_none()) {
            return Err(Violation::new(
                SpecCode::Profiles_4_1_4_2_h,
                "The IdP supports Single Logout but an <AuthnStatement> has no SessionIndex.",
            )
            .with_context(statement.to_xml()));
        }
    }
    Ok(())
}

/// 4.1.4.2 `<Response>` Usage: `<AudienceRestriction>`
fn audience_restriction(ctx: &CheckContext<'_>, _findings: &mut Findings) -> CheckResult {
    let root = ctx.root();
    let Some(sp) = ctx.request.sp_entity_id.as_deref() else {
        return Ok(());
    };
    if !is_successful_response(root) {
        return Ok(());
    }

    for assertion in bearer_assertions(root) {
        let restrictions: Vec<&Element> = assertion
            .child(SAML_NS, "Conditions")
            .map(|conditions| {
                conditions
                    .children_named(SAML_NS, "AudienceRestriction")
                    .collect()
            })
            .unwrap_or_default();
        let restricted = match restrictions.as_slice() {
            [restriction] => restriction
                .children_named(SAML_NS, "Audience")
                .any(|audience| audience.text() == sp),
            _ => false,
        };
        if !restricted {
            return Err(Violation::new(
                SpecCode::Profiles_4_1_4_2_i,
                format!(
                    "Bearer Assertion must have exactly one <AudienceRestriction> naming [{sp}]."
                ),
            )
            .with_context(assertion.to_xml()));
        }
    }
    Ok(())
}

/// 4.1.4.5 POST-Specific Processing Rules
fn post_signature(ctx: &CheckContext<'_>, _findings: &mut Findings) -> CheckResult {
    let root = ctx.root();
    if ctx.message.binding() != Binding::Post || !is_successful_response(root) {
        return Ok(());
    }
    if !has_signature(root) && assertions(root).iter().any(|a| !has_signature(a)) {
        return Err(Violation::new(
            SpecCode::Profiles_4_1_4_5_a,
            "No digital signature found on the Response or Assertions.",
        )
        .with_context(root.to_xml()));
    }
    Ok(())
}

/// 4.4.4.1 `<LogoutRequest>` Usage
fn logout_request(ctx: &CheckContext<'_>, _findings: &mut Findings) -> CheckResult {
    let root = ctx.root();
    if !root.is(SAMLP_NS, "LogoutRequest") {
        return Ok(());
    }
    if !ctx.is_signed() {
        return Err(Violation::new(
            SpecCode::Profiles_4_4_4_1_b,
            "The Logout Request was not signed.",
        ));
    }
    verify_issuer(root, SpecCode::Profiles_4_4_4_1_a, ctx.metadata)
}

/// 4.4.4.2 `<LogoutResponse>` Usage
fn logout_response(ctx: &CheckContext<'_>, _findings: &mut Findings) -> CheckResult {
    let root = ctx.root();
    if !root.is(SAMLP_NS, "LogoutResponse") {
        return Ok(());
    }
    if !ctx.is_signed() {
        return Err(Violation::new(
            SpecCode::Profiles_4_4_4_2_b,
            "The Logout Response was not signed.",
        ));
    }
    verify_issuer(root, SpecCode::Profiles_4_4_4_2_a, ctx.metadata)
}
