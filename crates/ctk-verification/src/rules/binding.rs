//! Binding rules: HTTP Redirect (Bindings 3.4) and HTTP POST (Bindings 3.5).
//!
//! Only the group for the binding the message arrived on runs.

use ctk_compliance::{Document, SpecCode, Violation};
use ctk_protocol_saml::constants::{params, MAX_RELAY_STATE_LEN, XMLDSIG_NS};
use ctk_protocol_saml::Binding;

use super::common::verify_uri;
use super::{sections, CheckContext, CheckResult, Findings, Rule, RuleGroup};

/// The binding group for `binding`.
#[must_use]
pub fn group(binding: Binding) -> RuleGroup {
    match binding {
        Binding::Redirect => RuleGroup::new(
            "binding",
            sections(Document::Bindings, &[[3, 4]]),
            vec![
                Rule::new("redirect_status", redirect_status),
                Rule::new("redirect_relay_state", redirect_relay_state),
                Rule::new("redirect_encoding", redirect_encoding),
                Rule::new("redirect_signature", redirect_signature),
                Rule::new("redirect_destination", redirect_destination),
            ],
        ),
        Binding::Post => RuleGroup::new(
            "binding",
            sections(Document::Bindings, &[[3, 5]]),
            vec![
                Rule::new("post_status", post_status),
                Rule::new("post_relay_state", post_relay_state),
                Rule::new("post_destination", post_destination),
            ],
        ),
    }
}

/// `application/x-www-form-urlencoded` decoding of a query value.
fn form_decode(value: &str) -> Option<String> {
    urlencoding::decode(&value.replace('+', " "))
        .ok()
        .map(|decoded| decoded.into_owned())
}

/// Destination must be present and equal to the ACS URL.
fn check_destination(ctx: &CheckContext<'_>, code: SpecCode, findings: &mut Findings) {
    let root = ctx.root();
    let destination = root.attr("Destination");
    if destination != Some(ctx.request.acs_url.as_str()) {
        findings.report(
            Violation::mismatch(code, "Destination", destination, &ctx.request.acs_url)
                .with_context(root.to_xml()),
        );
    }
}

/// RelayState may not exceed [`MAX_RELAY_STATE_LEN`] bytes.
fn check_relay_state_length(relay_state: &str, code: SpecCode, findings: &mut Findings) {
    if relay_state.len() > MAX_RELAY_STATE_LEN {
        findings.report(Violation::new(
            code,
            format!(
                "RelayState value of [{relay_state}] is {} bytes, longer than {MAX_RELAY_STATE_LEN}.",
                relay_state.len()
            ),
        ));
    }
}

/// 3.4.6 Error Reporting
fn redirect_status(ctx: &CheckContext<'_>, findings: &mut Findings) -> CheckResult {
    let status = ctx.message.http_status();
    if status != 302 && status != 303 {
        findings.report(Violation::mismatch(
            SpecCode::Bindings_3_4_6_a,
            "HTTP Status Code",
            Some(status.to_string().as_str()),
            "302 or 303",
        ));
    }
    Ok(())
}

/// 3.4.3 RelayState, 3.4.4.1 DEFLATE Encoding
fn redirect_relay_state(ctx: &CheckContext<'_>, findings: &mut Findings) -> CheckResult {
    let given = ctx.relay_state_given();
    let Some(raw) = ctx.message.raw_fields().get(params::RELAY_STATE) else {
        if given {
            findings.report(Violation::new(SpecCode::Bindings_3_4_3_b, "RelayState not found."));
        }
        return Ok(());
    };

    let Some(decoded) = form_decode(raw) else {
        findings.report(Violation::new(
            SpecCode::Bindings_3_4_4_1_d,
            format!("RelayState [{raw}] could not be URL decoded."),
        ));
        return Ok(());
    };

    check_relay_state_length(&decoded, SpecCode::Bindings_3_4_3_a, findings);

    let expected = ctx.request.expected_relay_state.as_str();
    if given && decoded != expected {
        if raw == expected {
            findings.report(Violation::new(
                SpecCode::Bindings_3_4_4_1_d,
                format!("RelayState [{raw}] was not URL encoded."),
            ));
        } else {
            findings.report(Violation::mismatch(
                SpecCode::Bindings_3_4_3_b,
                "RelayState",
                Some(decoded.as_str()),
                expected,
            ));
        }
    }
    Ok(())
}

/// 3.4.4 Message Encoding
fn redirect_encoding(ctx: &CheckContext<'_>, findings: &mut Findings) -> CheckResult {
    if let Some(raw) = ctx.message.raw_fields().get(params::SAML_ENCODING) {
        let encoding = form_decode(raw).unwrap_or_else(|| raw.to_string());
        verify_uri(Some(encoding.as_str()), Some(SpecCode::Bindings_3_4_4_a), findings);
    }
    Ok(())
}

/// 3.4.4.1 DEFLATE Encoding: signatures travel in the query string.
fn redirect_signature(ctx: &CheckContext<'_>, findings: &mut Findings) -> CheckResult {
    if let Some(signature) = ctx.root().child(XMLDSIG_NS, "Signature") {
        findings.report(
            Violation::new(SpecCode::Bindings_3_4_4_1_a, "Signature element found.")
                .with_context(signature.to_xml()),
        );
    }
    Ok(())
}

/// 3.4.5.2 Security Considerations
fn redirect_destination(ctx: &CheckContext<'_>, findings: &mut Findings) -> CheckResult {
    if ctx.message.has_query_signature() {
        check_destination(ctx, SpecCode::Bindings_3_4_5_2_a, findings);
    }
    Ok(())
}

/// 3.5.6 Error Reporting
fn post_status(ctx: &CheckContext<'_>, findings: &mut Findings) -> CheckResult {
    let status = ctx.message.http_status();
    if status >= 400 {
        findings.report(Violation::new(
            SpecCode::Bindings_3_5_6_a,
            format!("HTTP Status Code [{status}] is an error status."),
        ));
    }
    Ok(())
}

/// 3.5.3 RelayState
fn post_relay_state(ctx: &CheckContext<'_>, findings: &mut Findings) -> CheckResult {
    let given = ctx.relay_state_given();
    let Some(relay_state) = ctx.message.raw_fields().get(params::RELAY_STATE) else {
        if given {
            findings.report(Violation::new(SpecCode::Bindings_3_5_3_b, "RelayState not found."));
        }
        return Ok(());
    };

    check_relay_state_length(relay_state, SpecCode::Bindings_3_5_3_a, findings);

    let expected = ctx.request.expected_relay_state.as_str();
    if given && relay_state != expected {
        findings.report(Violation::mismatch(
            SpecCode::Bindings_3_5_3_b,
            "RelayState",
            Some(relay_state),
            expected,
        ));
    }
    Ok(())
}

/// 3.5.5.2 Security Considerations
fn post_destination(ctx: &CheckContext<'_>, findings: &mut Findings) -> CheckResult {
    let signed = !ctx.root().descendants_named(XMLDSIG_NS, "Signature").is_empty();
    if signed {
        check_destination(ctx, SpecCode::Bindings_3_5_5_2_a, findings);
    }
    Ok(())
}
