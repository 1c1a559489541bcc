//! Helpers shared by several rule groups.

use chrono::{DateTime, Utc};
use ctk_compliance::{SpecCode, Violation};
use ctk_protocol_saml::constants::{status_codes, SAMLP_NS, SAML_NS};
use ctk_protocol_saml::uri::is_absolute_uri;
use ctk_protocol_saml::{Element, NameIdFormat};
use ctk_spi::IdpMetadataProvider;

use super::{CheckResult, Findings};

/// Builds a data type violation. With a `clause`, the clause comes first and
/// the data type code is attached after it.
fn data_type(code: SpecCode, clause: Option<SpecCode>, message: String) -> Violation {
    match clause {
        Some(clause) => Violation::new(clause, message).also(code),
        None => Violation::new(code, message),
    }
}

/// Strings must contain at least one non-whitespace character.
pub(crate) fn verify_string(value: Option<&str>, clause: Option<SpecCode>, findings: &mut Findings) {
    if value.is_some_and(|v| !v.trim().is_empty()) {
        return;
    }
    findings.report(data_type(
        SpecCode::Core_1_3_1_a,
        clause,
        format!("The String value of [{}] is invalid.", value.unwrap_or_default()),
    ));
}

/// URI references must be absolute and non-blank.
pub(crate) fn verify_uri(value: Option<&str>, clause: Option<SpecCode>, findings: &mut Findings) {
    if value.is_some_and(is_absolute_uri) {
        return;
    }
    findings.report(data_type(
        SpecCode::Core_1_3_2_a,
        clause,
        format!("The URI value of [{}] is invalid.", value.unwrap_or_default()),
    ));
}

/// Time values must be UTC, written with a trailing `Z`.
pub(crate) fn verify_date_time(
    value: Option<&str>,
    clause: Option<SpecCode>,
    findings: &mut Findings,
) {
    let message = match value {
        Some(v) if v.ends_with('Z') && parse_instant(v).is_some() => return,
        Some(v) if v.ends_with('Z') => format!("The time date value of [{v}] is invalid."),
        other => format!(
            "The time date value of [{}] is not in UTC.",
            other.unwrap_or_default()
        ),
    };
    findings.report(data_type(SpecCode::Core_1_3_3_a, clause, message));
}

/// Parses an xs:dateTime.
pub(crate) fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// `element` followed by everything below it.
pub(crate) fn self_and_descendants(element: &Element) -> Vec<&Element> {
    let mut all = vec![element];
    all.extend(element.descendants());
    all
}

/// Direct `<saml:Assertion>` children.
pub(crate) fn assertions(element: &Element) -> Vec<&Element> {
    element.children_named(SAML_NS, "Assertion").collect()
}

/// Value of the first-level `<StatusCode>`.
pub(crate) fn top_status_code(root: &Element) -> Option<&str> {
    root.child(SAMLP_NS, "Status")?
        .child(SAMLP_NS, "StatusCode")?
        .attr("Value")
}

/// Returns true if the first-level status code is Success.
pub(crate) fn is_success(root: &Element) -> bool {
    top_status_code(root) == Some(status_codes::SUCCESS)
}

/// Returns true if `element` has exactly one `<saml:Issuer>` child.
pub(crate) fn has_exactly_one_issuer(element: &Element) -> bool {
    element.children_named(SAML_NS, "Issuer").count() == 1
}

/// The issuer of `element` must be the IdP, in entity format if a format
/// is given.
pub(crate) fn verify_issuer(
    element: &Element,
    clause: SpecCode,
    metadata: &dyn IdpMetadataProvider,
) -> CheckResult {
    let issuers: Vec<&Element> = element.children_named(SAML_NS, "Issuer").collect();
    let [issuer] = issuers.as_slice() else {
        return Err(Violation::new(
            clause,
            format!(
                "{} <Issuer> element(s) were found under {}.",
                issuers.len(),
                element.name
            ),
        )
        .with_context(element.to_xml()));
    };

    let value = issuer.text();
    if value != metadata.entity_id() {
        return Err(Violation::mismatch(
            clause,
            &format!("{}'s issuer", element.name),
            Some(value.as_str()),
            metadata.entity_id(),
        )
        .with_context(issuer.to_xml()));
    }

    let entity = NameIdFormat::Entity.uri();
    match issuer.attr("Format") {
        Some(format) if format != entity => Err(Violation::mismatch(
            clause,
            &format!("{}'s issuer format", element.name),
            Some(format),
            entity,
        )
        .with_context(issuer.to_xml())),
        _ => Ok(()),
    }
}
