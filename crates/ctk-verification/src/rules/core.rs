//! Structural rules from SAML Core: data types, assertions, conditions,
//! statements, versioning, signature references and SAML-defined
//! identifiers.

use std::collections::HashSet;

use ctk_compliance::{Document, SpecCode, Violation};
use ctk_protocol_saml::constants::{
    attrname_formats, SAML1_NAMESPACES, SAMLP_NS, SAML_NS, SAML_VERSION, XMLDSIG_NS, XSI_NS,
};
use ctk_protocol_saml::uri::is_absolute_uri;
use ctk_protocol_saml::{Element, NameIdFormat};

use super::common::{
    has_exactly_one_issuer, parse_instant, self_and_descendants, verify_date_time, verify_string,
    verify_uri,
};
use super::{sections, CheckContext, CheckResult, Findings, Rule, RuleGroup};

/// Maximum length of an entity identifier.
pub const ENTITY_ID_MAX_LEN: usize = 1024;

/// Maximum length of a persistent or transient identifier.
pub const ID_VALUE_MAX_LEN: usize = 256;

/// Time attributes checked wherever they appear below the document element.
const TIME_ATTRIBUTES: [&str; 4] = ["NotBefore", "NotOnOrAfter", "AuthnInstant", "SessionNotOnOrAfter"];

/// The core group.
#[must_use]
pub fn group() -> RuleGroup {
    RuleGroup::new(
        "core",
        sections(
            Document::Core,
            &[
                [1, 3],
                [2, 3],
                [2, 5],
                [2, 7],
                [3, 3],
                [4, 1],
                [4, 2],
                [5, 4],
                [8, 2],
                [8, 3],
            ],
        ),
        vec![
            Rule::new("common_data_types", common_data_types),
            Rule::new("versioning", versioning),
            Rule::new("namespaces", namespaces),
            Rule::new("signature_references", signature_references),
            Rule::new("assertion_structure", assertion_structure),
            Rule::new("conditions", conditions),
            Rule::new("statements", statements),
            Rule::new("attribute_query", attribute_query),
            Rule::new("attribute_name_formats", attribute_name_formats),
            Rule::new("email_identifiers", email_identifiers),
            Rule::new("entity_identifiers", entity_identifiers),
            Rule::new("persistent_identifiers", persistent_identifiers),
            Rule::new("transient_identifiers", transient_identifiers),
        ],
    )
}

/// 1.3 Common Data Types
fn common_data_types(ctx: &CheckContext<'_>, findings: &mut Findings) -> CheckResult {
    let root = ctx.root();
    let all = self_and_descendants(root);

    for element in &all {
        if let Some(xsi_type) = element.attr_ns(XSI_NS, "type") {
            let text = element.text();
            if xsi_type.contains("string") {
                verify_string(Some(text.as_str()), None, findings);
            } else if xsi_type.contains("anyURI") {
                verify_uri(Some(text.as_str()), None, findings);
            } else if xsi_type.contains("dateTime") {
                verify_date_time(Some(text.as_str()), None, findings);
            }
        }
    }

    // The document element's IssueInstant belongs to the protocol group and
    // an assertion's to the assertion structure rule.
    for element in root.descendants() {
        for name in TIME_ATTRIBUTES {
            if let Some(value) = element.attr(name) {
                verify_date_time(Some(value), None, findings);
            }
        }
        if !element.is(SAML_NS, "Assertion") {
            if let Some(value) = element.attr("IssueInstant") {
                verify_date_time(Some(value), None, findings);
            }
        }
    }

    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for id in all.iter().filter_map(|el| el.attr("ID")) {
        if !seen.insert(id) && reported.insert(id) {
            findings.report(Violation::new(
                SpecCode::Core_1_3_4_a,
                format!("The ID value of [{id}] is not unique."),
            ));
        }
    }
    Ok(())
}

/// 4.1 SAML Specification Set Version
fn versioning(ctx: &CheckContext<'_>, findings: &mut Findings) -> CheckResult {
    let root = ctx.root();
    match root.attr("Version") {
        Some(version) if !version.trim().is_empty() && version != SAML_VERSION => {
            findings.report(
                Violation::mismatch(SpecCode::Core_4_1_2_a, "Version", Some(version), SAML_VERSION)
                    .with_context(root.to_xml()),
            );
        }
        _ => {}
    }
    Ok(())
}

/// 4.2 SAML Namespace Version
fn namespaces(ctx: &CheckContext<'_>, findings: &mut Findings) -> CheckResult {
    let root = ctx.root();
    let root_ok = root
        .namespace
        .as_deref()
        .is_some_and(|ns| ns.contains(SAML_VERSION));
    let outdated = self_and_descendants(root).into_iter().find(|el| {
        el.namespace.as_deref().is_some_and(|ns| {
            SAML1_NAMESPACES.iter().any(|known| *known == ns)
                || (ns.contains("SAML") && !ns.contains(SAML_VERSION))
        })
    });

    if !root_ok || outdated.is_some() {
        let offending = outdated.unwrap_or(root);
        findings.report(
            Violation::new(
                SpecCode::Core_4_2_a,
                "A namespace URI with an incorrect version was found.",
            )
            .with_context(offending.to_xml()),
        );
    }
    Ok(())
}

/// 5.4.2 References
fn signature_references(ctx: &CheckContext<'_>, findings: &mut Findings) -> CheckResult {
    for signed in self_and_descendants(ctx.root()) {
        for signature in signed.children_named(XMLDSIG_NS, "Signature") {
            let references = signature.descendants_named(XMLDSIG_NS, "Reference");
            let [reference] = references.as_slice() else {
                findings.report(Violation::new(
                    SpecCode::Core_5_4_2_a,
                    format!(
                        "A signature needs to have exactly one Reference, {} found.",
                        references.len()
                    ),
                ));
                continue;
            };

            let Some(uri) = reference.attr("URI") else {
                findings.report(Violation::new(
                    SpecCode::Core_5_4_2_a,
                    "URI attribute not found.",
                ));
                continue;
            };

            let expected = format!("#{}", signed.attr("ID").unwrap_or_default());
            if uri != expected {
                findings.report(
                    Violation::mismatch(SpecCode::Core_5_4_2_a, "URI", Some(uri), &expected)
                        .with_context(signature.to_xml()),
                );
            }
        }
    }
    Ok(())
}

/// 2.3.3 Element `<Assertion>`
fn assertion_structure(ctx: &CheckContext<'_>, findings: &mut Findings) -> CheckResult {
    for assertion in ctx.root().descendants_named(SAML_NS, "Assertion") {
        let version = assertion.attr("Version");
        if version != Some(SAML_VERSION) {
            return Err(Violation::mismatch(
                SpecCode::Core_2_3_3_a,
                "Version",
                version,
                SAML_VERSION,
            )
            .also(SpecCode::Core_4_1_2_a)
            .with_context(assertion.to_xml()));
        }

        if assertion.attr("ID").is_none() {
            return Err(Violation::new(
                SpecCode::Core_2_3_3_b,
                "The <Assertion> element has no ID attribute.",
            )
            .with_context(assertion.to_xml()));
        }

        let Some(issue_instant) = assertion.attr("IssueInstant") else {
            return Err(Violation::new(
                SpecCode::Core_2_3_3_c,
                "The <Assertion> element has no IssueInstant attribute.",
            )
            .with_context(assertion.to_xml()));
        };
        verify_date_time(Some(issue_instant), Some(SpecCode::Core_2_3_3_c), findings);

        if !has_exactly_one_issuer(assertion) {
            return Err(Violation::new(
                SpecCode::Core_2_3_3_d,
                format!(
                    "{} <Issuer> element(s) were found under Assertion.",
                    assertion.children_named(SAML_NS, "Issuer").count()
                ),
            )
            .with_context(assertion.to_xml()));
        }

        let has_statement = [
            "Statement",
            "AuthnStatement",
            "AuthzDecisionStatement",
            "AttributeStatement",
        ]
        .iter()
        .any(|name| assertion.child(SAML_NS, name).is_some());
        if !has_statement && assertion.child(SAML_NS, "Subject").is_none() {
            return Err(Violation::new(
                SpecCode::Core_2_3_3_e,
                "No Subject or Statement elements found.",
            )
            .with_context(assertion.to_xml()));
        }
    }
    Ok(())
}

/// 2.5.1 Element `<Conditions>`
fn conditions(ctx: &CheckContext<'_>, _findings: &mut Findings) -> CheckResult {
    for conditions in ctx.root().descendants_named(SAML_NS, "Conditions") {
        let not_before = conditions.attr("NotBefore").and_then(parse_instant);
        let not_on_or_after = conditions.attr("NotOnOrAfter").and_then(parse_instant);
        if let (Some(not_before), Some(not_on_or_after)) = (not_before, not_on_or_after) {
            if not_before >= not_on_or_after {
                return Err(Violation::new(
                    SpecCode::Core_2_5_1_2_a,
                    format!(
                        "NotBefore element with value {not_before} is not less than \
                         NotOnOrAfter element with value {not_on_or_after}."
                    ),
                )
                .with_context(conditions.to_xml()));
            }
        }

        if conditions.children_named(SAML_NS, "OneTimeUse").count() > 1 {
            return Err(Violation::new(
                SpecCode::Core_2_5_1_b,
                "Cannot have more than one OneTimeUse element.",
            )
            .with_context(conditions.to_xml()));
        }

        if conditions.children_named(SAML_NS, "ProxyRestriction").count() > 1 {
            return Err(Violation::new(
                SpecCode::Core_2_5_1_c,
                "Cannot have more than one ProxyRestriction element.",
            )
            .with_context(conditions.to_xml()));
        }
    }
    Ok(())
}

/// 2.7 Statements
fn statements(ctx: &CheckContext<'_>, _findings: &mut Findings) -> CheckResult {
    for assertion in ctx.root().descendants_named(SAML_NS, "Assertion") {
        if assertion.child(SAML_NS, "Subject").is_some() {
            continue;
        }
        if assertion.child(SAML_NS, "AuthnStatement").is_some() {
            return Err(Violation::new(
                SpecCode::Core_2_7_2_a,
                "An <Assertion> with an <AuthnStatement> has no <Subject>.",
            )
            .with_context(assertion.to_xml()));
        }
        if assertion.child(SAML_NS, "AttributeStatement").is_some() {
            return Err(Violation::new(
                SpecCode::Core_2_7_3_a,
                "An <Assertion> with an <AttributeStatement> has no <Subject>.",
            )
            .with_context(assertion.to_xml()));
        }
    }
    Ok(())
}

/// 3.3.2.3 Element `<AttributeQuery>`
fn attribute_query(ctx: &CheckContext<'_>, _findings: &mut Findings) -> CheckResult {
    let queries = self_and_descendants(ctx.root())
        .into_iter()
        .filter(|el| el.is(SAMLP_NS, "AttributeQuery"));

    for query in queries {
        let mut seen = HashSet::new();
        for attribute in query.children_named(SAML_NS, "Attribute") {
            let name = attribute.attr("Name").unwrap_or_default();
            let format = attribute
                .attr("NameFormat")
                .unwrap_or(attrname_formats::UNSPECIFIED);
            if !seen.insert((name, format)) {
                return Err(Violation::new(
                    SpecCode::Core_3_3_2_3_a,
                    format!(
                        "The <AttributeQuery> contains more than one <Attribute> with Name \
                         [{name}] and NameFormat [{format}]."
                    ),
                )
                .with_context(query.to_xml()));
            }
        }
    }
    Ok(())
}

/// 8.2 Attribute Name Format Identifiers
fn attribute_name_formats(ctx: &CheckContext<'_>, _findings: &mut Findings) -> CheckResult {
    for attribute in ctx.root().descendants_named(SAML_NS, "Attribute") {
        let (Some(name), Some(format)) = (attribute.attr("Name"), attribute.attr("NameFormat"))
        else {
            continue;
        };

        let code = match format {
            attrname_formats::URI if !is_absolute_uri(name) => SpecCode::Core_8_2_2_a,
            attrname_formats::BASIC if !is_xml_name(name) => SpecCode::Core_8_2_3_a,
            _ => continue,
        };
        return Err(Violation::new(
            code,
            format!("Attribute name [{name}] does not match its declared format [{format}]."),
        )
        .with_context(attribute.to_xml()));
    }
    Ok(())
}

/// 8.3.2 Email Address
fn email_identifiers(ctx: &CheckContext<'_>, _findings: &mut Findings) -> CheckResult {
    for identifier in identifiers(ctx.root(), NameIdFormat::Email) {
        let value = identifier.text();
        if !is_email(&value) {
            return Err(Violation::new(
                SpecCode::Core_8_3_2_a,
                format!(
                    "The content [{value}] of the Identifier [{}] was not in the format \
                     specified by the Format attribute [{}].",
                    identifier.name,
                    NameIdFormat::Email.uri()
                ),
            )
            .with_context(identifier.to_xml()));
        }
    }
    Ok(())
}

/// 8.3.6 Entity Identifier
fn entity_identifiers(ctx: &CheckContext<'_>, _findings: &mut Findings) -> CheckResult {
    for identifier in identifiers(ctx.root(), NameIdFormat::Entity) {
        let qualified = ["NameQualifier", "SPNameQualifier", "SPProvidedID"]
            .iter()
            .any(|name| identifier.attr(name).is_some());
        if qualified {
            return Err(Violation::new(
                SpecCode::Core_8_3_6_a,
                "Entity Identifier included a disallowed attribute.",
            )
            .with_context(identifier.to_xml()));
        }

        let value = identifier.text();
        let len = value.chars().count();
        if len > ENTITY_ID_MAX_LEN {
            return Err(Violation::new(
                SpecCode::Core_8_3_6_b,
                format!("Length of URI [{value}] is [{len}]."),
            ));
        }
    }
    Ok(())
}

/// 8.3.7 Persistent Identifier
fn persistent_identifiers(ctx: &CheckContext<'_>, _findings: &mut Findings) -> CheckResult {
    for identifier in identifiers(ctx.root(), NameIdFormat::Persistent) {
        let len = identifier.text().chars().count();
        if len > ID_VALUE_MAX_LEN {
            return Err(Violation::new(
                SpecCode::Core_8_3_7_a,
                format!(
                    "The length of the Persistent ID's value [{len}] was greater than \
                     {ID_VALUE_MAX_LEN} characters."
                ),
            )
            .with_context(identifier.to_xml()));
        }

        if let Some(qualifier) = identifier.attr("NameQualifier") {
            let entity_id = ctx.metadata.entity_id();
            if qualifier != entity_id {
                return Err(Violation::mismatch(
                    SpecCode::Core_8_3_7_b,
                    "Persistent ID's NameQualifier",
                    Some(qualifier),
                    entity_id,
                )
                .with_context(identifier.to_xml()));
            }
        }
    }
    Ok(())
}

/// 8.3.8 Transient Identifier
fn transient_identifiers(ctx: &CheckContext<'_>, _findings: &mut Findings) -> CheckResult {
    for identifier in identifiers(ctx.root(), NameIdFormat::Transient) {
        let len = identifier.text().chars().count();
        if len > ID_VALUE_MAX_LEN {
            return Err(Violation::new(
                SpecCode::Core_8_3_8_a,
                format!(
                    "The length of the Transient ID's value [{len}] was greater than \
                     {ID_VALUE_MAX_LEN} characters."
                ),
            )
            .with_context(identifier.to_xml()));
        }
    }
    Ok(())
}

/// Elements declaring `format` in their `Format` attribute.
fn identifiers(root: &Element, format: NameIdFormat) -> Vec<&Element> {
    self_and_descendants(root)
        .into_iter()
        .filter(|el| el.attr("Format") == Some(format.uri()))
        .collect()
}

/// xs:Name production, without the full Unicode tables.
fn is_xml_name(value: &str) -> bool {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_' || first == ':')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | ':'))
}

/// `local-part@domain` with an RFC 5322 dot-atom local part.
fn is_email(value: &str) -> bool {
    const ATEXT: &str = "!#$%&'*+/=?^_`{|}~-";

    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    let local_ok = !local.is_empty()
        && local
            .split('.')
            .all(|atom| !atom.is_empty() && atom.chars().all(|c| c.is_ascii_alphanumeric() || ATEXT.contains(c)));
    let labels: Vec<&str> = domain.split('.').collect();
    let domain_ok = labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        });
    local_ok && domain_ok
}
