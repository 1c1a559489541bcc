//! Report aggregation across tests.

use std::collections::BTreeSet;
use std::sync::Barrier;

use ctk_compliance::{ExportOptions, Report, Section, SectionStatus, SpecCode, Violation};
use ctk_protocol_saml::{Binding, MessageKind};
use ctk_verification::RequestContext;

use crate::harness::{
    codes, logout_request, post_capture, query_signature, redirect_capture, request, response,
    signed_response, TestHarness, ACS, SP,
};

fn section(name: &str) -> Section {
    Section::parse(name).unwrap()
}

/// One code for each of the first `n` distinct sections.
fn codes_in_distinct_sections(n: usize) -> Vec<SpecCode> {
    let mut seen = BTreeSet::new();
    SpecCode::ALL
        .iter()
        .copied()
        .filter(|code| seen.insert(code.section()))
        .take(n)
        .collect()
}

/// report-1: threads recording distinct sections lose no entry.
#[test]
fn distinct_sections_survive_contention() {
    let distinct = codes_in_distinct_sections(16);
    assert_eq!(distinct.len(), 16);

    let report = Report::new();
    let barrier = Barrier::new(distinct.len());
    std::thread::scope(|scope| {
        for code in &distinct {
            let report = &report;
            let barrier = &barrier;
            scope.spawn(move || {
                barrier.wait();
                report.record(Violation::new(*code, format!("{code} violated")));
                assert_eq!(report.current_test_violations().len(), 1);
            });
        }
    });

    assert_eq!(report.section_count(), distinct.len());
    for code in distinct {
        let stored = report.violation_for(&code.section()).expect("entry per section");
        assert!(stored.has_code(code));
    }
}

/// report-2: concurrent tests against one IdP keep per-test results apart
/// and fill the shared report.
#[test]
fn concurrent_tests_share_one_report() -> anyhow::Result<()> {
    let harness = TestHarness::new()?;
    let long_relay_state = "r".repeat(90);
    let logout = logout_request(
        &format!(r#" Destination="{ACS}""#),
        "<saml:NameID>_t1</saml:NameID>",
    );

    let scenarios = vec![
        (
            Binding::Redirect,
            redirect_capture(
                &logout,
                MessageKind::Request,
                Some(&long_relay_state),
                &query_signature(),
            )?,
            request(),
            SpecCode::Bindings_3_4_3_a,
        ),
        (
            Binding::Post,
            post_capture(&response("", ""), MessageKind::Response, None),
            request(),
            SpecCode::Profiles_4_1_4_2_b,
        ),
        (
            Binding::Post,
            post_capture(&signed_response(), MessageKind::Response, None),
            RequestContext::new("_unrelated", ACS).with_sp_entity_id(SP),
            SpecCode::Core_3_2_2_b,
        ),
    ];

    const ROUNDS: usize = 8;
    let barrier = Barrier::new(scenarios.len() * ROUNDS);
    std::thread::scope(|scope| {
        for _ in 0..ROUNDS {
            for (binding, capture, ctx, expected) in &scenarios {
                let harness = &harness;
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    let violations = harness.run(*binding, capture, ctx).unwrap();
                    assert!(codes(&violations).contains(expected));
                    assert_eq!(
                        harness.report.current_test_violations().len(),
                        violations.len()
                    );
                });
            }
        }
    });

    for name in ["Bindings.3.4", "Profiles.4.1", "Core.3.2"] {
        assert_eq!(harness.report.status(&section(name)), SectionStatus::Failed, "{name}");
    }
    assert_eq!(harness.report.status(&section("Bindings.3.5")), SectionStatus::Successful);
    Ok(())
}

/// report-3: the report file names every document and honours quiet mode.
#[test]
fn report_file_reflects_the_run() -> anyhow::Result<()> {
    let harness = TestHarness::new()?;
    let capture = post_capture(&response("", ""), MessageKind::Response, None);
    harness.run(Binding::Post, &capture, &request())?;

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("report.txt");
    harness.report.write_report(&path, ExportOptions::default())?;
    let text = std::fs::read_to_string(&path)?;

    assert!(text.starts_with("SAML Conformance Report"));
    for document in ["SAML Core", "SAML Bindings", "SAML Profiles"] {
        assert!(text.contains(document), "{document} missing");
    }
    assert!(text.contains("HTTP POST Binding: SUCCESSFUL"));
    assert!(text.contains("HTTP Redirect Binding: SKIPPED"));
    assert!(text.contains("No Assertions found."));

    harness.report.write_report(&path, ExportOptions { quiet: true })?;
    let quiet = std::fs::read_to_string(&path)?;
    assert!(!quiet.contains("No Assertions found."));
    assert!(quiet.contains("FAILED"));
    Ok(())
}

/// report-4: a reset report starts over.
#[test]
fn reset_clears_previous_run() -> anyhow::Result<()> {
    let harness = TestHarness::new()?;
    let capture = post_capture(&response("", ""), MessageKind::Response, None);
    harness.run(Binding::Post, &capture, &request())?;
    assert!(harness.report.section_count() > 0);

    harness.report.reset();
    assert_eq!(harness.report.section_count(), 0);
    assert!(!harness.report.test_has_violations());
    assert_eq!(harness.report.status(&section("Profiles")), SectionStatus::Skipped);
    Ok(())
}
