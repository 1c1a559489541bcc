//! `ctk check`: replays capture files through the verification engine.

use std::path::{Path, PathBuf};

use ctk_compliance::{ExportOptions, Report};
use ctk_core::Config;
use ctk_protocol_saml::X509SignatureVerifier;
use ctk_spi::{IdpMetadata, IdpMetadataProvider, IdpResponder, ResponderRegistry};
use ctk_verification::VerificationEngine;
use serde::Serialize;
use tabled::Tabled;
use tracing::{info, warn};

use crate::capture::Capture;
use crate::cli::CheckArgs;
use crate::config::OutputFormat;
use crate::output::{self, outcome_label};
use crate::{CliError, CliResult};

/// Outcome of one test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    /// No violation was recorded.
    Pass,
    /// At least one violation was recorded.
    Fail,
    /// The test could not be evaluated.
    Error,
}

impl Outcome {
    const fn label(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Error => "ERROR",
        }
    }
}

/// One row of the check summary.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct TestRow {
    /// Test name.
    #[tabled(rename = "Test")]
    pub name: String,
    /// Outcome.
    #[tabled(rename = "Result", display_with = "display_outcome")]
    pub outcome: Outcome,
    /// Violated codes, or the error for tests that could not run.
    #[tabled(rename = "Details")]
    pub details: String,
}

fn display_outcome(outcome: &Outcome) -> String {
    outcome_label(outcome.label())
}

/// Runs `ctk check`.
///
/// # Errors
///
/// Returns an environment error if the metadata or responder cannot be set
/// up, an IO error if the report cannot be written, and
/// [`CliError::TestsFailed`] if any test failed or errored.
pub fn run_check(args: CheckArgs, config: &Config, format: OutputFormat) -> CliResult<()> {
    let metadata = IdpMetadata::from_file(config.metadata_path()?)?;
    let responder = ResponderRegistry::with_builtin().resolve(Some(config.idp.responder.as_str()))?;
    if metadata.signing_certificate().is_none() {
        warn!("IdP metadata has no signing certificate, redirect signatures will not be verified");
    }

    let report = Report::global();
    let rows = check_captures(&args.captures, config, &metadata, responder.as_ref(), report);

    let report_path = args.report.as_deref().unwrap_or(&config.report.path);
    report.write_report(
        report_path,
        ExportOptions {
            quiet: config.report.quiet,
        },
    )?;

    output::output(&rows, format)?;

    let failed = rows.iter().filter(|row| row.outcome != Outcome::Pass).count();
    if failed > 0 {
        return Err(CliError::TestsFailed {
            failed,
            total: rows.len(),
        });
    }
    output::success(&format!(
        "{} tests passed, report written to {}",
        rows.len(),
        report_path.display()
    ));
    Ok(())
}

/// Checks every capture, recording into `report`.
pub fn check_captures(
    captures: &[PathBuf],
    config: &Config,
    metadata: &dyn IdpMetadataProvider,
    responder: &dyn IdpResponder,
    report: &Report,
) -> Vec<TestRow> {
    let verifier = X509SignatureVerifier::new();
    captures
        .iter()
        .map(|path| {
            report.reset_current_test();
            let row = match check_one(path, config, metadata, responder, &verifier, report) {
                Ok((name, codes)) if codes.is_empty() => TestRow {
                    name,
                    outcome: Outcome::Pass,
                    details: String::new(),
                },
                Ok((name, codes)) => TestRow {
                    name,
                    outcome: Outcome::Fail,
                    details: codes.join(", "),
                },
                Err(err) => TestRow {
                    name: path.display().to_string(),
                    outcome: Outcome::Error,
                    details: err.to_string(),
                },
            };
            info!(test = %row.name, outcome = row.outcome.label(), "test finished");
            row
        })
        .collect()
}

fn check_one(
    path: &Path,
    config: &Config,
    metadata: &dyn IdpMetadataProvider,
    responder: &dyn IdpResponder,
    verifier: &X509SignatureVerifier,
    report: &Report,
) -> CliResult<(String, Vec<String>)> {
    let capture = Capture::from_file(path)?;
    let ctx = capture.request_context(config)?;
    let raw = responder.extract(
        capture.binding.into(),
        &capture.exchange,
        capture.relay_state_given,
    )?;

    let mut engine = VerificationEngine::new(report, metadata)
        .with_signature_verifier(verifier)
        .lenient(config.lenient);
    let violations = engine.run(raw, &ctx)?;

    let mut codes: Vec<String> = violations
        .iter()
        .flat_map(|violation| violation.codes().iter().map(ToString::to_string))
        .collect();
    codes.dedup();
    Ok((capture.name().to_string(), codes))
}

#[cfg(test)]
mod tests {
    use ctk_protocol_saml::Binding;
    use ctk_spi::GenericResponder;

    use super::*;

    fn write_capture(dir: &Path, name: &str, json: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, json).unwrap();
        path
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.sp.acs_url = Some("https://sp.example.com/acs".to_string());
        config
    }

    #[test]
    fn outcomes_per_capture() {
        let dir = tempfile::tempdir().unwrap();
        let empty_redirect = write_capture(
            dir.path(),
            "empty.json",
            r#"{"binding": "redirect", "status": 302, "request_id": "_r1"}"#,
        );
        let broken = write_capture(dir.path(), "broken.json", "{not json");

        let report = Report::new();
        let metadata = IdpMetadata::new("https://idp.example.com")
            .with_sso(Binding::Redirect, "https://idp.example.com/sso");
        let rows = check_captures(
            &[empty_redirect, broken],
            &config(),
            &metadata,
            &GenericResponder,
            &report,
        );

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "empty");
        assert_eq!(rows[0].outcome, Outcome::Fail);
        assert!(!rows[0].details.is_empty());
        assert_eq!(rows[1].outcome, Outcome::Error);
        assert!(report.section_count() > 0);
    }

    #[test]
    fn lenient_mode_passes_error_pages() {
        let dir = tempfile::tempdir().unwrap();
        let error_page = write_capture(
            dir.path(),
            "error-page.json",
            r#"{"binding": "post", "status": 500, "body": "oops", "request_id": "_r2"}"#,
        );

        let mut config = config();
        config.lenient = true;
        let report = Report::new();
        let metadata = IdpMetadata::new("https://idp.example.com");
        let rows = check_captures(&[error_page], &config, &metadata, &GenericResponder, &report);

        assert_eq!(rows[0].outcome, Outcome::Pass);
        assert_eq!(report.section_count(), 0);
    }

    #[test]
    fn outcome_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Outcome::Fail).unwrap(), "\"FAIL\"");
    }
}
