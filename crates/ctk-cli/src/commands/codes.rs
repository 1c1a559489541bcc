//! `ctk codes`: lists the clauses the toolkit checks.

use ctk_compliance::{Document, SpecCode};
use serde::Serialize;
use tabled::Tabled;

use crate::cli::CodesArgs;
use crate::config::OutputFormat;
use crate::output::output;

/// A clause for display.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct CodeDisplay {
    /// Dotted identifier.
    #[tabled(rename = "Code")]
    pub code: String,
    /// Report section the clause is aggregated under.
    #[tabled(rename = "Section")]
    pub section: String,
    /// Clause text.
    #[tabled(rename = "Message")]
    pub message: String,
}

impl From<SpecCode> for CodeDisplay {
    fn from(code: SpecCode) -> Self {
        Self {
            code: code.id().to_string(),
            section: code.section().to_string(),
            message: code.message().unwrap_or_default().to_string(),
        }
    }
}

/// Runs `ctk codes`.
///
/// # Errors
///
/// Returns an environment error for an unknown document name.
pub fn run_codes(args: CodesArgs, format: OutputFormat) -> crate::CliResult<()> {
    let document = args
        .document
        .as_deref()
        .map(|name| {
            Document::from_prefix(name).ok_or_else(|| {
                ctk_core::Error::Config(format!(
                    "unknown document {name}, expected one of General, Schema, Core, Bindings, Profiles"
                ))
            })
        })
        .transpose()?;
    output(&list_codes(document), format)
}

/// Codes of `document`, or every code.
#[must_use]
pub fn list_codes(document: Option<Document>) -> Vec<CodeDisplay> {
    SpecCode::ALL
        .iter()
        .copied()
        .filter(|code| document.map_or(true, |d| code.document() == d))
        .map(CodeDisplay::from)
        .collect()
}
