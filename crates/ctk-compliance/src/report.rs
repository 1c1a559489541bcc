//! The aggregated conformance report.
//!
//! ## Semantics
//!
//! - Each [`Section`] keeps the *first* violation ever recorded for it.
//!   Insertion is a single atomic `entry().or_insert_with` on a sharded
//!   concurrent map, so concurrent test threads cannot both win.
//! - Each thread additionally keeps the list of violations its current test
//!   produced, independently of the global deduplication. The list lives in
//!   thread-local storage keyed by report instance, so it needs no locking.
//! - Nothing is removed from the per-section map except by [`Report::reset`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

use dashmap::{DashMap, DashSet};
use serde::Serialize;

use crate::section::{Document, Section};
use crate::spec_code::SpecCode;
use crate::violation::Violation;

static NEXT_REPORT_ID: AtomicU64 = AtomicU64::new(1);

static GLOBAL: LazyLock<Report> = LazyLock::new(Report::new);

thread_local! {
    static CURRENT_TEST: RefCell<HashMap<u64, Vec<Arc<Violation>>>> =
        RefCell::new(HashMap::new());
}

/// Outcome of a section in the exported report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SectionStatus {
    /// At least one violation was recorded in the section.
    Failed,
    /// Checks for the section ran without violations.
    Successful,
    /// No check for the section ran.
    Skipped,
}

impl SectionStatus {
    /// Label used in the text report.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Failed => "FAILED",
            Self::Successful => "SUCCESSFUL",
            Self::Skipped => "SKIPPED",
        }
    }
}

/// Options for [`Report::render`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    /// List section statuses only, without violation text.
    pub quiet: bool,
}

/// Process-wide violation aggregate.
#[derive(Debug)]
pub struct Report {
    id: u64,
    by_section: DashMap<Section, Arc<Violation>>,
    exercised: DashSet<Section>,
}

impl Default for Report {
    fn default() -> Self {
        Self::new()
    }
}

impl Report {
    /// Creates an empty, independent report.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: NEXT_REPORT_ID.fetch_add(1, Ordering::Relaxed),
            by_section: DashMap::new(),
            exercised: DashSet::new(),
        }
    }

    /// The report shared by the whole process.
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Records a violation.
    ///
    /// The violation is stored under every section of its codes that has no
    /// entry yet, and always appended to the calling thread's current test.
    pub fn record(&self, violation: Violation) -> Arc<Violation> {
        let violation = Arc::new(violation);
        for section in violation.sections() {
            let stored = self
                .by_section
                .entry(section.clone())
                .or_insert_with(|| Arc::clone(&violation));
            if !Arc::ptr_eq(stored.value(), &violation) {
                tracing::trace!(%section, "section already holds a violation");
            }
        }
        tracing::debug!(
            codes = ?violation.codes().iter().map(|c| c.id()).collect::<Vec<_>>(),
            "violation recorded"
        );
        CURRENT_TEST.with(|current| {
            current
                .borrow_mut()
                .entry(self.id)
                .or_default()
                .push(Arc::clone(&violation));
        });
        violation
    }

    /// Marks a section as exercised by the current run.
    pub fn start(&self, section: Section) {
        self.exercised.insert(section);
    }

    /// The violation stored for exactly `section`.
    #[must_use]
    pub fn violation_for(&self, section: &Section) -> Option<Arc<Violation>> {
        self.by_section.get(section).map(|entry| Arc::clone(entry.value()))
    }

    /// Number of sections holding a violation.
    #[must_use]
    pub fn section_count(&self) -> usize {
        self.by_section.len()
    }

    /// Messages stored for `section` and every section nested under it, in
    /// section order, separated by blank lines. Empty if none.
    #[must_use]
    pub fn section_messages(&self, section: &Section) -> String {
        let mut hits: Vec<(Section, Arc<Violation>)> = self
            .by_section
            .iter()
            .filter(|entry| entry.key().is_within(section))
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();
        hits.sort_by(|a, b| a.0.cmp(&b.0));

        let mut seen: Vec<&Arc<Violation>> = Vec::with_capacity(hits.len());
        for (_, violation) in &hits {
            if !seen.iter().any(|v| Arc::ptr_eq(v, violation)) {
                seen.push(violation);
            }
        }
        seen.iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Returns true if the current test on this thread recorded anything.
    #[must_use]
    pub fn test_has_violations(&self) -> bool {
        CURRENT_TEST.with(|current| {
            current
                .borrow()
                .get(&self.id)
                .is_some_and(|list| !list.is_empty())
        })
    }

    /// Violations recorded by the current test on this thread, in order.
    #[must_use]
    pub fn current_test_violations(&self) -> Vec<Arc<Violation>> {
        CURRENT_TEST.with(|current| current.borrow().get(&self.id).cloned().unwrap_or_default())
    }

    /// Starts a new test case on this thread.
    pub fn reset_current_test(&self) {
        CURRENT_TEST.with(|current| {
            current.borrow_mut().remove(&self.id);
        });
    }

    /// Clears everything. Intended for the toolkit's own tests, not for a
    /// conformance run.
    pub fn reset(&self) {
        self.by_section.clear();
        self.exercised.clear();
        self.reset_current_test();
    }

    /// Status of `section`, considering nested sections.
    #[must_use]
    pub fn status(&self, section: &Section) -> SectionStatus {
        if self.by_section.iter().any(|e| e.key().is_within(section)) {
            SectionStatus::Failed
        } else if self.exercised.iter().any(|s| s.key().is_within(section)) {
            SectionStatus::Successful
        } else {
            SectionStatus::Skipped
        }
    }

    /// Renders the report with default options.
    #[must_use]
    pub fn export(&self) -> String {
        self.render(ExportOptions::default())
    }

    /// Renders the report grouped by document, then section.
    #[must_use]
    pub fn render(&self, options: ExportOptions) -> String {
        let sections = self.known_sections();
        let mut out = String::new();
        out.push_str("SAML Conformance Report\n");
        out.push_str("=======================\n");

        for document in Document::ALL {
            let in_document: Vec<&Section> = sections
                .iter()
                .filter(|s| s.document() == document)
                .collect();
            if in_document.is_empty() {
                continue;
            }
            out.push('\n');

            let root = Section::root(document);
            if in_document.iter().all(|s| s.level() == 0) {
                self.render_section(&mut out, &root, document.title(), 0, options);
                continue;
            }
            let _ = writeln!(out, "{}", document.title());
            for section in in_document {
                let title = section.title().unwrap_or("");
                let label = if title.is_empty() {
                    section.to_string()
                } else {
                    title.to_string()
                };
                self.render_section(&mut out, section, &label, 1, options);
            }
        }

        let skipped = sections
            .iter()
            .filter(|s| self.status(s) == SectionStatus::Skipped)
            .count();
        let failed = sections
            .iter()
            .filter(|s| self.status(s) == SectionStatus::Failed)
            .count();
        let _ = write!(
            out,
            "\n{failed} of {} sections FAILED, {skipped} SKIPPED.\n\
             Sections marked SKIPPED had no checks exercised during this run.\n",
            sections.len()
        );
        out
    }

    /// Writes the rendered report to `path`, replacing any previous file.
    ///
    /// ## Errors
    ///
    /// Returns the underlying I/O error if the file cannot be written.
    pub fn write_report(&self, path: &Path, options: ExportOptions) -> std::io::Result<()> {
        std::fs::write(path, self.render(options))?;
        tracing::info!(path = %path.display(), sections = self.section_count(), "report written");
        Ok(())
    }

    /// Serializable view of the report.
    #[must_use]
    pub fn snapshot(&self) -> ReportSnapshot {
        let sections = self
            .known_sections()
            .into_iter()
            .map(|section| {
                let violation = self.violation_for(&section).map(|v| ViolationView {
                    codes: v.codes().to_vec(),
                    message: v.message().to_string(),
                    context: v.context().map(str::to_string),
                });
                SectionEntry {
                    title: section.title(),
                    status: self.status(&section),
                    section,
                    violation,
                }
            })
            .collect();
        ReportSnapshot { sections }
    }

    fn render_section(
        &self,
        out: &mut String,
        section: &Section,
        label: &str,
        indent: usize,
        options: ExportOptions,
    ) {
        let tabs = "\t".repeat(indent);
        let status = self.status(section);
        let _ = writeln!(out, "{tabs}{label}: {}", status.label());
        if options.quiet || status != SectionStatus::Failed {
            return;
        }
        if let Some(violation) = self.violation_for(section) {
            for line in violation.to_string().lines() {
                let _ = writeln!(out, "{tabs}\t{line}");
            }
        }
    }

    /// Every section any code maps to, plus anything recorded or exercised.
    fn known_sections(&self) -> Vec<Section> {
        let mut sections: Vec<Section> = SpecCode::ALL.iter().map(|c| c.section()).collect();
        sections.extend(self.by_section.iter().map(|e| e.key().clone()));
        sections.extend(self.exercised.iter().map(|s| s.key().clone()));
        sections.sort();
        sections.dedup();
        sections
    }
}

impl Drop for Report {
    fn drop(&mut self) {
        // Other threads' entries die with their thread.
        let _ = CURRENT_TEST.try_with(|current| {
            current.borrow_mut().remove(&self.id);
        });
    }
}

/// Serializable view of a [`Report`].
#[derive(Debug, Clone, Serialize)]
pub struct ReportSnapshot {
    /// Every known section in report order.
    pub sections: Vec<SectionEntry>,
}

/// One section in a [`ReportSnapshot`].
#[derive(Debug, Clone, Serialize)]
pub struct SectionEntry {
    /// Section key.
    pub section: Section,
    /// Human title, when known.
    pub title: Option<&'static str>,
    /// Outcome.
    pub status: SectionStatus,
    /// First violation recorded for the section.
    pub violation: Option<ViolationView>,
}

/// Serializable view of a [`Violation`].
#[derive(Debug, Clone, Serialize)]
pub struct ViolationView {
    /// Breached clauses.
    pub codes: Vec<SpecCode>,
    /// Explanation.
    pub message: String,
    /// Offending node, if any.
    pub context: Option<String>,
}
