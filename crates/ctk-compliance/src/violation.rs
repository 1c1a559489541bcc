//! Compliance violations.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use crate::section::Section;
use crate::spec_code::SpecCode;

/// One detected rule failure.
///
/// A violation always carries at least one [`SpecCode`]; a single defect
/// may breach several clauses at once, in which case it is recorded under
/// every section those clauses belong to.
#[derive(Debug, Clone)]
pub struct Violation {
    codes: Vec<SpecCode>,
    message: String,
    context: Option<String>,
    cause: Option<Arc<dyn StdError + Send + Sync>>,
}

impl Violation {
    /// Creates a violation of `code`.
    #[must_use]
    pub fn new(code: SpecCode, message: impl Into<String>) -> Self {
        Self {
            codes: vec![code],
            message: message.into(),
            context: None,
            cause: None,
        }
    }

    /// `The {property} value of {actual} is not equal to {expected}.`
    #[must_use]
    pub fn mismatch(
        code: SpecCode,
        property: &str,
        actual: Option<&str>,
        expected: &str,
    ) -> Self {
        let actual = actual.unwrap_or("[absent]");
        Self::new(
            code,
            format!("The {property} value of [{actual}] is not equal to [{expected}]."),
        )
    }

    /// `The {property} value of {actual} is invalid.`
    #[must_use]
    pub fn invalid(code: SpecCode, property: &str, actual: Option<&str>) -> Self {
        let actual = actual.unwrap_or("[absent]");
        Self::new(code, format!("The {property} value of [{actual}] is invalid."))
    }

    /// Adds another breached clause.
    #[must_use]
    pub fn also(mut self, code: SpecCode) -> Self {
        if !self.codes.contains(&code) {
            self.codes.push(code);
        }
        self
    }

    /// Attaches a rendering of the offending XML node.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Wraps the lower-level error that revealed the violation.
    #[must_use]
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.cause = Some(Arc::new(cause));
        self
    }

    /// Breached clauses, in the order they were attached.
    #[must_use]
    pub fn codes(&self) -> &[SpecCode] {
        &self.codes
    }

    /// Explanation of the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Rendering of the offending node, if one was attached.
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Distinct sections this violation is recorded under, in code order.
    #[must_use]
    pub fn sections(&self) -> Vec<Section> {
        let mut sections: Vec<Section> = Vec::with_capacity(self.codes.len());
        for code in &self.codes {
            let section = code.section();
            if !sections.contains(&section) {
                sections.push(section);
            }
        }
        sections
    }

    /// Returns true if any attached code equals `code`.
    #[must_use]
    pub fn has_code(&self, code: SpecCode) -> bool {
        self.codes.contains(&code)
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.message)?;
        if let Some(cause) = &self.cause {
            writeln!(f, "Cause: {cause}")?;
        }
        writeln!(f)?;
        write!(f, "SAML Specification References:")?;
        for code in &self.codes {
            write!(f, "\n{code}: {}", code.describe())?;
        }
        if let Some(context) = &self.context {
            write!(f, "\n\nOffending node:\n{context}")?;
        }
        Ok(())
    }
}

impl StdError for Violation {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn StdError + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn also_keeps_order_and_skips_duplicates() {
        let violation = Violation::new(SpecCode::Bindings_3_4_4_1_b, "bad deflate")
            .also(SpecCode::Bindings_3_4_4_1_a)
            .also(SpecCode::Bindings_3_4_4_1_b);

        assert_eq!(
            violation.codes(),
            [SpecCode::Bindings_3_4_4_1_b, SpecCode::Bindings_3_4_4_1_a]
        );
    }

    #[test]
    fn sections_are_distinct() {
        let violation = Violation::new(SpecCode::Core_3_4_a, "no authn statement")
            .also(SpecCode::Core_3_4_1_4_d)
            .also(SpecCode::Profiles_4_1_4_2_g);

        let sections: Vec<String> = violation.sections().iter().map(ToString::to_string).collect();
        assert_eq!(sections, ["Core.3.4", "Profiles.4.1"]);
    }

    #[test]
    fn mismatch_message_names_property() {
        let violation =
            Violation::mismatch(SpecCode::Core_3_2_2_b, "InResponseTo", Some("_a"), "_b");
        assert_eq!(
            violation.message(),
            "The InResponseTo value of [_a] is not equal to [_b]."
        );
        let absent = Violation::invalid(SpecCode::Core_3_2_2_d, "IssueInstant", None);
        assert_eq!(absent.message(), "The IssueInstant value of [[absent]] is invalid.");
    }

    #[test]
    fn display_lists_references() {
        let text = Violation::new(SpecCode::Bindings_3_4_3_a, "RelayState is 81 bytes.").to_string();
        assert!(text.starts_with("RelayState is 81 bytes.\n"));
        assert!(text.contains("SAML Specification References:"));
        assert!(text.contains("Bindings.3.4.3_a: RelayState MUST NOT exceed 80 bytes."));
    }

    #[test]
    fn cause_is_exposed_as_source() {
        let io = std::io::Error::new(std::io::ErrorKind::InvalidData, "corrupt deflate stream");
        let violation = Violation::new(SpecCode::Bindings_3_4_4_1_b, "inflate failed").with_cause(io);

        let source = StdError::source(&violation).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("corrupt deflate stream"));
        assert!(violation.to_string().contains("Cause: corrupt deflate stream"));
    }
}
