//! Hierarchical spec sections.
//!
//! A [`Section`] is a document plus a numeric path (`Core.3.4`). Sections
//! nest by prefix: `Core` contains `Core.3`, which contains `Core.3.4`.
//! Violations are aggregated at [`SECTION_DEPTH`].

use std::fmt;

use serde::{Serialize, Serializer};

/// Number of numeric components kept when deriving a section from a spec code.
pub const SECTION_DEPTH: usize = 2;

/// Top-level SAML document a clause belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Document {
    /// Rules not tied to a single document (signature validity).
    General,
    /// XML Schema conformance of the decoded message.
    Schema,
    /// Assertions and Protocols for SAML 2.0.
    Core,
    /// Bindings for SAML 2.0.
    Bindings,
    /// Profiles for SAML 2.0.
    Profiles,
}

impl Document {
    /// All documents in report order.
    pub const ALL: [Self; 5] = [
        Self::General,
        Self::Schema,
        Self::Core,
        Self::Bindings,
        Self::Profiles,
    ];

    /// Identifier prefix used in spec codes.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::General => "General",
            Self::Schema => "Schema",
            Self::Core => "Core",
            Self::Bindings => "Bindings",
            Self::Profiles => "Profiles",
        }
    }

    /// Heading used in the exported report.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::General => "General",
            Self::Schema => "XML Schema",
            Self::Core => "SAML Core",
            Self::Bindings => "SAML Bindings",
            Self::Profiles => "SAML Profiles",
        }
    }

    /// Parses a spec code prefix.
    #[must_use]
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.prefix() == prefix)
    }
}

/// A node in the section hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Section {
    document: Document,
    path: Vec<u16>,
}

impl Section {
    /// Section covering a whole document.
    #[must_use]
    pub const fn root(document: Document) -> Self {
        Self {
            document,
            path: Vec::new(),
        }
    }

    /// Section at the given numeric path.
    #[must_use]
    pub fn new(document: Document, path: &[u16]) -> Self {
        Self {
            document,
            path: path.to_vec(),
        }
    }

    /// Derives the aggregation section of a spec code identifier.
    ///
    /// `Core.3.4.1.4_c` becomes `Core.3.4` and `General_a` becomes `General`.
    #[must_use]
    pub fn from_code_id(id: &str) -> Option<Self> {
        let id = strip_suffix(id);
        let (prefix, rest) = match id.split_once('.') {
            Some((prefix, rest)) => (prefix, Some(rest)),
            None => (id, None),
        };
        let document = Document::from_prefix(prefix)?;
        let mut path = Vec::with_capacity(SECTION_DEPTH);
        if let Some(rest) = rest {
            for component in rest.split('.').take(SECTION_DEPTH) {
                path.push(component.parse().ok()?);
            }
        }
        Some(Self { document, path })
    }

    /// Parses a dotted section name such as `Bindings.3.4` or `Profiles`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let mut parts = name.split('.');
        let document = Document::from_prefix(parts.next()?)?;
        let path = parts
            .map(|p| p.parse().ok())
            .collect::<Option<Vec<u16>>>()?;
        Some(Self { document, path })
    }

    /// Document this section belongs to.
    #[must_use]
    pub const fn document(&self) -> Document {
        self.document
    }

    /// Numeric path below the document.
    #[must_use]
    pub fn path(&self) -> &[u16] {
        &self.path
    }

    /// Nesting level: 0 for a document, 1 for a chapter, 2 for a section.
    #[must_use]
    pub fn level(&self) -> usize {
        self.path.len()
    }

    /// Returns true if `self` equals `ancestor` or is nested under it.
    #[must_use]
    pub fn is_within(&self, ancestor: &Self) -> bool {
        self.document == ancestor.document && self.path.starts_with(&ancestor.path)
    }

    /// Human title, e.g. `3.4 HTTP Redirect Binding`.
    #[must_use]
    pub fn title(&self) -> Option<&'static str> {
        let name = self.to_string();
        TITLES
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, title)| *title)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.document.prefix())?;
        for component in &self.path {
            write!(f, ".{component}")?;
        }
        Ok(())
    }
}

impl Serialize for Section {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Drops a trailing `_<letters>` suffix.
fn strip_suffix(id: &str) -> &str {
    match id.rsplit_once('_') {
        Some((head, tail))
            if !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_lowercase()) =>
        {
            head
        }
        _ => id,
    }
}

const TITLES: &[(&str, &str)] = &[
    ("General", "General"),
    ("Schema", "XML Schema"),
    ("Core.1.3", "1.3 Common Data Types"),
    ("Core.2.3", "2.3 Assertions"),
    ("Core.2.5", "2.5 Conditions"),
    ("Core.2.7", "2.7 Statements"),
    ("Core.3.2", "3.2 Requests and Responses"),
    ("Core.3.3", "3.3 Assertion Query and Request Protocol"),
    ("Core.3.4", "3.4 Authentication Request Protocol"),
    ("Core.3.7", "3.7 Single Logout Protocol"),
    ("Core.4.1", "4.1 SAML Specification Versioning"),
    ("Core.4.2", "4.2 SAML Namespace Version"),
    ("Core.5.4", "5.4 SAML-Specific XML Signature Processing"),
    ("Core.8.2", "8.2 Attribute Name Format Identifiers"),
    ("Core.8.3", "8.3 Name Identifier Format Identifiers"),
    ("Bindings.3.1", "3.1 General Considerations"),
    ("Bindings.3.4", "3.4 HTTP Redirect Binding"),
    ("Bindings.3.5", "3.5 HTTP POST Binding"),
    ("Profiles.4.1", "4.1 Web Browser SSO Profile"),
    ("Profiles.4.4", "4.4 Single Logout Profile"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_with_suffix_truncates_to_section() {
        let section = Section::from_code_id("Core.3.4.1.4_c").unwrap();
        assert_eq!(section, Section::new(Document::Core, &[3, 4]));
        assert_eq!(section.to_string(), "Core.3.4");
    }

    #[test]
    fn code_without_numeric_path_maps_to_document() {
        assert_eq!(
            Section::from_code_id("General_a").unwrap(),
            Section::root(Document::General)
        );
        assert_eq!(
            Section::from_code_id("Schema").unwrap(),
            Section::root(Document::Schema)
        );
    }

    #[test]
    fn short_code_keeps_its_path() {
        assert_eq!(
            Section::from_code_id("Core.3.4_a").unwrap(),
            Section::new(Document::Core, &[3, 4])
        );
    }

    #[test]
    fn unknown_document_is_rejected() {
        assert!(Section::from_code_id("Metadata.2.4_a").is_none());
        assert!(Section::parse("Core.x").is_none());
    }

    #[test]
    fn nesting_follows_dotted_prefix() {
        let core = Section::root(Document::Core);
        let chapter = Section::new(Document::Core, &[3]);
        let section = Section::new(Document::Core, &[3, 4]);
        let other = Section::new(Document::Core, &[2, 3]);

        assert!(section.is_within(&chapter));
        assert!(section.is_within(&core));
        assert!(section.is_within(&section));
        assert!(!chapter.is_within(&section));
        assert!(!other.is_within(&chapter));
        assert!(!section.is_within(&Section::root(Document::Bindings)));
    }

    #[test]
    fn sections_order_by_document_then_path() {
        let mut sections = vec![
            Section::parse("Profiles.4.1").unwrap(),
            Section::parse("Core.3.4").unwrap(),
            Section::parse("Core.3").unwrap(),
            Section::parse("Core.1.3").unwrap(),
            Section::parse("General").unwrap(),
        ];
        sections.sort();
        let names: Vec<String> = sections.iter().map(ToString::to_string).collect();
        assert_eq!(
            names,
            ["General", "Core.1.3", "Core.3", "Core.3.4", "Profiles.4.1"]
        );
    }

    #[test]
    fn redirect_binding_has_title() {
        let section = Section::parse("Bindings.3.4").unwrap();
        assert_eq!(section.title(), Some("3.4 HTTP Redirect Binding"));
        assert_eq!(section.level(), 2);
    }
}
