//! Enumerated SAML specification clauses.
//!
//! Each [`SpecCode`] names one normative statement. The identifier has the
//! form `<Document>.<Section>[_<suffix>]`, where the suffix distinguishes
//! several statements within the same numbered paragraph.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::messages::MESSAGES;
use crate::section::{Document, Section};

macro_rules! spec_codes {
    ($($variant:ident => $id:literal,)+) => {
        /// A normative SAML clause. Variant names mirror the identifier with
        /// dots replaced by underscores.
        #[allow(non_camel_case_types, missing_docs)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum SpecCode {
            $($variant,)+
        }

        impl SpecCode {
            /// Every declared code, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant,)+];

            /// Dotted identifier, e.g. `Core.3.4.1.4_c`.
            #[must_use]
            pub const fn id(self) -> &'static str {
                match self {
                    $(Self::$variant => $id,)+
                }
            }
        }
    };
}

spec_codes! {
    General_a => "General_a",
    Schema => "Schema",

    Core_1_3_1_a => "Core.1.3.1_a",
    Core_1_3_2_a => "Core.1.3.2_a",
    Core_1_3_3_a => "Core.1.3.3_a",
    Core_1_3_4_a => "Core.1.3.4_a",
    Core_2_3_3_a => "Core.2.3.3_a",
    Core_2_3_3_b => "Core.2.3.3_b",
    Core_2_3_3_c => "Core.2.3.3_c",
    Core_2_3_3_d => "Core.2.3.3_d",
    Core_2_3_3_e => "Core.2.3.3_e",
    Core_2_5_1_b => "Core.2.5.1_b",
    Core_2_5_1_c => "Core.2.5.1_c",
    Core_2_5_1_2_a => "Core.2.5.1.2_a",
    Core_2_7_2_a => "Core.2.7.2_a",
    Core_2_7_3_a => "Core.2.7.3_a",
    Core_3_2_2_a => "Core.3.2.2_a",
    Core_3_2_2_b => "Core.3.2.2_b",
    Core_3_2_2_c => "Core.3.2.2_c",
    Core_3_2_2_d => "Core.3.2.2_d",
    Core_3_2_2_e => "Core.3.2.2_e",
    Core_3_2_2_2_a => "Core.3.2.2.2_a",
    Core_3_3_2_3_a => "Core.3.3.2.3_a",
    Core_3_4_a => "Core.3.4_a",
    Core_3_4_1_4_a => "Core.3.4.1.4_a",
    Core_3_4_1_4_c => "Core.3.4.1.4_c",
    Core_3_4_1_4_d => "Core.3.4.1.4_d",
    Core_3_4_1_4_e => "Core.3.4.1.4_e",
    Core_3_7_1_a => "Core.3.7.1_a",
    Core_3_7_1_b => "Core.3.7.1_b",
    Core_4_1_2_a => "Core.4.1.2_a",
    Core_4_2_a => "Core.4.2_a",
    Core_5_4_2_a => "Core.5.4.2_a",
    Core_8_2_2_a => "Core.8.2.2_a",
    Core_8_2_3_a => "Core.8.2.3_a",
    Core_8_3_2_a => "Core.8.3.2_a",
    Core_8_3_6_a => "Core.8.3.6_a",
    Core_8_3_6_b => "Core.8.3.6_b",
    Core_8_3_7_a => "Core.8.3.7_a",
    Core_8_3_7_b => "Core.8.3.7_b",
    Core_8_3_8_a => "Core.8.3.8_a",

    Bindings_3_1_2_1_a => "Bindings.3.1.2.1_a",
    Bindings_3_4_3_a => "Bindings.3.4.3_a",
    Bindings_3_4_3_b => "Bindings.3.4.3_b",
    Bindings_3_4_4_a => "Bindings.3.4.4_a",
    Bindings_3_4_4_b => "Bindings.3.4.4_b",
    Bindings_3_4_4_1_a => "Bindings.3.4.4.1_a",
    Bindings_3_4_4_1_b => "Bindings.3.4.4.1_b",
    Bindings_3_4_4_1_c => "Bindings.3.4.4.1_c",
    Bindings_3_4_4_1_d => "Bindings.3.4.4.1_d",
    Bindings_3_4_4_1_e => "Bindings.3.4.4.1_e",
    Bindings_3_4_4_1_f => "Bindings.3.4.4.1_f",
    Bindings_3_4_4_1_g => "Bindings.3.4.4.1_g",
    Bindings_3_4_5_2_a => "Bindings.3.4.5.2_a",
    Bindings_3_4_6_a => "Bindings.3.4.6_a",
    Bindings_3_5_3_a => "Bindings.3.5.3_a",
    Bindings_3_5_3_b => "Bindings.3.5.3_b",
    Bindings_3_5_4_a => "Bindings.3.5.4_a",
    Bindings_3_5_4_b => "Bindings.3.5.4_b",
    Bindings_3_5_5_2_a => "Bindings.3.5.5.2_a",
    Bindings_3_5_6_a => "Bindings.3.5.6_a",

    Profiles_4_1_2_a => "Profiles.4.1.2_a",
    Profiles_4_1_4_2_a => "Profiles.4.1.4.2_a",
    Profiles_4_1_4_2_b => "Profiles.4.1.4.2_b",
    Profiles_4_1_4_2_c => "Profiles.4.1.4.2_c",
    Profiles_4_1_4_2_e => "Profiles.4.1.4.2_e",
    Profiles_4_1_4_2_f => "Profiles.4.1.4.2_f",
    Profiles_4_1_4_2_g => "Profiles.4.1.4.2_g",
    Profiles_4_1_4_2_h => "Profiles.4.1.4.2_h",
    Profiles_4_1_4_2_i => "Profiles.4.1.4.2_i",
    Profiles_4_1_4_2_j => "Profiles.4.1.4.2_j",
    Profiles_4_1_4_5_a => "Profiles.4.1.4.5_a",
    Profiles_4_4_4_1_a => "Profiles.4.4.4.1_a",
    Profiles_4_4_4_1_b => "Profiles.4.4.4.1_b",
    Profiles_4_4_4_2_a => "Profiles.4.4.4.2_a",
    Profiles_4_4_4_2_b => "Profiles.4.4.4.2_b",
}

impl SpecCode {
    /// Looks a code up by its dotted identifier.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|code| code.id() == id)
    }

    /// Section this code is aggregated under in the report.
    #[must_use]
    pub fn section(self) -> Section {
        Section::from_code_id(self.id()).unwrap_or(Section::root(Document::General))
    }

    /// Document the clause belongs to.
    #[must_use]
    pub fn document(self) -> Document {
        self.section().document()
    }

    /// Human description from the compiled-in message table.
    #[must_use]
    pub fn message(self) -> Option<&'static str> {
        MESSAGES
            .iter()
            .find(|(code, _)| *code == self)
            .map(|(_, text)| *text)
    }

    /// Description, falling back to the identifier.
    #[must_use]
    pub fn describe(self) -> &'static str {
        self.message().unwrap_or(self.id())
    }
}

impl fmt::Display for SpecCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl Serialize for SpecCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.id())
    }
}
