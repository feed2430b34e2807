//! Shared enums for type safety across the workspace

use serde::{Deserialize, Serialize};

use crate::ns;

/// Period type declared on a concept (`xbrli:periodType`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodType {
    Instant,
    Duration,
}

/// Balance attribute on monetary concepts (`xbrli:balance`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Balance {
    Debit,
    Credit,
}

/// Classification derived from a concept's substitution-group chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConceptKind {
    Item,
    Tuple,
    Dimension,
    Hypercube,
    /// Substitution group did not resolve to a known XBRL head element.
    Other,
}

/// Linkbase flavor; dispatches resource interpretation in the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkbaseType {
    Label,
    Presentation,
    Calculation,
    Definition,
    Reference,
    Generic,
}

impl LinkbaseType {
    /// Classify from the `xlink:role` on a `link:linkbaseRef`.
    pub fn from_ref_role(role: &str) -> Option<Self> {
        match role {
            ns::LINKBASE_REF_ROLE_LABEL => Some(Self::Label),
            ns::LINKBASE_REF_ROLE_PRESENTATION => Some(Self::Presentation),
            ns::LINKBASE_REF_ROLE_CALCULATION => Some(Self::Calculation),
            ns::LINKBASE_REF_ROLE_DEFINITION => Some(Self::Definition),
            ns::LINKBASE_REF_ROLE_REFERENCE => Some(Self::Reference),
            _ => None,
        }
    }

    /// Fallback classification from filename convention (`_lab.xml`, ...).
    pub fn from_filename(name: &str) -> Option<Self> {
        if name.contains("_lab") {
            Some(Self::Label)
        } else if name.contains("_pre") {
            Some(Self::Presentation)
        } else if name.contains("_cal") {
            Some(Self::Calculation)
        } else if name.contains("_def") {
            Some(Self::Definition)
        } else if name.contains("_ref") {
            Some(Self::Reference)
        } else {
            None
        }
    }
}

/// `xlink:use` on an arc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ArcUse {
    #[default]
    Optional,
    Prohibited,
}

/// Source document flavor detected from leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentKind {
    Xbrl,
    InlineXbrl,
}
