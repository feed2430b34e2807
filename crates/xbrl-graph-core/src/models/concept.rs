//! Concept declarations and taxonomy schemas

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::enums::{Balance, ConceptKind, LinkbaseType, PeriodType};
use crate::qname::QName;

/// Arena handle for a concept within a resolved taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConceptId(pub u32);

impl ConceptId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// XML Schema item types whose facts carry numeric values and require units.
const NUMERIC_TYPE_NAMES: &[&str] = &[
    "monetaryItemType",
    "sharesItemType",
    "pureItemType",
    "decimalItemType",
    "floatItemType",
    "doubleItemType",
    "integerItemType",
    "nonNegativeIntegerItemType",
    "nonPositiveIntegerItemType",
    "positiveIntegerItemType",
    "negativeIntegerItemType",
    "intItemType",
    "longItemType",
    "shortItemType",
    "byteItemType",
    "unsignedIntItemType",
    "unsignedLongItemType",
    "percentItemType",
    "perShareItemType",
    "perUnitItemType",
    "energyItemType",
    "powerItemType",
    "massItemType",
    "volumeItemType",
    "areaItemType",
    "lengthItemType",
    "memoryItemType",
    "fractionItemType",
    "decimal",
    "float",
    "double",
    "integer",
    "int",
    "long",
    "short",
    "nonNegativeInteger",
    "positiveInteger",
];

/// A declared reportable element.
///
/// Created when its owning schema is parsed and immutable thereafter; the
/// taxonomy arena owns it for the lifetime of the DTS.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Concept {
    pub qname: QName,
    /// XML `id` attribute, the target of linkbase locator fragments.
    pub xml_id: Option<String>,
    /// URL of the schema that declared this concept.
    pub source_url: String,
    pub type_name: Option<QName>,
    pub substitution_group: Option<QName>,
    pub kind: ConceptKind,
    pub period_type: Option<PeriodType>,
    pub balance: Option<Balance>,
    pub nillable: bool,
    pub is_abstract: bool,
    /// Arbitrary extension attributes carried verbatim from the declaration.
    pub attributes: BTreeMap<QName, String>,
}

impl Concept {
    /// Whether facts of this concept carry numeric values (and so require a
    /// unit). Decided from the declared type's local name.
    pub fn is_numeric(&self) -> bool {
        match &self.type_name {
            Some(type_name) => NUMERIC_TYPE_NAMES
                .iter()
                .any(|candidate| type_name.local_name == *candidate),
            None => false,
        }
    }

    /// Whether two declarations of the same qualified name are a compatible
    /// restatement (the extension-taxonomy case) rather than a conflict.
    pub fn is_compatible_redeclaration(&self, other: &Concept) -> bool {
        self.type_name == other.type_name
            && self.substitution_group == other.substitution_group
            && self.period_type == other.period_type
            && self.balance == other.balance
            && self.is_abstract == other.is_abstract
    }
}

/// One parsed taxonomy schema file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomySchema {
    pub target_namespace: String,
    pub source_url: String,
    /// Prefix bound to the target namespace in the declaring document, kept
    /// for rendering concept names.
    pub preferred_prefix: Option<String>,
    /// Concepts declared by this schema, in document order.
    pub concepts: Vec<ConceptId>,
    /// `xs:import` / `xs:include` targets, resolved to absolute URLs.
    pub imports: Vec<String>,
    /// `link:linkbaseRef` targets with their classified type.
    pub linkbase_refs: Vec<(String, LinkbaseType)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concept(type_local: &str) -> Concept {
        Concept {
            qname: QName::new("http://fasb.org/us-gaap/2020", "Assets"),
            xml_id: Some("us-gaap_Assets".into()),
            source_url: "https://xbrl.fasb.org/us-gaap/2020/elts/us-gaap-2020-01-31.xsd".into(),
            type_name: Some(QName::new(crate::ns::XBRLI, type_local)),
            substitution_group: Some(QName::new(crate::ns::XBRLI, "item")),
            kind: ConceptKind::Item,
            period_type: Some(PeriodType::Instant),
            balance: Some(Balance::Debit),
            nillable: true,
            is_abstract: false,
            attributes: BTreeMap::new(),
        }
    }

    #[test]
    fn monetary_items_are_numeric() {
        assert!(concept("monetaryItemType").is_numeric());
        assert!(concept("sharesItemType").is_numeric());
        assert!(!concept("stringItemType").is_numeric());
        assert!(!concept("dateItemType").is_numeric());
    }

    #[test]
    fn compatible_redeclaration_requires_identical_shape() {
        let a = concept("monetaryItemType");
        let b = concept("monetaryItemType");
        assert!(a.is_compatible_redeclaration(&b));

        let mut c = concept("monetaryItemType");
        c.period_type = Some(PeriodType::Duration);
        assert!(!a.is_compatible_redeclaration(&c));
    }
}
