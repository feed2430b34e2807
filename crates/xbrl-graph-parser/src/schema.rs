//! Taxonomy schema (`.xsd`) parsing
//!
//! Extracts concept declarations, `xs:import`/`xs:include` edges and
//! `link:linkbaseRef` edges from one schema file. Substitution-group
//! classification is finished by the resolver once every schema in the DTS
//! is available, because chains routinely cross file boundaries.

use std::collections::BTreeMap;

use xbrl_graph_core::{ns, Balance, LinkbaseType, PeriodType, QName, Result, XbrlError};

use crate::xml::{join_url, XmlDocument, XmlElement};

/// One `xs:element` concept declaration, unresolved.
#[derive(Debug, Clone)]
pub struct ConceptDecl {
    pub xml_id: Option<String>,
    pub name: String,
    pub type_name: Option<QName>,
    pub substitution_group: Option<QName>,
    pub period_type: Option<PeriodType>,
    pub balance: Option<Balance>,
    pub is_abstract: bool,
    pub nillable: bool,
    pub attributes: BTreeMap<QName, String>,
}

/// Output of parsing one schema file.
#[derive(Debug)]
pub struct ParsedSchema {
    pub target_namespace: String,
    pub source_url: String,
    pub preferred_prefix: Option<String>,
    pub concepts: Vec<ConceptDecl>,
    /// `xs:import` and `xs:include` targets, absolute.
    pub imports: Vec<String>,
    pub linkbase_refs: Vec<(String, LinkbaseType)>,
}

/// Attributes consumed into typed `ConceptDecl` fields; everything else is
/// carried as an extension attribute.
fn is_standard_attribute(name: &QName) -> bool {
    (name.namespace.is_empty()
        && matches!(
            name.local_name.as_str(),
            "name" | "id" | "type" | "substitutionGroup" | "abstract" | "nillable"
        ))
        || (name.namespace == ns::XBRLI
            && matches!(name.local_name.as_str(), "periodType" | "balance"))
}

pub fn parse_schema(document: &XmlDocument) -> Result<ParsedSchema> {
    let root = &document.root;
    if !root.is(ns::XS, "schema") {
        return Err(XbrlError::SchemaValidation {
            url: document.source_url.clone(),
            reason: format!("expected xs:schema root, found {}", root.name),
        });
    }

    let target_namespace = root.attr("targetNamespace").unwrap_or("").to_string();
    let preferred_prefix = root
        .scope
        .prefix_for(&target_namespace)
        .map(str::to_string);

    let mut schema = ParsedSchema {
        target_namespace,
        source_url: document.source_url.clone(),
        preferred_prefix,
        concepts: Vec::new(),
        imports: Vec::new(),
        linkbase_refs: Vec::new(),
    };

    for child in root.elements() {
        if child.is(ns::XS, "import") || child.is(ns::XS, "include") {
            if let Some(location) = child.attr("schemaLocation") {
                schema.imports.push(join_url(&child.base, location));
            }
        } else if child.is(ns::XS, "element") {
            if let Some(concept) = parse_element_decl(child) {
                schema.concepts.push(concept);
            }
        }
    }

    // linkbaseRefs sit under xs:annotation/xs:appinfo.
    for element in root.descendants() {
        if element.is(ns::LINK, "linkbaseRef") {
            if let Some(href) = element.attr_ns(ns::XLINK, "href") {
                let url = join_url(&element.base, href);
                let linkbase_type = element
                    .attr_ns(ns::XLINK, "role")
                    .and_then(LinkbaseType::from_ref_role)
                    .or_else(|| LinkbaseType::from_filename(&url))
                    .unwrap_or(LinkbaseType::Label);
                schema.linkbase_refs.push((url, linkbase_type));
            }
        }
    }

    Ok(schema)
}

fn parse_element_decl(element: &XmlElement) -> Option<ConceptDecl> {
    // Declarations by reference carry no concept of their own.
    let name = element.attr("name")?.to_string();

    let period_type = match element.attr_ns(ns::XBRLI, "periodType") {
        Some("instant") => Some(PeriodType::Instant),
        Some("duration") => Some(PeriodType::Duration),
        _ => None,
    };
    let balance = match element.attr_ns(ns::XBRLI, "balance") {
        Some("debit") => Some(Balance::Debit),
        Some("credit") => Some(Balance::Credit),
        _ => None,
    };

    let attributes = element
        .attributes
        .iter()
        .filter(|(name, _)| !is_standard_attribute(name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();

    Some(ConceptDecl {
        xml_id: element.attr("id").map(str::to_string),
        name,
        type_name: element
            .attr("type")
            .and_then(|value| element.resolve_qname(value)),
        substitution_group: element
            .attr("substitutionGroup")
            .and_then(|value| element.resolve_qname(value)),
        period_type,
        balance,
        is_abstract: element.attr("abstract") == Some("true"),
        nillable: element.attr("nillable") == Some("true"),
        attributes,
    })
}
