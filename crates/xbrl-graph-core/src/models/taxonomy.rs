//! The resolved Discoverable Taxonomy Set

use std::collections::HashMap;

use crate::error::XbrlWarning;
use crate::models::concept::{Concept, ConceptId, TaxonomySchema};
use crate::models::linkbase::{Linkbase, Relationship};
use crate::ns;
use crate::qname::QName;

/// A label attached to a concept after override processing.
#[derive(Debug, Clone)]
pub struct ConceptLabel {
    pub concept: ConceptId,
    pub role: String,
    pub lang: String,
    pub text: String,
}

/// A reference resource attached to a concept.
#[derive(Debug, Clone)]
pub struct ConceptReference {
    pub concept: ConceptId,
    pub role: String,
    pub parts: Vec<(QName, String)>,
}

/// The transitive closure of schemas and linkbases from the entry point,
/// with every cross-file reference resolved.
///
/// Concepts live in an arena addressed by [`ConceptId`]; lookup maps are
/// maintained incrementally as the resolver registers concepts, and the
/// label/relationship indexes are built once by [`Taxonomy::finalize`] so
/// subsequent lookups are constant-time on average.
#[derive(Debug, Default)]
pub struct Taxonomy {
    pub entry_points: Vec<String>,
    /// Schemas in discovery order.
    pub schemas: Vec<TaxonomySchema>,
    /// Linkbases in discovery order.
    pub linkbases: Vec<Linkbase>,
    pub relationships: Vec<Relationship>,
    pub labels: Vec<ConceptLabel>,
    pub references: Vec<ConceptReference>,
    pub warnings: Vec<XbrlWarning>,
    /// Language used by the final label fallback step.
    pub reporting_lang: String,

    concepts: Vec<Concept>,
    by_qname: HashMap<(String, String), ConceptId>,
    by_href: HashMap<(String, String), ConceptId>,
    label_index: HashMap<(ConceptId, String, String), Vec<usize>>,
    labels_by_concept: HashMap<ConceptId, Vec<usize>>,
    references_by_concept: HashMap<ConceptId, Vec<usize>>,
    children_index: HashMap<(ConceptId, String, String), Vec<usize>>,
    parents_index: HashMap<(ConceptId, String, String), Vec<usize>>,
}

impl Taxonomy {
    pub fn new(reporting_lang: impl Into<String>) -> Self {
        Self {
            reporting_lang: reporting_lang.into(),
            ..Self::default()
        }
    }

    /// Register a concept, maintaining the qname and href registries.
    /// Callers decide duplicate policy before registering.
    pub fn add_concept(&mut self, concept: Concept) -> ConceptId {
        let id = ConceptId(self.concepts.len() as u32);
        self.by_qname.insert(
            (
                concept.qname.namespace.clone(),
                concept.qname.local_name.clone(),
            ),
            id,
        );
        if let Some(xml_id) = &concept.xml_id {
            self.by_href
                .insert((concept.source_url.clone(), xml_id.clone()), id);
        }
        self.concepts.push(concept);
        id
    }

    /// Bind an additional `(schema URL, xml id)` pair to an existing
    /// concept, for compatible redeclarations in extension schemas.
    pub fn alias_href(&mut self, url: &str, xml_id: &str, concept: ConceptId) {
        self.by_href
            .insert((url.to_string(), xml_id.to_string()), concept);
    }

    pub fn concept(&self, id: ConceptId) -> &Concept {
        &self.concepts[id.index()]
    }

    pub fn concept_mut(&mut self, id: ConceptId) -> &mut Concept {
        &mut self.concepts[id.index()]
    }

    pub fn concepts(&self) -> impl Iterator<Item = (ConceptId, &Concept)> {
        self.concepts
            .iter()
            .enumerate()
            .map(|(index, concept)| (ConceptId(index as u32), concept))
    }

    pub fn concept_count(&self) -> usize {
        self.concepts.len()
    }

    pub fn concept_by_qname(&self, qname: &QName) -> Option<ConceptId> {
        self.concept_by_parts(&qname.namespace, &qname.local_name)
    }

    pub fn concept_by_parts(&self, namespace: &str, local_name: &str) -> Option<ConceptId> {
        self.by_qname
            .get(&(namespace.to_string(), local_name.to_string()))
            .copied()
    }

    /// Resolve a linkbase locator target: schema URL plus XML id fragment.
    pub fn concept_by_href(&self, url: &str, fragment: &str) -> Option<ConceptId> {
        self.by_href
            .get(&(url.to_string(), fragment.to_string()))
            .copied()
    }

    /// Build the lookup indexes. Called once after resolution; relationships
    /// and labels registered later are not indexed.
    pub fn finalize(&mut self) {
        self.label_index.clear();
        self.labels_by_concept.clear();
        for (index, label) in self.labels.iter().enumerate() {
            self.label_index
                .entry((label.concept, label.role.clone(), label.lang.clone()))
                .or_default()
                .push(index);
            self.labels_by_concept
                .entry(label.concept)
                .or_default()
                .push(index);
        }

        self.references_by_concept.clear();
        for (index, reference) in self.references.iter().enumerate() {
            self.references_by_concept
                .entry(reference.concept)
                .or_default()
                .push(index);
        }

        self.children_index.clear();
        self.parents_index.clear();
        for (index, relationship) in self.relationships.iter().enumerate() {
            self.children_index
                .entry((
                    relationship.source,
                    relationship.arcrole.clone(),
                    relationship.role.clone(),
                ))
                .or_default()
                .push(index);
            self.parents_index
                .entry((
                    relationship.target,
                    relationship.arcrole.clone(),
                    relationship.role.clone(),
                ))
                .or_default()
                .push(index);
        }
    }

    /// Label lookup with the documented fallback chain: exact `(role, lang)`,
    /// then `(standard label, lang)`, then any label in `lang`, then the
    /// standard label in the reporting language, then the first available.
    pub fn label(&self, concept: ConceptId, role: &str, lang: &str) -> Option<&str> {
        if let Some(text) = self.label_exact(concept, role, lang) {
            return Some(text);
        }
        if role != ns::ROLE_LABEL {
            if let Some(text) = self.label_exact(concept, ns::ROLE_LABEL, lang) {
                return Some(text);
            }
        }
        let all = self.labels_by_concept.get(&concept)?;
        if let Some(&index) = all.iter().find(|&&index| self.labels[index].lang == lang) {
            return Some(self.labels[index].text.as_str());
        }
        if let Some(text) = self.label_exact(concept, ns::ROLE_LABEL, &self.reporting_lang) {
            return Some(text);
        }
        all.first().map(|&index| self.labels[index].text.as_str())
    }

    fn label_exact(&self, concept: ConceptId, role: &str, lang: &str) -> Option<&str> {
        self.label_index
            .get(&(concept, role.to_string(), lang.to_string()))
            .and_then(|indexes| indexes.first())
            .map(|&index| self.labels[index].text.as_str())
    }

    /// All labels of a concept as `(role, lang, text)`.
    pub fn labels_for(&self, concept: ConceptId) -> Vec<(&str, &str, &str)> {
        self.labels_by_concept
            .get(&concept)
            .map(|indexes| {
                indexes
                    .iter()
                    .map(|&index| {
                        let label = &self.labels[index];
                        (label.role.as_str(), label.lang.as_str(), label.text.as_str())
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Reference resources of a concept as `(role, parts)`.
    pub fn references_for(&self, concept: ConceptId) -> Vec<(&str, &[(QName, String)])> {
        self.references_by_concept
            .get(&concept)
            .map(|indexes| {
                indexes
                    .iter()
                    .map(|&index| {
                        let reference = &self.references[index];
                        (reference.role.as_str(), reference.parts.as_slice())
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Relationships with the concept as source, ordered by `order` with
    /// discovery-order tie-breaks.
    pub fn children(&self, concept: ConceptId, arcrole: &str, role: &str) -> Vec<&Relationship> {
        self.children_index
            .get(&(concept, arcrole.to_string(), role.to_string()))
            .map(|indexes| {
                indexes
                    .iter()
                    .map(|&index| &self.relationships[index])
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Relationships with the concept as target.
    pub fn parents(&self, concept: ConceptId, arcrole: &str, role: &str) -> Vec<&Relationship> {
        self.parents_index
            .get(&(concept, arcrole.to_string(), role.to_string()))
            .map(|indexes| {
                indexes
                    .iter()
                    .map(|&index| &self.relationships[index])
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Extended-link roles present across resolved relationships for an
    /// arcrole, in first-seen order.
    pub fn roles_for_arcrole(&self, arcrole: &str) -> Vec<&str> {
        let mut roles: Vec<&str> = Vec::new();
        for relationship in &self.relationships {
            if relationship.arcrole == arcrole && !roles.contains(&relationship.role.as_str()) {
                roles.push(&relationship.role);
            }
        }
        roles
    }
}
