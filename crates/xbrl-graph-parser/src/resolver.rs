//! Taxonomy resolution: DTS discovery, concept registry, arc override
//!
//! Drives the cache and the schema/linkbase parsers to compute the
//! Discoverable Taxonomy Set reachable from the entry-point schema, then
//! materializes relationships and labels with XBRL 2.1 override and
//! prohibition semantics applied.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use tracing::{debug, info, warn};

use xbrl_graph_cache::HttpCache;
use xbrl_graph_core::models::taxonomy::{ConceptLabel, ConceptReference};
use xbrl_graph_core::{
    ns, ArcUse, Concept, ConceptId, ConceptKind, LinkbaseType, QName, Relationship, Resource,
    ResourcePayload, Result, Taxonomy, TaxonomySchema, XbrlError, XbrlWarning,
};

use crate::schema::parse_schema;
use crate::xml::{FetchXml, XmlDocument};
use crate::ParserConfig;

/// Work queue entries during DTS discovery.
#[derive(Debug)]
enum DtsEntry {
    Schema(String),
    Linkbase(String, LinkbaseType),
}

pub struct TaxonomyResolver<'a> {
    cache: &'a HttpCache,
    config: &'a ParserConfig,
}

/// A materialized arc before override processing.
struct TentativeArc {
    source: ConceptId,
    target: TentativeTarget,
    arcrole: String,
    role: String,
    order: f64,
    priority: i32,
    arc_use: ArcUse,
    weight: Option<f64>,
    preferred_label: Option<String>,
    /// Discovery sequence; breaks priority and order ties.
    seq: usize,
}

#[derive(Clone, Copy)]
enum TentativeTarget {
    Concept(ConceptId),
    Resource(usize),
}

impl<'a> TaxonomyResolver<'a> {
    pub fn new(cache: &'a HttpCache, config: &'a ParserConfig) -> Self {
        Self { cache, config }
    }

    /// Compute the DTS reachable from the entry-point schema URLs.
    pub async fn resolve(&self, entry_points: &[String]) -> Result<Taxonomy> {
        let (schemas, linkbases) = self.discover(entry_points).await?;
        info!(
            schemas = schemas.len(),
            linkbases = linkbases.len(),
            "DTS discovery complete"
        );

        let mut taxonomy = Taxonomy::new(self.config.reporting_lang.as_str());
        taxonomy.entry_points = entry_points.to_vec();

        self.register_concepts(&mut taxonomy, &schemas)?;
        classify_concepts(&mut taxonomy);
        materialize_relationships(&mut taxonomy, linkbases);
        detect_cycles(&mut taxonomy);
        taxonomy.finalize();

        Ok(taxonomy)
    }

    /// Breadth-first traversal of `import`/`include`/`linkbaseRef` edges
    /// with a visited-by-URL set; cycles are silently skipped and enqueue
    /// order is preserved.
    async fn discover(
        &self,
        entry_points: &[String],
    ) -> Result<(Vec<crate::schema::ParsedSchema>, Vec<xbrl_graph_core::Linkbase>)> {
        let mut queue: VecDeque<DtsEntry> = entry_points
            .iter()
            .map(|url| DtsEntry::Schema(url.clone()))
            .collect();
        let mut visited: HashSet<String> = HashSet::new();
        let mut schemas = Vec::new();
        let mut linkbases = Vec::new();

        while let Some(entry) = queue.pop_front() {
            if self.config.cancellation.is_cancelled() {
                return Err(XbrlError::Cancelled);
            }
            match entry {
                DtsEntry::Schema(url) => {
                    if !visited.insert(url.clone()) {
                        continue;
                    }
                    debug!(%url, "discovering schema");
                    let document = self.load(&url).await?;
                    let parsed = parse_schema(&document)?;
                    for import in &parsed.imports {
                        queue.push_back(DtsEntry::Schema(import.clone()));
                    }
                    for (linkbase_url, linkbase_type) in &parsed.linkbase_refs {
                        queue.push_back(DtsEntry::Linkbase(linkbase_url.clone(), *linkbase_type));
                    }
                    schemas.push(parsed);
                }
                DtsEntry::Linkbase(url, linkbase_type) => {
                    if !visited.insert(url.clone()) {
                        continue;
                    }
                    debug!(%url, ?linkbase_type, "discovering linkbase");
                    let document = self.load(&url).await?;
                    linkbases.push(crate::linkbase::parse_linkbase(&document, linkbase_type)?);
                }
            }
        }

        Ok((schemas, linkbases))
    }

    async fn load(&self, url: &str) -> Result<XmlDocument> {
        if url.starts_with("http://") || url.starts_with("https://") {
            self.cache.get_and_parse_xml(url).await
        } else {
            let text = tokio::fs::read_to_string(url).await?;
            XmlDocument::parse(&text, url)
        }
    }

    /// Build the `(namespace, name)` and `(url, id)` registries. A later
    /// declaration of a known qualified name is accepted only as a
    /// compatible restatement; anything else is fatal.
    fn register_concepts(
        &self,
        taxonomy: &mut Taxonomy,
        schemas: &[crate::schema::ParsedSchema],
    ) -> Result<()> {
        for parsed in schemas {
            let mut record = TaxonomySchema {
                target_namespace: parsed.target_namespace.clone(),
                source_url: parsed.source_url.clone(),
                preferred_prefix: parsed.preferred_prefix.clone(),
                concepts: Vec::new(),
                imports: parsed.imports.clone(),
                linkbase_refs: parsed.linkbase_refs.clone(),
            };

            for decl in &parsed.concepts {
                let mut qname =
                    QName::new(parsed.target_namespace.as_str(), decl.name.as_str());
                if let Some(prefix) = &parsed.preferred_prefix {
                    qname = qname.with_prefix(prefix.clone());
                }
                let candidate = Concept {
                    qname: qname.clone(),
                    xml_id: decl.xml_id.clone(),
                    source_url: parsed.source_url.clone(),
                    type_name: decl.type_name.clone(),
                    substitution_group: decl.substitution_group.clone(),
                    kind: ConceptKind::Other,
                    period_type: decl.period_type,
                    balance: decl.balance,
                    nillable: decl.nillable,
                    is_abstract: decl.is_abstract,
                    attributes: decl.attributes.clone(),
                };

                if let Some(existing) = taxonomy.concept_by_qname(&qname) {
                    if !taxonomy
                        .concept(existing)
                        .is_compatible_redeclaration(&candidate)
                    {
                        return Err(XbrlError::DuplicateConcept { qname });
                    }
                    if let Some(xml_id) = &decl.xml_id {
                        taxonomy.alias_href(&parsed.source_url, xml_id, existing);
                    }
                    record.concepts.push(existing);
                    continue;
                }

                let id = taxonomy.add_concept(candidate);
                record.concepts.push(id);
            }

            taxonomy.schemas.push(record);
        }
        Ok(())
    }
}

/// Finish substitution-group classification once every schema is present;
/// chains routinely cross schema files.
fn classify_concepts(taxonomy: &mut Taxonomy) {
    let count = taxonomy.concept_count();
    for index in 0..count {
        let id = ConceptId(index as u32);
        let mut group = taxonomy.concept(id).substitution_group.clone();
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut kind = ConceptKind::Other;

        while let Some(current) = group {
            if current.namespace == ns::XBRLDT && current.local_name == "dimensionItem" {
                kind = ConceptKind::Dimension;
                break;
            }
            if current.namespace == ns::XBRLDT && current.local_name == "hypercubeItem" {
                kind = ConceptKind::Hypercube;
                break;
            }
            if current.namespace == ns::XBRLI && current.local_name == "tuple" {
                kind = ConceptKind::Tuple;
                break;
            }
            if current.namespace == ns::XBRLI && current.local_name == "item" {
                kind = ConceptKind::Item;
                break;
            }
            if !seen.insert((current.namespace.clone(), current.local_name.clone())) {
                break;
            }
            group = taxonomy
                .concept_by_qname(&current)
                .and_then(|parent| taxonomy.concept(parent).substitution_group.clone());
        }

        taxonomy.concept_mut(id).kind = kind;
    }
}

/// Resolve arcs across every extended link, then apply override/prohibition
/// and attach the survivors as relationships, labels and references.
fn materialize_relationships(taxonomy: &mut Taxonomy, linkbases: Vec<xbrl_graph_core::Linkbase>) {
    let mut tentative: Vec<TentativeArc> = Vec::new();
    let mut resource_pool: Vec<(Resource, LinkbaseType)> = Vec::new();
    let mut seq = 0usize;

    for linkbase in &linkbases {
        for link in &linkbase.extended_links {
            // Link-local label maps. One label may bind several locators.
            let mut concept_labels: HashMap<&str, Vec<ConceptId>> = HashMap::new();
            for locator in &link.locators {
                match taxonomy.concept_by_href(&locator.href_url, &locator.fragment) {
                    Some(concept) => {
                        concept_labels
                            .entry(locator.label.as_str())
                            .or_default()
                            .push(concept);
                    }
                    None => {
                        warn!(
                            href = %format!("{}#{}", locator.href_url, locator.fragment),
                            url = %linkbase.source_url,
                            "locator resolves to no concept; arcs through it are skipped"
                        );
                        taxonomy.warnings.push(XbrlWarning::BrokenLocator {
                            href: format!("{}#{}", locator.href_url, locator.fragment),
                            url: linkbase.source_url.clone(),
                        });
                    }
                }
            }
            let mut resource_labels: HashMap<&str, Vec<usize>> = HashMap::new();
            for resource in &link.resources {
                resource_pool.push((resource.clone(), linkbase.linkbase_type));
                resource_labels
                    .entry(resource.label.as_str())
                    .or_default()
                    .push(resource_pool.len() - 1);
            }

            for arc in &link.arcs {
                let Some(sources) = concept_labels.get(arc.from.as_str()) else {
                    continue;
                };
                let concept_targets = concept_labels.get(arc.to.as_str());
                let resource_targets = resource_labels.get(arc.to.as_str());

                for &source in sources {
                    if let Some(targets) = concept_targets {
                        for &target in targets {
                            tentative.push(TentativeArc {
                                source,
                                target: TentativeTarget::Concept(target),
                                arcrole: arc.arcrole.clone(),
                                role: link.role.clone(),
                                order: arc.order,
                                priority: arc.priority,
                                arc_use: arc.arc_use,
                                weight: arc.weight,
                                preferred_label: arc.preferred_label.clone(),
                                seq,
                            });
                            seq += 1;
                        }
                    }
                    if let Some(targets) = resource_targets {
                        for &target in targets {
                            tentative.push(TentativeArc {
                                source,
                                target: TentativeTarget::Resource(target),
                                arcrole: arc.arcrole.clone(),
                                role: link.role.clone(),
                                order: arc.order,
                                priority: arc.priority,
                                arc_use: arc.arc_use,
                                weight: arc.weight,
                                preferred_label: arc.preferred_label.clone(),
                                seq,
                            });
                            seq += 1;
                        }
                    }
                }
            }
        }
    }

    taxonomy.linkbases = linkbases;

    // Group by the equivalence key; BTreeMap keeps processing deterministic.
    let mut groups: BTreeMap<(u32, String, String, String), Vec<usize>> = BTreeMap::new();
    for (index, arc) in tentative.iter().enumerate() {
        let target_key = match arc.target {
            TentativeTarget::Concept(concept) => format!("c:{}", concept.0),
            TentativeTarget::Resource(resource) => {
                format!("r:{}", resource_pool[resource].0.identity())
            }
        };
        groups
            .entry((
                arc.source.0,
                target_key,
                arc.arcrole.clone(),
                arc.role.clone(),
            ))
            .or_default()
            .push(index);
    }

    let mut survivors: Vec<usize> = Vec::new();
    for ((source, target_key, arcrole, _role), members) in &groups {
        let max_priority = members
            .iter()
            .map(|&index| tentative[index].priority)
            .max()
            .unwrap_or(0);
        let at_max: Vec<usize> = members
            .iter()
            .copied()
            .filter(|&index| tentative[index].priority == max_priority)
            .collect();

        // Any prohibition surviving at max priority discards the group.
        if at_max
            .iter()
            .any(|&index| tentative[index].arc_use == ArcUse::Prohibited)
        {
            debug!(%arcrole, target = %target_key, "relationship group prohibited");
            continue;
        }

        if at_max.len() > 1 {
            let source_qname = taxonomy.concept(ConceptId(*source)).qname.clone();
            taxonomy.warnings.push(XbrlWarning::AmbiguousOverride {
                source_qname,
                target: target_key.clone(),
                arcrole: arcrole.clone(),
            });
        }

        // First by discovery order wins among equal-priority survivors.
        if let Some(&winner) = at_max.iter().min_by_key(|&&index| tentative[index].seq) {
            survivors.push(winner);
        }
    }

    // Stable output: order by (source, arcrole, role, order, discovery seq).
    survivors.sort_by(|&a, &b| {
        let left = &tentative[a];
        let right = &tentative[b];
        (left.source.0, &left.arcrole, &left.role)
            .cmp(&(right.source.0, &right.arcrole, &right.role))
            .then(
                left.order
                    .partial_cmp(&right.order)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
            .then(left.seq.cmp(&right.seq))
    });

    for index in survivors {
        let arc = &tentative[index];
        match arc.target {
            TentativeTarget::Concept(target) => {
                taxonomy.relationships.push(Relationship {
                    source: arc.source,
                    target,
                    arcrole: arc.arcrole.clone(),
                    role: arc.role.clone(),
                    order: arc.order,
                    weight: arc.weight,
                    preferred_label: arc.preferred_label.clone(),
                });
            }
            TentativeTarget::Resource(resource) => {
                let (resource, linkbase_type) = &resource_pool[resource];
                attach_resource(taxonomy, arc.source, resource, *linkbase_type);
            }
        }
    }
}

fn attach_resource(
    taxonomy: &mut Taxonomy,
    concept: ConceptId,
    resource: &Resource,
    linkbase_type: LinkbaseType,
) {
    match &resource.payload {
        ResourcePayload::Label { text } => {
            taxonomy.labels.push(ConceptLabel {
                concept,
                role: resource
                    .role
                    .clone()
                    .unwrap_or_else(|| ns::ROLE_LABEL.to_string()),
                lang: resource.lang.clone().unwrap_or_default(),
                text: text.clone(),
            });
        }
        ResourcePayload::Reference { parts } => {
            taxonomy.references.push(ConceptReference {
                concept,
                role: resource.role.clone().unwrap_or_default(),
                parts: parts.clone(),
            });
        }
        ResourcePayload::Other { .. } => {
            debug!(?linkbase_type, "ignoring generic resource payload");
        }
    }
}

/// Flag cycles per `(arcrole, role)` network. Calculation cycles get their
/// own warning kind; presentation and definition cycles are tolerated in
/// data but flagged.
fn detect_cycles(taxonomy: &mut Taxonomy) {
    let mut networks: BTreeMap<(String, String), HashMap<ConceptId, Vec<ConceptId>>> =
        BTreeMap::new();
    for relationship in &taxonomy.relationships {
        networks
            .entry((relationship.arcrole.clone(), relationship.role.clone()))
            .or_default()
            .entry(relationship.source)
            .or_default()
            .push(relationship.target);
    }

    let mut warnings = Vec::new();
    for ((arcrole, role), adjacency) in &networks {
        if let Some(on_cycle) = find_cycle(adjacency) {
            let qname = taxonomy.concept(on_cycle).qname.clone();
            if arcrole == ns::ARCROLE_SUMMATION_ITEM {
                warn!(%qname, %role, "calculation cycle");
                warnings.push(XbrlWarning::CalculationCycle {
                    qname,
                    role: role.clone(),
                });
            } else {
                warn!(%qname, %arcrole, %role, "relationship cycle");
                warnings.push(XbrlWarning::RelationshipCycle {
                    qname,
                    arcrole: arcrole.clone(),
                    role: role.clone(),
                });
            }
        }
    }
    taxonomy.warnings.extend(warnings);
}

/// Iterative three-color DFS; returns a node on the first back edge found.
fn find_cycle(adjacency: &HashMap<ConceptId, Vec<ConceptId>>) -> Option<ConceptId> {
    #[derive(Clone, Copy, PartialEq)]
    enum Color {
        White,
        Gray,
        Black,
    }

    let mut colors: HashMap<ConceptId, Color> = HashMap::new();
    let mut roots: Vec<ConceptId> = adjacency.keys().copied().collect();
    roots.sort();

    for root in roots {
        if colors.get(&root).copied().unwrap_or(Color::White) != Color::White {
            continue;
        }
        // Stack of (node, next-child-index).
        let mut stack: Vec<(ConceptId, usize)> = vec![(root, 0)];
        colors.insert(root, Color::Gray);

        while let Some(top) = stack.len().checked_sub(1) {
            let (node, next) = stack[top];
            let children = adjacency.get(&node).map(Vec::as_slice).unwrap_or(&[]);
            if next < children.len() {
                stack[top].1 += 1;
                let child = children[next];
                match colors.get(&child).copied().unwrap_or(Color::White) {
                    Color::Gray => return Some(child),
                    Color::White => {
                        colors.insert(child, Color::Gray);
                        stack.push((child, 0));
                    }
                    Color::Black => {}
                }
            } else {
                colors.insert(node, Color::Black);
                stack.pop();
            }
        }
    }
    None
}
