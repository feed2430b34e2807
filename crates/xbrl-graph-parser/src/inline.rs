//! Inline XBRL (iXBRL) fact extraction
//!
//! Pulls facts out of an XHTML document through its `ix:` elements: hidden
//! and displayed facts, value construction with continuation chains and
//! `ix:exclude` subtrees, format transforms, scale and sign application,
//! tuples and footnote relationships.

use std::collections::{HashMap, HashSet};

use bigdecimal::num_bigint::BigInt;
use bigdecimal::BigDecimal;
use tracing::{info, warn};

use xbrl_graph_cache::HttpCache;
use xbrl_graph_core::{
    ns, Decimals, DocumentKind, Fact, FactId, FactValue, Footnote, InlineSource, Instance,
    Result, XbrlError, XbrlWarning,
};

use crate::instance::{parse_context, parse_unit, validate_fact};
use crate::resolver::TaxonomyResolver;
use crate::transforms;
use crate::xml::{join_url, XmlDocument, XmlElement, XmlNode};
use crate::ParserConfig;

/// Named HTML entities common in regulator XHTML that XML parsers reject.
/// XML's own five builtins pass through untouched.
const HTML_ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", "\u{a0}"),
    ("&shy;", "\u{ad}"),
    ("&ndash;", "\u{2013}"),
    ("&mdash;", "\u{2014}"),
    ("&lsquo;", "\u{2018}"),
    ("&rsquo;", "\u{2019}"),
    ("&ldquo;", "\u{201c}"),
    ("&rdquo;", "\u{201d}"),
    ("&bull;", "\u{2022}"),
    ("&hellip;", "\u{2026}"),
    ("&prime;", "\u{2032}"),
    ("&Prime;", "\u{2033}"),
    ("&sect;", "\u{a7}"),
    ("&copy;", "\u{a9}"),
    ("&reg;", "\u{ae}"),
    ("&trade;", "\u{2122}"),
    ("&deg;", "\u{b0}"),
    ("&cent;", "\u{a2}"),
    ("&pound;", "\u{a3}"),
    ("&euro;", "\u{20ac}"),
    ("&middot;", "\u{b7}"),
    ("&para;", "\u{b6}"),
    ("&times;", "\u{d7}"),
    ("&divide;", "\u{f7}"),
];

/// Replace named HTML entities so XHTML filings parse as XML.
pub fn decode_html_entities(text: &str) -> String {
    let mut out = text.to_string();
    for (entity, replacement) in HTML_ENTITIES {
        if out.contains(entity) {
            out = out.replace(entity, replacement);
        }
    }
    out
}

pub async fn parse_inline_instance(
    document: &XmlDocument,
    cache: &HttpCache,
    config: &ParserConfig,
) -> Result<Instance> {
    let url = &document.source_url;
    let ix = detect_ix_namespace(&document.root).ok_or_else(|| XbrlError::SchemaValidation {
        url: url.clone(),
        reason: "document carries no ix elements".to_string(),
    })?;

    let header = document
        .root
        .descendants()
        .into_iter()
        .find(|element| element.is(&ix, "header"))
        .ok_or_else(|| XbrlError::SchemaValidation {
            url: url.clone(),
            reason: "document has no ix:header".to_string(),
        })?;

    let schema_refs: Vec<String> = header
        .descendants()
        .into_iter()
        .filter(|element| element.is(ns::LINK, "schemaRef"))
        .filter_map(|element| {
            element
                .attr_ns(ns::XLINK, "href")
                .map(|href| join_url(&element.base, href))
        })
        .collect();
    if schema_refs.is_empty() {
        return Err(XbrlError::SchemaValidation {
            url: url.clone(),
            reason: "ix:header has no link:schemaRef".to_string(),
        });
    }

    let taxonomy = TaxonomyResolver::new(cache, config)
        .resolve(&schema_refs)
        .await?;

    let mut instance = Instance {
        source_url: url.clone(),
        kind: DocumentKind::InlineXbrl,
        schema_refs,
        contexts: HashMap::new(),
        units: HashMap::new(),
        facts: Vec::new(),
        footnotes: Vec::new(),
        taxonomy,
        warnings: Vec::new(),
    };

    // Contexts and units live under ix:header (ix:resources).
    for element in header.descendants() {
        if element.is(ns::XBRLI, "context") {
            let context = parse_context(element, url)?;
            instance.contexts.insert(context.id.clone(), context);
        } else if element.is(ns::XBRLI, "unit") {
            let unit = parse_unit(element, url)?;
            instance.units.insert(unit.id.clone(), unit);
        }
    }

    if config.cancellation.is_cancelled() {
        return Err(XbrlError::Cancelled);
    }
    let mut walker = InlineWalker {
        ix: &ix,
        url,
        config,
        continuations: collect_continuations(&document.root, &ix),
        tuples: Vec::new(),
        tuple_by_id: HashMap::new(),
        pending_tuple_refs: Vec::new(),
        facts_by_xml_id: HashMap::new(),
        member_seq: 0,
    };
    walker.walk(&document.root, &mut instance, None)?;
    walker.assemble_tuples(&mut instance);
    attach_footnotes(&document.root, &ix, &walker.facts_by_xml_id, &mut instance);

    info!(
        %url,
        facts = instance.facts.len(),
        contexts = instance.contexts.len(),
        "parsed inline XBRL document"
    );
    Ok(instance)
}

fn detect_ix_namespace(root: &XmlElement) -> Option<String> {
    root.descendants()
        .into_iter()
        .find(|element| {
            element.name.namespace == ns::IX || element.name.namespace == ns::IX_2008
        })
        .map(|element| element.name.namespace.clone())
}

fn collect_continuations<'a>(
    root: &'a XmlElement,
    ix: &str,
) -> HashMap<&'a str, &'a XmlElement> {
    let mut map = HashMap::new();
    for element in root.descendants() {
        if element.is(ix, "continuation") {
            if let Some(id) = element.attr("id") {
                map.insert(id, element);
            }
        }
    }
    map
}

/// A tuple fact under assembly: arena slot plus its ordered members.
struct TupleSlot {
    fact: FactId,
    members: Vec<(f64, usize, FactId)>,
}

struct InlineWalker<'a> {
    ix: &'a str,
    url: &'a str,
    config: &'a ParserConfig,
    continuations: HashMap<&'a str, &'a XmlElement>,
    tuples: Vec<TupleSlot>,
    tuple_by_id: HashMap<String, usize>,
    /// `(tupleRef, order, member)` resolved once the walk has seen all
    /// tupleID declarations.
    pending_tuple_refs: Vec<(String, f64, FactId)>,
    facts_by_xml_id: HashMap<String, FactId>,
    member_seq: usize,
}

impl<'a> InlineWalker<'a> {
    fn walk(
        &mut self,
        element: &'a XmlElement,
        instance: &mut Instance,
        current_tuple: Option<usize>,
    ) -> Result<()> {
        if element.name.namespace == self.ix {
            match element.name.local_name.as_str() {
                "nonFraction" | "nonNumeric" => {
                    if let Some(fact) = self.parse_inline_fact(element, instance)? {
                        self.record_membership(element, fact, current_tuple);
                    }
                    // Nested ix facts inside the displayed markup still count.
                    for child in element.elements() {
                        self.walk(child, instance, current_tuple)?;
                    }
                    return Ok(());
                }
                "tuple" => {
                    let slot = self.open_tuple(element, instance)?;
                    let fact = self.tuples[slot].fact;
                    self.record_membership(element, fact, current_tuple);
                    for child in element.elements() {
                        self.walk(child, instance, Some(slot))?;
                    }
                    return Ok(());
                }
                "header" => {
                    // Only the hidden section of the header carries facts;
                    // ix:references and ix:resources were consumed already.
                    if let Some(hidden) = element.find(self.ix, "hidden") {
                        for child in hidden.elements() {
                            self.walk(child, instance, current_tuple)?;
                        }
                    }
                    return Ok(());
                }
                // Continuation content is consumed by the fact that chains
                // to it; exclude subtrees carry no facts of their own.
                "continuation" | "exclude" => return Ok(()),
                _ => {}
            }
        }
        for child in element.elements() {
            self.walk(child, instance, current_tuple)?;
        }
        Ok(())
    }

    fn parse_inline_fact(
        &mut self,
        element: &'a XmlElement,
        instance: &mut Instance,
    ) -> Result<Option<FactId>> {
        let name_attr = element
            .attr("name")
            .ok_or_else(|| XbrlError::SchemaValidation {
                url: self.url.to_string(),
                reason: format!("{} without name attribute", element.name),
            })?;
        let qname =
            element
                .resolve_qname(name_attr)
                .ok_or_else(|| XbrlError::SchemaValidation {
                    url: self.url.to_string(),
                    reason: format!("unresolvable fact name {:?}", name_attr),
                })?;
        let concept_id = instance
            .taxonomy
            .concept_by_qname(&qname)
            .ok_or_else(|| XbrlError::UnknownConcept {
                qname: qname.clone(),
                url: self.url.to_string(),
            })?;
        let concept = instance.taxonomy.concept(concept_id).clone();

        let is_non_fraction = element.name.local_name == "nonFraction";
        let nil = element.attr_ns(ns::XSI, "nil") == Some("true");
        let format = element.attr("format").map(str::to_string);
        let scale: i32 = element
            .attr("scale")
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(0);
        let negated = element.attr("sign") == Some("-");

        let value = if nil {
            Ok(FactValue::Text(String::new()))
        } else {
            self.construct_value(element, is_non_fraction, format.as_deref(), scale, negated)
        };
        let value = match value {
            Ok(value) => value,
            Err(error @ (XbrlError::Transform { .. } | XbrlError::NumericParse { .. }))
                if self.config.lenient =>
            {
                warn!(url = self.url, concept = %concept.qname, %error, "skipping fact");
                instance.warnings.push(XbrlWarning::SkippedFact {
                    concept: concept.qname.clone(),
                    url: self.url.to_string(),
                    reason: error.to_string(),
                });
                return Ok(None);
            }
            Err(error) => return Err(error),
        };

        let context_ref = element
            .attr("contextRef")
            .ok_or_else(|| XbrlError::SchemaValidation {
                url: self.url.to_string(),
                reason: format!("fact {} has no contextRef", concept.qname),
            })?
            .to_string();
        let unit_ref = element.attr("unitRef").map(str::to_string);
        validate_fact(
            &concept,
            instance.contexts.get(&context_ref),
            &context_ref,
            unit_ref
                .as_deref()
                .map(|unit_ref| (unit_ref, instance.units.contains_key(unit_ref))),
            nil,
            self.url,
        )?;

        let fact = Fact {
            id: element.attr("id").map(str::to_string),
            concept: concept_id,
            context_ref: Some(context_ref),
            unit_ref,
            value,
            decimals: element.attr("decimals").and_then(Decimals::parse),
            precision: element.attr("precision").map(str::to_string),
            nil,
            lang: element.lang.clone(),
            footnotes: Vec::new(),
            inline: Some(InlineSource {
                scale,
                negated,
                format,
            }),
        };

        let id = FactId(instance.facts.len() as u32);
        if let Some(xml_id) = &fact.id {
            self.facts_by_xml_id.insert(xml_id.clone(), id);
        }
        instance.facts.push(fact);
        Ok(Some(id))
    }

    fn construct_value(
        &self,
        element: &'a XmlElement,
        is_non_fraction: bool,
        format: Option<&str>,
        scale: i32,
        negated: bool,
    ) -> Result<FactValue> {
        let raw = self.gather_value(element)?;
        let transformed = match format {
            Some(format) => {
                let local_name = element
                    .resolve_qname(format)
                    .map(|qname| qname.local_name)
                    .unwrap_or_else(|| {
                        format.rsplit(':').next().unwrap_or(format).to_string()
                    });
                transforms::apply(&local_name, &raw)?
            }
            None if is_non_fraction => raw.trim().to_string(),
            None => raw,
        };

        if is_non_fraction {
            Ok(FactValue::Numeric(finalize_numeric(
                &transformed,
                scale,
                negated,
            )?))
        } else {
            Ok(FactValue::Text(transformed))
        }
    }

    /// Descendant text plus continuation chain, cycles rejected.
    fn gather_value(&self, element: &'a XmlElement) -> Result<String> {
        let mut out = String::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut current = Some(element);
        while let Some(part) = current {
            gather_text(part, self.ix, &mut out);
            current = match part.attr("continuedAt") {
                Some(id) => {
                    if !visited.insert(id) {
                        return Err(XbrlError::SchemaValidation {
                            url: self.url.to_string(),
                            reason: format!("continuation cycle through {:?}", id),
                        });
                    }
                    Some(*self.continuations.get(id).ok_or_else(|| {
                        XbrlError::SchemaValidation {
                            url: self.url.to_string(),
                            reason: format!("missing ix:continuation {:?}", id),
                        }
                    })?)
                }
                None => None,
            };
        }
        Ok(out)
    }

    fn open_tuple(
        &mut self,
        element: &'a XmlElement,
        instance: &mut Instance,
    ) -> Result<usize> {
        let name_attr = element
            .attr("name")
            .ok_or_else(|| XbrlError::SchemaValidation {
                url: self.url.to_string(),
                reason: "ix:tuple without name attribute".to_string(),
            })?;
        let qname =
            element
                .resolve_qname(name_attr)
                .ok_or_else(|| XbrlError::SchemaValidation {
                    url: self.url.to_string(),
                    reason: format!("unresolvable tuple name {:?}", name_attr),
                })?;
        let concept_id = instance
            .taxonomy
            .concept_by_qname(&qname)
            .ok_or_else(|| XbrlError::UnknownConcept {
                qname,
                url: self.url.to_string(),
            })?;

        let fact = Fact {
            id: element.attr("id").map(str::to_string),
            concept: concept_id,
            context_ref: None,
            unit_ref: None,
            value: FactValue::Tuple(Vec::new()),
            decimals: None,
            precision: None,
            nil: false,
            lang: element.lang.clone(),
            footnotes: Vec::new(),
            inline: Some(InlineSource::default()),
        };
        let fact_id = FactId(instance.facts.len() as u32);
        if let Some(xml_id) = &fact.id {
            self.facts_by_xml_id.insert(xml_id.clone(), fact_id);
        }
        instance.facts.push(fact);

        let slot = self.tuples.len();
        self.tuples.push(TupleSlot {
            fact: fact_id,
            members: Vec::new(),
        });
        if let Some(tuple_id) = element.attr("tupleID") {
            self.tuple_by_id.insert(tuple_id.to_string(), slot);
        }
        Ok(slot)
    }

    fn record_membership(
        &mut self,
        element: &'a XmlElement,
        fact: FactId,
        current_tuple: Option<usize>,
    ) {
        let order: f64 = element
            .attr("order")
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(0.0);
        if let Some(tuple_ref) = element.attr("tupleRef") {
            self.pending_tuple_refs
                .push((tuple_ref.to_string(), order, fact));
        } else if let Some(slot) = current_tuple {
            let seq = self.member_seq;
            self.member_seq += 1;
            self.tuples[slot].members.push((order, seq, fact));
        }
    }

    /// Resolve deferred tupleRef memberships and write the ordered member
    /// lists into the tuple facts.
    fn assemble_tuples(&mut self, instance: &mut Instance) {
        let pending = std::mem::take(&mut self.pending_tuple_refs);
        for (tuple_ref, order, fact) in pending {
            match self.tuple_by_id.get(&tuple_ref) {
                Some(&slot) => {
                    let seq = self.member_seq;
                    self.member_seq += 1;
                    self.tuples[slot].members.push((order, seq, fact));
                }
                None => warn!(url = self.url, %tuple_ref, "tupleRef matches no tupleID"),
            }
        }

        for slot in &mut self.tuples {
            slot.members.sort_by(|a, b| {
                a.0.partial_cmp(&b.0)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.1.cmp(&b.1))
            });
            let members: Vec<FactId> = slot.members.iter().map(|&(_, _, fact)| fact).collect();
            instance.facts[slot.fact.index()].value = FactValue::Tuple(members);
        }
    }
}

/// Descendant text in document order, skipping `ix:exclude` subtrees.
fn gather_text(element: &XmlElement, ix: &str, out: &mut String) {
    for child in &element.children {
        match child {
            XmlNode::Text(text) => out.push_str(text),
            XmlNode::Element(child) => {
                if !child.is(ix, "exclude") {
                    gather_text(child, ix, out);
                }
            }
        }
    }
}

/// Parse the transformed text as a decimal, apply `10^scale` and sign, and
/// render the canonical plain string.
pub(crate) fn finalize_numeric(text: &str, scale: i32, negated: bool) -> Result<String> {
    let parsed: BigDecimal = text
        .trim()
        .parse()
        .map_err(|error| XbrlError::NumericParse {
            value: text.to_string(),
            reason: format!("{}", error),
        })?;
    let scaled = if scale != 0 {
        parsed * BigDecimal::new(BigInt::from(1), -(scale as i64))
    } else {
        parsed
    };
    let signed = if negated { -scaled } else { scaled };
    Ok(signed.normalized().to_string())
}

/// `ix:footnote` resources and `ix:relationship` arcs.
fn attach_footnotes(
    root: &XmlElement,
    ix: &str,
    facts_by_xml_id: &HashMap<String, FactId>,
    instance: &mut Instance,
) {
    let mut footnotes_by_id: HashMap<String, usize> = HashMap::new();
    for element in root.descendants() {
        if element.is(ix, "footnote") {
            let index = instance.footnotes.len();
            instance.footnotes.push(Footnote {
                lang: element.lang.clone(),
                role: element.attr_ns(ns::XLINK, "role").map(str::to_string),
                text: element.text_content(),
            });
            if let Some(id) = element.attr("footnoteID").or_else(|| element.attr("id")) {
                footnotes_by_id.insert(id.to_string(), index);
            }
        }
    }

    for element in root.descendants() {
        if !element.is(ix, "relationship") {
            continue;
        }
        let (Some(from_refs), Some(to_refs)) = (element.attr("fromRefs"), element.attr("toRefs"))
        else {
            continue;
        };
        let targets: Vec<usize> = to_refs
            .split_whitespace()
            .filter_map(|id| footnotes_by_id.get(id).copied())
            .collect();
        for fact_ref in from_refs.split_whitespace() {
            if let Some(&fact) = facts_by_xml_id.get(fact_ref) {
                instance.facts[fact.index()].footnotes.extend(&targets);
            }
        }
    }
}
