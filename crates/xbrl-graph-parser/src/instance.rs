//! Classic XBRL (XML) instance parsing
//!
//! Contexts, units, facts and footnotes from an `<xbrli:xbrl>` document.
//! The context/unit/validation helpers are shared with the iXBRL parser,
//! which meets the same structures inside `ix:header`.

use std::collections::HashMap;

use tracing::info;

use xbrl_graph_cache::HttpCache;
use xbrl_graph_core::{
    ns, Concept, Context, Decimals, DimensionMember, DocumentKind, Entity, Fact, FactId,
    FactValue, Footnote, Instance, Period, Result, Unit, UnitMeasure, XbrlError,
};

use crate::resolver::TaxonomyResolver;
use crate::xml::{join_url, XmlDocument, XmlElement};
use crate::ParserConfig;

pub async fn parse_xbrl_instance(
    document: &XmlDocument,
    cache: &HttpCache,
    config: &ParserConfig,
) -> Result<Instance> {
    let root = &document.root;
    let url = &document.source_url;
    if !root.is(ns::XBRLI, "xbrl") {
        return Err(XbrlError::SchemaValidation {
            url: url.clone(),
            reason: format!("expected xbrli:xbrl root, found {}", root.name),
        });
    }

    let schema_refs: Vec<String> = root
        .find_all(ns::LINK, "schemaRef")
        .filter_map(|element| element.attr_ns(ns::XLINK, "href"))
        .map(|href| join_url(&root.base, href))
        .collect();
    if schema_refs.is_empty() {
        return Err(XbrlError::SchemaValidation {
            url: url.clone(),
            reason: "instance has no link:schemaRef".to_string(),
        });
    }

    let taxonomy = TaxonomyResolver::new(cache, config)
        .resolve(&schema_refs)
        .await?;

    let mut instance = Instance {
        source_url: url.clone(),
        kind: DocumentKind::Xbrl,
        schema_refs,
        contexts: HashMap::new(),
        units: HashMap::new(),
        facts: Vec::new(),
        footnotes: Vec::new(),
        taxonomy,
        warnings: Vec::new(),
    };

    for element in root.find_all(ns::XBRLI, "context") {
        let context = parse_context(element, url)?;
        instance.contexts.insert(context.id.clone(), context);
    }
    for element in root.find_all(ns::XBRLI, "unit") {
        let unit = parse_unit(element, url)?;
        instance.units.insert(unit.id.clone(), unit);
    }

    // Every remaining top-level element is a fact.
    if config.cancellation.is_cancelled() {
        return Err(XbrlError::Cancelled);
    }
    let mut fact_xml_ids: HashMap<String, FactId> = HashMap::new();
    for element in root.elements() {
        if element.name.namespace == ns::LINK
            || (element.name.namespace == ns::XBRLI
                && matches!(element.name.local_name.as_str(), "context" | "unit"))
        {
            continue;
        }
        parse_fact_element(element, &mut instance, &mut fact_xml_ids, url)?;
    }

    for link in root.find_all(ns::LINK, "footnoteLink") {
        parse_footnote_link(link, &mut instance, &fact_xml_ids);
    }

    info!(
        %url,
        facts = instance.facts.len(),
        contexts = instance.contexts.len(),
        units = instance.units.len(),
        "parsed XBRL instance"
    );
    Ok(instance)
}

/// Parse one `xbrli:context`.
pub(crate) fn parse_context(element: &XmlElement, url: &str) -> Result<Context> {
    let id = element
        .attr("id")
        .ok_or_else(|| XbrlError::SchemaValidation {
            url: url.to_string(),
            reason: "context without id".to_string(),
        })?
        .to_string();

    let entity_element =
        element
            .find(ns::XBRLI, "entity")
            .ok_or_else(|| XbrlError::SchemaValidation {
                url: url.to_string(),
                reason: format!("context {} has no entity", id),
            })?;
    let identifier =
        entity_element
            .find(ns::XBRLI, "identifier")
            .ok_or_else(|| XbrlError::SchemaValidation {
                url: url.to_string(),
                reason: format!("context {} has no entity identifier", id),
            })?;
    let entity = Entity {
        scheme: identifier.attr("scheme").unwrap_or("").to_string(),
        identifier: identifier.text_content().trim().to_string(),
    };

    let period_element =
        element
            .find(ns::XBRLI, "period")
            .ok_or_else(|| XbrlError::SchemaValidation {
                url: url.to_string(),
                reason: format!("context {} has no period", id),
            })?;
    let period = parse_period(period_element, &id, url)?;

    let segment = entity_element
        .find(ns::XBRLI, "segment")
        .map(|segment| parse_members(segment, url))
        .transpose()?
        .unwrap_or_default();
    let scenario = element
        .find(ns::XBRLI, "scenario")
        .map(|scenario| parse_members(scenario, url))
        .transpose()?
        .unwrap_or_default();

    Ok(Context {
        id,
        entity,
        period,
        segment,
        scenario,
    })
}

fn parse_period(element: &XmlElement, context_id: &str, url: &str) -> Result<Period> {
    if element.find(ns::XBRLI, "forever").is_some() {
        return Ok(Period::Forever);
    }
    if let Some(instant) = element.find(ns::XBRLI, "instant") {
        return Ok(Period::Instant(parse_date(&instant.text_content(), url)?));
    }
    let start = element.find(ns::XBRLI, "startDate");
    let end = element.find(ns::XBRLI, "endDate");
    match (start, end) {
        (Some(start), Some(end)) => Ok(Period::Duration {
            start: parse_date(&start.text_content(), url)?,
            end: parse_date(&end.text_content(), url)?,
        }),
        _ => Err(XbrlError::SchemaValidation {
            url: url.to_string(),
            reason: format!("context {} has an incomplete period", context_id),
        }),
    }
}

fn parse_date(text: &str, url: &str) -> Result<chrono::NaiveDate> {
    let trimmed = text.trim();
    // Instants may carry a time part; the date component governs.
    let date_part = trimmed.split('T').next().unwrap_or(trimmed);
    date_part
        .parse()
        .map_err(|_| XbrlError::SchemaValidation {
            url: url.to_string(),
            reason: format!("invalid date {:?}", trimmed),
        })
}

fn parse_members(container: &XmlElement, url: &str) -> Result<Vec<DimensionMember>> {
    let mut members = Vec::new();
    for element in container.elements() {
        if element.is(ns::XBRLDI, "explicitMember") {
            let dimension = resolve_member_qname(element, element.attr("dimension"), url)?;
            let member = resolve_member_qname(element, Some(&element.text_content()), url)?;
            members.push(DimensionMember::Explicit { dimension, member });
        } else if element.is(ns::XBRLDI, "typedMember") {
            let dimension = resolve_member_qname(element, element.attr("dimension"), url)?;
            members.push(DimensionMember::Typed {
                dimension,
                value: serialize_children(element),
            });
        }
    }
    Ok(members)
}

fn resolve_member_qname(
    element: &XmlElement,
    value: Option<&str>,
    url: &str,
) -> Result<xbrl_graph_core::QName> {
    let value = value.unwrap_or("").trim();
    element
        .resolve_qname(value)
        .filter(|qname| !qname.local_name.is_empty())
        .ok_or_else(|| XbrlError::SchemaValidation {
            url: url.to_string(),
            reason: format!("unresolvable dimensional QName {:?}", value),
        })
}

/// Literal XML content of a typed member, canonicalized enough to compare.
fn serialize_children(element: &XmlElement) -> String {
    let mut out = String::new();
    for child in &element.children {
        match child {
            crate::xml::XmlNode::Text(text) => out.push_str(text.trim()),
            crate::xml::XmlNode::Element(child) => {
                out.push('<');
                out.push_str(&child.name.local_name);
                out.push('>');
                out.push_str(&serialize_children(child));
                out.push_str("</");
                out.push_str(&child.name.local_name);
                out.push('>');
            }
        }
    }
    out
}

/// Parse one `xbrli:unit`.
pub(crate) fn parse_unit(element: &XmlElement, url: &str) -> Result<Unit> {
    let id = element
        .attr("id")
        .ok_or_else(|| XbrlError::SchemaValidation {
            url: url.to_string(),
            reason: "unit without id".to_string(),
        })?
        .to_string();

    let measure = if let Some(divide) = element.find(ns::XBRLI, "divide") {
        let numerator = divide
            .find(ns::XBRLI, "unitNumerator")
            .map(|container| parse_measures(container, url))
            .transpose()?
            .unwrap_or_default();
        let denominator = divide
            .find(ns::XBRLI, "unitDenominator")
            .map(|container| parse_measures(container, url))
            .transpose()?
            .unwrap_or_default();
        UnitMeasure::Divide {
            numerator,
            denominator,
        }
    } else {
        UnitMeasure::Simple(parse_measures(element, url)?)
    };

    Ok(Unit { id, measure })
}

fn parse_measures(container: &XmlElement, url: &str) -> Result<Vec<xbrl_graph_core::QName>> {
    container
        .find_all(ns::XBRLI, "measure")
        .map(|measure| {
            let text = measure.text_content();
            measure
                .resolve_qname(text.trim())
                .ok_or_else(|| XbrlError::SchemaValidation {
                    url: url.to_string(),
                    reason: format!("unresolvable measure {:?}", text.trim()),
                })
        })
        .collect()
}

/// Parse one fact element (item or tuple), recursing for tuple children.
fn parse_fact_element(
    element: &XmlElement,
    instance: &mut Instance,
    fact_xml_ids: &mut HashMap<String, FactId>,
    url: &str,
) -> Result<FactId> {
    let concept_id = instance
        .taxonomy
        .concept_by_parts(&element.name.namespace, &element.name.local_name)
        .ok_or_else(|| XbrlError::UnknownConcept {
            qname: element.name.clone(),
            url: url.to_string(),
        })?;
    let concept = instance.taxonomy.concept(concept_id).clone();

    let fact = if concept.kind == xbrl_graph_core::ConceptKind::Tuple {
        let mut children = Vec::new();
        for child in element.elements() {
            children.push(parse_fact_element(child, instance, fact_xml_ids, url)?);
        }
        Fact {
            id: element.attr("id").map(str::to_string),
            concept: concept_id,
            context_ref: None,
            unit_ref: None,
            value: FactValue::Tuple(children),
            decimals: None,
            precision: None,
            nil: false,
            lang: element.lang.clone(),
            footnotes: Vec::new(),
            inline: None,
        }
    } else {
        let nil = element.attr_ns(ns::XSI, "nil") == Some("true");
        let context_ref = element
            .attr("contextRef")
            .ok_or_else(|| XbrlError::SchemaValidation {
                url: url.to_string(),
                reason: format!("fact {} has no contextRef", concept.qname),
            })?
            .to_string();
        let unit_ref = element.attr("unitRef").map(str::to_string);
        validate_fact(
            &concept,
            instance.contexts.get(&context_ref),
            &context_ref,
            unit_ref.as_deref().map(|unit_ref| {
                (unit_ref, instance.units.contains_key(unit_ref))
            }),
            nil,
            url,
        )?;

        let text = element.text_content();
        let value = if concept.is_numeric() {
            FactValue::Numeric(text.trim().to_string())
        } else {
            FactValue::Text(text)
        };

        Fact {
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
            inline: None,
        }
    };

    let id = FactId(instance.facts.len() as u32);
    if let Some(xml_id) = &fact.id {
        fact_xml_ids.insert(xml_id.clone(), id);
    }
    instance.facts.push(fact);
    Ok(id)
}

/// Structural checks shared with the iXBRL parser: unit presence must match
/// concept numericity and the context period kind must match the concept's
/// declared period type.
pub(crate) fn validate_fact(
    concept: &Concept,
    context: Option<&Context>,
    context_ref: &str,
    unit: Option<(&str, bool)>,
    nil: bool,
    url: &str,
) -> Result<()> {
    let context = context.ok_or_else(|| XbrlError::SchemaValidation {
        url: url.to_string(),
        reason: format!(
            "fact {} references undefined context {}",
            concept.qname, context_ref
        ),
    })?;

    if let Some(period_type) = concept.period_type {
        if context.period.period_type() != period_type {
            return Err(XbrlError::SchemaValidation {
                url: url.to_string(),
                reason: format!(
                    "fact {} has {:?} period type but context {} period is {:?}",
                    concept.qname,
                    period_type,
                    context.id,
                    context.period.period_type()
                ),
            });
        }
    }

    match unit {
        Some((unit_ref, exists)) => {
            if !concept.is_numeric() {
                return Err(XbrlError::SchemaValidation {
                    url: url.to_string(),
                    reason: format!("non-numeric fact {} carries a unitRef", concept.qname),
                });
            }
            if !exists {
                return Err(XbrlError::SchemaValidation {
                    url: url.to_string(),
                    reason: format!(
                        "fact {} references undefined unit {}",
                        concept.qname, unit_ref
                    ),
                });
            }
        }
        None => {
            if concept.is_numeric() && !nil {
                return Err(XbrlError::SchemaValidation {
                    url: url.to_string(),
                    reason: format!("numeric fact {} has no unitRef", concept.qname),
                });
            }
        }
    }
    Ok(())
}

/// `link:footnoteLink`: footnote resources plus fact→footnote arcs.
fn parse_footnote_link(
    link: &XmlElement,
    instance: &mut Instance,
    fact_xml_ids: &HashMap<String, FactId>,
) {
    let mut fact_labels: HashMap<&str, Vec<FactId>> = HashMap::new();
    let mut footnote_labels: HashMap<&str, Vec<usize>> = HashMap::new();

    for child in link.elements() {
        match child.attr_ns(ns::XLINK, "type") {
            Some("locator") => {
                let (Some(label), Some(href)) = (
                    child.attr_ns(ns::XLINK, "label"),
                    child.attr_ns(ns::XLINK, "href"),
                ) else {
                    continue;
                };
                let fragment = href.split_once('#').map(|(_, f)| f).unwrap_or(href);
                if let Some(&fact) = fact_xml_ids.get(fragment) {
                    fact_labels.entry(label).or_default().push(fact);
                }
            }
            Some("resource") => {
                let Some(label) = child.attr_ns(ns::XLINK, "label") else {
                    continue;
                };
                instance.footnotes.push(Footnote {
                    lang: child.lang.clone(),
                    role: child.attr_ns(ns::XLINK, "role").map(str::to_string),
                    text: child.text_content(),
                });
                footnote_labels
                    .entry(label)
                    .or_default()
                    .push(instance.footnotes.len() - 1);
            }
            _ => {}
        }
    }

    for child in link.elements() {
        if child.attr_ns(ns::XLINK, "type") != Some("arc") {
            continue;
        }
        let (Some(from), Some(to)) = (
            child.attr_ns(ns::XLINK, "from"),
            child.attr_ns(ns::XLINK, "to"),
        ) else {
            continue;
        };
        let (Some(facts), Some(footnotes)) = (fact_labels.get(from), footnote_labels.get(to))
        else {
            continue;
        };
        for &fact in facts {
            for &footnote in footnotes {
                instance.facts[fact.index()].footnotes.push(footnote);
            }
        }
    }
}
