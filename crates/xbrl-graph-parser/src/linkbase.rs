//! Linkbase parsing
//!
//! Turns one linkbase file into extended links of locators, resources and
//! raw arcs. Everything stays in parsed (link-local) form; resolution of
//! locator hrefs to concepts and arc override processing belong to the
//! resolver.

use tracing::warn;

use xbrl_graph_core::{
    ns, ArcUse, ExtendedLink, Linkbase, LinkbaseType, Locator, QName, RawArc, Resource,
    ResourcePayload, Result, XbrlError,
};

use crate::xml::{join_url, XmlDocument, XmlElement};

pub fn parse_linkbase(document: &XmlDocument, linkbase_type: LinkbaseType) -> Result<Linkbase> {
    let root = &document.root;
    if !root.is(ns::LINK, "linkbase") {
        return Err(XbrlError::SchemaValidation {
            url: document.source_url.clone(),
            reason: format!("expected link:linkbase root, found {}", root.name),
        });
    }

    let mut extended_links = Vec::new();
    for child in root.elements() {
        let is_extended = child.attr_ns(ns::XLINK, "type") == Some("extended")
            || child.name.local_name.ends_with("Link");
        if is_extended {
            extended_links.push(parse_extended_link(child, &document.source_url));
        }
    }

    Ok(Linkbase {
        linkbase_type,
        source_url: document.source_url.clone(),
        extended_links,
    })
}

fn parse_extended_link(element: &XmlElement, source_url: &str) -> ExtendedLink {
    let role = element
        .attr_ns(ns::XLINK, "role")
        .unwrap_or(ns::ROLE_LINK)
        .to_string();

    let mut link = ExtendedLink {
        role,
        locators: Vec::new(),
        resources: Vec::new(),
        arcs: Vec::new(),
    };

    for child in element.elements() {
        match child.attr_ns(ns::XLINK, "type") {
            Some("locator") => {
                if let Some(locator) = parse_locator(child) {
                    link.locators.push(locator);
                } else {
                    warn!(url = source_url, "locator without label or href skipped");
                }
            }
            Some("resource") => {
                if let Some(resource) = parse_resource(child) {
                    link.resources.push(resource);
                }
            }
            Some("arc") => {
                if let Some(arc) = parse_arc(child) {
                    link.arcs.push(arc);
                } else {
                    warn!(url = source_url, "arc without from/to/arcrole skipped");
                }
            }
            _ => {}
        }
    }

    link
}

fn parse_locator(element: &XmlElement) -> Option<Locator> {
    let label = element.attr_ns(ns::XLINK, "label")?.to_string();
    let href = element.attr_ns(ns::XLINK, "href")?;
    let (document_part, fragment) = match href.split_once('#') {
        Some((document_part, fragment)) => (document_part, fragment.to_string()),
        None => (href, String::new()),
    };
    let href_url = if document_part.is_empty() {
        // Same-document reference.
        element.base.clone()
    } else {
        join_url(&element.base, document_part)
    };
    Some(Locator {
        label,
        href_url,
        fragment,
    })
}

fn parse_resource(element: &XmlElement) -> Option<Resource> {
    let label = element.attr_ns(ns::XLINK, "label")?.to_string();
    let role = element.attr_ns(ns::XLINK, "role").map(str::to_string);
    let lang = element.lang.clone();

    let payload = if element.is(ns::LINK, "label") {
        ResourcePayload::Label {
            text: element.text_content(),
        }
    } else if element.is(ns::LINK, "reference") {
        let parts: Vec<(QName, String)> = element
            .elements()
            .map(|part| (part.name.clone(), part.text_content()))
            .collect();
        ResourcePayload::Reference { parts }
    } else {
        ResourcePayload::Other {
            text: element.text_content(),
        }
    };

    Some(Resource {
        label,
        role,
        lang,
        payload,
    })
}

fn parse_arc(element: &XmlElement) -> Option<RawArc> {
    let from = element.attr_ns(ns::XLINK, "from")?.to_string();
    let to = element.attr_ns(ns::XLINK, "to")?.to_string();
    let arcrole = element.attr_ns(ns::XLINK, "arcrole")?.to_string();

    let defaults = RawArc::default();
    Some(RawArc {
        from,
        to,
        arcrole,
        order: element
            .attr("order")
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(defaults.order),
        priority: element
            .attr("priority")
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(defaults.priority),
        arc_use: match element.attr("use") {
            Some("prohibited") => ArcUse::Prohibited,
            _ => ArcUse::Optional,
        },
        weight: element.attr("weight").and_then(|value| value.trim().parse().ok()),
        preferred_label: element.attr("preferredLabel").map(str::to_string),
    })
}
