//! Namespace-aware XML reading
//!
//! A thin wrapper over `roxmltree` producing an owned element tree. Each
//! element keeps its in-scope prefix→URI bindings so QName values inside
//! attribute content resolve against the declaring element, plus the
//! effective `xml:base` and `xml:lang`. roxmltree performs no DTD resolution
//! and no external entity expansion.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use xbrl_graph_cache::HttpCache;
use xbrl_graph_core::{ns, QName, Result, XbrlError};

/// In-scope namespace bindings of one element. The default namespace is
/// bound under the empty prefix.
#[derive(Debug, Default, PartialEq)]
pub struct NsScope {
    bindings: HashMap<String, String>,
}

impl NsScope {
    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        self.bindings.get(prefix).map(String::as_str)
    }

    /// First prefix bound to the given namespace URI.
    pub fn prefix_for(&self, namespace: &str) -> Option<&str> {
        self.bindings
            .iter()
            .filter(|(prefix, _)| !prefix.is_empty())
            .find(|(_, uri)| uri.as_str() == namespace)
            .map(|(prefix, _)| prefix.as_str())
    }
}

#[derive(Debug)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// One element of the owned tree.
#[derive(Debug)]
pub struct XmlElement {
    pub name: QName,
    pub attributes: Vec<(QName, String)>,
    pub scope: Arc<NsScope>,
    /// Effective base for resolving relative references, after applying any
    /// `xml:base` up the ancestor chain to the document URL.
    pub base: String,
    /// Effective `xml:lang`, inherited.
    pub lang: Option<String>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn is(&self, namespace: &str, local_name: &str) -> bool {
        self.name.namespace == namespace && self.name.local_name == local_name
    }

    /// Unprefixed attribute value.
    pub fn attr(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name.namespace.is_empty() && name.local_name == local_name)
            .map(|(_, value)| value.as_str())
    }

    /// Namespaced attribute value (e.g. `xlink:href`).
    pub fn attr_ns(&self, namespace: &str, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name.namespace == namespace && name.local_name == local_name)
            .map(|(_, value)| value.as_str())
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id").or_else(|| self.attr_ns(ns::XML, "id"))
    }

    /// Direct child elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    pub fn find(&self, namespace: &str, local_name: &str) -> Option<&XmlElement> {
        self.elements()
            .find(|element| element.is(namespace, local_name))
    }

    pub fn find_all<'a>(
        &'a self,
        namespace: &'a str,
        local_name: &'a str,
    ) -> impl Iterator<Item = &'a XmlElement> {
        self.elements()
            .filter(move |element| element.is(namespace, local_name))
    }

    /// All descendant elements, pre-order.
    pub fn descendants(&self) -> Vec<&XmlElement> {
        let mut result = Vec::new();
        fn walk<'a>(element: &'a XmlElement, out: &mut Vec<&'a XmlElement>) {
            out.push(element);
            for child in element.elements() {
                walk(child, out);
            }
        }
        walk(self, &mut result);
        result
    }

    /// Concatenated descendant text, document order.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        fn walk(element: &XmlElement, out: &mut String) {
            for child in &element.children {
                match child {
                    XmlNode::Text(text) => out.push_str(text),
                    XmlNode::Element(child) => walk(child, out),
                }
            }
        }
        walk(self, &mut out);
        out
    }

    /// Resolve a `prefix:local` value against this element's namespace
    /// scope. An unprefixed value takes the default namespace if one is in
    /// scope, otherwise no namespace.
    pub fn resolve_qname(&self, value: &str) -> Option<QName> {
        let value = value.trim();
        match value.split_once(':') {
            Some((prefix, local_name)) => self
                .scope
                .resolve(prefix)
                .map(|uri| QName::new(uri, local_name).with_prefix(prefix)),
            None => {
                let namespace = self.scope.resolve("").unwrap_or("");
                Some(QName::new(namespace, value))
            }
        }
    }
}

/// A parsed document with its source URL threaded through.
#[derive(Debug)]
pub struct XmlDocument {
    pub source_url: String,
    pub root: XmlElement,
}

impl XmlDocument {
    pub fn parse(text: &str, source_url: &str) -> Result<XmlDocument> {
        let options = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..Default::default()
        };
        let document = roxmltree::Document::parse_with_options(text, options).map_err(|error| {
            XbrlError::XmlWellFormedness {
                url: source_url.to_string(),
                reason: error.to_string(),
            }
        })?;
        let root = convert(document.root_element(), None, source_url, None);
        Ok(XmlDocument {
            source_url: source_url.to_string(),
            root,
        })
    }
}

fn convert(
    node: roxmltree::Node<'_, '_>,
    parent_scope: Option<&Arc<NsScope>>,
    parent_base: &str,
    parent_lang: Option<&str>,
) -> XmlElement {
    let bindings: HashMap<String, String> = node
        .namespaces()
        .map(|namespace| {
            (
                namespace.name().unwrap_or("").to_string(),
                namespace.uri().to_string(),
            )
        })
        .collect();
    let scope = match parent_scope {
        Some(parent) if parent.bindings == bindings => Arc::clone(parent),
        _ => Arc::new(NsScope { bindings }),
    };

    let name_ns = node.tag_name().namespace().unwrap_or("");
    let name = QName::new(name_ns, node.tag_name().name());
    let name = match scope.prefix_for(name_ns) {
        Some(prefix) => name.with_prefix(prefix),
        None => name,
    };

    let attributes: Vec<(QName, String)> = node
        .attributes()
        .map(|attribute| {
            (
                QName::new(attribute.namespace().unwrap_or(""), attribute.name()),
                attribute.value().to_string(),
            )
        })
        .collect();

    let base = match node.attribute((ns::XML, "base")) {
        Some(relative) => join_url(parent_base, relative),
        None => parent_base.to_string(),
    };
    let lang = node
        .attribute((ns::XML, "lang"))
        .map(str::to_string)
        .or_else(|| parent_lang.map(str::to_string));

    let children = node
        .children()
        .filter_map(|child| {
            if child.is_element() {
                Some(XmlNode::Element(convert(
                    child,
                    Some(&scope),
                    &base,
                    lang.as_deref(),
                )))
            } else if child.is_text() {
                child
                    .text()
                    .filter(|text| !text.is_empty())
                    .map(|text| XmlNode::Text(text.to_string()))
            } else {
                None
            }
        })
        .collect();

    XmlElement {
        name,
        attributes,
        scope,
        base,
        lang,
        children,
    }
}

/// Resolve a possibly-relative reference against a base that is either an
/// absolute URL or a local filesystem path.
pub fn join_url(base: &str, relative: &str) -> String {
    if relative.starts_with("http://") || relative.starts_with("https://") {
        return relative.to_string();
    }
    if base.starts_with("http://") || base.starts_with("https://") {
        if let Ok(parsed) = url::Url::parse(base) {
            if let Ok(joined) = parsed.join(relative) {
                return joined.to_string();
            }
        }
        return relative.to_string();
    }

    // Local path base: drop the filename, then normalize `.` and `..`.
    let directory = match base.rsplit_once('/') {
        Some((directory, _)) => directory,
        None => "",
    };
    let mut segments: Vec<&str> = directory.split('/').filter(|s| !s.is_empty()).collect();
    let absolute = base.starts_with('/');
    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    let joined = segments.join("/");
    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}

/// Fetch-and-parse access for cache users.
#[async_trait]
pub trait FetchXml {
    async fn get_and_parse_xml(&self, url: &str) -> Result<XmlDocument>;
}

#[async_trait]
impl FetchXml for HttpCache {
    async fn get_and_parse_xml(&self, url: &str) -> Result<XmlDocument> {
        let (bytes, _path) = self.get(url).await?;
        let text = String::from_utf8_lossy(&bytes);
        XmlDocument::parse(&text, url)
    }
}
