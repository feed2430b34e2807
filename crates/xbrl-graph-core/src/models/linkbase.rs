//! Parsed linkbase structures and resolved relationships
//!
//! The parsed form (`Linkbase`, `ExtendedLink`, `Locator`, `Resource`,
//! `RawArc`) mirrors the XLink file content; labels are link-local and
//! nothing is resolved to concepts yet. The resolver turns raw arcs into
//! [`Relationship`] values after locator resolution and override/prohibition
//! processing.

use serde::{Deserialize, Serialize};

use crate::enums::{ArcUse, LinkbaseType};
use crate::models::concept::ConceptId;
use crate::qname::QName;

/// One linkbase file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Linkbase {
    pub linkbase_type: LinkbaseType,
    pub source_url: String,
    pub extended_links: Vec<ExtendedLink>,
}

/// A `link:*Link` element: locators, resources and arcs under one role URI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtendedLink {
    pub role: String,
    pub locators: Vec<Locator>,
    pub resources: Vec<Resource>,
    pub arcs: Vec<RawArc>,
}

/// `xlink:type="locator"`: a link-local label bound to a concept reference.
///
/// The href is split into the absolute document URL and the fragment naming
/// the concept's XML id in that document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Locator {
    pub label: String,
    pub href_url: String,
    pub fragment: String,
}

/// `xlink:type="resource"`: a label or reference payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub label: String,
    pub role: Option<String>,
    pub lang: Option<String>,
    pub payload: ResourcePayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ResourcePayload {
    Label { text: String },
    Reference { parts: Vec<(QName, String)> },
    Other { text: String },
}

impl Resource {
    /// Identity used when grouping resource-target arcs for override and
    /// prohibition: role, language and payload content.
    pub fn identity(&self) -> String {
        let payload = match &self.payload {
            ResourcePayload::Label { text } | ResourcePayload::Other { text } => text.clone(),
            ResourcePayload::Reference { parts } => parts
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join(";"),
        };
        format!(
            "{}|{}|{}",
            self.role.as_deref().unwrap_or(""),
            self.lang.as_deref().unwrap_or(""),
            payload
        )
    }
}

/// One `*Arc` element, defaults already applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawArc {
    pub from: String,
    pub to: String,
    pub arcrole: String,
    pub order: f64,
    pub priority: i32,
    pub arc_use: ArcUse,
    pub weight: Option<f64>,
    pub preferred_label: Option<String>,
}

impl Default for RawArc {
    fn default() -> Self {
        Self {
            from: String::new(),
            to: String::new(),
            arcrole: String::new(),
            order: 1.0,
            priority: 0,
            arc_use: ArcUse::Optional,
            weight: None,
            preferred_label: None,
        }
    }
}

/// The post-override product: a concept-to-concept relationship.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub source: ConceptId,
    pub target: ConceptId,
    pub arcrole: String,
    pub role: String,
    pub order: f64,
    pub weight: Option<f64>,
    pub preferred_label: Option<String>,
}
