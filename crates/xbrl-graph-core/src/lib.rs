//! Core data model for XBRL filings
//!
//! This crate defines the object graph produced by parsing an XBRL or
//! Inline-XBRL filing: taxonomy concepts and their relationships, reporting
//! contexts, units, facts and footnotes. It also carries the shared error
//! and warning taxonomy used across the workspace.

pub mod enums;
pub mod error;
pub mod models;
pub mod ns;
pub mod qname;

pub use enums::{
    ArcUse, Balance, ConceptKind, DocumentKind, LinkbaseType, PeriodType,
};
pub use error::{Result, XbrlError, XbrlWarning};
pub use models::concept::{Concept, ConceptId, TaxonomySchema};
pub use models::instance::{
    Context, Decimals, DimensionMember, Entity, Fact, FactId, FactValue, Footnote, InlineSource,
    Instance, Period, Unit, UnitMeasure,
};
pub use models::linkbase::{
    ExtendedLink, Linkbase, Locator, RawArc, Relationship, Resource, ResourcePayload,
};
pub use models::taxonomy::{ConceptLabel, ConceptReference, Taxonomy};
pub use qname::QName;
