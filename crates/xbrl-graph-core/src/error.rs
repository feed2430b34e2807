//! Error and warning taxonomy
//!
//! Fatal conditions surface as a single [`XbrlError`] identifying the
//! offending URL and, where known, the XML location. Recoverable conditions
//! accumulate as [`XbrlWarning`] values on the resolved taxonomy or the
//! parsed instance for caller inspection.

use thiserror::Error;

use crate::qname::QName;

pub type Result<T> = std::result::Result<T, XbrlError>;

#[derive(Debug, Error)]
pub enum XbrlError {
    /// Network failure or HTTP error status after all retries.
    #[error("failed to fetch {url}: {reason}")]
    RemoteFetch { url: String, reason: String },

    /// Malformed XML or XHTML input.
    #[error("malformed XML in {url}: {reason}")]
    XmlWellFormedness { url: String, reason: String },

    /// XBRL structural rule violated (dangling refs, period-type mismatch).
    #[error("invalid XBRL structure in {url}: {reason}")]
    SchemaValidation { url: String, reason: String },

    /// A fact references a concept absent from the resolved DTS.
    #[error("unknown concept {qname} referenced from {url}")]
    UnknownConcept { qname: QName, url: String },

    /// The same qualified name was redeclared incompatibly across schemas.
    #[error("concept {qname} redeclared incompatibly")]
    DuplicateConcept { qname: QName },

    /// An iXBRL `format` attribute names an unregistered transform.
    #[error("unknown or failed transform {format:?} on value {value:?}")]
    Transform { format: String, value: String },

    /// A numeric fact value did not parse after transform and scale.
    #[error("cannot parse numeric value {value:?}: {reason}")]
    NumericParse { value: String, reason: String },

    /// The operation was cancelled through the caller's token.
    #[error("operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Non-fatal findings; the parse continues.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum XbrlWarning {
    /// A linkbase locator's href fragment matched no concept id.
    #[error("locator href {href} in {url} resolves to no concept; arc skipped")]
    BrokenLocator { href: String, url: String },

    /// The summation-item relationship graph contains a cycle.
    #[error("calculation cycle through {qname} in role {role}")]
    CalculationCycle { qname: QName, role: String },

    /// A presentation or definition network contains a cycle.
    #[error("relationship cycle through {qname} under {arcrole} in role {role}")]
    RelationshipCycle {
        qname: QName,
        arcrole: String,
        role: String,
    },

    /// More than one surviving relationship at identical max priority.
    #[error("ambiguous arc override for {source_qname} -> {target} ({arcrole})")]
    AmbiguousOverride {
        source_qname: QName,
        target: String,
        arcrole: String,
    },

    /// A fact was dropped in lenient mode after a value-construction error.
    #[error("fact {concept} at {url} skipped: {reason}")]
    SkippedFact {
        concept: QName,
        url: String,
        reason: String,
    },
}
