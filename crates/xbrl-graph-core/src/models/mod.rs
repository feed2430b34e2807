//! Object graph models
//!
//! The taxonomy side (concepts, schemas, linkbases, relationships) is owned
//! by [`taxonomy::Taxonomy`]; the instance side (contexts, units, facts,
//! footnotes) by [`instance::Instance`]. Concepts live in an arena addressed
//! by [`concept::ConceptId`] so cyclic taxonomy imports never produce
//! back-pointer ownership.

pub mod concept;
pub mod instance;
pub mod linkbase;
pub mod taxonomy;
