//! Instance-side models: contexts, units, facts, footnotes

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::enums::{DocumentKind, PeriodType};
use crate::error::XbrlWarning;
use crate::models::concept::ConceptId;
use crate::models::taxonomy::Taxonomy;
use crate::qname::QName;

/// Arena handle for a fact within an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FactId(pub u32);

impl FactId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The reporting entity of a context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub scheme: String,
    pub identifier: String,
}

/// Reporting period of a context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    Instant(NaiveDate),
    Duration { start: NaiveDate, end: NaiveDate },
    Forever,
}

impl Period {
    /// The concept period type this period satisfies. `forever` periods
    /// satisfy duration concepts.
    pub fn period_type(&self) -> PeriodType {
        match self {
            Period::Instant(_) => PeriodType::Instant,
            Period::Duration { .. } | Period::Forever => PeriodType::Duration,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Instant(date) => write!(f, "{}", date),
            Period::Duration { start, end } => write!(f, "{}/{}", start, end),
            Period::Forever => write!(f, "forever"),
        }
    }
}

/// One axis/member qualifier in a segment or scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DimensionMember {
    Explicit { dimension: QName, member: QName },
    Typed { dimension: QName, value: String },
}

impl DimensionMember {
    pub fn dimension(&self) -> &QName {
        match self {
            DimensionMember::Explicit { dimension, .. }
            | DimensionMember::Typed { dimension, .. } => dimension,
        }
    }

    fn canonical(&self) -> String {
        match self {
            DimensionMember::Explicit { dimension, member } => format!(
                "{}#{}={}#{}",
                dimension.namespace, dimension.local_name, member.namespace, member.local_name
            ),
            DimensionMember::Typed { dimension, value } => format!(
                "{}#{}~{}",
                dimension.namespace, dimension.local_name, value
            ),
        }
    }
}

/// The entity, period and dimensional qualifiers of a fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    pub id: String,
    pub entity: Entity,
    pub period: Period,
    pub segment: Vec<DimensionMember>,
    pub scenario: Vec<DimensionMember>,
}

impl Context {
    /// Canonical key: two contexts with equal entity, period, segment and
    /// scenario produce the same key regardless of member order or id.
    pub fn comparison_key(&self) -> String {
        let mut members: Vec<String> = self
            .segment
            .iter()
            .chain(self.scenario.iter())
            .map(DimensionMember::canonical)
            .collect();
        members.sort();
        format!(
            "{}#{}|{}|{}",
            self.entity.scheme,
            self.entity.identifier,
            self.period,
            members.join(",")
        )
    }

    /// All dimensional members across segment and scenario.
    pub fn members(&self) -> impl Iterator<Item = &DimensionMember> {
        self.segment.iter().chain(self.scenario.iter())
    }
}

/// Measure content of a unit: a single measure list or a ratio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitMeasure {
    Simple(Vec<QName>),
    Divide {
        numerator: Vec<QName>,
        denominator: Vec<QName>,
    },
}

/// A measurement unit, immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: String,
    pub measure: UnitMeasure,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(measures: &[QName]) -> String {
            measures
                .iter()
                .map(|measure| measure.to_string())
                .collect::<Vec<_>>()
                .join("*")
        }
        match &self.measure {
            UnitMeasure::Simple(measures) => write!(f, "{}", join(measures)),
            UnitMeasure::Divide {
                numerator,
                denominator,
            } => write!(f, "{}/{}", join(numerator), join(denominator)),
        }
    }
}

/// The `decimals` attribute, with `INF` preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decimals {
    Value(i32),
    Infinite,
}

impl Decimals {
    pub fn parse(text: &str) -> Option<Self> {
        if text == "INF" {
            Some(Decimals::Infinite)
        } else {
            text.trim().parse().ok().map(Decimals::Value)
        }
    }
}

impl fmt::Display for Decimals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decimals::Value(value) => write!(f, "{}", value),
            Decimals::Infinite => write!(f, "INF"),
        }
    }
}

/// Fact payload. Values stay verbatim strings; numerics hold the canonical
/// decimal string after any iXBRL transform, scale and sign were applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FactValue {
    Text(String),
    Numeric(String),
    Tuple(Vec<FactId>),
}

impl FactValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FactValue::Text(text) | FactValue::Numeric(text) => Some(text),
            FactValue::Tuple(_) => None,
        }
    }
}

/// iXBRL source coordinates of a fact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InlineSource {
    pub scale: i32,
    pub negated: bool,
    pub format: Option<String>,
}

/// A value tagged with concept + context + (for numerics) unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
    pub id: Option<String>,
    pub concept: ConceptId,
    pub context_ref: Option<String>,
    pub unit_ref: Option<String>,
    pub value: FactValue,
    pub decimals: Option<Decimals>,
    pub precision: Option<String>,
    pub nil: bool,
    pub lang: Option<String>,
    /// Indexes into [`Instance::footnotes`].
    pub footnotes: Vec<usize>,
    pub inline: Option<InlineSource>,
}

/// Text resource attached to facts through the instance footnote link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Footnote {
    pub lang: Option<String>,
    pub role: Option<String>,
    pub text: String,
}

/// The root object a parse produces. Owns contexts, units, facts and
/// footnotes; facts reference concepts by identity into [`Taxonomy`].
#[derive(Debug)]
pub struct Instance {
    pub source_url: String,
    pub kind: DocumentKind,
    pub schema_refs: Vec<String>,
    pub contexts: HashMap<String, Context>,
    pub units: HashMap<String, Unit>,
    pub facts: Vec<Fact>,
    pub footnotes: Vec<Footnote>,
    pub taxonomy: Taxonomy,
    pub warnings: Vec<XbrlWarning>,
}

impl Instance {
    pub fn fact(&self, id: FactId) -> &Fact {
        &self.facts[id.index()]
    }

    /// Facts of the given concept, in document order.
    pub fn facts_for(&self, concept: ConceptId) -> impl Iterator<Item = &Fact> {
        self.facts.iter().filter(move |fact| fact.concept == concept)
    }

    pub fn context_for(&self, fact: &Fact) -> Option<&Context> {
        fact.context_ref
            .as_deref()
            .and_then(|context_ref| self.contexts.get(context_ref))
    }

    pub fn unit_for(&self, fact: &Fact) -> Option<&Unit> {
        fact.unit_ref
            .as_deref()
            .and_then(|unit_ref| self.units.get(unit_ref))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(dim: &str, mem: &str) -> DimensionMember {
        DimensionMember::Explicit {
            dimension: QName::new("http://fasb.org/us-gaap/2020", dim),
            member: QName::new("http://fasb.org/us-gaap/2020", mem),
        }
    }

    fn context(id: &str, segment: Vec<DimensionMember>) -> Context {
        Context {
            id: id.into(),
            entity: Entity {
                scheme: "http://www.sec.gov/CIK".into(),
                identifier: "0000320193".into(),
            },
            period: Period::Instant(NaiveDate::from_ymd_opt(2020, 9, 26).unwrap()),
            segment,
            scenario: Vec::new(),
        }
    }

    #[test]
    fn comparison_key_ignores_member_order_and_id() {
        let a = context(
            "c1",
            vec![
                member("StatementClassOfStockAxis", "CommonStockMember"),
                member("StatementGeographicalAxis", "UsMember"),
            ],
        );
        let b = context(
            "c2",
            vec![
                member("StatementGeographicalAxis", "UsMember"),
                member("StatementClassOfStockAxis", "CommonStockMember"),
            ],
        );
        assert_eq!(a.comparison_key(), b.comparison_key());
    }

    #[test]
    fn comparison_key_distinguishes_periods() {
        let mut a = context("c1", Vec::new());
        let b = context("c2", Vec::new());
        a.period = Period::Duration {
            start: NaiveDate::from_ymd_opt(2019, 9, 29).unwrap(),
            end: NaiveDate::from_ymd_opt(2020, 9, 26).unwrap(),
        };
        assert_ne!(a.comparison_key(), b.comparison_key());
    }

    #[test]
    fn forever_satisfies_duration_concepts() {
        assert_eq!(Period::Forever.period_type(), PeriodType::Duration);
    }

    #[test]
    fn decimals_inf_round_trips() {
        assert_eq!(Decimals::parse("INF"), Some(Decimals::Infinite));
        assert_eq!(Decimals::parse("-6"), Some(Decimals::Value(-6)));
        assert_eq!(Decimals::Infinite.to_string(), "INF");
    }

    #[test]
    fn unit_display_renders_ratios() {
        let usd = QName::new("http://www.xbrl.org/2003/iso4217", "USD").with_prefix("iso4217");
        let shares = QName::new(crate::ns::XBRLI, "shares").with_prefix("xbrli");
        let simple = Unit {
            id: "u1".into(),
            measure: UnitMeasure::Simple(vec![usd.clone()]),
        };
        assert_eq!(simple.to_string(), "iso4217:USD");
        let ratio = Unit {
            id: "u2".into(),
            measure: UnitMeasure::Divide {
                numerator: vec![usd],
                denominator: vec![shares],
            },
        };
        assert_eq!(ratio.to_string(), "iso4217:USD/xbrli:shares");
    }
}
