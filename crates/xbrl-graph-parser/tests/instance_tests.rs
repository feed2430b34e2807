//! Integration tests for instance parsing, XML and Inline XBRL.

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use tempfile::TempDir;

use xbrl_graph_cache::HttpCache;
use xbrl_graph_core::{
    Decimals, DimensionMember, DocumentKind, FactValue, Instance, Period, XbrlError, XbrlWarning,
};
use xbrl_graph_parser::{ParserConfig, XbrlParser};

fn parser() -> XbrlParser {
    XbrlParser::new(Arc::new(HttpCache::ephemeral().expect("ephemeral cache")))
}

async fn parse_fixture(contents_override: Option<(&str, &str)>) -> xbrl_graph_core::Result<Instance> {
    let dir = TempDir::new().unwrap();
    let (instance_path, _) = common::write_filing(dir.path());
    if let Some((name, contents)) = contents_override {
        std::fs::write(dir.path().join(name), contents).unwrap();
    }
    parser()
        .parse_instance_locally(instance_path.to_str().unwrap())
        .await
}

/// The comparable identity of a fact: concept, context key, unit, value,
/// decimals.
fn fact_tuples(instance: &Instance) -> Vec<(String, String, String, String, String)> {
    let mut tuples: Vec<_> = instance
        .facts
        .iter()
        .filter_map(|fact| {
            let value = fact.value.as_str()?.to_string();
            let context = instance
                .context_for(fact)
                .map(|context| context.comparison_key())
                .unwrap_or_default();
            let unit = instance
                .unit_for(fact)
                .map(|unit| unit.to_string())
                .unwrap_or_default();
            let decimals = fact
                .decimals
                .map(|decimals| decimals.to_string())
                .unwrap_or_default();
            Some((
                instance.taxonomy.concept(fact.concept).qname.to_string(),
                context,
                unit,
                value,
                decimals,
            ))
        })
        .collect();
    tuples.sort();
    tuples
}

#[tokio::test]
async fn xml_instance_parses_contexts_units_and_facts() {
    let instance = parse_fixture(None).await.unwrap();

    assert_eq!(instance.kind, DocumentKind::Xbrl);
    assert_eq!(instance.contexts.len(), 3);
    assert_eq!(instance.units.len(), 2);
    assert_eq!(instance.facts.len(), 5);

    let instant = &instance.contexts["c_instant"];
    assert_eq!(instant.entity.identifier, "0000320193");
    assert!(matches!(instant.period, Period::Instant(_)));

    let segmented = &instance.contexts["c_segment"];
    assert_eq!(segmented.segment.len(), 1);
    match &segmented.segment[0] {
        DimensionMember::Explicit { dimension, member } => {
            assert_eq!(dimension.local_name, "SegmentAxis");
            assert_eq!(member.local_name, "ProductsMember");
        }
        other => panic!("unexpected member: {other:?}"),
    }

    let assets_concept = instance
        .taxonomy
        .concept_by_parts(common::BASE_NS, "Assets")
        .unwrap();
    let assets: Vec<_> = instance.facts_for(assets_concept).collect();
    assert_eq!(assets.len(), 1);
    assert_eq!(assets[0].value, FactValue::Numeric("323888000000".to_string()));
    assert_eq!(assets[0].decimals, Some(Decimals::Value(-6)));
    assert_eq!(assets[0].unit_ref.as_deref(), Some("usd"));
}

#[tokio::test]
async fn xml_instance_attaches_footnotes_through_the_footnote_link() {
    let instance = parse_fixture(None).await.unwrap();
    let with_footnote: Vec<_> = instance
        .facts
        .iter()
        .filter(|fact| !fact.footnotes.is_empty())
        .collect();
    assert_eq!(with_footnote.len(), 1);
    let footnote = &instance.footnotes[with_footnote[0].footnotes[0]];
    assert_eq!(footnote.text, "Net sales, including products and services.");
    assert_eq!(footnote.lang.as_deref(), Some("en-US"));
}

#[tokio::test]
async fn numeric_fact_without_unit_is_rejected() {
    let broken = common::INSTANCE_XML.replace(
        r#"<ex:Assets contextRef="c_instant" unitRef="usd" decimals="-6">"#,
        r#"<ex:Assets contextRef="c_instant" decimals="-6">"#,
    );
    let error = parse_fixture(Some(("instance.xml", &broken))).await.unwrap_err();
    match error {
        XbrlError::SchemaValidation { reason, .. } => {
            assert!(reason.contains("no unitRef"), "reason: {reason}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn dangling_context_reference_is_rejected() {
    let broken = common::INSTANCE_XML.replace(
        r#"<ex:Assets contextRef="c_instant""#,
        r#"<ex:Assets contextRef="c_missing""#,
    );
    let error = parse_fixture(Some(("instance.xml", &broken))).await.unwrap_err();
    assert!(matches!(error, XbrlError::SchemaValidation { .. }));
}

#[tokio::test]
async fn period_kind_must_match_concept_period_type() {
    // Assets is an instant concept; a duration context is a violation.
    let broken = common::INSTANCE_XML.replace(
        r#"<ex:Assets contextRef="c_instant""#,
        r#"<ex:Assets contextRef="c_duration""#,
    );
    let error = parse_fixture(Some(("instance.xml", &broken))).await.unwrap_err();
    assert!(matches!(error, XbrlError::SchemaValidation { .. }));
}

#[tokio::test]
async fn unknown_concept_is_rejected() {
    let broken = common::INSTANCE_XML.replace(
        r#"<ex:EntityName contextRef="c_duration">Apple Inc.</ex:EntityName>"#,
        r#"<ex:Imaginary contextRef="c_duration">x</ex:Imaginary>"#,
    );
    let error = parse_fixture(Some(("instance.xml", &broken))).await.unwrap_err();
    match error {
        XbrlError::UnknownConcept { qname, .. } => {
            assert_eq!(qname.local_name, "Imaginary");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn inline_document_extracts_hidden_and_displayed_facts() {
    let dir = TempDir::new().unwrap();
    let (_, inline_path) = common::write_filing(dir.path());
    let instance = parser()
        .parse_instance(inline_path.to_str().unwrap())
        .await
        .unwrap();

    assert_eq!(instance.kind, DocumentKind::InlineXbrl);
    assert_eq!(instance.facts.len(), 5);

    // Hidden fact came through untransformed.
    let name_concept = instance
        .taxonomy
        .concept_by_parts(common::BASE_NS, "EntityName")
        .unwrap();
    let names: Vec<_> = instance.facts_for(name_concept).collect();
    assert_eq!(names[0].value, FactValue::Text("Apple Inc.".to_string()));

    // Displayed nonFraction: transform stripped the comma, scale raised it.
    let assets_concept = instance
        .taxonomy
        .concept_by_parts(common::BASE_NS, "Assets")
        .unwrap();
    let assets: Vec<_> = instance.facts_for(assets_concept).collect();
    assert_eq!(assets[0].value, FactValue::Numeric("323888000000".to_string()));
    let inline_source = assets[0].inline.as_ref().unwrap();
    assert_eq!(inline_source.scale, 6);
    assert!(!inline_source.negated);

    // Footnote relationship by fromRefs/toRefs.
    let with_footnote: Vec<_> = instance
        .facts
        .iter()
        .filter(|fact| !fact.footnotes.is_empty())
        .collect();
    assert_eq!(with_footnote.len(), 1);
    assert_eq!(
        instance.footnotes[with_footnote[0].footnotes[0]].text,
        "Net sales, including products and services."
    );
}

#[tokio::test]
async fn inline_and_xml_instances_agree_on_the_fact_multiset() {
    let dir = TempDir::new().unwrap();
    let (instance_path, inline_path) = common::write_filing(dir.path());
    let parser = parser();

    let from_xml = parser
        .parse_instance_locally(instance_path.to_str().unwrap())
        .await
        .unwrap();
    let from_inline = parser
        .parse_instance(inline_path.to_str().unwrap())
        .await
        .unwrap();

    assert_eq!(fact_tuples(&from_xml), fact_tuples(&from_inline));
}

const INLINE_SHELL_HEAD: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<html xmlns="http://www.w3.org/1999/xhtml"
      xmlns:ix="http://www.xbrl.org/2013/inlineXBRL"
      xmlns:ixt="http://www.xbrl.org/inlineXBRL/transformation/2015-02-26"
      xmlns:xbrli="http://www.xbrl.org/2003/instance"
      xmlns:link="http://www.xbrl.org/2003/linkbase"
      xmlns:xlink="http://www.w3.org/1999/xlink"
      xmlns:ex="http://test.example/base">
<body>
  <div style="display:none">
    <ix:header>
      <ix:references>
        <link:schemaRef xlink:type="simple" xlink:href="base.xsd"/>
      </ix:references>
      <ix:resources>
        <xbrli:context id="c_duration">
          <xbrli:entity>
            <xbrli:identifier scheme="http://www.sec.gov/CIK">0000320193</xbrli:identifier>
          </xbrli:entity>
          <xbrli:period>
            <xbrli:startDate>2019-09-29</xbrli:startDate>
            <xbrli:endDate>2020-09-26</xbrli:endDate>
          </xbrli:period>
        </xbrli:context>
        <xbrli:unit id="usd"><xbrli:measure xmlns:iso4217="http://www.xbrl.org/2003/iso4217">iso4217:USD</xbrli:measure></xbrli:unit>
      </ix:resources>
    </ix:header>
  </div>
"#;
const INLINE_SHELL_TAIL: &str = "\n</body>\n</html>";

async fn parse_inline_body(body: &str, config: ParserConfig) -> xbrl_graph_core::Result<Instance> {
    let dir = TempDir::new().unwrap();
    common::write_filing(dir.path());
    let document = format!("{}{}{}", INLINE_SHELL_HEAD, body, INLINE_SHELL_TAIL);
    let path = dir.path().join("shell.htm");
    std::fs::write(&path, document).unwrap();

    let parser = XbrlParser::with_config(
        Arc::new(HttpCache::ephemeral().expect("ephemeral cache")),
        config,
    );
    parser.parse_instance(path.to_str().unwrap()).await
}

#[tokio::test]
async fn scale_sign_and_transform_compose() {
    // The canonical shape: 1,234.50 with scale 6 and a negating sign.
    let body = r#"<p><ix:nonFraction name="ex:Revenues" contextRef="c_duration"
        unitRef="usd" decimals="-2" scale="6" sign="-"
        format="ixt:num-dot-decimal">1,234.50</ix:nonFraction></p>"#;
    let instance = parse_inline_body(body, ParserConfig::default()).await.unwrap();

    assert_eq!(instance.facts.len(), 1);
    let fact = &instance.facts[0];
    assert_eq!(fact.value, FactValue::Numeric("-1234500000".to_string()));
    assert_eq!(fact.decimals, Some(Decimals::Value(-2)));
    let inline_source = fact.inline.as_ref().unwrap();
    assert_eq!(inline_source.scale, 6);
    assert!(inline_source.negated);
    assert_eq!(inline_source.format.as_deref(), Some("ixt:num-dot-decimal"));
}

#[tokio::test]
async fn continuations_chain_and_exclude_is_dropped() {
    let body = r#"<p><ix:nonNumeric name="ex:EntityName" contextRef="c_duration"
        continuedAt="part2">Apple<ix:exclude> (footnote 1)</ix:exclude></ix:nonNumeric>
      <ix:continuation id="part2"> Inc.</ix:continuation></p>"#;
    let instance = parse_inline_body(body, ParserConfig::default()).await.unwrap();

    assert_eq!(instance.facts.len(), 1);
    assert_eq!(
        instance.facts[0].value,
        FactValue::Text("Apple Inc.".to_string())
    );
}

#[tokio::test]
async fn continuation_cycles_are_an_error() {
    let body = r#"<p><ix:nonNumeric name="ex:EntityName" contextRef="c_duration"
        continuedAt="part2">Apple</ix:nonNumeric>
      <ix:continuation id="part2" continuedAt="part2"> Inc.</ix:continuation></p>"#;
    let error = parse_inline_body(body, ParserConfig::default()).await.unwrap_err();
    match error {
        XbrlError::SchemaValidation { reason, .. } => {
            assert!(reason.contains("continuation cycle"), "reason: {reason}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unknown_transform_fails_loudly() {
    let body = r#"<p><ix:nonFraction name="ex:Revenues" contextRef="c_duration"
        unitRef="usd" decimals="0"
        format="ixt:num-unheard-of">5</ix:nonFraction></p>"#;
    let error = parse_inline_body(body, ParserConfig::default()).await.unwrap_err();
    assert!(matches!(error, XbrlError::Transform { .. }));
}

#[tokio::test]
async fn lenient_mode_degrades_value_errors_to_warnings() {
    let body = r#"<p><ix:nonFraction name="ex:Revenues" contextRef="c_duration"
        unitRef="usd" decimals="0"
        format="ixt:num-unheard-of">5</ix:nonFraction></p>"#;
    let config = ParserConfig {
        lenient: true,
        ..ParserConfig::default()
    };
    let instance = parse_inline_body(body, config).await.unwrap();
    assert!(instance.facts.is_empty());
    assert!(matches!(
        instance.warnings.as_slice(),
        [XbrlWarning::SkippedFact { .. }]
    ));
}

#[tokio::test]
async fn zerodash_yields_zero() {
    let body = r#"<p><ix:nonFraction name="ex:Revenues" contextRef="c_duration"
        unitRef="usd" decimals="0" format="ixt:zerodash">—</ix:nonFraction></p>"#;
    let instance = parse_inline_body(body, ParserConfig::default()).await.unwrap();
    assert_eq!(instance.facts[0].value, FactValue::Numeric("0".to_string()));
}

#[tokio::test]
async fn nonnumeric_date_transform_produces_iso_dates() {
    let body = r#"<p><ix:nonNumeric name="ex:EntityName" contextRef="c_duration"
        format="ixt:date-monthname-day-year-en">September 26, 2020</ix:nonNumeric></p>"#;
    let instance = parse_inline_body(body, ParserConfig::default()).await.unwrap();
    assert_eq!(
        instance.facts[0].value,
        FactValue::Text("2020-09-26".to_string())
    );
}

#[tokio::test]
async fn tuples_group_member_facts_in_order() {
    let body = r#"<div><ix:tuple name="ex:EntityName" tupleID="tup1"/>
      <p><ix:nonNumeric name="ex:EntityName" contextRef="c_duration"
          tupleRef="tup1" order="2">Second</ix:nonNumeric>
         <ix:nonNumeric name="ex:EntityName" contextRef="c_duration"
          tupleRef="tup1" order="1">First</ix:nonNumeric></p></div>"#;
    let instance = parse_inline_body(body, ParserConfig::default()).await.unwrap();

    let tuple = instance
        .facts
        .iter()
        .find(|fact| matches!(fact.value, FactValue::Tuple(_)))
        .expect("tuple fact");
    let FactValue::Tuple(members) = &tuple.value else {
        unreachable!()
    };
    let values: Vec<_> = members
        .iter()
        .map(|&member| instance.fact(member).value.as_str().unwrap())
        .collect();
    assert_eq!(values, vec!["First", "Second"]);
}

#[tokio::test]
async fn nested_tuple_members_are_collected_by_containment() {
    let body = r#"<div><ix:tuple name="ex:EntityName">
        <ix:nonNumeric name="ex:EntityName" contextRef="c_duration">Inner</ix:nonNumeric>
      </ix:tuple></div>"#;
    let instance = parse_inline_body(body, ParserConfig::default()).await.unwrap();

    let tuple = instance
        .facts
        .iter()
        .find(|fact| matches!(fact.value, FactValue::Tuple(_)))
        .expect("tuple fact");
    let FactValue::Tuple(members) = &tuple.value else {
        unreachable!()
    };
    assert_eq!(members.len(), 1);
    assert_eq!(
        instance.fact(members[0]).value,
        FactValue::Text("Inner".to_string())
    );
}

#[tokio::test]
async fn cache_reports_zero_network_for_local_filings() {
    let dir = TempDir::new().unwrap();
    let (instance_path, _) = common::write_filing(dir.path());

    let cache = Arc::new(HttpCache::ephemeral().expect("ephemeral cache"));
    let parser = XbrlParser::new(Arc::clone(&cache));
    parser
        .parse_instance_locally(instance_path.to_str().unwrap())
        .await
        .unwrap();
    assert_eq!(cache.stats().network_fetches, 0);
}

#[tokio::test]
async fn entity_decoding_lets_html_filings_parse() {
    let body = r#"<p>Revenue&nbsp;was <ix:nonFraction name="ex:Revenues" contextRef="c_duration"
        unitRef="usd" decimals="0" format="ixt:num-dot-decimal">1,000</ix:nonFraction></p>"#;
    let instance = parse_inline_body(body, ParserConfig::default()).await.unwrap();
    assert_eq!(instance.facts[0].value, FactValue::Numeric("1000".to_string()));
}

#[tokio::test]
async fn fact_counts_per_concept_match_the_document() {
    let instance = parse_fixture(None).await.unwrap();
    let mut by_concept: HashMap<&str, usize> = HashMap::new();
    for fact in &instance.facts {
        let local_name = instance
            .taxonomy
            .concept(fact.concept)
            .qname
            .local_name
            .as_str();
        *by_concept.entry(local_name).or_insert(0) += 1;
    }
    assert_eq!(by_concept.get("Revenues"), Some(&2));
    assert_eq!(by_concept.get("Assets"), Some(&1));
    assert_eq!(by_concept.get("DeferredRevenue"), Some(&1));
}
