//! A self-contained miniature filing used by the integration tests:
//! an extension schema importing a base schema with label, presentation
//! and calculation linkbases, plus matching XBRL and iXBRL instances.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

pub const BASE_NS: &str = "http://test.example/base";
pub const EXT_NS: &str = "http://test.example/ext";

pub const BASE_XSD: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:xbrli="http://www.xbrl.org/2003/instance"
           xmlns:xbrldt="http://xbrl.org/2005/xbrldt"
           xmlns:link="http://www.xbrl.org/2003/linkbase"
           xmlns:xlink="http://www.w3.org/1999/xlink"
           xmlns:ex="http://test.example/base"
           targetNamespace="http://test.example/base"
           elementFormDefault="qualified">
  <xs:annotation>
    <xs:appinfo>
      <link:linkbaseRef xlink:type="simple" xlink:href="base_lab.xml"
          xlink:role="http://www.xbrl.org/2003/role/labelLinkbaseRef"/>
      <link:linkbaseRef xlink:type="simple" xlink:href="base_pre.xml"
          xlink:role="http://www.xbrl.org/2003/role/presentationLinkbaseRef"/>
      <link:linkbaseRef xlink:type="simple" xlink:href="base_cal.xml"
          xlink:role="http://www.xbrl.org/2003/role/calculationLinkbaseRef"/>
    </xs:appinfo>
  </xs:annotation>
  <xs:element id="ex_Assets" name="Assets" type="xbrli:monetaryItemType"
      substitutionGroup="xbrli:item" nillable="true"
      xbrli:periodType="instant" xbrli:balance="debit"/>
  <xs:element id="ex_CurrentAssets" name="CurrentAssets" type="xbrli:monetaryItemType"
      substitutionGroup="xbrli:item" nillable="true"
      xbrli:periodType="instant" xbrli:balance="debit"/>
  <xs:element id="ex_NoncurrentAssets" name="NoncurrentAssets" type="xbrli:monetaryItemType"
      substitutionGroup="xbrli:item" nillable="true"
      xbrli:periodType="instant" xbrli:balance="debit"/>
  <xs:element id="ex_Revenues" name="Revenues" type="xbrli:monetaryItemType"
      substitutionGroup="xbrli:item" nillable="true"
      xbrli:periodType="duration" xbrli:balance="credit"/>
  <xs:element id="ex_EntityName" name="EntityName" type="xbrli:stringItemType"
      substitutionGroup="xbrli:item" nillable="true" xbrli:periodType="duration"/>
  <xs:element id="ex_SegmentAxis" name="SegmentAxis" type="xbrli:stringItemType"
      substitutionGroup="xbrldt:dimensionItem" abstract="true"
      nillable="true" xbrli:periodType="duration"/>
  <xs:element id="ex_ProductsMember" name="ProductsMember" type="xbrli:stringItemType"
      substitutionGroup="xbrli:item" abstract="true"
      nillable="true" xbrli:periodType="duration"/>
</xs:schema>"#;

pub const EXTENSION_XSD: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:xbrli="http://www.xbrl.org/2003/instance"
           xmlns:t="http://test.example/ext"
           targetNamespace="http://test.example/ext"
           elementFormDefault="qualified">
  <xs:import namespace="http://test.example/base" schemaLocation="base.xsd"/>
  <xs:element id="t_DeferredRevenue" name="DeferredRevenue" type="xbrli:monetaryItemType"
      substitutionGroup="xbrli:item" nillable="true"
      xbrli:periodType="instant" xbrli:balance="credit"/>
</xs:schema>"#;

pub const BASE_LAB: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<link:linkbase xmlns:link="http://www.xbrl.org/2003/linkbase"
               xmlns:xlink="http://www.w3.org/1999/xlink">
  <link:labelLink xlink:type="extended" xlink:role="http://www.xbrl.org/2003/role/link">
    <link:loc xlink:type="locator" xlink:href="base.xsd#ex_Assets" xlink:label="loc_Assets"/>
    <link:loc xlink:type="locator" xlink:href="base.xsd#ex_Revenues" xlink:label="loc_Revenues"/>
    <link:label xlink:type="resource" xlink:label="lab_Assets"
        xlink:role="http://www.xbrl.org/2003/role/label" xml:lang="en-US">Assets</link:label>
    <link:label xlink:type="resource" xlink:label="lab_Assets_terse"
        xlink:role="http://www.xbrl.org/2003/role/terseLabel" xml:lang="en-US">Total assets</link:label>
    <link:label xlink:type="resource" xlink:label="lab_Revenues"
        xlink:role="http://www.xbrl.org/2003/role/label" xml:lang="en-US">Revenues</link:label>
    <link:labelArc xlink:type="arc"
        xlink:arcrole="http://www.xbrl.org/2003/arcrole/concept-label"
        xlink:from="loc_Assets" xlink:to="lab_Assets"/>
    <link:labelArc xlink:type="arc"
        xlink:arcrole="http://www.xbrl.org/2003/arcrole/concept-label"
        xlink:from="loc_Assets" xlink:to="lab_Assets_terse"/>
    <link:labelArc xlink:type="arc"
        xlink:arcrole="http://www.xbrl.org/2003/arcrole/concept-label"
        xlink:from="loc_Revenues" xlink:to="lab_Revenues"/>
  </link:labelLink>
</link:linkbase>"#;

pub const BASE_PRE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<link:linkbase xmlns:link="http://www.xbrl.org/2003/linkbase"
               xmlns:xlink="http://www.w3.org/1999/xlink">
  <link:presentationLink xlink:type="extended" xlink:role="http://test.example/role/BalanceSheet">
    <link:loc xlink:type="locator" xlink:href="base.xsd#ex_Assets" xlink:label="assets"/>
    <link:loc xlink:type="locator" xlink:href="base.xsd#ex_CurrentAssets" xlink:label="current"/>
    <link:loc xlink:type="locator" xlink:href="base.xsd#ex_NoncurrentAssets" xlink:label="noncurrent"/>
    <link:presentationArc xlink:type="arc"
        xlink:arcrole="http://www.xbrl.org/2003/arcrole/parent-child"
        xlink:from="assets" xlink:to="noncurrent" order="2"/>
    <link:presentationArc xlink:type="arc"
        xlink:arcrole="http://www.xbrl.org/2003/arcrole/parent-child"
        xlink:from="assets" xlink:to="current" order="1"
        preferredLabel="http://www.xbrl.org/2003/role/terseLabel"/>
  </link:presentationLink>
</link:linkbase>"#;

pub const BASE_CAL: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<link:linkbase xmlns:link="http://www.xbrl.org/2003/linkbase"
               xmlns:xlink="http://www.w3.org/1999/xlink">
  <link:calculationLink xlink:type="extended" xlink:role="http://test.example/role/BalanceSheet">
    <link:loc xlink:type="locator" xlink:href="base.xsd#ex_Assets" xlink:label="assets"/>
    <link:loc xlink:type="locator" xlink:href="base.xsd#ex_CurrentAssets" xlink:label="current"/>
    <link:loc xlink:type="locator" xlink:href="base.xsd#ex_NoncurrentAssets" xlink:label="noncurrent"/>
    <link:calculationArc xlink:type="arc"
        xlink:arcrole="http://www.xbrl.org/2003/arcrole/summation-item"
        xlink:from="assets" xlink:to="current" order="1" weight="1.0"/>
    <link:calculationArc xlink:type="arc"
        xlink:arcrole="http://www.xbrl.org/2003/arcrole/summation-item"
        xlink:from="assets" xlink:to="noncurrent" order="2" weight="1.0"/>
  </link:calculationLink>
</link:linkbase>"#;

pub const INSTANCE_XML: &str = r##"<?xml version="1.0" encoding="utf-8"?>
<xbrli:xbrl xmlns:xbrli="http://www.xbrl.org/2003/instance"
            xmlns:link="http://www.xbrl.org/2003/linkbase"
            xmlns:xlink="http://www.w3.org/1999/xlink"
            xmlns:xbrldi="http://xbrl.org/2006/xbrldi"
            xmlns:iso4217="http://www.xbrl.org/2003/iso4217"
            xmlns:ex="http://test.example/base"
            xmlns:t="http://test.example/ext">
  <link:schemaRef xlink:type="simple" xlink:href="extension.xsd"/>
  <xbrli:context id="c_instant">
    <xbrli:entity>
      <xbrli:identifier scheme="http://www.sec.gov/CIK">0000320193</xbrli:identifier>
    </xbrli:entity>
    <xbrli:period><xbrli:instant>2020-09-26</xbrli:instant></xbrli:period>
  </xbrli:context>
  <xbrli:context id="c_duration">
    <xbrli:entity>
      <xbrli:identifier scheme="http://www.sec.gov/CIK">0000320193</xbrli:identifier>
    </xbrli:entity>
    <xbrli:period>
      <xbrli:startDate>2019-09-29</xbrli:startDate>
      <xbrli:endDate>2020-09-26</xbrli:endDate>
    </xbrli:period>
  </xbrli:context>
  <xbrli:context id="c_segment">
    <xbrli:entity>
      <xbrli:identifier scheme="http://www.sec.gov/CIK">0000320193</xbrli:identifier>
      <xbrli:segment>
        <xbrldi:explicitMember dimension="ex:SegmentAxis">ex:ProductsMember</xbrldi:explicitMember>
      </xbrli:segment>
    </xbrli:entity>
    <xbrli:period>
      <xbrli:startDate>2019-09-29</xbrli:startDate>
      <xbrli:endDate>2020-09-26</xbrli:endDate>
    </xbrli:period>
  </xbrli:context>
  <xbrli:unit id="usd"><xbrli:measure>iso4217:USD</xbrli:measure></xbrli:unit>
  <xbrli:unit id="usdPerShare">
    <xbrli:divide>
      <xbrli:unitNumerator><xbrli:measure>iso4217:USD</xbrli:measure></xbrli:unitNumerator>
      <xbrli:unitDenominator><xbrli:measure>xbrli:shares</xbrli:measure></xbrli:unitDenominator>
    </xbrli:divide>
  </xbrli:unit>
  <ex:Assets contextRef="c_instant" unitRef="usd" decimals="-6">323888000000</ex:Assets>
  <ex:Revenues id="rev1" contextRef="c_duration" unitRef="usd" decimals="-6">274515000000</ex:Revenues>
  <ex:Revenues contextRef="c_segment" unitRef="usd" decimals="-6">220747000000</ex:Revenues>
  <ex:EntityName contextRef="c_duration">Apple Inc.</ex:EntityName>
  <t:DeferredRevenue contextRef="c_instant" unitRef="usd" decimals="-6">6643000000</t:DeferredRevenue>
  <link:footnoteLink xlink:type="extended" xlink:role="http://www.xbrl.org/2003/role/link">
    <link:loc xlink:type="locator" xlink:href="#rev1" xlink:label="fact_rev"/>
    <link:footnote xlink:type="resource" xlink:label="fn1"
        xlink:role="http://www.xbrl.org/2003/role/footnote"
        xml:lang="en-US">Net sales, including products and services.</link:footnote>
    <link:footnoteArc xlink:type="arc"
        xlink:arcrole="http://www.xbrl.org/2003/arcrole/fact-footnote"
        xlink:from="fact_rev" xlink:to="fn1"/>
  </link:footnoteLink>
</xbrli:xbrl>"##;

pub const INLINE_HTM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<html xmlns="http://www.w3.org/1999/xhtml"
      xmlns:ix="http://www.xbrl.org/2013/inlineXBRL"
      xmlns:ixt="http://www.xbrl.org/inlineXBRL/transformation/2015-02-26"
      xmlns:xbrli="http://www.xbrl.org/2003/instance"
      xmlns:link="http://www.xbrl.org/2003/linkbase"
      xmlns:xlink="http://www.w3.org/1999/xlink"
      xmlns:xbrldi="http://xbrl.org/2006/xbrldi"
      xmlns:iso4217="http://www.xbrl.org/2003/iso4217"
      xmlns:ex="http://test.example/base"
      xmlns:t="http://test.example/ext">
<head><title>Annual Report</title></head>
<body>
  <div style="display:none">
    <ix:header>
      <ix:hidden>
        <ix:nonNumeric name="ex:EntityName" contextRef="c_duration">Apple Inc.</ix:nonNumeric>
      </ix:hidden>
      <ix:references>
        <link:schemaRef xlink:type="simple" xlink:href="extension.xsd"/>
      </ix:references>
      <ix:resources>
        <xbrli:context id="c_instant">
          <xbrli:entity>
            <xbrli:identifier scheme="http://www.sec.gov/CIK">0000320193</xbrli:identifier>
          </xbrli:entity>
          <xbrli:period><xbrli:instant>2020-09-26</xbrli:instant></xbrli:period>
        </xbrli:context>
        <xbrli:context id="c_duration">
          <xbrli:entity>
            <xbrli:identifier scheme="http://www.sec.gov/CIK">0000320193</xbrli:identifier>
          </xbrli:entity>
          <xbrli:period>
            <xbrli:startDate>2019-09-29</xbrli:startDate>
            <xbrli:endDate>2020-09-26</xbrli:endDate>
          </xbrli:period>
        </xbrli:context>
        <xbrli:context id="c_segment">
          <xbrli:entity>
            <xbrli:identifier scheme="http://www.sec.gov/CIK">0000320193</xbrli:identifier>
            <xbrli:segment>
              <xbrldi:explicitMember dimension="ex:SegmentAxis">ex:ProductsMember</xbrldi:explicitMember>
            </xbrli:segment>
          </xbrli:entity>
          <xbrli:period>
            <xbrli:startDate>2019-09-29</xbrli:startDate>
            <xbrli:endDate>2020-09-26</xbrli:endDate>
          </xbrli:period>
        </xbrli:context>
        <xbrli:unit id="usd"><xbrli:measure>iso4217:USD</xbrli:measure></xbrli:unit>
        <xbrli:unit id="usdPerShare">
          <xbrli:divide>
            <xbrli:unitNumerator><xbrli:measure>iso4217:USD</xbrli:measure></xbrli:unitNumerator>
            <xbrli:unitDenominator><xbrli:measure>xbrli:shares</xbrli:measure></xbrli:unitDenominator>
          </xbrli:divide>
        </xbrli:unit>
      </ix:resources>
    </ix:header>
  </div>
  <p>Total assets were $<ix:nonFraction name="ex:Assets" contextRef="c_instant"
      unitRef="usd" decimals="-6" scale="6"
      format="ixt:num-dot-decimal">323,888</ix:nonFraction> million.</p>
  <p>Net sales of $<ix:nonFraction id="rev1" name="ex:Revenues" contextRef="c_duration"
      unitRef="usd" decimals="-6" scale="6"
      format="ixt:num-dot-decimal">274,515</ix:nonFraction> million<ix:footnote
      footnoteID="fn1" xml:lang="en-US">Net sales, including products and services.</ix:footnote>, of which products contributed
    $<ix:nonFraction name="ex:Revenues" contextRef="c_segment"
      unitRef="usd" decimals="-6" scale="6"
      format="ixt:num-dot-decimal">220,747</ix:nonFraction> million.</p>
  <p>Deferred revenue was $<ix:nonFraction name="t:DeferredRevenue" contextRef="c_instant"
      unitRef="usd" decimals="-6" scale="6"
      format="ixt:num-dot-decimal">6,643</ix:nonFraction> million.</p>
  <ix:relationship fromRefs="rev1" toRefs="fn1"/>
</body>
</html>"#;

/// Write the filing into `dir` and return the instance paths
/// `(instance.xml, inline.htm)`.
pub fn write_filing(dir: &Path) -> (PathBuf, PathBuf) {
    let files = [
        ("base.xsd", BASE_XSD),
        ("extension.xsd", EXTENSION_XSD),
        ("base_lab.xml", BASE_LAB),
        ("base_pre.xml", BASE_PRE),
        ("base_cal.xml", BASE_CAL),
        ("instance.xml", INSTANCE_XML),
        ("inline.htm", INLINE_HTM),
    ];
    for (name, contents) in files {
        std::fs::write(dir.join(name), contents).expect("write fixture");
    }
    (dir.join("instance.xml"), dir.join("inline.htm"))
}
