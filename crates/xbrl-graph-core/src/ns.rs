//! Well-known XBRL namespace URIs and role constants

pub const XS: &str = "http://www.w3.org/2001/XMLSchema";
pub const XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";
pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
pub const XLINK: &str = "http://www.w3.org/1999/xlink";
pub const LINK: &str = "http://www.xbrl.org/2003/linkbase";
pub const XBRLI: &str = "http://www.xbrl.org/2003/instance";
pub const XBRLDI: &str = "http://xbrl.org/2006/xbrldi";
pub const XBRLDT: &str = "http://xbrl.org/2005/xbrldt";
pub const IX: &str = "http://www.xbrl.org/2013/inlineXBRL";
pub const IX_2008: &str = "http://www.xbrl.org/2008/inlineXBRL";

/// Standard label role; the fallback target of label lookup.
pub const ROLE_LABEL: &str = "http://www.xbrl.org/2003/role/label";
/// Default extended-link role.
pub const ROLE_LINK: &str = "http://www.xbrl.org/2003/role/link";

pub const ARCROLE_CONCEPT_LABEL: &str = "http://www.xbrl.org/2003/arcrole/concept-label";
pub const ARCROLE_CONCEPT_REFERENCE: &str = "http://www.xbrl.org/2003/arcrole/concept-reference";
pub const ARCROLE_PARENT_CHILD: &str = "http://www.xbrl.org/2003/arcrole/parent-child";
pub const ARCROLE_SUMMATION_ITEM: &str = "http://www.xbrl.org/2003/arcrole/summation-item";
pub const ARCROLE_FACT_FOOTNOTE: &str = "http://www.xbrl.org/2003/arcrole/fact-footnote";

/// `xlink:role` values carried on `link:linkbaseRef` elements.
pub const LINKBASE_REF_ROLE_LABEL: &str =
    "http://www.xbrl.org/2003/role/labelLinkbaseRef";
pub const LINKBASE_REF_ROLE_PRESENTATION: &str =
    "http://www.xbrl.org/2003/role/presentationLinkbaseRef";
pub const LINKBASE_REF_ROLE_CALCULATION: &str =
    "http://www.xbrl.org/2003/role/calculationLinkbaseRef";
pub const LINKBASE_REF_ROLE_DEFINITION: &str =
    "http://www.xbrl.org/2003/role/definitionLinkbaseRef";
pub const LINKBASE_REF_ROLE_REFERENCE: &str =
    "http://www.xbrl.org/2003/role/referenceLinkbaseRef";
