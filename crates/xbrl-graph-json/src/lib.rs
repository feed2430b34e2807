//! xBRL-JSON (2021 Recommendation) export
//!
//! Emits the unified instance graph as an xBRL-JSON document and reads such
//! documents back into flat fact records, which is what round-trip
//! verification and downstream JSON consumers need. Key order follows
//! insertion order throughout, so fact iteration order is stable.

use serde_json::{json, Map, Value};

use xbrl_graph_core::{Decimals, FactValue, Instance, Result, XbrlError};

pub mod import;

pub use import::{from_json_str, from_json_value, JsonDocument, JsonFact};

/// Fixed `documentInfo.documentType` of the 2021 Recommendation.
pub const DOCUMENT_TYPE: &str = "https://xbrl.org/2021/xbrl-json";

#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Replace fact ids with `f1..fN` in stable iteration order.
    pub override_fact_ids: bool,
}

pub fn to_json_string(instance: &Instance, options: &ExportOptions) -> Result<String> {
    serde_json::to_string_pretty(&to_json_value(instance, options)).map_err(|error| {
        XbrlError::SchemaValidation {
            url: instance.source_url.clone(),
            reason: format!("JSON serialization failed: {}", error),
        }
    })
}

pub fn to_json_value(instance: &Instance, options: &ExportOptions) -> Value {
    let taxonomy_urls: Vec<&str> = instance
        .taxonomy
        .schemas
        .iter()
        .map(|schema| schema.source_url.as_str())
        .collect();

    let mut facts = Map::new();
    let mut counter = 0u32;
    for fact in &instance.facts {
        // Tuples have no xBRL-JSON representation; their members are
        // exported as ordinary facts.
        if matches!(fact.value, FactValue::Tuple(_)) {
            continue;
        }
        counter += 1;
        let key = if options.override_fact_ids {
            format!("f{}", counter)
        } else {
            fact.id.clone().unwrap_or_else(|| format!("f{}", counter))
        };
        facts.insert(key, fact_to_json(instance, fact));
    }

    json!({
        "documentInfo": {
            "documentType": DOCUMENT_TYPE,
            "taxonomy": taxonomy_urls,
            "baseUrl": instance.source_url,
        },
        "facts": Value::Object(facts),
    })
}

fn fact_to_json(instance: &Instance, fact: &xbrl_graph_core::Fact) -> Value {
    let concept = &instance.taxonomy.concept(fact.concept).qname;

    let mut dimensions = Map::new();
    dimensions.insert("concept".to_string(), json!(concept.to_string()));

    if let Some(context) = instance.context_for(fact) {
        dimensions.insert(
            "entity".to_string(),
            json!(format!(
                "{}:{}",
                context.entity.scheme, context.entity.identifier
            )),
        );
        dimensions.insert("period".to_string(), json!(context.period.to_string()));
        for member in context.members() {
            let (key, value) = match member {
                xbrl_graph_core::DimensionMember::Explicit { dimension, member } => (
                    format!("dim:{}", dimension),
                    json!(member.to_string()),
                ),
                xbrl_graph_core::DimensionMember::Typed { dimension, value } => {
                    (format!("dim:{}", dimension), json!(value))
                }
            };
            dimensions.insert(key, value);
        }
    }
    if let Some(unit) = instance.unit_for(fact) {
        dimensions.insert("unit".to_string(), json!(unit.to_string()));
    }
    if let Some(lang) = &fact.lang {
        dimensions.insert("language".to_string(), json!(lang));
    }

    let value = if fact.nil {
        Value::Null
    } else {
        match &fact.value {
            FactValue::Text(text) | FactValue::Numeric(text) => json!(text),
            FactValue::Tuple(_) => Value::Null,
        }
    };

    let mut body = Map::new();
    body.insert("value".to_string(), value);
    body.insert("dimensions".to_string(), Value::Object(dimensions));
    if let Some(Decimals::Value(decimals)) = fact.decimals {
        body.insert("decimals".to_string(), json!(decimals));
    }
    Value::Object(body)
}
