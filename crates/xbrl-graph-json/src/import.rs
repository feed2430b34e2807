//! Reading xBRL-JSON documents back into flat fact records

use std::collections::BTreeMap;

use serde_json::Value;

use xbrl_graph_core::{Result, XbrlError};

/// One fact as it appears in an xBRL-JSON document.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonFact {
    pub id: String,
    pub concept: String,
    pub entity: Option<String>,
    pub period: Option<String>,
    pub unit: Option<String>,
    pub language: Option<String>,
    /// `dim:`-prefixed members, keyed without the prefix.
    pub members: BTreeMap<String, String>,
    pub value: Option<String>,
    pub decimals: Option<i32>,
}

impl JsonFact {
    /// The context identity this fact reports under: entity, period and
    /// sorted dimensional members.
    pub fn context_key(&self) -> String {
        let members: Vec<String> = self
            .members
            .iter()
            .map(|(dimension, member)| format!("{}={}", dimension, member))
            .collect();
        format!(
            "{}|{}|{}",
            self.entity.as_deref().unwrap_or(""),
            self.period.as_deref().unwrap_or(""),
            members.join(",")
        )
    }
}

#[derive(Debug, Clone)]
pub struct JsonDocument {
    pub document_type: String,
    pub taxonomy: Vec<String>,
    pub base_url: Option<String>,
    /// Facts in document key order.
    pub facts: Vec<JsonFact>,
}

pub fn from_json_str(text: &str) -> Result<JsonDocument> {
    let value: Value = serde_json::from_str(text).map_err(|error| XbrlError::SchemaValidation {
        url: "<json>".to_string(),
        reason: format!("invalid JSON: {}", error),
    })?;
    from_json_value(&value)
}

pub fn from_json_value(value: &Value) -> Result<JsonDocument> {
    let invalid = |reason: &str| XbrlError::SchemaValidation {
        url: "<json>".to_string(),
        reason: reason.to_string(),
    };

    let info = value
        .get("documentInfo")
        .ok_or_else(|| invalid("missing documentInfo"))?;
    let document_type = info
        .get("documentType")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("missing documentInfo.documentType"))?
        .to_string();
    let taxonomy = info
        .get("taxonomy")
        .and_then(Value::as_array)
        .map(|urls| {
            urls.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let base_url = info
        .get("baseUrl")
        .and_then(Value::as_str)
        .map(str::to_string);

    let mut facts = Vec::new();
    if let Some(map) = value.get("facts").and_then(Value::as_object) {
        for (id, body) in map {
            facts.push(parse_fact(id, body)?);
        }
    }

    Ok(JsonDocument {
        document_type,
        taxonomy,
        base_url,
        facts,
    })
}

fn parse_fact(id: &str, body: &Value) -> Result<JsonFact> {
    let dimensions = body
        .get("dimensions")
        .and_then(Value::as_object)
        .ok_or_else(|| XbrlError::SchemaValidation {
            url: "<json>".to_string(),
            reason: format!("fact {} has no dimensions", id),
        })?;
    let concept = dimensions
        .get("concept")
        .and_then(Value::as_str)
        .ok_or_else(|| XbrlError::SchemaValidation {
            url: "<json>".to_string(),
            reason: format!("fact {} has no concept dimension", id),
        })?
        .to_string();

    let mut members = BTreeMap::new();
    for (key, value) in dimensions {
        if let Some(dimension) = key.strip_prefix("dim:") {
            if let Some(member) = value.as_str() {
                members.insert(dimension.to_string(), member.to_string());
            }
        }
    }

    Ok(JsonFact {
        id: id.to_string(),
        concept,
        entity: dimensions
            .get("entity")
            .and_then(Value::as_str)
            .map(str::to_string),
        period: dimensions
            .get("period")
            .and_then(Value::as_str)
            .map(str::to_string),
        unit: dimensions
            .get("unit")
            .and_then(Value::as_str)
            .map(str::to_string),
        language: dimensions
            .get("language")
            .and_then(Value::as_str)
            .map(str::to_string),
        members,
        value: body.get("value").and_then(Value::as_str).map(str::to_string),
        decimals: body
            .get("decimals")
            .and_then(Value::as_i64)
            .map(|decimals| decimals as i32),
    })
}
