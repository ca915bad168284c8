//! Type conversions between JSON and DynamoDB AttributeValue.
//!
//! Input JSON maps onto the scalar, list, and map attribute types. The set
//! types (SS/NS/BS) and binary values come back from the store and render as
//! JSON arrays / base64 strings, but cannot be expressed in input JSON.

use aws_sdk_dynamodb::types::AttributeValue;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde_json::{Map, Number, Value, json};
use std::collections::HashMap;

use crate::errors::{Error, Result};

/// An item as the store sends and receives it.
pub type Item = HashMap<String, AttributeValue>;

/// Convert a JSON value to a DynamoDB AttributeValue.
///
/// Handles: null, bool, string, number, array, object.
pub fn json_to_attribute_value(value: &Value) -> Result<AttributeValue> {
    match value {
        Value::Null => Ok(AttributeValue::Null(true)),
        Value::Bool(b) => Ok(AttributeValue::Bool(*b)),
        Value::String(s) => Ok(AttributeValue::S(s.clone())),
        // DynamoDB numbers travel as strings; the JSON text form is exact
        Value::Number(n) => Ok(AttributeValue::N(n.to_string())),
        Value::Array(items) => {
            let list = items
                .iter()
                .map(json_to_attribute_value)
                .collect::<Result<Vec<_>>>()?;
            Ok(AttributeValue::L(list))
        }
        Value::Object(map) => Ok(AttributeValue::M(json_map_to_attribute_values(map)?)),
    }
}

/// Convert a JSON object's entries to a map of AttributeValues.
pub fn json_map_to_attribute_values(map: &Map<String, Value>) -> Result<Item> {
    let mut result = HashMap::new();
    for (key, value) in map {
        result.insert(key.clone(), json_to_attribute_value(value)?);
    }
    Ok(result)
}

/// Convert a JSON value that must be an object into an item.
///
/// Used for keys, items, and expression attribute values.
pub fn json_to_item(value: &Value) -> Result<Item> {
    match value {
        Value::Object(map) => json_map_to_attribute_values(map),
        other => Err(Error::InvalidParameter(format!(
            "Expected a JSON object, got {}",
            json_type_name(other)
        ))),
    }
}

/// Convert a DynamoDB AttributeValue to a JSON value.
///
/// Total: numbers that fit neither i64 nor f64 come back as strings, binary
/// values as base64 strings, sets as arrays.
pub fn attribute_value_to_json(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => number_to_json(n),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::B(blob) => Value::String(BASE64.encode(blob.as_ref())),
        AttributeValue::L(list) => Value::Array(list.iter().map(attribute_value_to_json).collect()),
        AttributeValue::M(map) => item_to_json(map),
        AttributeValue::Ss(ss) => {
            Value::Array(ss.iter().map(|s| Value::String(s.clone())).collect())
        }
        AttributeValue::Ns(ns) => Value::Array(ns.iter().map(|n| number_to_json(n)).collect()),
        AttributeValue::Bs(bs) => Value::Array(
            bs.iter()
                .map(|b| Value::String(BASE64.encode(b.as_ref())))
                .collect(),
        ),
        _ => Value::Null,
    }
}

/// Convert an item to a JSON object.
pub fn item_to_json(item: &Item) -> Value {
    let mut map = Map::new();
    for (key, value) in item {
        map.insert(key.clone(), attribute_value_to_json(value));
    }
    Value::Object(map)
}

/// Parse a DynamoDB number string into a JSON number.
///
/// Integers first, then floats. DynamoDB's number range exceeds both, so a
/// value that fits neither is kept as its exact string form.
fn number_to_json(n: &str) -> Value {
    if n.contains('.') || n.contains('e') || n.contains('E') {
        if let Ok(f) = n.parse::<f64>()
            && let Some(num) = Number::from_f64(f)
        {
            return Value::Number(num);
        }
    } else if let Ok(i) = n.parse::<i64>() {
        return json!(i);
    } else if let Ok(f) = n.parse::<f64>()
        && let Some(num) = Number::from_f64(f)
    {
        return Value::Number(num);
    }
    Value::String(n.to_string())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
