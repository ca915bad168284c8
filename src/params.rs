//! Request parameters for table operations.
//!
//! Parameters arrive as provider-shaped JSON objects (`Limit`,
//! `FilterExpression`, `ExclusiveStartKey`, ...) and pass through to the
//! store untouched. The only local check is that every key is one the
//! operation recognizes; everything else is the remote's to validate.

use aws_sdk_dynamodb::types::ReturnValue;
use serde_json::Value;
use std::collections::HashMap;

use crate::conversions::{Item, json_to_item};
use crate::errors::{Error, Result};

/// Which paginated read an invocation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOp {
    Scan,
    Query,
}

impl ReadOp {
    pub fn name(&self) -> &'static str {
        match self {
            ReadOp::Scan => "scan",
            ReadOp::Query => "query",
        }
    }
}

/// Parameters for scan and query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadParams {
    pub index_name: Option<String>,
    pub limit: Option<i32>,
    pub consistent_read: Option<bool>,
    pub key_condition_expression: Option<String>,
    pub filter_expression: Option<String>,
    pub projection_expression: Option<String>,
    pub select: Option<String>,
    pub scan_index_forward: Option<bool>,
    pub expression_attribute_names: Option<HashMap<String, String>>,
    pub expression_attribute_values: Option<Item>,
    pub exclusive_start_key: Option<Item>,
}

const READ_KEYS: &str = "IndexName, Limit, ConsistentRead, KeyConditionExpression, \
    FilterExpression, ProjectionExpression, Select, ScanIndexForward, \
    ExpressionAttributeNames, ExpressionAttributeValues, ExclusiveStartKey";

impl ReadParams {
    /// Build read parameters from a provider-shaped JSON object.
    ///
    /// Query-only fields are rejected for scan; unknown keys are rejected
    /// for both.
    pub fn from_json(op: ReadOp, value: &Value) -> Result<Self> {
        let map = expect_object(op.name(), value)?;
        let mut params = ReadParams::default();

        for (key, v) in map {
            match key.as_str() {
                "IndexName" => params.index_name = Some(expect_string(key, v)?),
                "Limit" => params.limit = Some(expect_int(key, v)?),
                "ConsistentRead" => params.consistent_read = Some(expect_bool(key, v)?),
                "KeyConditionExpression" if op == ReadOp::Query => {
                    params.key_condition_expression = Some(expect_string(key, v)?)
                }
                "ScanIndexForward" if op == ReadOp::Query => {
                    params.scan_index_forward = Some(expect_bool(key, v)?)
                }
                "FilterExpression" => params.filter_expression = Some(expect_string(key, v)?),
                "ProjectionExpression" => {
                    params.projection_expression = Some(expect_string(key, v)?)
                }
                "Select" => params.select = Some(expect_string(key, v)?),
                "ExpressionAttributeNames" => {
                    params.expression_attribute_names = Some(expect_string_map(key, v)?)
                }
                "ExpressionAttributeValues" => {
                    params.expression_attribute_values = Some(json_to_item(v)?)
                }
                "ExclusiveStartKey" => params.exclusive_start_key = Some(json_to_item(v)?),
                _ => return Err(unknown_key(op.name(), key, READ_KEYS)),
            }
        }

        Ok(params)
    }

    /// The same read, advanced past a page boundary.
    pub fn resume(&self, cursor: Item) -> Self {
        let mut next = self.clone();
        next.exclusive_start_key = Some(cursor);
        next
    }
}

/// Parameters for put_item.
#[derive(Debug, Clone, PartialEq)]
pub struct PutParams {
    pub item: Item,
    pub condition_expression: Option<String>,
    pub expression_attribute_names: Option<HashMap<String, String>>,
    pub expression_attribute_values: Option<Item>,
    pub return_values: Option<ReturnValue>,
}

const PUT_KEYS: &str = "Item, ConditionExpression, ExpressionAttributeNames, \
    ExpressionAttributeValues, ReturnValues";

impl PutParams {
    pub fn from_json(value: &Value) -> Result<Self> {
        let map = expect_object("put", value)?;
        let mut item = None;
        let mut condition_expression = None;
        let mut expression_attribute_names = None;
        let mut expression_attribute_values = None;
        let mut return_values = None;

        for (key, v) in map {
            match key.as_str() {
                "Item" => item = Some(json_to_item(v)?),
                "ConditionExpression" => condition_expression = Some(expect_string(key, v)?),
                "ExpressionAttributeNames" => {
                    expression_attribute_names = Some(expect_string_map(key, v)?)
                }
                "ExpressionAttributeValues" => {
                    expression_attribute_values = Some(json_to_item(v)?)
                }
                "ReturnValues" => {
                    return_values = Some(parse_return_values(&expect_string(key, v)?)?)
                }
                _ => return Err(unknown_key("put", key, PUT_KEYS)),
            }
        }

        let item = item
            .ok_or_else(|| Error::InvalidParameter("put requires an 'Item' object".to_string()))?;

        Ok(PutParams {
            item,
            condition_expression,
            expression_attribute_names,
            expression_attribute_values,
            return_values,
        })
    }
}

/// Parameters for update_item.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateParams {
    pub key: Item,
    pub update_expression: Option<String>,
    pub condition_expression: Option<String>,
    pub expression_attribute_names: Option<HashMap<String, String>>,
    pub expression_attribute_values: Option<Item>,
    pub return_values: Option<ReturnValue>,
}

const UPDATE_KEYS: &str = "Key, UpdateExpression, ConditionExpression, \
    ExpressionAttributeNames, ExpressionAttributeValues, ReturnValues";

impl UpdateParams {
    pub fn from_json(value: &Value) -> Result<Self> {
        let map = expect_object("update", value)?;
        let mut key_item = None;
        let mut update_expression = None;
        let mut condition_expression = None;
        let mut expression_attribute_names = None;
        let mut expression_attribute_values = None;
        let mut return_values = None;

        for (key, v) in map {
            match key.as_str() {
                "Key" => key_item = Some(json_to_item(v)?),
                "UpdateExpression" => update_expression = Some(expect_string(key, v)?),
                "ConditionExpression" => condition_expression = Some(expect_string(key, v)?),
                "ExpressionAttributeNames" => {
                    expression_attribute_names = Some(expect_string_map(key, v)?)
                }
                "ExpressionAttributeValues" => {
                    expression_attribute_values = Some(json_to_item(v)?)
                }
                "ReturnValues" => {
                    return_values = Some(parse_return_values(&expect_string(key, v)?)?)
                }
                _ => return Err(unknown_key("update", key, UPDATE_KEYS)),
            }
        }

        let key = key_item
            .ok_or_else(|| Error::InvalidParameter("update requires a 'Key' object".to_string()))?;

        Ok(UpdateParams {
            key,
            update_expression,
            condition_expression,
            expression_attribute_names,
            expression_attribute_values,
            return_values,
        })
    }
}

/// Parameters for delete_item.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteParams {
    pub key: Item,
    pub condition_expression: Option<String>,
    pub expression_attribute_names: Option<HashMap<String, String>>,
    pub expression_attribute_values: Option<Item>,
    pub return_values: Option<ReturnValue>,
}

const DELETE_KEYS: &str = "Key, ConditionExpression, ExpressionAttributeNames, \
    ExpressionAttributeValues, ReturnValues";

impl DeleteParams {
    pub fn from_json(value: &Value) -> Result<Self> {
        let map = expect_object("delete", value)?;
        let mut key_item = None;
        let mut condition_expression = None;
        let mut expression_attribute_names = None;
        let mut expression_attribute_values = None;
        let mut return_values = None;

        for (key, v) in map {
            match key.as_str() {
                "Key" => key_item = Some(json_to_item(v)?),
                "ConditionExpression" => condition_expression = Some(expect_string(key, v)?),
                "ExpressionAttributeNames" => {
                    expression_attribute_names = Some(expect_string_map(key, v)?)
                }
                "ExpressionAttributeValues" => {
                    expression_attribute_values = Some(json_to_item(v)?)
                }
                "ReturnValues" => {
                    return_values = Some(parse_return_values(&expect_string(key, v)?)?)
                }
                _ => return Err(unknown_key("delete", key, DELETE_KEYS)),
            }
        }

        let key = key_item
            .ok_or_else(|| Error::InvalidParameter("delete requires a 'Key' object".to_string()))?;

        Ok(DeleteParams {
            key,
            condition_expression,
            expression_attribute_names,
            expression_attribute_values,
            return_values,
        })
    }
}

/// Parameters for update_table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateTableParams {
    pub billing_mode: Option<String>,
    pub provisioned_throughput: Option<(i64, i64)>,
}

const UPDATE_TABLE_KEYS: &str = "BillingMode, ProvisionedThroughput";

impl UpdateTableParams {
    pub fn from_json(value: &Value) -> Result<Self> {
        let map = expect_object("update-table", value)?;
        let mut params = UpdateTableParams::default();

        for (key, v) in map {
            match key.as_str() {
                "BillingMode" => params.billing_mode = Some(expect_string(key, v)?),
                "ProvisionedThroughput" => {
                    params.provisioned_throughput = Some(parse_throughput(v)?)
                }
                _ => return Err(unknown_key("update-table", key, UPDATE_TABLE_KEYS)),
            }
        }

        Ok(params)
    }
}

fn parse_throughput(value: &Value) -> Result<(i64, i64)> {
    let read = value
        .get("ReadCapacityUnits")
        .and_then(Value::as_i64)
        .ok_or_else(|| {
            Error::InvalidParameter(
                "'ProvisionedThroughput' requires numeric 'ReadCapacityUnits'".to_string(),
            )
        })?;
    let write = value
        .get("WriteCapacityUnits")
        .and_then(Value::as_i64)
        .ok_or_else(|| {
            Error::InvalidParameter(
                "'ProvisionedThroughput' requires numeric 'WriteCapacityUnits'".to_string(),
            )
        })?;
    Ok((read, write))
}

/// Convert a string to a DynamoDB ReturnValue.
fn parse_return_values(value: &str) -> Result<ReturnValue> {
    match value {
        "NONE" => Ok(ReturnValue::None),
        "ALL_OLD" => Ok(ReturnValue::AllOld),
        "UPDATED_OLD" => Ok(ReturnValue::UpdatedOld),
        "ALL_NEW" => Ok(ReturnValue::AllNew),
        "UPDATED_NEW" => Ok(ReturnValue::UpdatedNew),
        _ => Err(Error::InvalidParameter(format!(
            "Invalid ReturnValues: '{}'. Must be one of: NONE, ALL_OLD, UPDATED_OLD, ALL_NEW, UPDATED_NEW",
            value
        ))),
    }
}

fn expect_object<'a>(op: &str, value: &'a Value) -> Result<&'a serde_json::Map<String, Value>> {
    value.as_object().ok_or_else(|| {
        Error::InvalidParameter(format!("{} parameters must be a JSON object", op))
    })
}

fn expect_string(key: &str, value: &Value) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidParameter(format!("'{}' must be a string", key)))
}

fn expect_bool(key: &str, value: &Value) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| Error::InvalidParameter(format!("'{}' must be a boolean", key)))
}

fn expect_int(key: &str, value: &Value) -> Result<i32> {
    value
        .as_i64()
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| Error::InvalidParameter(format!("'{}' must be an integer", key)))
}

fn expect_string_map(key: &str, value: &Value) -> Result<HashMap<String, String>> {
    let map = value
        .as_object()
        .ok_or_else(|| Error::InvalidParameter(format!("'{}' must be a JSON object", key)))?;

    let mut result = HashMap::new();
    for (k, v) in map {
        let s = v.as_str().ok_or_else(|| {
            Error::InvalidParameter(format!("'{}' entries must be strings", key))
        })?;
        result.insert(k.clone(), s.to_string());
    }
    Ok(result)
}

fn unknown_key(op: &str, key: &str, recognized: &str) -> Error {
    Error::InvalidParameter(format!(
        "Unknown parameter '{}' for {}. Recognized: {}",
        key, op, recognized
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::types::AttributeValue;
    use serde_json::json;

    #[test]
    fn read_params_pass_through() {
        let params = ReadParams::from_json(
            ReadOp::Query,
            &json!({
                "KeyConditionExpression": "pk = :p",
                "ExpressionAttributeValues": { ":p": "user#1" },
                "Limit": 25,
                "ScanIndexForward": false
            }),
        )
        .unwrap();

        assert_eq!(params.key_condition_expression.as_deref(), Some("pk = :p"));
        assert_eq!(params.limit, Some(25));
        assert_eq!(params.scan_index_forward, Some(false));
        let values = params.expression_attribute_values.unwrap();
        assert_eq!(values[":p"], AttributeValue::S("user#1".to_string()));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ReadParams::from_json(ReadOp::Scan, &json!({ "Limt": 5 })).unwrap_err();
        match err {
            Error::InvalidParameter(msg) => {
                assert!(msg.contains("Limt"));
                assert!(msg.contains("Recognized"));
            }
            other => panic!("expected InvalidParameter, got {:?}", other),
        }
    }

    #[test]
    fn query_only_keys_are_rejected_for_scan() {
        let err =
            ReadParams::from_json(ReadOp::Scan, &json!({ "KeyConditionExpression": "pk = :p" }))
                .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));

        let err =
            ReadParams::from_json(ReadOp::Scan, &json!({ "ScanIndexForward": true })).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[test]
    fn resume_sets_the_cursor_and_keeps_everything_else() {
        let base = ReadParams::from_json(
            ReadOp::Scan,
            &json!({ "Limit": 2, "FilterExpression": "attribute_exists(sk)" }),
        )
        .unwrap();

        let mut cursor = Item::new();
        cursor.insert("pk".to_string(), AttributeValue::S("user#2".to_string()));
        let resumed = base.resume(cursor.clone());

        assert_eq!(resumed.limit, base.limit);
        assert_eq!(resumed.filter_expression, base.filter_expression);
        assert_eq!(resumed.exclusive_start_key, Some(cursor));
        assert_eq!(base.exclusive_start_key, None);
    }

    #[test]
    fn resume_replaces_an_existing_cursor() {
        let mut first = Item::new();
        first.insert("pk".to_string(), AttributeValue::S("a".to_string()));
        let base = ReadParams::default().resume(first);

        let mut second = Item::new();
        second.insert("pk".to_string(), AttributeValue::S("b".to_string()));
        let resumed = base.resume(second.clone());

        assert_eq!(resumed.exclusive_start_key, Some(second));
    }

    #[test]
    fn put_requires_an_item() {
        let err = PutParams::from_json(&json!({ "ConditionExpression": "x" })).unwrap_err();
        match err {
            Error::InvalidParameter(msg) => assert!(msg.contains("Item")),
            other => panic!("expected InvalidParameter, got {:?}", other),
        }

        let params = PutParams::from_json(&json!({
            "Item": { "pk": "user#1", "n": 7 },
            "ReturnValues": "ALL_OLD"
        }))
        .unwrap();
        assert_eq!(params.return_values, Some(ReturnValue::AllOld));
        assert_eq!(params.item["n"], AttributeValue::N("7".to_string()));
    }

    #[test]
    fn bad_return_values_name_the_options() {
        let err = UpdateParams::from_json(&json!({
            "Key": { "pk": "a" },
            "ReturnValues": "EVERYTHING"
        }))
        .unwrap_err();
        match err {
            Error::InvalidParameter(msg) => assert!(msg.contains("ALL_NEW")),
            other => panic!("expected InvalidParameter, got {:?}", other),
        }
    }

    #[test]
    fn update_table_parses_throughput() {
        let params = UpdateTableParams::from_json(&json!({
            "ProvisionedThroughput": { "ReadCapacityUnits": 10, "WriteCapacityUnits": 5 }
        }))
        .unwrap();
        assert_eq!(params.provisioned_throughput, Some((10, 5)));

        let err = UpdateTableParams::from_json(&json!({
            "ProvisionedThroughput": { "ReadCapacityUnits": 10 }
        }))
        .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }
}
