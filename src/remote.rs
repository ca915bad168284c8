//! The remote seam.
//!
//! The pagination engine talks to the store and the metrics service through
//! these traits only. Production implementations over the AWS SDK live in
//! `client`; tests drive the engine through scripted in-memory fakes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::conversions::Item;
use crate::errors::Result;
use crate::params::{DeleteParams, PutParams, ReadParams, UpdateParams, UpdateTableParams};

/// One page of table names from discovery.
#[derive(Debug, Clone, Default)]
pub struct TableNamePage {
    pub names: Vec<String>,
    pub last_evaluated_table_name: Option<String>,
}

/// One page of scan/query results.
///
/// A present `last_evaluated_key` means the read stopped at a page boundary,
/// whether or not any items came back with it.
#[derive(Debug, Clone, Default)]
pub struct ReadPage {
    pub items: Vec<Item>,
    pub last_evaluated_key: Option<Item>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct KeySchemaElement {
    pub attribute_name: String,
    pub key_type: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct AttributeDefinition {
    pub attribute_name: String,
    pub attribute_type: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ThroughputInfo {
    pub read_capacity_units: i64,
    pub write_capacity_units: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct IndexInfo {
    pub index_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_status: Option<String>,
    pub key_schema: Vec<KeySchemaElement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioned_throughput: Option<ThroughputInfo>,
}

/// The slice of a table description the shell shows and the stats
/// computation reads.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct TableInfo {
    pub table_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date_time: Option<String>,
    pub key_schema: Vec<KeySchemaElement>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attribute_definitions: Vec<AttributeDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_size_bytes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioned_throughput: Option<ThroughputInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub global_secondary_indexes: Vec<IndexInfo>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct TtlInfo {
    pub time_to_live_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute_name: Option<String>,
}

/// What a mutation came back with. Only populated when the caller asked for
/// return values.
#[derive(Debug, Clone, Default)]
pub struct WriteAck {
    pub attributes: Option<Item>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct AccountLimits {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_max_read_capacity_units: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_max_write_capacity_units: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_max_read_capacity_units: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_max_write_capacity_units: Option<i64>,
}

/// One consumed-capacity series request.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricQuery {
    pub metric_name: String,
    pub table_name: String,
    pub index_name: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub period_seconds: i32,
}

/// The store operations the shell needs.
#[async_trait]
pub trait StoreClient: Send + Sync {
    async fn list_tables(
        &self,
        exclusive_start_table_name: Option<String>,
    ) -> Result<TableNamePage>;

    async fn describe_table(&self, table: &str) -> Result<TableInfo>;

    async fn scan(&self, table: &str, params: &ReadParams) -> Result<ReadPage>;

    async fn query(&self, table: &str, params: &ReadParams) -> Result<ReadPage>;

    async fn get_item(&self, table: &str, key: Item) -> Result<Option<Item>>;

    async fn put_item(&self, table: &str, params: &PutParams) -> Result<WriteAck>;

    async fn update_item(&self, table: &str, params: &UpdateParams) -> Result<WriteAck>;

    async fn delete_item(&self, table: &str, params: &DeleteParams) -> Result<WriteAck>;

    async fn update_table(&self, table: &str, params: &UpdateTableParams) -> Result<TableInfo>;

    async fn describe_time_to_live(&self, table: &str) -> Result<TtlInfo>;

    async fn describe_limits(&self) -> Result<AccountLimits>;
}

/// The metrics operation the stats snapshot needs: the sum of one metric
/// over a time window.
#[async_trait]
pub trait MetricsClient: Send + Sync {
    async fn consumed_sum(&self, query: &MetricQuery) -> Result<f64>;
}
