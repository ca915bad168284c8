//! Production clients over the AWS SDK.
//!
//! Builds one shared AWS config (region chain, optional named profile,
//! optional endpoint override) and implements the remote seam traits on top
//! of the DynamoDB and CloudWatch SDK clients.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::meta::region::RegionProviderChain;
use aws_config::profile::ProfileFileCredentialsProvider;
use aws_sdk_cloudwatch::primitives::DateTime as SmithyDateTime;
use aws_sdk_cloudwatch::types::{Dimension, Statistic};
use aws_sdk_dynamodb::types::{
    BillingMode, ProvisionedThroughput, Select, TableDescription, TimeToLiveDescription,
};
use std::sync::Arc;
use tracing::debug;

use crate::bridge;
use crate::conversions::Item;
use crate::errors::{Error, Result, map_cloudwatch_error, map_dynamodb_error};
use crate::params::{DeleteParams, PutParams, ReadParams, UpdateParams, UpdateTableParams};
use crate::remote::{
    AccountLimits, AttributeDefinition, IndexInfo, KeySchemaElement, MetricQuery, MetricsClient,
    ReadPage, StoreClient, TableInfo, TableNamePage, ThroughputInfo, TtlInfo, WriteAck,
};

/// Connection settings from the command line.
#[derive(Debug, Clone, Default)]
pub struct AwsOptions {
    pub region: Option<String>,
    pub profile: Option<String>,
    pub endpoint_url: Option<String>,
}

/// The pair of remote clients the shell runs against, plus the resolved
/// region for display.
pub struct Connection {
    pub store: Arc<dyn StoreClient>,
    pub metrics: Arc<dyn MetricsClient>,
    pub region: String,
}

/// Resolve AWS config and build both service clients.
///
/// Region priority: flag > environment > us-east-1. Credentials come from the
/// named profile when given, otherwise the default chain. The endpoint
/// override applies to both services so local emulators cover the whole
/// surface.
pub fn connect(options: &AwsOptions) -> Connection {
    let sdk_config = bridge::wait(load_config(options));

    let region = sdk_config
        .region()
        .map(|r| r.to_string())
        .unwrap_or_else(|| "us-east-1".to_string());

    let mut dynamo_config = aws_sdk_dynamodb::config::Builder::from(&sdk_config);
    let mut cloudwatch_config = aws_sdk_cloudwatch::config::Builder::from(&sdk_config);
    if let Some(url) = &options.endpoint_url {
        dynamo_config = dynamo_config.endpoint_url(url);
        cloudwatch_config = cloudwatch_config.endpoint_url(url);
    }

    Connection {
        store: Arc::new(DynamoStore {
            client: aws_sdk_dynamodb::Client::from_conf(dynamo_config.build()),
        }),
        metrics: Arc::new(CloudWatchMetrics {
            client: aws_sdk_cloudwatch::Client::from_conf(cloudwatch_config.build()),
        }),
        region,
    }
}

async fn load_config(options: &AwsOptions) -> aws_config::SdkConfig {
    // Region priority: flag > env var > default
    let region_provider = RegionProviderChain::first_try(
        options
            .region
            .clone()
            .map(aws_sdk_dynamodb::config::Region::new),
    )
    .or_default_provider()
    .or_else("us-east-1");

    let mut config_loader = aws_config::defaults(BehaviorVersion::latest()).region(region_provider);

    if let Some(profile_name) = &options.profile {
        let profile_provider = ProfileFileCredentialsProvider::builder()
            .profile_name(profile_name)
            .build();
        config_loader = config_loader.credentials_provider(profile_provider);
    }
    // else: default credential chain (env vars, instance profile, etc)

    config_loader.load().await
}

fn build_error(err: impl std::fmt::Display) -> Error {
    Error::Logic(format!("Failed to build request: {}", err))
}

/// The DynamoDB-backed store.
struct DynamoStore {
    client: aws_sdk_dynamodb::Client,
}

#[async_trait]
impl StoreClient for DynamoStore {
    async fn list_tables(
        &self,
        exclusive_start_table_name: Option<String>,
    ) -> Result<TableNamePage> {
        debug!(start = ?exclusive_start_table_name.as_deref(), "ListTables");
        let output = self
            .client
            .list_tables()
            .set_exclusive_start_table_name(exclusive_start_table_name)
            .send()
            .await
            .map_err(|e| map_dynamodb_error(e, None))?;

        Ok(TableNamePage {
            names: output.table_names().to_vec(),
            last_evaluated_table_name: output.last_evaluated_table_name().map(str::to_string),
        })
    }

    async fn describe_table(&self, table: &str) -> Result<TableInfo> {
        debug!(table, "DescribeTable");
        let output = self
            .client
            .describe_table()
            .table_name(table)
            .send()
            .await
            .map_err(|e| map_dynamodb_error(e, Some(table)))?;

        let desc = output
            .table()
            .ok_or_else(|| Error::Response("DynamoDB returned no table description".to_string()))?;
        Ok(table_info_from(desc))
    }

    async fn scan(&self, table: &str, params: &ReadParams) -> Result<ReadPage> {
        debug!(table, resumed = params.exclusive_start_key.is_some(), "Scan");
        let output = self
            .client
            .scan()
            .table_name(table)
            .set_index_name(params.index_name.clone())
            .set_limit(params.limit)
            .set_consistent_read(params.consistent_read)
            .set_filter_expression(params.filter_expression.clone())
            .set_projection_expression(params.projection_expression.clone())
            .set_select(params.select.as_deref().map(Select::from))
            .set_expression_attribute_names(params.expression_attribute_names.clone())
            .set_expression_attribute_values(params.expression_attribute_values.clone())
            .set_exclusive_start_key(params.exclusive_start_key.clone())
            .send()
            .await
            .map_err(|e| map_dynamodb_error(e, Some(table)))?;

        Ok(ReadPage {
            items: output.items().to_vec(),
            last_evaluated_key: output.last_evaluated_key().cloned(),
        })
    }

    async fn query(&self, table: &str, params: &ReadParams) -> Result<ReadPage> {
        debug!(table, resumed = params.exclusive_start_key.is_some(), "Query");
        let output = self
            .client
            .query()
            .table_name(table)
            .set_index_name(params.index_name.clone())
            .set_limit(params.limit)
            .set_consistent_read(params.consistent_read)
            .set_key_condition_expression(params.key_condition_expression.clone())
            .set_scan_index_forward(params.scan_index_forward)
            .set_filter_expression(params.filter_expression.clone())
            .set_projection_expression(params.projection_expression.clone())
            .set_select(params.select.as_deref().map(Select::from))
            .set_expression_attribute_names(params.expression_attribute_names.clone())
            .set_expression_attribute_values(params.expression_attribute_values.clone())
            .set_exclusive_start_key(params.exclusive_start_key.clone())
            .send()
            .await
            .map_err(|e| map_dynamodb_error(e, Some(table)))?;

        Ok(ReadPage {
            items: output.items().to_vec(),
            last_evaluated_key: output.last_evaluated_key().cloned(),
        })
    }

    async fn get_item(&self, table: &str, key: Item) -> Result<Option<Item>> {
        debug!(table, "GetItem");
        let output = self
            .client
            .get_item()
            .table_name(table)
            .set_key(Some(key))
            .send()
            .await
            .map_err(|e| map_dynamodb_error(e, Some(table)))?;

        Ok(output.item().cloned())
    }

    async fn put_item(&self, table: &str, params: &PutParams) -> Result<WriteAck> {
        debug!(table, "PutItem");
        let output = self
            .client
            .put_item()
            .table_name(table)
            .set_item(Some(params.item.clone()))
            .set_condition_expression(params.condition_expression.clone())
            .set_expression_attribute_names(params.expression_attribute_names.clone())
            .set_expression_attribute_values(params.expression_attribute_values.clone())
            .set_return_values(params.return_values.clone())
            .send()
            .await
            .map_err(|e| map_dynamodb_error(e, Some(table)))?;

        Ok(WriteAck {
            attributes: output.attributes().cloned(),
        })
    }

    async fn update_item(&self, table: &str, params: &UpdateParams) -> Result<WriteAck> {
        debug!(table, "UpdateItem");
        let output = self
            .client
            .update_item()
            .table_name(table)
            .set_key(Some(params.key.clone()))
            .set_update_expression(params.update_expression.clone())
            .set_condition_expression(params.condition_expression.clone())
            .set_expression_attribute_names(params.expression_attribute_names.clone())
            .set_expression_attribute_values(params.expression_attribute_values.clone())
            .set_return_values(params.return_values.clone())
            .send()
            .await
            .map_err(|e| map_dynamodb_error(e, Some(table)))?;

        Ok(WriteAck {
            attributes: output.attributes().cloned(),
        })
    }

    async fn delete_item(&self, table: &str, params: &DeleteParams) -> Result<WriteAck> {
        debug!(table, "DeleteItem");
        let output = self
            .client
            .delete_item()
            .table_name(table)
            .set_key(Some(params.key.clone()))
            .set_condition_expression(params.condition_expression.clone())
            .set_expression_attribute_names(params.expression_attribute_names.clone())
            .set_expression_attribute_values(params.expression_attribute_values.clone())
            .set_return_values(params.return_values.clone())
            .send()
            .await
            .map_err(|e| map_dynamodb_error(e, Some(table)))?;

        Ok(WriteAck {
            attributes: output.attributes().cloned(),
        })
    }

    async fn update_table(&self, table: &str, params: &UpdateTableParams) -> Result<TableInfo> {
        debug!(table, "UpdateTable");
        let mut request = self.client.update_table().table_name(table);

        if let Some(mode) = &params.billing_mode {
            request = request.billing_mode(BillingMode::from(mode.as_str()));
        }
        if let Some((read, write)) = params.provisioned_throughput {
            let throughput = ProvisionedThroughput::builder()
                .read_capacity_units(read)
                .write_capacity_units(write)
                .build()
                .map_err(build_error)?;
            request = request.provisioned_throughput(throughput);
        }

        let output = request
            .send()
            .await
            .map_err(|e| map_dynamodb_error(e, Some(table)))?;

        let desc = output
            .table_description()
            .ok_or_else(|| Error::Response("DynamoDB returned no table description".to_string()))?;
        Ok(table_info_from(desc))
    }

    async fn describe_time_to_live(&self, table: &str) -> Result<TtlInfo> {
        debug!(table, "DescribeTimeToLive");
        let output = self
            .client
            .describe_time_to_live()
            .table_name(table)
            .send()
            .await
            .map_err(|e| map_dynamodb_error(e, Some(table)))?;

        Ok(output
            .time_to_live_description()
            .map(ttl_info_from)
            .unwrap_or_default())
    }

    async fn describe_limits(&self) -> Result<AccountLimits> {
        debug!("DescribeLimits");
        let output = self
            .client
            .describe_limits()
            .send()
            .await
            .map_err(|e| map_dynamodb_error(e, None))?;

        Ok(AccountLimits {
            account_max_read_capacity_units: output.account_max_read_capacity_units(),
            account_max_write_capacity_units: output.account_max_write_capacity_units(),
            table_max_read_capacity_units: output.table_max_read_capacity_units(),
            table_max_write_capacity_units: output.table_max_write_capacity_units(),
        })
    }
}

/// The CloudWatch-backed metrics source.
struct CloudWatchMetrics {
    client: aws_sdk_cloudwatch::Client,
}

#[async_trait]
impl MetricsClient for CloudWatchMetrics {
    async fn consumed_sum(&self, query: &MetricQuery) -> Result<f64> {
        debug!(
            metric = %query.metric_name,
            table = %query.table_name,
            index = ?query.index_name.as_deref(),
            "GetMetricStatistics"
        );

        let mut dimensions = vec![
            Dimension::builder()
                .name("TableName")
                .value(&query.table_name)
                .build(),
        ];
        if let Some(index) = &query.index_name {
            dimensions.push(
                Dimension::builder()
                    .name("GlobalSecondaryIndexName")
                    .value(index)
                    .build(),
            );
        }

        let output = self
            .client
            .get_metric_statistics()
            .namespace("AWS/DynamoDB")
            .metric_name(&query.metric_name)
            .set_dimensions(Some(dimensions))
            .start_time(SmithyDateTime::from_millis(
                query.start_time.timestamp_millis(),
            ))
            .end_time(SmithyDateTime::from_millis(
                query.end_time.timestamp_millis(),
            ))
            .period(query.period_seconds)
            .statistics(Statistic::Sum)
            .send()
            .await
            .map_err(map_cloudwatch_error)?;

        // Absent datapoints contribute nothing
        Ok(output.datapoints().iter().filter_map(|d| d.sum()).sum())
    }
}

fn table_info_from(desc: &TableDescription) -> TableInfo {
    TableInfo {
        table_name: desc.table_name().unwrap_or_default().to_string(),
        table_status: desc.table_status().map(|s| s.as_str().to_string()),
        creation_date_time: desc.creation_date_time().map(|t| t.to_string()),
        key_schema: desc
            .key_schema()
            .iter()
            .map(|k| KeySchemaElement {
                attribute_name: k.attribute_name().to_string(),
                key_type: k.key_type().as_str().to_string(),
            })
            .collect(),
        attribute_definitions: desc
            .attribute_definitions()
            .iter()
            .map(|a| AttributeDefinition {
                attribute_name: a.attribute_name().to_string(),
                attribute_type: a.attribute_type().as_str().to_string(),
            })
            .collect(),
        item_count: desc.item_count(),
        table_size_bytes: desc.table_size_bytes(),
        billing_mode: desc
            .billing_mode_summary()
            .and_then(|s| s.billing_mode())
            .map(|m| m.as_str().to_string()),
        provisioned_throughput: desc.provisioned_throughput().map(|t| ThroughputInfo {
            read_capacity_units: t.read_capacity_units().unwrap_or_default(),
            write_capacity_units: t.write_capacity_units().unwrap_or_default(),
        }),
        global_secondary_indexes: desc
            .global_secondary_indexes()
            .iter()
            .map(|gsi| IndexInfo {
                index_name: gsi.index_name().unwrap_or_default().to_string(),
                index_status: gsi.index_status().map(|s| s.as_str().to_string()),
                key_schema: gsi
                    .key_schema()
                    .iter()
                    .map(|k| KeySchemaElement {
                        attribute_name: k.attribute_name().to_string(),
                        key_type: k.key_type().as_str().to_string(),
                    })
                    .collect(),
                item_count: gsi.item_count(),
                provisioned_throughput: gsi.provisioned_throughput().map(|t| ThroughputInfo {
                    read_capacity_units: t.read_capacity_units().unwrap_or_default(),
                    write_capacity_units: t.write_capacity_units().unwrap_or_default(),
                }),
            })
            .collect(),
    }
}

fn ttl_info_from(desc: &TimeToLiveDescription) -> TtlInfo {
    TtlInfo {
        time_to_live_status: desc
            .time_to_live_status()
            .map(|s| s.as_str().to_string())
            .unwrap_or_default(),
        attribute_name: desc.attribute_name().map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::types::{
        KeySchemaElement as SdkKeySchemaElement, KeyType, ProvisionedThroughputDescription,
        TableStatus, TimeToLiveStatus,
    };

    #[test]
    fn table_description_maps_onto_table_info() {
        let desc = TableDescription::builder()
            .table_name("user-sessions")
            .table_status(TableStatus::Active)
            .key_schema(
                SdkKeySchemaElement::builder()
                    .attribute_name("pk")
                    .key_type(KeyType::Hash)
                    .build()
                    .unwrap(),
            )
            .item_count(42)
            .provisioned_throughput(
                ProvisionedThroughputDescription::builder()
                    .read_capacity_units(5)
                    .write_capacity_units(2)
                    .build(),
            )
            .build();

        let info = table_info_from(&desc);
        assert_eq!(info.table_name, "user-sessions");
        assert_eq!(info.table_status.as_deref(), Some("ACTIVE"));
        assert_eq!(info.key_schema.len(), 1);
        assert_eq!(info.key_schema[0].attribute_name, "pk");
        assert_eq!(info.key_schema[0].key_type, "HASH");
        assert_eq!(info.item_count, Some(42));
        let throughput = info.provisioned_throughput.unwrap();
        assert_eq!(throughput.read_capacity_units, 5);
        assert_eq!(throughput.write_capacity_units, 2);
        assert!(info.global_secondary_indexes.is_empty());
    }

    #[test]
    fn ttl_description_maps_onto_ttl_info() {
        let desc = TimeToLiveDescription::builder()
            .time_to_live_status(TimeToLiveStatus::Enabled)
            .attribute_name("expires_at")
            .build();

        let info = ttl_info_from(&desc);
        assert_eq!(info.time_to_live_status, "ENABLED");
        assert_eq!(info.attribute_name.as_deref(), Some("expires_at"));
    }
}
