//! Capacity statistics.
//!
//! One snapshot call describes the table, pulls the consumed-capacity sums
//! for the base table and every global secondary index over the lookback
//! window, and merges the normalized rates with the provisioned figures from
//! the description. Snapshots are always computed fresh.

use chrono::{DateTime, TimeDelta, Utc};
use futures::future::{try_join, try_join_all};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::errors::Result;
use crate::remote::{MetricQuery, MetricsClient, StoreClient, TableInfo, ThroughputInfo};

/// Metric sampling period, in minutes.
const PERIOD_MINUTES: i64 = 5;
/// Lookback window the rates are averaged over, in minutes.
const WINDOW_MINUTES: i64 = 60;

const READ_METRIC: &str = "ConsumedReadCapacityUnits";
const WRITE_METRIC: &str = "ConsumedWriteCapacityUnits";

/// Average consumption over the window, in units per second.
///
/// Kept as the raw quotient: a table reading half a unit per second reports
/// 0.5, not 0 or 1.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ConsumedRates {
    pub read_units_per_second: f64,
    pub write_units_per_second: f64,
}

/// Provisioned capacity next to what was actually consumed.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CapacityStats {
    pub provisioned: ThroughputInfo,
    pub consumed: ConsumedRates,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct StatsSnapshot {
    pub period_millis: i64,
    pub window_millis: i64,
    pub table: CapacityStats,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub global_secondary_indexes: BTreeMap<String, CapacityStats>,
}

/// Describe the table and compute its capacity snapshot.
pub async fn snapshot(
    store: &dyn StoreClient,
    metrics: &dyn MetricsClient,
    table: &str,
) -> Result<StatsSnapshot> {
    let info = store.describe_table(table).await?;
    collect(metrics, &info).await
}

/// Compute the snapshot for an already-described table.
async fn collect(metrics: &dyn MetricsClient, info: &TableInfo) -> Result<StatsSnapshot> {
    let end_time = Utc::now();
    let start_time = end_time - TimeDelta::minutes(WINDOW_MINUTES);

    let base = consumed_pair(metrics, &info.table_name, None, start_time, end_time);
    let per_index = try_join_all(info.global_secondary_indexes.iter().map(|index| {
        consumed_pair(
            metrics,
            &info.table_name,
            Some(index.index_name.clone()),
            start_time,
            end_time,
        )
    }));

    let (table_rates, index_rates) = try_join(base, per_index).await?;

    let mut global_secondary_indexes = BTreeMap::new();
    for (index, rates) in info.global_secondary_indexes.iter().zip(index_rates) {
        global_secondary_indexes.insert(
            index.index_name.clone(),
            CapacityStats {
                provisioned: index.provisioned_throughput.unwrap_or_default(),
                consumed: rates,
            },
        );
    }

    Ok(StatsSnapshot {
        period_millis: PERIOD_MINUTES * 60 * 1000,
        window_millis: WINDOW_MINUTES * 60 * 1000,
        table: CapacityStats {
            provisioned: info.provisioned_throughput.unwrap_or_default(),
            consumed: table_rates,
        },
        global_secondary_indexes,
    })
}

/// Fetch read and write rates for one table or index, concurrently.
async fn consumed_pair(
    metrics: &dyn MetricsClient,
    table: &str,
    index_name: Option<String>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
) -> Result<ConsumedRates> {
    let read = consumed_rate(
        metrics,
        READ_METRIC,
        table,
        index_name.clone(),
        start_time,
        end_time,
    );
    let write = consumed_rate(metrics, WRITE_METRIC, table, index_name, start_time, end_time);

    let (read_units_per_second, write_units_per_second) = try_join(read, write).await?;
    Ok(ConsumedRates {
        read_units_per_second,
        write_units_per_second,
    })
}

async fn consumed_rate(
    metrics: &dyn MetricsClient,
    metric_name: &str,
    table: &str,
    index_name: Option<String>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
) -> Result<f64> {
    let query = MetricQuery {
        metric_name: metric_name.to_string(),
        table_name: table.to_string(),
        index_name,
        start_time,
        end_time,
        period_seconds: (PERIOD_MINUTES * 60) as i32,
    };
    let sum = metrics.consumed_sum(&query).await?;
    Ok(sum / (WINDOW_MINUTES * 60) as f64)
}
