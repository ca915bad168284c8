//! Scripted in-memory doubles for the remote seam.
//!
//! The pagination engine is exercised end to end against these: tests queue
//! up pages, descriptions, and failures, run commands, then inspect the
//! recorded calls.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::conversions::Item;
use crate::errors::{Error, Result};
use crate::params::{DeleteParams, PutParams, ReadOp, ReadParams, UpdateParams, UpdateTableParams};
use crate::remote::{
    AccountLimits, MetricQuery, MetricsClient, ReadPage, StoreClient, TableInfo, TableNamePage,
    TtlInfo, WriteAck,
};

fn not_scripted() -> Error {
    Error::Logic("not scripted".to_string())
}

/// A store that hands out queued responses and records every call.
///
/// Reads (`scan`/`query`) share one queue; the recorded [`ReadOp`] tells
/// them apart. Anything not scripted fails with a local error.
#[derive(Default)]
pub struct ScriptedStore {
    list_pages: Mutex<VecDeque<Result<TableNamePage>>>,
    read_pages: Mutex<VecDeque<Result<ReadPage>>>,
    table_infos: Mutex<HashMap<String, TableInfo>>,
    ttl_infos: Mutex<HashMap<String, TtlInfo>>,
    get_results: Mutex<VecDeque<Option<Item>>>,
    limits: Mutex<Option<AccountLimits>>,
    /// Start cursors of every `list_tables` call, in order.
    pub list_calls: Mutex<Vec<Option<String>>>,
    /// Every scan/query call: operation, table, parameters as received.
    pub reads: Mutex<Vec<(ReadOp, String, ReadParams)>>,
    /// Mutation calls, as `"<op> <table>"`.
    pub writes: Mutex<Vec<String>>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_list_page(&self, page: Result<TableNamePage>) {
        self.list_pages.lock().unwrap().push_back(page);
    }

    pub fn push_read_page(&self, page: Result<ReadPage>) {
        self.read_pages.lock().unwrap().push_back(page);
    }

    pub fn push_get_result(&self, item: Option<Item>) {
        self.get_results.lock().unwrap().push_back(item);
    }

    pub fn set_table_info(&self, info: TableInfo) {
        self.table_infos
            .lock()
            .unwrap()
            .insert(info.table_name.clone(), info);
    }

    pub fn set_ttl_info(&self, table: &str, info: TtlInfo) {
        self.ttl_infos.lock().unwrap().insert(table.to_string(), info);
    }

    pub fn set_limits(&self, limits: AccountLimits) {
        *self.limits.lock().unwrap() = Some(limits);
    }

    fn next_read(&self, op: ReadOp, table: &str, params: &ReadParams) -> Result<ReadPage> {
        self.reads
            .lock()
            .unwrap()
            .push((op, table.to_string(), params.clone()));
        self.read_pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(not_scripted()))
    }
}

#[async_trait]
impl StoreClient for ScriptedStore {
    async fn list_tables(
        &self,
        exclusive_start_table_name: Option<String>,
    ) -> Result<TableNamePage> {
        self.list_calls
            .lock()
            .unwrap()
            .push(exclusive_start_table_name);
        self.list_pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(not_scripted()))
    }

    async fn describe_table(&self, table: &str) -> Result<TableInfo> {
        self.table_infos
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .ok_or_else(not_scripted)
    }

    async fn scan(&self, table: &str, params: &ReadParams) -> Result<ReadPage> {
        self.next_read(ReadOp::Scan, table, params)
    }

    async fn query(&self, table: &str, params: &ReadParams) -> Result<ReadPage> {
        self.next_read(ReadOp::Query, table, params)
    }

    async fn get_item(&self, table: &str, _key: Item) -> Result<Option<Item>> {
        self.writes.lock().unwrap().push(format!("get {}", table));
        self.get_results
            .lock()
            .unwrap()
            .pop_front()
            .map(Ok)
            .unwrap_or_else(|| Err(not_scripted()))
    }

    async fn put_item(&self, table: &str, _params: &PutParams) -> Result<WriteAck> {
        self.writes.lock().unwrap().push(format!("put {}", table));
        Ok(WriteAck::default())
    }

    async fn update_item(&self, table: &str, _params: &UpdateParams) -> Result<WriteAck> {
        self.writes.lock().unwrap().push(format!("update {}", table));
        Ok(WriteAck::default())
    }

    async fn delete_item(&self, table: &str, _params: &DeleteParams) -> Result<WriteAck> {
        self.writes.lock().unwrap().push(format!("delete {}", table));
        Ok(WriteAck::default())
    }

    async fn update_table(&self, table: &str, _params: &UpdateTableParams) -> Result<TableInfo> {
        self.writes
            .lock()
            .unwrap()
            .push(format!("update-table {}", table));
        self.table_infos
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .ok_or_else(not_scripted)
    }

    async fn describe_time_to_live(&self, table: &str) -> Result<TtlInfo> {
        self.ttl_infos
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .ok_or_else(not_scripted)
    }

    async fn describe_limits(&self) -> Result<AccountLimits> {
        self.limits.lock().unwrap().clone().ok_or_else(not_scripted)
    }
}

/// A metrics source answering from a fixed table of sums.
///
/// Keyed by metric name and optional index name; anything missing sums to
/// zero. Every query is recorded.
#[derive(Default)]
pub struct ScriptedMetrics {
    sums: HashMap<(String, Option<String>), f64>,
    pub queries: Mutex<Vec<MetricQuery>>,
}

impl ScriptedMetrics {
    pub fn new(sums: &[(&str, Option<&str>, f64)]) -> Self {
        ScriptedMetrics {
            sums: sums
                .iter()
                .map(|(metric, index, sum)| ((metric.to_string(), index.map(str::to_string)), *sum))
                .collect(),
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl MetricsClient for ScriptedMetrics {
    async fn consumed_sum(&self, query: &MetricQuery) -> Result<f64> {
        self.queries.lock().unwrap().push(query.clone());
        Ok(self
            .sums
            .get(&(query.metric_name.clone(), query.index_name.clone()))
            .copied()
            .unwrap_or(0.0))
    }
}
