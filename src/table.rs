//! Table handles.
//!
//! A `TableHandle` bundles a table name with the remote clients and exposes
//! every per-table operation as a plain blocking call. Scan and query come
//! back as [`Page`]s; when the store stops at a page boundary the page
//! carries a continuation that re-issues the same operation with the cursor
//! advanced.

use std::fmt;
use std::sync::Arc;

use crate::bridge;
use crate::conversions::Item;
use crate::errors::Result;
use crate::page::{Continuation, Page};
use crate::params::{DeleteParams, PutParams, ReadOp, ReadParams, UpdateParams, UpdateTableParams};
use crate::remote::{MetricsClient, ReadPage, StoreClient, TableInfo, TtlInfo, WriteAck};
use crate::stats::{self, StatsSnapshot};

struct TableInner {
    name: String,
    store: Arc<dyn StoreClient>,
    metrics: Arc<dyn MetricsClient>,
}

/// A cheap-clone handle to one remote table.
///
/// Equality is identity: two handles are equal only when they share the same
/// inner allocation. The registry relies on this to expose one table under
/// several names.
#[derive(Clone)]
pub struct TableHandle {
    inner: Arc<TableInner>,
}

impl PartialEq for TableHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for TableHandle {}

impl TableHandle {
    pub fn new(
        name: impl Into<String>,
        store: Arc<dyn StoreClient>,
        metrics: Arc<dyn MetricsClient>,
    ) -> Self {
        TableHandle {
            inner: Arc::new(TableInner {
                name: name.into(),
                store,
                metrics,
            }),
        }
    }

    /// The raw remote table name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn describe(&self) -> Result<TableInfo> {
        bridge::wait(self.inner.store.describe_table(&self.inner.name))
    }

    /// Read a page of items, optionally filtered.
    pub fn scan(&self, params: ReadParams) -> Result<Page> {
        self.read(ReadOp::Scan, params)
    }

    /// Read a page of items matching a key condition.
    pub fn query(&self, params: ReadParams) -> Result<Page> {
        self.read(ReadOp::Query, params)
    }

    fn read(&self, op: ReadOp, params: ReadParams) -> Result<Page> {
        let response = bridge::wait(async {
            match op {
                ReadOp::Scan => self.inner.store.scan(&self.inner.name, &params).await,
                ReadOp::Query => self.inner.store.query(&self.inner.name, &params).await,
            }
        })?;
        Ok(self.page_of(op, params, response))
    }

    /// Wrap a raw response page, attaching the continuation when the read
    /// stopped at a page boundary.
    ///
    /// The continuation re-issues the same operation with the same
    /// parameters plus the returned cursor, and builds its own page by this
    /// same rule. The cursor being present is the only thing that matters;
    /// an empty page with a cursor still continues.
    fn page_of(&self, op: ReadOp, params: ReadParams, response: ReadPage) -> Page {
        let next: Option<Continuation> = response.last_evaluated_key.map(|cursor| {
            let handle = self.clone();
            let resumed = params.resume(cursor);
            Arc::new(move || handle.read(op, resumed.clone())) as Continuation
        });

        Page {
            items: response.items,
            next,
        }
    }

    /// Point read by full primary key. An absent item is `None`, not an
    /// error.
    pub fn get(&self, key: Item) -> Result<Option<Item>> {
        bridge::wait(self.inner.store.get_item(&self.inner.name, key))
    }

    pub fn put(&self, params: PutParams) -> Result<WriteAck> {
        bridge::wait(self.inner.store.put_item(&self.inner.name, &params))
    }

    pub fn update(&self, params: UpdateParams) -> Result<WriteAck> {
        bridge::wait(self.inner.store.update_item(&self.inner.name, &params))
    }

    pub fn delete(&self, params: DeleteParams) -> Result<WriteAck> {
        bridge::wait(self.inner.store.delete_item(&self.inner.name, &params))
    }

    pub fn update_table(&self, params: UpdateTableParams) -> Result<TableInfo> {
        bridge::wait(self.inner.store.update_table(&self.inner.name, &params))
    }

    pub fn describe_time_to_live(&self) -> Result<TtlInfo> {
        bridge::wait(self.inner.store.describe_time_to_live(&self.inner.name))
    }

    /// Fresh capacity snapshot; never cached.
    pub fn stats(&self) -> Result<StatsSnapshot> {
        bridge::wait(stats::snapshot(
            self.inner.store.as_ref(),
            self.inner.metrics.as_ref(),
            &self.inner.name,
        ))
    }
}

impl fmt::Display for TableHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: describe, scan, query, get, put, update, delete, update-table, ttl, stats",
            self.inner.name
        )
    }
}

impl fmt::Debug for TableHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableHandle")
            .field("name", &self.inner.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedMetrics, ScriptedStore};
    use aws_sdk_dynamodb::types::AttributeValue;

    fn item(id: &str) -> Item {
        let mut map = Item::new();
        map.insert("pk".to_string(), AttributeValue::S(id.to_string()));
        map
    }

    fn store_with(pages: Vec<ReadPage>) -> Arc<ScriptedStore> {
        let store = ScriptedStore::new();
        for page in pages {
            store.push_read_page(Ok(page));
        }
        Arc::new(store)
    }

    fn handle_over(store: Arc<ScriptedStore>) -> TableHandle {
        TableHandle::new("user-sessions", store, Arc::new(ScriptedMetrics::default()))
    }

    #[test]
    fn a_complete_read_is_terminal() {
        let store = store_with(vec![ReadPage {
            items: vec![item("a")],
            last_evaluated_key: None,
        }]);

        let page = handle_over(store).scan(ReadParams::default()).unwrap();
        assert!(!page.has_more());
        assert_eq!(page.items, vec![item("a")]);
    }

    #[test]
    fn the_continuation_reissues_the_same_read_with_the_cursor() {
        let store = store_with(vec![
            ReadPage {
                items: vec![item("a"), item("b")],
                last_evaluated_key: Some(item("b")),
            },
            ReadPage {
                items: vec![item("c")],
                last_evaluated_key: None,
            },
        ]);

        let base = ReadParams {
            limit: Some(2),
            filter_expression: Some("attribute_exists(pk)".to_string()),
            ..Default::default()
        };

        let page = handle_over(store.clone()).scan(base.clone()).unwrap();
        assert!(page.has_more());

        let next = page.next.as_ref().unwrap()().unwrap();
        assert_eq!(next.items, vec![item("c")]);
        assert!(!next.has_more());

        let reads = store.reads.lock().unwrap();
        assert_eq!(reads.len(), 2);

        // First call went out exactly as given
        assert_eq!(reads[0].0, ReadOp::Scan);
        assert_eq!(reads[0].1, "user-sessions");
        assert_eq!(reads[0].2, base);

        // The resumed call is the same read with only the cursor added
        assert_eq!(reads[1].0, ReadOp::Scan);
        assert_eq!(reads[1].2, base.resume(item("b")));
    }

    #[test]
    fn an_empty_page_with_a_cursor_still_continues() {
        let store = store_with(vec![
            ReadPage {
                items: vec![],
                last_evaluated_key: Some(item("x")),
            },
            ReadPage {
                items: vec![item("y")],
                last_evaluated_key: None,
            },
        ]);

        let page = handle_over(store).scan(ReadParams::default()).unwrap();
        assert!(page.items.is_empty());
        assert!(page.has_more());

        let next = page.next.as_ref().unwrap()().unwrap();
        assert_eq!(next.items, vec![item("y")]);
    }

    #[test]
    fn a_query_resumes_as_a_query() {
        let store = store_with(vec![
            ReadPage {
                items: vec![item("a")],
                last_evaluated_key: Some(item("a")),
            },
            ReadPage {
                items: vec![],
                last_evaluated_key: None,
            },
        ]);

        let params = ReadParams {
            key_condition_expression: Some("pk = :p".to_string()),
            ..Default::default()
        };
        let page = handle_over(store.clone()).query(params).unwrap();
        page.next.as_ref().unwrap()().unwrap();

        let reads = store.reads.lock().unwrap();
        assert_eq!(reads[0].0, ReadOp::Query);
        assert_eq!(reads[1].0, ReadOp::Query);
        assert_eq!(
            reads[1].2.key_condition_expression.as_deref(),
            Some("pk = :p")
        );
    }

    #[test]
    fn a_continuation_can_be_retried_after_a_failure() {
        let store = store_with(vec![ReadPage {
            items: vec![item("a")],
            last_evaluated_key: Some(item("a")),
        }]);

        let page = handle_over(store.clone()).scan(ReadParams::default()).unwrap();
        let next = page.next.as_ref().unwrap();

        // Script exhausted: the resume fails, but the continuation itself
        // stays callable
        assert!(next().is_err());

        store.push_read_page(Ok(ReadPage {
            items: vec![item("b")],
            last_evaluated_key: None,
        }));
        let resumed = next().unwrap();
        assert_eq!(resumed.items, vec![item("b")]);
    }

    #[test]
    fn handles_compare_by_identity() {
        let store = Arc::new(ScriptedStore::new());
        let a = TableHandle::new("t", store.clone(), Arc::new(ScriptedMetrics::default()));
        let b = TableHandle::new("t", store, Arc::new(ScriptedMetrics::default()));

        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn display_lists_the_operations() {
        let store = Arc::new(ScriptedStore::new());
        let handle = handle_over(store);
        let rendered = handle.to_string();
        assert!(rendered.starts_with("user-sessions:"));
        assert!(rendered.contains("scan"));
        assert!(rendered.contains("stats"));
    }
}
