//! Table discovery and the memoized table set.
//!
//! Discovery walks `list_tables` to completion in one blocking call; the
//! boundary between name pages is never user-visible. The resulting set of
//! handles is built once, cached for the life of the process, and handed out
//! untouched until `invalidate` drops it.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

use crate::bridge;
use crate::cache::ProcessCache;
use crate::errors::Result;
use crate::remote::{AccountLimits, MetricsClient, StoreClient};
use crate::table::TableHandle;

const TABLES_CACHE_KEY: &str = "tables";

/// Replace every character outside `[A-Za-z0-9_]` with `_`, so a table name
/// can be typed as a bare identifier.
pub fn alias_of(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// The discovered tables, reachable by alias or raw name.
///
/// Listings enumerate aliases only; the raw spellings stay as hidden lookup
/// entries resolving to the same handles.
#[derive(Debug)]
pub struct TableSet {
    aliased: BTreeMap<String, TableHandle>,
    raw: HashMap<String, TableHandle>,
}

impl TableSet {
    fn build(
        names: &[String],
        store: &Arc<dyn StoreClient>,
        metrics: &Arc<dyn MetricsClient>,
    ) -> Self {
        let mut aliased = BTreeMap::new();
        let mut raw = HashMap::new();

        for name in names {
            let handle = TableHandle::new(name.clone(), store.clone(), metrics.clone());
            raw.insert(name.clone(), handle.clone());
            // On alias collision the later table wins; the raw names still
            // tell them apart
            aliased.insert(alias_of(name), handle);
        }

        TableSet { aliased, raw }
    }

    /// Resolve a table by exact raw name first, then by alias.
    pub fn get(&self, name: &str) -> Option<&TableHandle> {
        self.raw.get(name).or_else(|| self.aliased.get(name))
    }

    /// The enumerable entries: every alias with its handle, sorted.
    pub fn aliases(&self) -> impl Iterator<Item = (&str, &TableHandle)> {
        self.aliased.iter().map(|(alias, handle)| (alias.as_str(), handle))
    }

    pub fn len(&self) -> usize {
        self.aliased.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliased.is_empty()
    }
}

/// Discovers tables once and hands out the memoized set.
pub struct Registry {
    store: Arc<dyn StoreClient>,
    metrics: Arc<dyn MetricsClient>,
    cache: ProcessCache<Arc<TableSet>>,
}

impl Registry {
    pub fn new(store: Arc<dyn StoreClient>, metrics: Arc<dyn MetricsClient>) -> Self {
        Registry {
            store,
            metrics,
            cache: ProcessCache::new(),
        }
    }

    /// The table set, discovering on first use.
    ///
    /// A cache hit returns the stored set as-is, with no remote traffic. A
    /// failed discovery caches nothing, so the next call starts over.
    pub fn fetch_tables(&self) -> Result<Arc<TableSet>> {
        if let Some(tables) = self.cache.get(TABLES_CACHE_KEY) {
            return Ok(tables);
        }

        let names = bridge::wait(drain_table_names(self.store.as_ref()))?;
        let set = Arc::new(TableSet::build(&names, &self.store, &self.metrics));
        self.cache.set(TABLES_CACHE_KEY, set.clone());
        Ok(set)
    }

    /// Drop the memoized set; the next fetch re-discovers.
    pub fn invalidate(&self) {
        self.cache.remove(TABLES_CACHE_KEY);
    }

    /// Account-level capacity limits. Not part of the table set, never
    /// cached.
    pub fn describe_limits(&self) -> Result<AccountLimits> {
        bridge::wait(self.store.describe_limits())
    }
}

/// Walk `list_tables` to completion, concatenating names in arrival order.
async fn drain_table_names(store: &dyn StoreClient) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let mut start: Option<String> = None;

    loop {
        let page = store.list_tables(start).await?;
        names.extend(page.names);
        start = page.last_evaluated_table_name;
        if start.is_none() {
            break;
        }
    }

    debug!(count = names.len(), "table discovery complete");
    Ok(names)
}
