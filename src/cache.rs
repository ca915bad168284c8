//! Process-lifetime cache.
//!
//! String-keyed, write-once-read-many in practice. The registry parks its
//! table set here so repeated lookups cost nothing until the entry is
//! dropped.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// A string-keyed cache of cloneable values living as long as the process.
pub struct ProcessCache<T> {
    entries: Mutex<HashMap<String, T>>,
}

impl<T> Default for ProcessCache<T> {
    fn default() -> Self {
        ProcessCache {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: Clone> ProcessCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<T> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn set(&self, key: &str, value: T) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
    }

    pub fn remove(&self, key: &str) -> Option<T> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }
}
