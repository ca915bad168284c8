//! The continuation broadcast.
//!
//! One slot for the whole process: displaying a value overwrites it (a page
//! with more to fetch arms it, anything else clears it), and the `it`
//! command reads it. Only the display path writes the slot, so a failed
//! resume leaves the previous continuation in place for another try.

use std::sync::{Arc, Mutex, PoisonError};

use crate::errors::Result;
use crate::page::{Continuation, Page};

/// A cheap-clone handle to the single continuation slot.
#[derive(Clone, Default)]
pub struct Broadcast {
    slot: Arc<Mutex<Option<Continuation>>>,
}

impl Broadcast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record what the value just displayed left behind. `None` clears the
    /// slot: after a non-paginated value, `it` is a no-op again.
    pub fn update(&self, next: Option<Continuation>) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }

    /// Whether `it` currently has anywhere to go.
    pub fn is_armed(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Invoke the stored continuation. An empty slot is `Ok(None)`, a
    /// silent no-op.
    ///
    /// The slot is not modified here, whatever the outcome; it changes only
    /// when the next value is displayed.
    pub fn resume(&self) -> Result<Option<Page>> {
        let continuation = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        match continuation {
            Some(next) => next().map(Some),
            None => Ok(None),
        }
    }
}
