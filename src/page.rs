//! The resumable result.

use std::fmt;
use std::sync::Arc;

use crate::conversions::Item;
use crate::errors::Result;

/// A callable that re-issues the originating read, advanced one page.
///
/// Invoking it yields a fresh [`Page`] built by the same rule, so a chain of
/// continuations walks the whole result set.
pub type Continuation = Arc<dyn Fn() -> Result<Page> + Send + Sync>;

/// One page of items plus the means to fetch the next.
///
/// `next` never appears in rendering; it only feeds the broadcast slot. An
/// empty `items` with a present `next` is a valid non-terminal page: the
/// store may stop at a page boundary before finding anything to return.
pub struct Page {
    pub items: Vec<Item>,
    pub next: Option<Continuation>,
}

impl Page {
    /// A final page: everything consumed, nothing to resume.
    pub fn terminal(items: Vec<Item>) -> Self {
        Page { items, next: None }
    }

    pub fn has_more(&self) -> bool {
        self.next.is_some()
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("items", &self.items)
            .field("next", &self.next.as_ref().map(|_| "<continuation>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::types::AttributeValue;

    fn item(id: &str) -> Item {
        let mut map = Item::new();
        map.insert("pk".to_string(), AttributeValue::S(id.to_string()));
        map
    }

    #[test]
    fn terminal_pages_have_no_continuation() {
        let page = Page::terminal(vec![item("a")]);
        assert!(!page.has_more());
        assert_eq!(page.items.len(), 1);
    }

    #[test]
    fn an_empty_page_with_a_continuation_is_not_terminal() {
        let page = Page {
            items: vec![],
            next: Some(Arc::new(|| Ok(Page::terminal(vec![])))),
        };
        assert!(page.has_more());
        assert!(page.items.is_empty());
    }

    #[test]
    fn continuations_chain() {
        let last: Continuation = Arc::new(|| Ok(Page::terminal(vec![item("b")])));
        let first = Page {
            items: vec![item("a")],
            next: Some(last),
        };

        let next = first.next.as_ref().unwrap()().unwrap();
        assert_eq!(next.items, vec![item("b")]);
        assert!(!next.has_more());
    }
}
