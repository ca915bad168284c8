//! Rendering and the display side of the broadcast.
//!
//! Every successfully rendered reply overwrites the broadcast slot with its
//! continuation (or clears it). Errors are printed to stderr and leave the
//! slot alone, so a failed fetch does not lose a resumable result.

use colored::Colorize;
use serde_json::Value;

use crate::broadcast::Broadcast;
use crate::commands::Reply;
use crate::conversions::item_to_json;
use crate::errors::Error;
use crate::page::Page;
use crate::registry::TableSet;

const NEXT_PAGE_HINT: &str = ">> type `it` for the next page";

pub struct Printer {
    broadcast: Broadcast,
}

impl Printer {
    pub fn new(broadcast: Broadcast) -> Self {
        Printer { broadcast }
    }

    /// Print a reply and publish its continuation.
    pub fn render(&self, reply: &Reply) {
        match reply {
            Reply::Page(page) => {
                print!("{}", page_text(page));
                if page.has_more() {
                    println!("{}", NEXT_PAGE_HINT.cyan());
                }
            }
            Reply::Value(value) => println!("{}", pretty(value)),
            Reply::Text(text) => println!("{}", text),
            Reply::Tables(set) => print!("{}", tables_text(set)),
            Reply::None => {}
        }

        self.broadcast.update(reply.continuation());
    }

    /// Print an error. The broadcast slot is not touched.
    pub fn render_error(&self, err: &Error) {
        eprintln!("{}", format!("error: {}", err).red());
    }
}

/// The item listing of one page: each item as pretty JSON, then the count.
pub fn page_text(page: &Page) -> String {
    let mut out = String::new();
    for item in &page.items {
        out.push_str(&pretty(&item_to_json(item)));
        out.push('\n');
    }
    let count = match page.items.len() {
        1 => "1 item".to_string(),
        n => format!("{} items", n),
    };
    out.push_str(&count);
    out.push('\n');
    out
}

/// The alias listing: one line per alias, raw name shown when it differs.
pub fn tables_text(set: &TableSet) -> String {
    let mut out = String::new();
    for (alias, handle) in set.aliases() {
        if alias == handle.name() {
            out.push_str(alias);
        } else {
            out.push_str(&format!("{} ({})", alias, handle.name()));
        }
        out.push('\n');
    }
    let count = match set.len() {
        1 => "1 table".to_string(),
        n => format!("{} tables", n),
    };
    out.push_str(&count);
    out.push('\n');
    out
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
