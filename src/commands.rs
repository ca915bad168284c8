//! The fixed zero-argument command surface.
//!
//! Five commands with no arguments of their own: `version`, `help`, `it`,
//! `tables` and `limits`. Each carries a name, a help line and a callback
//! producing a [`Reply`] for the shell to render. The table operations take
//! arguments and live in the line grammar instead (`shell::parser`).

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::broadcast::Broadcast;
use crate::errors::{Error, Result};
use crate::page::{Continuation, Page};
use crate::registry::{Registry, TableSet};

/// What a command hands the shell to render.
#[derive(Debug)]
pub enum Reply {
    /// One page of items, possibly resumable.
    Page(Page),
    /// A wire-shaped record rendered as pretty JSON.
    Value(Value),
    /// Plain text, printed as-is.
    Text(String),
    /// The alias listing of the table set.
    Tables(Arc<TableSet>),
    /// Nothing to show.
    None,
}

impl Reply {
    /// What the display path feeds to the broadcast slot. Only a page with
    /// more to fetch arms it; every other reply clears it.
    pub fn continuation(&self) -> Option<Continuation> {
        match self {
            Reply::Page(page) => page.next.clone(),
            _ => None,
        }
    }

    /// Wrap a serializable record for rendering.
    pub fn record(value: impl Serialize) -> Result<Reply> {
        let rendered = serde_json::to_value(value)
            .map_err(|e| Error::Logic(format!("Failed to render response: {}", e)))?;
        Ok(Reply::Value(rendered))
    }
}

/// A fixed command: a name, a help line, a callback.
pub struct FixedCommand {
    pub name: &'static str,
    pub help: &'static str,
    callback: Box<dyn Fn() -> Result<Reply>>,
}

impl FixedCommand {
    pub fn invoke(&self) -> Result<Reply> {
        (self.callback)()
    }
}

/// Build the fixed command set over the shell's collaborators.
pub fn fixed_commands(registry: Arc<Registry>, broadcast: Broadcast) -> Vec<FixedCommand> {
    vec![
        FixedCommand {
            name: "version",
            help: "display version",
            callback: Box::new(|| Ok(Reply::Text(env!("CARGO_PKG_VERSION").to_string()))),
        },
        FixedCommand {
            name: "help",
            help: "display help",
            callback: Box::new(|| Ok(Reply::Text(help_text()))),
        },
        FixedCommand {
            name: "it",
            help: "fetch the next page of the last displayed result",
            callback: {
                let broadcast = broadcast.clone();
                Box::new(move || match broadcast.resume()? {
                    Some(page) => Ok(Reply::Page(page)),
                    None => Ok(Reply::None),
                })
            },
        },
        FixedCommand {
            name: "tables",
            help: "list tables (discovered once, refresh with `refresh`)",
            callback: {
                let registry = registry.clone();
                Box::new(move || Ok(Reply::Tables(registry.fetch_tables()?)))
            },
        },
        FixedCommand {
            name: "limits",
            help: "display account capacity limits",
            callback: {
                let registry = registry.clone();
                Box::new(move || Reply::record(registry.describe_limits()?))
            },
        },
    ]
}

/// The `help` screen: fixed commands plus the table operation grammar.
pub fn help_text() -> String {
    let mut out = String::new();
    out.push_str("Commands:\n");
    out.push_str("  version                     display version\n");
    out.push_str("  help                        display help\n");
    out.push_str("  it                          fetch the next page of the last displayed result\n");
    out.push_str("  tables                      list tables (discovered once, refresh with `refresh`)\n");
    out.push_str("  limits                      display account capacity limits\n");
    out.push_str("  refresh                     drop the cached table list and rediscover\n");
    out.push_str("  quit | exit                 leave the shell\n");
    out.push_str("\nTable operations (<table> is a raw name or its alias):\n");
    out.push_str("  describe <table>            table schema, indexes and throughput\n");
    out.push_str("  scan <table> [json]         scan, one page at a time\n");
    out.push_str("  query <table> <json>        query, one page at a time\n");
    out.push_str("  get <table> <key-json>      point read\n");
    out.push_str("  put <table> <json>          write an item ({\"Item\": {...}})\n");
    out.push_str("  update <table> <json>       update an item\n");
    out.push_str("  delete <table> <json>       delete an item\n");
    out.push_str("  update-table <table> <json> change billing mode or throughput\n");
    out.push_str("  ttl <table>                 time-to-live settings\n");
    out.push_str("  stats <table>               consumed and provisioned capacity\n");
    out.push_str("\nRequest options are JSON with the wire field names, for example:\n");
    out.push_str("  scan sessions {\"Limit\": 25, \"FilterExpression\": \"begins_with(pk, :p)\", \"ExpressionAttributeValues\": {\":p\": \"user#\"}}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{AccountLimits, TableNamePage};
    use crate::testing::{ScriptedMetrics, ScriptedStore};

    fn commands_over(store: ScriptedStore) -> (Vec<FixedCommand>, Broadcast) {
        let registry = Arc::new(Registry::new(
            Arc::new(store),
            Arc::new(ScriptedMetrics::new(&[])),
        ));
        let broadcast = Broadcast::new();
        (fixed_commands(registry, broadcast.clone()), broadcast)
    }

    fn command<'a>(commands: &'a [FixedCommand], name: &str) -> &'a FixedCommand {
        commands
            .iter()
            .find(|c| c.name == name)
            .unwrap_or_else(|| panic!("no command named {}", name))
    }

    #[test]
    fn version_reports_the_crate_version() {
        let (commands, _) = commands_over(ScriptedStore::default());
        match command(&commands, "version").invoke().unwrap() {
            Reply::Text(text) => assert_eq!(text, env!("CARGO_PKG_VERSION")),
            _ => panic!("expected text"),
        }
    }

    #[test]
    fn help_names_every_fixed_command() {
        let (commands, _) = commands_over(ScriptedStore::default());
        match command(&commands, "help").invoke().unwrap() {
            Reply::Text(text) => {
                for fixed in &commands {
                    assert!(text.contains(fixed.name), "help is missing {}", fixed.name);
                }
                assert!(text.contains("scan <table>"));
            }
            _ => panic!("expected text"),
        }
    }

    #[test]
    fn it_is_a_silent_no_op_when_nothing_is_pending() {
        let (commands, broadcast) = commands_over(ScriptedStore::default());
        assert!(!broadcast.is_armed());
        assert!(matches!(
            command(&commands, "it").invoke().unwrap(),
            Reply::None
        ));
    }

    #[test]
    fn it_resumes_the_armed_continuation() {
        let (commands, broadcast) = commands_over(ScriptedStore::default());
        broadcast.update(Some(Arc::new(|| Ok(Page::terminal(vec![])))));

        match command(&commands, "it").invoke().unwrap() {
            Reply::Page(page) => assert!(!page.has_more()),
            _ => panic!("expected a page"),
        }
    }

    #[test]
    fn tables_goes_through_the_registry() {
        let store = ScriptedStore::default();
        store.push_list_page(Ok(TableNamePage {
            names: vec!["user-sessions".to_string()],
            last_evaluated_table_name: None,
        }));

        let (commands, _) = commands_over(store);
        match command(&commands, "tables").invoke().unwrap() {
            Reply::Tables(set) => {
                assert_eq!(set.len(), 1);
                assert!(set.get("user_sessions").is_some());
            }
            _ => panic!("expected tables"),
        }
    }

    #[test]
    fn limits_render_as_a_record() {
        let store = ScriptedStore::default();
        store.set_limits(AccountLimits {
            account_max_read_capacity_units: Some(80_000),
            account_max_write_capacity_units: Some(80_000),
            table_max_read_capacity_units: Some(40_000),
            table_max_write_capacity_units: Some(40_000),
        });

        let (commands, _) = commands_over(store);
        match command(&commands, "limits").invoke().unwrap() {
            Reply::Value(value) => {
                assert_eq!(value["AccountMaxReadCapacityUnits"], 80_000);
            }
            _ => panic!("expected a record"),
        }
    }

    #[test]
    fn only_pages_with_more_to_fetch_carry_a_continuation() {
        let armed = Reply::Page(Page {
            items: vec![],
            next: Some(Arc::new(|| Ok(Page::terminal(vec![])))),
        });
        assert!(armed.continuation().is_some());

        assert!(Reply::Page(Page::terminal(vec![])).continuation().is_none());
        assert!(Reply::Text("hello".to_string()).continuation().is_none());
        assert!(Reply::None.continuation().is_none());
    }
}
