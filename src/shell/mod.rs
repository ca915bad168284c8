//! The interactive shell.
//!
//! One command at a time: read a line, run it to completion through the
//! blocking bridge, render the reply, repeat. Rendering is what feeds the
//! broadcast, so `it` always refers to the last thing shown.

mod history;
mod parser;
mod printer;

pub use history::History;
pub use parser::{FIXED_NAMES, ShellCommand, parse};
pub use printer::Printer;

use std::sync::Arc;

use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use serde_json::{Value, json};

use crate::broadcast::Broadcast;
use crate::client::Connection;
use crate::commands::{FixedCommand, Reply, fixed_commands};
use crate::conversions::{item_to_json, json_to_item};
use crate::errors::{Error, Result};
use crate::params::{
    DeleteParams, PutParams, ReadOp, ReadParams, UpdateParams, UpdateTableParams,
};
use crate::registry::Registry;
use crate::remote::WriteAck;
use crate::table::TableHandle;

const PROMPT: &str = "dynsh> ";

pub struct Shell {
    registry: Arc<Registry>,
    commands: Vec<FixedCommand>,
    printer: Printer,
    region: String,
}

impl Shell {
    pub fn new(connection: Connection) -> Self {
        let registry = Arc::new(Registry::new(connection.store, connection.metrics));
        let broadcast = Broadcast::new();
        let commands = fixed_commands(registry.clone(), broadcast.clone());

        Shell {
            registry,
            commands,
            printer: Printer::new(broadcast),
            region: connection.region,
        }
    }

    /// The interactive loop. Returns when the user quits or input ends.
    pub fn run(&self) -> Result<()> {
        println!(
            "{}",
            format!(
                "dynsh {} in {} (type `help` for commands)",
                env!("CARGO_PKG_VERSION"),
                self.region
            )
            .dimmed()
        );

        let mut editor = DefaultEditor::new()
            .map_err(|e| Error::Logic(format!("Failed to initialize line editing: {}", e)))?;

        let history = History::new();
        for entry in history.load() {
            let _ = editor.add_history_entry(&entry);
        }

        loop {
            match editor.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim().to_string();
                    if line.is_empty() {
                        continue;
                    }
                    let _ = editor.add_history_entry(&line);
                    let _ = history.append(&line);

                    match parser::parse(&line) {
                        Ok(ShellCommand::Quit) => break,
                        Ok(command) => match self.run_command(command) {
                            Ok(reply) => self.printer.render(&reply),
                            Err(err) => self.printer.render_error(&err),
                        },
                        Err(err) => self.printer.render_error(&err),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "Type `quit` to leave".dimmed());
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    return Err(Error::Logic(format!("Line editing failed: {}", err)));
                }
            }
        }

        Ok(())
    }

    /// Parse and run one line, handing back the reply without rendering it.
    pub fn execute(&self, line: &str) -> Result<Reply> {
        match parser::parse(line)? {
            ShellCommand::Quit => Ok(Reply::None),
            command => self.run_command(command),
        }
    }

    /// Render a reply through the display path, arming or clearing the
    /// broadcast as a side effect.
    pub fn render(&self, reply: &Reply) {
        self.printer.render(reply);
    }

    /// One-shot execution for `-c`: run the line and render the result.
    pub fn run_line(&self, line: &str) -> Result<()> {
        let reply = self.execute(line)?;
        self.render(&reply);
        Ok(())
    }

    fn run_command(&self, command: ShellCommand) -> Result<Reply> {
        match command {
            ShellCommand::Fixed(name) => self.fixed(name)?.invoke(),
            ShellCommand::Quit => Ok(Reply::None),
            ShellCommand::Refresh => {
                self.registry.invalidate();
                Ok(Reply::Text(
                    "Table list cleared; the next use rediscovers.".to_string(),
                ))
            }
            ShellCommand::Show { table } => {
                Ok(Reply::Text(self.handle(&table)?.to_string()))
            }
            ShellCommand::Describe { table } => Reply::record(self.handle(&table)?.describe()?),
            ShellCommand::Scan { table, options } => {
                let params = match options {
                    Some(value) => ReadParams::from_json(ReadOp::Scan, &value)?,
                    None => ReadParams::default(),
                };
                Ok(Reply::Page(self.handle(&table)?.scan(params)?))
            }
            ShellCommand::Query { table, options } => {
                let params = ReadParams::from_json(ReadOp::Query, &options)?;
                Ok(Reply::Page(self.handle(&table)?.query(params)?))
            }
            ShellCommand::Get { table, key } => {
                let key = json_to_item(&key)?;
                let reply = match self.handle(&table)?.get(key)? {
                    Some(item) => Reply::Value(item_to_json(&item)),
                    None => Reply::Value(Value::Null),
                };
                Ok(reply)
            }
            ShellCommand::Put { table, item } => {
                let params = PutParams::from_json(&item)?;
                let ack = self.handle(&table)?.put(params)?;
                Ok(Reply::Value(ack_to_json(&ack)))
            }
            ShellCommand::Update { table, options } => {
                let params = UpdateParams::from_json(&options)?;
                let ack = self.handle(&table)?.update(params)?;
                Ok(Reply::Value(ack_to_json(&ack)))
            }
            ShellCommand::Delete { table, options } => {
                let params = DeleteParams::from_json(&options)?;
                let ack = self.handle(&table)?.delete(params)?;
                Ok(Reply::Value(ack_to_json(&ack)))
            }
            ShellCommand::UpdateTable { table, options } => {
                let params = UpdateTableParams::from_json(&options)?;
                Reply::record(self.handle(&table)?.update_table(params)?)
            }
            ShellCommand::Ttl { table } => {
                Reply::record(self.handle(&table)?.describe_time_to_live()?)
            }
            ShellCommand::Stats { table } => Reply::record(self.handle(&table)?.stats()?),
        }
    }

    fn fixed(&self, name: &str) -> Result<&FixedCommand> {
        self.commands
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| Error::Logic(format!("No command named '{}'", name)))
    }

    fn handle(&self, name: &str) -> Result<TableHandle> {
        let tables = self.registry.fetch_tables()?;
        tables.get(name).cloned().ok_or_else(|| {
            Error::InvalidParameter(format!(
                "Unknown table '{}'. Type `tables` to list them or `refresh` to rediscover.",
                name
            ))
        })
    }
}

fn ack_to_json(ack: &WriteAck) -> Value {
    match &ack.attributes {
        Some(item) => json!({ "Attributes": item_to_json(item) }),
        None => json!({}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::TableNamePage;
    use crate::testing::{ScriptedMetrics, ScriptedStore};

    fn shell_over(store: ScriptedStore) -> Shell {
        Shell::new(Connection {
            store: Arc::new(store),
            metrics: Arc::new(ScriptedMetrics::new(&[])),
            region: "us-east-1".to_string(),
        })
    }

    fn store_with_tables(names: &[&str]) -> ScriptedStore {
        let store = ScriptedStore::default();
        store.push_list_page(Ok(TableNamePage {
            names: names.iter().map(|n| n.to_string()).collect(),
            last_evaluated_table_name: None,
        }));
        store
    }

    #[test]
    fn a_bare_table_name_shows_the_operations() {
        let shell = shell_over(store_with_tables(&["user-sessions"]));
        match shell.execute("user_sessions").unwrap() {
            Reply::Text(text) => {
                assert!(text.starts_with("user-sessions:"));
                assert!(text.contains("scan"));
            }
            _ => panic!("expected text"),
        }
    }

    #[test]
    fn unknown_tables_point_at_the_listing() {
        let shell = shell_over(store_with_tables(&["user-sessions"]));
        let err = shell.execute("describe missing").unwrap_err();
        assert!(!err.is_remote());
        assert!(err.to_string().contains("Unknown table 'missing'"));
    }

    #[test]
    fn refresh_drops_the_cached_listing() {
        let store = ScriptedStore::default();
        store.push_list_page(Ok(TableNamePage {
            names: vec!["alpha".to_string()],
            last_evaluated_table_name: None,
        }));
        store.push_list_page(Ok(TableNamePage {
            names: vec!["alpha".to_string(), "beta".to_string()],
            last_evaluated_table_name: None,
        }));
        let shell = shell_over(store);

        assert!(shell.execute("beta").is_err());
        shell.execute("refresh").unwrap();
        assert!(shell.execute("beta").is_ok());
    }

    #[test]
    fn quit_produces_nothing() {
        let shell = shell_over(ScriptedStore::default());
        assert!(matches!(shell.execute("quit").unwrap(), Reply::None));
    }

    #[test]
    fn acks_render_as_raw_responses() {
        let empty = ack_to_json(&WriteAck::default());
        assert_eq!(empty, json!({}));

        let mut attributes = crate::conversions::Item::new();
        attributes.insert(
            "pk".to_string(),
            aws_sdk_dynamodb::types::AttributeValue::S("user#1".to_string()),
        );
        let full = ack_to_json(&WriteAck {
            attributes: Some(attributes),
        });
        assert_eq!(full, json!({ "Attributes": { "pk": "user#1" } }));
    }
}
