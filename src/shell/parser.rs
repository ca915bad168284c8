//! The line grammar.
//!
//! A line is one command word, usually a table name, and for most table
//! operations a JSON tail with the wire field names. The JSON is parsed
//! here; its keys are checked later by the params layer.

use serde_json::Value;

use crate::errors::{Error, Result};

/// The zero-argument commands dispatched by name through the registered set.
pub const FIXED_NAMES: &[&str] = &["version", "help", "it", "tables", "limits"];

/// One parsed line.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    /// One of [`FIXED_NAMES`].
    Fixed(&'static str),
    Refresh,
    Quit,
    /// A bare table name: show the handle and its operations.
    Show { table: String },
    Describe { table: String },
    Scan { table: String, options: Option<Value> },
    Query { table: String, options: Value },
    Get { table: String, key: Value },
    Put { table: String, item: Value },
    Update { table: String, options: Value },
    Delete { table: String, options: Value },
    UpdateTable { table: String, options: Value },
    Ttl { table: String },
    Stats { table: String },
}

/// Parse one input line.
pub fn parse(line: &str) -> Result<ShellCommand> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidParameter("Empty command".to_string()));
    }

    let (word, rest) = split_word(trimmed);
    let rest = rest.trim();

    if let Some(name) = FIXED_NAMES.iter().copied().find(|n| *n == word) {
        no_arguments(name, rest)?;
        return Ok(ShellCommand::Fixed(name));
    }

    match word {
        "quit" | "exit" => {
            no_arguments(word, rest)?;
            Ok(ShellCommand::Quit)
        }
        "refresh" => {
            no_arguments(word, rest)?;
            Ok(ShellCommand::Refresh)
        }
        "describe" => {
            let table = table_only(word, rest)?;
            Ok(ShellCommand::Describe { table })
        }
        "ttl" => {
            let table = table_only(word, rest)?;
            Ok(ShellCommand::Ttl { table })
        }
        "stats" => {
            let table = table_only(word, rest)?;
            Ok(ShellCommand::Stats { table })
        }
        "scan" => {
            let (table, tail) = table_and_tail(word, rest)?;
            let options = match tail {
                Some(json) => Some(parse_json(json)?),
                None => None,
            };
            Ok(ShellCommand::Scan { table, options })
        }
        "query" => {
            let (table, options) = table_and_json(word, rest)?;
            Ok(ShellCommand::Query { table, options })
        }
        "get" => {
            let (table, key) = table_and_json(word, rest)?;
            Ok(ShellCommand::Get { table, key })
        }
        "put" => {
            let (table, item) = table_and_json(word, rest)?;
            Ok(ShellCommand::Put { table, item })
        }
        "update" => {
            let (table, options) = table_and_json(word, rest)?;
            Ok(ShellCommand::Update { table, options })
        }
        "delete" => {
            let (table, options) = table_and_json(word, rest)?;
            Ok(ShellCommand::Delete { table, options })
        }
        "update-table" => {
            let (table, options) = table_and_json(word, rest)?;
            Ok(ShellCommand::UpdateTable { table, options })
        }
        _ => {
            if rest.is_empty() {
                Ok(ShellCommand::Show {
                    table: word.to_string(),
                })
            } else {
                Err(Error::InvalidParameter(format!(
                    "Unknown command '{}'. Type `help` for the command list.",
                    word
                )))
            }
        }
    }
}

fn split_word(input: &str) -> (&str, &str) {
    match input.find(char::is_whitespace) {
        Some(idx) => (&input[..idx], &input[idx..]),
        None => (input, ""),
    }
}

fn no_arguments(command: &str, rest: &str) -> Result<()> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!(
            "'{}' takes no arguments",
            command
        )))
    }
}

fn table_only(command: &str, rest: &str) -> Result<String> {
    let (table, tail) = split_word(rest);
    if table.is_empty() {
        return Err(Error::InvalidParameter(format!(
            "'{}' requires a table name",
            command
        )));
    }
    if !tail.trim().is_empty() {
        return Err(Error::InvalidParameter(format!(
            "'{}' takes only a table name",
            command
        )));
    }
    Ok(table.to_string())
}

fn table_and_tail<'a>(command: &str, rest: &'a str) -> Result<(String, Option<&'a str>)> {
    let (table, tail) = split_word(rest);
    if table.is_empty() {
        return Err(Error::InvalidParameter(format!(
            "'{}' requires a table name",
            command
        )));
    }
    let tail = tail.trim();
    let tail = if tail.is_empty() { None } else { Some(tail) };
    Ok((table.to_string(), tail))
}

fn table_and_json(command: &str, rest: &str) -> Result<(String, Value)> {
    let (table, tail) = table_and_tail(command, rest)?;
    match tail {
        Some(json) => Ok((table, parse_json(json)?)),
        None => Err(Error::InvalidParameter(format!(
            "'{}' requires a table name and a JSON request",
            command
        ))),
    }
}

fn parse_json(input: &str) -> Result<Value> {
    serde_json::from_str(input)
        .map_err(|e| Error::InvalidParameter(format!("Invalid JSON: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fixed_commands_parse_by_name() {
        for name in FIXED_NAMES {
            assert_eq!(parse(name).unwrap(), ShellCommand::Fixed(name));
        }
        assert!(parse("version now").is_err());
    }

    #[test]
    fn quit_and_exit_are_the_same() {
        assert_eq!(parse("quit").unwrap(), ShellCommand::Quit);
        assert_eq!(parse("exit").unwrap(), ShellCommand::Quit);
    }

    #[test]
    fn a_bare_word_shows_the_table() {
        assert_eq!(
            parse("user_sessions").unwrap(),
            ShellCommand::Show {
                table: "user_sessions".to_string()
            }
        );
    }

    #[test]
    fn unknown_commands_with_arguments_are_rejected() {
        let err = parse("frobnicate user_sessions").unwrap_err();
        assert!(err.to_string().contains("Unknown command 'frobnicate'"));
    }

    #[test]
    fn describe_requires_a_table() {
        assert!(parse("describe").is_err());
        assert_eq!(
            parse("describe sessions").unwrap(),
            ShellCommand::Describe {
                table: "sessions".to_string()
            }
        );
        assert!(parse("describe sessions extra").is_err());
    }

    #[test]
    fn scan_options_are_optional() {
        assert_eq!(
            parse("scan sessions").unwrap(),
            ShellCommand::Scan {
                table: "sessions".to_string(),
                options: None
            }
        );
        assert_eq!(
            parse(r#"scan sessions {"Limit": 5}"#).unwrap(),
            ShellCommand::Scan {
                table: "sessions".to_string(),
                options: Some(json!({"Limit": 5}))
            }
        );
    }

    #[test]
    fn query_requires_a_json_request() {
        assert!(parse("query sessions").is_err());
        assert_eq!(
            parse(r#"query sessions {"KeyConditionExpression": "pk = :p"}"#).unwrap(),
            ShellCommand::Query {
                table: "sessions".to_string(),
                options: json!({"KeyConditionExpression": "pk = :p"})
            }
        );
    }

    #[test]
    fn the_json_tail_may_contain_spaces() {
        let parsed = parse(r#"put sessions {"Item": {"pk": "a b", "n": 1}}"#).unwrap();
        assert_eq!(
            parsed,
            ShellCommand::Put {
                table: "sessions".to_string(),
                item: json!({"Item": {"pk": "a b", "n": 1}})
            }
        );
    }

    #[test]
    fn update_table_parses_with_the_hyphen() {
        assert_eq!(
            parse(r#"update-table sessions {"BillingMode": "PAY_PER_REQUEST"}"#).unwrap(),
            ShellCommand::UpdateTable {
                table: "sessions".to_string(),
                options: json!({"BillingMode": "PAY_PER_REQUEST"})
            }
        );
    }

    #[test]
    fn malformed_json_is_a_local_error() {
        let err = parse(r#"get sessions {"pk": }"#).unwrap_err();
        assert!(!err.is_remote());
        assert!(err.to_string().contains("Invalid JSON"));
    }

    #[test]
    fn empty_lines_are_rejected() {
        assert!(parse("").is_err());
        assert!(parse("   ").is_err());
    }
}
