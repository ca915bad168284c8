//! dynsh
//!
//! An interactive shell for DynamoDB built around resumable pagination.
//!
//! - **TableHandle**: blocking table operations over the async SDK
//! - **Page**: one page of results carrying a hidden continuation
//! - **Broadcast**: the single slot behind the `it` command
//! - **Registry**: table discovery with identifier-safe aliases
//! - **Shell**: the line grammar, rendering and REPL loop

pub mod bridge;
pub mod broadcast;
pub mod cache;
pub mod client;
pub mod commands;
pub mod conversions;
pub mod errors;
pub mod page;
pub mod params;
pub mod registry;
pub mod remote;
pub mod shell;
pub mod stats;
pub mod table;

pub mod testing;

pub use broadcast::Broadcast;
pub use client::{AwsOptions, Connection, connect};
pub use commands::{FixedCommand, Reply, fixed_commands};
pub use conversions::Item;
pub use errors::{Error, Result};
pub use page::{Continuation, Page};
pub use registry::{Registry, TableSet, alias_of};
pub use shell::Shell;
pub use stats::StatsSnapshot;
pub use table::TableHandle;
