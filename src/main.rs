use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use dynsh::client::{self, AwsOptions};
use dynsh::shell::Shell;

/// An interactive DynamoDB shell with resumable pagination.
#[derive(Parser, Debug)]
#[command(name = "dynsh", version, about = "Interactive DynamoDB shell", long_about = None)]
struct Cli {
    /// AWS region (defaults to the environment, then us-east-1)
    #[arg(long)]
    region: Option<String>,

    /// Named AWS profile to take credentials from
    #[arg(long)]
    profile: Option<String>,

    /// Endpoint override, e.g. http://localhost:8000 for DynamoDB Local
    #[arg(long = "endpoint-url")]
    endpoint_url: Option<String>,

    /// Run one command and exit
    #[arg(short = 'c', long = "command")]
    command: Option<String>,

    /// Debug logging for the shell's remote calls
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let connection = client::connect(&AwsOptions {
        region: cli.region,
        profile: cli.profile,
        endpoint_url: cli.endpoint_url,
    });
    let shell = Shell::new(connection);

    let result = match &cli.command {
        Some(line) => shell.run_line(line),
        None => shell.run(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", format!("error: {}", err).red());
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so one-shot output stays pipeable.
fn init_tracing(verbose: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("info,dynsh=debug")
    } else {
        EnvFilter::new("warn,dynsh=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
