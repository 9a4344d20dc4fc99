//! Formwork CLI: the `formwork` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Normalize { schema, json } => commands::normalize::run(schema, json),

        Commands::Active {
            schema,
            vars,
            config,
            json,
        } => commands::active::run(schema, vars, config, json),

        Commands::Required {
            schema,
            vars,
            config,
            json,
        } => commands::required::run(schema, vars, config, json),

        Commands::Resolve {
            schema,
            vars,
            config,
            json,
        } => commands::resolve::run(schema, vars, config, json),
    }
}

/// Engine logs go to stderr so `--json` output stays parseable.
/// `FORMWORK_LOG` takes an `EnvFilter` directive; the default is `warn`.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("FORMWORK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}
