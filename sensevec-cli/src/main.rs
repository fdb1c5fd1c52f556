//! sensevec - sense vector CLI
//!
//! Inspect sense vector stores and look up pre-annotated documents in them.
//!
//! # Usage
//!
//! ```bash
//! # Store shape, size and senses
//! sensevec info ./vectors
//!
//! # Keys, frequencies and neighbours for every token and entity
//! sensevec query ./vectors --doc doc.json -n 5
//!
//! # Merge entities and noun phrases first
//! sensevec query ./vectors --doc doc.json --merge --format json
//!
//! # What key does a word encode to?
//! sensevec key "New York" PROPN --entity GPE --prefer-entities
//! ```
//!
//! Logging goes through `env_logger`; set `RUST_LOG=debug` for details.

use std::process::ExitCode;

use clap::Parser;

mod commands;
mod output;
mod parser;
mod utils;

use output::color;
use parser::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.quiet { "error" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    let result: Result<(), String> = match cli.command {
        Commands::Info(args) => commands::info::run(args),
        Commands::Query(mut args) => {
            args.quiet |= cli.quiet;
            commands::query::run(args)
        }
        Commands::Key(args) => commands::key::run(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", color("31", "error:"), e);
            ExitCode::FAILURE
        }
    }
}
