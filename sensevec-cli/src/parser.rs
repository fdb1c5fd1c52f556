//! CLI argument parsing and structure definitions

use clap::{Parser, Subcommand, ValueEnum};

use crate::commands::{InfoArgs, KeyArgs, QueryArgs};

/// Sense vector CLI - inspect stores, query annotated documents
#[derive(Parser)]
#[command(name = "sensevec")]
#[command(
    author,
    version,
    about = "Sense vector CLI - inspect stores, query annotated documents",
    long_about = r#"
sensevec - sense-keyed word vectors for annotated documents

Keys look like `text|SENSE`: `duck|NOUN`, `duck|VERB`, `new_york|GPE`.

EXAMPLES:
  sensevec info ./vectors
  sensevec query ./vectors --doc doc.json -n 5
  sensevec query ./vectors --doc - --merge --format json < doc.json
  sensevec key "New York" PROPN --entity GPE --prefer-entities
"#
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show a store's shape, size and senses
    #[command(visible_alias = "i")]
    Info(InfoArgs),

    /// Annotate a pre-tagged document and print what the store knows
    #[command(visible_alias = "q")]
    Query(QueryArgs),

    /// Print the key a word and tag encode to
    #[command(visible_alias = "k")]
    Key(KeyArgs),
}

/// Output format selection for all commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output (default)
    #[default]
    Human,
    /// JSON
    Json,
}
