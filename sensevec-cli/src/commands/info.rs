//! Info command - Show a store's shape, size and senses

use clap::Parser;

use super::super::output::{color, sense_color, write_output};
use super::super::parser::OutputFormat;
use super::super::utils::{format_error, load_component};
use sensevec::{ComponentConfig, VectorStore, Vocab};

/// Show a store's shape, size and senses
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Store directory
    #[arg(value_name = "DIR")]
    pub store: String,

    /// Output format
    #[arg(long, default_value = "human")]
    pub format: OutputFormat,
}

pub fn run(args: InfoArgs) -> Result<(), String> {
    let vocab = Vocab::new();
    let component = load_component(&vocab, &ComponentConfig::default(), &args.store)?;
    let store = component.store();
    let (rows, width) = store.shape();

    match args.format {
        OutputFormat::Json => {
            let info = serde_json::json!({
                "store": args.store,
                "shape": [rows, width],
                "keys": store.len(),
                "senses": store.senses(),
            });
            let json = serde_json::to_string_pretty(&info)
                .map_err(|e| format_error("serialize info", &e.to_string()))?;
            write_output(&format!("{}\n", json))
        }
        OutputFormat::Human => {
            let mut out = String::new();
            out.push_str(&format!("{}\n", color("1;36", &args.store)));
            out.push_str(&format!("  {}: {} x {}\n", color("1;33", "Shape"), rows, width));
            out.push_str(&format!("  {}: {}\n", color("1;33", "Keys"), store.len()));
            out.push_str(&format!("  {}:", color("1;33", "Senses")));
            if store.senses().is_empty() {
                out.push_str(" (none)");
            }
            for sense in store.senses() {
                out.push_str(&format!(" {}", color(sense_color(sense), sense)));
            }
            out.push('\n');
            write_output(&out)
        }
    }
}
