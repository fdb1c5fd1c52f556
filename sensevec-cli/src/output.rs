//! Output formatting utilities for CLI commands

use is_terminal::IsTerminal;
use std::io::{self, Write};

/// Log info message (respects quiet flag)
pub fn log_info(msg: &str, quiet: bool) {
    if !quiet {
        eprintln!("{}", msg);
    }
}

/// Write output to stdout
pub fn write_output(content: &str) -> Result<(), String> {
    let mut stdout = io::stdout();
    stdout
        .write_all(content.as_bytes())
        .and_then(|()| stdout.flush())
        .map_err(|e| format!("Failed to write stdout: {}", e))
}

/// Colorize text with ANSI escape codes (only if stdout is a terminal)
pub fn color(code: &str, text: &str) -> String {
    if io::stdout().is_terminal() {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    } else {
        text.to_string()
    }
}

/// Color code for a sense: entity labels stand out from POS tags.
pub fn sense_color(sense: &str) -> &'static str {
    match sense {
        "PERSON" | "PER" => "1;34",
        "ORG" | "NORP" => "1;32",
        "GPE" | "LOC" | "FAC" => "1;33",
        "DATE" | "TIME" => "1;35",
        "NOUN" | "PROPN" => "36",
        "VERB" | "AUX" => "32",
        "ADJ" | "ADV" => "33",
        _ => "37",
    }
}

/// Render a key with its sense colored.
pub fn key_colored(word: &str, sense: &str) -> String {
    format!("{}|{}", word, color(sense_color(sense), sense))
}

/// Similarity score colored by strength.
pub fn score_colored(score: f32) -> String {
    let code = if score >= 0.8 {
        "1;32"
    } else if score >= 0.5 {
        "1;33"
    } else {
        "90"
    };
    color(code, &format!("{:.3}", score))
}
