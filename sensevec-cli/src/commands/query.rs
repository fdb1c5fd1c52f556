//! Query command - Annotate a pre-tagged document and print what the store knows

use clap::Parser;
use serde::Serialize;

use super::super::output::{color, key_colored, log_info, score_colored, write_output};
use super::super::parser::OutputFormat;
use super::super::utils::{format_error, load_component, load_config, parse_doc, read_input};
use sensevec::{Lexical, SenseComponent, Vocab};

/// Annotate a pre-tagged document and print what the store knows
#[derive(Parser, Debug)]
pub struct QueryArgs {
    /// Store directory
    #[arg(value_name = "DIR")]
    pub store: String,

    /// Document JSON (tokens, ents, noun_chunks); `-` reads stdin
    #[arg(short, long, value_name = "FILE", default_value = "-")]
    pub doc: String,

    /// Component config JSON
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<String>,

    /// Merge entities and noun phrases before lookup
    #[arg(short, long)]
    pub merge: bool,

    /// Number of neighbours per entry
    #[arg(short = 'n', value_name = "N", default_value_t = 3)]
    pub n: usize,

    /// Output format
    #[arg(long, default_value = "human")]
    pub format: OutputFormat,

    /// Set from the global `--quiet` flag
    #[arg(skip)]
    pub quiet: bool,
}

/// One token or entity and what the store says about it.
#[derive(Debug, Serialize)]
struct Row {
    kind: &'static str,
    start: usize,
    end: usize,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    in_store: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    freq: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    similar: Vec<Neighbour>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct Neighbour {
    word: String,
    sense: String,
    score: f32,
}

pub fn run(args: QueryArgs) -> Result<(), String> {
    if args.n == 0 {
        return Err(format_error("query", "-n must be a positive integer"));
    }
    let mut config = load_config(args.config.as_deref())?;
    if args.merge {
        config = config.with_merge_phrases(true);
    }
    let vocab = Vocab::new();
    let component = load_component(&vocab, &config, &args.store)?;
    let doc = parse_doc(&read_input(&args.doc)?)?;
    let doc = component
        .process(doc)
        .map_err(|e| format_error("process document", &e.to_string()))?;
    log_info(
        &format!(
            "Processed {} tokens ({} entities) against {}",
            doc.len(),
            doc.ents().count(),
            args.store
        ),
        args.quiet,
    );

    let mut rows = Vec::new();
    for token in doc.tokens() {
        rows.push(describe(&component, &token, "token", token.i()..token.i() + 1, args.n));
    }
    for span in doc.ents() {
        rows.push(describe(&component, &span, "entity", span.range(), args.n));
    }

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&rows)
                .map_err(|e| format_error("serialize rows", &e.to_string()))?;
            write_output(&format!("{}\n", json))
        }
        OutputFormat::Human => write_output(&render_human(&rows)),
    }
}

fn describe<L: Lexical + ?Sized>(
    component: &SenseComponent,
    obj: &L,
    kind: &'static str,
    range: std::ops::Range<usize>,
    n: usize,
) -> Row {
    let mut row = Row {
        kind,
        start: range.start,
        end: range.end,
        text: obj.text().into_owned(),
        key: None,
        in_store: false,
        freq: None,
        similar: Vec::new(),
        error: None,
    };
    if let Err(e) = lookup(component, obj, n, &mut row) {
        log::debug!("[query] {} {:?}: {}", kind, obj.text(), e);
        row.error = Some(e.to_string());
    }
    row
}

fn lookup<L: Lexical + ?Sized>(
    component: &SenseComponent,
    obj: &L,
    n: usize,
    row: &mut Row,
) -> sensevec::Result<()> {
    row.key = Some(component.key_of(obj)?.into_string());
    row.in_store = component.has_entry(obj)?;
    if row.in_store {
        row.freq = Some(component.frequency_of(obj)?);
        row.similar = component
            .most_similar(obj, n)?
            .into_iter()
            .map(|((word, sense), score)| Neighbour { word, sense, score })
            .collect();
    }
    Ok(())
}

fn render_human(rows: &[Row]) -> String {
    let mut out = String::new();
    for row in rows {
        let head = format!("{:<6} {:>3}..{:<3} {:?}", row.kind, row.start, row.end, row.text);
        let key = match (&row.key, &row.error) {
            (Some(key), _) => match key.rsplit_once('|') {
                Some((word, sense)) => key_colored(word, sense),
                None => key.clone(),
            },
            (None, Some(error)) => color("31", error),
            (None, None) => String::new(),
        };
        let status = match row.freq {
            Some(freq) => color("32", &format!("freq={}", freq)),
            None => color("90", "not in store"),
        };
        out.push_str(&format!("{}  {}  {}\n", head, key, status));
        for neighbour in &row.similar {
            out.push_str(&format!(
                "    {} {}\n",
                score_colored(neighbour.score),
                key_colored(&neighbour.word, &neighbour.sense)
            ));
        }
    }
    out
}
