//! Key command - Print the key a word and tag encode to

use clap::Parser;

use super::super::output::write_output;
use super::super::utils::format_error;
use sensevec::key;
use sensevec::KeyPolicy;
use sensevec_core::{Doc, DocData, PosTag, SpanRecord, TokenRecord};

/// Print the key a word and tag encode to
#[derive(Parser, Debug)]
pub struct KeyArgs {
    /// Word or phrase
    #[arg(value_name = "TEXT")]
    pub text: String,

    /// Coarse part-of-speech tag (NOUN, VERB, PROPN, ...)
    #[arg(value_name = "TAG")]
    pub tag: String,

    /// Entity label the text carries
    #[arg(short, long, value_name = "LABEL")]
    pub entity: Option<String>,

    /// Key by entity label instead of tag (as merge mode does)
    #[arg(long)]
    pub prefer_entities: bool,

    /// Treat the text as a URL
    #[arg(long)]
    pub url: bool,
}

pub fn run(args: KeyArgs) -> Result<(), String> {
    let mut token = TokenRecord::new(args.text.as_str(), PosTag::from_label(&args.tag));
    if args.url {
        token = token.url();
    }
    let data = DocData {
        tokens: vec![token],
        ents: args
            .entity
            .iter()
            .map(|label| SpanRecord::labelled(0, 1, label.as_str()))
            .collect(),
        noun_chunks: vec![],
    };
    let doc = Doc::from_data(data).map_err(|e| format_error("build document", &e.to_string()))?;
    let token = doc
        .token(0)
        .ok_or_else(|| format_error("build document", "no token"))?;

    let policy = KeyPolicy::for_merge_mode(args.prefer_entities);
    let encoded =
        key::encode(&token, policy).map_err(|e| format_error("encode key", &e.to_string()))?;
    log::debug!("[key] {:?} {:?} -> {}", args.text, policy, encoded);
    write_output(&format!("{}\n", encoded))
}
