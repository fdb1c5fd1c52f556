//! Phrase detection and merging.
//!
//! A store trained on merged phrases has rows like `new_york|GPE` and
//! `ice_cream|NOUN`. To look those up, the matching tokens in a document
//! have to be collapsed into one token first. Phrases are the document's
//! entities plus its base noun phrases, with entities winning on overlap.

use crate::error::Result;
use sensevec_core::{Doc, Span};
use std::collections::HashSet;
use std::ops::Range;

/// Dependency labels allowed at the start of a noun phrase.
const NP_MODIFIERS: [&str; 3] = ["advmod", "amod", "compound"];

/// Noun chunks with leading function words stripped.
///
/// Each chunk loses leading tokens until it starts with an adverbial,
/// adjectival or compound modifier (or only the head is left), so
/// "the big apple" becomes "big apple". Chunks that touch an earlier chunk
/// are dropped. Unparsed documents have no noun phrases.
#[must_use]
pub fn noun_phrase_ranges(doc: &Doc) -> Vec<Range<usize>> {
    if !doc.is_parsed() {
        return Vec::new();
    }
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for chunk in doc.noun_chunks() {
        let mut start = chunk.start();
        let end = chunk.end();
        while end - start > 1 {
            let dep = doc.token(start).map(|t| t.dep()).unwrap_or_default();
            if NP_MODIFIERS.contains(&dep) {
                break;
            }
            start += 1;
        }
        if (start..end).any(|i| seen.contains(&i)) {
            continue;
        }
        seen.extend(start..end);
        out.push(start..end);
    }
    out
}

/// Entity ranges followed by noun phrases that share no token with an entity.
#[must_use]
pub fn phrase_ranges(doc: &Doc) -> Vec<Range<usize>> {
    let mut ranges: Vec<Range<usize>> = doc.ents().map(|e| e.range()).collect();
    let ent_tokens: HashSet<usize> = ranges.iter().flat_map(|r| r.clone()).collect();
    ranges.extend(
        noun_phrase_ranges(doc)
            .into_iter()
            .filter(|np| !np.clone().any(|i| ent_tokens.contains(&i))),
    );
    ranges
}

/// Phrases as span views. Entity phrases resolve their label.
#[must_use]
pub fn phrases(doc: &Doc) -> Vec<Span<'_>> {
    phrase_ranges(doc)
        .into_iter()
        .filter_map(|r| doc.span(r.start, r.end).ok())
        .collect()
}

/// Merge every multi-token phrase into a single token.
pub fn merge_phrases(doc: Doc) -> Result<Doc> {
    let ranges: Vec<Range<usize>> = phrase_ranges(&doc)
        .into_iter()
        .filter(|r| r.len() > 1)
        .collect();
    if ranges.is_empty() {
        return Ok(doc);
    }
    let before = doc.len();
    let merged = doc.merge_spans(&ranges)?;
    log::debug!(
        "[phrases] merged {} phrases in {}: {} -> {} tokens",
        ranges.len(),
        merged.id(),
        before,
        merged.len()
    );
    Ok(merged)
}
