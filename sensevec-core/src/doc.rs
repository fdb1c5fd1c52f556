//! Documents, tokens and spans.
//!
//! A [`Doc`] is built from token records that were tagged, parsed and
//! entity-labelled upstream. [`Token`] and [`Span`] are cheap borrowed
//! views into it; both implement [`Lexical`], the read-only capability the
//! sense annotation layer needs (text, coarse tag, entity label).
//!
//! Each document also carries one opaque, non-owning back-reference slot
//! ([`Doc::set_binding`]) that a processing component can stamp so later,
//! independent calls on the document's tokens can find the component's
//! data without threading it through every call site.

use crate::error::{Error, Result};
use crate::pos::PosTag;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::borrow::Cow;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

static NEXT_DOC_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique document identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocId(u64);

impl DocId {
    fn next() -> Self {
        DocId(NEXT_DOC_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for DocId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "doc#{}", self.0)
    }
}

fn default_whitespace() -> bool {
    true
}

// ============================================================================
// Records (serializable input)
// ============================================================================

/// One pre-annotated token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Verbatim token text.
    pub text: String,
    /// Lemma, if the upstream pipeline assigned one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lemma: Option<String>,
    /// Coarse part-of-speech tag.
    #[serde(default)]
    pub pos: PosTag,
    /// Fine-grained tag (treebank specific).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag: String,
    /// Dependency label.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dep: String,
    /// Absolute index of the syntactic head. The root points at itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<usize>,
    /// Entity label of the entity this token belongs to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ent_type: Option<String>,
    /// Whether the token is followed by whitespace.
    #[serde(default = "default_whitespace")]
    pub whitespace: bool,
    /// Whether the token looks like a URL.
    #[serde(default)]
    pub like_url: bool,
}

impl TokenRecord {
    /// Create a token with text and coarse tag; everything else unset.
    #[must_use]
    pub fn new(text: impl Into<String>, pos: PosTag) -> Self {
        Self {
            text: text.into(),
            lemma: None,
            pos,
            tag: String::new(),
            dep: String::new(),
            head: None,
            ent_type: None,
            whitespace: true,
            like_url: false,
        }
    }

    /// Set the head index and dependency label.
    #[must_use]
    pub fn with_head(mut self, head: usize, dep: impl Into<String>) -> Self {
        self.head = Some(head);
        self.dep = dep.into();
        self
    }

    /// Mark the token as URL-like.
    #[must_use]
    pub fn url(mut self) -> Self {
        self.like_url = true;
        self
    }
}

/// Token range `[start, end)` with an optional label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpanRecord {
    /// First token index (inclusive).
    pub start: usize,
    /// Last token index (exclusive).
    pub end: usize,
    /// Entity label, for entity spans.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl SpanRecord {
    /// Unlabelled range.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            label: None,
        }
    }

    /// Labelled range.
    #[must_use]
    pub fn labelled(start: usize, end: usize, label: impl Into<String>) -> Self {
        Self {
            start,
            end,
            label: Some(label.into()),
        }
    }

    /// Token range.
    #[must_use]
    pub const fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Serializable form of a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocData {
    /// Tokens in order.
    pub tokens: Vec<TokenRecord>,
    /// Named entity spans.
    #[serde(default)]
    pub ents: Vec<SpanRecord>,
    /// Base noun phrases.
    #[serde(default)]
    pub noun_chunks: Vec<SpanRecord>,
}

// ============================================================================
// Doc
// ============================================================================

/// An annotated document.
#[derive(Debug)]
pub struct Doc {
    id: DocId,
    tokens: Vec<TokenRecord>,
    ents: Vec<SpanRecord>,
    noun_chunks: Vec<SpanRecord>,
    binding: Option<Weak<dyn Any + Send + Sync>>,
}

impl Doc {
    /// Build a document, validating every offset.
    ///
    /// Entity spans are sorted and must not overlap. Tokens inside an entity
    /// that carry no `ent_type` inherit the entity's label.
    pub fn from_data(data: DocData) -> Result<Self> {
        let DocData {
            mut tokens,
            mut ents,
            mut noun_chunks,
        } = data;
        let n = tokens.len();

        for (i, token) in tokens.iter().enumerate() {
            if let Some(head) = token.head {
                if head >= n {
                    return Err(Error::out_of_bounds(format!(
                        "token {} has head {} but document has {} tokens",
                        i, head, n
                    )));
                }
            }
        }

        for span in ents.iter().chain(noun_chunks.iter()) {
            check_range(span, n)?;
        }

        ents.sort_by_key(|s| (s.start, s.end));
        for pair in ents.windows(2) {
            if pair[1].start < pair[0].end {
                return Err(Error::overlap(format!(
                    "entity spans {:?} and {:?} overlap",
                    pair[0].range(),
                    pair[1].range()
                )));
            }
        }
        noun_chunks.sort_by_key(|s| (s.start, s.end));

        for ent in &ents {
            if let Some(label) = ent.label.as_deref().filter(|l| !l.is_empty()) {
                for token in &mut tokens[ent.start..ent.end] {
                    if token.ent_type.is_none() {
                        token.ent_type = Some(label.to_string());
                    }
                }
            }
        }

        Ok(Self {
            id: DocId::next(),
            tokens,
            ents,
            noun_chunks,
            binding: None,
        })
    }

    /// Build an unparsed document from `(text, tag)` pairs.
    pub fn from_tagged<'a>(pairs: impl IntoIterator<Item = (&'a str, PosTag)>) -> Result<Self> {
        let tokens = pairs
            .into_iter()
            .map(|(text, pos)| TokenRecord::new(text, pos))
            .collect();
        Self::from_data(DocData {
            tokens,
            ..DocData::default()
        })
    }

    /// Serializable snapshot (without the binding).
    #[must_use]
    pub fn to_data(&self) -> DocData {
        DocData {
            tokens: self.tokens.clone(),
            ents: self.ents.clone(),
            noun_chunks: self.noun_chunks.clone(),
        }
    }

    /// Document identity.
    #[must_use]
    pub const fn id(&self) -> DocId {
        self.id
    }

    /// Number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the document has no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Whether every token has a syntactic head.
    #[must_use]
    pub fn is_parsed(&self) -> bool {
        !self.tokens.is_empty() && self.tokens.iter().all(|t| t.head.is_some())
    }

    /// Reconstructed text.
    #[must_use]
    pub fn text(&self) -> String {
        join_tokens(&self.tokens)
    }

    /// Token at `i`.
    #[must_use]
    pub fn token(&self, i: usize) -> Option<Token<'_>> {
        (i < self.tokens.len()).then_some(Token { doc: self, i })
    }

    /// All tokens.
    pub fn tokens(&self) -> impl Iterator<Item = Token<'_>> + '_ {
        (0..self.tokens.len()).map(move |i| Token { doc: self, i })
    }

    /// Unlabelled span over `[start, end)`.
    pub fn span(&self, start: usize, end: usize) -> Result<Span<'_>> {
        check_range(&SpanRecord::new(start, end), self.len())?;
        Ok(Span {
            doc: self,
            start,
            end,
            label: None,
        })
    }

    /// Entity spans, in document order.
    pub fn ents(&self) -> impl Iterator<Item = Span<'_>> + '_ {
        self.ents.iter().map(move |r| self.view(r))
    }

    /// Noun chunks, in document order.
    pub fn noun_chunks(&self) -> impl Iterator<Item = Span<'_>> + '_ {
        self.noun_chunks.iter().map(move |r| self.view(r))
    }

    fn view<'a>(&'a self, record: &'a SpanRecord) -> Span<'a> {
        Span {
            doc: self,
            start: record.start,
            end: record.end,
            label: record.label.as_deref(),
        }
    }

    /// Label of the entity spanning exactly `[start, end)`, if any.
    #[must_use]
    pub fn entity_label_at(&self, start: usize, end: usize) -> Option<&str> {
        self.ents
            .iter()
            .find(|e| e.start == start && e.end == end)
            .and_then(|e| e.label.as_deref())
    }

    // ------------------------------------------------------------------------
    // Binding slot
    // ------------------------------------------------------------------------

    /// Stamp a non-owning reference to `target`, replacing any previous one.
    pub fn set_binding<T: Any + Send + Sync>(&mut self, target: &Arc<T>) {
        let weak: Weak<dyn Any + Send + Sync> = Arc::downgrade(target) as Weak<T>;
        self.binding = Some(weak);
    }

    /// The bound value, if one was stamped, is still alive, and is a `T`.
    #[must_use]
    pub fn binding<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let target = self.binding.as_ref()?.upgrade()?;
        target.downcast::<T>().ok()
    }

    /// Whether a live binding of any type is present.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.binding
            .as_ref()
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    // ------------------------------------------------------------------------
    // Retokenization
    // ------------------------------------------------------------------------

    /// Merge each range into a single token.
    ///
    /// The merged token takes its text from the span and its tag, lemma,
    /// dependency label and entity type from the span's root. Heads, entity
    /// spans and noun chunks are remapped onto the new token indices. Ranges
    /// of length one are left alone. Identity and binding are kept.
    pub fn merge_spans(self, ranges: &[Range<usize>]) -> Result<Doc> {
        let n = self.tokens.len();
        let mut ranges: Vec<Range<usize>> = ranges
            .iter()
            .filter(|r| r.len() > 1)
            .cloned()
            .collect();
        ranges.sort_by_key(|r| (r.start, r.end));
        for r in &ranges {
            check_range(&SpanRecord::new(r.start, r.end), n)?;
        }
        for pair in ranges.windows(2) {
            if pair[1].start < pair[0].end {
                return Err(Error::overlap(format!(
                    "cannot merge overlapping spans {:?} and {:?}",
                    pair[0], pair[1]
                )));
            }
        }
        if ranges.is_empty() {
            return Ok(self);
        }

        // Old index -> new index.
        let mut mapping = Vec::with_capacity(n);
        let mut roots = Vec::with_capacity(ranges.len());
        let mut next = 0usize;
        let mut pending = ranges.iter().peekable();
        let mut i = 0;
        while i < n {
            match pending.peek() {
                Some(r) if r.start == i => {
                    roots.push(root_index(&self.tokens, r.start, r.end));
                    mapping.extend(std::iter::repeat(next).take(r.len()));
                    i = r.end;
                    pending.next();
                }
                _ => {
                    mapping.push(next);
                    i += 1;
                }
            }
            next += 1;
        }

        let mut tokens = Vec::with_capacity(next);
        let mut pending = ranges.iter().zip(roots).peekable();
        let mut i = 0;
        while i < n {
            match pending.peek() {
                Some((r, root)) if r.start == i => {
                    let root_token = &self.tokens[*root];
                    let mut merged = root_token.clone();
                    merged.text = join_tokens(&self.tokens[r.start..r.end]);
                    merged.whitespace = self.tokens[r.end - 1].whitespace;
                    merged.like_url = false;
                    merged.head = root_token.head.map(|h| mapping[h]);
                    tokens.push(merged);
                    i = r.end;
                    pending.next();
                }
                _ => {
                    let mut token = self.tokens[i].clone();
                    token.head = token.head.map(|h| mapping[h]);
                    tokens.push(token);
                    i += 1;
                }
            }
        }

        let remap = |spans: Vec<SpanRecord>| -> Vec<SpanRecord> {
            let mut out: Vec<SpanRecord> = spans
                .into_iter()
                .map(|s| SpanRecord {
                    start: mapping[s.start],
                    end: mapping[s.end - 1] + 1,
                    label: s.label,
                })
                .collect();
            out.dedup();
            out
        };

        Ok(Doc {
            id: self.id,
            tokens,
            ents: remap(self.ents),
            noun_chunks: remap(self.noun_chunks),
            binding: self.binding,
        })
    }
}

fn check_range(span: &SpanRecord, n: usize) -> Result<()> {
    if span.start >= span.end || span.end > n {
        return Err(Error::out_of_bounds(format!(
            "span {}..{} is empty or exceeds document length {}",
            span.start, span.end, n
        )));
    }
    Ok(())
}

fn join_tokens(tokens: &[TokenRecord]) -> String {
    let mut text = String::new();
    for (i, token) in tokens.iter().enumerate() {
        text.push_str(&token.text);
        if token.whitespace && i + 1 < tokens.len() {
            text.push(' ');
        }
    }
    text
}

/// First token in `[start, end)` whose head lies outside the range (or is
/// itself). Without a parse the last token is taken.
fn root_index(tokens: &[TokenRecord], start: usize, end: usize) -> usize {
    (start..end)
        .find(|&i| match tokens[i].head {
            Some(h) => h == i || h < start || h >= end,
            None => false,
        })
        .unwrap_or(end - 1)
}

// ============================================================================
// Views
// ============================================================================

/// Read-only capability shared by tokens and spans.
pub trait Lexical {
    /// The document this object belongs to.
    fn doc(&self) -> &Doc;

    /// Surface text.
    fn text(&self) -> Cow<'_, str>;

    /// Coarse grammatical tag. For spans, the tag of the root token.
    fn coarse_tag(&self) -> &PosTag;

    /// Entity label, when the object is (or lies inside) an entity.
    fn entity_label(&self) -> Option<&str>;

    /// Whether the object looks like a URL.
    fn like_url(&self) -> bool {
        false
    }
}

/// A token view.
#[derive(Debug, Clone, Copy)]
pub struct Token<'a> {
    doc: &'a Doc,
    i: usize,
}

impl<'a> Token<'a> {
    fn record(&self) -> &'a TokenRecord {
        &self.doc.tokens[self.i]
    }

    /// Index in the document.
    #[must_use]
    pub const fn i(&self) -> usize {
        self.i
    }

    /// Token text.
    #[must_use]
    pub fn text(&self) -> &'a str {
        &self.record().text
    }

    /// Coarse tag.
    #[must_use]
    pub fn pos(&self) -> &'a PosTag {
        &self.record().pos
    }

    /// Fine-grained tag.
    #[must_use]
    pub fn tag(&self) -> &'a str {
        &self.record().tag
    }

    /// Dependency label.
    #[must_use]
    pub fn dep(&self) -> &'a str {
        &self.record().dep
    }

    /// Syntactic head, if parsed.
    #[must_use]
    pub fn head(&self) -> Option<Token<'a>> {
        self.record().head.and_then(|h| self.doc.token(h))
    }

    /// Entity type, if the token is inside an entity.
    #[must_use]
    pub fn ent_type(&self) -> Option<&'a str> {
        self.record().ent_type.as_deref().filter(|l| !l.is_empty())
    }

    /// Whether the token is followed by whitespace.
    #[must_use]
    pub fn whitespace(&self) -> bool {
        self.record().whitespace
    }

    /// The owning document.
    #[must_use]
    pub const fn doc(&self) -> &'a Doc {
        self.doc
    }
}

impl Lexical for Token<'_> {
    fn doc(&self) -> &Doc {
        self.doc
    }

    fn text(&self) -> Cow<'_, str> {
        Cow::Borrowed(Token::text(self))
    }

    fn coarse_tag(&self) -> &PosTag {
        self.pos()
    }

    fn entity_label(&self) -> Option<&str> {
        self.ent_type()
    }

    fn like_url(&self) -> bool {
        self.record().like_url
    }
}

/// A span view over `[start, end)`.
#[derive(Debug, Clone, Copy)]
pub struct Span<'a> {
    doc: &'a Doc,
    start: usize,
    end: usize,
    label: Option<&'a str>,
}

impl<'a> Span<'a> {
    /// First token index.
    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// One past the last token index.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    /// Number of tokens.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Spans are never empty; kept for API symmetry.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Token range.
    #[must_use]
    pub const fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Explicit label, or the label of an entity covering exactly this range.
    #[must_use]
    pub fn label(&self) -> Option<&'a str> {
        self.label
            .or_else(|| self.doc.entity_label_at(self.start, self.end))
            .filter(|l| !l.is_empty())
    }

    /// Span text.
    #[must_use]
    pub fn text(&self) -> String {
        join_tokens(&self.doc.tokens[self.start..self.end])
    }

    /// Tokens in the span.
    pub fn tokens(&self) -> impl Iterator<Item = Token<'a>> + 'a {
        let doc = self.doc;
        (self.start..self.end).map(move |i| Token { doc, i })
    }

    /// Syntactic root of the span.
    #[must_use]
    pub fn root(&self) -> Token<'a> {
        Token {
            doc: self.doc,
            i: root_index(&self.doc.tokens, self.start, self.end),
        }
    }

    /// The owning document.
    #[must_use]
    pub const fn doc(&self) -> &'a Doc {
        self.doc
    }
}

impl Lexical for Span<'_> {
    fn doc(&self) -> &Doc {
        self.doc
    }

    fn text(&self) -> Cow<'_, str> {
        Cow::Owned(Span::text(self))
    }

    fn coarse_tag(&self) -> &PosTag {
        self.root().pos()
    }

    fn entity_label(&self) -> Option<&str> {
        self.label()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_york_doc() -> Doc {
        // "I love New York pizza"
        let tokens = vec![
            TokenRecord::new("I", PosTag::Pron).with_head(1, "nsubj"),
            TokenRecord::new("love", PosTag::Verb).with_head(1, "ROOT"),
            TokenRecord::new("New", PosTag::Propn).with_head(3, "compound"),
            TokenRecord::new("York", PosTag::Propn).with_head(4, "compound"),
            TokenRecord::new("pizza", PosTag::Noun).with_head(1, "dobj"),
        ];
        Doc::from_data(DocData {
            tokens,
            ents: vec![SpanRecord::labelled(2, 4, "GPE")],
            noun_chunks: vec![SpanRecord::new(2, 5)],
        })
        .unwrap()
    }

    #[test]
    fn test_entity_label_propagates_to_tokens() {
        let doc = new_york_doc();
        assert_eq!(doc.token(2).unwrap().ent_type(), Some("GPE"));
        assert_eq!(doc.token(3).unwrap().ent_type(), Some("GPE"));
        assert_eq!(doc.token(4).unwrap().ent_type(), None);
    }

    #[test]
    fn test_span_root_and_text() {
        let doc = new_york_doc();
        let ent = doc.ents().next().unwrap();
        assert_eq!(ent.text(), "New York");
        assert_eq!(ent.root().text(), "York");
        assert_eq!(ent.label(), Some("GPE"));

        let chunk = doc.noun_chunks().next().unwrap();
        assert_eq!(chunk.root().text(), "pizza");
        assert_eq!(Lexical::coarse_tag(&chunk), &PosTag::Noun);
    }

    #[test]
    fn test_unlabelled_span_resolves_matching_entity() {
        let doc = new_york_doc();
        assert_eq!(doc.span(2, 4).unwrap().label(), Some("GPE"));
        assert_eq!(doc.span(2, 5).unwrap().label(), None);
    }

    #[test]
    fn test_invalid_offsets_rejected() {
        let doc = new_york_doc();
        assert!(doc.span(3, 3).is_err());
        assert!(doc.span(4, 6).is_err());

        let bad_head = DocData {
            tokens: vec![TokenRecord::new("x", PosTag::X).with_head(5, "ROOT")],
            ..DocData::default()
        };
        assert!(matches!(Doc::from_data(bad_head), Err(Error::OutOfBounds(_))));
    }

    #[test]
    fn test_overlapping_entities_rejected() {
        let data = DocData {
            tokens: vec![
                TokenRecord::new("a", PosTag::Noun),
                TokenRecord::new("b", PosTag::Noun),
                TokenRecord::new("c", PosTag::Noun),
            ],
            ents: vec![SpanRecord::labelled(0, 2, "ORG"), SpanRecord::labelled(1, 3, "GPE")],
            noun_chunks: vec![],
        };
        assert!(matches!(Doc::from_data(data), Err(Error::Overlap(_))));
    }

    #[test]
    fn test_merge_spans_remaps_everything() {
        let doc = new_york_doc();
        let id = doc.id();
        let merged = doc.merge_spans(&[2..4]).unwrap();
        assert_eq!(merged.id(), id);
        assert_eq!(merged.len(), 4);

        let ny = merged.token(2).unwrap();
        assert_eq!(ny.text(), "New York");
        assert_eq!(ny.pos(), &PosTag::Propn);
        assert_eq!(ny.ent_type(), Some("GPE"));
        assert_eq!(ny.head().unwrap().text(), "pizza");

        let pizza = merged.token(3).unwrap();
        assert_eq!(pizza.head().unwrap().text(), "love");

        let ent = merged.ents().next().unwrap();
        assert_eq!(ent.range(), 2..3);
        let chunk = merged.noun_chunks().next().unwrap();
        assert_eq!(chunk.range(), 2..4);
        assert_eq!(merged.text(), "I love New York pizza");
    }

    #[test]
    fn test_merge_rejects_overlap() {
        let doc = new_york_doc();
        assert!(doc.merge_spans(&[2..4, 3..5]).is_err());
    }

    #[test]
    fn test_binding_is_weak_and_typed() {
        let mut doc = new_york_doc();
        assert!(!doc.is_bound());

        let target = Arc::new(String::from("store"));
        doc.set_binding(&target);
        assert!(doc.is_bound());
        assert_eq!(doc.binding::<String>().as_deref().map(String::as_str), Some("store"));
        assert!(doc.binding::<u32>().is_none());

        drop(target);
        assert!(!doc.is_bound());
        assert!(doc.binding::<String>().is_none());
    }

    #[test]
    fn test_doc_ids_are_unique() {
        let a = Doc::from_tagged([("a", PosTag::Det)]).unwrap();
        let b = Doc::from_tagged([("a", PosTag::Det)]).unwrap();
        assert_ne!(a.id(), b.id());
    }
}
