//! Sense keys: the canonical `"word|SENSE"` strings a vector store is indexed by.
//!
//! # Format
//!
//! ```text
//! new_york|GPE
//! ^^^^^^^^ ^^^
//! text     sense
//! ```
//!
//! - **text** is lower-cased, stripped of the separator, with every run of
//!   whitespace collapsed into a single `_` (stores are trained on
//!   underscore-joined phrases).
//! - **sense** is an upper-cased entity label or coarse part-of-speech tag.
//!
//! Which of the two becomes the sense is decided by a [`KeyPolicy`]. Entity
//! labels are only used when entities are preferred, which is what a
//! component running in merge mode asks for: merged entities are the only
//! entity-typed rows a store is trained with.

use crate::error::{Error, Result};
use sensevec_core::Lexical;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

/// Separator between text and sense.
pub const SEPARATOR: char = '|';

/// Text used for URL-like tokens.
pub const URL_TEXT: &str = "%%URL";

/// Sense used for URL-like tokens.
pub const URL_SENSE: &str = "X";

// ============================================================================
// SenseKey
// ============================================================================

/// A canonical sense key.
///
/// Always contains at least one separator; the sense is everything after
/// the last one.
///
/// # Example
///
/// ```rust
/// use sensevec::key::SenseKey;
///
/// let key = SenseKey::new("New York", "gpe");
/// assert_eq!(key.as_str(), "new_york|GPE");
/// assert_eq!(key.word(), "new_york");
/// assert_eq!(key.sense(), "GPE");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SenseKey(String);

impl SenseKey {
    /// Build a key from raw text and sense, normalizing both.
    #[must_use]
    pub fn new(word: &str, sense: &str) -> Self {
        SenseKey(format!(
            "{}{}{}",
            normalize_text(word),
            SEPARATOR,
            normalize_sense(sense)
        ))
    }

    /// Accept an already-encoded key verbatim.
    ///
    /// Fails if the string has no separator.
    pub fn parse(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if !key.contains(SEPARATOR) {
            return Err(Error::invalid_argument(format!(
                "{:?} is not a sense key: missing '{}' separator",
                key, SEPARATOR
            )));
        }
        Ok(SenseKey(key))
    }

    fn url() -> Self {
        SenseKey(format!("{}{}{}", URL_TEXT, SEPARATOR, URL_SENSE))
    }

    /// The encoded string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Text and sense, split on the last separator.
    #[must_use]
    pub fn split(&self) -> (&str, &str) {
        // Construction guarantees a separator.
        self.0.rsplit_once(SEPARATOR).unwrap_or((self.0.as_str(), ""))
    }

    /// Text component.
    #[must_use]
    pub fn word(&self) -> &str {
        self.split().0
    }

    /// Sense component.
    #[must_use]
    pub fn sense(&self) -> &str {
        self.split().1
    }

    /// Same text under a different sense.
    #[must_use]
    pub fn with_sense(&self, sense: &str) -> Self {
        SenseKey(format!("{}{}{}", self.word(), SEPARATOR, normalize_sense(sense)))
    }

    /// Consume into the encoded string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for SenseKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SenseKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SenseKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SenseKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        SenseKey::parse(value)
    }
}

impl From<SenseKey> for String {
    fn from(key: SenseKey) -> Self {
        key.0
    }
}

impl std::str::FromStr for SenseKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SenseKey::parse(s)
    }
}

// ============================================================================
// Policy
// ============================================================================

/// Which annotation supplies the sense component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyPolicy {
    /// Always use the coarse part-of-speech tag.
    #[default]
    PreferTags,
    /// Use the entity label when there is one, else the coarse tag.
    PreferEntities,
}

impl KeyPolicy {
    /// Policy used by a component with the given merge mode.
    #[must_use]
    pub const fn for_merge_mode(merge_phrases: bool) -> Self {
        if merge_phrases {
            KeyPolicy::PreferEntities
        } else {
            KeyPolicy::PreferTags
        }
    }
}

// ============================================================================
// Codec
// ============================================================================

/// Normalize text for use in a key.
///
/// ```rust
/// use sensevec::key::normalize_text;
///
/// assert_eq!(normalize_text("  New \t York "), "new_york");
/// assert_eq!(normalize_text("a|b"), "ab");
/// ```
#[must_use]
pub fn normalize_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    lowered
        .split(|c: char| c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| part.replace(SEPARATOR, ""))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Normalize a sense label: trimmed, upper-cased, separator removed.
#[must_use]
pub fn normalize_sense(sense: &str) -> String {
    sense.trim().to_uppercase().replace(SEPARATOR, "")
}

/// Build a key from raw text and sense.
#[must_use]
pub fn make_key(word: &str, sense: &str) -> SenseKey {
    SenseKey::new(word, sense)
}

/// Split an encoded key on its last separator.
///
/// ```rust
/// use sensevec::key::split_key;
///
/// let (word, sense) = split_key("new_york|GPE").unwrap();
/// assert_eq!((word.as_str(), sense.as_str()), ("new_york", "GPE"));
/// assert!(split_key("no-separator").is_err());
/// ```
pub fn split_key(key: &str) -> Result<(String, String)> {
    key.rsplit_once(SEPARATOR)
        .map(|(word, sense)| (word.to_string(), sense.to_string()))
        .ok_or_else(|| {
            Error::invalid_argument(format!(
                "{:?} is not a sense key: missing '{}' separator",
                key, SEPARATOR
            ))
        })
}

/// Decode a key into owned `(word, sense)`.
#[must_use]
pub fn decode(key: &SenseKey) -> (String, String) {
    let (word, sense) = key.split();
    (word.to_string(), sense.to_string())
}

/// Resolve the sense component for `obj` under `policy`.
pub fn resolve_sense<L: Lexical + ?Sized>(obj: &L, policy: KeyPolicy) -> Result<String> {
    if policy == KeyPolicy::PreferEntities {
        if let Some(label) = obj.entity_label() {
            let sense = normalize_sense(label);
            if !sense.is_empty() {
                return Ok(sense);
            }
        }
    }
    let sense = normalize_sense(obj.coarse_tag().as_label());
    if sense.is_empty() {
        return Err(Error::unresolvable_sense(obj.text()));
    }
    Ok(sense)
}

/// Encode a token or span into its sense key.
///
/// URL-like objects map to `%%URL|X` regardless of policy.
///
/// # Errors
///
/// [`Error::UnresolvableSense`] if the object has no usable entity label
/// (under `PreferEntities`) and no coarse tag.
pub fn encode<L: Lexical + ?Sized>(obj: &L, policy: KeyPolicy) -> Result<SenseKey> {
    if obj.like_url() {
        return Ok(SenseKey::url());
    }
    let sense = resolve_sense(obj, policy)?;
    Ok(SenseKey(format!(
        "{}{}{}",
        normalize_text(&obj.text()),
        SEPARATOR,
        sense
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensevec_core::{Doc, DocData, PosTag, SpanRecord, TokenRecord};

    fn doc() -> Doc {
        Doc::from_data(DocData {
            tokens: vec![
                TokenRecord::new("Visit", PosTag::Verb).with_head(0, "ROOT"),
                TokenRecord::new("New", PosTag::Propn).with_head(2, "compound"),
                TokenRecord::new("York", PosTag::Propn).with_head(0, "dobj"),
                TokenRecord::new("https://example.com", PosTag::X).url(),
                TokenRecord::new("", PosTag::Unset),
            ],
            ents: vec![SpanRecord::labelled(1, 3, "gpe")],
            noun_chunks: vec![],
        })
        .unwrap()
    }

    #[test]
    fn test_token_uses_tag_by_default() {
        let doc = doc();
        let token = doc.token(0).unwrap();
        assert_eq!(encode(&token, KeyPolicy::PreferTags).unwrap().as_str(), "visit|VERB");
    }

    #[test]
    fn test_entity_span_respects_policy() {
        let doc = doc();
        let span = doc.ents().next().unwrap();
        assert_eq!(
            encode(&span, KeyPolicy::PreferTags).unwrap().as_str(),
            "new_york|PROPN"
        );
        assert_eq!(
            encode(&span, KeyPolicy::PreferEntities).unwrap().as_str(),
            "new_york|GPE"
        );
    }

    #[test]
    fn test_token_inside_entity_resolves_label() {
        let doc = doc();
        let york = doc.token(2).unwrap();
        assert_eq!(
            encode(&york, KeyPolicy::PreferEntities).unwrap().as_str(),
            "york|GPE"
        );
    }

    #[test]
    fn test_url_token() {
        let doc = doc();
        let url = doc.token(3).unwrap();
        let key = encode(&url, KeyPolicy::PreferTags).unwrap();
        assert_eq!(key.as_str(), "%%URL|X");
    }

    #[test]
    fn test_unresolvable_sense() {
        let doc = doc();
        let empty = doc.token(4).unwrap();
        assert!(matches!(
            encode(&empty, KeyPolicy::PreferEntities),
            Err(Error::UnresolvableSense { .. })
        ));
    }

    #[test]
    fn test_separator_is_stripped_from_text() {
        let key = SenseKey::new("a|b c", "noun");
        assert_eq!(key.as_str(), "ab_c|NOUN");
        assert_eq!(key.split(), ("ab_c", "NOUN"));
    }

    #[test]
    fn test_split_uses_last_separator() {
        let key = SenseKey::parse("a|b|NOUN").unwrap();
        assert_eq!(key.split(), ("a|b", "NOUN"));
        assert!(SenseKey::parse("plain").is_err());
    }

    #[test]
    fn test_with_sense() {
        let key = SenseKey::new("duck", "NOUN");
        assert_eq!(key.with_sense("verb").as_str(), "duck|VERB");
    }

    #[test]
    fn test_serde_rejects_malformed_key() {
        let ok: SenseKey = serde_json::from_str(r#""dog|NOUN""#).unwrap();
        assert_eq!(ok.sense(), "NOUN");
        assert!(serde_json::from_str::<SenseKey>(r#""dog""#).is_err());
    }
}
