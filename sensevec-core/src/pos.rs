//! Coarse part-of-speech tags.
//!
//! Tags follow the Universal Dependencies inventory. The sense component of
//! a key is usually one of these labels (`dog|NOUN`, `run|VERB`), so the
//! label strings are part of the on-disk key format and must stay stable.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ============================================================================
// PosTag
// ============================================================================

/// Universal coarse part-of-speech tag.
///
/// # Examples
///
/// ```rust
/// use sensevec_core::PosTag;
///
/// let tag = PosTag::from_label("noun");
/// assert_eq!(tag, PosTag::Noun);
/// assert_eq!(tag.as_label(), "NOUN");
/// ```
///
/// Serialized as its label string, so documents read from JSON can say
/// `"pos": "NOUN"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum PosTag {
    /// Adjective
    Adj,
    /// Adposition
    Adp,
    /// Adverb
    Adv,
    /// Auxiliary
    Aux,
    /// Coordinating conjunction
    Cconj,
    /// Determiner
    Det,
    /// Interjection
    Intj,
    /// Noun
    Noun,
    /// Numeral
    Num,
    /// Particle
    Part,
    /// Pronoun
    Pron,
    /// Proper noun
    Propn,
    /// Punctuation
    Punct,
    /// Subordinating conjunction
    Sconj,
    /// Symbol
    Sym,
    /// Verb
    Verb,
    /// Other / unknown
    X,
    /// Whitespace token
    Space,
    /// No tag assigned upstream.
    #[default]
    Unset,
    /// Tag outside the universal inventory, kept verbatim.
    Other(String),
}

impl PosTag {
    /// Returns true if no tag was assigned.
    #[must_use]
    pub fn is_unset(&self) -> bool {
        match self {
            PosTag::Unset => true,
            PosTag::Other(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Convert to the upper-case label used in sense keys.
    ///
    /// `Unset` maps to the empty string.
    #[must_use]
    pub fn as_label(&self) -> &str {
        match self {
            PosTag::Adj => "ADJ",
            PosTag::Adp => "ADP",
            PosTag::Adv => "ADV",
            PosTag::Aux => "AUX",
            PosTag::Cconj => "CCONJ",
            PosTag::Det => "DET",
            PosTag::Intj => "INTJ",
            PosTag::Noun => "NOUN",
            PosTag::Num => "NUM",
            PosTag::Part => "PART",
            PosTag::Pron => "PRON",
            PosTag::Propn => "PROPN",
            PosTag::Punct => "PUNCT",
            PosTag::Sconj => "SCONJ",
            PosTag::Sym => "SYM",
            PosTag::Verb => "VERB",
            PosTag::X => "X",
            PosTag::Space => "SPACE",
            PosTag::Unset => "",
            PosTag::Other(s) => s.as_str(),
        }
    }

    /// Parse from a label string. Never fails: unknown labels become `Other`.
    ///
    /// `CONJ` is accepted as the pre-v2 spelling of `CCONJ`.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        if label.is_empty() {
            return PosTag::Unset;
        }
        match label.to_uppercase().as_str() {
            "ADJ" => PosTag::Adj,
            "ADP" => PosTag::Adp,
            "ADV" => PosTag::Adv,
            "AUX" => PosTag::Aux,
            "CCONJ" | "CONJ" => PosTag::Cconj,
            "DET" => PosTag::Det,
            "INTJ" => PosTag::Intj,
            "NOUN" => PosTag::Noun,
            "NUM" => PosTag::Num,
            "PART" => PosTag::Part,
            "PRON" => PosTag::Pron,
            "PROPN" => PosTag::Propn,
            "PUNCT" => PosTag::Punct,
            "SCONJ" => PosTag::Sconj,
            "SYM" => PosTag::Sym,
            "VERB" => PosTag::Verb,
            "X" => PosTag::X,
            "SPACE" => PosTag::Space,
            other => PosTag::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for PosTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_label())
    }
}

impl std::str::FromStr for PosTag {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from_label(s))
    }
}

impl Serialize for PosTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_label())
    }
}

impl<'de> Deserialize<'de> for PosTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(&label))
    }
}
