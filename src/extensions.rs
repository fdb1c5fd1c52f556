//! Named, computed attributes on documents, tokens and spans.
//!
//! The document model in `sensevec-core` is fixed. Components that want to
//! expose extra per-object data register getters (or methods taking a
//! count) here under a name, and hosts look them up by name without
//! knowing which component provides them:
//!
//! ```rust
//! use sensevec::extensions::{AttrValue, Extension, Extensions, ObjectKind, Target};
//! use sensevec_core::{Doc, PosTag};
//! use std::sync::Arc;
//!
//! let extensions = Extensions::new();
//! extensions
//!     .set_extension(
//!         ObjectKind::Token,
//!         "is_noun",
//!         Extension::Getter(Arc::new(|doc: &Doc, target: &Target| {
//!             let Target::Token(i) = target else { unreachable!() };
//!             Ok(AttrValue::Bool(doc.token(*i).is_some_and(|t| t.pos() == &PosTag::Noun)))
//!         })),
//!     )
//!     .unwrap();
//!
//! let doc = Doc::from_tagged([("dog", PosTag::Noun)]).unwrap();
//! let value = extensions.get(&doc, &Target::Token(0), "is_noun").unwrap();
//! assert_eq!(value.as_bool(), Some(true));
//! ```
//!
//! Registering a name twice for the same object kind is an error.

use crate::error::{Error, Result};
use crate::key::SenseKey;
use parking_lot::RwLock;
use sensevec_core::{Doc, Lexical};
use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

/// Kind of object an extension is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKind {
    /// Whole documents.
    Doc,
    /// Single tokens.
    Token,
    /// Token spans.
    Span,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ObjectKind::Doc => "Doc",
            ObjectKind::Token => "Token",
            ObjectKind::Span => "Span",
        };
        f.write_str(name)
    }
}

/// The object an attribute is read from, relative to its document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// The document itself.
    Doc,
    /// Token at an index.
    Token(usize),
    /// Tokens `[start, end)`.
    Span {
        /// First token index.
        start: usize,
        /// One past the last token index.
        end: usize,
    },
}

impl Target {
    /// Kind of the targeted object.
    #[must_use]
    pub const fn kind(&self) -> ObjectKind {
        match self {
            Target::Doc => ObjectKind::Doc,
            Target::Token(_) => ObjectKind::Token,
            Target::Span { .. } => ObjectKind::Span,
        }
    }

    /// Span target from a range.
    #[must_use]
    pub const fn span(range: Range<usize>) -> Self {
        Target::Span {
            start: range.start,
            end: range.end,
        }
    }

    /// Run `f` on the token or span this target names in `doc`.
    pub fn with_lexical<R>(
        &self,
        doc: &Doc,
        f: impl FnOnce(&dyn Lexical) -> Result<R>,
    ) -> Result<R> {
        match self {
            Target::Doc => Err(Error::invalid_argument(
                "a document is not a token or span",
            )),
            Target::Token(i) => {
                let token = doc.token(*i).ok_or_else(|| {
                    Error::invalid_argument(format!(
                        "token {} out of range for {} tokens",
                        i,
                        doc.len()
                    ))
                })?;
                f(&token)
            }
            Target::Span { start, end } => {
                let span = doc.span(*start, *end)?;
                f(&span)
            }
        }
    }
}

/// Value produced by an extension.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum AttrValue {
    /// Boolean flag.
    Bool(bool),
    /// Count.
    Int(u64),
    /// A single sense key.
    Key(SenseKey),
    /// Several sense keys.
    Keys(Vec<SenseKey>),
    /// A vector.
    Vector(Vec<f32>),
    /// Scored `(word, sense)` pairs, best first.
    Scored(Vec<((String, String), f32)>),
    /// Token ranges.
    Spans(Vec<Range<usize>>),
}

impl AttrValue {
    /// Boolean payload.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Count payload.
    #[must_use]
    pub fn as_int(&self) -> Option<u64> {
        match self {
            AttrValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Key payload.
    #[must_use]
    pub fn as_key(&self) -> Option<&SenseKey> {
        match self {
            AttrValue::Key(k) => Some(k),
            _ => None,
        }
    }

    /// Keys payload.
    #[must_use]
    pub fn as_keys(&self) -> Option<&[SenseKey]> {
        match self {
            AttrValue::Keys(k) => Some(k),
            _ => None,
        }
    }

    /// Vector payload.
    #[must_use]
    pub fn as_vector(&self) -> Option<&[f32]> {
        match self {
            AttrValue::Vector(v) => Some(v),
            _ => None,
        }
    }

    /// Scored payload.
    #[must_use]
    pub fn as_scored(&self) -> Option<&[((String, String), f32)]> {
        match self {
            AttrValue::Scored(s) => Some(s),
            _ => None,
        }
    }

    /// Ranges payload.
    #[must_use]
    pub fn as_spans(&self) -> Option<&[Range<usize>]> {
        match self {
            AttrValue::Spans(s) => Some(s),
            _ => None,
        }
    }
}

/// Attribute getter.
pub type Getter = Arc<dyn Fn(&Doc, &Target) -> Result<AttrValue> + Send + Sync>;

/// Attribute method taking a count.
pub type Method = Arc<dyn Fn(&Doc, &Target, usize) -> Result<AttrValue> + Send + Sync>;

/// A registered extension.
#[derive(Clone)]
pub enum Extension {
    /// Read like a property.
    Getter(Getter),
    /// Called with a count argument.
    Method(Method),
}

impl std::fmt::Debug for Extension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Extension::Getter(_) => f.write_str("Extension::Getter"),
            Extension::Method(_) => f.write_str("Extension::Method"),
        }
    }
}

/// Registry of extensions, shared through the [`crate::Vocab`].
#[derive(Default)]
pub struct Extensions {
    table: RwLock<HashMap<(ObjectKind, String), Extension>>,
}

impl std::fmt::Debug for Extensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<String> = self
            .table
            .read()
            .keys()
            .map(|(kind, name)| format!("{}.{}", kind, name))
            .collect();
        names.sort();
        f.debug_struct("Extensions").field("registered", &names).finish()
    }
}

impl Extensions {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` on `kind`.
    ///
    /// # Errors
    ///
    /// [`Error::Extension`] if the name is already taken for that kind.
    pub fn set_extension(&self, kind: ObjectKind, name: &str, extension: Extension) -> Result<()> {
        let mut table = self.table.write();
        let slot = (kind, name.to_string());
        if table.contains_key(&slot) {
            return Err(Error::extension(format!(
                "{}.{} is already registered",
                kind, name
            )));
        }
        table.insert(slot, extension);
        Ok(())
    }

    /// Register several extensions at once.
    ///
    /// Either all are registered or, if any name is taken, none are.
    pub fn set_extensions(&self, batch: Vec<(ObjectKind, &str, Extension)>) -> Result<()> {
        let mut table = self.table.write();
        if let Some((kind, name, _)) = batch
            .iter()
            .find(|(kind, name, _)| table.contains_key(&(*kind, name.to_string())))
        {
            return Err(Error::extension(format!(
                "{}.{} is already registered",
                kind, name
            )));
        }
        for (kind, name, extension) in batch {
            table.insert((kind, name.to_string()), extension);
        }
        Ok(())
    }

    /// Whether `name` is registered on `kind`.
    #[must_use]
    pub fn has_extension(&self, kind: ObjectKind, name: &str) -> bool {
        self.table.read().contains_key(&(kind, name.to_string()))
    }

    /// Unregister `name` from `kind`, returning it.
    pub fn remove_extension(&self, kind: ObjectKind, name: &str) -> Option<Extension> {
        self.table.write().remove(&(kind, name.to_string()))
    }

    /// Number of registered extensions across all kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, kind: ObjectKind, name: &str) -> Result<Extension> {
        self.table
            .read()
            .get(&(kind, name.to_string()))
            .cloned()
            .ok_or_else(|| Error::extension(format!("{}.{} is not registered", kind, name)))
    }

    /// Read a getter extension.
    pub fn get(&self, doc: &Doc, target: &Target, name: &str) -> Result<AttrValue> {
        // Clone out of the lock so the getter may itself consult the registry.
        match self.lookup(target.kind(), name)? {
            Extension::Getter(getter) => getter(doc, target),
            Extension::Method(_) => Err(Error::extension(format!(
                "{}.{} is a method; use call()",
                target.kind(),
                name
            ))),
        }
    }

    /// Call a method extension with `n`.
    pub fn call(&self, doc: &Doc, target: &Target, name: &str, n: usize) -> Result<AttrValue> {
        match self.lookup(target.kind(), name)? {
            Extension::Method(method) => method(doc, target, n),
            Extension::Getter(_) => Err(Error::extension(format!(
                "{}.{} is a getter; use get()",
                target.kind(),
                name
            ))),
        }
    }
}
