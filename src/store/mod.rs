//! Vector stores: key → vector and key → frequency tables with neighbour queries.
//!
//! [`VectorStore`] is the interface the sense component consumes. The
//! component never looks inside a store: it encodes keys, asks questions,
//! and passes serialization through. [`SenseVectors`] is the in-memory
//! implementation shipped with this crate.
//!
//! # Serialization contract
//!
//! Every (de)serialization method takes an `exclude` list. Components always
//! pass `&[Part::Strings]`: the string table belongs to the host pipeline,
//! and on load the host's current table is handed back in.

mod memory;

pub use memory::{SenseVectors, StoreConfig};

use crate::error::Result;
use crate::key::{self, SenseKey};
use sensevec_core::StringStore;
use std::path::Path;
use std::sync::Arc;

/// Serializable parts of a store that callers may exclude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Part {
    /// The shared string table.
    Strings,
}

/// Whether `part` appears in `exclude`.
#[must_use]
pub fn is_excluded(exclude: &[Part], part: Part) -> bool {
    exclude.contains(&part)
}

/// A (key → vector, key → frequency) table with nearest-neighbour queries.
pub trait VectorStore: Send + Sync + 'static {
    /// Allocate an empty store with `(rows, width)` shape.
    fn empty(shape: (usize, usize), strings: Option<Arc<StringStore>>) -> Self
    where
        Self: Sized;

    /// `(rows, width)`.
    fn shape(&self) -> (usize, usize);

    /// Attached string table, if any.
    fn strings(&self) -> Option<&Arc<StringStore>>;

    /// Number of stored keys.
    fn len(&self) -> usize;

    /// Whether the store has no keys.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Membership test.
    fn contains(&self, key: &SenseKey) -> bool;

    /// Vector for `key`.
    ///
    /// # Errors
    ///
    /// [`crate::Error::KeyNotFound`] if absent.
    fn get(&self, key: &SenseKey) -> Result<&[f32]>;

    /// Frequency for `key`.
    ///
    /// # Errors
    ///
    /// [`crate::Error::KeyNotFound`] if absent.
    fn get_freq(&self, key: &SenseKey) -> Result<u64>;

    /// The `n` keys most similar to the mean of `keys`, excluding `keys`
    /// themselves, best first.
    fn most_similar(&self, keys: &[SenseKey], n: usize) -> Result<Vec<(SenseKey, f32)>>;

    /// Keys that share `key`'s text (case-insensitively) under another sense.
    fn get_other_senses(&self, key: &SenseKey) -> Vec<SenseKey>;

    /// Build a key in this store's format.
    fn make_key(&self, word: &str, sense: &str) -> SenseKey {
        key::make_key(word, sense)
    }

    /// Split a key in this store's format.
    fn split_key(&self, key: &SenseKey) -> (String, String) {
        key::decode(key)
    }

    /// Serialize to bytes.
    fn to_bytes(&self, exclude: &[Part]) -> Result<Vec<u8>>;

    /// Deserialize from bytes. Excluded parts are taken from the arguments.
    fn from_bytes(bytes: &[u8], exclude: &[Part], strings: Option<Arc<StringStore>>) -> Result<Self>
    where
        Self: Sized;

    /// Serialize into a directory, creating it if needed.
    fn to_disk(&self, path: &Path, exclude: &[Part]) -> Result<()>;

    /// Deserialize from a directory written by [`VectorStore::to_disk`].
    fn from_disk(path: &Path, exclude: &[Part], strings: Option<Arc<StringStore>>) -> Result<Self>
    where
        Self: Sized;
}
