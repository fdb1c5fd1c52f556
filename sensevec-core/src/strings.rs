//! Shared string interner.
//!
//! A [`StringStore`] is owned by the host pipeline and shared (behind an
//! `Arc`) by every component that needs to intern strings. Vector stores
//! register their keys here, but never serialize it: the host supplies its
//! current store when a component is loaded.

use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;

/// Identifier of an interned string. Stable for the lifetime of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StringId(pub u32);

#[derive(Debug, Default)]
struct Interned {
    strings: Vec<String>,
    ids: HashMap<String, StringId>,
}

/// Thread-safe, append-only string interner.
///
/// # Example
///
/// ```rust
/// use sensevec_core::StringStore;
///
/// let strings = StringStore::new();
/// let id = strings.add("dog|NOUN");
/// assert_eq!(strings.add("dog|NOUN"), id);
/// assert_eq!(strings.get(id).as_deref(), Some("dog|NOUN"));
/// assert!(strings.contains("dog|NOUN"));
/// ```
#[derive(Debug, Default)]
pub struct StringStore {
    inner: RwLock<Interned>,
}

impl StringStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `s`, returning its id. Adding an existing string is a no-op.
    pub fn add(&self, s: &str) -> StringId {
        if let Some(id) = self.inner.read().ids.get(s) {
            return *id;
        }
        let mut inner = self.inner.write();
        // Another writer may have won the race between the two locks.
        if let Some(id) = inner.ids.get(s) {
            return *id;
        }
        let id = StringId(inner.strings.len() as u32);
        inner.strings.push(s.to_string());
        inner.ids.insert(s.to_string(), id);
        id
    }

    /// Look up the id of an interned string.
    #[must_use]
    pub fn lookup(&self, s: &str) -> Option<StringId> {
        self.inner.read().ids.get(s).copied()
    }

    /// Resolve an id back to its string.
    #[must_use]
    pub fn get(&self, id: StringId) -> Option<String> {
        self.inner.read().strings.get(id.0 as usize).cloned()
    }

    /// Whether `s` has been interned.
    #[must_use]
    pub fn contains(&self, s: &str) -> bool {
        self.inner.read().ids.contains_key(s)
    }

    /// Number of interned strings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().strings.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all strings in insertion order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        self.inner.read().strings.clone()
    }
}

impl<S: AsRef<str>> FromIterator<S> for StringStore {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let store = StringStore::new();
        for s in iter {
            store.add(s.as_ref());
        }
        store
    }
}

impl Serialize for StringStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_vec().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StringStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let strings = Vec::<String>::deserialize(deserializer)?;
        Ok(strings.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_add_is_idempotent() {
        let strings = StringStore::new();
        let a = strings.add("a");
        let b = strings.add("b");
        assert_ne!(a, b);
        assert_eq!(strings.add("a"), a);
        assert_eq!(strings.len(), 2);
    }

    #[test]
    fn test_unknown_lookup() {
        let strings = StringStore::new();
        assert!(strings.lookup("missing").is_none());
        assert!(strings.get(StringId(7)).is_none());
        assert!(strings.is_empty());
    }

    #[test]
    fn test_serde_preserves_order() {
        let strings: StringStore = ["x", "y", "z"].into_iter().collect();
        let json = serde_json::to_string(&strings).unwrap();
        assert_eq!(json, r#"["x","y","z"]"#);
        let back: StringStore = serde_json::from_str(&json).unwrap();
        assert_eq!(back.lookup("y"), Some(StringId(1)));
    }

    #[test]
    fn test_concurrent_add_assigns_single_id() {
        let strings = Arc::new(StringStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let strings = Arc::clone(&strings);
                thread::spawn(move || strings.add("shared"))
            })
            .collect();
        let ids: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(ids.iter().all(|id| *id == ids[0]));
        assert_eq!(strings.len(), 1);
    }
}
