//! The sense annotation component.
//!
//! A [`SenseComponent`] sits in a document pipeline. Constructing one has no
//! side effects on the shared [`Vocab`]; the first document it processes
//! registers its extensions, exactly once:
//!
//! | Kind        | Name             | Kind of extension | Value              |
//! |-------------|------------------|-------------------|--------------------|
//! | Token, Span | `sense_key`      | getter            | `Key`              |
//! | Token, Span | `in_sense_store` | getter            | `Bool`             |
//! | Token, Span | `sense_vector`   | getter            | `Vector`           |
//! | Token, Span | `sense_freq`     | getter            | `Int`              |
//! | Token, Span | `other_senses`   | getter            | `Keys`             |
//! | Token, Span | `most_similar`   | method (`n`)      | `Scored`           |
//! | Doc         | `sense_phrases`  | getter            | `Spans`            |
//!
//! Every processed document is stamped with a non-owning reference to the
//! component's store. Accessors, whether called on the component or through
//! the registry, find the store through that reference, so they work on any
//! token or span of a processed document and fail with
//! [`Error::UnboundDocument`] on anything else.
//!
//! # Example
//!
//! ```rust
//! use sensevec::{ComponentConfig, SenseComponent, SenseKey, SenseVectors, Vocab};
//! use sensevec_core::{Doc, PosTag};
//!
//! let vocab = Vocab::new();
//! let mut store = SenseVectors::empty_for(&vocab, (10, 2));
//! store.add(SenseKey::new("dog", "NOUN"), &[1.0, 0.0], 42).unwrap();
//! let component = SenseComponent::with_store(&vocab, store, false);
//!
//! let doc = component
//!     .process(Doc::from_tagged([("Dog", PosTag::Noun)]).unwrap())
//!     .unwrap();
//! let dog = doc.token(0).unwrap();
//! assert!(component.has_entry(&dog).unwrap());
//! assert_eq!(component.frequency_of(&dog).unwrap(), 42);
//! ```

use crate::config::ComponentConfig;
use crate::error::{Error, Result};
use crate::extensions::{AttrValue, Extension, ObjectKind, Target};
use crate::key::{self, KeyPolicy, SenseKey};
use crate::phrases;
use crate::store::{Part, SenseVectors, VectorStore};
use crate::sync::{lock, Mutex};
use crate::vocab::Vocab;
use sensevec_core::{Doc, Lexical};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Token/span extension: the object's sense key.
pub const ATTR_KEY: &str = "sense_key";
/// Token/span extension: whether the key is in the store.
pub const ATTR_IN_STORE: &str = "in_sense_store";
/// Token/span extension: the key's vector.
pub const ATTR_VECTOR: &str = "sense_vector";
/// Token/span extension: the key's frequency.
pub const ATTR_FREQ: &str = "sense_freq";
/// Token/span extension: the same text under other senses.
pub const ATTR_OTHER_SENSES: &str = "other_senses";
/// Token/span method: nearest neighbours.
pub const ATTR_MOST_SIMILAR: &str = "most_similar";
/// Document extension: mergeable phrases.
pub const ATTR_PHRASES: &str = "sense_phrases";

/// Only what the store never serializes is excluded.
const EXCLUDE: &[Part] = &[Part::Strings];

/// Lifecycle of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentState {
    /// Constructed, nothing registered yet.
    Uninitialized,
    /// Extensions registered; never goes back.
    Ready,
}

/// Pipeline component annotating tokens and spans with sense data.
///
/// Generic over the store; [`SenseVectors`] by default.
pub struct SenseComponent<S: VectorStore = SenseVectors> {
    vocab: Vocab,
    store: Arc<S>,
    merge_phrases: bool,
    state: Mutex<ComponentState>,
    registrations: AtomicUsize,
}

impl<S: VectorStore> std::fmt::Debug for SenseComponent<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SenseComponent")
            .field("shape", &self.store.shape())
            .field("keys", &self.store.len())
            .field("merge_phrases", &self.merge_phrases)
            .field("state", &self.state())
            .finish()
    }
}

impl<S: VectorStore> SenseComponent<S> {
    /// Component name in a pipeline.
    pub const NAME: &'static str = "sensevec";

    /// Create a component with an empty store of `config.shape`.
    ///
    /// The store shares the vocab's string table. Nothing is registered
    /// on the vocab until the first [`SenseComponent::process`] call.
    pub fn new(vocab: &Vocab, config: &ComponentConfig) -> Result<Self> {
        config.validate()?;
        let store = S::empty(config.shape, Some(Arc::clone(vocab.strings())));
        Ok(Self::with_store(vocab, store, config.merge_phrases))
    }

    /// Create a component around a populated store.
    pub fn with_store(vocab: &Vocab, store: S, merge_phrases: bool) -> Self {
        Self {
            vocab: vocab.clone(),
            store: Arc::new(store),
            merge_phrases,
            state: Mutex::new(ComponentState::Uninitialized),
            registrations: AtomicUsize::new(0),
        }
    }

    /// The store.
    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The vocab this component registers on.
    #[must_use]
    pub fn vocab(&self) -> &Vocab {
        &self.vocab
    }

    /// Whether phrases are merged and entities keyed by label.
    #[must_use]
    pub fn merge_phrases(&self) -> bool {
        self.merge_phrases
    }

    /// Key policy implied by the merge mode.
    #[must_use]
    pub fn policy(&self) -> KeyPolicy {
        KeyPolicy::for_merge_mode(self.merge_phrases)
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ComponentState {
        *lock(&self.state)
    }

    /// How many times extensions were registered. At most one.
    #[must_use]
    pub fn registration_count(&self) -> usize {
        self.registrations.load(Ordering::SeqCst)
    }

    // ------------------------------------------------------------------------
    // Processing
    // ------------------------------------------------------------------------

    /// Process one document.
    ///
    /// Registers extensions on first use, merges phrases in merge mode, and
    /// binds the (possibly retokenized) document to this component's store.
    ///
    /// # Errors
    ///
    /// [`Error::Extension`] if another component already registered the
    /// same extension names on this vocab.
    pub fn process(&self, doc: Doc) -> Result<Doc> {
        self.ensure_registered()?;
        let mut doc = if self.merge_phrases {
            phrases::merge_phrases(doc)?
        } else {
            doc
        };
        doc.set_binding(&self.store);
        Ok(doc)
    }

    /// Process a batch of documents in order.
    pub fn pipe(&self, docs: impl IntoIterator<Item = Doc>) -> Result<Vec<Doc>> {
        docs.into_iter().map(|doc| self.process(doc)).collect()
    }

    fn ensure_registered(&self) -> Result<()> {
        let mut state = lock(&self.state);
        if *state == ComponentState::Ready {
            return Ok(());
        }
        self.vocab.extensions().set_extensions(self.extensions())?;
        self.registrations.fetch_add(1, Ordering::SeqCst);
        *state = ComponentState::Ready;
        log::info!(
            "[{}] registered extensions (merge_phrases={})",
            Self::NAME,
            self.merge_phrases
        );
        Ok(())
    }

    fn extensions(&self) -> Vec<(ObjectKind, &'static str, Extension)> {
        let policy = self.policy();
        let mut batch: Vec<(ObjectKind, &'static str, Extension)> = Vec::with_capacity(13);
        for kind in [ObjectKind::Token, ObjectKind::Span] {
            batch.push((
                kind,
                ATTR_KEY,
                getter(move |obj| Ok(AttrValue::Key(key_of::<S, _>(obj, policy)?))),
            ));
            batch.push((
                kind,
                ATTR_IN_STORE,
                getter(move |obj| Ok(AttrValue::Bool(has_entry::<S, _>(obj, policy)?))),
            ));
            batch.push((
                kind,
                ATTR_VECTOR,
                getter(move |obj| Ok(AttrValue::Vector(vector_of::<S, _>(obj, policy)?))),
            ));
            batch.push((
                kind,
                ATTR_FREQ,
                getter(move |obj| Ok(AttrValue::Int(frequency_of::<S, _>(obj, policy)?))),
            ));
            batch.push((
                kind,
                ATTR_OTHER_SENSES,
                getter(move |obj| Ok(AttrValue::Keys(other_senses_of::<S, _>(obj, policy)?))),
            ));
            batch.push((
                kind,
                ATTR_MOST_SIMILAR,
                Extension::Method(Arc::new(move |doc: &Doc, target: &Target, n: usize| {
                    target.with_lexical(doc, |obj| {
                        Ok(AttrValue::Scored(most_similar::<S, _>(obj, n, policy)?))
                    })
                })),
            ));
        }
        batch.push((
            ObjectKind::Doc,
            ATTR_PHRASES,
            Extension::Getter(Arc::new(|doc: &Doc, _: &Target| {
                Ok(AttrValue::Spans(phrases::phrase_ranges(doc)))
            })),
        ));
        batch
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Sense key for a token or span of a processed document.
    pub fn key_of<L: Lexical + ?Sized>(&self, obj: &L) -> Result<SenseKey> {
        key_of::<S, L>(obj, self.policy())
    }

    /// Whether the object's key is in the bound store.
    pub fn has_entry<L: Lexical + ?Sized>(&self, obj: &L) -> Result<bool> {
        has_entry::<S, L>(obj, self.policy())
    }

    /// Vector of the object's key.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] if the key is not in the store.
    pub fn vector_of<L: Lexical + ?Sized>(&self, obj: &L) -> Result<Vec<f32>> {
        vector_of::<S, L>(obj, self.policy())
    }

    /// Frequency of the object's key.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] if the key is not in the store.
    pub fn frequency_of<L: Lexical + ?Sized>(&self, obj: &L) -> Result<u64> {
        frequency_of::<S, L>(obj, self.policy())
    }

    /// Up to `n` nearest neighbours as `((word, sense), score)`, best first.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `n` is zero.
    pub fn most_similar<L: Lexical + ?Sized>(
        &self,
        obj: &L,
        n: usize,
    ) -> Result<Vec<((String, String), f32)>> {
        most_similar::<S, L>(obj, n, self.policy())
    }

    /// Keys with the same text under other senses.
    pub fn other_senses_of<L: Lexical + ?Sized>(&self, obj: &L) -> Result<Vec<SenseKey>> {
        other_senses_of::<S, L>(obj, self.policy())
    }

    // ------------------------------------------------------------------------
    // Serialization
    // ------------------------------------------------------------------------

    /// Serialize the store, without the string table.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.store.to_bytes(EXCLUDE)
    }

    /// Load a component from [`SenseComponent::to_bytes`] output.
    ///
    /// The store is re-attached to `vocab`'s string table.
    pub fn from_bytes(vocab: &Vocab, config: &ComponentConfig, bytes: &[u8]) -> Result<Self> {
        let store = S::from_bytes(bytes, EXCLUDE, Some(Arc::clone(vocab.strings())))?;
        log::debug!("[{}] loaded {} keys from bytes", Self::NAME, store.len());
        Ok(Self::with_store(vocab, store, config.merge_phrases))
    }

    /// Write the store into a directory, without the string table.
    pub fn to_disk(&self, path: impl AsRef<Path>) -> Result<()> {
        self.store.to_disk(path.as_ref(), EXCLUDE)
    }

    /// Load a component from a directory written by [`SenseComponent::to_disk`].
    pub fn from_disk(
        vocab: &Vocab,
        config: &ComponentConfig,
        path: impl AsRef<Path>,
    ) -> Result<Self> {
        let store = S::from_disk(path.as_ref(), EXCLUDE, Some(Arc::clone(vocab.strings())))?;
        log::info!(
            "[{}] loaded {} keys from {}",
            Self::NAME,
            store.len(),
            path.as_ref().display()
        );
        Ok(Self::with_store(vocab, store, config.merge_phrases))
    }
}

impl SenseVectors {
    /// Empty store sharing `vocab`'s string table.
    #[must_use]
    pub fn empty_for(vocab: &Vocab, shape: (usize, usize)) -> Self {
        <Self as VectorStore>::empty(shape, Some(Arc::clone(vocab.strings())))
    }
}

fn getter(f: impl Fn(&dyn Lexical) -> Result<AttrValue> + Send + Sync + 'static) -> Extension {
    Extension::Getter(Arc::new(move |doc: &Doc, target: &Target| {
        target.with_lexical(doc, &f)
    }))
}

// ============================================================================
// Accessors over the document binding
// ============================================================================

fn bound_store<S: VectorStore>(doc: &Doc) -> Result<Arc<S>> {
    doc.binding::<S>()
        .ok_or_else(|| Error::UnboundDocument(doc.id().to_string()))
}

fn bound_key<S: VectorStore, L: Lexical + ?Sized>(
    obj: &L,
    policy: KeyPolicy,
) -> Result<(Arc<S>, SenseKey)> {
    let store = bound_store::<S>(obj.doc())?;
    let key = key::encode(obj, policy)?;
    Ok((store, key))
}

fn key_of<S: VectorStore, L: Lexical + ?Sized>(obj: &L, policy: KeyPolicy) -> Result<SenseKey> {
    bound_key::<S, L>(obj, policy).map(|(_, key)| key)
}

fn has_entry<S: VectorStore, L: Lexical + ?Sized>(obj: &L, policy: KeyPolicy) -> Result<bool> {
    let (store, key) = bound_key::<S, L>(obj, policy)?;
    Ok(store.contains(&key))
}

fn vector_of<S: VectorStore, L: Lexical + ?Sized>(obj: &L, policy: KeyPolicy) -> Result<Vec<f32>> {
    let (store, key) = bound_key::<S, L>(obj, policy)?;
    Ok(store.get(&key)?.to_vec())
}

fn frequency_of<S: VectorStore, L: Lexical + ?Sized>(obj: &L, policy: KeyPolicy) -> Result<u64> {
    let (store, key) = bound_key::<S, L>(obj, policy)?;
    store.get_freq(&key)
}

fn most_similar<S: VectorStore, L: Lexical + ?Sized>(
    obj: &L,
    n: usize,
    policy: KeyPolicy,
) -> Result<Vec<((String, String), f32)>> {
    if n == 0 {
        return Err(Error::invalid_argument("n must be a positive integer"));
    }
    let (store, key) = bound_key::<S, L>(obj, policy)?;
    let results = store.most_similar(std::slice::from_ref(&key), n)?;
    Ok(results
        .into_iter()
        .take(n)
        .map(|(result, score)| (store.split_key(&result), score))
        .collect())
}

fn other_senses_of<S: VectorStore, L: Lexical + ?Sized>(
    obj: &L,
    policy: KeyPolicy,
) -> Result<Vec<SenseKey>> {
    let (store, key) = bound_key::<S, L>(obj, policy)?;
    Ok(store.get_other_senses(&key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensevec_core::{DocData, PosTag, SpanRecord, TokenRecord};

    fn populated(vocab: &Vocab, merge: bool) -> SenseComponent {
        let mut store = SenseVectors::empty_for(vocab, (8, 2));
        store.add(SenseKey::new("dog", "NOUN"), &[1.0, 0.0], 42).unwrap();
        store.add(SenseKey::new("puppy", "NOUN"), &[0.9, 0.1], 12).unwrap();
        store.add(SenseKey::new("dog", "VERB"), &[0.0, 1.0], 3).unwrap();
        store.add(SenseKey::new("new york", "GPE"), &[0.5, 0.5], 99).unwrap();
        SenseComponent::with_store(vocab, store, merge)
    }

    fn new_york_doc() -> Doc {
        Doc::from_data(DocData {
            tokens: vec![
                TokenRecord::new("New", PosTag::Propn),
                TokenRecord::new("York", PosTag::Propn),
                TokenRecord::new("dog", PosTag::Noun),
            ],
            ents: vec![SpanRecord::labelled(0, 2, "GPE")],
            noun_chunks: vec![],
        })
        .unwrap()
    }

    #[test]
    fn test_construction_registers_nothing() {
        let vocab = Vocab::new();
        let component =
            SenseComponent::<SenseVectors>::new(&vocab, &ComponentConfig::default()).unwrap();
        assert_eq!(component.state(), ComponentState::Uninitialized);
        assert!(vocab.extensions().is_empty());
        assert_eq!(component.store().shape(), (1000, 128));
    }

    #[test]
    fn test_first_process_registers_once() {
        let vocab = Vocab::new();
        let component = populated(&vocab, false);
        for _ in 0..3 {
            component.process(new_york_doc()).unwrap();
        }
        assert_eq!(component.registration_count(), 1);
        assert_eq!(component.state(), ComponentState::Ready);
        assert_eq!(vocab.extensions().len(), 13);
        assert!(vocab.extensions().has_extension(ObjectKind::Doc, ATTR_PHRASES));
    }

    #[test]
    fn test_second_component_on_same_vocab_fails_loudly() {
        let vocab = Vocab::new();
        let first = populated(&vocab, false);
        let second = populated(&vocab, false);
        first.process(new_york_doc()).unwrap();
        let err = second.process(new_york_doc()).unwrap_err();
        assert!(matches!(err, Error::Extension(_)));
        assert_eq!(second.state(), ComponentState::Uninitialized);
        assert_eq!(second.registration_count(), 0);
    }

    #[test]
    fn test_merge_mode_keys_entities_by_label() {
        let vocab = Vocab::new();
        let component = populated(&vocab, true);
        let doc = component.process(new_york_doc()).unwrap();
        assert_eq!(doc.len(), 2);
        let ny = doc.token(0).unwrap();
        assert_eq!(component.key_of(&ny).unwrap().as_str(), "new_york|GPE");
        assert_eq!(component.frequency_of(&ny).unwrap(), 99);
    }

    #[test]
    fn test_without_merge_entities_use_tags() {
        let vocab = Vocab::new();
        let component = populated(&vocab, false);
        let doc = component.process(new_york_doc()).unwrap();
        let span = doc.ents().next().unwrap();
        assert_eq!(component.key_of(&span).unwrap().as_str(), "new_york|PROPN");
        assert!(!component.has_entry(&span).unwrap());
    }

    #[test]
    fn test_unbound_document() {
        let vocab = Vocab::new();
        let component = populated(&vocab, false);
        let doc = new_york_doc();
        let dog = doc.token(2).unwrap();
        assert!(matches!(component.has_entry(&dog), Err(Error::UnboundDocument(_))));
        assert!(matches!(component.other_senses_of(&dog), Err(Error::UnboundDocument(_))));
    }

    #[test]
    fn test_accessors_through_registry() {
        let vocab = Vocab::new();
        let component = populated(&vocab, false);
        let doc = component.process(new_york_doc()).unwrap();
        let ext = vocab.extensions();
        let dog = Target::Token(2);

        assert_eq!(ext.get(&doc, &dog, ATTR_IN_STORE).unwrap().as_bool(), Some(true));
        assert_eq!(ext.get(&doc, &dog, ATTR_FREQ).unwrap().as_int(), Some(42));
        assert_eq!(
            ext.get(&doc, &dog, ATTR_VECTOR).unwrap().as_vector(),
            Some(&[1.0, 0.0][..])
        );
        let others = ext.get(&doc, &dog, ATTR_OTHER_SENSES).unwrap();
        assert_eq!(others.as_keys(), Some(&[SenseKey::new("dog", "VERB")][..]));

        let similar = ext.call(&doc, &dog, ATTR_MOST_SIMILAR, 1).unwrap();
        let similar = similar.as_scored().unwrap();
        assert_eq!(similar.len(), 1);
        assert_eq!(similar[0].0, ("puppy".to_string(), "NOUN".to_string()));

        let phrases = ext.get(&doc, &Target::Doc, ATTR_PHRASES).unwrap();
        assert_eq!(phrases.as_spans(), Some(&[0..2][..]));
    }

    #[test]
    fn test_most_similar_zero() {
        let vocab = Vocab::new();
        let component = populated(&vocab, false);
        let doc = component.process(new_york_doc()).unwrap();
        let dog = doc.token(2).unwrap();
        assert!(matches!(
            component.most_similar(&dog, 0),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_binding_dies_with_component() {
        let vocab = Vocab::new();
        let component = populated(&vocab, false);
        let doc = component.process(new_york_doc()).unwrap();
        assert!(doc.is_bound());
        let other = populated(&Vocab::new(), false);
        drop(component);
        let dog = doc.token(2).unwrap();
        assert!(matches!(other.has_entry(&dog), Err(Error::UnboundDocument(_))));
    }
}
