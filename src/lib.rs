//! # sensevec
//!
//! Sense-keyed word vectors for annotated documents.
//!
//! A sense vector store keys every row by a word *and* its sense:
//! `duck|NOUN` and `duck|VERB` are different rows, as are `apple|ORG` and
//! `apple|NOUN`. This crate binds such a store to documents produced by a
//! tagging pipeline so that tokens and spans can answer questions about
//! themselves:
//!
//! - Is my key in the store? What is my vector, my frequency?
//! - Which keys are most similar to me?
//! - Which other senses of my text does the store know?
//!
//! ## Quick start
//!
//! ```rust
//! use sensevec::{ComponentConfig, SenseComponent, SenseKey, SenseVectors, Vocab};
//! use sensevec_core::{Doc, DocData, PosTag, SpanRecord, TokenRecord};
//!
//! let vocab = Vocab::new();
//! let mut store = SenseVectors::empty_for(&vocab, (100, 3));
//! store.add(SenseKey::new("new york", "GPE"), &[0.2, 0.4, 0.1], 310).unwrap();
//! store.add(SenseKey::new("los angeles", "GPE"), &[0.2, 0.5, 0.1], 120).unwrap();
//!
//! // Merge mode: entities become single tokens keyed by their label.
//! let component = SenseComponent::with_store(&vocab, store, true);
//! let doc = Doc::from_data(DocData {
//!     tokens: vec![
//!         TokenRecord::new("New", PosTag::Propn),
//!         TokenRecord::new("York", PosTag::Propn),
//!     ],
//!     ents: vec![SpanRecord::labelled(0, 2, "GPE")],
//!     noun_chunks: vec![],
//! })
//! .unwrap();
//!
//! let doc = component.process(doc).unwrap();
//! let ny = doc.token(0).unwrap();
//! assert_eq!(component.key_of(&ny).unwrap().as_str(), "new_york|GPE");
//! let similar = component.most_similar(&ny, 1).unwrap();
//! assert_eq!(similar[0].0 .0, "los_angeles");
//! ```
//!
//! ## Modules
//!
//! - [`key`]: the `text|SENSE` key codec
//! - [`store`]: the [`VectorStore`] interface and [`SenseVectors`]
//! - [`component`]: the pipeline component and its accessors
//! - [`extensions`]: the named attribute registry components publish to
//! - [`phrases`]: entity and noun phrase detection and merging

#![warn(missing_docs)]

pub mod component;
pub mod config;
pub mod error;
pub mod extensions;
pub mod key;
pub mod phrases;
pub mod similarity;
pub mod store;
pub mod sync;
pub mod vocab;

pub use component::{ComponentState, SenseComponent};
pub use config::ComponentConfig;
pub use error::{Error, Result};
pub use extensions::{AttrValue, Extension, Extensions, ObjectKind, Target};
pub use key::{KeyPolicy, SenseKey};
pub use store::{Part, SenseVectors, StoreConfig, VectorStore};
pub use vocab::Vocab;

pub use sensevec_core::{
    Doc, DocData, Lexical, PosTag, Span, SpanRecord, StringStore, Token, TokenRecord,
};
