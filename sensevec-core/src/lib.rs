//! # sensevec-core
//!
//! Document model shared by the sensevec crates.
//!
//! This crate provides:
//! - **Documents**: `Doc`, built from pre-annotated `TokenRecord`s, with
//!   entity spans, noun chunks and a non-owning binding slot
//! - **Views**: `Token` and `Span`, both implementing the `Lexical` capability
//! - **Tags**: `PosTag`, the universal coarse part-of-speech inventory
//! - **Strings**: `StringStore`, the interner owned by the host pipeline
//!
//! Tokenization, tagging, parsing and entity recognition are expected to
//! have happened upstream; nothing here runs a model.

#![warn(missing_docs)]

pub mod doc;
pub mod error;
pub mod pos;
pub mod strings;

pub use doc::{Doc, DocData, DocId, Lexical, Span, SpanRecord, Token, TokenRecord};
pub use error::{Error, Result};
pub use pos::PosTag;
pub use strings::{StringId, StringStore};
