//! The host-owned shared state components attach to.

use crate::extensions::Extensions;
use sensevec_core::StringStore;
use std::sync::Arc;

/// Shared string table plus the extension registry.
///
/// Cloning is cheap and shares both parts. A vocab outlives any component
/// built on it; components only borrow its parts.
#[derive(Debug, Clone, Default)]
pub struct Vocab {
    strings: Arc<StringStore>,
    extensions: Arc<Extensions>,
}

impl Vocab {
    /// Fresh vocab with an empty string table and no extensions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Vocab around an existing string table.
    #[must_use]
    pub fn with_strings(strings: Arc<StringStore>) -> Self {
        Self {
            strings,
            extensions: Arc::default(),
        }
    }

    /// The shared string table.
    #[must_use]
    pub fn strings(&self) -> &Arc<StringStore> {
        &self.strings
    }

    /// The extension registry.
    #[must_use]
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }
}
