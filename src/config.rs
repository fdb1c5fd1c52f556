//! Component configuration.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default `(rows, width)` of a freshly allocated store.
pub const DEFAULT_SHAPE: (usize, usize) = (1000, 128);

/// Settings for a [`crate::SenseComponent`].
///
/// Missing fields take their defaults, so `{}` is a valid config file:
///
/// ```rust
/// use sensevec::ComponentConfig;
///
/// let config = ComponentConfig::from_json_str(r#"{"merge_phrases": true}"#).unwrap();
/// assert!(config.merge_phrases);
/// assert_eq!(config.shape, (1000, 128));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentConfig {
    /// `(rows, width)` of the empty store allocated on construction.
    pub shape: (usize, usize),
    /// Merge entity and noun phrases into single tokens, and key entities
    /// by their label.
    pub merge_phrases: bool,
}

impl Default for ComponentConfig {
    fn default() -> Self {
        Self {
            shape: DEFAULT_SHAPE,
            merge_phrases: false,
        }
    }
}

impl ComponentConfig {
    /// Set merge mode.
    #[must_use]
    pub fn with_merge_phrases(mut self, merge_phrases: bool) -> Self {
        self.merge_phrases = merge_phrases;
        self
    }

    /// Set the store shape.
    #[must_use]
    pub fn with_shape(mut self, rows: usize, width: usize) -> Self {
        self.shape = (rows, width);
        self
    }

    /// Check the config is usable.
    pub fn validate(&self) -> Result<()> {
        if self.shape.1 == 0 {
            return Err(Error::invalid_argument("store width must be positive"));
        }
        Ok(())
    }

    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::invalid_argument(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json).map_err(|e| match e {
            Error::InvalidArgument(msg) => {
                Error::invalid_argument(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }
}
