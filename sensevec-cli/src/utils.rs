//! Utility functions for CLI commands

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use sensevec::{ComponentConfig, SenseComponent, Vocab};
use sensevec_core::{Doc, DocData};

/// Read a file, or stdin when `path` is `-`
pub fn read_input(path: &str) -> Result<String, String> {
    if path == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format_error("read stdin", &e.to_string()))?;
        return Ok(buf);
    }
    fs::read_to_string(path).map_err(|e| format_error("read file", &format!("{}: {}", path, e)))
}

/// Parse a pre-annotated document from JSON
pub fn parse_doc(json: &str) -> Result<Doc, String> {
    let data: DocData = serde_json::from_str(json)
        .map_err(|e| format_error("parse document JSON", &e.to_string()))?;
    Doc::from_data(data).map_err(|e| format_error("build document", &e.to_string()))
}

/// Load a component config, or the default one
pub fn load_config(path: Option<&str>) -> Result<ComponentConfig, String> {
    match path {
        Some(path) => ComponentConfig::from_json_file(path)
            .map_err(|e| format_error("load config", &e.to_string())),
        None => Ok(ComponentConfig::default()),
    }
}

/// Load a component from a store directory
pub fn load_component(
    vocab: &Vocab,
    config: &ComponentConfig,
    dir: &str,
) -> Result<SenseComponent, String> {
    if !Path::new(dir).is_dir() {
        return Err(format_error("load store", &format!("{} is not a directory", dir)));
    }
    SenseComponent::from_disk(vocab, config, dir)
        .map_err(|e| format_error("load store", &e.to_string()))
}

/// Format error message consistently
pub fn format_error(operation: &str, details: &str) -> String {
    format!("Failed to {}: {}", operation, details)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_doc() {
        let doc = parse_doc(r#"{"tokens": [{"text": "dog", "pos": "NOUN"}]}"#).unwrap();
        assert_eq!(doc.len(), 1);
        assert!(parse_doc("not json").unwrap_err().starts_with("Failed to parse"));
        let err = parse_doc(r#"{"tokens": [], "ents": [{"start": 0, "end": 2}]}"#).unwrap_err();
        assert!(err.starts_with("Failed to build document"));
    }

    #[test]
    fn test_load_missing_store() {
        let err = load_component(&Vocab::new(), &ComponentConfig::default(), "/nonexistent/store")
            .unwrap_err();
        assert!(err.contains("not a directory"));
    }
}
