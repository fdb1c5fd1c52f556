//! In-memory vector store.

use super::{is_excluded, Part, VectorStore};
use crate::error::{Error, Result};
use crate::key::SenseKey;
use crate::similarity::{cosine_similarity, mean_vector};
use sensevec_core::StringStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

const FORMAT_VERSION: u32 = 1;

const CFG_FILE: &str = "cfg";
const VECTORS_FILE: &str = "vectors";
const FREQS_FILE: &str = "freqs.json";
const STRINGS_FILE: &str = "strings.json";

/// Store metadata written next to the vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Format version.
    pub version: u32,
    /// `(rows, width)`.
    pub shape: (usize, usize),
    /// Every sense seen, in first-seen order.
    pub senses: Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct Table {
    keys: Vec<SenseKey>,
    data: Vec<f32>,
}

#[derive(Serialize, Deserialize)]
struct Payload {
    cfg: StoreConfig,
    table: Table,
    freqs: Vec<u64>,
    strings: Option<Vec<String>>,
}

/// In-memory sense vector table.
///
/// Rows are kept in insertion order; ties in `most_similar` resolve to the
/// earlier row.
///
/// # Example
///
/// ```rust
/// use sensevec::key::SenseKey;
/// use sensevec::store::{SenseVectors, VectorStore};
///
/// let mut store = SenseVectors::empty((10, 2), None);
/// store.add(SenseKey::new("dog", "NOUN"), &[1.0, 0.0], 42).unwrap();
/// store.add(SenseKey::new("cat", "NOUN"), &[0.9, 0.1], 30).unwrap();
///
/// let dog = SenseKey::new("dog", "NOUN");
/// assert_eq!(store.get_freq(&dog).unwrap(), 42);
/// let similar = store.most_similar(&[dog], 1).unwrap();
/// assert_eq!(similar[0].0.as_str(), "cat|NOUN");
/// ```
#[derive(Debug, Clone)]
pub struct SenseVectors {
    shape: (usize, usize),
    keys: Vec<SenseKey>,
    rows: HashMap<SenseKey, usize>,
    data: Vec<f32>,
    freqs: Vec<u64>,
    senses: Vec<String>,
    strings: Option<Arc<StringStore>>,
}

impl SenseVectors {
    /// Insert or overwrite a row.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if the vector width does not match the store.
    pub fn add(&mut self, key: SenseKey, vector: &[f32], freq: u64) -> Result<()> {
        let width = self.shape.1;
        if vector.len() != width {
            return Err(Error::invalid_argument(format!(
                "vector for {} has width {}, store width is {}",
                key,
                vector.len(),
                width
            )));
        }
        if let Some(strings) = &self.strings {
            strings.add(key.as_str());
        }
        let sense = key.sense().to_string();
        if !self.senses.contains(&sense) {
            self.senses.push(sense);
        }

        match self.rows.get(&key) {
            Some(&row) => {
                self.data[row * width..(row + 1) * width].copy_from_slice(vector);
                self.freqs[row] = freq;
            }
            None => {
                let row = self.keys.len();
                self.rows.insert(key.clone(), row);
                self.keys.push(key);
                self.data.extend_from_slice(vector);
                self.freqs.push(freq);
                if self.keys.len() > self.shape.0 {
                    self.shape.0 = self.keys.len();
                }
            }
        }
        Ok(())
    }

    /// Senses in first-seen order.
    #[must_use]
    pub fn senses(&self) -> &[String] {
        &self.senses
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &SenseKey> + '_ {
        self.keys.iter()
    }

    /// Metadata for this store.
    #[must_use]
    pub fn config(&self) -> StoreConfig {
        StoreConfig {
            version: FORMAT_VERSION,
            shape: self.shape,
            senses: self.senses.clone(),
        }
    }

    /// Cosine similarity between the means of two key sets.
    pub fn similarity(&self, a: &[SenseKey], b: &[SenseKey]) -> Result<f32> {
        let a = self.mean_of(a)?;
        let b = self.mean_of(b)?;
        Ok(cosine_similarity(&a, &b))
    }

    /// Most frequent key for `word` among `senses` (all senses when empty).
    #[must_use]
    pub fn best_sense(&self, word: &str, senses: &[&str]) -> Option<SenseKey> {
        let candidates: Vec<&str> = if senses.is_empty() {
            self.senses.iter().map(String::as_str).collect()
        } else {
            senses.to_vec()
        };
        candidates
            .into_iter()
            .map(|sense| SenseKey::new(word, sense))
            .filter_map(|key| self.rows.get(&key).map(|&row| (key, self.freqs[row])))
            .max_by_key(|(_, freq)| *freq)
            .map(|(key, _)| key)
    }

    fn row(&self, key: &SenseKey) -> Result<usize> {
        self.rows
            .get(key)
            .copied()
            .ok_or_else(|| Error::key_not_found(key.as_str()))
    }

    fn vector(&self, row: usize) -> &[f32] {
        let width = self.shape.1;
        &self.data[row * width..(row + 1) * width]
    }

    fn mean_of(&self, keys: &[SenseKey]) -> Result<Vec<f32>> {
        if keys.is_empty() {
            return Err(Error::invalid_argument("at least one key is required"));
        }
        let vectors = keys
            .iter()
            .map(|k| self.row(k).map(|row| self.vector(row)))
            .collect::<Result<Vec<_>>>()?;
        mean_vector(&vectors).ok_or_else(|| Error::invalid_argument("vector widths differ"))
    }

    fn payload(&self, exclude: &[Part]) -> Payload {
        Payload {
            cfg: self.config(),
            table: Table {
                keys: self.keys.clone(),
                data: self.data.clone(),
            },
            freqs: self.freqs.clone(),
            strings: if is_excluded(exclude, Part::Strings) {
                None
            } else {
                self.strings.as_ref().map(|s| s.to_vec())
            },
        }
    }

    fn from_payload(
        payload: Payload,
        exclude: &[Part],
        strings: Option<Arc<StringStore>>,
    ) -> Result<Self> {
        let Payload {
            cfg,
            table,
            freqs,
            strings: saved_strings,
        } = payload;

        if cfg.version != FORMAT_VERSION {
            return Err(Error::store_load(format!(
                "unsupported store format version {} (expected {})",
                cfg.version, FORMAT_VERSION
            )));
        }
        let (_, width) = cfg.shape;
        let n = table.keys.len();
        let expected = n.checked_mul(width).ok_or_else(|| {
            Error::store_load(format!("{} keys x width {} overflows", n, width))
        })?;
        if table.data.len() != expected {
            return Err(Error::store_load(format!(
                "vector data has {} values, expected {} keys x width {}",
                table.data.len(),
                n,
                width
            )));
        }
        if freqs.len() != n {
            return Err(Error::store_load(format!(
                "{} frequencies for {} keys",
                freqs.len(),
                n
            )));
        }

        let mut rows = HashMap::with_capacity(n);
        for (row, key) in table.keys.iter().enumerate() {
            if rows.insert(key.clone(), row).is_some() {
                return Err(Error::store_load(format!("duplicate key {}", key)));
            }
        }

        let strings = match (is_excluded(exclude, Part::Strings), saved_strings) {
            (false, Some(saved)) => {
                let target = strings.unwrap_or_default();
                for s in &saved {
                    target.add(s);
                }
                Some(target)
            }
            _ => strings,
        };
        if let Some(strings) = &strings {
            for key in &table.keys {
                strings.add(key.as_str());
            }
        }

        Ok(Self {
            shape: (cfg.shape.0.max(n), width),
            keys: table.keys,
            rows,
            data: table.data,
            freqs,
            senses: cfg.senses,
            strings,
        })
    }
}

/// Read a file inside a store directory, reporting missing files as load errors.
fn read_part(dir: &Path, name: &str) -> Result<Vec<u8>> {
    let path = dir.join(name);
    fs::read(&path).map_err(|e| Error::store_load(format!("{}: {}", path.display(), e)))
}

impl VectorStore for SenseVectors {
    fn empty(shape: (usize, usize), strings: Option<Arc<StringStore>>) -> Self {
        Self {
            shape,
            keys: Vec::new(),
            rows: HashMap::new(),
            data: Vec::new(),
            freqs: Vec::new(),
            senses: Vec::new(),
            strings,
        }
    }

    fn shape(&self) -> (usize, usize) {
        self.shape
    }

    fn strings(&self) -> Option<&Arc<StringStore>> {
        self.strings.as_ref()
    }

    fn len(&self) -> usize {
        self.keys.len()
    }

    fn contains(&self, key: &SenseKey) -> bool {
        self.rows.contains_key(key)
    }

    fn get(&self, key: &SenseKey) -> Result<&[f32]> {
        self.row(key).map(|row| self.vector(row))
    }

    fn get_freq(&self, key: &SenseKey) -> Result<u64> {
        self.row(key).map(|row| self.freqs[row])
    }

    fn most_similar(&self, keys: &[SenseKey], n: usize) -> Result<Vec<(SenseKey, f32)>> {
        if n == 0 {
            return Err(Error::invalid_argument("n must be a positive integer"));
        }
        let query = self.mean_of(keys)?;
        let mut scored: Vec<(usize, f32)> = (0..self.keys.len())
            .filter(|&row| !keys.contains(&self.keys[row]))
            .map(|row| (row, cosine_similarity(&query, self.vector(row))))
            .collect();
        // Stable sort keeps insertion order among equal scores.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(n);
        Ok(scored
            .into_iter()
            .map(|(row, score)| (self.keys[row].clone(), score))
            .collect())
    }

    fn get_other_senses(&self, key: &SenseKey) -> Vec<SenseKey> {
        let (word, orig_sense) = key.split();
        let mut variants: Vec<String> = Vec::with_capacity(4);
        for variant in [
            word.to_string(),
            word.to_lowercase(),
            word.to_uppercase(),
            title_case(word),
        ] {
            if !variants.contains(&variant) {
                variants.push(variant);
            }
        }

        let mut result = Vec::new();
        for text in &variants {
            for sense in &self.senses {
                if sense == orig_sense {
                    continue;
                }
                if let Ok(candidate) = SenseKey::parse(format!("{}|{}", text, sense)) {
                    if self.contains(&candidate) && !result.contains(&candidate) {
                        result.push(candidate);
                    }
                }
            }
        }
        result
    }

    fn to_bytes(&self, exclude: &[Part]) -> Result<Vec<u8>> {
        Ok(bincode::serialize(&self.payload(exclude))?)
    }

    fn from_bytes(
        bytes: &[u8],
        exclude: &[Part],
        strings: Option<Arc<StringStore>>,
    ) -> Result<Self> {
        let payload: Payload = bincode::deserialize(bytes)?;
        Self::from_payload(payload, exclude, strings)
    }

    fn to_disk(&self, path: &Path, exclude: &[Part]) -> Result<()> {
        fs::create_dir_all(path)?;
        let Payload {
            cfg,
            table,
            freqs,
            strings,
        } = self.payload(exclude);

        fs::write(path.join(CFG_FILE), serde_json::to_vec_pretty(&cfg)?)?;
        fs::write(path.join(VECTORS_FILE), bincode::serialize(&table)?)?;
        let freq_pairs: Vec<(&str, u64)> = table
            .keys
            .iter()
            .map(SenseKey::as_str)
            .zip(freqs.iter().copied())
            .collect();
        fs::write(path.join(FREQS_FILE), serde_json::to_vec(&freq_pairs)?)?;
        if let Some(strings) = strings {
            fs::write(path.join(STRINGS_FILE), serde_json::to_vec(&strings)?)?;
        }
        log::debug!("[store] wrote {} keys to {}", table.keys.len(), path.display());
        Ok(())
    }

    fn from_disk(path: &Path, exclude: &[Part], strings: Option<Arc<StringStore>>) -> Result<Self> {
        let cfg: StoreConfig = serde_json::from_slice(&read_part(path, CFG_FILE)?)?;
        let table: Table = bincode::deserialize(&read_part(path, VECTORS_FILE)?)?;
        let freq_pairs: Vec<(String, u64)> = serde_json::from_slice(&read_part(path, FREQS_FILE)?)?;

        let by_key: HashMap<String, u64> = freq_pairs.into_iter().collect();
        let freqs = table
            .keys
            .iter()
            .map(|k| {
                by_key
                    .get(k.as_str())
                    .copied()
                    .ok_or_else(|| Error::store_load(format!("no frequency for {}", k)))
            })
            .collect::<Result<Vec<_>>>()?;

        let saved_strings = if is_excluded(exclude, Part::Strings) {
            None
        } else {
            let strings_path = path.join(STRINGS_FILE);
            if strings_path.exists() {
                Some(serde_json::from_slice(&read_part(path, STRINGS_FILE)?)?)
            } else {
                None
            }
        };

        let store = Self::from_payload(
            Payload {
                cfg,
                table,
                freqs,
                strings: saved_strings,
            },
            exclude,
            strings,
        )?;
        log::debug!("[store] loaded {} keys from {}", store.len(), path.display());
        Ok(store)
    }
}

/// Upper-case the first letter of every alphabetic run, lower-case the rest.
fn title_case(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut at_start = true;
    for c in word.chars() {
        if c.is_alphabetic() {
            if at_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_start = false;
        } else {
            out.push(c);
            at_start = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(word: &str, sense: &str) -> SenseKey {
        SenseKey::new(word, sense)
    }

    fn store() -> SenseVectors {
        let mut s = SenseVectors::empty((4, 3), None);
        s.add(key("duck", "NOUN"), &[1.0, 0.0, 0.0], 100).unwrap();
        s.add(key("duck", "VERB"), &[0.0, 1.0, 0.0], 20).unwrap();
        s.add(key("goose", "NOUN"), &[0.9, 0.1, 0.0], 40).unwrap();
        s.add(key("swan", "NOUN"), &[0.8, 0.0, 0.2], 10).unwrap();
        s
    }

    #[test]
    fn test_add_rejects_wrong_width() {
        let mut s = store();
        let err = s.add(key("x", "NOUN"), &[1.0], 1).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_add_overwrites_existing_row() {
        let mut s = store();
        s.add(key("duck", "NOUN"), &[0.0, 0.0, 1.0], 7).unwrap();
        assert_eq!(s.len(), 4);
        assert_eq!(s.get(&key("duck", "NOUN")).unwrap(), &[0.0, 0.0, 1.0]);
        assert_eq!(s.get_freq(&key("duck", "NOUN")).unwrap(), 7);
    }

    #[test]
    fn test_shape_grows_past_capacity() {
        let mut s = store();
        s.add(key("heron", "NOUN"), &[0.1, 0.1, 0.1], 1).unwrap();
        assert_eq!(s.shape(), (5, 3));
    }

    #[test]
    fn test_missing_key_is_error() {
        let s = store();
        assert!(matches!(s.get(&key("cat", "NOUN")), Err(Error::KeyNotFound(_))));
        assert!(matches!(s.get_freq(&key("cat", "NOUN")), Err(Error::KeyNotFound(_))));
        assert!(!s.contains(&key("cat", "NOUN")));
    }

    #[test]
    fn test_most_similar_order_and_bound() {
        let s = store();
        let result = s.most_similar(&[key("duck", "NOUN")], 2).unwrap();
        let keys: Vec<&str> = result.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["goose|NOUN", "swan|NOUN"]);
        assert!(result[0].1 >= result[1].1);
    }

    #[test]
    fn test_most_similar_rejects_zero() {
        let s = store();
        assert!(matches!(
            s.most_similar(&[key("duck", "NOUN")], 0),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_most_similar_ties_keep_insertion_order() {
        let mut s = SenseVectors::empty((8, 2), None);
        s.add(key("q", "NOUN"), &[1.0, 0.0], 1).unwrap();
        for w in ["a", "b", "c", "d"] {
            s.add(key(w, "NOUN"), &[1.0, 0.0], 1).unwrap();
        }
        let result = s.most_similar(&[key("q", "NOUN")], 3).unwrap();
        let keys: Vec<&str> = result.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a|NOUN", "b|NOUN", "c|NOUN"]);
    }

    #[test]
    fn test_other_senses() {
        let s = store();
        let others = s.get_other_senses(&key("duck", "NOUN"));
        assert_eq!(others, vec![key("duck", "VERB")]);
        assert!(s.get_other_senses(&key("goose", "NOUN")).is_empty());
    }

    #[test]
    fn test_best_sense_and_similarity() {
        let s = store();
        assert_eq!(s.best_sense("duck", &[]), Some(key("duck", "NOUN")));
        assert_eq!(s.best_sense("duck", &["VERB"]), Some(key("duck", "VERB")));
        assert_eq!(s.best_sense("owl", &[]), None);

        let sim = s
            .similarity(&[key("duck", "NOUN")], &[key("duck", "VERB")])
            .unwrap();
        assert!(sim.abs() < 1e-6);
    }

    #[test]
    fn test_bytes_roundtrip_excluding_strings() {
        let strings = Arc::new(StringStore::new());
        let mut s = SenseVectors::empty((4, 3), Some(Arc::clone(&strings)));
        s.add(key("duck", "NOUN"), &[1.0, 0.0, 0.0], 100).unwrap();
        let bytes = s.to_bytes(&[Part::Strings]).unwrap();

        let fresh = Arc::new(StringStore::new());
        let loaded =
            SenseVectors::from_bytes(&bytes, &[Part::Strings], Some(Arc::clone(&fresh))).unwrap();
        assert_eq!(loaded.get_freq(&key("duck", "NOUN")).unwrap(), 100);
        assert!(Arc::ptr_eq(loaded.strings().unwrap(), &fresh));
        assert!(fresh.contains("duck|NOUN"));
    }

    #[test]
    fn test_corrupt_bytes_fail_to_load() {
        let result = SenseVectors::from_bytes(&[1, 2, 3], &[Part::Strings], None);
        assert!(matches!(result, Err(Error::StoreLoad(_))));
    }

    #[test]
    fn test_disk_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let s = store();
        s.to_disk(dir.path(), &[Part::Strings]).unwrap();
        assert!(!dir.path().join(STRINGS_FILE).exists());

        let loaded = SenseVectors::from_disk(dir.path(), &[Part::Strings], None).unwrap();
        assert_eq!(loaded.len(), 4);
        assert_eq!(loaded.senses(), s.senses());
        assert_eq!(
            loaded.get(&key("swan", "NOUN")).unwrap(),
            s.get(&key("swan", "NOUN")).unwrap()
        );
    }

    fn payload(width: usize, keys: &[&str], data: Vec<f32>, freqs: Vec<u64>) -> Payload {
        Payload {
            cfg: StoreConfig {
                version: FORMAT_VERSION,
                shape: (keys.len(), width),
                senses: vec!["NOUN".to_string()],
            },
            table: Table {
                keys: keys.iter().map(|w| key(w, "NOUN")).collect(),
                data,
            },
            freqs,
            strings: None,
        }
    }

    fn load(payload: &Payload) -> Result<SenseVectors> {
        let bytes = bincode::serialize(payload).unwrap();
        SenseVectors::from_bytes(&bytes, &[Part::Strings], None)
    }

    #[test]
    fn test_well_formed_payload_loads() {
        let loaded = load(&payload(2, &["a", "b"], vec![1.0, 0.0, 0.0, 1.0], vec![3, 4])).unwrap();
        assert_eq!(loaded.get_freq(&key("b", "NOUN")).unwrap(), 4);
        assert_eq!(loaded.get(&key("b", "NOUN")).unwrap(), &[0.0, 1.0]);
    }

    #[test]
    fn test_overflowing_width_is_load_error() {
        let result = load(&payload(usize::MAX / 2 + 1, &["a", "b"], vec![], vec![1, 1]));
        assert!(matches!(result, Err(Error::StoreLoad(_))));
    }

    #[test]
    fn test_data_length_mismatch_is_load_error() {
        let result = load(&payload(2, &["a", "b"], vec![1.0, 0.0, 0.0], vec![1, 1]));
        assert!(matches!(result, Err(Error::StoreLoad(_))));
    }

    #[test]
    fn test_unknown_version_is_load_error() {
        let mut bad = payload(2, &["a"], vec![1.0, 0.0], vec![1]);
        bad.cfg.version = FORMAT_VERSION + 1;
        assert!(matches!(load(&bad), Err(Error::StoreLoad(_))));
    }

    #[test]
    fn test_frequency_count_mismatch_is_load_error() {
        let result = load(&payload(2, &["a", "b"], vec![0.0; 4], vec![1]));
        assert!(matches!(result, Err(Error::StoreLoad(_))));
    }

    #[test]
    fn test_duplicate_key_is_load_error() {
        let result = load(&payload(2, &["a", "a"], vec![0.0; 4], vec![1, 2]));
        assert!(matches!(result, Err(Error::StoreLoad(_))));
    }

    #[test]
    fn test_missing_frequency_on_disk_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        store().to_disk(dir.path(), &[Part::Strings]).unwrap();
        fs::write(dir.path().join(FREQS_FILE), r#"[["duck|NOUN", 100]]"#).unwrap();

        let result = SenseVectors::from_disk(dir.path(), &[Part::Strings], None);
        assert!(matches!(result, Err(Error::StoreLoad(_))));
    }

    #[test]
    fn test_overflowing_width_on_disk_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        store().to_disk(dir.path(), &[Part::Strings]).unwrap();
        let cfg = StoreConfig {
            version: FORMAT_VERSION,
            shape: (4, usize::MAX / 2 + 1),
            senses: vec!["NOUN".to_string()],
        };
        fs::write(dir.path().join(CFG_FILE), serde_json::to_vec(&cfg).unwrap()).unwrap();

        let result = SenseVectors::from_disk(dir.path(), &[Part::Strings], None);
        assert!(matches!(result, Err(Error::StoreLoad(_))));
    }

    #[test]
    fn test_missing_directory_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = SenseVectors::from_disk(&dir.path().join("nope"), &[Part::Strings], None);
        assert!(matches!(result, Err(Error::StoreLoad(_))));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("new_york"), "New_York");
        assert_eq!(title_case("NASA"), "Nasa");
    }
}
