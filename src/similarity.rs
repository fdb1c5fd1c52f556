//! Vector similarity utilities for nearest-neighbour queries.
//!
//! Provides the similarity computation used by the in-memory store's
//! `most_similar` and `similarity` queries.

/// Cosine similarity of two vectors.
///
/// Returns a value in [-1.0, 1.0]. A zero vector has similarity 0.0 with
/// everything (including itself), and vectors of different lengths compare
/// as 0.0.
///
/// # Examples
///
/// ```
/// use sensevec::similarity::cosine_similarity;
///
/// assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
/// assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
/// assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
/// ```
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

/// Element-wise mean of a set of equal-length vectors.
///
/// Returns `None` for an empty set or mismatched lengths.
///
/// # Examples
///
/// ```
/// use sensevec::similarity::mean_vector;
///
/// let mean = mean_vector(&[&[1.0, 3.0][..], &[3.0, 5.0][..]]).unwrap();
/// assert_eq!(mean, vec![2.0, 4.0]);
/// ```
#[must_use]
pub fn mean_vector(vectors: &[&[f32]]) -> Option<Vec<f32>> {
    let first = vectors.first()?;
    let dim = first.len();
    if vectors.iter().any(|v| v.len() != dim) {
        return None;
    }
    let mut mean = vec![0.0f32; dim];
    for v in vectors {
        for (m, x) in mean.iter_mut().zip(v.iter()) {
            *m += x;
        }
    }
    let n = vectors.len() as f32;
    mean.iter_mut().for_each(|m| *m /= n);
    Some(mean)
}
