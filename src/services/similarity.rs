//! Sparse cosine similarity over theme/tag weight maps.
//!
//! Profiles and stories live in the same dimension space but are sparse,
//! so similarity works directly on the maps instead of materialising dense
//! vectors. Zero-norm inputs are defined to have similarity 0.0, not NaN.

use std::collections::{HashMap, HashSet};

/// Cosine similarity between two weight maps. Dimensions absent from a map
/// contribute 0.
pub fn cosine_weights(a: &HashMap<String, f64>, b: &HashMap<String, f64>) -> f64 {
    let norm_a = norm(a.values());
    let norm_b = norm(b.values());
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    // Iterate the smaller map; only shared dimensions contribute.
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(dim, w)| large.get(dim).map(|v| w * v))
        .sum();

    dot / (norm_a * norm_b)
}

/// Cosine similarity between a weight map and a 0/1 indicator vector given
/// as its set of carried dimensions.
pub fn cosine_indicator(weights: &HashMap<String, f64>, dimensions: &HashSet<&str>) -> f64 {
    let norm_w = norm(weights.values());
    if norm_w == 0.0 || dimensions.is_empty() {
        return 0.0;
    }

    let dot: f64 = dimensions
        .iter()
        .filter_map(|dim| weights.get(*dim))
        .sum();

    dot / (norm_w * (dimensions.len() as f64).sqrt())
}

fn norm<'a>(values: impl Iterator<Item = &'a f64>) -> f64 {
    values.map(|v| v * v).sum::<f64>().sqrt()
}
