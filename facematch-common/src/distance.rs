//! Distance metrics between face embeddings.
//!
//! Both functions walk the two slices in lockstep and expect them to have the same length.
//! Lengths are checked once per scan by [`crate::matcher::best_match`], not here.

use serde::{Deserialize, Serialize};

/// Square root of the sum of squared elementwise differences.
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// `1 - cos(a, b)`. Ranges over `[0, 2]` for non-zero vectors.
/// An all-zero vector divides by zero and yields NaN; that is left to the caller.
pub fn cosine_distance(a: &[f64], b: &[f64]) -> f64 {
    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b)
        .fold((0.0_f64, 0.0_f64, 0.0_f64), |(dot, norm_a, norm_b), (x, y)| {
            (dot + x * y, norm_a + x * x, norm_b + y * y)
        });

    1.0 - dot / (f64::sqrt(norm_a) * f64::sqrt(norm_b))
}

/// The distance function a scan is run with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Euclidean,
    Cosine,
}

impl Metric {
    pub fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        match self {
            Metric::Euclidean => euclidean_distance(a, b),
            Metric::Cosine => cosine_distance(a, b),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Euclidean => "euclidean",
            Metric::Cosine => "cosine",
        }
    }
}
