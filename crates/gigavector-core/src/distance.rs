//! Distance metrics for vector similarity calculations.
//!
//! Three metrics are supported: Euclidean, cosine, and dot product. Each is
//! exposed both as a plain scalar reference implementation and as a
//! dispatched implementation that picks the best available CPU feature tier
//! (see [`crate::simd`]). The dispatched path is what [`crate::index`] and
//! [`crate::collection`] use on the hot path.

use crate::error::{Error, Result};
use crate::simd;
use serde::{Deserialize, Serialize};

/// Distance metric used for nearest-neighbor search.
///
/// All three produce a value where **lower sorts first**: Euclidean is a
/// true distance, cosine is `1 - cosine_similarity`, and dot product is
/// negated so that "larger similarity" also means "smaller distance".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceMetric {
    /// Euclidean (L2) distance.
    Euclidean,
    /// `1 - cosine_similarity`.
    Cosine,
    /// Negated dot product, for maximum inner product search.
    Dot,
}

impl DistanceMetric {
    /// Computes the distance between two equal-length vectors using the
    /// best available CPU dispatch tier for this metric.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `a.len() != b.len()`.
    pub fn distance(&self, a: &[f32], b: &[f32]) -> Result<f32> {
        if a.len() != b.len() {
            return Err(Error::DimensionMismatch {
                expected: a.len(),
                actual: b.len(),
            });
        }
        Ok(match self {
            Self::Euclidean => simd::euclidean_dispatched(a, b),
            Self::Cosine => cosine_distance(a, b),
            Self::Dot => -simd::dot_product_dispatched(a, b),
        })
    }

    /// Scalar reference implementation, used by tests to validate SIMD
    /// dispatch agreement and as the fallback on architectures with no
    /// vectorized path.
    #[must_use]
    pub fn distance_scalar(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::Euclidean => euclidean_scalar(a, b),
            Self::Cosine => cosine_distance_scalar(a, b),
            Self::Dot => -dot_product_scalar(a, b),
        }
    }
}

fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let sim = simd::cosine_dispatched(a, b);
    if sim.is_nan() {
        1.0
    } else {
        1.0 - sim
    }
}

fn cosine_distance_scalar(a: &[f32], b: &[f32]) -> f32 {
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    1.0 - dot / (norm_a * norm_b)
}

fn euclidean_scalar(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

fn dot_product_scalar(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn euclidean_basic() {
        let a = [0.0, 0.0, 0.0];
        let b = [3.0, 4.0, 0.0];
        let d = DistanceMetric::Euclidean.distance(&a, &b).unwrap();
        assert!((d - 5.0).abs() < 1e-5);
    }

    #[test]
    fn cosine_identical_vectors_is_zero() {
        let a = [1.0, 2.0, 3.0];
        let d = DistanceMetric::Cosine.distance(&a, &a).unwrap();
        assert!(d.abs() < 1e-5);
    }

    #[test]
    fn cosine_zero_norm_is_max_dissimilarity() {
        let a = [0.0, 0.0, 0.0];
        let b = [1.0, 2.0, 3.0];
        let d = DistanceMetric::Cosine.distance(&a, &b).unwrap();
        assert!((d - 1.0).abs() < 1e-6);
    }

    #[test]
    fn dot_product_orders_larger_similarity_first() {
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 5.0, 6.0];
        let d = DistanceMetric::Dot.distance(&a, &b).unwrap();
        assert!((d - (-32.0)).abs() < 1e-5);
    }

    #[test]
    fn dimension_mismatch_errors() {
        let a = [1.0, 2.0];
        let b = [1.0];
        let err = DistanceMetric::Euclidean.distance(&a, &b).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }

    #[test]
    fn scalar_matches_dispatched_within_tolerance() {
        let dims = [16usize, 32, 64, 128, 256, 512];
        for &d in &dims {
            let a: Vec<f32> = (0..d).map(|i| (i as f32 * 0.037).sin()).collect();
            let b: Vec<f32> = (0..d).map(|i| (i as f32 * 0.071).cos()).collect();
            for metric in [
                DistanceMetric::Euclidean,
                DistanceMetric::Cosine,
                DistanceMetric::Dot,
            ] {
                let scalar = metric.distance_scalar(&a, &b);
                let dispatched = metric.distance(&a, &b).unwrap();
                let tol = 1e-4 * scalar.abs().max(1.0);
                assert!(
                    (scalar - dispatched).abs() <= tol,
                    "metric={metric:?} d={d} scalar={scalar} dispatched={dispatched}"
                );
            }
        }
    }
}
