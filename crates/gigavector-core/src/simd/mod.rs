//! CPU-feature-dispatched distance kernels.
//!
//! Three tiers are implemented for `x86_64`: scalar, SSE (4 lanes), and
//! AVX2+FMA (8 lanes). The best available tier is detected once, cached in a
//! [`OnceLock`], and reused for every call for the lifetime of the process —
//! there is no per-call feature probing. Non-`x86_64` targets always use the
//! scalar tier.
//!
//! Grounded on the teacher's `simd_dispatch` module: a small set of function
//! pointers selected once via `is_x86_feature_detected!`, rather than
//! re-checking CPU features on every distance computation.

mod avx2;
mod scalar;
mod sse;

use std::sync::OnceLock;

/// A kernel computing a single scalar statistic over two equal-length
/// `f32` slices (squared Euclidean distance, dot product, or the two sums
/// needed for cosine similarity).
type DistanceFn = fn(&[f32], &[f32]) -> f32;

/// Which instruction-set tier was selected for this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Portable scalar loop, used on non-x86_64 targets or bare minimum CPUs.
    Scalar,
    /// SSE4.1, 4 lanes per iteration.
    Sse,
    /// AVX2 + FMA, 8 lanes per iteration.
    Avx2,
}

impl Tier {
    fn name(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Sse => "sse",
            Self::Avx2 => "avx2",
        }
    }
}

/// A snapshot of the CPU features detected at dispatch-selection time.
///
/// Exposed for operational visibility (e.g. a `GET /health` handler) — the
/// detection itself already has to happen to pick a dispatch tier, this just
/// surfaces the result.
#[derive(Debug, Clone, Copy)]
pub struct CpuFeatures {
    tier: Tier,
    sse4_1: bool,
    avx2: bool,
    fma: bool,
}

impl CpuFeatures {
    /// Detects the CPU features of the current process and the tier that
    /// will be used for dispatch.
    #[must_use]
    pub fn detect() -> Self {
        #[cfg(target_arch = "x86_64")]
        {
            let sse4_1 = is_x86_feature_detected!("sse4.1");
            let avx2 = is_x86_feature_detected!("avx2");
            let fma = is_x86_feature_detected!("fma");
            let tier = if avx2 && fma {
                Tier::Avx2
            } else if sse4_1 {
                Tier::Sse
            } else {
                Tier::Scalar
            };
            Self {
                tier,
                sse4_1,
                avx2,
                fma,
            }
        }
        #[cfg(not(target_arch = "x86_64"))]
        {
            Self {
                tier: Tier::Scalar,
                sse4_1: false,
                avx2: false,
                fma: false,
            }
        }
    }

    /// The dispatch tier that was selected.
    #[must_use]
    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Human-readable tier name (`"scalar"`, `"sse"`, `"avx2"`).
    #[must_use]
    pub fn tier_name(&self) -> &'static str {
        self.tier.name()
    }

    /// Whether SSE4.1 was detected, regardless of the selected tier.
    #[must_use]
    pub fn has_sse4_1(&self) -> bool {
        self.sse4_1
    }

    /// Whether AVX2 was detected, regardless of the selected tier.
    #[must_use]
    pub fn has_avx2(&self) -> bool {
        self.avx2
    }

    /// Whether FMA was detected, regardless of the selected tier.
    #[must_use]
    pub fn has_fma(&self) -> bool {
        self.fma
    }
}

struct DispatchTable {
    euclidean: DistanceFn,
    cosine: DistanceFn,
    dot: DistanceFn,
    features: CpuFeatures,
}

static TABLE: OnceLock<DispatchTable> = OnceLock::new();

fn table() -> &'static DispatchTable {
    TABLE.get_or_init(|| {
        let features = CpuFeatures::detect();
        let (euclidean, cosine, dot): (DistanceFn, DistanceFn, DistanceFn) = match features.tier()
        {
            #[cfg(target_arch = "x86_64")]
            Tier::Avx2 => (
                avx2::squared_euclidean,
                avx2::cosine_similarity,
                avx2::dot_product,
            ),
            #[cfg(target_arch = "x86_64")]
            Tier::Sse => (
                sse::squared_euclidean,
                sse::cosine_similarity,
                sse::dot_product,
            ),
            _ => (
                scalar::squared_euclidean,
                scalar::cosine_similarity,
                scalar::dot_product,
            ),
        };
        tracing::info!(tier = features.tier_name(), "simd dispatch tier selected");
        DispatchTable {
            euclidean,
            cosine,
            dot,
            features,
        }
    })
}

/// Returns the CPU features detected when the dispatch table was first
/// built. Safe to call repeatedly; the detection itself only runs once.
#[must_use]
pub fn detected_features() -> CpuFeatures {
    table().features
}

/// Euclidean distance (not squared) between `a` and `b`, using the best
/// available dispatch tier. Callers must ensure `a.len() == b.len()`.
#[must_use]
pub fn euclidean_dispatched(a: &[f32], b: &[f32]) -> f32 {
    (table().euclidean)(a, b).sqrt()
}

/// Cosine similarity between `a` and `b` (not `1 - similarity`), using the
/// best available dispatch tier. Returns `NaN` if either vector has zero
/// norm. Callers must ensure `a.len() == b.len()`.
#[must_use]
pub fn cosine_dispatched(a: &[f32], b: &[f32]) -> f32 {
    (table().cosine)(a, b)
}

/// Dot product of `a` and `b`, using the best available dispatch tier.
/// Callers must ensure `a.len() == b.len()`.
#[must_use]
pub fn dot_product_dispatched(a: &[f32], b: &[f32]) -> f32 {
    (table().dot)(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(dim: usize, phase: f32) -> Vec<f32> {
        (0..dim).map(|i| (i as f32 * phase).sin()).collect()
    }

    #[test]
    fn detect_does_not_panic() {
        let f = CpuFeatures::detect();
        assert!(matches!(f.tier(), Tier::Scalar | Tier::Sse | Tier::Avx2));
    }

    #[test]
    fn dims_not_multiple_of_lane_width_are_handled() {
        for dim in [1usize, 3, 5, 7, 9, 15, 17, 31, 33, 63, 65] {
            let a = sample(dim, 0.037);
            let b = sample(dim, 0.071);
            let scalar_e = scalar::squared_euclidean(&a, &b).sqrt();
            let dispatched_e = euclidean_dispatched(&a, &b);
            assert!(
                (scalar_e - dispatched_e).abs() <= 1e-3 * scalar_e.max(1.0),
                "dim={dim} scalar={scalar_e} dispatched={dispatched_e}"
            );

            let scalar_d = scalar::dot_product(&a, &b);
            let dispatched_d = dot_product_dispatched(&a, &b);
            assert!(
                (scalar_d - dispatched_d).abs() <= 1e-3 * scalar_d.abs().max(1.0),
                "dim={dim} scalar={scalar_d} dispatched={dispatched_d}"
            );

            let scalar_c = scalar::cosine_similarity(&a, &b);
            let dispatched_c = cosine_dispatched(&a, &b);
            assert!(
                (scalar_c - dispatched_c).abs() <= 1e-3,
                "dim={dim} scalar={scalar_c} dispatched={dispatched_c}"
            );
        }
    }

    #[test]
    fn empty_vectors_are_zero() {
        let a: Vec<f32> = vec![];
        let b: Vec<f32> = vec![];
        assert_eq!(euclidean_dispatched(&a, &b), 0.0);
        assert_eq!(dot_product_dispatched(&a, &b), 0.0);
    }
}
