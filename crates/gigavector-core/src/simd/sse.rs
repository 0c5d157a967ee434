//! SSE4.1 kernels, 4 `f32` lanes per iteration.
//!
//! Each function processes `len / 4` full lanes with `_mm_*` intrinsics and
//! folds the `len % 4` remainder with the scalar path, mirroring the
//! teacher's lane-plus-tail structure.

use super::scalar;
use std::arch::x86_64::*;

#[target_feature(enable = "sse4.1")]
unsafe fn sum_squared_diff(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len();
    let lanes = len / 4;
    let mut acc = _mm_setzero_ps();
    for i in 0..lanes {
        let off = i * 4;
        let va = _mm_loadu_ps(a.as_ptr().add(off));
        let vb = _mm_loadu_ps(b.as_ptr().add(off));
        let diff = _mm_sub_ps(va, vb);
        acc = _mm_add_ps(acc, _mm_mul_ps(diff, diff));
    }
    let mut buf = [0f32; 4];
    _mm_storeu_ps(buf.as_mut_ptr(), acc);
    let mut total: f32 = buf.iter().sum();
    total += scalar::squared_euclidean(&a[lanes * 4..], &b[lanes * 4..]);
    total
}

#[target_feature(enable = "sse4.1")]
unsafe fn sum_dot(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len();
    let lanes = len / 4;
    let mut acc = _mm_setzero_ps();
    for i in 0..lanes {
        let off = i * 4;
        let va = _mm_loadu_ps(a.as_ptr().add(off));
        let vb = _mm_loadu_ps(b.as_ptr().add(off));
        acc = _mm_add_ps(acc, _mm_mul_ps(va, vb));
    }
    let mut buf = [0f32; 4];
    _mm_storeu_ps(buf.as_mut_ptr(), acc);
    let mut total: f32 = buf.iter().sum();
    total += scalar::dot_product(&a[lanes * 4..], &b[lanes * 4..]);
    total
}

#[target_feature(enable = "sse4.1")]
unsafe fn sum_squares(a: &[f32]) -> f32 {
    let len = a.len();
    let lanes = len / 4;
    let mut acc = _mm_setzero_ps();
    for i in 0..lanes {
        let off = i * 4;
        let va = _mm_loadu_ps(a.as_ptr().add(off));
        acc = _mm_add_ps(acc, _mm_mul_ps(va, va));
    }
    let mut buf = [0f32; 4];
    _mm_storeu_ps(buf.as_mut_ptr(), acc);
    let mut total: f32 = buf.iter().sum();
    total += a[lanes * 4..].iter().map(|x| x * x).sum::<f32>();
    total
}

pub fn squared_euclidean(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    unsafe { sum_squared_diff(a, b) }
}

pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    unsafe { sum_dot(a, b) }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    let dot = unsafe { sum_dot(a, b) };
    let norm_a = unsafe { sum_squares(a) }.sqrt();
    let norm_b = unsafe { sum_squares(b) }.sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return f32::NAN;
    }
    dot / (norm_a * norm_b)
}
