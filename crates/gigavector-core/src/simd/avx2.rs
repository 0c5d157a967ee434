//! AVX2 + FMA kernels, 8 `f32` lanes per iteration.
//!
//! Mirrors [`super::sse`]'s lane-plus-tail structure at double the width,
//! using `_mm256_fmadd_ps` to fuse the multiply-add in the inner loop.

use super::scalar;
use std::arch::x86_64::*;

#[target_feature(enable = "avx2,fma")]
unsafe fn sum_squared_diff(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len();
    let lanes = len / 8;
    let mut acc = _mm256_setzero_ps();
    for i in 0..lanes {
        let off = i * 8;
        let va = _mm256_loadu_ps(a.as_ptr().add(off));
        let vb = _mm256_loadu_ps(b.as_ptr().add(off));
        let diff = _mm256_sub_ps(va, vb);
        acc = _mm256_fmadd_ps(diff, diff, acc);
    }
    let mut buf = [0f32; 8];
    _mm256_storeu_ps(buf.as_mut_ptr(), acc);
    let mut total: f32 = buf.iter().sum();
    total += scalar::squared_euclidean(&a[lanes * 8..], &b[lanes * 8..]);
    total
}

#[target_feature(enable = "avx2,fma")]
unsafe fn sum_dot(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len();
    let lanes = len / 8;
    let mut acc = _mm256_setzero_ps();
    for i in 0..lanes {
        let off = i * 8;
        let va = _mm256_loadu_ps(a.as_ptr().add(off));
        let vb = _mm256_loadu_ps(b.as_ptr().add(off));
        acc = _mm256_fmadd_ps(va, vb, acc);
    }
    let mut buf = [0f32; 8];
    _mm256_storeu_ps(buf.as_mut_ptr(), acc);
    let mut total: f32 = buf.iter().sum();
    total += scalar::dot_product(&a[lanes * 8..], &b[lanes * 8..]);
    total
}

#[target_feature(enable = "avx2,fma")]
unsafe fn sum_squares(a: &[f32]) -> f32 {
    let len = a.len();
    let lanes = len / 8;
    let mut acc = _mm256_setzero_ps();
    for i in 0..lanes {
        let off = i * 8;
        let va = _mm256_loadu_ps(a.as_ptr().add(off));
        acc = _mm256_fmadd_ps(va, va, acc);
    }
    let mut buf = [0f32; 8];
    _mm256_storeu_ps(buf.as_mut_ptr(), acc);
    let mut total: f32 = buf.iter().sum();
    total += a[lanes * 8..].iter().map(|x| x * x).sum::<f32>();
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
