//! Small dense linear algebra
//!
//! Everything the tour needs is tiny: 2 x m projections, m x k stacks of
//! axis vectors, n x m data. Plain row-major storage and hand-written
//! loops are enough, and keep the crate free of native dependencies so it
//! builds unchanged for WASM.
//!
//! - Vector helpers operate on slices.
//! - [`Matrix`] owns a row-major buffer; `*_into` / `*_in_place` variants
//!   write into existing storage so the per-frame path does not allocate.
//! - [`svd`] is a one-sided Jacobi decomposition for tall-thin matrices.

mod matrix;
mod svd;

pub use matrix::Matrix;
pub use svd::{svd, Svd};

/// Dot product. Panics if lengths differ.
#[inline]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(
        a.len(),
        b.len(),
        "vector dimension mismatch: {} vs {}",
        a.len(),
        b.len()
    );
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[inline]
pub fn norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}

pub fn add(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| x + y).collect()
}

pub fn sub(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}

pub fn scale(a: &[f64], s: f64) -> Vec<f64> {
    a.iter().map(|x| x * s).collect()
}

/// `y += alpha * x`
#[inline]
pub fn axpy(y: &mut [f64], alpha: f64, x: &[f64]) {
    for (yi, xi) in y.iter_mut().zip(x) {
        *yi += alpha * xi;
    }
}

/// Scale to unit length. Vectors shorter than `floor` are divided by
/// `floor` instead, so a zero vector stays zero rather than becoming NaN.
pub fn normalize(a: &[f64], floor: f64) -> Vec<f64> {
    let len = norm(a).max(floor);
    scale(a, 1.0 / len)
}
