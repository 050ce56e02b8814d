//! Row-major dense matrix

use crate::error::TourError;
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Dense row-major matrix of `f64`.
///
/// Serializes as a list of rows (`[[..], [..]]`), which is the layout the
/// JSON session state uses for `projection`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m[(i, i)] = 1.0;
        }
        m
    }

    /// Wrap a row-major buffer. Panics if `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        assert_eq!(
            data.len(),
            rows * cols,
            "buffer length {} does not match {} x {}",
            data.len(),
            rows,
            cols
        );
        Self { rows, cols, data }
    }

    /// Build from nested rows. Fails on ragged input.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, TourError> {
        let n = rows.len();
        let m = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(n * m);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != m {
                return Err(TourError::Shape(format!(
                    "row {} has {} entries, expected {}",
                    i,
                    row.len(),
                    m
                )));
            }
            data.extend(row);
        }
        Ok(Self {
            rows: n,
            cols: m,
            data,
        })
    }

    /// Build a matrix whose columns are the given vectors.
    pub fn from_columns(columns: &[&[f64]]) -> Self {
        let cols = columns.len();
        let rows = columns.first().map_or(0, |c| c.len());
        let mut out = Self::zeros(rows, cols);
        for (j, column) in columns.iter().enumerate() {
            for (i, value) in column.iter().enumerate() {
                out[(i, j)] = *value;
            }
        }
        out
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    #[inline]
    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact(0) panics, and a zero-width matrix has no rows worth visiting
        let width = self.cols.max(1);
        self.data.chunks_exact(width).take(self.rows)
    }

    pub fn column(&self, j: usize) -> Vec<f64> {
        (0..self.rows).map(|i| self[(i, j)]).collect()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.iter_rows().map(<[f64]>::to_vec).collect()
    }

    pub fn fill(&mut self, value: f64) {
        self.data.iter_mut().for_each(|v| *v = value);
    }

    /// Overwrite with `other`. Shapes must match.
    pub fn copy_from(&mut self, other: &Matrix) {
        self.assert_same_shape(other);
        self.data.copy_from_slice(&other.data);
    }

    pub fn transpose(&self) -> Matrix {
        let mut out = Matrix::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                out[(j, i)] = self[(i, j)];
            }
        }
        out
    }

    /// `A · B`
    pub fn mul(&self, other: &Matrix) -> Matrix {
        let mut out = Matrix::zeros(self.rows, other.cols);
        Self::mul_into(&mut out, self, other);
        out
    }

    /// `out = A · B`
    pub fn mul_into(out: &mut Matrix, a: &Matrix, b: &Matrix) {
        assert_eq!(a.cols, b.rows, "inner dimension mismatch");
        assert_eq!((out.rows, out.cols), (a.rows, b.cols), "output shape");
        for i in 0..a.rows {
            for k in 0..b.cols {
                let mut s = 0.0;
                for j in 0..a.cols {
                    s += a[(i, j)] * b[(j, k)];
                }
                out[(i, k)] = s;
            }
        }
    }

    /// `A · Bᵗ`
    pub fn tcrossprod(&self, other: &Matrix) -> Matrix {
        let mut out = Matrix::zeros(self.rows, other.rows);
        Self::tcrossprod_into(&mut out, self, other);
        out
    }

    /// `out = A · Bᵗ`. Used every frame for `xy = proj · Xᵗ`.
    pub fn tcrossprod_into(out: &mut Matrix, a: &Matrix, b: &Matrix) {
        assert_eq!(a.cols, b.cols, "inner dimension mismatch");
        assert_eq!((out.rows, out.cols), (a.rows, b.rows), "output shape");
        for i in 0..a.rows {
            let ai = a.row(i);
            for k in 0..b.rows {
                out[(i, k)] = super::dot(ai, b.row(k));
            }
        }
    }

    pub fn scale(&self, s: f64) -> Matrix {
        let mut out = self.clone();
        out.scale_in_place(s);
        out
    }

    pub fn scale_in_place(&mut self, s: f64) {
        self.data.iter_mut().for_each(|v| *v *= s);
    }

    pub fn add(&self, other: &Matrix) -> Matrix {
        let mut out = self.clone();
        out.add_assign(other);
        out
    }

    pub fn sub(&self, other: &Matrix) -> Matrix {
        let mut out = self.clone();
        out.add_scaled(other, -1.0);
        out
    }

    pub fn add_assign(&mut self, other: &Matrix) {
        self.add_scaled(other, 1.0);
    }

    /// `self += s * other`
    pub fn add_scaled(&mut self, other: &Matrix, s: f64) {
        self.assert_same_shape(other);
        super::axpy(&mut self.data, s, &other.data);
    }

    /// Frobenius inner product `⟨A, B⟩_F = Σ aᵢⱼ bᵢⱼ`
    pub fn frobenius_dot(&self, other: &Matrix) -> f64 {
        self.assert_same_shape(other);
        super::dot(&self.data, &other.data)
    }

    pub fn max_abs_diff(&self, other: &Matrix) -> f64 {
        self.assert_same_shape(other);
        self.data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }

    fn assert_same_shape(&self, other: &Matrix) {
        assert_eq!(
            (self.rows, self.cols),
            (other.rows, other.cols),
            "matrix shape mismatch"
        );
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    #[inline]
    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        &self.data[i * self.cols + j]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    #[inline]
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        &mut self.data[i * self.cols + j]
    }
}

impl TryFrom<Vec<Vec<f64>>> for Matrix {
    type Error = TourError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        Matrix::from_rows(rows)
    }
}

impl From<Matrix> for Vec<Vec<f64>> {
    fn from(m: Matrix) -> Self {
        m.to_rows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn m(rows: Vec<Vec<f64>>) -> Matrix {
        Matrix::from_rows(rows).unwrap()
    }

    #[test]
    fn test_multiply() {
        let a = m(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        let b = m(vec![vec![5.0, 6.0], vec![7.0, 8.0]]);
        assert_eq!(a.mul(&b), m(vec![vec![19.0, 22.0], vec![43.0, 50.0]]));
    }

    #[test]
    fn test_tcrossprod_matches_mul_transpose() {
        let a = m(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        let b = m(vec![
            vec![1.0, 0.0, -1.0],
            vec![2.0, 1.0, 0.0],
            vec![0.5, 0.5, 0.5],
            vec![0.0, 0.0, 1.0],
        ]);
        assert_eq!(a.tcrossprod(&b), a.mul(&b.transpose()));

        let mut out = Matrix::zeros(2, 4);
        Matrix::tcrossprod_into(&mut out, &a, &b);
        assert_eq!(out, a.tcrossprod(&b));
    }

    #[test]
    fn test_in_place_arithmetic() {
        let mut a = m(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        let b = m(vec![vec![1.0, 1.0], vec![1.0, 1.0]]);
        a.add_assign(&b);
        a.scale_in_place(2.0);
        assert_eq!(a, m(vec![vec![4.0, 6.0], vec![8.0, 10.0]]));
        a.add_scaled(&b, -4.0);
        assert_eq!(a, m(vec![vec![0.0, 2.0], vec![4.0, 6.0]]));
        assert_eq!(a.frobenius_dot(&b), 12.0);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let result = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0]]);
        assert!(matches!(result, Err(TourError::Shape(_))));
    }

    #[test]
    fn test_serializes_as_nested_rows() {
        let a = m(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, "[[1.0,0.0],[0.0,1.0]]");
        let back: Matrix = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
    }

    #[test]
    fn test_columns_constructor() {
        let a = Matrix::from_columns(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]]);
        assert_eq!((a.rows(), a.cols()), (3, 2));
        assert_eq!(a.row(1), &[2.0, 5.0]);
        assert_eq!(a.column(1), vec![4.0, 5.0, 6.0]);
    }
}
