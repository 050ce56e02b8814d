//! One-sided Jacobi SVD for small matrices
//!
//! Columns of a working copy of `A` are rotated pairwise until mutually
//! orthogonal. The rotated columns are then `U·Σ` and the accumulated
//! rotations are `V`. For the tall-thin shapes used here (m x 2 for the
//! retraction, m x k for axis nuking) this converges in a handful of sweeps
//! and is accurate to working precision.

use super::Matrix;

const MAX_SWEEPS: usize = 60;

/// Relative off-diagonal size below which a column pair counts as orthogonal
const ORTHOGONALITY_TOL: f64 = 1e-15;

/// Singular values at or below this fraction of the largest are treated as
/// zero when building `u`
const RANK_TOL: f64 = 1e-13;

/// `A = u · diag(q) · vᵗ`
#[derive(Debug, Clone)]
pub struct Svd {
    /// rows x k, orthonormal columns
    pub u: Matrix,
    /// k singular values, descending
    pub q: Vec<f64>,
    /// cols x k, orthonormal columns
    pub v: Matrix,
}

/// Thin SVD with `k = min(rows, cols)`.
///
/// Columns of `u` belonging to zero singular values are filled in with an
/// orthonormal completion, so `u` always has orthonormal columns.
pub fn svd(a: &Matrix) -> Svd {
    if a.rows() < a.cols() {
        let Svd { u, q, v } = svd(&a.transpose());
        return Svd { u: v, q, v: u };
    }

    let rows = a.rows();
    let cols = a.cols();
    let mut w = a.clone();
    let mut v = Matrix::identity(cols);

    for _ in 0..MAX_SWEEPS {
        let mut rotated = false;
        for p in 0..cols {
            for q in (p + 1)..cols {
                let mut alpha = 0.0;
                let mut beta = 0.0;
                let mut gamma = 0.0;
                for i in 0..rows {
                    let wp = w[(i, p)];
                    let wq = w[(i, q)];
                    alpha += wp * wp;
                    beta += wq * wq;
                    gamma += wp * wq;
                }
                if gamma == 0.0 || gamma.abs() <= ORTHOGONALITY_TOL * (alpha * beta).sqrt() {
                    continue;
                }
                rotated = true;

                let zeta = (beta - alpha) / (2.0 * gamma);
                let t = zeta.signum() / (zeta.abs() + (1.0 + zeta * zeta).sqrt());
                let c = 1.0 / (1.0 + t * t).sqrt();
                let s = c * t;
                rotate_columns(&mut w, p, q, c, s);
                rotate_columns(&mut v, p, q, c, s);
            }
        }
        if !rotated {
            break;
        }
    }

    let mut sigma: Vec<f64> = (0..cols).map(|j| column_norm(&w, j)).collect();

    // Sort descending, permuting columns of w and v alongside.
    let mut order: Vec<usize> = (0..cols).collect();
    order.sort_by(|&i, &j| sigma[j].total_cmp(&sigma[i]));
    let w = permute_columns(&w, &order);
    let v = permute_columns(&v, &order);
    sigma = order.iter().map(|&j| sigma[j]).collect();

    let max_sigma = sigma.first().copied().unwrap_or(0.0);
    let mut u = Matrix::zeros(rows, cols);
    for j in 0..cols {
        if sigma[j] > max_sigma * RANK_TOL && sigma[j] > 0.0 {
            for i in 0..rows {
                u[(i, j)] = w[(i, j)] / sigma[j];
            }
        } else {
            let completion = orthogonal_completion(&u, j);
            for i in 0..rows {
                u[(i, j)] = completion[i];
            }
        }
    }

    Svd { u, q: sigma, v }
}

fn rotate_columns(m: &mut Matrix, p: usize, q: usize, c: f64, s: f64) {
    for i in 0..m.rows() {
        let mp = m[(i, p)];
        let mq = m[(i, q)];
        m[(i, p)] = c * mp - s * mq;
        m[(i, q)] = s * mp + c * mq;
    }
}

fn column_norm(m: &Matrix, j: usize) -> f64 {
    (0..m.rows()).map(|i| m[(i, j)] * m[(i, j)]).sum::<f64>().sqrt()
}

fn permute_columns(m: &Matrix, order: &[usize]) -> Matrix {
    let mut out = Matrix::zeros(m.rows(), order.len());
    for (dst, &src) in order.iter().enumerate() {
        for i in 0..m.rows() {
            out[(i, dst)] = m[(i, src)];
        }
    }
    out
}

/// A unit vector orthogonal to the first `filled` columns of `u`, found by
/// Gram-Schmidt against the standard basis.
fn orthogonal_completion(u: &Matrix, filled: usize) -> Vec<f64> {
    let rows = u.rows();
    let mut best = vec![0.0; rows];
    let mut best_norm = -1.0;
    for k in 0..rows {
        let mut e = vec![0.0; rows];
        e[k] = 1.0;
        for j in 0..filled {
            let col = u.column(j);
            let d = super::dot(&e, &col);
            super::axpy(&mut e, -d, &col);
        }
        let n = super::norm(&e);
        if n > best_norm {
            best_norm = n;
            best = e;
        }
        if n > 0.5 {
            break;
        }
    }
    if best_norm > 0.0 {
        super::scale(&best, 1.0 / best_norm)
    } else {
        best
    }
}
