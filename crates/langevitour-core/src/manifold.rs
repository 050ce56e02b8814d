//! Stiefel manifold helpers
//!
//! The projection lives on St(2, m): 2 x m matrices with orthonormal rows.
//! This module keeps it there ([`retract`]), strips motion that would only
//! spin the view in-plane ([`remove_spin`]), and computes the velocity
//! correction that removes deactivated axis directions ([`nuke`]).

use crate::linalg::{self, svd, Matrix};

/// Upper bound on the rate at which nuked directions are decayed out of
/// the projection, in 1/seconds.
pub const MAX_NUKE_RATE: f64 = 2.0;

/// Nuke basis vectors whose singular value is below this fraction of the
/// largest are treated as redundant.
pub const REDUNDANT_AXIS_TOL: f64 = 1e-6;

/// The in-plane rotation direction `rot · proj` with
/// `rot = [[0, -1/√2], [1/√2, 0]]`. Unit Frobenius norm when `proj` is
/// orthonormal.
pub fn spin_direction(proj: &Matrix) -> Matrix {
    assert_eq!(proj.rows(), 2, "projection must have two rows");
    let h = std::f64::consts::FRAC_1_SQRT_2;
    let mut r = Matrix::zeros(2, proj.cols());
    for k in 0..proj.cols() {
        r[(0, k)] = -h * proj[(1, k)];
        r[(1, k)] = h * proj[(0, k)];
    }
    r
}

/// Remove the component of `motion` that is a pure rotation of the viewing
/// plane within itself.
pub fn remove_spin(motion: &Matrix, proj: &Matrix) -> Matrix {
    let mut out = motion.clone();
    remove_spin_in_place(&mut out, proj);
    out
}

pub fn remove_spin_in_place(motion: &mut Matrix, proj: &Matrix) {
    let r = spin_direction(proj);
    let amount = motion.frobenius_dot(&r);
    motion.add_scaled(&r, -amount);
}

/// Nearest matrix with orthonormal rows (orthogonal Procrustes).
///
/// With `xᵗ = U Σ Vᵗ` the result is `V Uᵗ`. Works for any k x m with
/// k <= m; the tour only uses k = 2.
pub fn retract(x: &Matrix) -> Matrix {
    let s = svd(&x.transpose());
    s.v.tcrossprod(&s.u)
}

/// Result of the axis-nuking sub-step.
#[derive(Debug, Clone, PartialEq)]
pub enum Nuke {
    /// Nothing is deactivated.
    Idle,
    /// `count >= m - 1` directions requested; nothing was applied.
    TooMany { count: usize },
    /// Velocity correction to add, already spin-free.
    Applied {
        correction: Matrix,
        /// Directions skipped as linearly dependent on the others.
        dropped: usize,
    },
}

/// Velocity correction that removes the span of `inactive` from both the
/// velocity and (at rate `min(2, 1/dt)`) the position.
///
/// For each orthonormal basis vector `u` of the span, each row `j` gets
/// `-(⟨u, vel_j⟩ + rate · ⟨u, proj_j⟩) · u`.
pub fn nuke(inactive: &[&[f64]], proj: &Matrix, vel: &Matrix, dt: f64) -> Nuke {
    if inactive.is_empty() {
        return Nuke::Idle;
    }
    let m = proj.cols();
    if inactive.len() + 1 >= m {
        return Nuke::TooMany {
            count: inactive.len(),
        };
    }

    let rate = MAX_NUKE_RATE.min(1.0 / dt);
    let s = svd(&Matrix::from_columns(inactive));
    let max_q = s.q.iter().copied().fold(0.0, f64::max);

    let mut correction = Matrix::zeros(proj.rows(), m);
    let mut dropped = 0;
    for (i, &q) in s.q.iter().enumerate() {
        if q < max_q * REDUNDANT_AXIS_TOL || q == 0.0 {
            dropped += 1;
            continue;
        }
        let u = s.u.column(i);
        for j in 0..proj.rows() {
            let amount = linalg::dot(&u, vel.row(j)) + rate * linalg::dot(&u, proj.row(j));
            linalg::axpy(correction.row_mut(j), -amount, &u);
        }
    }

    remove_spin_in_place(&mut correction, proj);
    Nuke::Applied {
        correction,
        dropped,
    }
}
