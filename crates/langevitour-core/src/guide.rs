//! Guide gradients for projection pursuit
//!
//! A guide is a potential energy over projections; only its gradient
//! matters. All guides here belong to one repulsion family: the
//! potential is a sum over difference vectors `a` (pairs of points, or
//! points against the origin for the central variants) of a power of the
//! projected squared length `‖P·a‖² + fineScale²`.
//!
//! Summing over every pair would be O(k²), so pairwise guides take a fixed
//! number of pairs per frame. The estimate is stochastic, which leaves a
//! little jitter even with heat turned off.

use crate::error::{Result, TourError};
use crate::linalg::{self, Matrix};
use crate::manifold::remove_spin_in_place;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of point pairs sampled per frame by the pairwise guides
pub const PAIR_SAMPLES: usize = 5000;

/// Available guides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuideKind {
    /// Keep small things from overlapping. Least stable.
    Ultralocal,
    /// General untangling. A good default.
    Local,
    /// Maximize projected variance (principal components).
    Pca,
    /// Favor views with a few points very far from the rest.
    Outlier,
    /// Push points away from the center.
    Push,
    /// Pull points toward the center.
    Pull,
}

/// Shape of a guide's potential
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuideParams {
    pub power: f64,
    pub fine_scale: f64,
    pub strength: f64,
    /// Repel points from the origin rather than from each other
    pub central: bool,
}

impl GuideKind {
    pub const ALL: [GuideKind; 6] = [
        GuideKind::Ultralocal,
        GuideKind::Local,
        GuideKind::Pca,
        GuideKind::Outlier,
        GuideKind::Push,
        GuideKind::Pull,
    ];

    pub fn params(self) -> GuideParams {
        let (power, fine_scale, strength, central) = match self {
            GuideKind::Ultralocal => (-1.0, 0.05, 0.01, false),
            GuideKind::Local => (0.0, 0.01, 0.5, false),
            GuideKind::Pca => (1.0, 0.0, 0.5, false),
            GuideKind::Outlier => (2.0, 0.0, 5.0, false),
            GuideKind::Push => (0.5, 0.01, 0.5, true),
            GuideKind::Pull => (0.5, 0.01, -0.2, true),
        };
        GuideParams {
            power,
            fine_scale,
            strength,
            central,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GuideKind::Ultralocal => "ultralocal",
            GuideKind::Local => "local",
            GuideKind::Pca => "pca",
            GuideKind::Outlier => "outlier",
            GuideKind::Push => "push",
            GuideKind::Pull => "pull",
        }
    }

    /// Parse a guide selection where `"none"` means no guide.
    pub fn parse_selection(name: &str) -> Result<Option<GuideKind>> {
        if name == "none" {
            Ok(None)
        } else {
            name.parse().map(Some)
        }
    }

    /// Stochastic negative gradient of this guide's potential at `proj`,
    /// spin removed. `None` when there are no active points.
    pub fn gradient<R: Rng + ?Sized>(
        self,
        proj: &Matrix,
        points: &[&[f64]],
        rng: &mut R,
    ) -> Option<Matrix> {
        if points.is_empty() {
            return None;
        }
        let params = self.params();
        let mut grad = if params.central {
            central_repulsion(proj, points, &params)
        } else {
            pairwise_repulsion(proj, points, &params, rng)
        };
        remove_spin_in_place(&mut grad, proj);
        Some(grad)
    }
}

impl fmt::Display for GuideKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GuideKind {
    type Err = TourError;

    fn from_str(s: &str) -> Result<Self> {
        GuideKind::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| TourError::UnknownGuide(s.to_string()))
    }
}

/// Accumulate `a · p_j · w` for one difference vector.
#[inline]
fn accumulate(grad: &mut Matrix, proj: &Matrix, a: &[f64], params: &GuideParams, p: &mut [f64]) {
    for (j, pj) in p.iter_mut().enumerate() {
        *pj = linalg::dot(a, proj.row(j));
    }
    let p2: f64 = p.iter().map(|v| v * v).sum();
    let weight = (p2 + params.fine_scale * params.fine_scale).powf(params.power - 1.0);
    for (j, pj) in p.iter().enumerate() {
        linalg::axpy(grad.row_mut(j), pj * weight, a);
    }
}

/// Pairs are taken as `(i + off1) % k, (i + off2) % k` with two random
/// offsets, rather than drawing both indices independently.
fn pairwise_repulsion<R: Rng + ?Sized>(
    proj: &Matrix,
    points: &[&[f64]],
    params: &GuideParams,
    rng: &mut R,
) -> Matrix {
    let k = points.len();
    let mut grad = Matrix::zeros(proj.rows(), proj.cols());
    let mut p = vec![0.0; proj.rows()];
    let mut a = vec![0.0; proj.cols()];
    let off1 = rng.gen_range(0..k);
    let off2 = rng.gen_range(0..k);
    for i in 0..PAIR_SAMPLES {
        let x = points[(i + off1) % k];
        let y = points[(i + off2) % k];
        for (ai, (xi, yi)) in a.iter_mut().zip(x.iter().zip(y.iter())) {
            *ai = xi - yi;
        }
        accumulate(&mut grad, proj, &a, params, &mut p);
    }
    grad.scale_in_place(-2.0 / PAIR_SAMPLES as f64 * params.strength);
    grad
}

fn central_repulsion(proj: &Matrix, points: &[&[f64]], params: &GuideParams) -> Matrix {
    let mut grad = Matrix::zeros(proj.rows(), proj.cols());
    let mut p = vec![0.0; proj.rows()];
    for a in points {
        accumulate(&mut grad, proj, a, params, &mut p);
    }
    grad.scale_in_place(-2.0 / points.len() as f64 * params.strength);
    grad
}
