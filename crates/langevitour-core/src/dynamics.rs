//! Langevin dynamics on the Stiefel manifold
//!
//! One call to [`Dynamics::step`] advances the projection by one frame:
//!
//! 1. exponential velocity decay (damping)
//! 2. tug override, which replaces the velocity and disables 3-5
//! 3. thermal noise, variance chosen so the steady state does not depend
//!    on frame rate
//! 4. guide gradient
//! 5. label attraction
//! 6. axis nuking
//! 7. Euler position step
//! 8. retraction back onto St(2, m)
//! 9. velocity re-derived from the constrained displacement
//!    ("position based dynamics")
//!
//! The integrator knows nothing about labels, groups or UI. The caller
//! gathers the active points, attractors, nuked directions and tug into a
//! [`Forces`] value each frame.

use crate::advisory::Advisory;
use crate::guide::GuideKind;
use crate::linalg::{self, Matrix};
use crate::manifold::{self, Nuke};
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const MIN_DT: f64 = 1e-6;
pub const MAX_DT: f64 = 1.0;

/// Upper bound on how fast a tug closes the gap to its target, in 1/seconds
pub const MAX_TUG_RATE: f64 = 100.0;

/// Floor on the squared tug centroid length
pub const TUG_NORM_FLOOR: f64 = 1e-6;

/// Damping multiple of label attraction applied while a label is dragged
pub const DRAG_DAMPING_FACTOR: f64 = 5.0;

/// Physical parameters for one step, already in linear units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlState {
    pub damping: f64,
    pub heat: f64,
    pub heat_on: bool,
    pub guide: Option<GuideKind>,
    pub guide_strength: f64,
    pub label_attraction_on: bool,
    pub label_attraction: f64,
    /// A label is being dragged; damping is raised to stop overshoot
    pub label_dragging: bool,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            damping: 0.1,
            heat: 0.1,
            heat_on: true,
            guide: None,
            guide_strength: 1.0,
            label_attraction_on: true,
            label_attraction: 1.0,
            label_dragging: false,
        }
    }
}

impl ControlState {
    /// All forces off. Useful as a base for tests and scripted tours.
    pub fn still() -> Self {
        Self {
            heat_on: false,
            guide: None,
            label_attraction_on: false,
            ..Self::default()
        }
    }

    pub fn effective_damping(&self) -> f64 {
        if self.label_dragging && self.label_attraction_on {
            self.damping
                .max(self.label_attraction * DRAG_DAMPING_FACTOR)
        } else {
            self.damping
        }
    }
}

/// A label pulling the projection toward its direction.
#[derive(Debug, Clone, Copy)]
pub struct Attractor<'a> {
    /// Unit vector in data space
    pub vec: &'a [f64],
    pub x: f64,
    pub y: f64,
}

/// Direct positional control of a set of points.
#[derive(Debug, Clone, Copy)]
pub struct Tug<'a> {
    /// Mean of the tugged points in data space
    pub centroid: &'a [f64],
    /// Where the centroid should appear in the plot
    pub target: [f64; 2],
}

/// Per-step inputs assembled by the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct Forces<'a> {
    /// Active points, used by the guide
    pub points: &'a [&'a [f64]],
    /// Labels that currently exert attraction
    pub attractors: &'a [Attractor<'a>],
    /// Unit vectors of deactivated axes
    pub nuked: &'a [&'a [f64]],
    pub tug: Option<Tug<'a>>,
}

/// What happened during a step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    /// The clamped timestep actually used
    pub dt: f64,
    pub advisories: Vec<Advisory>,
}

impl StepReport {
    pub fn message(&self) -> String {
        crate::advisory::message(&self.advisories)
    }
}

/// Projection and velocity state.
#[derive(Debug, Clone, PartialEq)]
pub struct Dynamics {
    proj: Matrix,
    vel: Matrix,
    scratch: Matrix,
    noise: Matrix,
}

impl Dynamics {
    /// Canonical initial frame: first two standard basis vectors, at rest.
    pub fn new(m: usize) -> Self {
        assert!(m >= 2, "a tour needs at least two variables");
        Self {
            proj: canonical_frame(m),
            vel: Matrix::zeros(2, m),
            scratch: Matrix::zeros(2, m),
            noise: Matrix::zeros(2, m),
        }
    }

    pub fn dims(&self) -> usize {
        self.proj.cols()
    }

    pub fn proj(&self) -> &Matrix {
        &self.proj
    }

    pub fn vel(&self) -> &Matrix {
        &self.vel
    }

    /// Jump to a projection (retracted onto the manifold) and stop.
    pub fn set_projection(&mut self, proj: &Matrix) {
        assert_eq!(
            (proj.rows(), proj.cols()),
            (2, self.dims()),
            "projection shape"
        );
        self.proj = manifold::retract(proj);
        self.vel.fill(0.0);
    }

    pub fn reset(&mut self) {
        self.proj = canonical_frame(self.dims());
        self.vel.fill(0.0);
    }

    /// Advance by `dt` seconds (clamped to `[MIN_DT, MAX_DT]`).
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        dt: f64,
        controls: &ControlState,
        forces: &Forces<'_>,
        rng: &mut R,
    ) -> StepReport {
        let dt = if dt.is_nan() {
            MIN_DT
        } else {
            dt.clamp(MIN_DT, MAX_DT)
        };
        let mut report = StepReport {
            dt,
            advisories: Vec::new(),
        };

        // Exact solution of dv/dt = -damping * v over dt
        let vel_keep = (-dt * controls.effective_damping()).exp();
        self.vel.scale_in_place(vel_keep);

        if let Some(tug) = &forces.tug {
            self.apply_tug(tug, dt);
        } else {
            if controls.heat_on {
                self.add_heat(controls.heat, vel_keep, rng);
            }
            if let Some(guide) = controls.guide {
                if let Some(grad) = guide.gradient(&self.proj, forces.points, rng) {
                    self.vel.add_scaled(&grad, -controls.guide_strength);
                }
            }
            if controls.label_attraction_on {
                self.add_attraction(forces.attractors, controls.label_attraction);
            }
        }

        match manifold::nuke(forces.nuked, &self.proj, &self.vel, dt) {
            Nuke::Idle => {}
            Nuke::TooMany { count } => {
                debug!(count, dims = self.dims(), "nuking skipped, too many axes");
                report.advisories.push(Advisory::TooManyAxesRemoved);
            }
            Nuke::Applied {
                correction,
                dropped,
            } => {
                if dropped > 0 {
                    report.advisories.push(Advisory::RedundantAxesRemoved);
                }
                self.vel.add_assign(&correction);
            }
        }

        self.scratch.copy_from(&self.proj);
        self.scratch.add_scaled(&self.vel, dt);
        let next = manifold::retract(&self.scratch);

        if !next.is_finite() {
            debug!("non-finite projection, resetting");
            report.advisories.push(Advisory::NonFiniteState);
            self.reset();
            return report;
        }

        if forces.tug.is_some() {
            self.vel.fill(0.0);
        } else {
            self.vel.copy_from(&next);
            self.vel.add_scaled(&self.proj, -1.0);
            self.vel.scale_in_place(1.0 / dt);
        }
        self.proj = next;

        report
    }

    /// Replace the velocity with the one that moves the tugged centroid's
    /// projected position toward the target at rate `min(100, 1/dt)`.
    fn apply_tug(&mut self, tug: &Tug<'_>, dt: f64) {
        let rate = MAX_TUG_RATE.min(1.0 / dt);
        let c = tug.centroid;
        let len2 = linalg::dot(c, c).max(TUG_NORM_FLOOR);
        for j in 0..2 {
            let current = linalg::dot(self.proj.row(j), c);
            let amount = (tug.target[j] - current) / len2 * rate;
            let row = self.vel.row_mut(j);
            for (v, ci) in row.iter_mut().zip(c) {
                *v = ci * amount;
            }
        }
    }

    /// Damping shrinks velocity variance by `vel_keep²` per step; adding
    /// noise of variance `heat · (1 - vel_keep²)` holds the steady state at
    /// `heat` for any frame rate. As dt → 0 this tends to the continuous
    /// Langevin coefficient √(2·damping·heat).
    fn add_heat<R: Rng + ?Sized>(&mut self, heat: f64, vel_keep: f64, rng: &mut R) {
        let sd = (heat * (1.0 - vel_keep * vel_keep)).max(0.0).sqrt();
        for j in 0..2 {
            for v in self.noise.row_mut(j) {
                let z: f64 = rng.sample(StandardNormal);
                *v = z * sd;
            }
        }
        manifold::remove_spin_in_place(&mut self.noise, &self.proj);
        self.vel.add_assign(&self.noise);
    }

    /// Labels near the center of the plot are nearly inert; the quartic
    /// factor `4(x² + y²)` makes labels near the edge pull hard.
    fn add_attraction(&mut self, attractors: &[Attractor<'_>], attraction: f64) {
        for a in attractors {
            let (x, y) = (a.x, a.y);
            if x <= -1.0 || y <= -1.0 || x >= 1.0 || y >= 1.0 {
                continue;
            }
            let adjustment = 4.0 * (x * x + y * y) * attraction;
            linalg::axpy(self.vel.row_mut(0), x * adjustment, a.vec);
            linalg::axpy(self.vel.row_mut(1), y * adjustment, a.vec);
        }
    }
}

fn canonical_frame(m: usize) -> Matrix {
    let mut p = Matrix::zeros(2, m);
    p[(0, 0)] = 1.0;
    p[(1, 1)] = 1.0;
    p
}
