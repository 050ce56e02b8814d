//! Session storage for points, axes and labels

use super::TourData;
use crate::error::{Result, TourError};
use crate::linalg::{self, Matrix};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Label x position meaning "not placed in the plot"
pub const PARKED_X: f64 = 2.0;

/// Floor used when normalizing centroids and axis columns
const NORM_FLOOR: f64 = 1e-30;

/// Points in a shuffled order that is fixed for the session.
///
/// Shuffling decorrelates drawing order (which points end up on top) from
/// whatever order the input happened to be in. `permutor[i]` is the
/// original row of internal point `i`; `unpermutor` is its inverse.
#[derive(Debug, Clone)]
pub struct PointCloud {
    x: Matrix,
    group: Vec<usize>,
    rownames: Vec<String>,
    links: Vec<(usize, usize)>,
    permutor: Vec<usize>,
    unpermutor: Vec<usize>,
}

impl PointCloud {
    pub fn build<R: Rng + ?Sized>(data: &TourData, rng: &mut R) -> Result<Self> {
        let x = Matrix::from_rows(data.x.clone())?;
        let (n, m) = (x.rows(), x.cols());
        if n == 0 {
            return Err(TourError::Shape("data has no rows".into()));
        }
        if m < 2 {
            return Err(TourError::TooFewColumns(m));
        }
        expect_len("colnames", m, data.colnames.len())?;
        expect_len("group", n, data.group.len())?;
        if let Some(&bad) = data.group.iter().find(|&&g| g >= data.levels.len()) {
            return Err(TourError::GroupOutOfRange {
                index: bad,
                levels: data.levels.len(),
            });
        }
        if let Some(names) = &data.rownames {
            // An empty list means "no row names"
            if !names.is_empty() {
                expect_len("rownames", n, names.len())?;
            }
        }

        let mut permutor: Vec<usize> = (0..n).collect();
        permutor.shuffle(rng);
        let mut unpermutor = vec![0; n];
        for (i, &p) in permutor.iter().enumerate() {
            unpermutor[p] = i;
        }

        let mut shuffled = Matrix::zeros(n, m);
        for (i, &p) in permutor.iter().enumerate() {
            shuffled.row_mut(i).copy_from_slice(x.row(p));
        }

        let rownames = match &data.rownames {
            Some(names) if !names.is_empty() => {
                permutor.iter().map(|&p| names[p].clone()).collect()
            }
            _ => Vec::new(),
        };

        let links = match (&data.line_from, &data.line_to) {
            (Some(from), Some(to)) => {
                expect_len("lineTo", from.len(), to.len())?;
                let mut links = Vec::with_capacity(from.len());
                for (&a, &b) in from.iter().zip(to) {
                    if a >= n || b >= n {
                        return Err(TourError::Shape(format!(
                            "line endpoint ({}, {}) out of range for {} rows",
                            a, b, n
                        )));
                    }
                    links.push((unpermutor[a], unpermutor[b]));
                }
                links
            }
            _ => Vec::new(),
        };

        Ok(Self {
            x: shuffled,
            group: permutor.iter().map(|&p| data.group[p]).collect(),
            rownames,
            links,
            permutor,
            unpermutor,
        })
    }

    pub fn n(&self) -> usize {
        self.x.rows()
    }

    pub fn m(&self) -> usize {
        self.x.cols()
    }

    /// Points in internal order, n x m
    pub fn matrix(&self) -> &Matrix {
        &self.x
    }

    pub fn point(&self, i: usize) -> &[f64] {
        self.x.row(i)
    }

    pub fn group(&self, i: usize) -> usize {
        self.group[i]
    }

    pub fn groups(&self) -> &[usize] {
        &self.group
    }

    pub fn rownames(&self) -> &[String] {
        &self.rownames
    }

    /// Connected point pairs in internal order
    pub fn links(&self) -> &[(usize, usize)] {
        &self.links
    }

    /// Original row index of internal point `i`
    pub fn original_index(&self, i: usize) -> usize {
        self.permutor[i]
    }

    /// Internal index of original row `j`
    pub fn internal_index(&self, j: usize) -> usize {
        self.unpermutor[j]
    }

    /// Translate a mask given in original row order to internal order.
    pub fn mask_to_internal(&self, original: &[bool]) -> Result<Vec<bool>> {
        expect_len("mask", self.n(), original.len())?;
        Ok(self.permutor.iter().map(|&p| original[p]).collect())
    }

    /// Translate an internal-order mask back to original row order.
    pub fn mask_to_original(&self, internal: &[bool]) -> Vec<bool> {
        self.unpermutor.iter().map(|&i| internal[i]).collect()
    }

    /// Build one axis per extra axis column, then one per variable.
    pub fn build_axes(&self, data: &TourData) -> Result<Vec<Axis>> {
        let m = self.m();
        let center = optional_vec("center", data.center.as_deref(), m, 0.0)?;
        let scale = optional_vec("scale", data.scale.as_deref(), m, 1.0)?;

        let mut axes = Vec::new();

        if let Some(extra) = &data.extra_axes {
            let extra = Matrix::from_rows(extra.clone())?;
            expect_len("extraAxes rows", m, extra.rows())?;
            let e = extra.cols();
            let names: Vec<String> = match &data.extra_axes_names {
                Some(names) => {
                    expect_len("extraAxesNames", e, names.len())?;
                    names.clone()
                }
                None => (1..=e).map(|i| format!("E{}", i)).collect(),
            };
            let centers = optional_vec("extraAxesCenter", data.extra_axes_center.as_deref(), e, 0.0)?;
            for (k, name) in names.into_iter().enumerate() {
                let column = extra.column(k);
                let length = linalg::norm(&column);
                axes.push(self.axis(
                    name,
                    linalg::normalize(&column, NORM_FLOOR),
                    centers[k],
                    length,
                ));
            }
        }

        for (i, name) in data.colnames.iter().enumerate() {
            let mut unit = vec![0.0; m];
            unit[i] = 1.0;
            axes.push(self.axis(name.clone(), unit, center[i], scale[i]));
        }

        Ok(axes)
    }

    fn axis(&self, name: String, unit: Vec<f64>, center: f64, scale: f64) -> Axis {
        let proj = self.x.iter_rows().map(|row| linalg::dot(row, &unit)).collect();
        Axis {
            name,
            unit,
            center,
            scale,
            proj,
        }
    }

    /// Group labels (only when there is more than one group), then one
    /// label per axis. All start parked outside the plot.
    pub fn build_labels(&self, levels: &[String], axes: &[Axis]) -> Vec<Label> {
        let mut labels = Vec::new();
        if levels.len() > 1 {
            for (g, level) in levels.iter().enumerate() {
                let mut sum = vec![0.0; self.m()];
                for (i, row) in self.x.iter_rows().enumerate() {
                    if self.group[i] == g {
                        linalg::axpy(&mut sum, 1.0, row);
                    }
                }
                labels.push(Label::new(
                    LabelKind::Group(g),
                    level.clone(),
                    linalg::normalize(&sum, NORM_FLOOR),
                ));
            }
        }
        for (a, axis) in axes.iter().enumerate() {
            labels.push(Label::new(
                LabelKind::Axis(a),
                axis.name.clone(),
                axis.unit.clone(),
            ));
        }
        labels
    }
}

/// A direction of interest in data space.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub name: String,
    pub unit: Vec<f64>,
    /// Original-unit value at the origin
    pub center: f64,
    /// Original units per unit of projected distance
    pub scale: f64,
    /// Every point's coordinate along `unit`, internal order
    pub proj: Vec<f64>,
}

impl Axis {
    /// Where this axis' unit vector lands in the current view.
    pub fn projected(&self, proj: &Matrix) -> [f64; 2] {
        [
            linalg::dot(proj.row(0), &self.unit),
            linalg::dot(proj.row(1), &self.unit),
        ]
    }

    /// Convert a projected coordinate along this axis to original units.
    pub fn to_original_units(&self, value: f64) -> f64 {
        value * self.scale + self.center
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "index", rename_all = "camelCase")]
pub enum LabelKind {
    /// Index into levels
    Group(usize),
    /// Index into axes
    Axis(usize),
}

/// A draggable label. Dropped into the plot it attracts the projection
/// toward its vector; unchecked it removes its group or axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub kind: LabelKind,
    pub name: String,
    pub vec: Vec<f64>,
    pub active: bool,
    pub x: f64,
    pub y: f64,
}

impl Label {
    pub fn new(kind: LabelKind, name: String, vec: Vec<f64>) -> Self {
        Self {
            kind,
            name,
            vec,
            active: true,
            x: PARKED_X,
            y: 0.0,
        }
    }

    /// Outside the plot area (to the right), exerting no force
    pub fn is_parked(&self) -> bool {
        self.x >= 1.0
    }
}

fn expect_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(TourError::LengthMismatch {
            what,
            expected,
            actual,
        })
    }
}

fn optional_vec(what: &'static str, v: Option<&[f64]>, len: usize, fill: f64) -> Result<Vec<f64>> {
    match v {
        Some(v) => {
            expect_len(what, len, v.len())?;
            Ok(v.to_vec())
        }
        None => Ok(vec![fill; len]),
    }
}
