//! Turning a raw table into render input
//!
//! The engine expects data that is already centered and scaled, groups as
//! integer codes, and names for everything. [`RawDataset::prepare`] fills
//! in the defaults and validates shapes.

use super::TourData;
use crate::error::{Result, TourError};
use crate::interaction::StateUpdate;
use crate::linalg::{svd, Matrix};
use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Multiplier applied to the RMS of the leading singular value when no
/// scale is given
pub const DEFAULT_SCALE_FACTOR: f64 = 2.5;

/// Scale for each variable: one shared value or one per column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scale {
    Uniform(f64),
    PerColumn(Vec<f64>),
}

/// Unprocessed table plus optional annotations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDataset {
    pub data: Vec<Vec<f64>>,
    #[serde(default)]
    pub group: Option<Vec<String>>,
    #[serde(default)]
    pub levels: Option<Vec<String>>,
    #[serde(default)]
    pub column_names: Option<Vec<String>>,
    #[serde(default)]
    pub row_names: Option<Vec<String>>,
    #[serde(default)]
    pub center: Option<Vec<f64>>,
    #[serde(default)]
    pub scale: Option<Scale>,
    /// m x e, one column per extra axis
    #[serde(default)]
    pub extra_axes: Option<Vec<Vec<f64>>>,
    #[serde(default)]
    pub extra_axes_names: Option<Vec<String>>,
    #[serde(default)]
    pub line_from: Option<Vec<usize>>,
    #[serde(default)]
    pub line_to: Option<Vec<usize>>,
    /// Keep a random subset of this many rows
    #[serde(default)]
    pub subsample: Option<usize>,
    #[serde(default)]
    pub state: Option<StateUpdate>,
}

/// Code string groups as integers.
///
/// Without `levels`, codes follow first appearance. With `levels`, every
/// group value must be one of them.
pub fn as_factor(group: &[String], levels: Option<&[String]>) -> Result<(Vec<usize>, Vec<String>)> {
    let mut mapping: HashMap<&str, usize> = HashMap::new();
    let mut names: Vec<String> = Vec::new();

    match levels {
        Some(levels) => {
            for (i, level) in levels.iter().enumerate() {
                mapping.entry(level.as_str()).or_insert(i);
            }
            names = levels.to_vec();
        }
        None => {
            for item in group {
                if !mapping.contains_key(item.as_str()) {
                    mapping.insert(item.as_str(), names.len());
                    names.push(item.clone());
                }
            }
        }
    }

    let codes = group
        .iter()
        .map(|item| {
            mapping
                .get(item.as_str())
                .copied()
                .ok_or_else(|| TourError::UnknownLevel(item.clone()))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((codes, names))
}

impl RawDataset {
    pub fn new(data: Vec<Vec<f64>>) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    /// Validate, fill defaults, subsample, and center/scale.
    pub fn prepare<R: Rng + ?Sized>(self, rng: &mut R) -> Result<TourData> {
        let x = Matrix::from_rows(self.data)?;
        let (n, m) = (x.rows(), x.cols());
        if n == 0 {
            return Err(TourError::Shape("data has no rows".into()));
        }
        if m < 2 {
            return Err(TourError::TooFewColumns(m));
        }

        let colnames = match self.column_names {
            Some(names) => {
                check_len("column names", m, names.len())?;
                names
            }
            None => (1..=m).map(|i| format!("V{}", i)).collect(),
        };

        let group_strings = match self.group {
            Some(g) => {
                check_len("group", n, g.len())?;
                g
            }
            None => vec![String::new(); n],
        };
        let (group, levels) = as_factor(&group_strings, self.levels.as_deref())?;

        if let Some(names) = &self.row_names {
            check_len("row names", n, names.len())?;
        }

        let center = match self.center {
            Some(c) if c.len() == 1 => vec![c[0]; m],
            Some(c) => {
                check_len("center", m, c.len())?;
                c
            }
            None => column_means(&x),
        };

        let scale = match self.scale {
            Some(Scale::Uniform(s)) => vec![s; m],
            Some(Scale::PerColumn(s)) if s.len() == 1 => vec![s[0]; m],
            Some(Scale::PerColumn(s)) => {
                check_len("scale", m, s.len())?;
                s
            }
            None => vec![default_scale(&x, &center); m],
        };

        // Extra axes are given in original units. The engine sees scaled
        // data, so row i picks up scale[i], and the center term restores
        // `axis · x_original`.
        let (extra_axes, extra_axes_center, extra_axes_names) = match self.extra_axes {
            Some(axes) => {
                check_len("extra axes rows", m, axes.len())?;
                let axes = Matrix::from_rows(axes)?;
                let e = axes.cols();
                let names = match self.extra_axes_names {
                    Some(names) => {
                        check_len("extra axes names", e, names.len())?;
                        names
                    }
                    None => (1..=e).map(|i| format!("E{}", i)).collect(),
                };
                let mut axis_center = vec![0.0; e];
                for (i, row) in axes.iter_rows().enumerate() {
                    crate::linalg::axpy(&mut axis_center, center[i], row);
                }
                let scaled: Vec<Vec<f64>> = axes
                    .iter_rows()
                    .zip(&scale)
                    .map(|(row, s)| crate::linalg::scale(row, *s))
                    .collect();
                (Some(scaled), Some(axis_center), Some(names))
            }
            None => (None, None, None),
        };

        // Subsample before scaling; center/scale are properties of the full data.
        let keep: Vec<usize> = match self.subsample {
            Some(k) if k < n => {
                let mut picked = index::sample(rng, n, k).into_vec();
                picked.sort_unstable();
                picked
            }
            _ => (0..n).collect(),
        };
        let mut remap = vec![None; n];
        for (new, &old) in keep.iter().enumerate() {
            remap[old] = Some(new);
        }

        let scaled: Vec<Vec<f64>> = keep
            .iter()
            .map(|&i| {
                x.row(i)
                    .iter()
                    .zip(center.iter().zip(&scale))
                    .map(|(v, (c, s))| (v - c) / s)
                    .collect()
            })
            .collect();

        // Lines survive subsampling only when both ends do.
        let (line_from, line_to) = match (self.line_from, self.line_to) {
            (Some(from), Some(to)) => {
                check_len("line_to", from.len(), to.len())?;
                let (f, t): (Vec<usize>, Vec<usize>) = from
                    .iter()
                    .zip(&to)
                    .filter_map(|(&a, &b)| {
                        let a = remap.get(a).copied().flatten()?;
                        let b = remap.get(b).copied().flatten()?;
                        Some((a, b))
                    })
                    .unzip();
                (Some(f), Some(t))
            }
            (None, None) => (None, None),
            _ => {
                return Err(TourError::Shape(
                    "line_from and line_to must be given together".into(),
                ))
            }
        };

        Ok(TourData {
            x: scaled,
            colnames,
            group: keep.iter().map(|&i| group[i]).collect(),
            levels,
            center: Some(center),
            scale: Some(scale),
            rownames: self
                .row_names
                .map(|names| keep.iter().map(|&i| names[i].clone()).collect()),
            extra_axes,
            extra_axes_center,
            extra_axes_names,
            line_from,
            line_to,
            state: self.state,
        })
    }
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
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

fn column_means(x: &Matrix) -> Vec<f64> {
    let mut mean = vec![0.0; x.cols()];
    for row in x.iter_rows() {
        crate::linalg::axpy(&mut mean, 1.0, row);
    }
    crate::linalg::scale(&mean, 1.0 / x.rows() as f64)
}

/// `2.5 · σ_max(X - center) / √n`. Falls back to 1 for constant data.
fn default_scale(x: &Matrix, center: &[f64]) -> f64 {
    let mut centered = x.clone();
    for i in 0..centered.rows() {
        crate::linalg::axpy(centered.row_mut(i), -1.0, center);
    }
    let top = svd(&centered).q.first().copied().unwrap_or(0.0);
    let s = top / (x.rows() as f64).sqrt() * DEFAULT_SCALE_FACTOR;
    if s > 0.0 && s.is_finite() {
        s
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::PointCloud;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_factor_without_levels() {
        let (codes, levels) = as_factor(&strings(&["a", "b", "a", "c"]), None).unwrap();
        assert_eq!(codes, vec![0, 1, 0, 2]);
        assert_eq!(levels, strings(&["a", "b", "c"]));
    }

    #[test]
    fn test_factor_with_levels() {
        let custom = strings(&["b", "a", "c"]);
        let (codes, levels) = as_factor(&strings(&["a", "b", "a", "c"]), Some(&custom)).unwrap();
        assert_eq!(codes, vec![1, 0, 1, 2]);
        assert_eq!(levels, custom);
    }

    #[test]
    fn test_factor_unknown_level() {
        let custom = strings(&["a"]);
        let err = as_factor(&strings(&["a", "z"]), Some(&custom)).unwrap_err();
        assert_eq!(err, TourError::UnknownLevel("z".into()));
    }

    #[test]
    fn test_rejects_single_column() {
        let raw = RawDataset::new(vec![vec![1.0], vec![2.0]]);
        let err = raw.prepare(&mut StdRng::seed_from_u64(0)).unwrap_err();
        assert_eq!(err, TourError::TooFewColumns(1));
    }

    #[test]
    fn test_rejects_group_length_mismatch() {
        let raw = RawDataset {
            group: Some(strings(&["a"])),
            ..RawDataset::new(vec![vec![1.0, 2.0], vec![3.0, 4.0]])
        };
        assert!(matches!(
            raw.prepare(&mut StdRng::seed_from_u64(0)),
            Err(TourError::LengthMismatch { what: "group", .. })
        ));
    }

    #[test]
    fn test_defaults_and_centering() {
        let raw = RawDataset {
            scale: Some(Scale::Uniform(2.0)),
            ..RawDataset::new(vec![vec![1.0, 2.0], vec![3.0, 4.0]])
        };
        let data = raw.prepare(&mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(data.colnames, strings(&["V1", "V2"]));
        assert_eq!(data.levels, strings(&[""]));
        assert_eq!(data.group, vec![0, 0]);
        assert_eq!(data.center, Some(vec![2.0, 3.0]));
        assert_eq!(data.x, vec![vec![-0.5, -0.5], vec![0.5, 0.5]]);
    }

    #[test]
    fn test_default_scale_uses_leading_singular_value() {
        // Centered rows (±1, 0): σ_max = √2, n = 2 → scale 2.5
        let raw = RawDataset::new(vec![vec![-1.0, 0.0], vec![1.0, 0.0]]);
        let data = raw.prepare(&mut StdRng::seed_from_u64(0)).unwrap();
        let scale = data.scale.unwrap();
        assert!((scale[0] - 2.5).abs() < 1e-12);
        assert_eq!(scale[0], scale[1]);
    }

    #[test]
    fn test_subsample_keeps_consistent_rows() {
        let rows: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64, 0.0]).collect();
        let raw = RawDataset {
            row_names: Some((0..20).map(|i| format!("r{}", i)).collect()),
            center: Some(vec![0.0]),
            scale: Some(Scale::Uniform(1.0)),
            subsample: Some(5),
            ..RawDataset::new(rows)
        };
        let data = raw.prepare(&mut StdRng::seed_from_u64(4)).unwrap();
        assert_eq!(data.x.len(), 5);
        let names = data.rownames.unwrap();
        for (row, name) in data.x.iter().zip(&names) {
            assert_eq!(name, &format!("r{}", row[0] as usize));
        }
    }

    #[test]
    fn test_extra_axes_default_names() {
        let raw = RawDataset {
            extra_axes: Some(vec![vec![1.0], vec![1.0]]),
            ..RawDataset::new(vec![vec![1.0, 2.0], vec![3.0, 5.0]])
        };
        let data = raw.prepare(&mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(data.extra_axes_names, Some(strings(&["E1"])));
    }

    fn original_units(data: &TourData) -> Vec<Vec<f64>> {
        let mut rng = StdRng::seed_from_u64(1);
        let cloud = PointCloud::build(data, &mut rng).unwrap();
        cloud
            .build_axes(data)
            .unwrap()
            .iter()
            .map(|axis| axis.proj.iter().map(|&v| axis.to_original_units(v)).collect())
            .collect()
    }

    #[test]
    fn test_extra_axis_matches_variable_axis() {
        let raw = RawDataset {
            scale: Some(Scale::Uniform(2.0)),
            extra_axes: Some(vec![vec![1.0], vec![0.0]]),
            ..RawDataset::new(vec![
                vec![10.0, 1.0],
                vec![14.0, 3.0],
                vec![12.0, 5.0],
                vec![16.0, 7.0],
            ])
        };
        let data = raw.prepare(&mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(data.extra_axes_center, Some(vec![13.0]));

        // Axes: E1, V1, V2
        let values = original_units(&data);
        for (extra, v1) in values[0].iter().zip(&values[1]) {
            assert!((extra - v1).abs() < 1e-12, "extra={} V1={}", extra, v1);
        }
    }

    #[test]
    fn test_extra_axis_with_per_column_scale() {
        let raw = RawDataset {
            scale: Some(Scale::PerColumn(vec![2.0, 4.0])),
            extra_axes: Some(vec![vec![1.0], vec![1.0]]),
            ..RawDataset::new(vec![
                vec![10.0, 1.0],
                vec![14.0, 3.0],
                vec![12.0, 5.0],
                vec![16.0, 7.0],
            ])
        };
        let data = raw.prepare(&mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(data.extra_axes, Some(vec![vec![2.0], vec![4.0]]));

        // E1 = V1 + V2 in original units
        let values = original_units(&data);
        for i in 0..4 {
            let sum = values[1][i] + values[2][i];
            assert!((values[0][i] - sum).abs() < 1e-9, "E1={} sum={}", values[0][i], sum);
        }
    }
}
