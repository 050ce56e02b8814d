//! Render input, point cloud, axes and labels
//!
//! [`TourData`] is what a host sends on each render (the JSON field names
//! match the widget protocol). [`PointCloud::build`] turns it into the
//! session's shuffled point storage, the [`Axis`] list and the draggable
//! [`Label`]s. [`RawDataset`] is an optional front door that centers,
//! scales and codes an untidy table first.

mod cloud;
mod prepare;

pub use cloud::{Axis, Label, LabelKind, PointCloud, PARKED_X};
pub use prepare::{as_factor, RawDataset, Scale, DEFAULT_SCALE_FACTOR};

use crate::interaction::StateUpdate;
use serde::{Deserialize, Serialize};

/// Per-render input.
///
/// `x` is expected to be centered and scaled already, so that the data
/// mostly falls within the unit disc under any projection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourData {
    /// n x m, row-major
    #[serde(rename = "X")]
    pub x: Vec<Vec<f64>>,
    pub colnames: Vec<String>,
    /// Group code for each row, indexing `levels`
    pub group: Vec<usize>,
    pub levels: Vec<String>,
    /// Restores original units: `original = x * scale + center`
    #[serde(default)]
    pub center: Option<Vec<f64>>,
    #[serde(default)]
    pub scale: Option<Vec<f64>>,
    #[serde(default)]
    pub rownames: Option<Vec<String>>,
    /// m x e, one column per extra axis
    #[serde(default)]
    pub extra_axes: Option<Vec<Vec<f64>>>,
    #[serde(default)]
    pub extra_axes_center: Option<Vec<f64>>,
    #[serde(default)]
    pub extra_axes_names: Option<Vec<String>>,
    /// Cosmetic point-pair connections, original row indices
    #[serde(default)]
    pub line_from: Option<Vec<usize>>,
    #[serde(default)]
    pub line_to: Option<Vec<usize>>,
    /// State to apply after loading
    #[serde(default)]
    pub state: Option<StateUpdate>,
}
