//! Slider positions and their physical meaning

use crate::dynamics::ControlState;
use crate::guide::GuideKind;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const DAMPING_RANGE: RangeInclusive<f64> = -3.0..=3.0;
pub const HEAT_RANGE: RangeInclusive<f64> = -2.0..=4.0;
pub const GUIDE_RANGE: RangeInclusive<f64> = -2.0..=2.0;
pub const ATTRACTION_RANGE: RangeInclusive<f64> = -3.0..=1.0;

/// Control panel values, sliders on a log10 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sliders {
    pub damping: f64,
    pub heat: f64,
    pub heat_on: bool,
    pub guide_type: Option<GuideKind>,
    pub guide: f64,
    pub label_attraction_on: bool,
    pub label_attraction: f64,
}

impl Default for Sliders {
    fn default() -> Self {
        Self {
            damping: 0.0,
            heat: 0.0,
            heat_on: true,
            guide_type: None,
            guide: 0.0,
            label_attraction_on: true,
            label_attraction: 0.0,
        }
    }
}

impl Sliders {
    /// Pin every slider into its range. NaN goes back to the default.
    pub fn clamp(&mut self) {
        self.damping = clamp_slider(self.damping, DAMPING_RANGE);
        self.heat = clamp_slider(self.heat, HEAT_RANGE);
        self.guide = clamp_slider(self.guide, GUIDE_RANGE);
        self.label_attraction = clamp_slider(self.label_attraction, ATTRACTION_RANGE);
    }

    pub fn damping_value(&self) -> f64 {
        0.1 * 10f64.powf(self.damping)
    }

    pub fn heat_value(&self) -> f64 {
        0.1 * 10f64.powf(self.heat)
    }

    pub fn guide_value(&self) -> f64 {
        10f64.powf(self.guide)
    }

    pub fn attraction_value(&self) -> f64 {
        10f64.powf(self.label_attraction)
    }

    pub fn to_controls(&self, label_dragging: bool) -> ControlState {
        ControlState {
            damping: self.damping_value(),
            heat: self.heat_value(),
            heat_on: self.heat_on,
            guide: self.guide_type,
            guide_strength: self.guide_value(),
            label_attraction_on: self.label_attraction_on,
            label_attraction: self.attraction_value(),
            label_dragging,
        }
    }
}

fn clamp_slider(value: f64, range: RangeInclusive<f64>) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(*range.start(), *range.end())
    }
}
