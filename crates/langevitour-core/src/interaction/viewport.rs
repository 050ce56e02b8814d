//! Pixel geometry of the plot and label area

use crate::dataset::Label;
use serde::{Deserialize, Serialize};

/// Blank border around the plot, pixels
const MARGIN: f64 = 2.5;

/// Vertical spacing of parked labels, pixels
const LABEL_ROW_HEIGHT: f64 = 25.0;

/// Approximate rendered width of one label character, pixels
const LABEL_CHAR_WIDTH: f64 = 7.0;

/// Square plot of side `size` at the left of a widget `width` wide. The
/// strip to the right of the plot holds parked labels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub size: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::fit(700.0, 600.0, 100.0)
    }
}

impl Viewport {
    /// Lay out a widget of the given size with `control_height` pixels
    /// reserved below the plot for controls.
    pub fn fit(width: f64, height: f64, control_height: f64) -> Self {
        let width = width.max(200.0);
        let height = height.max(200.0);
        let size = (width - 100.0).min(height - control_height).max(100.0);
        Self { width, size }
    }

    /// Tour x coordinate to pixels
    pub fn to_px_x(&self, x: f64) -> f64 {
        MARGIN + (x + 1.0) * 0.5 * (self.size - 2.0 * MARGIN)
    }

    /// Tour y coordinate to pixels, with y up
    pub fn to_px_y(&self, y: f64) -> f64 {
        self.size - MARGIN - (y + 1.0) * 0.5 * (self.size - 2.0 * MARGIN)
    }

    pub fn invert_x(&self, px: f64) -> f64 {
        (px - MARGIN) / (self.size - 2.0 * MARGIN) * 2.0 - 1.0
    }

    pub fn invert_y(&self, px: f64) -> f64 {
        (self.size - MARGIN - px) / (self.size - 2.0 * MARGIN) * 2.0 - 1.0
    }

    /// Keep a label position within the widget.
    pub fn clamp_label(&self, x: f64, y: f64) -> (f64, f64) {
        // A widget narrower than the plot margin leaves no room right of -1
        let max_x = self.invert_x(self.width).max(-1.0);
        let x = if x.is_nan() { 1.0 } else { x.clamp(-1.0, max_x) };
        let y = if y.is_nan() { 0.0 } else { y.clamp(-1.0, 1.0) };
        (x, y)
    }

    /// Move every parked label (`x >= 1`) into a grid to the right of the
    /// plot. A label keeps its grid slot, given by its index, whatever the
    /// other labels are doing.
    pub fn park_labels(&self, labels: &mut [Label]) {
        if labels.is_empty() {
            return;
        }
        let per_column = (self.size - 40.0).max(1.0);
        let cols = ((LABEL_ROW_HEIGHT * labels.len() as f64) / per_column)
            .ceil()
            .max(1.0) as usize;
        let column_width = (self.width - self.size - 10.0) / cols as f64;

        for (i, label) in labels.iter_mut().enumerate() {
            if !label.is_parked() {
                continue;
            }
            let (col, row) = (i % cols, i / cols);
            let half_width = label_half_width(&label.name);
            label.x = self.invert_x(self.size + 10.0 + half_width + col as f64 * column_width);
            label.y = self.invert_y(20.0 + row as f64 * LABEL_ROW_HEIGHT);
        }
    }
}

fn label_half_width(name: &str) -> f64 {
    name.chars().count() as f64 * LABEL_CHAR_WIDTH / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::LabelKind;

    fn viewport() -> Viewport {
        Viewport {
            width: 600.0,
            size: 400.0,
        }
    }

    #[test]
    fn test_scale_endpoints() {
        let v = viewport();
        assert_eq!(v.to_px_x(-1.0), 2.5);
        assert_eq!(v.to_px_x(1.0), 397.5);
        assert_eq!(v.to_px_y(1.0), 2.5);
        assert_eq!(v.to_px_y(-1.0), 397.5);
        assert!((v.invert_x(v.to_px_x(0.3)) - 0.3).abs() < 1e-12);
        assert!((v.invert_y(v.to_px_y(-0.7)) + 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_fit_respects_minimums() {
        let v = Viewport::fit(50.0, 50.0, 80.0);
        assert_eq!(v.width, 200.0);
        assert_eq!(v.size, 100.0);
        let v = Viewport::fit(800.0, 500.0, 100.0);
        assert_eq!(v.size, 400.0);
    }

    #[test]
    fn test_clamp_label_bounds() {
        let v = viewport();
        let (x, y) = v.clamp_label(10.0, -3.0);
        assert!((x - v.invert_x(600.0)).abs() < 1e-12);
        assert_eq!(y, -1.0);
        assert_eq!(v.clamp_label(-2.0, 0.5), (-1.0, 0.5));
    }

    #[test]
    fn test_clamp_label_in_degenerate_widget() {
        let v = Viewport {
            width: 1.0,
            size: 400.0,
        };
        assert_eq!(v.clamp_label(0.5, 0.5), (-1.0, 0.5));
        assert_eq!(v.clamp_label(-3.0, 2.0), (-1.0, 1.0));
    }

    #[test]
    fn test_parks_only_labels_outside_plot() {
        let v = viewport();
        let mut labels = vec![
            Label::new(LabelKind::Axis(0), "a".into(), vec![1.0, 0.0]),
            Label::new(LabelKind::Axis(1), "b".into(), vec![0.0, 1.0]),
        ];
        labels[1].x = 0.5;
        labels[1].y = 0.25;
        v.park_labels(&mut labels);

        assert!(labels[0].x > 1.0);
        assert!((v.to_px_y(labels[0].y) - 20.0).abs() < 1e-9);
        assert_eq!((labels[1].x, labels[1].y), (0.5, 0.25));
    }
}
