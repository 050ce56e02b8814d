//! Grabbing points with the pointer

use crate::linalg::{self, Matrix};

/// Points held by the pointer and where they should go.
#[derive(Debug, Clone, PartialEq)]
pub struct TugState {
    /// Internal indices of the held points
    pub points: Vec<usize>,
    /// Mean of the held points in data space
    pub centroid: Vec<f64>,
    /// Target position of the centroid, tour coordinates
    pub target: [f64; 2],
    /// Last pointer position
    anchor: [f64; 2],
}

impl TugState {
    /// Select active points within `radius` of `pointer` under projection
    /// `proj`. The target starts where the centroid currently is, so
    /// grabbing alone moves nothing. `None` when nothing is in reach.
    pub fn grab(
        x: &Matrix,
        proj: &Matrix,
        active: &[bool],
        pointer: [f64; 2],
        radius: f64,
    ) -> Option<Self> {
        let r2 = radius * radius;
        let points: Vec<usize> = x
            .iter_rows()
            .enumerate()
            .filter(|(i, _)| active[*i])
            .filter(|(_, row)| {
                let dx = linalg::dot(proj.row(0), row) - pointer[0];
                let dy = linalg::dot(proj.row(1), row) - pointer[1];
                dx * dx + dy * dy <= r2
            })
            .map(|(i, _)| i)
            .collect();

        if points.is_empty() {
            return None;
        }

        let mut centroid = vec![0.0; x.cols()];
        for &i in &points {
            linalg::axpy(&mut centroid, 1.0, x.row(i));
        }
        let centroid = linalg::scale(&centroid, 1.0 / points.len() as f64);
        let target = [
            linalg::dot(proj.row(0), &centroid),
            linalg::dot(proj.row(1), &centroid),
        ];

        Some(Self {
            points,
            centroid,
            target,
            anchor: pointer,
        })
    }

    /// Follow the pointer, keeping the offset between pointer and target.
    pub fn move_to(&mut self, pointer: [f64; 2]) {
        self.target[0] += pointer[0] - self.anchor[0];
        self.target[1] += pointer[1] - self.anchor[1];
        self.anchor = pointer;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Matrix {
        Matrix::from_rows(vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]).unwrap()
    }

    fn points() -> Matrix {
        Matrix::from_rows(vec![
            vec![0.0, 0.0, 1.0],
            vec![0.1, 0.0, 3.0],
            vec![0.8, 0.8, 0.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_grabs_points_in_radius() {
        let tug = TugState::grab(&points(), &frame(), &[true; 3], [0.0, 0.0], 0.2).unwrap();
        assert_eq!(tug.points, vec![0, 1]);
        assert_eq!(tug.centroid, vec![0.05, 0.0, 2.0]);
        assert_eq!(tug.target, [0.05, 0.0]);
    }

    #[test]
    fn test_skips_inactive_and_distant() {
        assert_eq!(
            TugState::grab(&points(), &frame(), &[false, false, true], [0.0, 0.0], 0.2),
            None
        );
        assert_eq!(
            TugState::grab(&points(), &frame(), &[true; 3], [-0.9, -0.9], 0.1),
            None
        );
    }

    #[test]
    fn test_target_follows_pointer() {
        let mut tug = TugState::grab(&points(), &frame(), &[true; 3], [0.8, 0.8], 0.1).unwrap();
        tug.move_to([0.6, 0.8]);
        tug.move_to([0.5, 0.9]);
        assert!((tug.target[0] - 0.5).abs() < 1e-12);
        assert!((tug.target[1] - 0.9).abs() < 1e-12);
    }
}
