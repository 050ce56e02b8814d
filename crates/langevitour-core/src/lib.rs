//! Langevitour Core Engine
//!
//! A Langevin tour animates a 2D projection of high-dimensional data. The
//! projection is a point on the Stiefel manifold St(2, m) moving under
//! damping, thermal noise, an optional guide potential, attraction toward
//! labels the user drops into the plot, and removal of deactivated axes.
//!
//! This crate is the computational kernel with no UI attached; it runs the
//! same natively and in the browser (WASM).
//!
//! # Example
//!
//! ```rust
//! use langevitour_core::{RawDataset, TourEngine};
//!
//! let rows: Vec<Vec<f64>> = (0..50)
//!     .map(|i| {
//!         let t = i as f64 / 50.0;
//!         vec![t, t * t, (6.0 * t).sin(), 1.0 - t]
//!     })
//!     .collect();
//!
//! let mut engine = TourEngine::new(42);
//! engine.render_raw(RawDataset::new(rows)).unwrap();
//! engine.set_state_json(r#"{"guideType": "pca"}"#).unwrap();
//!
//! let frame = engine.step(1.0 / 60.0).unwrap();
//! assert_eq!(frame.xy[0].len(), 50);
//! ```

pub mod advisory;
pub mod clock;
pub mod dataset;
pub mod dynamics;
pub mod engine;
pub mod error;
pub mod guide;
pub mod interaction;
pub mod linalg;
pub mod manifold;

// Re-export main types at crate root
pub use advisory::Advisory;
pub use clock::FrameClock;
pub use dataset::{as_factor, Axis, Label, LabelKind, PointCloud, RawDataset, Scale, TourData};
pub use dynamics::{Attractor, ControlState, Dynamics, Forces, StepReport, Tug};
pub use engine::{EngineConfig, Frame, TourEngine};
pub use error::{Result, TourError};
pub use guide::GuideKind;
pub use interaction::{SessionState, Sliders, StateUpdate, TugState, Viewport};
pub use linalg::Matrix;
