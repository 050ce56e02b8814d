//! Everything between a user's hands and the integrator: control panel
//! values, plot geometry for labels, point tugging and the session
//! snapshot.

mod controls;
mod state;
mod tug;
mod viewport;

pub use controls::{Sliders, ATTRACTION_RANGE, DAMPING_RANGE, GUIDE_RANGE, HEAT_RANGE};
pub use state::{SessionState, StateUpdate, NO_GUIDE};
pub use tug::TugState;
pub use viewport::Viewport;
