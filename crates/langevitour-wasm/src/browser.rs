//! Browser bindings using wasm-bindgen
//!
//! The host constructs a `Tour`, calls `render` with the widget's data,
//! and calls `animate` from `requestAnimationFrame`, drawing whatever
//! frame comes back. Pointer events on labels and points are forwarded
//! in pixel coordinates relative to the plot.

use crate::TourSession;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct Tour {
    session: TourSession,
}

#[wasm_bindgen]
impl Tour {
    /// A fixed `seed` makes the tour reproducible; without one the seed
    /// comes from `Math.random`.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: Option<f64>) -> Tour {
        // Route Rust panics to console.error instead of "RuntimeError: unreachable"
        console_error_panic_hook::set_once();

        let seed = seed.unwrap_or_else(|| js_sys::Math::random() * u32::MAX as f64);
        Tour {
            session: TourSession::new(seed as u64),
        }
    }

    /// Load data. Errors come back as `{"error":...}`.
    pub fn render(&mut self, json: &str) -> String {
        self.session.render(json)
    }

    /// Advance to `now_ms` (the rAF timestamp). `undefined` means skip drawing.
    pub fn animate(&mut self, now_ms: f64, visible: bool) -> Option<String> {
        self.session.animate(now_ms / 1000.0, visible)
    }

    pub fn frame(&self) -> String {
        self.session.frame()
    }

    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> String {
        self.session.get_state()
    }

    #[wasm_bindgen(js_name = setState)]
    pub fn set_state(&mut self, json: &str) -> String {
        self.session.set_state(json)
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.session.resize(width, height);
    }

    pub fn labels(&self) -> String {
        self.session.labels()
    }

    #[wasm_bindgen(js_name = setLabelActive)]
    pub fn set_label_active(&mut self, index: usize, active: bool) -> String {
        self.session.set_label_active(index, active)
    }

    #[wasm_bindgen(js_name = dragLabel)]
    pub fn drag_label(&mut self, index: usize, px: f64, py: f64) -> String {
        self.session.drag_label(index, px, py)
    }

    #[wasm_bindgen(js_name = dropLabel)]
    pub fn drop_label(&mut self) {
        self.session.drop_label();
    }

    #[wasm_bindgen(js_name = beginTug)]
    pub fn begin_tug(&mut self, px: f64, py: f64, radius_px: f64) -> bool {
        self.session.begin_tug(px, py, radius_px)
    }

    #[wasm_bindgen(js_name = moveTug)]
    pub fn move_tug(&mut self, px: f64, py: f64) {
        self.session.move_tug(px, py);
    }

    #[wasm_bindgen(js_name = endTug)]
    pub fn end_tug(&mut self) {
        self.session.end_tug();
    }

    /// Projection in original data units, for the info box.
    #[wasm_bindgen(js_name = projectionInOriginalUnits)]
    pub fn projection_in_original_units(&self) -> String {
        self.session.projection_in_original_units()
    }
}
