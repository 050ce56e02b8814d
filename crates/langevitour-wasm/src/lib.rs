//! Langevitour WASM bridge
//!
//! Wraps a [`TourEngine`] and a [`FrameClock`] behind a string-in,
//! string-out API so a JavaScript host only ever exchanges JSON. The
//! `browser` feature adds the `wasm-bindgen` handle in [`browser`].
//!
//! Failures come back as `{"error":"description"}`, the same shape for
//! every call.

use langevitour_core::{FrameClock, TourEngine, Viewport};
use serde::Serialize;
use tracing::debug;

#[cfg(feature = "browser")]
pub mod browser;

/// Pixels reserved below the plot for the control panel
pub const DEFAULT_CONTROL_HEIGHT: f64 = 100.0;

#[derive(Serialize)]
struct ErrorReply<'a> {
    error: &'a str,
}

/// JSON error envelope
pub fn error_json(message: &str) -> String {
    serde_json::to_string(&ErrorReply { error: message })
        .unwrap_or_else(|_| String::from(r#"{"error":"unserializable error"}"#))
}

fn reply<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| error_json(&e.to_string()))
}

/// One widget instance: engine, frame clock and plot geometry.
#[derive(Debug)]
pub struct TourSession {
    engine: TourEngine,
    clock: FrameClock,
}

impl TourSession {
    pub fn new(seed: u64) -> Self {
        Self {
            engine: TourEngine::new(seed),
            clock: FrameClock::new(),
        }
    }

    pub fn engine(&self) -> &TourEngine {
        &self.engine
    }

    /// Load `TourData` JSON. Returns `"{}"` or an error envelope.
    pub fn render(&mut self, json: &str) -> String {
        match self.engine.render_json(json) {
            Ok(()) => {
                debug!(labels = self.engine.labels().len(), "rendered");
                String::from("{}")
            }
            Err(e) => error_json(&e.to_string()),
        }
    }

    /// Called from the animation callback. Returns the frame to draw, or
    /// `None` when nothing should be drawn (hidden, paused, no data).
    pub fn animate(&mut self, now_seconds: f64, visible: bool) -> Option<String> {
        self.clock.set_paused(!self.engine.playing());
        let dt = self.clock.tick(now_seconds, visible)?;
        let frame = self.engine.step(dt)?;
        Some(reply(&frame))
    }

    /// The current frame without advancing, e.g. after a resize.
    pub fn frame(&self) -> String {
        match self.engine.frame() {
            Some(frame) => reply(&frame),
            None => error_json("no data loaded"),
        }
    }

    pub fn get_state(&self) -> String {
        match self.engine.get_state() {
            Ok(state) => reply(&state),
            Err(e) => error_json(&e.to_string()),
        }
    }

    pub fn set_state(&mut self, json: &str) -> String {
        match self.engine.set_state_json(json) {
            Ok(()) => String::from("{}"),
            Err(e) => error_json(&e.to_string()),
        }
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.engine
            .set_viewport(Viewport::fit(width, height, DEFAULT_CONTROL_HEIGHT));
    }

    /// Labels with their current positions, for laying out the overlay.
    pub fn labels(&self) -> String {
        reply(&self.engine.labels())
    }

    pub fn set_label_active(&mut self, index: usize, active: bool) -> String {
        match self.engine.set_label_active(index, active) {
            Ok(()) => String::from("{}"),
            Err(e) => error_json(&e.to_string()),
        }
    }

    /// Drag a label to pixel position (`px`, `py`).
    pub fn drag_label(&mut self, index: usize, px: f64, py: f64) -> String {
        let viewport = self.engine.viewport();
        let result = self
            .engine
            .begin_label_drag(index)
            .and_then(|()| {
                self.engine
                    .set_label_position(index, viewport.invert_x(px), viewport.invert_y(py))
            });
        match result {
            Ok(()) => String::from("{}"),
            Err(e) => error_json(&e.to_string()),
        }
    }

    pub fn drop_label(&mut self) {
        self.engine.end_label_drag();
    }

    /// Grab points near pixel position (`px`, `py`). Returns whether
    /// anything was grabbed.
    pub fn begin_tug(&mut self, px: f64, py: f64, radius_px: f64) -> bool {
        let viewport = self.engine.viewport();
        let pointer = [viewport.invert_x(px), viewport.invert_y(py)];
        // Pixel radius to tour units
        let radius = radius_px * 2.0 / (viewport.size - 5.0);
        self.engine.begin_tug(pointer, radius)
    }

    pub fn move_tug(&mut self, px: f64, py: f64) {
        let viewport = self.engine.viewport();
        self.engine
            .move_tug([viewport.invert_x(px), viewport.invert_y(py)]);
    }

    pub fn end_tug(&mut self) {
        self.engine.end_tug();
    }

    /// Projection mapping original data units to the view, as JSON rows.
    pub fn projection_in_original_units(&self) -> String {
        match self.engine.projection_in_original_units() {
            Some(p) => reply(&p.to_rows()),
            None => error_json("no data loaded"),
        }
    }
}
