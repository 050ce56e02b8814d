//! The tour engine: owns a loaded dataset and everything that moves
//!
//! A host creates one [`TourEngine`], hands it data with
//! [`TourEngine::render`], then calls [`TourEngine::step`] once per frame
//! and draws the returned [`Frame`]. Labels, tugging and the control
//! panel are driven through the methods here; the whole session can be
//! saved and restored with [`TourEngine::get_state`] and
//! [`TourEngine::set_state`].

use crate::dataset::{Axis, Label, LabelKind, PointCloud, RawDataset, TourData};
use crate::dynamics::{Attractor, Dynamics, Forces, Tug};
use crate::error::{Result, TourError};
use crate::guide::GuideKind;
use crate::interaction::{SessionState, Sliders, StateUpdate, TugState, Viewport, NO_GUIDE};
use crate::linalg::{self, Matrix};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

/// What a host needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    /// 2 x m
    pub proj: Vec<Vec<f64>>,
    /// 2 x n projected points, internal order
    pub xy: Vec<Vec<f64>>,
    /// Projected unit vector of each axis
    pub axis_coords: Vec<[f64; 2]>,
    pub point_active: Vec<bool>,
    /// Links whose endpoints are both active
    pub links: Vec<(usize, usize)>,
    pub message: String,
}

/// Everything that exists only while data is loaded
#[derive(Debug, Clone)]
struct Scene {
    cloud: PointCloud,
    axes: Vec<Axis>,
    labels: Vec<Label>,
    /// Per-variable scale back to original units
    scale: Vec<f64>,
    dynamics: Dynamics,
    /// Internal order
    selection: Option<Vec<bool>>,
    /// Internal order
    filter: Option<Vec<bool>>,
    tug: Option<TugState>,
    dragging: Option<usize>,
}

impl Scene {
    fn level_active(&self) -> Vec<bool> {
        let levels = self
            .labels
            .iter()
            .filter(|l| matches!(l.kind, LabelKind::Group(_)))
            .count();
        let mut active = vec![true; levels];
        for label in &self.labels {
            if let LabelKind::Group(g) = label.kind {
                active[g] = label.active;
            }
        }
        active
    }

    fn point_active(&self) -> Vec<bool> {
        let level_active = self.level_active();
        (0..self.cloud.n())
            .map(|i| {
                let by_group = level_active
                    .get(self.cloud.group(i))
                    .copied()
                    .unwrap_or(true);
                let by_filter = self.filter.as_ref().map_or(true, |f| f[i]);
                by_group && by_filter
            })
            .collect()
    }

    fn check_label(&self, index: usize) -> Result<()> {
        if index < self.labels.len() {
            Ok(())
        } else {
            Err(TourError::LabelOutOfRange {
                index,
                count: self.labels.len(),
            })
        }
    }
}

/// Engine settings that outlive a dataset
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub viewport: Viewport,
    pub playing: bool,
    pub axes_on: bool,
    pub sliders: Sliders,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            playing: true,
            axes_on: true,
            sliders: Sliders::default(),
        }
    }
}

#[derive(Debug)]
pub struct TourEngine {
    config: EngineConfig,
    rng: StdRng,
    scene: Option<Scene>,
    message: String,
}

impl TourEngine {
    /// Engine with a fixed seed: the same inputs give the same tour.
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, EngineConfig::default())
    }

    pub fn with_config(seed: u64, config: EngineConfig) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
            scene: None,
            message: String::new(),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            config: EngineConfig::default(),
            rng: StdRng::from_entropy(),
            scene: None,
            message: String::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.scene.is_some()
    }

    /// Load new data. The projection restarts at the canonical frame;
    /// control values carry over from the previous data.
    pub fn render(&mut self, data: TourData) -> Result<()> {
        let cloud = PointCloud::build(&data, &mut self.rng)?;
        let axes = cloud.build_axes(&data)?;
        let mut labels = cloud.build_labels(&data.levels, &axes);
        self.config.viewport.park_labels(&mut labels);

        let scene = Scene {
            scale: data.scale.clone().unwrap_or_else(|| vec![1.0; cloud.m()]),
            dynamics: Dynamics::new(cloud.m()),
            cloud,
            axes,
            labels,
            selection: None,
            filter: None,
            tug: None,
            dragging: None,
        };
        info!(
            n = scene.cloud.n(),
            m = scene.cloud.m(),
            axes = scene.axes.len(),
            labels = scene.labels.len(),
            "data loaded"
        );

        let previous = self.scene.replace(scene);
        self.message.clear();
        if let Some(state) = data.state {
            if let Err(e) = self.set_state(state) {
                self.scene = previous;
                return Err(e);
            }
        }
        Ok(())
    }

    /// Prepare a raw table (centering, scaling, factor coding) and load it.
    pub fn render_raw(&mut self, raw: RawDataset) -> Result<()> {
        let data = raw.prepare(&mut self.rng)?;
        self.render(data)
    }

    pub fn render_json(&mut self, json: &str) -> Result<()> {
        let data: TourData = serde_json::from_str(json)?;
        self.render(data)
    }

    /// Advance by `dt` seconds and return the new frame. While paused the
    /// projection does not move. `None` before any data is loaded.
    pub fn step(&mut self, dt: f64) -> Option<Frame> {
        if self.config.playing {
            self.advance(dt)?;
        }
        self.frame()
    }

    fn advance(&mut self, dt: f64) -> Option<()> {
        let scene = self.scene.as_mut()?;
        let controls = self
            .config
            .sliders
            .to_controls(scene.dragging.is_some());

        let level_active = scene.level_active();
        let point_active = scene.point_active();
        let points: Vec<&[f64]> = (0..scene.cloud.n())
            .filter(|&i| point_active[i])
            .map(|i| scene.cloud.point(i))
            .collect();

        // Labels of removed groups do not attract
        let attractors: Vec<Attractor<'_>> = scene
            .labels
            .iter()
            .filter(|l| match l.kind {
                LabelKind::Group(g) => level_active[g],
                LabelKind::Axis(_) => true,
            })
            .map(|l| Attractor {
                vec: &l.vec,
                x: l.x,
                y: l.y,
            })
            .collect();

        let nuked: Vec<&[f64]> = scene
            .labels
            .iter()
            .filter_map(|l| match l.kind {
                LabelKind::Axis(a) if !l.active => Some(scene.axes[a].unit.as_slice()),
                _ => None,
            })
            .collect();

        let tug = scene.tug.as_ref().map(|t| Tug {
            centroid: &t.centroid,
            target: t.target,
        });

        let forces = Forces {
            points: &points,
            attractors: &attractors,
            nuked: &nuked,
            tug,
        };
        let report = scene
            .dynamics
            .step(dt, &controls, &forces, &mut self.rng);
        trace!(dt = report.dt, active = points.len(), "step");

        let message = report.message();
        if message != self.message {
            if message.is_empty() {
                debug!("advisories cleared");
            } else {
                warn!(%message, "advisory");
            }
            self.message = message;
        }
        Some(())
    }

    /// The current view without advancing.
    pub fn frame(&self) -> Option<Frame> {
        let scene = self.scene.as_ref()?;
        let proj = scene.dynamics.proj();
        let x = scene.cloud.matrix();
        let xy: Vec<Vec<f64>> = (0..2)
            .map(|j| x.iter_rows().map(|row| linalg::dot(proj.row(j), row)).collect())
            .collect();
        let point_active = scene.point_active();
        let links = scene
            .cloud
            .links()
            .iter()
            .copied()
            .filter(|&(a, b)| point_active[a] && point_active[b])
            .collect();

        Some(Frame {
            proj: proj.to_rows(),
            xy,
            axis_coords: scene.axes.iter().map(|a| a.projected(proj)).collect(),
            point_active,
            links,
            message: self.message.clone(),
        })
    }

    /// Latest advisory text, empty when all is well
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn playing(&self) -> bool {
        self.config.playing
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.config.playing = playing;
    }

    pub fn sliders(&self) -> &Sliders {
        &self.config.sliders
    }

    pub fn set_sliders(&mut self, mut sliders: Sliders) {
        sliders.clamp();
        self.config.sliders = sliders;
    }

    pub fn viewport(&self) -> Viewport {
        self.config.viewport
    }

    /// Change the plot geometry and re-park labels to fit.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.config.viewport = viewport;
        if let Some(scene) = self.scene.as_mut() {
            for label in &mut scene.labels {
                let (x, y) = viewport.clamp_label(label.x, label.y);
                label.x = x;
                label.y = y;
            }
            viewport.park_labels(&mut scene.labels);
        }
    }

    pub fn axes(&self) -> &[Axis] {
        match &self.scene {
            Some(scene) => &scene.axes,
            None => &[],
        }
    }

    pub fn labels(&self) -> &[Label] {
        match &self.scene {
            Some(scene) => &scene.labels,
            None => &[],
        }
    }

    pub fn label_index(&self, name: &str) -> Option<usize> {
        self.labels().iter().position(|l| l.name == name)
    }

    /// Check or uncheck a label: removes its group, or nukes its axis.
    pub fn set_label_active(&mut self, index: usize, active: bool) -> Result<()> {
        let scene = self.scene.as_mut().ok_or(TourError::NoData)?;
        scene.check_label(index)?;
        scene.labels[index].active = active;
        Ok(())
    }

    /// Move a label, clamped to the widget.
    pub fn set_label_position(&mut self, index: usize, x: f64, y: f64) -> Result<()> {
        let viewport = self.config.viewport;
        let scene = self.scene.as_mut().ok_or(TourError::NoData)?;
        scene.check_label(index)?;
        let (x, y) = viewport.clamp_label(x, y);
        scene.labels[index].x = x;
        scene.labels[index].y = y;
        Ok(())
    }

    /// Start dragging a label. Damping is raised until the drag ends.
    pub fn begin_label_drag(&mut self, index: usize) -> Result<()> {
        let scene = self.scene.as_mut().ok_or(TourError::NoData)?;
        scene.check_label(index)?;
        scene.dragging = Some(index);
        Ok(())
    }

    /// Finish a drag; a label dropped outside the plot goes back to its slot.
    pub fn end_label_drag(&mut self) {
        let viewport = self.config.viewport;
        if let Some(scene) = self.scene.as_mut() {
            scene.dragging = None;
            viewport.park_labels(&mut scene.labels);
        }
    }

    /// Grab active points within `radius` of `pointer` (tour coordinates).
    /// Returns whether anything was grabbed.
    pub fn begin_tug(&mut self, pointer: [f64; 2], radius: f64) -> bool {
        let Some(scene) = self.scene.as_mut() else {
            return false;
        };
        let active = scene.point_active();
        scene.tug = TugState::grab(
            scene.cloud.matrix(),
            scene.dynamics.proj(),
            &active,
            pointer,
            radius,
        );
        if let Some(tug) = &scene.tug {
            debug!(points = tug.points.len(), "tug started");
        }
        scene.tug.is_some()
    }

    pub fn move_tug(&mut self, pointer: [f64; 2]) {
        if let Some(tug) = self.scene.as_mut().and_then(|s| s.tug.as_mut()) {
            tug.move_to(pointer);
        }
    }

    pub fn end_tug(&mut self) {
        if let Some(scene) = self.scene.as_mut() {
            scene.tug = None;
        }
    }

    pub fn tugged_points(&self) -> &[usize] {
        match self.scene.as_ref().and_then(|s| s.tug.as_ref()) {
            Some(tug) => &tug.points,
            None => &[],
        }
    }

    pub fn projection(&self) -> Option<&Matrix> {
        self.scene.as_ref().map(|s| s.dynamics.proj())
    }

    /// The matrix taking original (uncentered, unscaled) data to the view,
    /// up to a translation: `proj[j][i] / scale[i]`.
    pub fn projection_in_original_units(&self) -> Option<Matrix> {
        let scene = self.scene.as_ref()?;
        let proj = scene.dynamics.proj();
        let mut out = proj.clone();
        for j in 0..2 {
            for (v, s) in out.row_mut(j).iter_mut().zip(&scene.scale) {
                *v /= s;
            }
        }
        Some(out)
    }

    /// Snapshot of the whole session.
    pub fn get_state(&self) -> Result<SessionState> {
        let scene = self.scene.as_ref().ok_or(TourError::NoData)?;
        let sliders = &self.config.sliders;
        Ok(SessionState {
            playing: self.config.playing,
            axes_on: self.config.axes_on,
            damping: sliders.damping,
            heat: sliders.heat,
            heat_on: sliders.heat_on,
            guide_type: sliders
                .guide_type
                .map_or(NO_GUIDE, GuideKind::as_str)
                .to_string(),
            guide: sliders.guide,
            label_attraction_on: sliders.label_attraction_on,
            label_attraction: sliders.label_attraction,
            label_inactive: scene
                .labels
                .iter()
                .filter(|l| !l.active)
                .map(|l| l.name.clone())
                .collect(),
            label_pos: scene
                .labels
                .iter()
                .filter(|l| !l.is_parked())
                .map(|l| (l.name.clone(), [l.x, l.y]))
                .collect(),
            projection: scene.dynamics.proj().to_rows(),
            selection: scene
                .selection
                .as_ref()
                .map(|s| scene.cloud.mask_to_original(s)),
            filter: scene
                .filter
                .as_ref()
                .map(|f| scene.cloud.mask_to_original(f)),
        })
    }

    pub fn get_state_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.get_state()?)?)
    }

    /// Apply a partial state. Fields that are absent stay as they are.
    /// Nothing changes if any field is invalid.
    pub fn set_state(&mut self, update: StateUpdate) -> Result<()> {
        let guide_type = update
            .guide_type()
            .map(GuideKind::parse_selection)
            .transpose()?;

        let touches_scene = update.label_inactive.is_some()
            || update.label_pos.is_some()
            || update.projection.is_some()
            || update.selection.is_some()
            || update.filter.is_some();

        let mut pending = None;
        if touches_scene {
            let scene = self.scene.as_ref().ok_or(TourError::NoData)?;
            let projection = match &update.projection {
                Some(rows) => {
                    let p = Matrix::from_rows(rows.clone())?;
                    let m = scene.cloud.m();
                    if p.rows() != 2 || p.cols() != m {
                        return Err(TourError::ProjectionShape {
                            expected: m,
                            rows: p.rows(),
                            cols: p.cols(),
                        });
                    }
                    Some(p)
                }
                None => None,
            };
            let selection = translate_mask(&scene.cloud, &update.selection)?;
            let filter = translate_mask(&scene.cloud, &update.filter)?;
            pending = Some((projection, selection, filter));
        }

        let config = &mut self.config;
        if let Some(v) = update.playing {
            config.playing = v;
        }
        if let Some(v) = update.axes_on {
            config.axes_on = v;
        }
        let sliders = &mut config.sliders;
        if let Some(v) = update.damping {
            sliders.damping = v;
        }
        if let Some(v) = update.heat {
            sliders.heat = v;
        }
        if let Some(v) = update.heat_on {
            sliders.heat_on = v;
        }
        if let Some(v) = guide_type {
            sliders.guide_type = v;
        }
        if let Some(v) = update.guide() {
            sliders.guide = v;
        }
        if let Some(v) = update.label_attraction_on {
            sliders.label_attraction_on = v;
        }
        if let Some(v) = update.label_attraction {
            sliders.label_attraction = v;
        }
        sliders.clamp();

        let (Some(scene), Some((projection, selection, filter))) = (self.scene.as_mut(), pending)
        else {
            return Ok(());
        };

        if let Some(inactive) = &update.label_inactive {
            for label in &mut scene.labels {
                label.active = !inactive.contains(&label.name);
            }
        }
        if let Some(positions) = &update.label_pos {
            let viewport = config.viewport;
            for label in &mut scene.labels {
                match positions.get(&label.name) {
                    Some(&[x, y]) => {
                        let (x, y) = viewport.clamp_label(x, y);
                        label.x = x;
                        label.y = y;
                    }
                    None => label.x = 1.0,
                }
            }
            viewport.park_labels(&mut scene.labels);
        }
        if let Some(p) = projection {
            scene.dynamics.set_projection(&p);
        }
        if let Some(s) = selection {
            scene.selection = s;
        }
        if let Some(f) = filter {
            scene.filter = f;
        }
        debug!("state applied");
        Ok(())
    }

    pub fn set_state_json(&mut self, json: &str) -> Result<()> {
        self.set_state(StateUpdate::from_json(json)?)
    }
}

/// Validate and permute an optional mask update.
fn translate_mask(
    cloud: &PointCloud,
    mask: &Option<Option<Vec<bool>>>,
) -> Result<Option<Option<Vec<bool>>>> {
    match mask {
        None => Ok(None),
        Some(None) => Ok(Some(None)),
        Some(Some(m)) => Ok(Some(Some(cloud.mask_to_internal(m)?))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> TourData {
        TourData {
            x: vec![
                vec![0.5, 0.0, 0.0],
                vec![0.0, 0.5, 0.0],
                vec![0.0, 0.0, 0.5],
                vec![-0.5, 0.0, 0.0],
            ],
            colnames: vec!["a".into(), "b".into(), "c".into()],
            group: vec![0, 0, 1, 1],
            levels: vec!["g0".into(), "g1".into()],
            line_from: Some(vec![0, 1]),
            line_to: Some(vec![2, 3]),
            ..TourData::default()
        }
    }

    fn loaded() -> TourEngine {
        let mut engine = TourEngine::new(1);
        engine.render(data()).unwrap();
        engine
    }

    #[test]
    fn test_nothing_before_render() {
        let mut engine = TourEngine::new(0);
        assert!(engine.step(0.1).is_none());
        assert_eq!(engine.get_state().unwrap_err(), TourError::NoData);
        assert!(!engine.begin_tug([0.0, 0.0], 1.0));
    }

    #[test]
    fn test_sliders_apply_without_data() {
        let mut engine = TourEngine::new(0);
        engine
            .set_state_json(r#"{"damping": 1, "guideType": "pca"}"#)
            .unwrap();
        assert_eq!(engine.sliders().damping, 1.0);
        assert_eq!(engine.sliders().guide_type, Some(GuideKind::Pca));
        assert_eq!(
            engine.set_state_json(r#"{"labelInactive": []}"#).unwrap_err(),
            TourError::NoData
        );
    }

    #[test]
    fn test_labels_groups_then_axes() {
        let engine = loaded();
        let names: Vec<&str> = engine.labels().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["g0", "g1", "a", "b", "c"]);
        assert!(engine.labels().iter().all(Label::is_parked));
    }

    #[test]
    fn test_frame_shapes() {
        let mut engine = loaded();
        let frame = engine.step(0.02).unwrap();
        assert_eq!(frame.proj.len(), 2);
        assert_eq!(frame.xy.len(), 2);
        assert_eq!(frame.xy[0].len(), 4);
        assert_eq!(frame.axis_coords.len(), 3);
        assert_eq!(frame.point_active, vec![true; 4]);
        assert_eq!(frame.links.len(), 2);
    }

    #[test]
    fn test_inactive_group_hides_points_and_links() {
        let mut engine = loaded();
        engine.set_label_active(1, false).unwrap();
        let frame = engine.frame().unwrap();
        let hidden = frame.point_active.iter().filter(|a| !**a).count();
        assert_eq!(hidden, 2);
        // every link touches group 1
        assert!(frame.links.is_empty());
    }

    #[test]
    fn test_filter_in_original_order() {
        let mut engine = loaded();
        engine
            .set_state_json(r#"{"filter": [true, false, true, true]}"#)
            .unwrap();
        let state = engine.get_state().unwrap();
        assert_eq!(state.filter, Some(vec![true, false, true, true]));
        assert_eq!(state.selection, None);

        let frame = engine.frame().unwrap();
        assert_eq!(frame.point_active.iter().filter(|a| !**a).count(), 1);

        engine.set_state_json(r#"{"filter": null}"#).unwrap();
        assert_eq!(engine.get_state().unwrap().filter, None);
    }

    #[test]
    fn test_bad_update_changes_nothing() {
        let mut engine = loaded();
        let err = engine
            .set_state_json(r#"{"damping": 2, "selection": [true]}"#)
            .unwrap_err();
        assert!(matches!(err, TourError::LengthMismatch { .. }));
        assert_eq!(engine.sliders().damping, 0.0);

        let err = engine
            .set_state_json(r#"{"projection": [[1, 0], [0, 1]]}"#)
            .unwrap_err();
        assert_eq!(
            err,
            TourError::ProjectionShape {
                expected: 3,
                rows: 2,
                cols: 2
            }
        );

        assert!(matches!(
            engine.set_state_json(r#"{"guideType": "spiral"}"#),
            Err(TourError::UnknownGuide(_))
        ));
    }

    #[test]
    fn test_label_pos_parks_unnamed_labels() {
        let mut engine = loaded();
        engine
            .set_state_json(r#"{"labelPos": {"a": [0.5, 0.5]}}"#)
            .unwrap();
        engine
            .set_state_json(r#"{"labelPos": {"b": [-0.5, 0.25]}}"#)
            .unwrap();
        let state = engine.get_state().unwrap();
        assert_eq!(state.label_pos.len(), 1);
        assert_eq!(state.label_pos["b"], [-0.5, 0.25]);
    }

    #[test]
    fn test_paused_engine_does_not_move() {
        let mut engine = loaded();
        engine.set_playing(false);
        engine
            .set_state_json(r#"{"heat": 3, "guideType": "outlier"}"#)
            .unwrap();
        let before = engine.projection().unwrap().clone();
        for _ in 0..10 {
            engine.step(0.05);
        }
        assert_eq!(engine.projection().unwrap(), &before);
    }

    #[test]
    fn test_original_units_divide_by_scale() {
        let mut engine = TourEngine::new(3);
        engine
            .render(TourData {
                scale: Some(vec![2.0, 4.0, 1.0]),
                ..data()
            })
            .unwrap();
        let p = engine.projection_in_original_units().unwrap();
        assert_eq!(p.row(0), &[0.5, 0.0, 0.0]);
        assert_eq!(p.row(1), &[0.0, 0.25, 0.0]);
    }

    #[test]
    fn test_render_applies_embedded_state() {
        let mut engine = TourEngine::new(0);
        let mut d = data();
        d.state = Some(StateUpdate {
            label_inactive: Some(vec!["c".into()]),
            heat_on: Some(false),
            ..StateUpdate::default()
        });
        engine.render(d).unwrap();
        let state = engine.get_state().unwrap();
        assert_eq!(state.label_inactive, vec!["c".to_string()]);
        assert!(!state.heat_on);
    }

    #[test]
    fn test_tug_grabs_and_releases() {
        let mut engine = loaded();
        // Point (0.5, 0, 0) sits at (0.5, 0) in the canonical frame
        assert!(engine.begin_tug([0.5, 0.0], 0.1));
        assert_eq!(engine.tugged_points().len(), 1);
        engine.move_tug([0.5, 0.3]);
        engine.end_tug();
        assert!(engine.tugged_points().is_empty());
        assert!(!engine.begin_tug([-0.9, 0.9], 0.05));
    }
}
