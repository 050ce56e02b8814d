//! Headless frame loop

use langevitour_core::{Frame, RawDataset, SessionState, StateUpdate, TourData, TourEngine};
use serde::Serialize;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// What to run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input: PathBuf,
    /// Input is an unprocessed table to center and scale first
    pub raw: bool,
    pub steps: usize,
    pub dt: f64,
    pub seed: u64,
    /// State JSON, inline or `@path`
    pub state: Option<String>,
    pub guide: Option<String>,
    /// Keep every n-th frame in the output; 0 keeps none
    pub record_every: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutput {
    pub steps: usize,
    pub state: SessionState,
    pub projection_in_original_units: Vec<Vec<f64>>,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub frames: Vec<Frame>,
}

pub fn run(config: &RunConfig) -> Result<RunOutput, Box<dyn Error>> {
    let text = fs::read_to_string(&config.input)
        .map_err(|e| format!("cannot read {}: {}", config.input.display(), e))?;

    let mut engine = TourEngine::new(config.seed);
    if config.raw {
        let raw: RawDataset = serde_json::from_str(&text)?;
        engine.render_raw(raw)?;
    } else {
        let data: TourData = serde_json::from_str(&text)?;
        engine.render(data)?;
    }

    if let Some(state) = &config.state {
        engine.set_state(load_state(state)?)?;
    }
    if let Some(guide) = &config.guide {
        engine.set_state(StateUpdate {
            guide_type: Some(guide.clone()),
            ..StateUpdate::default()
        })?;
    }
    if !engine.playing() {
        warn!("state has playing=false, forcing playback");
        engine.set_playing(true);
    }

    info!(steps = config.steps, dt = config.dt, seed = config.seed, "running tour");
    let mut frames = Vec::new();
    for i in 0..config.steps {
        let Some(frame) = engine.step(config.dt) else {
            break;
        };
        if config.record_every > 0 && (i + 1) % config.record_every == 0 {
            debug!(step = i + 1, "recording frame");
            frames.push(frame);
        }
    }

    let projection_in_original_units = engine
        .projection_in_original_units()
        .map(|p| p.to_rows())
        .unwrap_or_default();

    Ok(RunOutput {
        steps: config.steps,
        state: engine.get_state()?,
        projection_in_original_units,
        message: engine.message().to_string(),
        frames,
    })
}

fn load_state(arg: &str) -> Result<StateUpdate, Box<dyn Error>> {
    let json = match arg.strip_prefix('@') {
        Some(path) => {
            fs::read_to_string(path).map_err(|e| format!("cannot read state {}: {}", path, e))?
        }
        None => arg.to_string(),
    };
    Ok(StateUpdate::from_json(&json)?)
}
