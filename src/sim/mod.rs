//! Delegate simulation behind the driving environment.
//!
//! `DrivingEnv` owns the rendering surface and the episode bookkeeping; the
//! physics, rendering and look-ahead rollouts live behind [`Simulation`].

pub mod car;
pub mod terrain;
pub mod world;

use std::fmt;

use crate::core::{Info, Result};
use crate::utils::Canvas;

pub use car::Car;
pub use terrain::{Terrain, TerrainPatch};
pub use world::{DrivingSimulation, WorldState};

/// Control pair forwarded by the environment: `[steering, acceleration index]`.
pub type Control = [f32; 2];

/// What the simulation reports after a reset or a step.
#[derive(Clone, Debug, PartialEq)]
pub enum Observation {
    /// (x, y, heading) triples, main car first.
    Positions(Vec<f32>),
    /// Grayscale pixels indexed `[x][y]`: `data[x * height + y]`.
    Image { width: u32, height: u32, data: Vec<u8> },
}

impl Observation {
    /// Grayscale snapshot of a surface, laid out column by column.
    pub fn image_from_canvas(canvas: &Canvas) -> Self {
        let (w, h) = (canvas.width as usize, canvas.height as usize);
        let rows = canvas.to_grayscale();
        let mut data = vec![0u8; w * h];
        for y in 0..h {
            for x in 0..w {
                data[x * h + y] = rows[y * w + x];
            }
        }
        Observation::Image { width: canvas.width, height: canvas.height, data }
    }

    pub fn as_positions(&self) -> Option<&[f32]> {
        match self {
            Observation::Positions(v) => Some(v),
            Observation::Image { .. } => None,
        }
    }

    pub fn as_image(&self) -> Option<&[u8]> {
        match self {
            Observation::Image { data, .. } => Some(data),
            Observation::Positions(_) => None,
        }
    }

    /// Number of scalar elements.
    pub fn len(&self) -> usize {
        match self {
            Observation::Positions(v) => v.len(),
            Observation::Image { data, .. } => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observation::Positions(values) => {
                for (i, v) in values.iter().enumerate() {
                    if i > 0 { f.write_str(" ")?; }
                    write!(f, "{v:.3}")?;
                }
                Ok(())
            }
            Observation::Image { width, height, .. } => write!(f, "image {width}x{height}"),
        }
    }
}

/// Result of advancing the simulation by one control.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub observation: Observation,
    pub reward: f32,
    pub done: bool,
    pub info: Info,
}

/// Outcome of a look-ahead rollout.
#[derive(Clone, Debug, PartialEq)]
pub struct Rollout<S> {
    pub observations: Vec<Observation>,
    pub rewards: Vec<f32>,
    /// A terminal state was reached before the controls ran out.
    pub done: bool,
    pub final_state: S,
}

impl<S> Rollout<S> {
    pub fn total_reward(&self) -> f32 { self.rewards.iter().sum() }

    /// Number of controls actually applied.
    pub fn len(&self) -> usize { self.rewards.len() }

    pub fn is_empty(&self) -> bool { self.rewards.is_empty() }
}

/// Physics and rendering engine driven by [`crate::DrivingEnv`].
pub trait Simulation {
    /// Snapshot type accepted by [`Simulation::simulate_actions`].
    type State: Clone;

    /// Start a new episode, drawing onto `screen` when graphics are enabled.
    fn reset(&mut self, screen: &mut Canvas, seed: Option<u64>) -> Result<Observation>;

    /// Advance the live simulation by one control.
    fn step(&mut self, control: Control, screen: &mut Canvas) -> Result<Transition>;

    /// Roll `actions` forward from `state` (or the live state) without
    /// touching the live simulation.
    fn simulate_actions(
        &mut self,
        actions: &[Control],
        noise: f32,
        state: Option<&Self::State>,
    ) -> Result<Rollout<Self::State>>;

    /// Copy of the live state.
    fn snapshot(&self) -> Self::State;
}
