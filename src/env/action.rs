//! Action and observation space descriptors derived from a configuration.

use rand::Rng;

use crate::config::{ControlSpaceKind, DrivingConfig, StateSpaceKind};
use crate::sim::Observation;
use crate::spaces::{BoxSpace, Discrete, Space};

/// Lower (x, y, heading) bound of every car in a positions observation.
pub const POSITION_LOW: [f32; 3] = [-10000.0, -10000.0, 0.0];
/// Upper (x, y, heading) bound of every car in a positions observation.
pub const POSITION_HIGH: [f32; 3] = [10000.0, 10000.0, 360.0];

/// A steering command.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Action {
    /// Index into the discrete steering set.
    Index(u32),
    /// Steering angle in degrees for continuous control.
    Steer(f32),
}

impl Action {
    /// Scalar forwarded to the simulation as the steering component.
    pub fn value(self) -> f32 {
        match self {
            Action::Index(i) => i as f32,
            Action::Steer(s) => s,
        }
    }
}

impl From<u32> for Action { fn from(v: u32) -> Self { Action::Index(v) } }
impl From<f32> for Action { fn from(v: f32) -> Self { Action::Steer(v) } }

#[derive(Clone, Debug, PartialEq)]
pub enum ActionSpace {
    Discrete(Discrete),
    Continuous(BoxSpace<f32>),
}

impl ActionSpace {
    /// `Discrete(steps - 1)` over the steering linspace, or a one-element box
    /// spanning `[low, high]`.
    pub fn from_config(config: &DrivingConfig) -> Self {
        let range = config.steer_action;
        match config.control_space {
            ControlSpaceKind::Discrete => ActionSpace::Discrete(Discrete::new(range.values().len() as u32 - 1)),
            ControlSpaceKind::Continuous => ActionSpace::Continuous(BoxSpace::new([range.low()], [range.high()])),
        }
    }

    pub fn contains(&self, action: &Action) -> bool {
        match (self, action) {
            (ActionSpace::Discrete(d), Action::Index(i)) => d.contains(i),
            (ActionSpace::Continuous(b), Action::Steer(s)) => b.contains_scalar(*s),
            _ => false,
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Action {
        match self {
            ActionSpace::Discrete(d) => Action::Index(d.sample(rng)),
            ActionSpace::Continuous(b) => Action::Steer(b.sample(rng)[0]),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ObservationSpace {
    Positions(BoxSpace<f32>),
    Image(BoxSpace<u8>),
}

impl ObservationSpace {
    pub fn from_config(config: &DrivingConfig) -> Self {
        match config.state_space {
            StateSpaceKind::Positions => ObservationSpace::Positions(BoxSpace::tiled(
                &POSITION_LOW,
                &POSITION_HIGH,
                config.num_cpu_cars + 1,
            )),
            StateSpaceKind::Image => {
                let [w, h] = config.screen_size;
                ObservationSpace::Image(BoxSpace::uniform(0, 255, &[w as usize, h as usize]))
            }
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            ObservationSpace::Positions(b) => b.shape(),
            ObservationSpace::Image(b) => b.shape(),
        }
    }

    pub fn contains(&self, observation: &Observation) -> bool {
        match (self, observation) {
            (ObservationSpace::Positions(b), Observation::Positions(v)) => b.contains(v),
            (ObservationSpace::Image(b), Observation::Image { width, height, data }) => {
                b.shape() == [*width as usize, *height as usize] && data.len() == b.len()
            }
            _ => false,
        }
    }
}
