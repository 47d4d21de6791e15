//! Environment configuration.
//!
//! The JSON schema mirrors the keys of the driving simulator's parameter
//! dictionary. Every original key is required in a JSON file; keys that only
//! tune the built-in simulation (`accel_action`, `max_speed`, `seed`) fall back
//! to defaults.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::core::{GymError, Result};

/// Representation returned as observation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateSpaceKind {
    /// (x, y, heading) triples for the main car followed by every CPU car.
    Positions,
    /// Rendered grayscale pixels of the screen.
    Image,
}

/// Whether steering is drawn from a discrete set or a continuous interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlSpaceKind {
    Discrete,
    Continuous,
}

/// Surface type of a terrain patch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Material {
    Road,
    Grass,
    Ice,
    Patch,
}

impl Material {
    /// Fraction of the commanded acceleration and steering the surface transmits.
    pub fn grip(self) -> f32 {
        match self {
            Material::Road => 1.0,
            Material::Grass => 0.6,
            Material::Ice => 0.2,
            Material::Patch => 0.8,
        }
    }

    /// Fraction of the global speed limit reachable on the surface.
    pub fn speed_cap(self) -> f32 {
        match self {
            Material::Road => 1.0,
            Material::Grass => 0.5,
            Material::Ice => 1.0,
            Material::Patch => 0.75,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Material::Road => "road",
            Material::Grass => "grass",
            Material::Ice => "ice",
            Material::Patch => "patch",
        }
    }
}

/// `[x, y, width, height, material]`; (x, y) is the patch centre.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerrainParam(pub f32, pub f32, pub f32, pub f32, pub Material);

/// `[low, high, steps]`, expanded like a linspace.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionRange(pub f32, pub f32, pub u32);

impl ActionRange {
    pub fn low(&self) -> f32 { self.0 }
    pub fn high(&self) -> f32 { self.1 }
    pub fn steps(&self) -> u32 { self.2 }

    /// `steps` evenly spaced values from `low` to `high`, both inclusive.
    pub fn values(&self) -> Vec<f32> {
        let (low, high, steps) = (self.0, self.1, self.2);
        match steps {
            0 => Vec::new(),
            1 => vec![low],
            n => {
                let delta = (high - low) / (n - 1) as f32;
                (0..n).map(|i| if i == n - 1 { high } else { low + delta * i as f32 }).collect()
            }
        }
    }
}

fn default_accel_action() -> ActionRange { ActionRange(-1.0, 1.0, 3) }

fn default_max_speed() -> f32 { 20.0 }

/// `Option` field whose key must be present, even if its value is `null`.
fn required_option<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer)
}

/// Full parameter set of a driving environment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrivingConfig {
    pub num_cpu_cars: usize,
    pub main_car_starting_angles: Vec<f32>,
    /// `[[x_min, x_max], [y_min, y_max]]` for CPU car placement.
    pub cpu_cars_bounding_box: [[f32; 2]; 2],
    /// `[width, height]` in pixels.
    pub screen_size: [u32; 2],
    #[serde(deserialize_with = "required_option")]
    pub logging_dir: Option<PathBuf>,
    pub logging_rate: u32,
    pub time_horizon: u32,
    pub terrain_params: Vec<TerrainParam>,
    pub state_space: StateSpaceKind,
    pub control_space: ControlSpaceKind,
    pub steer_action: ActionRange,
    #[serde(default = "default_accel_action")]
    pub accel_action: ActionRange,
    #[serde(default = "default_max_speed")]
    pub max_speed: f32,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for DrivingConfig {
    fn default() -> Self {
        Self {
            num_cpu_cars: 10,
            main_car_starting_angles: ActionRange(-30.0, 30.0, 5).values(),
            cpu_cars_bounding_box: [[100.0, 1000.0], [-90.0, 90.0]],
            screen_size: [512, 512],
            logging_dir: None,
            logging_rate: 10,
            time_horizon: 100,
            terrain_params: vec![
                TerrainParam(0.0, -2000.0, 20000.0, 38000.0, Material::Grass),
                TerrainParam(0.0, 0.0, 20000.0, 200.0, Material::Road),
                TerrainParam(0.0, 2000.0, 20000.0, 3800.0, Material::Grass),
            ],
            state_space: StateSpaceKind::Positions,
            control_space: ControlSpaceKind::Discrete,
            // -15/0/15 reachable through Discrete(3); 30 only through the simulation
            steer_action: ActionRange(-15.0, 30.0, 4),
            accel_action: default_accel_action(),
            max_speed: default_max_speed(),
            seed: None,
        }
    }
}

impl DrivingConfig {
    /// Load and validate a configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let config: DrivingConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: DrivingConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn screen_width(&self) -> u32 { self.screen_size[0] }
    pub fn screen_height(&self) -> u32 { self.screen_size[1] }

    /// Check the invariants the spaces and the simulation rely on.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(GymError::InvalidConfig(msg));

        if self.logging_rate == 0 {
            return invalid("logging_rate must be > 0".into());
        }
        if self.time_horizon == 0 {
            return invalid("time_horizon must be > 0".into());
        }
        if self.screen_size[0] == 0 || self.screen_size[1] == 0 {
            return invalid(format!("screen_size must be positive, got {:?}", self.screen_size));
        }
        if self.main_car_starting_angles.is_empty() {
            return invalid("main_car_starting_angles must not be empty".into());
        }
        if self.main_car_starting_angles.iter().any(|a| !a.is_finite()) {
            return invalid("main_car_starting_angles must be finite".into());
        }
        if self.steer_action.steps() < 2 {
            return invalid(format!("steer_action needs at least 2 steps, got {}", self.steer_action.steps()));
        }
        if !(self.steer_action.low() <= self.steer_action.high()) {
            return invalid(format!(
                "steer_action low {} exceeds high {}",
                self.steer_action.low(),
                self.steer_action.high()
            ));
        }
        if self.accel_action.steps() == 0 || !(self.accel_action.low() <= self.accel_action.high()) {
            return invalid(format!("accel_action is not a valid range: {:?}", self.accel_action));
        }
        for (axis, [lo, hi]) in ["x", "y"].iter().zip(self.cpu_cars_bounding_box.iter()) {
            if !(lo.is_finite() && hi.is_finite()) {
                return invalid(format!("cpu_cars_bounding_box {axis} range [{lo}, {hi}] is not finite"));
            }
            if !(lo <= hi) {
                return invalid(format!("cpu_cars_bounding_box {axis} range [{lo}, {hi}] is inverted"));
            }
        }
        if !(self.max_speed.is_finite() && self.max_speed > 0.0) {
            return invalid(format!("max_speed must be positive, got {}", self.max_speed));
        }
        for (i, TerrainParam(_, _, w, h, _)) in self.terrain_params.iter().enumerate() {
            if !(*w >= 0.0 && *h >= 0.0) {
                return invalid(format!("terrain_params[{i}] has negative extent"));
            }
        }
        Ok(())
    }
}
