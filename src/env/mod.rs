//! The driving environment: configuration, spaces and episode bookkeeping
//! around a delegate [`Simulation`].

pub mod action;

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::{DrivingConfig, StateSpaceKind};
use crate::core::{Env, GymError, Info, RenderFrame, Result, Step};
use crate::sim::{Control, DrivingSimulation, Observation, Rollout, Simulation};
use crate::utils::{Canvas, save_png};

pub use action::{Action, ActionSpace, ObservationSpace, POSITION_HIGH, POSITION_LOW};

/// Second component of every control pair forwarded to the simulation.
pub const ACCEL_INDEX: f32 = 2.0;
/// File, inside the logging directory, that positions are appended to.
pub const LOG_FILE_NAME: &str = "log.txt";

/// Gymnasium-style driving environment.
///
/// Counts episodes (`exp_count`) and steps within the episode (`iter_count`),
/// truncates episodes at `time_horizon` and logs every `logging_rate` steps
/// when a logging directory is configured.
pub struct DrivingEnv<S: Simulation = DrivingSimulation> {
    config: DrivingConfig,
    action_space: ActionSpace,
    observation_space: ObservationSpace,
    exp_count: u32,
    iter_count: u32,
    screen: Canvas,
    simulation: S,
    graphics_mode: bool,
}

impl DrivingEnv<DrivingSimulation> {
    /// Build from a JSON file, or from the default configuration when `None`.
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => {
                info!(path = %path.display(), "loading driving configuration");
                DrivingConfig::from_json_file(path)?
            }
            None => {
                info!("using default driving configuration");
                DrivingConfig::default()
            }
        };
        Self::from_config(config, true)
    }

    pub fn from_config(config: DrivingConfig, graphics_mode: bool) -> Result<Self> {
        config.validate()?;
        let simulation = DrivingSimulation::new(&config, graphics_mode);
        Self::with_simulation(config, simulation, None, graphics_mode)
    }

    /// A fresh environment with the same configuration and graphics mode.
    /// Counters and simulation state are not carried over.
    pub fn respawn(&self) -> Result<Self> {
        Self::from_config(self.config.clone(), self.graphics_mode)
    }
}

impl<S: Simulation> DrivingEnv<S> {
    /// Wrap an arbitrary simulation. When `screen` is `None` a canvas of
    /// `screen_size` is created.
    pub fn with_simulation(
        config: DrivingConfig,
        simulation: S,
        screen: Option<Canvas>,
        graphics_mode: bool,
    ) -> Result<Self> {
        config.validate()?;
        if config.state_space == StateSpaceKind::Image && !graphics_mode {
            return Err(GymError::InvalidConfig("image state space requires graphics mode".into()));
        }
        debug!(?config, graphics_mode, "driving configuration");

        if let Some(dir) = &config.logging_dir {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
                info!(dir = %dir.display(), "created logging directory");
            }
        }

        let screen = screen.unwrap_or_else(|| Canvas::new(config.screen_width(), config.screen_height()));
        Ok(Self {
            action_space: ActionSpace::from_config(&config),
            observation_space: ObservationSpace::from_config(&config),
            exp_count: 0,
            iter_count: 0,
            screen,
            simulation,
            graphics_mode,
            config,
        })
    }

    pub fn config(&self) -> &DrivingConfig { &self.config }
    pub fn action_space(&self) -> &ActionSpace { &self.action_space }
    pub fn observation_space(&self) -> &ObservationSpace { &self.observation_space }

    /// Episodes started so far.
    pub fn exp_count(&self) -> u32 { self.exp_count }

    /// Steps taken in the current episode.
    pub fn iter_count(&self) -> u32 { self.iter_count }

    pub fn screen(&self) -> &Canvas { &self.screen }
    pub fn simulation(&self) -> &S { &self.simulation }
    pub fn graphics_mode(&self) -> bool { self.graphics_mode }

    /// Steering angles the discrete indices refer to.
    pub fn steering_values(&self) -> Vec<f32> { self.config.steer_action.values() }

    /// Persist `observation` for the current episode/step.
    ///
    /// Positions are appended as one line to `log.txt`; image states save the
    /// current screen as `exp_<e>_iter_<i>.png`. A no-op without a logging
    /// directory.
    pub fn log_state(&self, observation: &Observation) -> Result<()> {
        let Some(dir) = self.config.logging_dir.as_deref() else { return Ok(()) };
        let path = match self.config.state_space {
            StateSpaceKind::Positions => {
                let path = dir.join(LOG_FILE_NAME);
                let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
                writeln!(file, "exp={} iter={} {}", self.exp_count, self.iter_count, observation)?;
                path
            }
            StateSpaceKind::Image => {
                let path = dir.join(format!("exp_{}_iter_{}.png", self.exp_count, self.iter_count));
                save_png(&path, &self.screen.to_render_frame())?;
                path
            }
        };
        debug!(path = %path.display(), exp = self.exp_count, iter = self.iter_count, "logged state");
        Ok(())
    }

    /// Look-ahead rollout on the delegate; the live episode is not advanced.
    pub fn simulate_actions(
        &mut self,
        actions: &[Control],
        noise: f32,
        state: Option<&S::State>,
    ) -> Result<Rollout<S::State>> {
        self.simulation.simulate_actions(actions, noise, state)
    }
}

impl<S: Simulation> Env for DrivingEnv<S> {
    type Obs = Observation;
    type Act = Action;

    fn reset(&mut self, seed: Option<u64>) -> Result<(Observation, Info)> {
        self.exp_count += 1;
        self.iter_count = 0;
        self.screen = Canvas::new(self.config.screen_width(), self.config.screen_height());
        let observation = self.simulation.reset(&mut self.screen, seed)?;
        info!(exp = self.exp_count, "episode reset");
        Ok((observation, Info::new()))
    }

    fn step(&mut self, action: Action) -> Result<Step<Observation>> {
        if !self.action_space.contains(&action) {
            warn!(?action, "action outside the action space");
            return Err(GymError::InvalidAction(format!("{action:?} is not in {:?}", self.action_space)));
        }
        self.iter_count += 1;
        let control: Control = [action.value(), ACCEL_INDEX];
        let transition = self.simulation.step(control, &mut self.screen)?;

        if self.config.logging_dir.is_some() && self.iter_count % self.config.logging_rate == 0 {
            self.log_state(&transition.observation)?;
        }
        let truncated = !transition.done && self.iter_count >= self.config.time_horizon;
        Ok(Step::new(transition.observation, transition.reward, transition.done, truncated, transition.info))
    }

    fn render(&self) -> Option<RenderFrame> {
        Some(self.screen.to_render_frame())
    }
}
