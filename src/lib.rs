//! A 2D top-down driving simulator exposed as a Gymnasium-style environment.
//!
//! ```no_run
//! use gym_driving::{Action, DrivingEnv, Env};
//!
//! let mut env = DrivingEnv::new(None)?;
//! let (_obs, _info) = env.reset(Some(0))?;
//! loop {
//!     let step = env.step(Action::Index(1))?;
//!     if step.done() { break; }
//! }
//! # Ok::<(), gym_driving::GymError>(())
//! ```

pub mod core;
pub mod config;
pub mod spaces;
pub mod utils;
pub mod sim;
pub mod env;
pub mod wrappers;

pub use crate::core::{Env, GymError, Info, InfoValue, RenderFrame, Result, Step};
pub use crate::config::{ActionRange, ControlSpaceKind, DrivingConfig, Material, StateSpaceKind, TerrainParam};
pub use crate::spaces::{BoxSpace, Discrete, Space};
pub use crate::sim::{Car, Control, DrivingSimulation, Observation, Rollout, Simulation, Terrain, Transition, WorldState};
pub use crate::env::{Action, ActionSpace, DrivingEnv, ObservationSpace};
pub use crate::wrappers::RecordEpisodeStatistics;
pub use crate::utils::{encode_png, save_png, Canvas};

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_config() -> DrivingConfig {
        DrivingConfig { num_cpu_cars: 3, seed: Some(1), screen_size: [96, 64], ..DrivingConfig::default() }
    }

    #[test]
    fn default_env_runs_to_horizon() {
        let mut env = DrivingEnv::from_config(DrivingConfig { time_horizon: 15, ..quiet_config() }, false).unwrap();
        let (obs, _info) = env.reset(None).unwrap();
        assert!(env.observation_space().contains(&obs));
        let mut steps = 0;
        loop {
            let s = env.step(Action::Index(1)).unwrap();
            steps += 1;
            if s.done() { break; }
        }
        assert!(steps <= 15);
    }

    #[test]
    fn render_returns_screen_pixels() {
        let mut env = DrivingEnv::from_config(quiet_config(), true).unwrap();
        env.reset(None).unwrap();
        let frame = env.render();
        assert!(matches!(frame, Some(RenderFrame::Pixels { width: 96, height: 64, .. })));
    }

    #[test]
    fn respawn_keeps_configuration_but_not_counters() {
        let mut env = DrivingEnv::from_config(quiet_config(), false).unwrap();
        env.reset(None).unwrap();
        let copy = env.respawn().unwrap();
        assert_eq!(copy.config(), env.config());
        assert_eq!(copy.exp_count(), 0);
        assert_eq!(env.exp_count(), 1);
    }

    #[test]
    fn statistics_wrapper_reports_truncated_episodes() {
        let env = DrivingEnv::from_config(DrivingConfig { num_cpu_cars: 0, time_horizon: 4, ..quiet_config() }, false).unwrap();
        let mut env = RecordEpisodeStatistics::new(env);
        env.reset(None).unwrap();
        let mut last = None;
        for _ in 0..4 {
            last = Some(env.step(Action::Index(1)).unwrap());
        }
        let last = last.unwrap();
        assert!(last.truncated);
        assert_eq!(last.info.get("episode_length"), Some(&InfoValue::I64(4)));
    }
}
