use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use gym_driving::{
    Action, ControlSpaceKind, DrivingConfig, DrivingEnv, Env, GymError, Observation, StateSpaceKind,
};

static NEXT_DIR: AtomicUsize = AtomicUsize::new(0);

/// Fresh, not-yet-existing directory under the system temp dir.
fn scratch_dir(tag: &str) -> PathBuf {
    let n = NEXT_DIR.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!("gym-driving-{tag}-{}-{n}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir
}

fn open_road(logging_dir: Option<PathBuf>) -> DrivingConfig {
    DrivingConfig {
        num_cpu_cars: 0,
        screen_size: [48, 32],
        logging_dir,
        logging_rate: 3,
        time_horizon: 10,
        seed: Some(42),
        ..DrivingConfig::default()
    }
}

#[test]
fn default_construction_declares_discrete_positions_env() {
    let env = DrivingEnv::new(None).unwrap();
    assert_eq!(env.observation_space().shape(), &[3 * 11]);
    assert_eq!(env.steering_values().len(), 4);
    assert_eq!(env.exp_count(), 0);
    assert_eq!(env.iter_count(), 0);
}

#[test]
fn loads_configuration_from_json_file() {
    let dir = scratch_dir("json");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.json");
    let config = DrivingConfig { control_space: ControlSpaceKind::Continuous, ..open_road(None) };
    fs::write(&path, config.to_json_pretty().unwrap()).unwrap();

    let mut env = DrivingEnv::new(Some(&path)).unwrap();
    assert_eq!(env.config(), &config);
    env.reset(None).unwrap();
    assert!(env.step(Action::Steer(-7.5)).is_ok());
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn malformed_or_missing_files_propagate_errors() {
    let dir = scratch_dir("bad");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.json");
    fs::write(&path, "{ not json").unwrap();
    assert!(matches!(DrivingEnv::new(Some(&path)), Err(GymError::Json(_))));
    assert!(matches!(DrivingEnv::new(Some(&dir.join("absent.json"))), Err(GymError::Io(_))));
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn reset_increments_episode_and_zeroes_steps() {
    let mut env = DrivingEnv::from_config(open_road(None), false).unwrap();
    for expected in 1..=3 {
        let before = env.exp_count();
        env.reset(None).unwrap();
        assert_eq!(env.exp_count(), before + 1);
        assert_eq!(env.exp_count(), expected);
        assert_eq!(env.iter_count(), 0);
        env.step(Action::Index(1)).unwrap();
    }
}

#[test]
fn episode_is_done_at_time_horizon() {
    let mut env = DrivingEnv::from_config(open_road(None), false).unwrap();
    env.reset(None).unwrap();
    for i in 1..=10 {
        let step = env.step(Action::Index(1)).unwrap();
        assert_eq!(step.done(), i == 10, "step {i}");
    }
}

#[test]
fn positions_are_appended_every_logging_rate_steps() {
    let dir = scratch_dir("positions");
    let mut env = DrivingEnv::from_config(open_road(Some(dir.clone())), false).unwrap();
    assert!(dir.is_dir());
    env.reset(None).unwrap();

    let log = dir.join("log.txt");
    let lines = |p: &PathBuf| fs::read_to_string(p).map(|s| s.lines().count()).unwrap_or(0);
    for i in 1..=7u32 {
        let before = lines(&log);
        env.step(Action::Index(1)).unwrap();
        let expected = if i % 3 == 0 { before + 1 } else { before };
        assert_eq!(lines(&log), expected, "step {i}");
    }
    let contents = fs::read_to_string(&log).unwrap();
    assert!(contents.lines().next().unwrap().starts_with("exp=1 iter=3 "));
    fs::remove_dir_all(&dir).unwrap();
}

#[cfg(feature = "image")]
#[test]
fn image_states_save_one_png_per_logged_step() {
    let dir = scratch_dir("images");
    let config = DrivingConfig { state_space: StateSpaceKind::Image, ..open_road(Some(dir.clone())) };
    let mut env = DrivingEnv::from_config(config, true).unwrap();
    let (obs, _info) = env.reset(None).unwrap();
    assert!(matches!(obs, Observation::Image { width: 48, height: 32, .. }));

    for _ in 0..6 {
        env.step(Action::Index(0)).unwrap();
    }
    let mut files: Vec<String> = fs::read_dir(&dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    files.sort();
    assert_eq!(files, vec!["exp_1_iter_3.png".to_string(), "exp_1_iter_6.png".to_string()]);
    let bytes = fs::read(dir.join("exp_1_iter_3.png")).unwrap();
    assert_eq!(&bytes[..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn look_ahead_does_not_advance_the_episode() {
    let mut env = DrivingEnv::from_config(open_road(None), false).unwrap();
    env.reset(None).unwrap();
    let before = env.simulation().state().clone();
    let rollout = env.simulate_actions(&[[1.0, 2.0]; 6], 1.0, None).unwrap();
    assert_eq!(rollout.len(), 6);
    assert!(!rollout.done);
    assert_eq!(env.iter_count(), 0);
    assert_eq!(env.simulation().state(), &before);
}

#[test]
fn same_seed_reproduces_an_episode() {
    let config = DrivingConfig { num_cpu_cars: 5, ..open_road(None) };
    let run = || {
        let mut env = DrivingEnv::from_config(config.clone(), false).unwrap();
        let (first, _) = env.reset(Some(9)).unwrap();
        let mut rewards = Vec::new();
        for a in [0u32, 1, 2, 1, 1] {
            let s = env.step(Action::Index(a)).unwrap();
            rewards.push(s.reward);
            if s.done() { break; }
        }
        (first, rewards)
    };
    assert_eq!(run(), run());
}
