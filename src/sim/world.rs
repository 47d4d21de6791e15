use rand::Rng;
use tracing::debug;

use crate::config::{ControlSpaceKind, DrivingConfig, Material, StateSpaceKind};
use crate::core::{GymError, Info, InfoValue, Result};
use crate::sim::car::Car;
use crate::sim::terrain::Terrain;
use crate::sim::{Control, Observation, Rollout, Simulation, Transition};
use crate::utils::render2d::{Canvas, Color, BLACK, BLUE, DARK_GRAY, GREEN, ICE_BLUE, RED, SAND};
use crate::utils::rng::{entropy_seed, RngStream, SeedSequence};

/// Reward for hitting a CPU car; the episode terminates.
pub const COLLISION_REWARD: f32 = -10.0;
/// Reward for a step that ends off the road.
pub const OFF_ROAD_REWARD: f32 = -1.0;
/// Attempts made to place a CPU car without overlapping another car.
const MAX_PLACEMENT_ATTEMPTS: usize = 20;

/// Positions of every car in the world.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldState {
    pub main_car: Car,
    pub cpu_cars: Vec<Car>,
}

impl WorldState {
    /// Flattened (x, y, heading) triples, main car first.
    pub fn positions(&self) -> Vec<f32> {
        std::iter::once(&self.main_car)
            .chain(self.cpu_cars.iter())
            .flat_map(|c| c.pose())
            .collect()
    }
}

struct Outcome {
    reward: f32,
    collided: bool,
    material: Material,
}

/// Built-in top-down driving simulation: one controlled car among CPU cars
/// cruising straight ahead on layered terrain.
pub struct DrivingSimulation {
    config: DrivingConfig,
    terrain: Terrain,
    steer_values: Vec<f32>,
    accel_values: Vec<f32>,
    graphics_mode: bool,
    state: WorldState,
    placement_rng: RngStream,
    noise_rng: RngStream,
}

impl DrivingSimulation {
    pub fn new(config: &DrivingConfig, graphics_mode: bool) -> Self {
        let seed = config.seed.unwrap_or_else(entropy_seed);
        let mut seeds = SeedSequence::new(seed);
        Self {
            terrain: Terrain::from_params(&config.terrain_params),
            steer_values: config.steer_action.values(),
            accel_values: config.accel_action.values(),
            graphics_mode,
            state: WorldState { main_car: Car::new(0.0, 0.0, 0.0, 0.0), cpu_cars: Vec::new() },
            placement_rng: seeds.next_rng(),
            noise_rng: seeds.next_rng(),
            config: config.clone(),
        }
    }

    pub fn terrain(&self) -> &Terrain { &self.terrain }

    pub fn state(&self) -> &WorldState { &self.state }

    fn reseed(&mut self, seed: u64) {
        let mut seeds = SeedSequence::new(seed);
        self.placement_rng = seeds.next_rng();
        self.noise_rng = seeds.next_rng();
    }

    fn spawn(&mut self) -> WorldState {
        let angles = &self.config.main_car_starting_angles;
        let angle = angles[self.placement_rng.gen_range(0..angles.len())];
        let main_car = Car::new(0.0, 0.0, angle, 0.0);

        let [[x_lo, x_hi], [y_lo, y_hi]] = self.config.cpu_cars_bounding_box;
        let top_speed = self.config.max_speed / 2.0;
        let mut cpu_cars: Vec<Car> = Vec::with_capacity(self.config.num_cpu_cars);
        for _ in 0..self.config.num_cpu_cars {
            let mut car = Car::new(0.0, 0.0, 0.0, 0.0);
            for _ in 0..MAX_PLACEMENT_ATTEMPTS {
                let x = self.placement_rng.gen_range(x_lo..=x_hi);
                let y = self.placement_rng.gen_range(y_lo..=y_hi);
                let speed = self.placement_rng.gen_range(0.0..=top_speed);
                car = Car::new(x, y, 0.0, speed);
                let clear = !car.collides_with(&main_car) && cpu_cars.iter().all(|c| !car.collides_with(c));
                if clear { break; }
            }
            cpu_cars.push(car);
        }
        WorldState { main_car, cpu_cars }
    }

    /// Map the forwarded control pair onto (steering degrees, acceleration).
    fn resolve_control(&self, control: Control) -> Result<(f32, f32)> {
        let [steer, accel_index] = control;
        let steer = match self.config.control_space {
            ControlSpaceKind::Discrete => {
                if !(steer >= 0.0) {
                    return Err(GymError::InvalidAction(format!("negative steering index {steer}")));
                }
                let index = steer.round() as usize;
                *self.steer_values.get(index).ok_or_else(|| {
                    GymError::InvalidAction(format!(
                        "steering index {index} out of range for {} values",
                        self.steer_values.len()
                    ))
                })?
            }
            ControlSpaceKind::Continuous => {
                steer.clamp(self.config.steer_action.low(), self.config.steer_action.high())
            }
        };
        let last = self.accel_values.len().saturating_sub(1);
        let index = if accel_index.is_finite() { accel_index.round().clamp(0.0, last as f32) as usize } else { 0 };
        Ok((steer, self.accel_values[index]))
    }

    fn advance(&self, world: &mut WorldState, steer: f32, accel: f32) -> Outcome {
        let max_speed = self.config.max_speed;
        let material = self.terrain.material_at(world.main_car.x, world.main_car.y);
        world.main_car.drive(steer, accel, material, max_speed);
        for car in world.cpu_cars.iter_mut() {
            car.advance();
        }

        let collided = world.cpu_cars.iter().any(|c| world.main_car.collides_with(c));
        let material = self.terrain.material_at(world.main_car.x, world.main_car.y);
        let reward = if collided {
            COLLISION_REWARD
        } else if material != Material::Road {
            OFF_ROAD_REWARD
        } else {
            world.main_car.speed / max_speed
        };
        Outcome { reward, collided, material }
    }

    fn observe(&self, world: &WorldState, screen: &mut Canvas) -> Result<Observation> {
        match self.config.state_space {
            StateSpaceKind::Positions => Ok(Observation::Positions(world.positions())),
            StateSpaceKind::Image if self.graphics_mode => {
                self.draw(world, screen);
                Ok(Observation::image_from_canvas(screen))
            }
            StateSpaceKind::Image => Err(GymError::NotSupported(
                "image observations require graphics mode".into(),
            )),
        }
    }

    fn present(&self, screen: &mut Canvas) -> Result<Observation> {
        if self.graphics_mode && self.config.state_space == StateSpaceKind::Positions {
            self.draw(&self.state, screen);
        }
        self.observe(&self.state, screen)
    }

    /// Draw terrain and cars with the camera centred on the main car.
    pub fn draw(&self, world: &WorldState, screen: &mut Canvas) {
        let (cx, cy) = (world.main_car.x, world.main_car.y);
        let (half_w, half_h) = (screen.width as f32 / 2.0, screen.height as f32 / 2.0);
        let to_screen = |x: f32, y: f32| (x - cx + half_w, y - cy + half_h);

        screen.clear(material_color(Terrain::BACKGROUND));
        for patch in self.terrain.patches() {
            let (l, t, r, b) = patch.bounds();
            let (sl, st) = to_screen(l, t);
            let (sr, sb) = to_screen(r, b);
            screen.fill_rect(sl as i32, st as i32, (sr - sl) as i32, (sb - st) as i32, material_color(patch.material));
        }
        for (car, color) in world.cpu_cars.iter().map(|c| (c, RED)).chain(std::iter::once((&world.main_car, BLUE))) {
            let outline: Vec<(f32, f32)> = car.corners().iter().map(|&(x, y)| to_screen(x, y)).collect();
            screen.fill_polygon(&outline, color);
            screen.draw_polygon(&outline, BLACK);
        }
    }
}

fn material_color(material: Material) -> Color {
    match material {
        Material::Road => DARK_GRAY,
        Material::Grass => GREEN,
        Material::Ice => ICE_BLUE,
        Material::Patch => SAND,
    }
}

impl Simulation for DrivingSimulation {
    type State = WorldState;

    fn reset(&mut self, screen: &mut Canvas, seed: Option<u64>) -> Result<Observation> {
        if let Some(s) = seed { self.reseed(s); }
        self.state = self.spawn();
        debug!(
            cpu_cars = self.state.cpu_cars.len(),
            heading = self.state.main_car.angle,
            "simulation reset"
        );
        self.present(screen)
    }

    fn step(&mut self, control: Control, screen: &mut Canvas) -> Result<Transition> {
        let (steer, accel) = self.resolve_control(control)?;
        let mut world = self.state.clone();
        let outcome = self.advance(&mut world, steer, accel);
        self.state = world;

        let mut info = Info::new();
        info.insert("terrain", InfoValue::from(outcome.material.as_str()));
        info.insert("collided", InfoValue::from(outcome.collided));
        info.insert("speed", InfoValue::from(self.state.main_car.speed));

        Ok(Transition {
            observation: self.present(screen)?,
            reward: outcome.reward,
            done: outcome.collided,
            info,
        })
    }

    fn simulate_actions(
        &mut self,
        actions: &[Control],
        noise: f32,
        state: Option<&WorldState>,
    ) -> Result<Rollout<WorldState>> {
        if !(noise.is_finite() && noise >= 0.0) {
            return Err(GymError::InvalidAction(format!("noise must be finite and non-negative, got {noise}")));
        }
        let mut world = state.cloned().unwrap_or_else(|| self.state.clone());
        let mut scratch = Canvas::new(self.config.screen_width(), self.config.screen_height());
        let mut rollout = Rollout { observations: Vec::new(), rewards: Vec::new(), done: false, final_state: world.clone() };

        for &control in actions {
            let (steer, accel) = self.resolve_control(control)?;
            let steer = if noise > 0.0 { steer + self.noise_rng.gen_range(-noise..=noise) } else { steer };
            let outcome = self.advance(&mut world, steer, accel);
            rollout.observations.push(self.observe(&world, &mut scratch)?);
            rollout.rewards.push(outcome.reward);
            if outcome.collided {
                rollout.done = true;
                break;
            }
        }
        rollout.final_state = world;
        Ok(rollout)
    }

    fn snapshot(&self) -> WorldState { self.state.clone() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ActionRange, TerrainParam};

    fn config(cpu_cars: usize) -> DrivingConfig {
        DrivingConfig { num_cpu_cars: cpu_cars, seed: Some(7), screen_size: [64, 64], ..DrivingConfig::default() }
    }

    fn canvas(c: &DrivingConfig) -> Canvas { Canvas::new(c.screen_width(), c.screen_height()) }

    #[test]
    fn reset_places_cars_inside_bounding_box() {
        let c = config(5);
        let mut sim = DrivingSimulation::new(&c, false);
        let obs = sim.reset(&mut canvas(&c), None).unwrap();
        assert_eq!(obs.len(), 3 * 6);
        let state = sim.snapshot();
        assert!(c.main_car_starting_angles.iter().any(|&a| crate::sim::car::normalize_angle(a) == state.main_car.angle));
        for car in &state.cpu_cars {
            assert!((100.0..=1000.0).contains(&car.x));
            assert!((-90.0..=90.0).contains(&car.y));
            assert!(car.speed <= c.max_speed / 2.0);
        }
    }

    #[test]
    fn same_seed_same_layout() {
        let c = config(4);
        let mut a = DrivingSimulation::new(&c, false);
        let mut b = DrivingSimulation::new(&c, false);
        let oa = a.reset(&mut canvas(&c), Some(11)).unwrap();
        let ob = b.reset(&mut canvas(&c), Some(11)).unwrap();
        assert_eq!(oa, ob);
    }

    #[test]
    fn discrete_index_out_of_range_is_rejected() {
        let c = config(0);
        let mut sim = DrivingSimulation::new(&c, false);
        sim.reset(&mut canvas(&c), None).unwrap();
        let err = sim.step([4.0, 2.0], &mut canvas(&c)).unwrap_err();
        assert!(matches!(err, GymError::InvalidAction(_)));
        assert!(sim.step([3.0, 2.0], &mut canvas(&c)).is_ok());
    }

    #[test]
    fn accelerating_on_the_road_earns_speed_reward() {
        let c = DrivingConfig { main_car_starting_angles: vec![0.0], ..config(0) };
        let mut sim = DrivingSimulation::new(&c, false);
        let mut screen = canvas(&c);
        sim.reset(&mut screen, None).unwrap();
        let t = sim.step([1.0, 2.0], &mut screen).unwrap();
        assert!(!t.done);
        assert!((t.reward - 1.0 / c.max_speed).abs() < 1e-6);
        assert_eq!(t.info.get("terrain"), Some(&InfoValue::Str("road".into())));
    }

    #[test]
    fn leaving_the_road_is_penalised() {
        let c = DrivingConfig {
            main_car_starting_angles: vec![0.0],
            terrain_params: vec![TerrainParam(0.0, 0.0, 1.0, 1.0, Material::Road)],
            ..config(0)
        };
        let mut sim = DrivingSimulation::new(&c, false);
        let mut screen = canvas(&c);
        sim.reset(&mut screen, None).unwrap();
        let t = sim.step([1.0, 2.0], &mut screen).unwrap();
        assert_eq!(t.reward, OFF_ROAD_REWARD);
    }

    #[test]
    fn collision_terminates_with_penalty() {
        let c = DrivingConfig {
            main_car_starting_angles: vec![0.0],
            cpu_cars_bounding_box: [[30.0, 30.0], [0.0, 0.0]],
            max_speed: 1.0,
            ..config(1)
        };
        let mut sim = DrivingSimulation::new(&c, false);
        let mut screen = canvas(&c);
        sim.reset(&mut screen, None).unwrap();
        let t = sim.step([1.0, 0.0], &mut screen).unwrap();
        assert!(t.done);
        assert_eq!(t.reward, COLLISION_REWARD);
        assert_eq!(t.info.get("collided"), Some(&InfoValue::Bool(true)));
    }

    #[test]
    fn continuous_steering_is_clamped() {
        let c = DrivingConfig {
            control_space: ControlSpaceKind::Continuous,
            steer_action: ActionRange(-15.0, 15.0, 4),
            ..config(0)
        };
        let sim = DrivingSimulation::new(&c, false);
        assert_eq!(sim.resolve_control([40.0, 2.0]).unwrap(), (15.0, 1.0));
        assert_eq!(sim.resolve_control([-3.5, 0.0]).unwrap(), (-3.5, -1.0));
        assert_eq!(sim.resolve_control([0.0, 99.0]).unwrap().1, 1.0);
    }

    #[test]
    fn rollouts_leave_live_state_untouched() {
        let c = config(3);
        let mut sim = DrivingSimulation::new(&c, false);
        sim.reset(&mut canvas(&c), None).unwrap();
        let before = sim.snapshot();
        let rollout = sim.simulate_actions(&[[1.0, 2.0]; 5], 0.5, None).unwrap();
        assert_eq!(sim.snapshot(), before);
        assert!(!rollout.is_empty() && rollout.len() <= 5);
        assert_eq!(rollout.observations.len(), rollout.rewards.len());
    }

    #[test]
    fn rollout_from_explicit_state_is_deterministic_without_noise() {
        let c = config(2);
        let mut sim = DrivingSimulation::new(&c, false);
        sim.reset(&mut canvas(&c), None).unwrap();
        let start = sim.snapshot();
        let a = sim.simulate_actions(&[[0.0, 2.0], [2.0, 1.0]], 0.0, Some(&start)).unwrap();
        let b = sim.simulate_actions(&[[0.0, 2.0], [2.0, 1.0]], 0.0, Some(&start)).unwrap();
        assert_eq!(a, b);
        assert!(sim.simulate_actions(&[[0.0, 2.0]], -1.0, None).is_err());
    }

    #[test]
    fn non_finite_noise_is_an_error() {
        let c = config(1);
        let mut sim = DrivingSimulation::new(&c, false);
        sim.reset(&mut canvas(&c), None).unwrap();
        for noise in [f32::INFINITY, f32::NAN] {
            let err = sim.simulate_actions(&[[1.0, 2.0]], noise, None).unwrap_err();
            assert!(matches!(err, GymError::InvalidAction(_)), "noise {noise}: {err:?}");
        }
    }

    #[test]
    fn image_state_renders_main_car_at_centre() {
        let c = DrivingConfig { state_space: StateSpaceKind::Image, ..config(0) };
        let mut sim = DrivingSimulation::new(&c, true);
        let mut screen = canvas(&c);
        let obs = sim.reset(&mut screen, None).unwrap();
        assert_eq!(obs.len(), 64 * 64);
        assert_eq!(screen.pixel(32, 32), Some(BLUE));

        let mut headless = DrivingSimulation::new(&c, false);
        assert!(matches!(headless.reset(&mut canvas(&c), None), Err(GymError::NotSupported(_))));
    }
}
