use burn::config::Config;
use log::warn;
use rand::rngs::StdRng;

use crate::{
    common::{
        errors::Result,
        spaces::{BoxSpace, Discrete, Space},
        utils::{generate_random_vector, seeded_rng},
    },
    env::{
        base::{Env, EnvObservation, EnvSpec, RewardRange},
        render::{render_header, track_line, RenderMode},
    },
};

pub(crate) const MIN_POSITION: f32 = -1.2;
pub(crate) const MAX_POSITION: f32 = 0.6;
pub(crate) const MAX_SPEED: f32 = 0.07;
const GRAVITY: f32 = 0.0025;

/// One step of the valley dynamics shared by both mountain car variants.
///
/// The velocity is clamped before it moves the car; hitting the left wall pins
/// the car there and kills its velocity.
pub(crate) fn valley_step(position: f32, velocity: f32, push: f32) -> (f32, f32) {
    let mut v = velocity + push - GRAVITY * (3.0 * position).cos();
    v = v.clamp(-MAX_SPEED, MAX_SPEED);

    let mut p = position + v;
    if p < MIN_POSITION {
        p = MIN_POSITION;
        v = 0.0;
    }

    (p.min(MAX_POSITION), v)
}

pub(crate) fn valley_reset(rng: &mut StdRng) -> Vec<f32> {
    generate_random_vector(rng, &[-0.6, 0.0], &[-0.4, 0.0])
}

pub(crate) fn render_valley(name: &str, state: &[f32]) {
    render_header(name);
    println!("{}", track_line(state[0], MIN_POSITION, MAX_POSITION, 21));
    println!("Vel: {:.3}", state[1]);
}

#[derive(Config)]
pub struct MountainCarConfig {
    #[config(default = 200)]
    pub max_steps: usize,
    pub seed: Option<u64>,
}

impl MountainCarConfig {
    pub fn init(&self) -> Result<MountainCarEnv> {
        let mut env = MountainCarEnv {
            goal_position: 0.5,
            force: 0.001,
            state: vec![0.0, 0.0],
            steps_beyond_done: None,
            curr_steps: 0,
            max_steps: self.max_steps,
            rng: seeded_rng(self.seed),
            action_space: Discrete::new(3)?.into(),
            observation_space: BoxSpace::new(
                vec![MIN_POSITION, -MAX_SPEED],
                vec![MAX_POSITION, MAX_SPEED],
            )?
            .into(),
        };
        env.reset();

        Ok(env)
    }
}

/// An underpowered car in a valley; it has to rock back and forth to build
/// enough momentum to reach the flag. Actions push left, coast, push right.
#[derive(Debug, Clone)]
pub struct MountainCarEnv {
    goal_position: f32,
    force: f32,
    state: Vec<f32>,
    steps_beyond_done: Option<usize>,
    curr_steps: usize,
    max_steps: usize,
    rng: StdRng,
    action_space: Space,
    observation_space: Space,
}

impl Env<Vec<f32>, usize> for MountainCarEnv {
    fn step(&mut self, action: &usize) -> EnvObservation<Vec<f32>> {
        let push = match *action {
            0 => -self.force,
            2 => self.force,
            _ => 0.0,
        };
        let (p, v) = valley_step(self.state[0], self.state[1], push);
        self.state = vec![p, v];
        self.curr_steps += 1;

        let reached_goal = p >= self.goal_position;
        let done = reached_goal || self.curr_steps >= self.max_steps;
        if done {
            match self.steps_beyond_done {
                None => self.steps_beyond_done = Some(0),
                Some(0) => {
                    warn!("calling step() on a finished MountainCar episode; call reset() first");
                    self.steps_beyond_done = Some(1);
                }
                Some(s) => self.steps_beyond_done = Some(s + 1),
            }
        }

        EnvObservation {
            obs: self.state.clone(),
            reward: if reached_goal { 0.0 } else { -1.0 },
            done,
            info: Default::default(),
        }
    }

    fn reset(&mut self) -> Vec<f32> {
        self.state = valley_reset(&mut self.rng);
        self.steps_beyond_done = None;
        self.curr_steps = 0;

        self.state.clone()
    }

    fn render(&self, mode: RenderMode) {
        if mode == RenderMode::Human {
            render_valley("MountainCar", &self.state);
        }
    }

    fn seed(&mut self, seed: Option<u64>) {
        self.rng = seeded_rng(seed);
        if let Some(seed) = seed {
            self.action_space.seed(seed);
            self.observation_space.seed(seed);
        }
    }

    fn action_space(&self) -> &Space {
        &self.action_space
    }

    fn observation_space(&self) -> &Space {
        &self.observation_space
    }

    fn reward_range(&self) -> RewardRange {
        RewardRange {
            low: -1.0,
            high: 0.0,
        }
    }

    fn spec(&self) -> Option<EnvSpec> {
        Some(
            EnvSpec::new("MountainCar-v0")
                .with_max_episode_steps(self.max_steps)
                .with_reward_threshold(-110.0),
        )
    }

    fn unwrapped(&self) -> &dyn Env<Vec<f32>, usize> {
        self
    }
}

#[cfg(test)]
mod test {
    use assert_approx_eq::assert_approx_eq;

    use crate::{common::convert::ToSpaceValue, env::base::Env};

    use super::{valley_step, MountainCarConfig, MAX_SPEED, MIN_POSITION};

    #[test]
    fn test_mountaincar() {
        let mut env = MountainCarConfig::new().with_seed(Some(0)).init().unwrap();
        let mut action_space = env.action_space().clone();
        let mut done = false;
        env.reset();

        while !done {
            let a = action_space.sample().try_into().unwrap();
            let result = env.step(&a);
            assert!(env
                .observation_space()
                .contains(&result.obs.to_space_value()));
            done = result.done;
        }
    }

    #[test]
    fn test_episode_length_is_bounded() {
        for action in [0, 1, 2] {
            let mut env = MountainCarConfig::new().with_seed(Some(4)).init().unwrap();
            env.reset();

            let mut steps = 1;
            while !env.step(&action).done {
                steps += 1;
            }
            // no constant push climbs out of the valley
            assert_eq!(steps, 200);
        }
    }

    #[test]
    fn test_left_wall_pins_the_car() {
        let (p, v) = valley_step(-1.19, -0.07, -0.001);
        assert_eq!(p, MIN_POSITION);
        assert_eq!(v, 0.0);
    }

    #[test]
    fn test_velocity_is_clamped_before_moving() {
        let (p, v) = valley_step(0.0, 0.0699, 0.01);
        assert_eq!(v, MAX_SPEED);
        assert_approx_eq!(p, MAX_SPEED);
    }

    #[test]
    fn test_oscillating_policy_reaches_the_flag() {
        let mut env = MountainCarConfig::new()
            .with_max_steps(1000)
            .with_seed(Some(0))
            .init()
            .unwrap();
        let mut obs = env.reset();

        for _ in 0..1000 {
            // push in the direction of travel
            let action = if obs[1] < 0.0 { 0 } else { 2 };
            let res = env.step(&action);
            obs = res.obs;
            if res.done {
                break;
            }
        }

        assert!(obs[0] >= 0.5);
    }

    #[test]
    fn test_capped_episode_pays_every_step() {
        let mut env = MountainCarConfig::new().with_seed(Some(0)).init().unwrap();
        env.reset();

        let mut rewards = vec![];
        loop {
            let res = env.step(&1);
            rewards.push(res.reward);
            if res.done {
                break;
            }
        }

        assert_eq!(rewards.len(), 200);
        assert!(rewards.iter().all(|r| *r == -1.0));
        assert_approx_eq!(rewards.iter().sum::<f64>(), -200.0);
    }

    #[test]
    fn test_unknown_action_coasts() {
        let mut env = MountainCarConfig::new().with_seed(Some(1)).init().unwrap();
        env.reset();
        let mut coasting = env.clone();

        for _ in 0..20 {
            assert_eq!(env.step(&5).obs, coasting.step(&1).obs);
        }
    }

    #[test]
    fn test_reaching_the_flag_pays_zero() {
        let mut env = MountainCarConfig::new()
            .with_max_steps(1000)
            .with_seed(Some(0))
            .init()
            .unwrap();
        let mut obs = env.reset();

        loop {
            let action = if obs[1] < 0.0 { 0 } else { 2 };
            let res = env.step(&action);
            obs = res.obs;
            if res.done {
                assert!(obs[0] >= 0.5);
                assert_eq!(res.reward, 0.0);
                break;
            }
            assert_eq!(res.reward, -1.0);
        }
    }
}
